// SPDX-License-Identifier: MIT

#[cfg(feature = "mfs")]
pub mod mfs;
