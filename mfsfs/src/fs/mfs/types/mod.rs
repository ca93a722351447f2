// SPDX-License-Identifier: MIT

pub mod boot;
pub mod record;
