// SPDX-License-Identifier: MIT
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
#[macro_use]
extern crate alloc;

// Core Modules
pub mod core;
pub mod fs;

// Reusable types and traits
pub use crate::core::traits::*;

// Utilities
#[cfg(feature = "alloc")]
pub use crate::core::utils::path_utils::*;

#[cfg(feature = "mfs")]
/// MFS filesystem implementation.
///
/// See [`mfs::MfsFileSystem`], [`mfs::BucketMap`], and [`mfs::MfsFormatter`].
pub mod mfs {
    pub use super::fs::mfs::prelude::*;
}
