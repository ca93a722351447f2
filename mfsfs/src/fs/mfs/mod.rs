// SPDX-License-Identifier: MIT

pub mod allocator;
#[cfg(feature = "std")]
pub mod bootloader;
pub mod constant;
pub mod filesystem;
pub mod formatter;
pub mod injector;
pub mod meta;
pub mod resolver;
pub mod types;

// === Public Interface ===
pub mod traits {
    pub use super::allocator::BucketMap;
    pub use super::formatter::{FormatOutcome, MfsFormatter};
    pub use super::injector::MfsInjector;
    pub use super::meta::MfsMeta;
    pub use super::resolver::MfsResolver;
    pub use super::types::boot::{MfsMasterRecord, MfsVbr, PartitionFlags};
    pub use super::types::record::{MfsRecord, RecordFlags};
}

pub mod prelude {
    pub use super::filesystem::MfsFileSystem;
    pub use super::traits::*;
    pub use crate::core::error::*;
    pub use crate::core::traits::*;
    pub use mfsio::prelude::*;
}
