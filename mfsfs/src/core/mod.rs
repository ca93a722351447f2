// === Sub-modules ===
pub mod attr;
pub mod error;
#[cfg(feature = "alloc")]
pub mod filesystem;
pub mod utils;

// === Core Traits ===
pub mod traits {
    pub use super::attr::{FileFlags, FsAttributes};
    #[cfg(feature = "alloc")]
    pub use super::filesystem::{FileSystem, FsEntry};
}

// === Error types ===
pub use error::*;

// === Utilities ===
pub use utils::checksum_utils::*;
#[cfg(feature = "alloc")]
pub use utils::path_utils::*;
