pub mod checksum_utils;
#[cfg(feature = "alloc")]
pub mod path_utils;
