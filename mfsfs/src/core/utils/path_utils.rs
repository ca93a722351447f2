// SPDX-License-Identifier: MIT

//! Path helpers for portable filesystem injection.
//!
//! Paths are always converted to `/`-separated form internally; leading and
//! trailing separators carry no meaning. All functions are no_std + alloc
//! safe.

#[cfg(all(not(feature = "std"), feature = "alloc"))]
use alloc::vec::Vec;
#[cfg(all(not(feature = "std"), feature = "alloc"))]
use alloc::string::String;

/// Normalizes a path for lookup or creation:
/// - unify separators to `/`
/// - strip leading and trailing separators
pub fn sanitize_path(path: &str) -> String {
    let mut out = String::new();
    for c in path.chars() {
        if c == '\\' {
            out.push('/');
        } else {
            out.push(c);
        }
    }
    out.trim_matches('/').into()
}

/// Splits a path into its components, using `/` as separator.
///
/// Returns a Vec of non-empty components.
pub fn split_path(path: &str) -> Vec<&str> {
    let mut parts = vec![];

    for part in path.split('/') {
        if !part.is_empty() {
            parts.push(part);
        }
    }

    parts
}
