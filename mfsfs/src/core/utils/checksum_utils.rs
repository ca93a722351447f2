// SPDX-License-Identifier: MIT

/// Additive byte-sum checksum over `data`, skipping the byte range
/// `[skip_index, skip_index + skip_len)`.
///
/// The skip range is where the checksum itself is stored, so the value can
/// be recomputed over the serialized structure and compared directly. This
/// is an integrity sum, not a cryptographic digest.
#[inline]
pub fn additive_checksum_skip(data: &[u8], skip_index: usize, skip_len: usize) -> u32 {
    let mut sum: u32 = 0;
    for (i, &b) in data.iter().enumerate() {
        if i >= skip_index && i < skip_index + skip_len {
            continue;
        }
        sum = sum.wrapping_add(b as u32);
    }
    sum
}

/// Additive byte-sum over the whole buffer.
#[inline]
pub fn additive_checksum(data: &[u8]) -> u32 {
    additive_checksum_skip(data, 0, 0)
}
