//! Constant-time PKCS#7 validation
//!
//! Decryption runs CBC without unpadding and then calls [`unpadded_len`] on
//! the plaintext. Every byte of the final block is examined regardless of
//! where the padding ends, so the time taken does not depend on which byte
//! (if any) is wrong.

use subtle::{Choice, ConstantTimeEq, ConstantTimeGreater, ConstantTimeLess};

/// AES block size in bytes
pub const BLOCK_SIZE: usize = 16;

/// Padding could not be validated
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid PKCS#7 padding")]
pub struct InvalidPadding;

/// Length of the message once PKCS#7 padding is stripped
///
/// `buf` must be a non-empty whole number of blocks.
pub fn unpadded_len(buf: &[u8]) -> Result<usize, InvalidPadding> {
    if buf.is_empty() || buf.len() % BLOCK_SIZE != 0 {
        return Err(InvalidPadding);
    }

    let block = &buf[buf.len() - BLOCK_SIZE..];
    let pad = block[BLOCK_SIZE - 1];

    let mut valid: Choice = !pad.ct_eq(&0) & !pad.ct_gt(&(BLOCK_SIZE as u8));

    // block[BLOCK_SIZE - 1 - i] is covered by the padding when i < pad
    for (i, byte) in block.iter().rev().enumerate() {
        let in_pad = (i as u8).ct_lt(&pad);
        valid &= !in_pad | byte.ct_eq(&pad);
    }

    if bool::from(valid) {
        Ok(buf.len() - pad as usize)
    } else {
        Err(InvalidPadding)
    }
}
