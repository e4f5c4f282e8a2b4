use sha1::{Digest, Sha1};
use std::io::Cursor;

pub fn sha1(payload: &str) -> String {
    let hash = Sha1::digest(payload);
    base16ct::lower::encode_string(&hash)
}

/// MurmurHash3, x86 32-bit variant.
pub fn murmur3_32(payload: &[u8], seed: u32) -> u32 {
    // reading from an in-memory slice cannot fail
    murmur3::murmur3_32(&mut Cursor::new(payload), seed).unwrap_or_default()
}
