//! Shared key generation for storage backends.
//!
//! Key format: `{classification}/{random}.{ext}`.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;
use tubely_core::validation::extension_for_content_type;
use tubely_core::Classification;

/// Number of random bytes in a key. Encodes to 43 base64url characters.
pub const RANDOM_KEY_BYTES: usize = 32;

/// Generate a fresh object key for a video of the given classification.
///
/// No existence check is made; 256 bits of randomness make collisions
/// negligible.
pub fn object_key(classification: Classification, content_type: &str) -> String {
    let mut bytes = [0u8; RANDOM_KEY_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    let name = URL_SAFE_NO_PAD.encode(bytes);
    format!(
        "{}/{}.{}",
        classification.as_str(),
        name,
        extension_for_content_type(content_type)
    )
}

/// Reject keys that could escape a filesystem root or address another namespace.
pub fn validate_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('/')
        && !key.contains("..")
        && !key.contains('\\')
        && !key.contains(',')
}
