//! Short code generation.
//!
//! Codes are drawn from a 58-symbol alphabet with the visually ambiguous
//! glyphs (`0`, `O`, `1`, `l`, `I`) removed. The random path is the only one
//! that carries security weight: codes must not be enumerable, so bytes come
//! from the operating system CSPRNG via `getrandom`.
//!
//! Uniqueness is not guaranteed here. Callers retry against the store.

use sha2::{Digest, Sha256};

use crate::error::AppError;

/// The safe alphabet: 57 unambiguous alphanumerics plus `-`.
pub const ALPHABET: &[u8; 58] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz-";

/// Shortest code the system produces or accepts.
pub const MIN_CODE_LENGTH: usize = 3;

/// Longest code the system produces or accepts.
pub const MAX_CODE_LENGTH: usize = 30;

/// Default length of generated codes.
pub const DEFAULT_CODE_LENGTH: usize = 7;

/// Largest multiple of the alphabet size that fits in a byte. Bytes at or
/// above it are discarded so every symbol is equally likely.
const REJECTION_THRESHOLD: u8 = (256 - 256 % ALPHABET.len()) as u8;

/// Generates a random short code of exactly `length` symbols.
///
/// # Errors
///
/// Returns [`AppError::Internal`] if the system random number generator fails.
///
/// # Examples
///
/// ```ignore
/// let code = generate_code(7)?;
/// assert_eq!(code.len(), 7);
/// assert!(code.bytes().all(|b| ALPHABET.contains(&b)));
/// ```
pub fn generate_code(length: usize) -> Result<String, AppError> {
    let mut code = String::with_capacity(length);
    // Rejection discards ~9% of bytes; oversize the buffer to usually finish in one read.
    let mut buffer = vec![0u8; length + length / 4 + 4];

    while code.len() < length {
        getrandom::fill(&mut buffer)
            .map_err(|e| AppError::Internal(format!("System RNG failure: {e}")))?;

        for &byte in buffer.iter().filter(|&&b| b < REJECTION_THRESHOLD) {
            if code.len() == length {
                break;
            }
            code.push(ALPHABET[byte as usize % ALPHABET.len()] as char);
        }
    }

    Ok(code)
}

/// Derives a deterministic code from the content of a URL.
///
/// The SHA-256 digest is read as a big-endian integer and converted to base 58;
/// the least significant `length` digits form the code. Deterministic codes are
/// predictable from the input, so this is only a fallback, never the default.
pub fn derive_from_content(long_url: &str, length: usize) -> String {
    let mut digits: Vec<u8> = Sha256::digest(long_url.as_bytes()).to_vec();
    let base = ALPHABET.len() as u32;
    let mut code = String::with_capacity(length);

    while code.len() < length {
        // Long division of `digits` by the base, in place.
        let mut remainder = 0u32;
        for digit in digits.iter_mut() {
            let acc = (remainder << 8) | u32::from(*digit);
            *digit = (acc / base) as u8;
            remainder = acc % base;
        }
        code.push(ALPHABET[remainder as usize] as char);
    }

    code
}

/// Returns true if `code` has a length and character set a short code can have.
///
/// Accepts the wider custom-alias character set (`_` included) so that both
/// generated codes and aliases pass.
pub fn is_valid_code_shape(code: &str) -> bool {
    (MIN_CODE_LENGTH..=MAX_CODE_LENGTH).contains(&code.len())
        && code
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
