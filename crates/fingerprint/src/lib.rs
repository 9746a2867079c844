//! # Dhaal Image Fingerprinting
//!
//! Cheap, deterministic content signatures for uploaded report photos. The
//! signature is used as an O(1)-cost short-circuit before the expensive
//! similarity oracle is consulted during duplicate resolution; it is not a
//! perceptual hash.
//!
//! ## Algorithm
//!
//! ```text
//! decimal(len(bytes)) || hex(bytes[0]) || hex(bytes[step]) || ... (index < sample_limit)
//! ```
//!
//! Hex digits are lowercase and unpadded, so byte `0x0a` contributes `a`.
//! With the default config the first 1000 bytes are sampled every 10 bytes.
//!
//! ## Contract
//!
//! - Pure function of `(bytes, config)`: no I/O, no clocks, no global state.
//! - The byte length is part of the signature, so buffers of different length
//!   never collide.
//!
//! ## Example
//!
//! ```
//! use fingerprint::fingerprint;
//!
//! let fp = fingerprint(&[0x0a, 0xff, 0x00]);
//! assert_eq!(fp.as_str(), "3a");
//! ```

pub mod config;
pub mod signature;

pub use crate::config::{FingerprintConfig, FingerprintError};
pub use crate::signature::Fingerprint;

use std::fmt::Write;

/// Compute the fingerprint of `bytes` with the default sampling window.
///
/// Never fails: the default configuration is always valid.
pub fn fingerprint(bytes: &[u8]) -> Fingerprint {
    Fingerprint::new(render(bytes, 1000, 10))
}

/// Compute the fingerprint of `bytes` with an explicit configuration.
pub fn fingerprint_with_config(
    bytes: &[u8],
    cfg: &FingerprintConfig,
) -> Result<Fingerprint, FingerprintError> {
    cfg.validate()?;
    Ok(Fingerprint::new(render(bytes, cfg.sample_limit, cfg.step)))
}

fn render(bytes: &[u8], sample_limit: usize, step: usize) -> String {
    let window = bytes.len().min(sample_limit);
    let mut out = String::with_capacity(20 + 2 * window.div_ceil(step));
    // Writing into a String cannot fail.
    let _ = write!(out, "{}", bytes.len());
    for byte in bytes[..window].iter().step_by(step) {
        let _ = write!(out, "{byte:x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_deterministic() {
        let bytes: Vec<u8> = (0..4096u32).map(|i| (i * 7 % 256) as u8).collect();
        assert_eq!(fingerprint(&bytes), fingerprint(&bytes));
    }

    #[test]
    fn length_prefix_separates_buffers() {
        let short = vec![1u8; 20];
        let long = vec![1u8; 21];
        assert_ne!(fingerprint(&short), fingerprint(&long));
        assert!(fingerprint(&short).as_str().starts_with("20"));
        assert!(fingerprint(&long).as_str().starts_with("21"));
    }

    #[test]
    fn hex_digits_are_unpadded() {
        let bytes = [0x00, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x0f, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xab];
        assert_eq!(fingerprint(&bytes).as_str(), "210fab");
    }

    #[test]
    fn bytes_past_sample_window_are_ignored() {
        let mut a = vec![0u8; 2000];
        let mut b = vec![0u8; 2000];
        a[1500] = 1;
        b[1500] = 2;
        assert_eq!(fingerprint(&a), fingerprint(&b));

        // Index 990 is the last sampled byte.
        a[990] = 0x11;
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn unsampled_positions_do_not_matter() {
        let a = vec![0u8; 50];
        let mut b = vec![0u8; 50];
        b[5] = 0xff;
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn empty_buffer_is_just_the_length() {
        assert_eq!(fingerprint(&[]).as_str(), "0");
    }

    #[test]
    fn sample_count_is_bounded() {
        let bytes = vec![0xffu8; 10_000];
        let fp = fingerprint(&bytes);
        // "10000" + 100 samples of "ff"
        assert_eq!(fp.as_str().len(), 5 + 100 * 2);
    }

    #[test]
    fn explicit_default_config_matches_default_path() {
        let bytes: Vec<u8> = (0..1500u32).map(|i| (i % 256) as u8).collect();
        let cfg = FingerprintConfig::default();
        assert_eq!(fingerprint_with_config(&bytes, &cfg).unwrap(), fingerprint(&bytes));
    }

    #[test]
    fn invalid_config_is_reported() {
        let cfg = FingerprintConfig::default().with_step(0);
        assert_eq!(
            fingerprint_with_config(&[1, 2, 3], &cfg),
            Err(FingerprintError::InvalidStep)
        );
    }

    #[test]
    fn fingerprint_serializes_as_plain_string() {
        let fp = fingerprint(&[0xde, 0xad]);
        assert_eq!(serde_json::to_string(&fp).unwrap(), "\"2de\"");
    }
}
