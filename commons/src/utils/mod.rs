use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

pub struct TimeUtility;
pub struct PayloadUtility;

impl TimeUtility {
    pub fn get_timestamp_s() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

impl PayloadUtility {
    /// Size served when a request does not ask for a positive size (1 MiB).
    pub const DEFAULT_SIZE_KB: f64 = 1024.0;
    /// Server-side cap when none is configured (5 MiB).
    pub const DEFAULT_MAX_SIZE_KB: f64 = 5.0 * 1024.0;

    /// Resolves the size to serve. Returns the size and whether it was capped.
    /// A non-finite or negative `max_kb` is replaced by `DEFAULT_MAX_SIZE_KB`.
    pub fn effective_size_kb(requested_kb: f64, max_kb: f64) -> (f64, bool) {
        let max_kb = if max_kb.is_finite() && max_kb >= 0.0 {
            max_kb
        } else {
            Self::DEFAULT_MAX_SIZE_KB
        };
        let requested_kb = if requested_kb > 0.0 {
            requested_kb
        } else {
            Self::DEFAULT_SIZE_KB
        };
        if requested_kb > max_kb {
            (max_kb, true)
        } else {
            (requested_kb, false)
        }
    }

    pub fn size_in_bytes(size_kb: f64) -> usize {
        // saturating cast: negative and NaN become 0
        (size_kb * 1024.0) as usize
    }

    pub fn random_payload<R: Rng>(len: usize, rng: &mut R) -> Vec<u8> {
        let mut payload = vec![0u8; len];
        rng.fill(&mut payload[..]);
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_effective_size_defaults_non_positive() {
        assert_eq!(PayloadUtility::effective_size_kb(0.0, 5120.0), (1024.0, false));
        assert_eq!(PayloadUtility::effective_size_kb(-8.0, 5120.0), (1024.0, false));
    }

    #[test]
    fn test_effective_size_caps() {
        assert_eq!(PayloadUtility::effective_size_kb(8192.0, 5120.0), (5120.0, true));
        assert_eq!(PayloadUtility::effective_size_kb(64.0, 5120.0), (64.0, false));
        // the default itself is subject to the cap
        assert_eq!(PayloadUtility::effective_size_kb(0.0, 512.0), (512.0, true));
    }

    #[test]
    fn test_effective_size_non_finite_cap() {
        let huge = f32::MAX as f64;
        assert_eq!(PayloadUtility::effective_size_kb(huge, f64::NAN), (5120.0, true));
        assert_eq!(PayloadUtility::effective_size_kb(huge, f64::INFINITY), (5120.0, true));
        assert_eq!(PayloadUtility::effective_size_kb(64.0, -1.0), (64.0, false));
        assert_eq!(
            PayloadUtility::effective_size_kb(f64::INFINITY, 5120.0),
            (5120.0, true)
        );
        // a NaN request falls back to the default size
        assert_eq!(PayloadUtility::effective_size_kb(f64::NAN, 5120.0), (1024.0, false));
    }

    #[test]
    fn test_size_in_bytes_truncates() {
        assert_eq!(PayloadUtility::size_in_bytes(1.0), 1024);
        assert_eq!(PayloadUtility::size_in_bytes(0.5), 512);
        assert_eq!(PayloadUtility::size_in_bytes(0.0009), 0);
        assert_eq!(PayloadUtility::size_in_bytes(-1.0), 0);
    }

    #[test]
    fn test_random_payload_len() {
        let mut rng = StdRng::seed_from_u64(3);
        let payload = PayloadUtility::random_payload(4096, &mut rng);
        assert_eq!(payload.len(), 4096);
        assert!(payload.iter().any(|b| *b != 0));
        assert!(PayloadUtility::random_payload(0, &mut rng).is_empty());
    }

    #[test]
    fn test_timestamp_is_recent() {
        // 2020-01-01T00:00:00Z
        assert!(TimeUtility::get_timestamp_s() > 1_577_836_800);
    }
}
