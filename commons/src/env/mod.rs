//! Environment-variable lookup with typed parsing and logged fallback.
//!
//! A missing variable quietly yields the default. A variable that is set but
//! cannot be parsed logs a warning naming the key and the default, then
//! yields the default.

use std::env;

use log::warn;

use crate::delay::DelayRange;
use crate::err::{EnvError, EnvErrorKind, EnvResult};

/// Source of raw variable values. `std::env` in production, a map in tests.
pub trait EnvLookup {
    fn lookup(&self, key: &str) -> Option<String>;
}

/// Reads from the process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn lookup(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

impl<F> EnvLookup for F
where
    F: Fn(&str) -> Option<String>,
{
    fn lookup(&self, key: &str) -> Option<String> {
        self(key)
    }
}

pub fn parse_int(text: &str) -> EnvResult<i64> {
    text.parse::<i64>()
        .map_err(|_| EnvError::new(EnvErrorKind::InvalidInt, text))
}

pub fn parse_float(text: &str) -> EnvResult<f64> {
    text.parse::<f64>()
        .map_err(|_| EnvError::new(EnvErrorKind::InvalidFloat, text))
}

/// Integer within `[min, max]`.
pub fn parse_int_bounded(text: &str, min: i64, max: i64) -> EnvResult<i64> {
    let value = parse_int(text)?;
    if value < min || value > max {
        return Err(EnvError::new(EnvErrorKind::OutOfRange, text));
    }
    Ok(value)
}

/// Finite, non-negative size in KB. `NaN` and `inf` parse as floats but are
/// rejected here.
pub fn parse_size_kb(text: &str) -> EnvResult<f64> {
    let value = parse_float(text)?;
    if !value.is_finite() || value < 0.0 {
        return Err(EnvError::new(EnvErrorKind::OutOfRange, text));
    }
    Ok(value)
}

pub fn parse_bool(text: &str) -> EnvResult<bool> {
    match text {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(EnvError::new(EnvErrorKind::InvalidBool, text)),
    }
}

fn parse_or_default<L, T, P>(source: &L, key: &str, default: T, parse: P) -> T
where
    L: EnvLookup + ?Sized,
    T: std::fmt::Display,
    P: FnOnce(&str) -> EnvResult<T>,
{
    let Some(raw) = source.lookup(key) else {
        return default;
    };
    match parse(&raw) {
        Ok(value) => value,
        Err(e) => {
            warn!("Invalid value for {} ({}), using default: {}", key, e, default);
            default
        }
    }
}

pub fn int_from<L: EnvLookup + ?Sized>(source: &L, key: &str, default: i64) -> i64 {
    parse_or_default(source, key, default, parse_int)
}

pub fn float_from<L: EnvLookup + ?Sized>(source: &L, key: &str, default: f64) -> f64 {
    parse_or_default(source, key, default, parse_float)
}

pub fn int_bounded_from<L: EnvLookup + ?Sized>(
    source: &L,
    key: &str,
    default: i64,
    min: i64,
    max: i64,
) -> i64 {
    parse_or_default(source, key, default, |text| parse_int_bounded(text, min, max))
}

pub fn size_kb_from<L: EnvLookup + ?Sized>(source: &L, key: &str, default: f64) -> f64 {
    parse_or_default(source, key, default, parse_size_kb)
}

pub fn bool_from<L: EnvLookup + ?Sized>(source: &L, key: &str, default: bool) -> bool {
    parse_or_default(source, key, default, parse_bool)
}

pub fn delay_from<L: EnvLookup + ?Sized>(
    source: &L,
    key: &str,
    default: DelayRange,
) -> DelayRange {
    parse_or_default(source, key, default, DelayRange::parse)
}

/// Missing and empty both yield `default`.
pub fn string_from<L: EnvLookup + ?Sized>(source: &L, key: &str, default: &str) -> String {
    source
        .lookup(key)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

pub fn env_int(key: &str, default: i64) -> i64 {
    int_from(&ProcessEnv, key, default)
}

pub fn env_float(key: &str, default: f64) -> f64 {
    float_from(&ProcessEnv, key, default)
}

pub fn env_bool(key: &str, default: bool) -> bool {
    bool_from(&ProcessEnv, key, default)
}

pub fn env_delay(key: &str, default: DelayRange) -> DelayRange {
    delay_from(&ProcessEnv, key, default)
}

pub fn env_string(key: &str, default: &str) -> String {
    string_from(&ProcessEnv, key, default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_parse_bool_accepted_spellings() {
        for text in ["true", "1", "yes"] {
            assert_eq!(parse_bool(text), Ok(true));
        }
        for text in ["false", "0", "no"] {
            assert_eq!(parse_bool(text), Ok(false));
        }
        for text in ["TRUE", "y", "on", ""] {
            assert!(parse_bool(text).is_err(), "input {:?}", text);
        }
    }

    #[test]
    fn test_parse_int_is_strict() {
        assert_eq!(parse_int("42"), Ok(42));
        assert_eq!(parse_int("-3"), Ok(-3));
        assert!(parse_int(" 42").is_err());
        assert!(parse_int("4.2").is_err());
        assert!(parse_int("").is_err());
    }

    #[test]
    fn test_parse_int_bounded() {
        assert_eq!(parse_int_bounded("10", 0, 10), Ok(10));
        let err = parse_int_bounded("11", 0, 10).unwrap_err();
        assert_eq!(err.kind, EnvErrorKind::OutOfRange);
        assert!(parse_int_bounded("-1", 0, 10).is_err());
        assert_eq!(parse_int_bounded("x", 0, 10).unwrap_err().kind, EnvErrorKind::InvalidInt);
    }

    #[test]
    fn test_parse_size_kb_rejects_non_finite() {
        assert_eq!(parse_size_kb("256.5"), Ok(256.5));
        assert_eq!(parse_size_kb("0"), Ok(0.0));
        for text in ["NaN", "nan", "inf", "-inf", "infinity", "-1"] {
            let err = parse_size_kb(text).unwrap_err();
            assert_eq!(err.kind, EnvErrorKind::OutOfRange, "input {:?}", text);
        }
    }

    #[test]
    fn test_out_of_range_uses_default() {
        let source = vars(&[
            ("REQUEST_TIMEOUT_SEC", "400000000000"),
            ("MAX_PAYLOAD_SIZE_KB", "NaN"),
            ("PAYLOAD_SIZE_KB", "inf"),
        ]);
        assert_eq!(int_bounded_from(&source, "REQUEST_TIMEOUT_SEC", 100, 0, 1000), 100);
        assert_eq!(size_kb_from(&source, "MAX_PAYLOAD_SIZE_KB", 5120.0), 5120.0);
        assert_eq!(size_kb_from(&source, "PAYLOAD_SIZE_KB", 1024.0), 1024.0);
    }

    #[test]
    fn test_missing_uses_default() {
        let source = vars(&[]);
        assert_eq!(int_from(&source, "MAX_CONN_AGE_SEC", 30), 30);
        assert_eq!(float_from(&source, "MAX_PAYLOAD_SIZE_KB", 5120.0), 5120.0);
        assert!(!bool_from(&source, "USE_PAYLOAD", false));
        assert_eq!(
            delay_from(&source, "RESPONSE_DELAY_MS", DelayRange::DEFAULT),
            DelayRange::DEFAULT
        );
        assert_eq!(string_from(&source, "SERVER_PORT", "50051"), "50051");
    }

    #[test]
    fn test_invalid_uses_default() {
        let source = vars(&[
            ("MAX_CONN_AGE_SEC", "thirty"),
            ("MAX_PAYLOAD_SIZE_KB", "big"),
            ("USE_PAYLOAD", "maybe"),
            ("RESPONSE_DELAY_MS", "100-10"),
        ]);
        assert_eq!(int_from(&source, "MAX_CONN_AGE_SEC", 30), 30);
        assert_eq!(float_from(&source, "MAX_PAYLOAD_SIZE_KB", 5120.0), 5120.0);
        assert!(bool_from(&source, "USE_PAYLOAD", true));
        assert_eq!(
            delay_from(&source, "RESPONSE_DELAY_MS", DelayRange::DEFAULT),
            DelayRange::DEFAULT
        );
    }

    #[test]
    fn test_valid_values_override_default() {
        let source = vars(&[
            ("MAX_CONN_AGE_SEC", "60"),
            ("MAX_PAYLOAD_SIZE_KB", "256.5"),
            ("USE_PAYLOAD", "yes"),
            ("RESPONSE_DELAY_MS", "5-10"),
            ("SERVER_ADDR", "pong.internal:9000"),
        ]);
        assert_eq!(int_from(&source, "MAX_CONN_AGE_SEC", 30), 60);
        assert_eq!(float_from(&source, "MAX_PAYLOAD_SIZE_KB", 5120.0), 256.5);
        assert!(bool_from(&source, "USE_PAYLOAD", false));
        assert_eq!(
            delay_from(&source, "RESPONSE_DELAY_MS", DelayRange::DEFAULT),
            DelayRange::new(5, 10).unwrap()
        );
        assert_eq!(
            string_from(&source, "SERVER_ADDR", "localhost:50051"),
            "pong.internal:9000"
        );
    }

    #[test]
    fn test_empty_string_uses_default() {
        let source = vars(&[("SERVER_PORT", "")]);
        assert_eq!(string_from(&source, "SERVER_PORT", "50051"), "50051");
    }

    #[test]
    fn test_process_env() {
        temp_env::with_vars(
            vec![
                ("PINGPONG_TEST_INT", Some("17")),
                ("PINGPONG_TEST_BOOL", Some("no")),
                ("PINGPONG_TEST_FLOAT", Some("nan-ish")),
                ("PINGPONG_TEST_MISSING", None),
            ],
            || {
                assert_eq!(env_int("PINGPONG_TEST_INT", 1), 17);
                assert!(!env_bool("PINGPONG_TEST_BOOL", true));
                assert_eq!(env_float("PINGPONG_TEST_FLOAT", 2.5), 2.5);
                assert_eq!(env_string("PINGPONG_TEST_MISSING", "fallback"), "fallback");
                assert_eq!(
                    env_delay("PINGPONG_TEST_MISSING", DelayRange::fixed(3)),
                    DelayRange::fixed(3)
                );
            },
        );
    }
}
