use std::fmt;
use std::str::FromStr;

use rand::Rng;

use crate::err::{EnvError, EnvErrorKind, EnvResult};

/// Inclusive range of artificial response delays, in milliseconds.
///
/// Parsed from either `"min-max"` or a single fixed value `"n"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    min: u64,
    max: u64,
}

impl DelayRange {
    pub const DEFAULT: DelayRange = DelayRange { min: 0, max: 100 };

    pub fn new(min: u64, max: u64) -> EnvResult<Self> {
        if min > max {
            return Err(EnvError::new(
                EnvErrorKind::InvalidRange,
                format!("{}-{}", min, max),
            ));
        }
        Ok(Self { min, max })
    }

    pub fn fixed(value: u64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    pub fn min(&self) -> u64 {
        self.min
    }

    pub fn max(&self) -> u64 {
        self.max
    }

    pub fn is_fixed(&self) -> bool {
        self.min == self.max
    }

    pub fn parse(text: &str) -> EnvResult<Self> {
        let invalid = || EnvError::new(EnvErrorKind::InvalidRange, text);

        if let Some((lo, hi)) = text.split_once('-') {
            let min = lo.parse::<u64>().map_err(|_| invalid())?;
            let max = hi.parse::<u64>().map_err(|_| invalid())?;
            return Self::new(min, max).map_err(|_| invalid());
        }
        text.parse::<u64>().map(Self::fixed).map_err(|_| invalid())
    }

    /// Picks a delay uniformly from `[min, max]`.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> u64 {
        if self.is_fixed() {
            return self.min;
        }
        rng.random_range(self.min..=self.max)
    }
}

impl Default for DelayRange {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl FromStr for DelayRange {
    type Err = EnvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DelayRange::parse(s)
    }
}

impl fmt::Display for DelayRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}
