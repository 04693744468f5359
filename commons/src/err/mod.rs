use std::fmt;

#[derive(Debug, Clone, PartialEq)]
#[repr(u8)]
pub enum EnvErrorKind {
    InvalidInt = 0,
    InvalidFloat = 1,
    InvalidBool = 2,
    InvalidRange = 3,
    OutOfRange = 4,
}

impl EnvErrorKind {
    /// Returns a canonical string representation of this error kind
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvErrorKind::InvalidInt => "INVALID_INT",
            EnvErrorKind::InvalidFloat => "INVALID_FLOAT",
            EnvErrorKind::InvalidBool => "INVALID_BOOL",
            EnvErrorKind::InvalidRange => "INVALID_RANGE",
            EnvErrorKind::OutOfRange => "OUT_OF_RANGE",
        }
    }
}

impl fmt::Display for EnvErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvErrorKind::InvalidInt => write!(f, "Invalid Integer"),
            EnvErrorKind::InvalidFloat => write!(f, "Invalid Float"),
            EnvErrorKind::InvalidBool => write!(f, "Invalid Boolean"),
            EnvErrorKind::InvalidRange => write!(f, "Invalid Range"),
            EnvErrorKind::OutOfRange => write!(f, "Out of Range"),
        }
    }
}

/// A value that could not be parsed from its textual (environment) form.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvError {
    pub kind: EnvErrorKind,
    pub value: String,
}

pub type EnvResult<T> = Result<T, EnvError>;

impl EnvError {
    pub fn new(kind: EnvErrorKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    pub fn kind(&self) -> EnvErrorKind {
        self.kind.clone()
    }
}

impl std::error::Error for EnvError {}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:?}", self.kind, self.value)
    }
}
