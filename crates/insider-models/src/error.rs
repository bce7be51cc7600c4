use thiserror::Error;

/// A caller-supplied filter parameter was rejected.
///
/// Every variant names the parameter and echoes the offending value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParamError {
    #[error("Invalid values for `{param}`: {invalid:?}. Choose from {options:?}")]
    UnknownOption {
        param: &'static str,
        invalid: Vec<String>,
        options: Vec<&'static str>,
    },

    #[error("Invalid type for `{param}`: {found} (expected {expected})")]
    WrongType {
        param: &'static str,
        found: String,
        expected: &'static str,
    },

    #[error("{value}: `{param}` must be a non-negative value")]
    Negative { param: &'static str, value: String },

    #[error("{value}: `{param}` must be a whole number if provided as a float")]
    Fractional { param: &'static str, value: String },

    #[error("{value}: `{param}` must be a finite number")]
    NotFinite { param: &'static str, value: String },

    #[error("{value}: `{param}` is too large")]
    OutOfRange { param: &'static str, value: String },
}

impl ParamError {
    pub fn param(&self) -> &'static str {
        match self {
            ParamError::UnknownOption { param, .. }
            | ParamError::WrongType { param, .. }
            | ParamError::Negative { param, .. }
            | ParamError::Fractional { param, .. }
            | ParamError::NotFinite { param, .. }
            | ParamError::OutOfRange { param, .. } => *param,
        }
    }
}
