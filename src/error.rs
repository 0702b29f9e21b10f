//! Error kinds of the attenuation core.
//!
//! Every error is local to one configuration (a material/thickness/energy run
//! or a material/energy sweep); callers record it and move on to siblings.

use thiserror::Error;

pub type AttenResult<T> = Result<T, AttenError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AttenError {
    /// Invalid inputs for one configuration; nothing is produced for it.
    #[error("configuration error [{config}]: {reason}")]
    Configuration { config: String, reason: String },

    /// The value exists but is physically meaningless (no transmission,
    /// non-positive slope). Reported as a sentinel plus a flag.
    #[error("numeric degeneracy [{config}]: {reason}")]
    NumericDegeneracy { config: String, reason: String },

    /// Not enough points to determine the fit parameters.
    #[error("fit underdetermined [{config}]: {points} points for {parameters} free parameters")]
    FitUnderdetermined {
        config: String,
        points: usize,
        parameters: usize,
    },
}

impl AttenError {
    pub fn config(config: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            config: config.into(),
            reason: reason.into(),
        }
    }

    pub fn degenerate(config: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NumericDegeneracy {
            config: config.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration",
            Self::NumericDegeneracy { .. } => "numeric_degeneracy",
            Self::FitUnderdetermined { .. } => "fit_underdetermined",
        }
    }
}
