use miette::Diagnostic;
use thiserror::Error;

pub type Result<T, E = Box<ChainError>> = std::result::Result<T, E>;

// NOTE: These are all input-validation failures, raised before any chains are generated, so callers never see a
// partial enumeration
#[derive(Debug, Diagnostic, Clone, Eq, PartialEq, Error)]
pub enum ChainError {
    #[diagnostic(help(
        "mark every point where a carbon chain should be attached with an R, like R-OH or RC(=O)O"
    ))]
    #[error("the template {template:?} contains no R placeholder to substitute a chain into")]
    InvalidTemplate { template: String },

    #[diagnostic(help(
        "chain lengths start at 1, and the minimum length cannot be greater than the maximum length"
    ))]
    #[error("the chain-length range {min}..={max} is invalid")]
    InvalidRange { min: i64, max: i64 },

    #[error("the atom repeated to build each chain cannot be empty")]
    EmptyAtom,
}

impl ChainError {
    pub(crate) fn invalid_template(template: &str) -> Self {
        let template = template.to_owned();

        Self::InvalidTemplate { template }
    }

    pub(crate) fn invalid_range(min: u32, max: u32) -> Self {
        Self::InvalidRange {
            min: min.into(),
            max: max.into(),
        }
    }
}
