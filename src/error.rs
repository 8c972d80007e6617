//! Error taxonomy shared by the generation core.

use thiserror::Error;

/// Errors raised by sampling, tessellation, composition and noise synthesis.
///
/// A cell left without a nearby seed during tessellation is not an error: it
/// is counted in the pass report and logged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),
    #[error("Cannot allocate {what} with {cells} cells")]
    ResourceExhaustion { what: &'static str, cells: usize },
}

impl GenerationError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        GenerationError::Configuration(msg.into())
    }
}

/// Allocates a vector of `len` copies of `value`, reporting allocation
/// failure instead of aborting.
pub(crate) fn try_filled_vec<T: Clone>(
    what: &'static str,
    len: usize,
    value: T,
) -> Result<Vec<T>, GenerationError> {
    let mut out = Vec::new();
    out.try_reserve_exact(len)
        .map_err(|_| GenerationError::ResourceExhaustion { what, cells: len })?;
    out.resize(len, value);
    Ok(out)
}
