use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::emit::EmitError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Emit(#[from] EmitError),
    #[error("Total instruction count of `{app}` is 0, the instruction profile is likely missing")]
    ZeroInstructionCount { app: String },
    #[error("{failed} of {total} injection lists of `{app}` could not be written: {first}")]
    ListsFailed {
        app: String,
        failed: usize,
        total: usize,
        #[source]
        first: EmitError,
    },
}

impl Error {
    /// Whether the error comes from the campaign setup rather than from reading or writing files.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::ZeroInstructionCount { .. } | Self::Emit(EmitError::Config(_))
        )
    }
}
