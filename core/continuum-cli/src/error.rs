use continuum_core::ContinuumError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] ContinuumError),

    #[error("{0} must not be empty")]
    EmptyArgument(&'static str),

    #[error("Watch interval must be at least 1 second")]
    InvalidInterval,
}

pub type CliResult<T> = Result<T, CliError>;
