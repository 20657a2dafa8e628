use std::error::Error as StdError;

/// A specialized `Result` type for DALC.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Convenience alias for the boxed error type drivers return across the
/// provider seam.
pub type BoxDynError = Box<dyn StdError + Send + Sync + 'static>;

/// Represents all the ways a method can fail within DALC.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An argument passed to a constructor or method was invalid.
    #[error("invalid argument: {0}")]
    Argument(&'static str),

    /// The operation is not valid for the current transaction state, e.g.
    /// beginning a transaction while one is in progress, or committing a
    /// transaction that was already finalized.
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),

    /// A command failed while executing against the database.
    ///
    /// The driver error is preserved unchanged as the source; the command
    /// text and parameter names are carried in the message.
    #[error("error occurred while executing `{command}`: {source}")]
    Execute {
        #[source]
        source: BoxDynError,
        command: String,
    },

    /// An error raised by the driver outside of command execution:
    /// connect, begin, commit, rollback or close.
    #[error("error communicating with database: {0}")]
    Database(#[source] BoxDynError),
}

impl Error {
    pub(crate) fn execute(source: BoxDynError, command: impl Into<String>) -> Self {
        Error::Execute {
            source,
            command: command.into(),
        }
    }
}
