use std::path::PathBuf;

/// Errors that can occur while loading templates.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    /// The template file could not be read.
    #[error("failed to read template {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A `{{` was opened but never closed.
    #[error("unterminated placeholder at byte {0}")]
    Unterminated(usize),
}
