//! Error types for the signing pipeline.
//!
//! Every stage fails fast with a typed error; no partially written PDF is
//! ever returned. Errors are grouped into coarse kinds (see [`ErrorKind`])
//! so callers can log the underlying cause while showing a generic failure.

/// Result type alias for signing operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller supplied unusable input (buffer, certificate, capacity)
    Input,
    /// The PDF structure could not be understood
    Parse,
    /// An indirect object could not be resolved through the xref table
    Reference,
    /// The file violates a format precondition (e.g. missing `%%EOF`)
    Format,
    /// CMS construction or encoding failed
    Signing,
    /// Underlying IO failure
    Io,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Input => "input",
            ErrorKind::Parse => "parse",
            ErrorKind::Reference => "reference",
            ErrorKind::Format => "format",
            ErrorKind::Signing => "signing",
            ErrorKind::Io => "io",
        };
        f.write_str(name)
    }
}

/// Error types that can occur while embedding or extracting a signature.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Unusable input: wrong buffer type, no matching certificate, capacity exceeded
    #[error("Invalid input: {0}")]
    Input(String),

    /// Structural parse failure
    #[error("Failed to parse PDF: {0}")]
    Parse(String),

    /// Parse failure at a known byte offset
    #[error("Failed to parse object at byte {offset}: {reason}")]
    ParseAt {
        /// Byte offset where the error occurred
        offset: usize,
        /// Reason for parse failure
        reason: String,
    },

    /// Referenced object not found in cross-reference table
    #[error("Object not found: {0} {1} R")]
    ObjectNotFound(u32, u16),

    /// Format precondition violated
    #[error("Invalid PDF format: {0}")]
    Format(String),

    /// CMS/PKCS#7 construction failure
    #[error("Signing failed: {0}")]
    Signing(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 decoding error
    #[error("UTF-8 decoding error: {0}")]
    Utf8Error(#[from] std::str::Utf8Error),
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Input(_) => ErrorKind::Input,
            Error::Parse(_) | Error::ParseAt { .. } | Error::Utf8Error(_) => ErrorKind::Parse,
            Error::ObjectNotFound(..) => ErrorKind::Reference,
            Error::Format(_) => ErrorKind::Format,
            Error::Signing(_) => ErrorKind::Signing,
            Error::Io(_) => ErrorKind::Io,
        }
    }

    /// Whether retrying the same call could succeed.
    ///
    /// Always `false`: the pipeline is a pure function of its inputs, so
    /// retries belong to the caller (e.g. with a larger `signature_length`).
    pub fn is_retryable(&self) -> bool {
        false
    }
}

impl From<der::Error> for Error {
    fn from(err: der::Error) -> Self {
        Error::Signing(format!("DER encoding error: {}", err))
    }
}
