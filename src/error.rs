//! Error type shared by every reader in the crate.

use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Error {
        ErrorKind::Io {
            context: context.into(),
            source,
        }
        .into()
    }

    pub fn eof(resource: impl Into<String>) -> Error {
        ErrorKind::EndOfFile {
            resource: resource.into(),
        }
        .into()
    }

    pub fn corrupt(resource: impl Into<String>, message: impl Into<String>) -> Error {
        ErrorKind::CorruptIndex {
            resource: resource.into(),
            message: message.into(),
        }
        .into()
    }

    pub fn too_old(resource: impl Into<String>, version: i32, min: i32, max: i32) -> Error {
        ErrorKind::IndexFormatTooOld {
            resource: resource.into(),
            version,
            min,
            max,
        }
        .into()
    }

    pub fn too_new(resource: impl Into<String>, version: i32, min: i32, max: i32) -> Error {
        ErrorKind::IndexFormatTooNew {
            resource: resource.into(),
            version,
            min,
            max,
        }
        .into()
    }

    pub fn unsupported(operation: &'static str) -> Error {
        ErrorKind::Unsupported { operation }.into()
    }

    pub fn already_closed(resource: impl Into<String>) -> Error {
        ErrorKind::AlreadyClosed {
            resource: resource.into(),
        }
        .into()
    }

    pub fn illegal_state(message: impl Into<String>) -> Error {
        ErrorKind::IllegalState {
            message: message.into(),
        }
        .into()
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        ErrorKind::InvalidArgument {
            name: name.into(),
            message: message.into(),
        }
        .into()
    }

    /// True for the two format-version failures.
    pub fn is_format_version(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::IndexFormatTooOld { .. } | ErrorKind::IndexFormatTooNew { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("IO error for '{context}': {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },

    #[error("read past EOF: {resource}")]
    EndOfFile { resource: String },

    #[error(
        "format version is not supported (resource: {resource}): {version} (needs to be between {min} and {max}); \
         only indexes created by release 3.0 and later can be read"
    )]
    IndexFormatTooOld {
        resource: String,
        version: i32,
        min: i32,
        max: i32,
    },

    #[error(
        "format version is not supported (resource: {resource}): {version} (needs to be between {min} and {max})"
    )]
    IndexFormatTooNew {
        resource: String,
        version: i32,
        min: i32,
        max: i32,
    },

    #[error("corrupt index (resource: {resource}): {message}")]
    CorruptIndex { resource: String, message: String },

    #[error("unsupported operation: {operation}")]
    Unsupported { operation: &'static str },

    #[error("{resource} is already closed")]
    AlreadyClosed { resource: String },

    #[error("illegal state: {message}")]
    IllegalState { message: String },

    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io(String::new(), e)
    }
}
