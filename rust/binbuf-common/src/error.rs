use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// Returns `true` if this error reports a read past the logical end of the data.
    pub fn is_end_of_data(&self) -> bool {
        matches!(self.kind(), ErrorKind::EndOfData { .. })
    }

    pub fn end_of_data(position: usize, requested: usize, available: usize) -> Error {
        Error(
            ErrorKind::EndOfData {
                position,
                requested,
                available,
            }
            .into(),
        )
    }

    pub fn capacity_violation(end: usize, max: usize) -> Error {
        Error(ErrorKind::CapacityViolation { end, max }.into())
    }

    pub fn unsupported(operation: impl Into<String>) -> Error {
        Error(
            ErrorKind::Unsupported {
                operation: operation.into(),
            }
            .into(),
        )
    }

    pub fn disposed() -> Error {
        Error(ErrorKind::Disposed.into())
    }

    pub fn invalid_format(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidFormat {
                element: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Error {
        Error(
            ErrorKind::Io {
                context: context.into(),
                source,
            }
            .into(),
        )
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error(
        "end of data: {requested} bytes requested at position {position}, \
         logical size is {available}"
    )]
    EndOfData {
        position: usize,
        requested: usize,
        available: usize,
    },

    #[error("capacity violation: write ending at {end} exceeds the declared maximum of {max}")]
    CapacityViolation { end: usize, max: usize },

    #[error("unsupported operation {operation}")]
    Unsupported { operation: String },

    #[error("resource is disposed")]
    Disposed,

    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid encoding of '{element}': {message}")]
    InvalidFormat { element: String, message: String },

    #[error("IO error for '{context}': {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io("", e)
    }
}

impl From<Error> for std::io::Error {
    fn from(e: Error) -> Self {
        let kind = match e.kind() {
            ErrorKind::EndOfData { .. } => std::io::ErrorKind::UnexpectedEof,
            ErrorKind::CapacityViolation { .. } => std::io::ErrorKind::WriteZero,
            ErrorKind::Unsupported { .. } => std::io::ErrorKind::Unsupported,
            ErrorKind::InvalidArgument { .. } => std::io::ErrorKind::InvalidInput,
            ErrorKind::InvalidFormat { .. } => std::io::ErrorKind::InvalidData,
            ErrorKind::Disposed | ErrorKind::Io { .. } => std::io::ErrorKind::Other,
        };
        match e.into_kind() {
            ErrorKind::Io { source, .. } => source,
            other => std::io::Error::new(kind, Error::from(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_of_data_message() {
        let e = Error::end_of_data(10, 4, 12);
        assert!(e.is_end_of_data());
        assert_eq!(
            e.to_string(),
            "end of data: 4 bytes requested at position 10, logical size is 12"
        );
    }

    #[test]
    fn test_into_io_error() {
        let e: std::io::Error = Error::end_of_data(0, 1, 0).into();
        assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof);

        let e: std::io::Error = Error::unsupported("as_bytes").into();
        assert_eq!(e.kind(), std::io::ErrorKind::Unsupported);

        let source = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
        let e: std::io::Error = Error::io("write", source).into();
        assert_eq!(e.kind(), std::io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_kind_roundtrip() {
        let e = Error::capacity_violation(20, 16);
        match e.into_kind() {
            ErrorKind::CapacityViolation { end, max } => {
                assert_eq!(end, 20);
                assert_eq!(max, 16);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
