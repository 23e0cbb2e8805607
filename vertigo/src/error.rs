//! `vertigo` error types.
use std::{backtrace::Backtrace, fmt, io};

use crate::{
    common::unit_error,
    connection::{ParseError, UnsupportedAuth},
    protocol::{ErrorResponse, ProtocolError},
    row::DecodeError,
    transport::SslError,
};

/// A specialized [`Result`] type for `vertigo` operation.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// All possible error from `vertigo` library.
pub struct Error {
    context: String,
    backtrace: Backtrace,
    kind: ErrorKind,
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn into_kind(self) -> ErrorKind {
        self.kind
    }

    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// Prefix the error message with `context`.
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// Returns the server error, if this is one.
    pub fn as_database(&self) -> Option<&ErrorResponse> {
        match &self.kind {
            ErrorKind::Database(e) => Some(e),
            _ => None,
        }
    }
}

unit_error! {
    /// An error when operating on a connection that is closed.
    pub struct Closed("connection is closed");
}

unit_error! {
    /// An error when query text is empty or blank.
    pub struct EmptyQuery("query is empty");
}

/// All possible error kind from `vertigo` library.
pub enum ErrorKind {
    Closed(Closed),
    EmptyQuery(EmptyQuery),
    Config(ParseError),
    Ssl(SslError),
    Database(ErrorResponse),
    Protocol(ProtocolError),
    UnsupportedAuth(UnsupportedAuth),
    Io(io::Error),
    Decode(DecodeError),
}

macro_rules! from {
    (<$ty:ty>$pat:pat => $body:expr) => {
        impl From<$ty> for Error {
            fn from($pat: $ty) -> Self {
                let backtrace = std::backtrace::Backtrace::capture();
                Self { context: String::new(), backtrace, kind: $body }
            }
        }
    };
}

from!(<ErrorKind>e => e);
from!(<Closed>e => ErrorKind::Closed(e));
from!(<EmptyQuery>e => ErrorKind::EmptyQuery(e));
from!(<ParseError>e => ErrorKind::Config(e));
from!(<SslError>e => ErrorKind::Ssl(e));
from!(<ErrorResponse>e => ErrorKind::Database(e));
from!(<ProtocolError>e => ErrorKind::Protocol(e));
from!(<UnsupportedAuth>e => ErrorKind::UnsupportedAuth(e));
from!(<io::Error>e => ErrorKind::Io(e));
from!(<DecodeError>e => ErrorKind::Decode(e));

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Io(e) => Some(e),
            ErrorKind::Database(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.context.is_empty() {
            write!(f, "{}: ", self.context)?;
        }

        fmt::Display::fmt(&self.kind, f)?;

        if let std::backtrace::BacktraceStatus::Captured = self.backtrace.status() {
            let mut backtrace = self.backtrace.to_string();
            write!(f, "\n\n")?;
            writeln!(f, "Stack backtrace:")?;
            backtrace.truncate(backtrace.trim_end().len());
            write!(f, "{}", backtrace)?;
        }

        Ok(())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

impl std::error::Error for ErrorKind { }

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed(e) => e.fmt(f),
            Self::EmptyQuery(e) => e.fmt(f),
            Self::Config(e) => e.fmt(f),
            Self::Ssl(e) => e.fmt(f),
            Self::Database(e) => e.fmt(f),
            Self::Protocol(e) => e.fmt(f),
            Self::UnsupportedAuth(e) => e.fmt(f),
            Self::Io(e) => e.fmt(f),
            Self::Decode(e) => e.fmt(f),
        }
    }
}

impl fmt::Debug for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}
