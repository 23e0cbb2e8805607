//! Protocol error
use std::{fmt, str::Utf8Error};

use super::BackendMessage;

/// An error when translating buffer from the server.
pub enum ProtocolError {
    /// A message arrived that is not valid at this point of the conversation.
    Unexpected {
        expect: Option<u8>,
        found: u8,
    },
    /// Message body does not match its message type layout.
    Malformed(&'static str),
    /// A data row with a different number of cells than the row description.
    ColumnCount {
        expect: usize,
        found: usize,
    },
    /// A string field that is not valid UTF-8.
    Utf8(Utf8Error),
}

impl ProtocolError {
    pub(crate) fn unknown(found: u8) -> ProtocolError {
        Self::Unexpected { expect: None, found }
    }

    pub(crate) fn unexpected(expect: u8, found: u8) -> ProtocolError {
        Self::Unexpected { expect: Some(expect), found }
    }

    pub(crate) fn malformed(reason: &'static str) -> ProtocolError {
        Self::Malformed(reason)
    }
}

impl From<Utf8Error> for ProtocolError {
    fn from(value: Utf8Error) -> Self {
        Self::Utf8(value)
    }
}

impl std::error::Error for ProtocolError { }

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ProtocolError::Unexpected { expect, found } => {
                let name = BackendMessage::message_name(found);
                match expect {
                    Some(m) => write!(
                        f,
                        "Expected message `{}` found `{name}`",
                        BackendMessage::message_name(m),
                    ),
                    None if name == "Unknown" => {
                        write!(f, "Unknown message type `{}`", found.escape_ascii())
                    }
                    None => write!(f, "Unexpected message `{name}`"),
                }
            }
            ProtocolError::Malformed(reason) => write!(f, "Malformed message: {reason}"),
            ProtocolError::ColumnCount { expect, found } => write!(
                f,
                "Data row has {found} values, row description has {expect} columns"
            ),
            ProtocolError::Utf8(ref e) => write!(f, "Non UTF-8 string in message: {e}"),
        }
    }
}

impl fmt::Debug for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
