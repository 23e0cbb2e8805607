//! Frontend and Backend Protocol
//!
//! The server speaks protocol version 3.0 of the PostgreSQL frontend/backend
//! protocol, with its own set of data type object identifiers.
//!
//! ## Messaging Overview
//!
//! All communication is through a stream of messages. The first byte of a message identifies the message type,
//! and the next four bytes specify the length of the rest of the message (this length count includes itself,
//! but not the message-type byte). The remaining contents of the message are determined by the message type.
//!
//! ```text
//! ┏━━━━┳━━━━━━━━━━━━━━━━━━━┳━━━━━━┓
//! ┃ Ty ┃       Length      ┃ Body ┃
//! ┣━━━━╋━━━━━━━━━━━━━━━━━━━╋━━━━━━┫
//! ┃ u8 ┃        u32        ┃ [u8] ┃
//! ┗━━━━┻━━━━━━━━━━━━━━━━━━━┻━━━━━━┛
//! ```
//!
//! The startup, SSL request and cancel request messages have no message-type byte.
//!
//! <https://www.postgresql.org/docs/current/protocol-overview.html>

pub mod frontend;
pub mod backend;

mod error;

pub use frontend::FrontendProtocol;
pub use backend::{BackendMessage, ErrorResponse};
pub use error::ProtocolError;

/// Data type object identifier.
pub type Oid = u32;

/// Data transmission format of a parameter or a result column.
///
/// This library always requests [`Text`][Format::Text].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Text has format code zero.
    Text,
    /// Binary has format code one.
    Binary,
}

impl Format {
    /// Return format code for current format.
    pub fn format_code(&self) -> u16 {
        match self {
            Format::Text => 0,
            Format::Binary => 1,
        }
    }
}
