//! Synchronous Vertica Driver
//!
//! # Examples
//!
//! ```no_run
//! use vertigo::{Connection, Value};
//!
//! # fn app() -> vertigo::Result<()> {
//! let mut conn = Connection::connect_env()?;
//!
//! let res = conn.execute("SELECT 420 AS answer, 'Foo' AS name")?;
//!
//! assert_eq!(res.value(0, "answer")?, &Value::Integer(420));
//! assert_eq!(res.value(0, 1)?.as_str(), Some("Foo"));
//!
//! conn.prepare("ins", "INSERT INTO foo(id, name) VALUES(?, ?)", 2)?;
//! for i in 0..14 {
//!     conn.execute_prepared("ins", &[&i, &"bar"])?;
//! }
//!
//! let foos = conn.execute("SELECT * FROM foo")?;
//! assert_eq!(foos.len(), 14);
//!
//! conn.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - `tls` (default), SSL negotiation using `rustls`
//! - `serde`, serialize [`Value`] and session types
//! - `log`, lifecycle and notice logging using `log`
//! - `verbose`, wire level tracing using `tracing`

pub mod common;
mod ext;
mod net;

// Protocol
pub mod protocol;
pub mod transport;
mod stream;

// Encoding
pub mod types;
pub mod encode;

// Component
pub mod row;
pub mod result;
pub mod connection;

mod error;

pub use encode::{Encode, Encoded};
pub use types::{DataType, Value};
pub use row::{Column, DecodeError, Index, Row};
pub use result::QueryResult;

pub use connection::{
    Config, Connection, Notice, Notification, TransactionStatus, cancel, cancel_with,
};
pub use net::Socket;
pub use error::{Closed, EmptyQuery, Error, ErrorKind, Result};
