//! Frontend Messages
//!
//! <https://www.postgresql.org/docs/current/protocol-message-formats.html>
use bytes::{BufMut, Bytes, BytesMut};

use super::{Format, Oid};
use crate::ext::{BufMutExt, StrExt, UsizeExt};

/// Write a frontend message to `buf`.
pub fn write<F: FrontendProtocol>(msg: F, buf: &mut BytesMut) {
    // msgtype + length
    const PREFIX: usize = 1 + 4;

    let size_hint = msg.size_hint();
    buf.reserve(PREFIX + size_hint as usize);

    let offset = buf.len();
    buf.put_u8(F::MSGTYPE);
    buf.put_u32(4 + size_hint);

    msg.encode(&mut *buf);

    assert_eq!(
        buf.len() - offset,
        PREFIX + size_hint as usize,
        "Frontend message body size not equal to size hint"
    );
}

/// A type which can be encoded into frontend message
pub trait FrontendProtocol {
    /// Message type.
    const MSGTYPE: u8;

    /// Size of the main body.
    ///
    /// Note that this is **only** the size of main body as oppose of actual message which
    /// include the length itself.
    fn size_hint(&self) -> u32;

    /// Write the main body of the message.
    ///
    /// The length of body written must be equal to the
    /// length returned by [`size_hint`][FrontendProtocol::size_hint].
    fn encode(self, buf: impl BufMut);
}

/// Protocol version 3.0, major version in the most significant 16 bits.
pub const PROTOCOL_VERSION: u32 = 196_608;

/// Request code of [`SslRequest`], `1234` in the most significant 16 bits and `5679` in the least.
pub const SSL_REQUEST_CODE: u32 = 80_877_103;

/// Request code of [`CancelRequest`], `1234` in the most significant 16 bits and `5678` in the least.
pub const CANCEL_REQUEST_CODE: u32 = 80_877_102;

/// Startup frontend message.
///
/// For historical reasons, the very first message sent by the client
/// has no initial message-type byte, thus [`Startup`] does not implement [`FrontendProtocol`].
#[derive(Debug)]
pub struct Startup<'a> {
    /// The database user name to connect as.
    pub user: &'a str,
    /// The database to connect to.
    pub database: Option<&'a str>,
}

impl Startup<'_> {
    pub fn write(self, buf: &mut BytesMut) {
        let offset = buf.len();

        // reserve 4 bytes for length, which includes itself
        buf.put_u32(0);
        buf.put_u32(PROTOCOL_VERSION);

        buf.put_nul_string("user");
        buf.put_nul_string(self.user);

        if let Some(db) = self.database.filter(|db| !db.is_empty()) {
            buf.put_nul_string("database");
            buf.put_nul_string(db);
        }

        // terminator after the last name/value pair
        buf.put_u8(b'\0');

        let mut written_buf = &mut buf[offset..];
        let len = written_buf.len().to_u32();
        written_buf.put_u32(len);
    }
}

/// Request the connection to be encrypted with SSL.
///
/// The server responds with a single byte, `S` to proceed with the TLS handshake.
#[derive(Debug)]
pub struct SslRequest;

impl SslRequest {
    pub fn write(self, buf: &mut BytesMut) {
        buf.put_u32(8);
        buf.put_u32(SSL_REQUEST_CODE);
    }
}

/// Request to cancel the query running in another backend.
///
/// Must be the first and only message on a fresh connection.
#[derive(Debug)]
pub struct CancelRequest {
    /// The process ID of the target backend.
    pub process_id: u32,
    /// The secret key for the target backend.
    pub secret_key: u32,
}

impl CancelRequest {
    pub fn write(self, buf: &mut BytesMut) {
        buf.put_u32(16);
        buf.put_u32(CANCEL_REQUEST_CODE);
        buf.put_u32(self.process_id);
        buf.put_u32(self.secret_key);
    }
}

/// Password response, hashed if the server requested so.
#[derive(Debug)]
pub struct PasswordMessage<'a> {
    pub password: &'a str,
}

impl FrontendProtocol for PasswordMessage<'_> {
    const MSGTYPE: u8 = b'p';

    fn size_hint(&self) -> u32 {
        self.password.nul_string_len()
    }

    fn encode(self, mut buf: impl BufMut) {
        buf.put_nul_string(self.password);
    }
}

/// Simple query.
#[derive(Debug)]
pub struct Query<'a> {
    pub sql: &'a str,
}

impl FrontendProtocol for Query<'_> {
    const MSGTYPE: u8 = b'Q';

    fn size_hint(&self) -> u32 {
        self.sql.nul_string_len()
    }

    fn encode(self, mut buf: impl BufMut) {
        buf.put_nul_string(self.sql);
    }
}

/// Parse a statement into a named prepared statement.
#[derive(Debug)]
pub struct Parse<'a> {
    /// An empty string selects the unnamed prepared statement.
    pub prepare_name: &'a str,
    pub sql: &'a str,
    /// Parameter data types, zero leaves the type unspecified.
    pub oids: &'a [Oid],
}

impl FrontendProtocol for Parse<'_> {
    const MSGTYPE: u8 = b'P';

    fn size_hint(&self) -> u32 {
        self.prepare_name.nul_string_len()
            + self.sql.nul_string_len()
            + 2
            + 4 * self.oids.len().to_u32()
    }

    fn encode(self, mut buf: impl BufMut) {
        buf.put_nul_string(self.prepare_name);
        buf.put_nul_string(self.sql);
        buf.put_u16(self.oids.len().to_u16());
        for &oid in self.oids {
            buf.put_u32(oid);
        }
    }
}

/// Bind parameters to a prepared statement, creating a portal.
#[derive(Debug)]
pub struct Bind<'a> {
    /// An empty string selects the unnamed portal.
    pub portal_name: &'a str,
    pub stmt_name: &'a str,
    /// Zero entries means all parameters use text.
    pub param_formats: &'a [Format],
    /// `None` is a NULL parameter.
    pub params: &'a [Option<Bytes>],
    /// Zero entries means all result columns use text.
    pub result_formats: &'a [Format],
}

impl FrontendProtocol for Bind<'_> {
    const MSGTYPE: u8 = b'B';

    fn size_hint(&self) -> u32 {
        let params = self.params.iter().fold(0, |acc, param| {
            acc + 4 + param.as_ref().map_or(0, |value| value.len().to_u32())
        });

        self.portal_name.nul_string_len()
            + self.stmt_name.nul_string_len()
            + 2
            + 2 * self.param_formats.len().to_u32()
            + 2
            + params
            + 2
            + 2 * self.result_formats.len().to_u32()
    }

    fn encode(self, mut buf: impl BufMut) {
        buf.put_nul_string(self.portal_name);
        buf.put_nul_string(self.stmt_name);

        buf.put_u16(self.param_formats.len().to_u16());
        for format in self.param_formats {
            buf.put_u16(format.format_code());
        }

        buf.put_u16(self.params.len().to_u16());
        for param in self.params {
            match param {
                Some(value) => {
                    buf.put_i32(value.len().to_u32() as i32);
                    buf.put_slice(value);
                },
                None => buf.put_i32(-1),
            }
        }

        buf.put_u16(self.result_formats.len().to_u16());
        for format in self.result_formats {
            buf.put_u16(format.format_code());
        }
    }
}

/// Execute a portal.
#[derive(Debug)]
pub struct Execute<'a> {
    pub portal_name: &'a str,
    /// Zero denotes “no limit”.
    pub max_row: u32,
}

impl FrontendProtocol for Execute<'_> {
    const MSGTYPE: u8 = b'E';

    fn size_hint(&self) -> u32 {
        self.portal_name.nul_string_len() + 4
    }

    fn encode(self, mut buf: impl BufMut) {
        buf.put_nul_string(self.portal_name);
        buf.put_u32(self.max_row);
    }
}

/// Kind of target of [`Describe`] and [`Close`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    PreparedStatement,
    Portal,
}

impl Target {
    fn code(self) -> u8 {
        match self {
            Target::PreparedStatement => b'S',
            Target::Portal => b'P',
        }
    }
}

/// Describe a prepared statement or a portal.
#[derive(Debug)]
pub struct Describe<'a> {
    pub target: Target,
    pub name: &'a str,
}

impl FrontendProtocol for Describe<'_> {
    const MSGTYPE: u8 = b'D';

    fn size_hint(&self) -> u32 {
        1 + self.name.nul_string_len()
    }

    fn encode(self, mut buf: impl BufMut) {
        buf.put_u8(self.target.code());
        buf.put_nul_string(self.name);
    }
}

/// Close a prepared statement or a portal.
#[derive(Debug)]
pub struct Close<'a> {
    pub target: Target,
    pub name: &'a str,
}

impl FrontendProtocol for Close<'_> {
    const MSGTYPE: u8 = b'C';

    fn size_hint(&self) -> u32 {
        1 + self.name.nul_string_len()
    }

    fn encode(self, mut buf: impl BufMut) {
        buf.put_u8(self.target.code());
        buf.put_nul_string(self.name);
    }
}

macro_rules! unit_msg {
    ($(
        $(#[$doc:meta])* struct $name:ident, $ty:literal;
    )*) => {$(
        $(#[$doc])*
        #[derive(Debug)]
        pub struct $name;

        impl FrontendProtocol for $name {
            const MSGTYPE: u8 = $ty;

            fn size_hint(&self) -> u32 { 0 }

            fn encode(self, _: impl BufMut) { }
        }
    )*};
}

unit_msg! {
    /// End of an extended query cycle, the server answers with `ReadyForQuery`.
    struct Sync, b'S';

    /// Ask the server to deliver any pending output.
    struct Flush, b'H';

    /// Graceful end of the session.
    struct Terminate, b'X';
}

#[cfg(test)]
mod test {
    use super::*;

    fn encoded<F: FrontendProtocol>(msg: F) -> BytesMut {
        let mut buf = BytesMut::new();
        write(msg, &mut buf);
        buf
    }

    #[test]
    fn query_message() {
        let buf = encoded(Query { sql: "SELECT 1" });
        assert_eq!(&buf[..], b"Q\0\0\0\x0dSELECT 1\0");
    }

    #[test]
    fn unit_messages() {
        assert_eq!(&encoded(Sync)[..], b"S\0\0\0\x04");
        assert_eq!(&encoded(Flush)[..], b"H\0\0\0\x04");
        assert_eq!(&encoded(Terminate)[..], b"X\0\0\0\x04");
    }

    #[test]
    fn startup_message() {
        let mut buf = BytesMut::new();
        Startup { user: "dbadmin", database: Some("db") }.write(&mut buf);
        let expected: &[u8] = b"\0\0\0\x22\0\x03\0\0user\0dbadmin\0database\0db\0\0";
        assert_eq!(&buf[..], expected);
    }

    #[test]
    fn startup_without_database() {
        let mut buf = BytesMut::new();
        Startup { user: "u", database: Some("") }.write(&mut buf);
        assert_eq!(&buf[..], b"\0\0\0\x10\0\x03\0\0user\0u\0\0");
    }

    #[test]
    fn ssl_and_cancel_request() {
        let mut buf = BytesMut::new();
        SslRequest.write(&mut buf);
        assert_eq!(&buf[..], b"\0\0\0\x08\x04\xd2\x16\x2f");

        let mut buf = BytesMut::new();
        CancelRequest { process_id: 7, secret_key: 9 }.write(&mut buf);
        assert_eq!(&buf[..], b"\0\0\0\x10\x04\xd2\x16\x2e\0\0\0\x07\0\0\0\x09");
    }

    #[test]
    fn parse_with_unspecified_types() {
        let buf = encoded(Parse { prepare_name: "s1", sql: "SELECT $1", oids: &[0, 0] });
        assert_eq!(buf[0], b'P');
        assert_eq!(&buf[1..5], &(4u32 + 3 + 10 + 2 + 8).to_be_bytes());
        assert_eq!(&buf[buf.len() - 10..], b"\0\x02\0\0\0\0\0\0\0\0");
    }

    #[test]
    fn bind_with_null() {
        let params = [Some(Bytes::from_static(b"1")), None];
        let buf = encoded(Bind {
            portal_name: "",
            stmt_name: "s1",
            param_formats: &[],
            params: &params,
            result_formats: &[],
        });
        let expected: &[u8] = b"B\0\0\0\x17\0s1\0\0\0\0\x02\0\0\0\x011\xff\xff\xff\xff\0\0";
        assert_eq!(&buf[..], expected);
    }

    #[test]
    fn describe_and_close() {
        let buf = encoded(Describe { target: Target::PreparedStatement, name: "s1" });
        assert_eq!(&buf[..], b"D\0\0\0\x08Ss1\0");
        let buf = encoded(Close { target: Target::Portal, name: "" });
        assert_eq!(&buf[..], b"C\0\0\0\x06P\0");
    }

    #[test]
    fn execute_all_rows() {
        let buf = encoded(Execute { portal_name: "", max_row: 0 });
        assert_eq!(&buf[..], b"E\0\0\0\x09\0\0\0\0\0");
    }
}
