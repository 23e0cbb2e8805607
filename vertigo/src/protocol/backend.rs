//! Backend Messages
use bytes::{Buf, Bytes};
use std::fmt;

use super::{Oid, ProtocolError};
use crate::{common::ByteStr, ext::BytesExt};

/// A type that can be decoded from a backend message.
pub trait BackendProtocol: Sized {
    fn decode(msgtype: u8, body: Bytes) -> Result<Self, ProtocolError>;
}

/// Backend messages.
///
/// Message types this client does not know about decode into
/// [`Unknown`][BackendMessage::Unknown], it is up to the caller to reject them.
#[derive(Debug)]
pub enum BackendMessage {
    Authentication(Authentication),
    BackendKeyData(BackendKeyData),
    BindComplete(BindComplete),
    CloseComplete(CloseComplete),
    CommandComplete(CommandComplete),
    DataRow(DataRow),
    EmptyQueryResponse(EmptyQueryResponse),
    ErrorResponse(ErrorResponse),
    NoData(NoData),
    NoticeResponse(NoticeResponse),
    NotificationResponse(NotificationResponse),
    ParameterDescription(ParameterDescription),
    ParameterStatus(ParameterStatus),
    ParseComplete(ParseComplete),
    PortalSuspended(PortalSuspended),
    ReadyForQuery(ReadyForQuery),
    RowDescription(RowDescription),
    Unknown {
        msgtype: u8,
        body: Bytes,
    },
}

macro_rules! match_backend {
    ($($name:ident,)*) => {
        impl BackendMessage {
            pub fn msgtype(&self) -> u8 {
                match self {
                    $(Self::$name(_) => $name::MSGTYPE,)*
                    Self::Unknown { msgtype, .. } => *msgtype,
                }
            }

            /// Get message name from message type.
            ///
            /// Returns `"Unknown"` for unknown message type.
            pub fn message_name(msgtype: u8) -> &'static str {
                match msgtype {
                    $($name::MSGTYPE => stringify!($name),)*
                    _ => "Unknown",
                }
            }
        }

        impl BackendProtocol for BackendMessage {
            fn decode(msgtype: u8, body: Bytes) -> Result<Self, ProtocolError> {
                let message = match msgtype {
                    $($name::MSGTYPE => Self::$name(<$name as BackendProtocol>::decode(msgtype, body)?),)*
                    _ => Self::Unknown { msgtype, body },
                };
                Ok(message)
            }
        }
    };
}

match_backend! {
    Authentication,
    BackendKeyData,
    BindComplete,
    CloseComplete,
    CommandComplete,
    DataRow,
    EmptyQueryResponse,
    ErrorResponse,
    NoData,
    NoticeResponse,
    NotificationResponse,
    ParameterDescription,
    ParameterStatus,
    ParseComplete,
    PortalSuspended,
    ReadyForQuery,
    RowDescription,
}

macro_rules! assert_msgtype {
    ($typ:ident) => {
        if Self::MSGTYPE != $typ {
            return Err(ProtocolError::unexpected(Self::MSGTYPE, $typ))
        }
    };
}

/// Identifies the message as an authentication request.
#[derive(Debug)]
pub enum Authentication {
    /// Specifies that the authentication was successful.
    Ok,
    /// Specifies that Kerberos V5 authentication is required.
    KerberosV5,
    /// Specifies that a clear-text password is required.
    CleartextPassword,
    /// Specifies that a crypt(3) encrypted password is required.
    CryptPassword {
        salt: [u8; 2],
    },
    /// Specifies that an MD5-encrypted password is required.
    MD5Password {
        salt: [u8; 4],
    },
    /// Specifies that an SCM credentials message is required.
    ScmCredential,
    /// Specifies that GSSAPI authentication is required.
    GSS,
    /// GSSAPI or SSPI authentication data.
    GSSContinue {
        data: Bytes,
    },
    /// Specifies that SSPI authentication is required.
    SSPI,
    /// Any other authentication method.
    Other {
        code: u32,
        data: Bytes,
    },
}

impl Authentication {
    pub const MSGTYPE: u8 = b'R';

    /// The authentication method code sent by the server.
    pub fn code(&self) -> u32 {
        match self {
            Authentication::Ok => 0,
            Authentication::KerberosV5 => 2,
            Authentication::CleartextPassword => 3,
            Authentication::CryptPassword { .. } => 4,
            Authentication::MD5Password { .. } => 5,
            Authentication::ScmCredential => 6,
            Authentication::GSS => 7,
            Authentication::GSSContinue { .. } => 8,
            Authentication::SSPI => 9,
            Authentication::Other { code, .. } => *code,
        }
    }
}

impl BackendProtocol for Authentication {
    fn decode(msgtype: u8, mut body: Bytes) -> Result<Self, ProtocolError> {
        assert_msgtype!(msgtype);
        body.ensure(4)?;
        let auth = match body.get_u32() {
            0 => Authentication::Ok,
            2 => Authentication::KerberosV5,
            3 => Authentication::CleartextPassword,
            4 => {
                body.ensure(2)?;
                Authentication::CryptPassword { salt: body.get_u16().to_be_bytes() }
            },
            5 => {
                body.ensure(4)?;
                Authentication::MD5Password { salt: body.get_u32().to_be_bytes() }
            },
            6 => Authentication::ScmCredential,
            7 => Authentication::GSS,
            8 => Authentication::GSSContinue { data: body },
            9 => Authentication::SSPI,
            code => Authentication::Other { code, data: body },
        };
        Ok(auth)
    }
}

/// Identifies the message as cancellation key data.
///
/// The frontend must save these values if it wishes to be able to issue CancelRequest messages later.
#[derive(Debug)]
pub struct BackendKeyData {
    /// The process ID of this backend.
    pub process_id: u32,
    /// The secret key of this backend.
    pub secret_key: u32,
}

impl BackendKeyData {
    pub const MSGTYPE: u8 = b'K';
}

impl BackendProtocol for BackendKeyData {
    fn decode(msgtype: u8, mut body: Bytes) -> Result<Self, ProtocolError> {
        assert_msgtype!(msgtype);
        body.ensure(8)?;
        Ok(Self {
            process_id: body.get_u32(),
            secret_key: body.get_u32(),
        })
    }
}

/// Identifies the message as a run-time parameter status report.
#[derive(Debug)]
pub struct ParameterStatus {
    pub name: ByteStr,
    pub value: ByteStr,
}

impl ParameterStatus {
    pub const MSGTYPE: u8 = b'S';
}

impl BackendProtocol for ParameterStatus {
    fn decode(msgtype: u8, mut body: Bytes) -> Result<Self, ProtocolError> {
        assert_msgtype!(msgtype);
        Ok(Self {
            name: body.get_nul_bytestr()?,
            value: body.get_nul_bytestr()?,
        })
    }
}

/// Identified fields of an error or notice message.
///
/// Each field is a code identifying the field type followed by the field value.
/// Fields can appear in any order.
#[derive(Clone, Default)]
pub struct Fields {
    fields: Vec<(u8, ByteStr)>,
}

impl Fields {
    fn decode(mut body: Bytes) -> Result<Self, ProtocolError> {
        let mut fields = vec![];
        loop {
            body.ensure(1)?;
            let code = body.get_u8();
            if code == b'\0' {
                break;
            }
            fields.push((code, body.get_nul_bytestr()?));
        }
        Ok(Self { fields })
    }

    /// Get field value by its type code.
    pub fn get(&self, code: u8) -> Option<&str> {
        self.fields
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, value)| value.as_str())
    }

    /// Iterate over `(code, value)` in received order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &str)> {
        self.fields.iter().map(|(code, value)| (*code, value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Debug for Fields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.fields.iter().map(|(code, value)| (*code as char, value)))
            .finish()
    }
}

/// Identifies the message as an error.
///
/// The message body consists of one or more identified [`Fields`].
#[derive(Clone)]
pub struct ErrorResponse {
    fields: Fields,
}

impl ErrorResponse {
    pub const MSGTYPE: u8 = b'E';

    /// Severity: `ERROR`, `FATAL`, or `PANIC`.
    pub fn severity(&self) -> Option<&str> {
        self.fields.get(b'S')
    }

    /// The SQLSTATE code for the error.
    pub fn code(&self) -> Option<&str> {
        self.fields.get(b'C')
    }

    /// The primary human-readable error message.
    pub fn message(&self) -> Option<&str> {
        self.fields.get(b'M')
    }

    /// An optional secondary error message carrying more detail about the problem.
    pub fn detail(&self) -> Option<&str> {
        self.fields.get(b'D')
    }

    /// An optional suggestion what to do about the problem.
    pub fn hint(&self) -> Option<&str> {
        self.fields.get(b'H')
    }

    /// Error cursor position as an index into the original query string.
    pub fn position(&self) -> Option<usize> {
        self.fields.get(b'P').and_then(|p| p.parse().ok())
    }

    /// All fields as received.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }
}

impl BackendProtocol for ErrorResponse {
    fn decode(msgtype: u8, body: Bytes) -> Result<Self, ProtocolError> {
        assert_msgtype!(msgtype);
        Ok(Self { fields: Fields::decode(body)? })
    }
}

impl std::error::Error for ErrorResponse { }

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}",
            self.severity().unwrap_or("ERROR"),
            self.message().unwrap_or("unknown error"),
        )?;
        if let Some(code) = self.code() {
            write!(f, " (SQLSTATE {code})")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ErrorResponse").field(&self.fields).finish()
    }
}

/// A warning message, same layout as [`ErrorResponse`].
#[derive(Debug)]
pub struct NoticeResponse {
    pub fields: Fields,
}

impl NoticeResponse {
    pub const MSGTYPE: u8 = b'N';
}

impl BackendProtocol for NoticeResponse {
    fn decode(msgtype: u8, body: Bytes) -> Result<Self, ProtocolError> {
        assert_msgtype!(msgtype);
        Ok(Self { fields: Fields::decode(body)? })
    }
}

/// Identifies the message as a notification response.
#[derive(Debug)]
pub struct NotificationResponse {
    /// The process ID of the notifying backend process.
    pub process_id: u32,
    /// The name of the channel that the notify has been raised on.
    pub channel: ByteStr,
    /// The “payload” string passed from the notifying process.
    pub payload: ByteStr,
}

impl NotificationResponse {
    pub const MSGTYPE: u8 = b'A';
}

impl BackendProtocol for NotificationResponse {
    fn decode(msgtype: u8, mut body: Bytes) -> Result<Self, ProtocolError> {
        assert_msgtype!(msgtype);
        body.ensure(4)?;
        Ok(Self {
            process_id: body.get_u32(),
            channel: body.get_nul_bytestr()?,
            payload: body.get_nul_bytestr()?,
        })
    }
}

/// A single field of a [`RowDescription`].
#[derive(Debug, Clone)]
pub struct FieldDescription {
    pub name: ByteStr,
    /// The object ID of the table, or zero.
    pub table_oid: u32,
    /// The attribute number of the column, or zero.
    pub attribute_number: u16,
    /// The object ID of the field's data type.
    pub type_oid: Oid,
    /// Negative values denote variable-width types.
    pub type_size: i16,
    /// The meaning of the modifier is type-specific.
    pub type_modifier: i32,
    /// Zero (text) or one (binary).
    pub format_code: u16,
}

impl FieldDescription {
    fn decode(body: &mut Bytes) -> Result<Self, ProtocolError> {
        let name = body.get_nul_bytestr()?;
        body.ensure(18)?;
        Ok(Self {
            name,
            table_oid: body.get_u32(),
            attribute_number: body.get_u16(),
            type_oid: body.get_u32(),
            type_size: body.get_i16(),
            type_modifier: body.get_i32(),
            format_code: body.get_u16(),
        })
    }
}

/// Identifies the message as a row description.
#[derive(Debug)]
pub struct RowDescription {
    pub fields: Vec<FieldDescription>,
}

impl RowDescription {
    pub const MSGTYPE: u8 = b'T';
}

impl BackendProtocol for RowDescription {
    fn decode(msgtype: u8, mut body: Bytes) -> Result<Self, ProtocolError> {
        assert_msgtype!(msgtype);
        body.ensure(2)?;
        let len = body.get_u16();
        let fields = (0..len)
            .map(|_| FieldDescription::decode(&mut body))
            .collect::<Result<_, _>>()?;
        Ok(Self { fields })
    }
}

/// Identifies the message as a data row.
#[derive(Debug)]
pub struct DataRow {
    /// Column values, [`None`] is NULL.
    pub fields: Vec<Option<Bytes>>,
}

impl DataRow {
    pub const MSGTYPE: u8 = b'D';
}

impl BackendProtocol for DataRow {
    fn decode(msgtype: u8, mut body: Bytes) -> Result<Self, ProtocolError> {
        assert_msgtype!(msgtype);
        body.ensure(2)?;
        let len = body.get_u16();
        let fields = (0..len)
            .map(|_| body.get_nullable())
            .collect::<Result<_, _>>()?;
        Ok(Self { fields })
    }
}

/// Identifies the message as a command-completed response.
#[derive(Debug)]
pub struct CommandComplete {
    /// The command tag, usually a single word that identifies which SQL command was completed.
    pub tag: ByteStr,
}

impl CommandComplete {
    pub const MSGTYPE: u8 = b'C';
}

impl BackendProtocol for CommandComplete {
    fn decode(msgtype: u8, mut body: Bytes) -> Result<Self, ProtocolError> {
        assert_msgtype!(msgtype);
        Ok(Self { tag: body.get_nul_bytestr()? })
    }
}

/// Identifies the message as a parameter description.
#[derive(Debug)]
pub struct ParameterDescription {
    /// Data type of each parameter used by the statement.
    pub oids: Vec<Oid>,
}

impl ParameterDescription {
    pub const MSGTYPE: u8 = b't';
}

impl BackendProtocol for ParameterDescription {
    fn decode(msgtype: u8, mut body: Bytes) -> Result<Self, ProtocolError> {
        assert_msgtype!(msgtype);
        body.ensure(2)?;
        let len = usize::from(body.get_u16());
        body.ensure(len * 4)?;
        Ok(Self { oids: (0..len).map(|_| body.get_u32()).collect() })
    }
}

/// Sent whenever the backend is ready for a new query cycle.
#[derive(Debug)]
pub struct ReadyForQuery {
    /// `I` if idle (not in a transaction block), `T` if in a transaction block,
    /// or `E` if in a failed transaction block.
    pub status: u8,
}

impl ReadyForQuery {
    pub const MSGTYPE: u8 = b'Z';
}

impl BackendProtocol for ReadyForQuery {
    fn decode(msgtype: u8, mut body: Bytes) -> Result<Self, ProtocolError> {
        assert_msgtype!(msgtype);
        body.ensure(1)?;
        Ok(Self { status: body.get_u8() })
    }
}

macro_rules! unit_msg {
    ($(
        $(#[$doc:meta])* struct $name:ident, $ty:literal;
    )*) => {$(
        $(#[$doc])*
        #[derive(Debug)]
        pub struct $name;

        impl $name {
            pub const MSGTYPE: u8 = $ty;
        }

        impl BackendProtocol for $name {
            fn decode(msgtype: u8, _: Bytes) -> Result<Self, ProtocolError> {
                assert_msgtype!(msgtype);
                Ok(Self)
            }
        }
    )*};
}

unit_msg! {
    /// Identifies the message as a Bind-complete indicator.
    struct BindComplete, b'2';

    /// Identifies the message as a Close-complete indicator.
    struct CloseComplete, b'3';

    /// Identifies the message as a response to an empty query string.
    ///
    /// This substitutes for CommandComplete.
    struct EmptyQueryResponse, b'I';

    /// Identifies the message as a no-data indicator.
    struct NoData, b'n';

    /// Identifies the message as a Parse-complete indicator.
    struct ParseComplete, b'1';

    /// Identifies the message as a portal-suspended indicator.
    ///
    /// Note this only appears if an Execute message's row-count limit was reached.
    struct PortalSuspended, b's';
}
