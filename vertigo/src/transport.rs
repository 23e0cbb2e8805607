//! The [`Transport`] trait.
use std::{
    fmt,
    io::{self, Read, Write},
};

use crate::connection::Config;

/// A blocking byte stream to the server.
///
/// The connection only ever talks through this trait, a test can replace the
/// real socket with a scripted one.
pub trait Transport: Read + Write + Sized {
    /// Open a connection to `host:port`.
    fn connect(host: &str, port: u16) -> io::Result<Self>;

    /// Perform a TLS client handshake over this stream.
    ///
    /// Called after the server accepted an `SSLRequest`; the returned stream has
    /// the same read/write contract. The config supplies the server name and
    /// TLS client settings.
    fn upgrade(self, config: &Config) -> Result<Self, SslError>;

    /// Shut down the writing half of the stream.
    ///
    /// A stream whose peer already went away reports [`io::ErrorKind::NotConnected`].
    fn shutdown(&mut self) -> io::Result<()>;
}

/// An error while negotiating SSL.
pub enum SslError {
    /// Server answered the `SSLRequest` with anything other than `S`.
    Refused(u8),
    /// Host name is not valid for server name indication.
    InvalidHost(String),
    /// The TLS handshake failed.
    Handshake(String),
    /// Library compiled without the `tls` feature.
    Disabled,
}

impl std::error::Error for SslError { }

impl fmt::Display for SslError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SslError::Refused(b) => write!(
                f,
                "SSL requested but server doesn't support it (responded `{}`)",
                b.escape_ascii(),
            ),
            SslError::InvalidHost(host) => write!(f, "invalid host name for TLS: {host}"),
            SslError::Handshake(e) => write!(f, "TLS handshake failed: {e}"),
            SslError::Disabled => f.write_str("SSL requested but `tls` feature is disabled"),
        }
    }
}

impl fmt::Debug for SslError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

/// Scripted in-memory transport.
#[cfg(test)]
pub(crate) mod mock {
    use bytes::{BufMut, BytesMut};
    use std::{
        cell::{Cell, RefCell},
        collections::VecDeque,
        io::{self, Cursor, Read, Write},
        rc::Rc,
    };

    use super::{Config, SslError, Transport};

    thread_local! {
        static QUEUE: RefCell<VecDeque<MockTransport>> = const { RefCell::new(VecDeque::new()) };
    }

    /// Queue a transport to be returned by the next [`Transport::connect`].
    pub fn push(transport: MockTransport) {
        QUEUE.with(|q| q.borrow_mut().push_back(transport));
    }

    /// Replays backend bytes and records everything written.
    pub struct MockTransport {
        input: Cursor<Vec<u8>>,
        handle: Handle,
        shutdown_error: Option<io::ErrorKind>,
    }

    /// Observe a [`MockTransport`] after it is moved into a connection.
    #[derive(Clone, Default)]
    pub struct Handle {
        output: Rc<RefCell<Vec<u8>>>,
        upgraded: Rc<Cell<bool>>,
        shutdown: Rc<Cell<bool>>,
    }

    impl MockTransport {
        pub fn new(script: Script) -> (Self, Handle) {
            let handle = Handle::default();
            let me = Self {
                input: Cursor::new(script.buf.to_vec()),
                handle: handle.clone(),
                shutdown_error: None,
            };
            (me, handle)
        }

        /// Queue a new transport and return its handle.
        pub fn queue(script: Script) -> Handle {
            let (me, handle) = Self::new(script);
            push(me);
            handle
        }

        pub fn fail_shutdown(mut self, kind: io::ErrorKind) -> Self {
            self.shutdown_error = Some(kind);
            self
        }
    }

    impl Handle {
        /// Take all bytes written so far.
        pub fn take(&self) -> Vec<u8> {
            std::mem::take(&mut *self.output.borrow_mut())
        }

        pub fn is_empty(&self) -> bool {
            self.output.borrow().is_empty()
        }

        /// Message types of everything written so far, assuming all are typed messages.
        pub fn take_msgtypes(&self) -> Vec<u8> {
            let bytes = self.take();
            let mut types = vec![];
            let mut rest = &bytes[..];
            while rest.len() >= 5 {
                let len = u32::from_be_bytes([rest[1], rest[2], rest[3], rest[4]]) as usize;
                types.push(rest[0]);
                rest = &rest[1 + len..];
            }
            assert!(rest.is_empty(), "trailing bytes in frontend output");
            types
        }

        pub fn is_upgraded(&self) -> bool {
            self.upgraded.get()
        }

        pub fn is_shutdown(&self) -> bool {
            self.shutdown.get()
        }
    }

    impl Read for MockTransport {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for MockTransport {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.handle.output.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Transport for MockTransport {
        fn connect(_: &str, _: u16) -> io::Result<Self> {
            QUEUE
                .with(|q| q.borrow_mut().pop_front())
                .ok_or_else(|| io::Error::new(io::ErrorKind::ConnectionRefused, "no scripted transport"))
        }

        fn upgrade(self, _: &Config) -> Result<Self, SslError> {
            self.handle.upgraded.set(true);
            Ok(self)
        }

        fn shutdown(&mut self) -> io::Result<()> {
            if let Some(kind) = self.shutdown_error {
                return Err(kind.into());
            }
            self.handle.shutdown.set(true);
            Ok(())
        }
    }

    /// Builder of backend bytes.
    #[derive(Default)]
    pub struct Script {
        buf: BytesMut,
    }

    impl Script {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn raw(mut self, bytes: &[u8]) -> Self {
            self.buf.put_slice(bytes);
            self
        }

        pub fn msg(mut self, msgtype: u8, body: &[u8]) -> Self {
            self.buf.put_u8(msgtype);
            self.buf.put_u32(4 + body.len() as u32);
            self.buf.put_slice(body);
            self
        }

        pub fn auth(self, code: u32, extra: &[u8]) -> Self {
            let mut body = code.to_be_bytes().to_vec();
            body.extend_from_slice(extra);
            self.msg(b'R', &body)
        }

        pub fn key_data(self, pid: u32, key: u32) -> Self {
            let mut body = pid.to_be_bytes().to_vec();
            body.extend_from_slice(&key.to_be_bytes());
            self.msg(b'K', &body)
        }

        pub fn param(self, name: &str, value: &str) -> Self {
            self.msg(b'S', format!("{name}\0{value}\0").as_bytes())
        }

        pub fn ready(self, status: u8) -> Self {
            self.msg(b'Z', &[status])
        }

        /// A complete trust-authenticated startup.
        pub fn startup(self, pid: u32, key: u32) -> Self {
            self.auth(0, &[])
                .param("server_version", "v24.1.0")
                .key_data(pid, key)
                .ready(b'I')
        }

        pub fn row_description(self, columns: &[(&str, u32)]) -> Self {
            let mut body = (columns.len() as u16).to_be_bytes().to_vec();
            for (name, oid) in columns {
                body.extend_from_slice(name.as_bytes());
                body.push(0);
                body.extend_from_slice(&0u32.to_be_bytes());
                body.extend_from_slice(&0u16.to_be_bytes());
                body.extend_from_slice(&oid.to_be_bytes());
                body.extend_from_slice(&(-1i16).to_be_bytes());
                body.extend_from_slice(&(-1i32).to_be_bytes());
                body.extend_from_slice(&0u16.to_be_bytes());
            }
            self.msg(b'T', &body)
        }

        pub fn data_row(self, cells: &[Option<&str>]) -> Self {
            let mut body = (cells.len() as u16).to_be_bytes().to_vec();
            for cell in cells {
                match cell {
                    Some(cell) => {
                        body.extend_from_slice(&(cell.len() as i32).to_be_bytes());
                        body.extend_from_slice(cell.as_bytes());
                    }
                    None => body.extend_from_slice(&(-1i32).to_be_bytes()),
                }
            }
            self.msg(b'D', &body)
        }

        pub fn command_complete(self, tag: &str) -> Self {
            self.msg(b'C', format!("{tag}\0").as_bytes())
        }

        pub fn error(self, code: &str, message: &str) -> Self {
            self.msg(b'E', format!("SERROR\0C{code}\0M{message}\0\0").as_bytes())
        }

        pub fn notice(self, message: &str) -> Self {
            self.msg(b'N', format!("SWARNING\0M{message}\0\0").as_bytes())
        }

        pub fn notification(self, pid: u32, condition: &str, info: &str) -> Self {
            let mut body = pid.to_be_bytes().to_vec();
            body.extend_from_slice(format!("{condition}\0{info}\0").as_bytes());
            self.msg(b'A', &body)
        }

        pub fn parameter_description(self, oids: &[u32]) -> Self {
            let mut body = (oids.len() as u16).to_be_bytes().to_vec();
            for oid in oids {
                body.extend_from_slice(&oid.to_be_bytes());
            }
            self.msg(b't', &body)
        }

        pub fn unit(self, msgtype: u8) -> Self {
            self.msg(msgtype, &[])
        }
    }
}
