//! Buffered message stream.
use bytes::{Buf, BytesMut};
use std::io;

use crate::{
    Result,
    common::verbose,
    connection::Config,
    protocol::{
        BackendMessage, FrontendProtocol, ProtocolError,
        backend::BackendProtocol,
        frontend::{self, CancelRequest, SslRequest, Startup},
    },
    transport::{SslError, Transport},
};

const DEFAULT_BUF_CAPACITY: usize = 1024;
const READ_CHUNK: usize = 8 * 1024;

/// Buffered connection to the server.
///
/// Sent messages are only buffered, [`flush`][WireStream::flush] or
/// [`recv`][WireStream::recv] writes them out.
#[derive(Debug)]
pub struct WireStream<T> {
    io: T,
    read_buf: BytesMut,
    write_buf: BytesMut,
}

impl<T: Transport> WireStream<T> {
    pub fn new(io: T) -> Self {
        Self {
            io,
            read_buf: BytesMut::with_capacity(DEFAULT_BUF_CAPACITY),
            write_buf: BytesMut::with_capacity(DEFAULT_BUF_CAPACITY),
        }
    }

    /// Open a transport to `host:port`.
    pub fn connect(host: &str, port: u16) -> io::Result<Self> {
        T::connect(host, port).map(Self::new)
    }

    pub fn send<F: FrontendProtocol>(&mut self, message: F) {
        verbose!("(F) {}", std::any::type_name::<F>().rsplit("::").next().unwrap_or_default());
        frontend::write(message, &mut self.write_buf);
    }

    pub fn send_startup(&mut self, startup: Startup) {
        verbose!(user = startup.user, database = startup.database, "(F) Startup");
        startup.write(&mut self.write_buf);
    }

    pub fn send_ssl_request(&mut self) {
        verbose!("(F) SSLRequest");
        SslRequest.write(&mut self.write_buf);
    }

    pub fn send_cancel_request(&mut self, cancel: CancelRequest) {
        verbose!(process_id = cancel.process_id, "(F) CancelRequest");
        cancel.write(&mut self.write_buf);
    }

    /// Write all buffered messages to the transport.
    pub fn flush(&mut self) -> io::Result<()> {
        if !self.write_buf.is_empty() {
            self.io.write_all(&self.write_buf)?;
            self.write_buf.clear();
        }
        self.io.flush()
    }

    /// Receive a single message, flushing buffered messages first.
    pub fn recv<B: BackendProtocol>(&mut self) -> Result<B> {
        if !self.write_buf.is_empty() {
            self.flush()?;
        }

        loop {
            if let Some(mut header) = self.read_buf.get(..5) {
                let msgtype = header.get_u8();
                let len = header.get_u32() as usize;

                if len < 4 {
                    return Err(ProtocolError::malformed("message length less than 4").into());
                }

                if self.read_buf.len() > len {
                    self.read_buf.advance(5);
                    let body = self.read_buf.split_to(len - 4).freeze();
                    verbose!("(B) {}", BackendMessage::message_name(msgtype));
                    return Ok(B::decode(msgtype, body)?);
                }

                self.read_buf.reserve(1 + len - self.read_buf.len());
            }

            self.fill()?;
        }
    }

    /// Read exactly one byte, the answer to an `SSLRequest`.
    pub fn read_byte(&mut self) -> io::Result<u8> {
        if self.read_buf.is_empty() {
            self.fill()?;
        }
        Ok(self.read_buf.get_u8())
    }

    /// Upgrade the underlying transport to TLS in place.
    pub fn upgrade(self, config: &Config) -> Result<Self, SslError> {
        let WireStream { io, read_buf, write_buf } = self;
        if !read_buf.is_empty() {
            return Err(SslError::Handshake("unencrypted data received before handshake".into()));
        }
        Ok(WireStream { io: io.upgrade(config)?, read_buf, write_buf })
    }

    /// Shut down the transport.
    pub fn shutdown(&mut self) -> io::Result<()> {
        self.io.shutdown()
    }

    fn fill(&mut self) -> io::Result<()> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match self.io.read(&mut chunk) {
                Ok(0) => return Err(io::ErrorKind::UnexpectedEof.into()),
                Ok(n) => {
                    self.read_buf.extend_from_slice(&chunk[..n]);
                    return Ok(());
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }
}
