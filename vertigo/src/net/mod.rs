//! Network socket.
use std::{
    io::{self, Read, Write},
    net::{Shutdown, TcpStream},
};

use crate::{
    connection::Config,
    transport::{SslError, Transport},
};

#[cfg(feature = "tls")]
mod tls;

/// Either a plain `TcpStream` or a TLS session over it.
pub struct Socket {
    kind: Kind,
}

enum Kind {
    Tcp(TcpStream),
    #[cfg(feature = "tls")]
    Tls(Box<tls::TlsStream>),
}

impl Socket {
    pub fn connect_tcp(host: &str, port: u16) -> io::Result<Socket> {
        let socket = TcpStream::connect((host, port))?;
        socket.set_nodelay(true)?;
        Ok(Socket { kind: Kind::Tcp(socket) })
    }

    /// Returns `true` if the socket is encrypted.
    pub fn is_tls(&self) -> bool {
        match self.kind {
            Kind::Tcp(_) => false,
            #[cfg(feature = "tls")]
            Kind::Tls(_) => true,
        }
    }
}

impl Transport for Socket {
    fn connect(host: &str, port: u16) -> io::Result<Self> {
        Socket::connect_tcp(host, port)
    }

    fn upgrade(self, config: &Config) -> Result<Self, SslError> {
        match self.kind {
            #[cfg(feature = "tls")]
            Kind::Tcp(tcp) => {
                let tls = tls::handshake(tcp, config)?;
                Ok(Socket { kind: Kind::Tls(Box::new(tls)) })
            }
            #[cfg(not(feature = "tls"))]
            Kind::Tcp(_) => {
                let _ = config;
                Err(SslError::Disabled)
            }
            #[cfg(feature = "tls")]
            Kind::Tls(_) => Err(SslError::Handshake("socket is already encrypted".into())),
        }
    }

    fn shutdown(&mut self) -> io::Result<()> {
        match &mut self.kind {
            Kind::Tcp(tcp) => tcp.shutdown(Shutdown::Write),
            #[cfg(feature = "tls")]
            Kind::Tls(tls) => tls::shutdown(tls),
        }
    }
}

impl Read for Socket {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.kind {
            Kind::Tcp(t) => t.read(buf),
            #[cfg(feature = "tls")]
            Kind::Tls(t) => t.read(buf),
        }
    }
}

impl Write for Socket {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.kind {
            Kind::Tcp(t) => t.write(buf),
            #[cfg(feature = "tls")]
            Kind::Tls(t) => t.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.kind {
            Kind::Tcp(t) => t.flush(),
            #[cfg(feature = "tls")]
            Kind::Tls(t) => t.flush(),
        }
    }
}

impl std::fmt::Debug for Socket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Socket").field("tls", &self.is_tls()).finish()
    }
}
