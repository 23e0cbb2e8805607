use rustls::{ClientConfig, ClientConnection, RootCertStore, StreamOwned, pki_types::ServerName};
use std::{
    io::{self, Write},
    net::{Shutdown, TcpStream},
    sync::Arc,
};

use crate::{common::verbose, connection::Config, transport::SslError};

pub(super) type TlsStream = StreamOwned<ClientConnection, TcpStream>;

fn default_config() -> Arc<ClientConfig> {
    let roots = RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    Arc::new(config)
}

/// Run the client handshake to completion over an already connected `tcp`.
pub(super) fn handshake(mut tcp: TcpStream, config: &Config) -> Result<TlsStream, SslError> {
    let host = config.host();
    let client = match config.tls_config() {
        Some(client) => client.clone(),
        None => default_config(),
    };

    let server_name = ServerName::try_from(host.to_owned())
        .map_err(|_| SslError::InvalidHost(host.to_owned()))?;
    let mut conn = ClientConnection::new(client, server_name)
        .map_err(|e| SslError::Handshake(e.to_string()))?;

    // surface certificate errors here instead of on the first message
    while conn.is_handshaking() {
        conn.complete_io(&mut tcp)
            .map_err(|e| SslError::Handshake(e.to_string()))?;
    }

    verbose!(protocol = ?conn.protocol_version(), "TLS established");

    Ok(StreamOwned::new(conn, tcp))
}

pub(super) fn shutdown(tls: &mut TlsStream) -> io::Result<()> {
    tls.conn.send_close_notify();
    tls.flush()?;
    tls.sock.shutdown(Shutdown::Write)
}
