use std::env::var;
use vertigo::{Config, Connection, Result, TransactionStatus};

pub fn main() -> Result<()> {
    let mut conn = Connection::connect(&var("DATABASE_URL").unwrap())?;
    conn.execute("SELECT 1")?;
    conn.close()?;
    assert!(conn.is_closed());

    let mut conn = Connection::connect_env()?;
    assert_eq!(conn.transaction_status(), Some(TransactionStatus::NoTransaction));
    tracing::info!(
        "backend {:?}, server version {:?}",
        conn.backend_pid(),
        conn.parameters().get("server_version"),
    );

    let pid = conn.backend_pid();
    conn.reset()?;
    assert!(conn.is_opened());
    assert_ne!(conn.backend_pid(), pid);

    let err = conn.execute("SELECT * FORM nothing").unwrap_err();
    tracing::info!("expected error: {err}");
    conn.sync()?;
    assert!(conn.is_opened());

    conn.cancel_request()?;
    conn.close()?;

    let config = Config::from_env().set_ssl(false);
    let conn = Connection::open(config)?;
    drop(conn);

    Ok(())
}
