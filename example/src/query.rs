use vertigo::{Connection, Result, Value};

pub fn main() -> Result<()> {
    let mut conn = Connection::connect_env()?;

    // Execute

    conn.execute("CREATE LOCAL TEMP TABLE vertigo(id int, name varchar(32)) ON COMMIT PRESERVE ROWS")?;

    let res = conn.execute("INSERT INTO vertigo VALUES(1, 'Deez')")?;
    assert_eq!(res.rows_affected(), Some(1));

    conn.prepare("ins", "INSERT INTO vertigo VALUES(?, ?)", 2)?;
    conn.execute_prepared("ins", &[&2, &"Foo"])?;
    conn.execute_prepared("ins", &[&3, &None::<&str>])?;

    // Queries

    let datas = conn.execute("SELECT * FROM vertigo ORDER BY id")?;
    assert_eq!(datas.len(), 3);
    assert_eq!(datas.value(0, "name")?.as_str(), Some("Deez"));
    assert_eq!(datas.value(2, 1)?, &Value::Null);

    for row in &datas {
        let row = row?;
        tracing::info!("{row:?}");
    }

    conn.prepare("sel", "SELECT name FROM vertigo WHERE id = ?", 1)?;
    let data = conn.execute_prepared("sel", &[&2])?;
    assert_eq!(data.first()?.and_then(|row| row.get(0)?.as_str()), Some("Foo"));

    let json = serde_json::to_string(datas.rows()?[0].values()).unwrap();
    tracing::info!("{json}");

    for notice in conn.notices() {
        tracing::info!("notice {}: {}", notice.field_type, notice.value);
    }

    conn.close()?;

    Ok(())
}
