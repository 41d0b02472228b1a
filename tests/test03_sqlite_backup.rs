use sql_scribe::prelude::*;
use tempfile::tempdir;

fn unique_db_path(prefix: &str) -> String {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join(format!("{prefix}.db"));
    // Leak the tempdir so the file persists for the duration of the test binary.
    std::mem::forget(dir);
    path.to_string_lossy().into_owned()
}

async fn seeded_db(prefix: &str) -> Result<Scribe, SqlScribeError> {
    let db = Scribe::connect_sqlite(&unique_db_path(prefix)).await?;
    db.batch(
        "CREATE TABLE items (id INTEGER PRIMARY KEY, label TEXT, weight REAL, data BLOB);
         CREATE TABLE tags (id INTEGER PRIMARY KEY, name TEXT);",
    )
    .await?;
    db.insert(
        "items",
        &[
            ("id", 1.into()),
            ("label", "O'Brien".into()),
            ("weight", 1.5.into()),
            ("data", DbValue::Blob(vec![0x01, 0x02, 0xFF])),
        ],
    )
    .await?;
    db.insert(
        "items",
        &[("id", 2.into()), ("label", DbValue::Null)],
    )
    .await?;
    db.insert("tags", &[("name", "heavy".into())]).await?;
    Ok(db)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dump_restores_into_fresh_database() -> Result<(), Box<dyn std::error::Error>> {
    let db = seeded_db("dump_src").await?;
    let dump = db.dump(None).await?;

    assert!(dump.contains("BEGIN TRANSACTION;"));
    assert!(dump.contains("DROP TABLE IF EXISTS \"items\";"));
    assert!(dump.contains("CREATE TABLE items"));
    assert!(dump.contains("'O''Brien'"));
    assert!(dump.contains("X'0102FF'"));
    assert!(dump.trim_end().ends_with("COMMIT;"));

    let restored = Scribe::connect_sqlite(&unique_db_path("dump_dst")).await?;
    restored.batch(&dump).await?;

    let rows = restored.query("SELECT COUNT(*) AS cnt FROM items", &[]).await?;
    assert_eq!(rows[0]["cnt"], DbValue::Int(2));

    let rs = restored
        .query_raw("SELECT label, weight, data FROM items WHERE id = 1", &[])
        .await?;
    assert_eq!(rs.rows[0].get("label"), Some(&DbValue::from("O'Brien")));
    assert_eq!(rs.rows[0].get("weight"), Some(&DbValue::Float(1.5)));
    assert_eq!(
        rs.rows[0].get("data"),
        Some(&DbValue::Blob(vec![0x01, 0x02, 0xFF]))
    );

    let rs = restored
        .query_raw("SELECT label FROM items WHERE id = 2", &[])
        .await?;
    assert_eq!(rs.rows[0].get("label"), Some(&DbValue::Null));

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dump_subset_and_unknown_tables() -> Result<(), Box<dyn std::error::Error>> {
    let db = seeded_db("dump_subset").await?;

    let dump = db.dump(Some(&["items".to_string()])).await?;
    assert!(dump.contains("CREATE TABLE items"));
    assert!(!dump.contains("CREATE TABLE tags"));

    let err = db.dump(Some(&["nope".to_string()])).await.unwrap_err();
    assert!(matches!(err, SqlScribeError::ExecutionError(_)));

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dump_to_file_writes_the_dump() -> Result<(), Box<dyn std::error::Error>> {
    let db = seeded_db("dump_file").await?;
    let dir = tempdir()?;
    let path = dir.path().join("backup.sql");

    db.dump_to_file(&path, None).await?;
    let written = std::fs::read_to_string(&path)?;
    assert!(written.contains("CREATE TABLE items"));

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn drop_all_tables_empties_the_catalog() -> Result<(), Box<dyn std::error::Error>> {
    let db = seeded_db("drop_all").await?;

    let dropped = db.drop_all_tables().await?;
    assert_eq!(dropped, 2);

    let rs = db
        .query_raw(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
            &[],
        )
        .await?;
    assert!(rs.is_empty());

    // A second pass has nothing left to do.
    assert_eq!(db.drop_all_tables().await?, 0);

    Ok(())
}
