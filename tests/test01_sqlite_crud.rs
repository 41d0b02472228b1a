use chrono::NaiveDateTime;
use serde_json::json;
use sql_scribe::prelude::*;
use tempfile::tempdir;

fn unique_db_path(prefix: &str) -> String {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join(format!("{prefix}.db"));
    // Leak the tempdir so the file persists for the duration of the test binary.
    std::mem::forget(dir);
    path.to_string_lossy().into_owned()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sqlite_crud_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
    let db = Scribe::connect_sqlite(&unique_db_path("crud")).await?;
    assert_eq!(db.backend(), Backend::Sqlite);

    db.batch(
        "CREATE TABLE player (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            score INTEGER,
            joined TEXT,
            meta TEXT
        );",
    )
    .await?;

    let joined = NaiveDateTime::parse_from_str("2021-08-06 16:00:00", "%Y-%m-%d %H:%M:%S")?;
    let n = db
        .insert(
            "player",
            &[
                ("id", 1.into()),
                ("name", "alice".into()),
                ("score", 40.into()),
                ("joined", DbValue::Timestamp(joined)),
                ("meta", DbValue::Json(json!({"rank": "gold"}))),
            ],
        )
        .await?;
    assert_eq!(n, 1);

    db.insert(
        "player",
        &[
            ("id", 2.into()),
            ("name", "bob".into()),
            ("score", DbValue::Null),
        ],
    )
    .await?;

    let rows = db.select("player", &[]).await?;
    assert_eq!(rows.len(), 2);

    let alice = rows.iter().find(|r| r["name"] == DbValue::from("alice")).unwrap();
    assert_eq!(alice["score"], DbValue::Int(40));
    // The JSON payload went in as text and comes back decoded.
    assert_eq!(alice["meta"], DbValue::Json(json!({"rank": "gold"})));
    // Timestamps round-trip as text and parse back through the accessor.
    assert_eq!(alice["joined"].as_timestamp(), Some(joined));

    let updated = db
        .update(
            "player",
            &[("score", 55.into())],
            &[("name", "alice".into())],
        )
        .await?;
    assert_eq!(updated, 1);

    let rows = db
        .select_where("player", &["score"], &[("name", "alice".into())])
        .await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["score"], DbValue::Int(55));

    // A NULL condition matches via IS NULL.
    let rows = db
        .select_where("player", &["name"], &[("score", DbValue::Null)])
        .await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], DbValue::from("bob"));

    let deleted = db.delete("player", &[("name", "bob".into())]).await?;
    assert_eq!(deleted, 1);

    let rows = db.query("SELECT COUNT(*) AS cnt FROM player", &[]).await?;
    assert_eq!(rows[0]["cnt"], DbValue::Int(1));

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sqlite_select_distinct_dedupes() -> Result<(), Box<dyn std::error::Error>> {
    let db = Scribe::connect_sqlite(&unique_db_path("distinct")).await?;
    db.batch(
        "CREATE TABLE medal (id INTEGER PRIMARY KEY, rank TEXT);
         INSERT INTO medal (rank) VALUES ('gold'), ('gold'), ('silver');",
    )
    .await?;

    let rows = db.select_distinct("medal", &["rank"]).await?;
    assert_eq!(rows.len(), 2);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn refused_statement_shapes() -> Result<(), Box<dyn std::error::Error>> {
    let db = Scribe::connect_sqlite(&unique_db_path("refused")).await?;
    db.batch("CREATE TABLE t (id INTEGER);").await?;

    let err = db.insert("t", &[]).await.unwrap_err();
    assert!(matches!(err, SqlScribeError::ParameterError(_)));

    let err = db.update("t", &[("id", 1.into())], &[]).await.unwrap_err();
    assert!(matches!(err, SqlScribeError::ParameterError(_)));

    let err = db.delete("t", &[]).await.unwrap_err();
    assert!(matches!(err, SqlScribeError::ParameterError(_)));

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn execute_and_query_raw_paths() -> Result<(), Box<dyn std::error::Error>> {
    let db = Scribe::connect_sqlite(&unique_db_path("raw")).await?;
    db.batch("CREATE TABLE note (id INTEGER PRIMARY KEY, body TEXT);")
        .await?;

    let n = db
        .execute(
            "INSERT INTO note (body) VALUES (?1)",
            &[DbValue::from("[1, 2, 3]")],
        )
        .await?;
    assert_eq!(n, 1);

    // query() decodes the JSON-looking text, query_raw() leaves it alone.
    let rows = db.query("SELECT body FROM note", &[]).await?;
    assert_eq!(rows[0]["body"], DbValue::Json(json!([1, 2, 3])));

    let rs = db.query_raw("SELECT body FROM note", &[]).await?;
    assert_eq!(
        rs.rows[0].get("body"),
        Some(&DbValue::from("[1, 2, 3]"))
    );
    assert_eq!(rs.rows_affected, 1);

    Ok(())
}
