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
        "CREATE TABLE player (id INTEGER PRIMARY KEY, name TEXT, bio TEXT, score INTEGER);
         INSERT INTO player (name, bio, score) VALUES
            ('alice', 'lifelong golfer', 55),
            ('bob', 'weekend warrior', 12),
            ('carol', 'knows alice', 31);",
    )
    .await?;
    Ok(db)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn search_with_explicit_columns() -> Result<(), Box<dyn std::error::Error>> {
    let db = seeded_db("search_explicit").await?;

    // Only the name column, so carol's bio mention does not match.
    let rows = db.search("player", "ali|name").await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], DbValue::from("alice"));

    let rows = db.search("player", "ali|name,bio").await?;
    assert_eq!(rows.len(), 2);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn search_discovers_columns_from_catalog() -> Result<(), Box<dyn std::error::Error>> {
    let db = seeded_db("search_discover").await?;

    // No column list: every column is searched, including the numeric one.
    let rows = db.search("player", "55").await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], DbValue::from("alice"));

    let rows = db.search("player", "warrior").await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], DbValue::from("bob"));

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn search_misses_return_empty() -> Result<(), Box<dyn std::error::Error>> {
    let db = seeded_db("search_miss").await?;
    let rows = db.search("player", "nonesuch").await?;
    assert!(rows.is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn search_unknown_table_errors() -> Result<(), Box<dyn std::error::Error>> {
    let db = seeded_db("search_unknown").await?;
    let err = db.search("ghosts", "x").await.unwrap_err();
    assert!(matches!(err, SqlScribeError::ExecutionError(_)));
    Ok(())
}
