use serde_json::json;
use sqlite_node::node::{Item, NodeParameters, run};
use sqlite_node::prelude::*;
use tempfile::TempDir;

fn db_path(dir: &TempDir) -> String {
    dir.path().join("items.db").to_string_lossy().into_owned()
}

fn params(path: &str, kind: QueryKind, text: &str, args: &str, spread: bool) -> NodeParameters {
    NodeParameters {
        database_path: path.to_string(),
        query_type: kind,
        query_text: text.to_string(),
        arguments: args.to_string(),
        spread,
    }
}

async fn seed(path: &str) -> Result<(), NodeRunError> {
    let setup = [
        params(
            path,
            QueryKind::Create,
            "CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT)",
            "{}",
            false,
        ),
        params(
            path,
            QueryKind::Insert,
            "INSERT INTO t (v) VALUES ($v)",
            r#"{"$v": "alpha"}"#,
            false,
        ),
        params(
            path,
            QueryKind::Insert,
            "INSERT INTO t (v) VALUES ($v)",
            r#"{"$v": "beta"}"#,
            false,
        ),
    ];
    let items = vec![Item::default(); setup.len()];
    run(&items, |i| setup[i].clone(), false).await?;
    Ok(())
}

#[tokio::test]
async fn one_output_item_per_input_item() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let path = db_path(&dir);
    seed(&path).await?;

    let per_item = [
        params(&path, QueryKind::Select, "SELECT v FROM t WHERE id = 1", "{}", false),
        params(&path, QueryKind::Select, "SELECT v FROM t WHERE id = 2", "{}", false),
    ];
    let items = vec![Item::default(); 2];
    let output = run(&items, |i| per_item[i].clone(), false).await?;

    assert_eq!(output.len(), 2);
    assert_eq!(output[0].json, json!([{"v": "alpha"}]));
    assert_eq!(output[1].json, json!([{"v": "beta"}]));
    assert!(output.iter().all(|item| item.error.is_none()));

    Ok(())
}

#[tokio::test]
async fn spread_flattens_batch_results_into_items() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let path = db_path(&dir);
    seed(&path).await?;

    let p = params(
        &path,
        QueryKind::Select,
        "SELECT v FROM t WHERE id = 1; SELECT v FROM t WHERE id = 2",
        "{}",
        true,
    );
    let items = vec![Item::default()];
    let output = run(&items, |_| p.clone(), false).await?;

    // One input item, two output items: the per-item mapping is replaced.
    assert_eq!(output.len(), 2);
    assert_eq!(output[0].json, json!({"items": [{"v": "alpha"}]}));
    assert_eq!(output[1].json, json!({"items": [{"v": "beta"}]}));

    Ok(())
}

#[tokio::test]
async fn spread_wraps_single_select_rows_too() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let path = db_path(&dir);
    seed(&path).await?;

    let p = params(&path, QueryKind::Select, "SELECT v FROM t", "{}", true);
    let items = vec![Item::default()];
    let output = run(&items, |_| p.clone(), false).await?;

    assert_eq!(output.len(), 1);
    assert_eq!(
        output[0].json,
        json!({"items": [{"v": "alpha"}, {"v": "beta"}]})
    );

    Ok(())
}

#[tokio::test]
async fn spread_is_ignored_for_mutations() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let path = db_path(&dir);
    seed(&path).await?;

    let p = params(
        &path,
        QueryKind::Insert,
        "INSERT INTO t (v) VALUES ($v)",
        r#"{"$v": "gamma"}"#,
        true,
    );
    let items = vec![Item::default()];
    let output = run(&items, |_| p.clone(), false).await?;

    assert_eq!(output.len(), 1);
    assert_eq!(
        output[0].json,
        json!({"changed_count": 1, "last_inserted_id": 3})
    );

    Ok(())
}

#[tokio::test]
async fn continue_on_fail_annotates_and_keeps_going() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let path = db_path(&dir);
    seed(&path).await?;

    let per_item = [
        params(&path, QueryKind::Select, "SELECT * FROM missing", "{}", false),
        params(&path, QueryKind::Select, "SELECT v FROM t WHERE id = 1", "{}", false),
    ];
    let items = vec![
        Item::new(json!({"origin": "first"})),
        Item::new(json!({"origin": "second"})),
    ];
    let output = run(&items, |i| per_item[i].clone(), true).await?;

    assert_eq!(output.len(), 2);
    // The failing item echoes its input payload with the error attached.
    assert_eq!(output[0].json, json!({"origin": "first"}));
    assert!(output[0].error.as_deref().unwrap().contains("no such table"));
    assert_eq!(output[0].paired_item, Some(0));
    // The next item still ran.
    assert_eq!(output[1].json, json!([{"v": "alpha"}]));
    assert!(output[1].error.is_none());

    Ok(())
}

#[tokio::test]
async fn abort_carries_the_failing_item_index() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let path = db_path(&dir);
    seed(&path).await?;

    let per_item = [
        params(&path, QueryKind::Select, "SELECT v FROM t WHERE id = 1", "{}", false),
        params(&path, QueryKind::Select, "SELECT * FROM missing", "{}", false),
    ];
    let items = vec![Item::default(); 2];
    let err = run(&items, |i| per_item[i].clone(), false)
        .await
        .unwrap_err();

    assert_eq!(err.item_index, 1);
    assert!(matches!(err.source, SqliteNodeError::Sqlite(_)));

    Ok(())
}

#[tokio::test]
async fn bad_argument_text_fails_before_the_engine() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let path = db_path(&dir);

    let p = params(&path, QueryKind::Select, "SELECT 1", "{broken", false);
    let items = vec![Item::default()];
    let err = run(&items, |_| p.clone(), false).await.unwrap_err();

    assert_eq!(err.item_index, 0);
    assert!(matches!(err.source, SqliteNodeError::ArgumentParse(_)));
    assert!(!std::path::Path::new(&path).exists());

    Ok(())
}
