use std::fs;
use std::path::Path;

use kitchen_sync::testing::MemoryTarget;
use sync_core::{ColumnValue, DeclarationError};
use tempfile::TempDir;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn seed_tree() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "users.toml",
        r#"
[users.admin]
name = "Ada"
active = true

[users.admin._defaults]
role = "admin"
"#,
    );
    write(
        tmp.path(),
        "content/posts.yaml",
        r#"
posts:
  welcome:
    author: "${users.admin}"
    title: "It's live"
    body: "$file(bodies/welcome.md)"
"#,
    );
    write(tmp.path(), "bodies/welcome.md", "Hello, world!\n");
    tmp
}

#[tokio::test]
async fn test_sync_from_directory() {
    let tmp = seed_tree();
    let target = MemoryTarget::new();

    kitchen_sync::init(&target).await.unwrap();
    let report = kitchen_sync::sync(&target, tmp.path(), false)
        .await
        .unwrap();

    assert_eq!(report.created, 2);
    assert!(target.ledger().is_initialized());

    let admin = target.row("users", 1).unwrap();
    assert_eq!(admin["name"], ColumnValue::Text("Ada".into()));
    assert_eq!(admin["active"], ColumnValue::Bool(true));
    assert_eq!(admin["role"], ColumnValue::Text("admin".into()));

    let post = target.row("posts", 1).unwrap();
    assert_eq!(post["author"], ColumnValue::Integer(1));
    assert_eq!(post["title"], ColumnValue::Text("It's live".into()));
    assert_eq!(post["body"], ColumnValue::Text("Hello, world!\n".into()));
}

#[tokio::test]
async fn test_resync_after_drop_all_starts_over() {
    let tmp = seed_tree();
    let target = MemoryTarget::new();
    kitchen_sync::sync(&target, tmp.path(), false)
        .await
        .unwrap();

    let truncated = kitchen_sync::drop_all(&target).await.unwrap();
    assert!(truncated.contains(&"_kitchensync".to_string()));
    assert!(target.rows("users").is_empty());

    let report = kitchen_sync::sync(&target, tmp.path(), false)
        .await
        .unwrap();
    assert_eq!(report.created, 2);
    assert_eq!(report.recreated, 0);
    assert_eq!(target.rows("users").len(), 1);
}

#[tokio::test]
async fn test_invalid_declarations_issue_no_statements() {
    let tmp = seed_tree();
    write(
        tmp.path(),
        "broken.toml",
        r#"
[comments.first]
post = "${posts}"
"#,
    );
    let target = MemoryTarget::new();

    let err = kitchen_sync::sync(&target, tmp.path(), false)
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<DeclarationError>(),
        Some(DeclarationError::InvalidMarker(_))
    ));
    assert!(target.statements().is_empty());
}

#[tokio::test]
async fn test_duplicate_entity_across_files() {
    let tmp = seed_tree();
    write(tmp.path(), "more/users.json", r#"{"users": {"admin": {"name": "Eve"}}}"#);
    let target = MemoryTarget::new();

    let err = kitchen_sync::sync(&target, tmp.path(), false)
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<DeclarationError>(),
        Some(DeclarationError::DuplicateEntity(_))
    ));
    assert!(target.statements().is_empty());
}

#[tokio::test]
async fn test_hidden_files_are_ignored() {
    let tmp = seed_tree();
    write(tmp.path(), ".drafts/users.toml", "[users.admin]\nname = \"Eve\"\n");
    let target = MemoryTarget::new();

    let report = kitchen_sync::sync(&target, tmp.path(), false)
        .await
        .unwrap();

    assert_eq!(report.created, 2);
}
