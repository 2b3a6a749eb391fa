use std::process::{Command, Output};

fn sync_cli(db: &str, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_portaria-sync"))
        .args(args)
        .env("PORTARIA_OFFLINE_DB", db)
        .env_remove("PORTARIA_SERVER_URL")
        .env_remove("PORTARIA_ADMIN_PIN")
        .env("PORTARIA_LOG_LEVEL", "warn")
        .output()
        .expect("failed to run portaria-sync")
}

fn temp_db() -> (std::path::PathBuf, String) {
    let path = std::env::temp_dir().join(format!("portaria-sync-{}.db", uuid::Uuid::new_v4()));
    let url = format!("sqlite://{}", path.display());
    (path, url)
}

#[test]
fn watch_rejects_zero_interval() {
    let (path, db) = temp_db();
    let out = sync_cli(
        &db,
        &["watch", "--server-url", "http://127.0.0.1:9", "--pin", "1234", "--interval", "0"],
    );
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("interval"), "unexpected error: {stderr}");
    let _ = std::fs::remove_file(path);
}

#[test]
fn enqueue_then_pending_counts_sale() {
    let (path, db) = temp_db();

    let out = sync_cli(&db, &["enqueue", "3", "2", "pix"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(String::from_utf8_lossy(&out.stdout).starts_with("queued sale"));

    let out = sync_cli(&db, &["pending"]);
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "1");

    let _ = std::fs::remove_file(path);
}

#[test]
fn enqueue_rejects_bad_arguments() {
    let (path, db) = temp_db();

    for args in [
        &["enqueue", "3", "2", "boleto"][..],
        &["enqueue", "3", "0", "pix"][..],
        &["enqueue", "0", "1", "pix"][..],
    ] {
        let out = sync_cli(&db, args);
        assert!(!out.status.success(), "accepted {args:?}");
    }

    let out = sync_cli(&db, &["sync"]);
    assert!(!out.status.success(), "sync ran without a server url");

    let _ = std::fs::remove_file(path);
}
