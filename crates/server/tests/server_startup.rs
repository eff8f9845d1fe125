use std::io::Write;
use std::net::TcpListener;
use std::time::Duration;

use reqwest::Client;
use tempfile::{NamedTempFile, TempDir};
use tokio::time::{sleep, timeout};

/// Find an available port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Create a minimal valid config rooted in `data_dir`
fn minimal_config(port: u16, data_dir: &TempDir) -> String {
    format!(
        r#"
[server]
host = "127.0.0.1"
port = {}

[storage]
root = {:?}

[checkpoint]
path = {:?}

[orchestrator]
enabled = false

[notifier]
subscribers = ["http://hooks.local/secret-token"]
"#,
        port,
        data_dir.path().join("objects"),
        data_dir.path().join("params.db"),
    )
}

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

/// Spawn the server and return a handle
async fn spawn_server(config_path: &std::path::Path) -> tokio::process::Child {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_cta-pipeline"))
        .env("CTA_CONFIG", config_path)
        .env("RUST_LOG", "error") // Quiet logs during tests
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn server")
}

/// Wait for server to be ready
async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    let client = Client::new();
    for _ in 0..max_attempts {
        if client
            .get(format!("http://127.0.0.1:{}/api/v1/health", port))
            .send()
            .await
            .is_ok()
        {
            return true;
        }
        sleep(Duration::from_millis(50)).await;
    }
    false
}

/// Run the binary with `config_path` and wait for it to exit.
async fn run_to_exit(config_path: &std::path::Path) -> std::process::Output {
    timeout(
        Duration::from_secs(5),
        tokio::process::Command::new(env!("CARGO_BIN_EXE_cta-pipeline"))
            .env("CTA_CONFIG", config_path)
            .env("RUST_LOG", "error")
            .output(),
    )
    .await
    .expect("Command timed out")
    .expect("Failed to execute command")
}

#[tokio::test]
async fn test_health_endpoint() {
    let port = get_available_port();
    let data_dir = TempDir::new().unwrap();
    let config = write_config(&minimal_config(port, &data_dir));

    let mut server = spawn_server(config.path()).await;

    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    let client = Client::new();
    let response = client
        .get(format!("http://127.0.0.1:{}/api/v1/health", port))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let json: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(json["status"], "ok");

    server.kill().await.ok();
}

#[tokio::test]
async fn test_config_endpoint_returns_sanitized() {
    let port = get_available_port();
    let data_dir = TempDir::new().unwrap();
    let config = write_config(&minimal_config(port, &data_dir));

    let mut server = spawn_server(config.path()).await;

    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    let client = Client::new();
    let response = client
        .get(format!("http://127.0.0.1:{}/api/v1/config", port))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let text = response.text().await.expect("Failed to read body");
    assert!(!text.contains("secret-token"));

    let json: serde_json::Value = serde_json::from_str(&text).expect("Failed to parse JSON");
    assert_eq!(json["server"]["port"], port);
    assert_eq!(json["notifier"]["subscriber_count"], 1);
    assert_eq!(json["orchestrator"]["enabled"], false);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_metrics_endpoint_served() {
    let port = get_available_port();
    let data_dir = TempDir::new().unwrap();
    let config = write_config(&minimal_config(port, &data_dir));

    let mut server = spawn_server(config.path()).await;

    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    let response = Client::new()
        .get(format!("http://127.0.0.1:{}/metrics", port))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let text = response.text().await.unwrap();
    assert!(text.contains("cta_pipeline_runs_skipped_total"));

    server.kill().await.ok();
}

#[tokio::test]
async fn test_missing_config_file_exits_with_error() {
    let result = run_to_exit(std::path::Path::new("/nonexistent/config.toml")).await;

    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("Failed to load config"));
}

#[tokio::test]
async fn test_invalid_config_exits_with_error() {
    let invalid = r#"
[server]
port = 8080

[train_locations]
enabled = true
"#;
    let config = write_config(invalid);

    let result = run_to_exit(config.path()).await;

    assert!(!result.status.success());
}
