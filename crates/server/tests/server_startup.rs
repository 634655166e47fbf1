use std::io::Write;
use std::net::TcpListener;
use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use tempfile::NamedTempFile;
use tokio::time::{sleep, timeout};

/// Find an available port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// A valid config with the status server enabled and reconciliation off
fn status_server_config(port: u16) -> String {
    format!(
        r#"
[monitor]
namespace = "FrameWatchTest"
interval_secs = 10

[queue]
name = "framewatch-test-queue"
wait_time_secs = 1
receive_error_backoff_ms = 1000

[reconcile]
enabled = false

[aws]
region = "us-west-2"

[server]
enabled = true
host = "127.0.0.1"
port = {}
"#,
        port
    )
}

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

/// Command for the binary with AWS pointed at a closed local port, so no
/// test ever reaches the network.
fn framewatch_command() -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new(env!("CARGO_BIN_EXE_framewatch"));
    cmd.env_remove("METRIC_NAMESPACE")
        .env_remove("DETECTION_INTERVAL")
        .env_remove("SQS_QUEUE_NAME")
        .env_remove("ENABLE_DEBUG")
        .env("RUST_LOG", "error")
        .env("AWS_ACCESS_KEY_ID", "test")
        .env("AWS_SECRET_ACCESS_KEY", "test")
        .env("AWS_EC2_METADATA_DISABLED", "true")
        .env("AWS_ENDPOINT_URL", "http://127.0.0.1:9")
        .kill_on_drop(true);
    cmd
}

async fn spawn_server(config_path: &Path) -> tokio::process::Child {
    framewatch_command()
        .env("FRAMEWATCH_CONFIG", config_path)
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

#[tokio::test]
async fn test_health_endpoint() {
    let port = get_available_port();
    let config = write_config(&status_server_config(port));

    let mut server = spawn_server(config.path()).await;
    assert!(
        wait_for_server(port, 100).await,
        "Server did not start in time"
    );

    let response = Client::new()
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
async fn test_workers_endpoint_starts_empty() {
    let port = get_available_port();
    let config = write_config(&status_server_config(port));

    let mut server = spawn_server(config.path()).await;
    assert!(
        wait_for_server(port, 100).await,
        "Server did not start in time"
    );

    let json: serde_json::Value = Client::new()
        .get(format!("http://127.0.0.1:{}/api/v1/workers", port))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(json["count"], 0);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_missing_config_file_exits_with_error() {
    let result = timeout(
        Duration::from_secs(10),
        framewatch_command()
            .env("FRAMEWATCH_CONFIG", "/nonexistent/framewatch.toml")
            .output(),
    )
    .await
    .expect("Command timed out")
    .expect("Failed to execute command");

    assert!(!result.status.success());
}

#[tokio::test]
async fn test_missing_queue_section_exits_with_error() {
    let config = write_config(
        r#"
[monitor]
namespace = "FrameWatchTest"
interval_secs = 10
"#,
    );

    let result = timeout(
        Duration::from_secs(10),
        framewatch_command()
            .env("FRAMEWATCH_CONFIG", config.path())
            .output(),
    )
    .await
    .expect("Command timed out")
    .expect("Failed to execute command");

    assert!(!result.status.success());
}

#[tokio::test]
async fn test_zero_interval_exits_with_error() {
    let config = write_config(
        r#"
[monitor]
namespace = "FrameWatchTest"
interval_secs = 0

[queue]
name = "framewatch-test-queue"
"#,
    );

    let result = timeout(
        Duration::from_secs(10),
        framewatch_command()
            .env("FRAMEWATCH_CONFIG", config.path())
            .output(),
    )
    .await
    .expect("Command timed out")
    .expect("Failed to execute command");

    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("interval"), "stderr was: {}", stderr);
}

#[tokio::test]
async fn test_env_only_without_required_settings_exits_with_error() {
    let result = timeout(
        Duration::from_secs(10),
        framewatch_command().env_remove("FRAMEWATCH_CONFIG").output(),
    )
    .await
    .expect("Command timed out")
    .expect("Failed to execute command");

    assert!(!result.status.success());
}
