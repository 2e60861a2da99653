use std::path::Path;
use std::time::Duration;

use anyhow::{Result, anyhow};
use rand::Rng as _;
use tempfile::TempDir;
use translog_app::state::AppState;
use translog_server::config::{Parser, ServerConfig};
use url::Url;

fn random_port() -> Result<u16> {
    let mut rng = rand::rng();

    let mut retries = 3;
    while retries > 0 {
        let port: u16 = rng.random_range(3030..4030);
        let addr: std::net::SocketAddr = format!("127.0.0.1:{}", port).parse()?;
        match std::net::TcpStream::connect_timeout(&addr, std::time::Duration::from_millis(100)) {
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => return Ok(port),
            Err(_) => retries -= 1,
            Ok(_) => retries -= 1,
        }
    }

    Err(anyhow!("Could not find a free port"))
}

pub struct ConfigGuard {
    #[allow(dead_code)]
    data_dir: TempDir,
}

pub fn test_config(test_name: &str, base_dir: &Path) -> Result<(ServerConfig, ConfigGuard)> {
    let tmp_data_dir = TempDir::with_prefix_in(format!("{}_", test_name), base_dir)?;
    let data_dir = tmp_data_dir.path().to_string_lossy().to_string();
    let port = random_port()?;
    let port = port.to_string();
    let args = &[
        "translog-e2e-tests",
        "--data-dir",
        &data_dir,
        "--port",
        &port,
    ];
    let config = ServerConfig::try_parse_from(args)?;
    Ok((
        config,
        ConfigGuard {
            data_dir: tmp_data_dir,
        },
    ))
}

pub async fn prepare_env(test_name: &str) -> Result<(ServerConfig, ConfigGuard)> {
    let base_dir = std::env::temp_dir();
    test_config(test_name, &base_dir)
}

pub fn base_url(config: &ServerConfig) -> Url {
    Url::parse(&format!(
        "http://{}:{}/",
        config.listen_address, config.port
    ))
    .expect("valid base url")
}

/// Starts the server on the background runtime and waits until /health
/// answers. The task dies with the test runtime.
pub async fn launch_env(args: ServerConfig) -> Result<(reqwest::Client, AppState)> {
    let state = translog_server::build_state(&args).await?;
    let url = base_url(&args);

    let server_args = args.clone();
    let server_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = translog_server::run::run_graceful_with_state(
            server_args,
            server_state,
            std::future::pending(),
        )
        .await
        {
            tracing::error!("Server failed: {e}");
        }
    });

    let client = reqwest::Client::builder().build()?;
    wait_for_server(&client, &url).await?;
    Ok((client, state))
}

async fn wait_for_server(client: &reqwest::Client, base_url: &Url) -> Result<()> {
    let health_url = base_url.join("health")?;
    for _ in 0..50 {
        if let Ok(response) = client.get(health_url.clone()).send().await {
            if response.status().is_success() {
                return Ok(());
            }
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    Err(anyhow!("Server did not become ready"))
}

pub fn extend_url(url: &Url, segment: impl std::fmt::Display) -> Url {
    let mut url = url.clone();
    url.path_segments_mut()
        .expect("base url cannot be a base")
        .push(&segment.to_string());
    url
}
