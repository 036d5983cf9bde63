use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Url;
use std::time::Duration;

use super::ImageFetcher;
use crate::config::GameTrackerConfig;

/// Downloads GameTracker "player time" graphs.
pub struct GameTrackerFetcher {
    client: reqwest::Client,
    config: GameTrackerConfig,
}

impl GameTrackerFetcher {
    pub fn new(config: GameTrackerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    /// The graph URL for `name`. GameTracker identifies players by the
    /// base64 of their exact display name.
    pub fn graph_url(&self, name: &str) -> Result<Url> {
        let encoded_name = STANDARD.encode(name.as_bytes());
        Url::parse_with_params(
            &self.config.url,
            [
                ("nameb64", encoded_name.as_str()),
                ("host", self.config.host.as_str()),
                ("start", self.config.start.as_str()),
            ],
        )
        .with_context(|| format!("Invalid graph URL {}", self.config.url))
    }
}

#[async_trait]
impl ImageFetcher for GameTrackerFetcher {
    async fn fetch(&self, name: &str) -> Result<Vec<u8>> {
        let url = self.graph_url(name)?;

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            anyhow::bail!("GameTracker returned {}", response.status());
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn config_with_url(url: &str) -> GameTrackerConfig {
        GameTrackerConfig {
            url: url.to_string(),
            timeout_seconds: 5,
            ..GameTrackerConfig::default()
        }
    }

    /// One-shot HTTP server answering every request with `status_line` and
    /// `body`. Returns None where binding a local port is not permitted.
    async fn start_test_server(status_line: &str, body: &'static [u8]) -> Option<String> {
        let listener = match TcpListener::bind("127.0.0.1:0").await {
            Ok(listener) => listener,
            Err(e) if e.kind() == ErrorKind::PermissionDenied => return None,
            Err(e) => panic!("failed to bind test listener: {e}"),
        };

        let addr = listener.local_addr().expect("local_addr");
        let status_line = status_line.to_string();

        tokio::spawn(async move {
            let (mut socket, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => return,
            };

            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;

            let head = format!(
                "HTTP/1.1 {status_line}\r\nContent-Length: {}\r\nContent-Type: image/png\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(body).await;
        });

        Some(format!("http://{addr}/images/graphs/player_time.php"))
    }

    #[test]
    fn graph_url_encodes_name_as_base64() {
        let fetcher = GameTrackerFetcher::new(GameTrackerConfig::default()).expect("fetcher");
        let url = fetcher.graph_url("chani").expect("url");

        assert_eq!(url.host_str(), Some("cache.gametracker.com"));
        assert_eq!(url.path(), "/images/graphs/player_time.php");
        assert!(url.as_str().contains("nameb64=Y2hhbmk%3D"), "{url}");

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("nameb64".to_string(), "Y2hhbmk=".to_string()),
                ("host".to_string(), "149.202.87.35:27015".to_string()),
                ("start".to_string(), "-1w".to_string()),
            ]
        );
    }

    #[test]
    fn graph_url_keeps_punctuation_in_names() {
        let fetcher = GameTrackerFetcher::new(GameTrackerConfig::default()).expect("fetcher");
        let url = fetcher.graph_url("R()CK~KI||3R").expect("url");

        let encoded = url
            .query_pairs()
            .find(|(k, _)| k == "nameb64")
            .map(|(_, v)| v.into_owned())
            .expect("nameb64");
        let decoded = STANDARD.decode(encoded).expect("base64");
        assert_eq!(decoded, b"R()CK~KI||3R");
    }

    #[tokio::test]
    async fn fetch_returns_body_bytes() {
        let Some(url) = start_test_server("200 OK", b"\x89PNG fake").await else {
            eprintln!("Skipping test: unable to bind local HTTP server");
            return;
        };

        let fetcher = GameTrackerFetcher::new(config_with_url(&url)).expect("fetcher");
        let bytes = fetcher.fetch("chani").await.expect("fetch");

        assert_eq!(bytes, b"\x89PNG fake");
    }

    #[tokio::test]
    async fn fetch_fails_on_error_status() {
        let Some(url) = start_test_server("404 Not Found", b"").await else {
            eprintln!("Skipping test: unable to bind local HTTP server");
            return;
        };

        let fetcher = GameTrackerFetcher::new(config_with_url(&url)).expect("fetcher");
        let err = fetcher.fetch("chani").await.unwrap_err();

        assert!(format!("{err}").contains("404"), "{err}");
    }
}
