// src/api_client.rs
// HTTP API client for the game state service.
//
// The session only sees the GameService trait; HttpGameService is the
// reqwest-backed implementation used by the terminal client.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use crate::defs::{GameState, GAME_DATA_PATH, RESTART_PATH};

/// Failure of a call to the game state service (network or parse error)
#[derive(Debug)]
pub enum ServiceError {
    /// Transport failure: connection refused, timeout, broken body
    Http(reqwest::Error),
    /// The server answered with a non-2xx status
    Status(reqwest::StatusCode),
    /// The body is not a valid game state document
    Decode(serde_json::Error),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Http(e) => write!(f, "HTTP request failed: {e}"),
            ServiceError::Status(status) => write!(f, "HTTP request failed with status: {status}"),
            ServiceError::Decode(e) => write!(f, "Invalid game data: {e}"),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServiceError::Http(e) => Some(e),
            ServiceError::Status(_) => None,
            ServiceError::Decode(e) => Some(e),
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        ServiceError::Http(e)
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self {
        ServiceError::Decode(e)
    }
}

/// Operations offered by the external game state service
pub trait GameService: Send + Sync + 'static {
    /// Fetch the current game state
    fn fetch_state(&self) -> impl Future<Output = Result<GameState, ServiceError>> + Send;

    /// Ask the server to reset the game
    fn restart(&self) -> impl Future<Output = Result<(), ServiceError>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpGameService {
    server_url: String,
    http_client: reqwest::Client,
}

impl HttpGameService {
    pub fn new(server_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            server_url: server_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }
}

impl GameService for HttpGameService {
    async fn fetch_state(&self) -> Result<GameState, ServiceError> {
        let url = format!("{}{GAME_DATA_PATH}", self.server_url);
        let response = self.http_client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(ServiceError::Status(response.status()));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn restart(&self) -> Result<(), ServiceError> {
        let url = format!("{}{RESTART_PATH}", self.server_url);
        let response = self.http_client.post(&url).send().await?;

        // Any 2xx counts, the body is ignored
        if response.status().is_success() {
            Ok(())
        } else {
            Err(ServiceError::Status(response.status()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::Arc;
    use http_body_util::Full;
    use hyper::body::{Bytes, Incoming};
    use hyper::server::conn::http1;
    use hyper::service::service_fn;
    use hyper::{Method, Request, Response, StatusCode};
    use hyper_util::rt::TokioIo;
    use tokio::net::TcpListener;

    const GAME_DATA: &str = r#"{"command":"Lever les mains","score":4,"remaining_time":33,"success":true,"game_over":false}"#;

    // Serve every connection with `handler` on an ephemeral port and return its base URL
    async fn spawn_stub<F>(handler: F) -> String
    where
        F: Fn(&Method, &str) -> (StatusCode, &'static str) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handler = Arc::new(handler);

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let handler = Arc::clone(&handler);
                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<Incoming>| {
                        let (status, body) = handler(req.method(), req.uri().path());
                        async move {
                            let mut response = Response::new(Full::new(Bytes::from(body)));
                            *response.status_mut() = status;
                            Ok::<_, Infallible>(response)
                        }
                    });
                    let _ = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await;
                });
            }
        });

        format!("http://{addr}")
    }

    fn reference_routes(method: &Method, path: &str) -> (StatusCode, &'static str) {
        match (method, path) {
            (&Method::GET, "/get_game_data") => (StatusCode::OK, GAME_DATA),
            (&Method::POST, "/restart_game") => (StatusCode::NO_CONTENT, ""),
            _ => (StatusCode::NOT_FOUND, "not found"),
        }
    }

    fn service_for(url: &str) -> HttpGameService {
        HttpGameService::new(url, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_state() {
        let url = spawn_stub(reference_routes).await;
        let state = service_for(&url).fetch_state().await.unwrap();

        assert_eq!(state, GameState {
            command: "Lever les mains".to_string(),
            score: 4,
            remaining_time: 33,
            success: true,
            over: false,
        });
    }

    #[tokio::test]
    async fn test_restart_accepts_no_content() {
        let url = spawn_stub(reference_routes).await;
        assert!(service_for(&url).restart().await.is_ok());
    }

    #[tokio::test]
    async fn test_trailing_slash_in_server_url() {
        let url = spawn_stub(reference_routes).await;
        let service = service_for(&format!("{url}/"));
        assert_eq!(service.server_url(), url);
        assert!(service.fetch_state().await.is_ok());
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let url = spawn_stub(|_, _| (StatusCode::INTERNAL_SERVER_ERROR, "boom")).await;
        let service = service_for(&url);

        match service.fetch_state().await {
            Err(ServiceError::Status(status)) => assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR),
            other => panic!("expected status error, got {other:?}"),
        }
        assert!(matches!(service.restart().await, Err(ServiceError::Status(_))));
    }

    #[tokio::test]
    async fn test_invalid_json() {
        let url = spawn_stub(|_, _| (StatusCode::OK, "<html>not json</html>")).await;

        let result = service_for(&url).fetch_state().await;
        assert!(matches!(result, Err(ServiceError::Decode(_))));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // Grab a free port, then close it again
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = service_for(&format!("http://{addr}")).fetch_state().await;
        let err = result.unwrap_err();
        assert!(matches!(err, ServiceError::Http(_)));
        assert!(err.to_string().starts_with("HTTP request failed"));
    }
}
