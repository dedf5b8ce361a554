//! Serving surfaces. The TCP line protocol is the native one: a command per
//! line in, an envelope line back. The HTTP bridge exposes the same
//! dispatch through `POST /command` plus introspection endpoints, wrapped
//! in the `{ok, data, error}` JSON envelope.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::middleware;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

use crate::command::{Dispatcher, HelpEntry};
use crate::runtime::CommandClient;
use crate::scene::SceneWorld;
use crate::security::{api_guard, ApiSecurity};

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Clone)]
pub struct ServerState {
    pub client: CommandClient,
    pub dispatcher: Arc<Dispatcher<SceneWorld>>,
    pub started_at: Instant,
}

pub fn build_router(state: ServerState, security: ApiSecurity) -> Router {
    Router::new()
        .route("/command", post(run_command))
        .route("/commands", get(list_commands))
        .route("/status", get(get_status))
        .with_state(state)
        .layer(middleware::from_fn_with_state(security, api_guard))
}

async fn run_command(State(state): State<ServerState>, body: String) -> Json<ApiResponse<String>> {
    let response = state.client.execute(body.trim().to_string()).await;
    if response.ok {
        Json(ApiResponse::success(response.payload))
    } else {
        Json(ApiResponse::err(response.payload))
    }
}

async fn list_commands(State(state): State<ServerState>) -> Json<ApiResponse<Vec<HelpEntry>>> {
    Json(ApiResponse::success(state.dispatcher.table().help()))
}

async fn get_status(State(state): State<ServerState>) -> Json<ApiResponse<serde_json::Value>> {
    Json(ApiResponse::success(serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.started_at.elapsed().as_secs(),
        "commands": state.dispatcher.table().command_count(),
    })))
}

pub async fn serve_tcp(listener: TcpListener, client: CommandClient) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                info!(%peer, "client connected");
                let client = client.clone();
                tokio::spawn(async move {
                    if let Err(error) = serve_connection(stream, client).await {
                        warn!(%peer, %error, "connection ended with an error");
                    }
                });
            }
            Err(error) => {
                warn!(%error, "accept failed");
            }
        }
    }
}

async fn serve_connection(stream: TcpStream, client: CommandClient) -> std::io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines.next_line().await? {
        let response = client.execute(line).await;
        writer.write_all(response.to_wire().as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::util::ServiceExt;

    use crate::format::VecFormatter;
    use crate::handlers::build_dispatcher;
    use crate::runtime::{command_channel, run_world_loop};

    fn test_state() -> (ServerState, std::thread::JoinHandle<()>) {
        let dispatcher =
            Arc::new(build_dispatcher(VecFormatter::default()).expect("build dispatcher"));
        let (client, requests) = command_channel();
        let world = SceneWorld::test_scene();
        let loop_dispatcher = dispatcher.clone();
        let handle = std::thread::spawn(move || run_world_loop(world, loop_dispatcher, requests));
        (
            ServerState {
                client,
                dispatcher,
                started_at: Instant::now(),
            },
            handle,
        )
    }

    fn open_router(state: ServerState) -> Router {
        build_router(state, ApiSecurity::new(None, 10_000))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn post_command_round_trips_the_envelope() {
        let (state, _handle) = test_state();
        let app = open_router(state);

        let ok = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/command")
                    .body(Body::from("vget /object/Cube_0/location\n"))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(ok.status(), StatusCode::OK);
        let value = body_json(ok).await;
        assert_eq!(value["ok"], true);
        assert_eq!(value["data"], "0.000 0.000 50.000");

        let err = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/command")
                    .body(Body::from("vget /object/Nope/location"))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(err.status(), StatusCode::OK);
        let value = body_json(err).await;
        assert_eq!(value["ok"], false);
        assert_eq!(value["error"], "Can not find object");
    }

    #[tokio::test]
    async fn commands_endpoint_lists_help_entries() {
        let (state, _handle) = test_state();
        let app = open_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/commands")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let value = body_json(response).await;
        let entries = value["data"].as_array().expect("entries");
        assert!(entries
            .iter()
            .any(|entry| entry["pattern"] == "vget /objects"));
    }

    #[tokio::test]
    async fn status_reports_version_and_command_count() {
        let (state, _handle) = test_state();
        let app = open_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/status")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        let value = body_json(response).await;
        assert_eq!(value["ok"], true);
        assert_eq!(value["data"]["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(value["data"]["commands"], 21);
    }

    #[tokio::test]
    async fn tcp_session_speaks_the_line_protocol() {
        let (state, _handle) = test_state();
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(serve_tcp(listener, state.client.clone()));

        let stream = TcpStream::connect(addr).await.expect("connect");
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        writer
            .write_all(b"vset /object/Cube_0/location 1.0 2.0 3.0\n")
            .await
            .expect("write");
        assert_eq!(lines.next_line().await.expect("read"), Some("OK".to_string()));

        writer
            .write_all(b"vget /object/Cube_0/location\n")
            .await
            .expect("write");
        assert_eq!(
            lines.next_line().await.expect("read"),
            Some("OK 1.000 2.000 3.000".to_string())
        );

        writer.write_all(b"vget /bogus\n").await.expect("write");
        let error_line = lines.next_line().await.expect("read").expect("line");
        assert!(error_line.starts_with("Error: "));
    }
}
