mod command;
mod config;
mod format;
mod handlers;
mod runtime;
mod scene;
mod security;
mod server;

use std::sync::Arc;
use std::time::Instant;

use tracing::info;
use tracing_subscriber::EnvFilter;

use format::VecFormatter;
use scene::SceneWorld;
use security::ApiSecurity;
use server::ServerState;

fn main() {
    let filter = EnvFilter::try_from_env("SCENIC_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let formatter = VecFormatter::new(config::separator());
    let dispatcher = Arc::new(
        handlers::build_dispatcher(formatter).expect("command registration failed"),
    );
    info!(commands = dispatcher.table().command_count(), "command table built");

    let world = match config::load_scene_config() {
        Some(scene_config) => SceneWorld::from_config(&scene_config),
        None => SceneWorld::test_scene(),
    };
    info!(actors = world.actor_count(), "scene world ready");

    let (client, requests) = runtime::command_channel();
    let state = ServerState {
        client: client.clone(),
        dispatcher: dispatcher.clone(),
        started_at: Instant::now(),
    };
    let security = ApiSecurity::from_env();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
        rt.block_on(async {
            let tcp_addr = config::tcp_addr();
            let tcp = tokio::net::TcpListener::bind(&tcp_addr)
                .await
                .unwrap_or_else(|e| panic!("failed to bind {tcp_addr}: {e}"));
            info!(addr = %tcp_addr, "command surface listening");

            let http_addr = config::http_addr();
            let http = tokio::net::TcpListener::bind(&http_addr)
                .await
                .unwrap_or_else(|e| panic!("failed to bind {http_addr}: {e}"));
            info!(addr = %http_addr, "http bridge listening");

            let app = server::build_router(state, security);
            let (_, served) = tokio::join!(
                server::serve_tcp(tcp, client),
                axum::serve(http, app)
            );
            served.expect("http server");
        });
    });

    runtime::run_world_loop(world, dispatcher, requests);
}
