//! Command runtime: the scene world is owned by a single loop that drains
//! requests from a channel and answers through oneshot replies, so handler
//! execution is serialized without locks. Serving surfaces hold a
//! `CommandClient` and never touch the world directly.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use tracing::info;

use crate::command::{CommandResponse, Dispatcher};
use crate::scene::SceneWorld;

pub struct SceneRequest {
    pub line: String,
    pub reply: tokio::sync::oneshot::Sender<CommandResponse>,
}

#[derive(Clone)]
pub struct CommandClient {
    sender: Sender<SceneRequest>,
}

impl CommandClient {
    pub async fn execute(&self, line: impl Into<String>) -> CommandResponse {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let request = SceneRequest {
            line: line.into(),
            reply: tx,
        };
        if self.sender.send(request).is_err() {
            return CommandResponse::err("Channel closed");
        }
        rx.await
            .unwrap_or_else(|_| CommandResponse::err("Channel closed"))
    }
}

pub fn command_channel() -> (CommandClient, Receiver<SceneRequest>) {
    let (sender, receiver) = crossbeam_channel::unbounded();
    (CommandClient { sender }, receiver)
}

/// Runs until every `CommandClient` is dropped.
pub fn run_world_loop(
    mut world: SceneWorld,
    dispatcher: Arc<Dispatcher<SceneWorld>>,
    requests: Receiver<SceneRequest>,
) {
    while let Ok(request) = requests.recv() {
        let response = dispatcher.execute(&mut world, &request.line);
        let _ = request.reply.send(response);
    }
    info!("command channel closed, world loop exiting");
}
