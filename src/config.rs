//! Environment-backed configuration. Every knob has a working default so
//! the binary runs with no setup; a JSON scene file (or one embedded at
//! build time via `SCENIC_EMBED_SCENE_PATH`) seeds the initial world.

use tracing::{info, warn};

use crate::scene::SceneConfig;

const EMBEDDED_SCENE: &str =
    include_str!(concat!(env!("OUT_DIR"), "/scenic_embedded_scene.json"));

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

pub fn tcp_addr() -> String {
    env_or("SCENIC_TCP_ADDR", "127.0.0.1:9000")
}

pub fn http_addr() -> String {
    env_or("SCENIC_HTTP_ADDR", "127.0.0.1:3000")
}

/// Separator used between the three floats of transform payloads.
pub fn separator() -> String {
    env_or("SCENIC_SEPARATOR", " ")
}

/// Startup scene: `SCENIC_SCENE` path (default `scene.json`), falling back
/// to the build-time embedded scene, falling back to `None` (callers use
/// the built-in test scene).
pub fn load_scene_config() -> Option<SceneConfig> {
    let path = env_or("SCENIC_SCENE", "scene.json");
    match std::fs::read_to_string(&path) {
        Ok(contents) => match serde_json::from_str::<SceneConfig>(&contents) {
            Ok(config) => {
                info!(%path, "loaded startup scene");
                return Some(config);
            }
            Err(error) => {
                warn!(%path, %error, "failed to parse startup scene, ignoring it");
            }
        },
        Err(_) => {}
    }

    match serde_json::from_str::<SceneConfig>(EMBEDDED_SCENE) {
        Ok(config) if !config.actors.is_empty() || !config.classes.is_empty() => {
            info!("using embedded startup scene");
            Some(config)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_loopback() {
        // Bind addresses default to loopback unless overridden; the env vars
        // are not set under test.
        assert!(tcp_addr().starts_with("127.0.0.1"));
        assert!(http_addr().starts_with("127.0.0.1"));
    }

    #[test]
    fn embedded_scene_placeholder_parses_as_empty() {
        let config: SceneConfig = serde_json::from_str("{}").expect("parse");
        assert!(config.actors.is_empty());
        assert!(config.classes.is_empty());
    }
}
