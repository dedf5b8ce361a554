//! In-memory scene world: the host-simulation stand-in the object commands
//! operate on. A real engine backend would replace this module; nothing in
//! the command core depends on it.

use std::collections::HashMap;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mobility {
    Static,
    Stationary,
    Movable,
}

impl Mobility {
    pub fn name(self) -> &'static str {
        match self {
            Mobility::Static => "Static",
            Mobility::Stationary => "Stationary",
            Mobility::Movable => "Movable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

pub struct Actor {
    pub name: String,
    pub class_name: String,
    pub label: String,
    pub location: [f32; 3],
    /// Pitch, yaw, roll in degrees.
    pub rotation: [f32; 3],
    pub color: Rgba,
    pub mobility: Mobility,
    pub visible: bool,
    mesh: Vec<[f32; 3]>,
}

impl Actor {
    /// Mesh vertices translated into world space.
    pub fn world_vertices(&self) -> impl Iterator<Item = [f32; 3]> + '_ {
        let [ox, oy, oz] = self.location;
        self.mesh
            .iter()
            .map(move |[x, y, z]| [x + ox, y + oy, z + oz])
    }
}

/// A spawnable class: name, local-space mesh, default mobility.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassDef {
    pub name: String,
    pub mesh: Vec<[f32; 3]>,
    #[serde(default = "movable")]
    pub mobility: Mobility,
}

fn movable() -> Mobility {
    Mobility::Movable
}

/// Startup scene description, loaded from JSON (see `config`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SceneConfig {
    pub seed: Option<u64>,
    #[serde(default)]
    pub classes: Vec<ClassDef>,
    #[serde(default)]
    pub actors: Vec<ActorConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActorConfig {
    pub name: String,
    pub class: Option<String>,
    #[serde(default)]
    pub location: [f32; 3],
    #[serde(default)]
    pub rotation: [f32; 3],
    pub mobility: Option<Mobility>,
    pub color: Option<[u8; 3]>,
    pub label: Option<String>,
    #[serde(default)]
    pub hidden: bool,
}

pub struct SceneWorld {
    actors: Vec<Actor>,
    classes: HashMap<String, ClassDef>,
    rng: SmallRng,
    spawn_counter: u64,
}

pub const CUBE_CLASS: &str = "Cube";

/// 100-unit cube corners, local space.
fn cube_mesh() -> Vec<[f32; 3]> {
    let mut mesh = Vec::with_capacity(8);
    for &x in &[-50.0, 50.0] {
        for &y in &[-50.0, 50.0] {
            for &z in &[-50.0, 50.0] {
                mesh.push([x, y, z]);
            }
        }
    }
    mesh
}

fn plane_mesh() -> Vec<[f32; 3]> {
    vec![
        [-50.0, -50.0, 0.0],
        [-50.0, 50.0, 0.0],
        [50.0, -50.0, 0.0],
        [50.0, 50.0, 0.0],
    ]
}

impl SceneWorld {
    pub fn new() -> Self {
        Self::with_seed(rand::thread_rng().gen())
    }

    pub fn with_seed(seed: u64) -> Self {
        let mut world = Self {
            actors: Vec::new(),
            classes: HashMap::new(),
            rng: SmallRng::seed_from_u64(seed),
            spawn_counter: 0,
        };
        world.register_class(ClassDef {
            name: CUBE_CLASS.to_string(),
            mesh: cube_mesh(),
            mobility: Mobility::Movable,
        });
        world.register_class(ClassDef {
            name: "Plane".to_string(),
            mesh: plane_mesh(),
            mobility: Mobility::Static,
        });
        world
    }

    /// Small fixed scene used when no startup config is supplied.
    pub fn test_scene() -> Self {
        let mut world = Self::with_seed(7);
        world
            .spawn(CUBE_CLASS, Some("Cube_0"))
            .expect("builtin cube");
        if let Some(actor) = world.find_actor("Cube_0") {
            actor.location = [0.0, 0.0, 50.0];
        }
        world
            .spawn("Plane", Some("Floor"))
            .expect("builtin floor");
        if let Some(actor) = world.find_actor("Floor") {
            actor.mobility = Mobility::Static;
        }
        world
    }

    pub fn from_config(config: &SceneConfig) -> Self {
        let mut world = match config.seed {
            Some(seed) => Self::with_seed(seed),
            None => Self::new(),
        };
        for class in &config.classes {
            world.register_class(class.clone());
        }
        for actor in &config.actors {
            world.place(actor);
        }
        world
    }

    pub fn register_class(&mut self, class: ClassDef) {
        self.classes.insert(class.name.clone(), class);
    }

    pub fn find_actor(&mut self, name: &str) -> Option<&mut Actor> {
        self.actors.iter_mut().find(|actor| actor.name == name)
    }

    pub fn actor(&self, name: &str) -> Option<&Actor> {
        self.actors.iter().find(|actor| actor.name == name)
    }

    pub fn actor_names(&self) -> Vec<&str> {
        self.actors.iter().map(|actor| actor.name.as_str()).collect()
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Spawns an instance of a registered class. A `None` name allocates the
    /// next `<Class>_<n>` slot; an explicit name must be free.
    pub fn spawn(&mut self, class_name: &str, name: Option<&str>) -> Result<String, String> {
        let Some(class) = self.classes.get(class_name).cloned() else {
            return Err(format!("Can not find a class with name '{class_name}'"));
        };
        let name = match name {
            Some(explicit) => {
                if self.actor(explicit).is_some() {
                    return Err("Failed to spawn actor".to_string());
                }
                explicit.to_string()
            }
            None => loop {
                let candidate = format!("{}_{}", class.name, self.spawn_counter);
                self.spawn_counter += 1;
                if self.actor(&candidate).is_none() {
                    break candidate;
                }
            },
        };
        let [r, g, b] = self.rng.gen::<[u8; 3]>();
        self.actors.push(Actor {
            name: name.clone(),
            class_name: class.name.clone(),
            label: name.clone(),
            location: [0.0; 3],
            rotation: [0.0; 3],
            color: Rgba { r, g, b, a: 255 },
            mobility: class.mobility,
            visible: true,
            mesh: class.mesh,
        });
        Ok(name)
    }

    pub fn destroy(&mut self, name: &str) -> bool {
        let before = self.actors.len();
        self.actors.retain(|actor| actor.name != name);
        self.actors.len() != before
    }

    fn place(&mut self, config: &ActorConfig) {
        let class_name = config.class.as_deref().unwrap_or(CUBE_CLASS).to_string();
        let spawned = match self.spawn(&class_name, Some(&config.name)) {
            Ok(spawned) => spawned,
            Err(reason) => {
                tracing::warn!(actor = %config.name, %reason, "skipping configured actor");
                return;
            }
        };
        if let Some(actor) = self.find_actor(&spawned) {
            actor.location = config.location;
            actor.rotation = config.rotation;
            if let Some(mobility) = config.mobility {
                actor.mobility = mobility;
            }
            if let Some([r, g, b]) = config.color {
                actor.color = Rgba { r, g, b, a: 255 };
            }
            if let Some(label) = &config.label {
                actor.label = label.clone();
            }
            actor.visible = !config.hidden;
        }
    }
}

impl Default for SceneWorld {
    fn default() -> Self {
        Self::new()
    }
}
