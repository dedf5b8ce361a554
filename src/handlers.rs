//! Object and service commands bound into the dispatcher at startup.
//! Handlers are thin glue: argument extraction, actor lookup, one world
//! operation, payload formatting. By convention `vget` handlers never
//! mutate the world; only `vset` handlers may.

use std::sync::{Arc, OnceLock};

use crate::command::{Args, CommandTable, Dispatcher, HelpEntry, RegistryError};
use crate::format::{self, VecFormatter};
use crate::scene::{Actor, SceneWorld, CUBE_CLASS};

fn lookup<'w>(world: &'w mut SceneWorld, args: &Args) -> Result<&'w mut Actor, String> {
    let name = args.str_at(0)?;
    world
        .find_actor(name)
        .ok_or_else(|| "Can not find object".to_string())
}

pub fn build_dispatcher(fmt: VecFormatter) -> Result<Dispatcher<SceneWorld>, RegistryError> {
    let mut table = CommandTable::new();
    register_object_commands(&mut table, fmt)?;

    let help: Arc<OnceLock<Vec<HelpEntry>>> = Arc::new(OnceLock::new());
    register_service_commands(&mut table, help.clone())?;

    // Sealed after every registration so the listing covers the whole table,
    // including the service commands themselves.
    let _ = help.set(table.help());
    Ok(Dispatcher::new(table))
}

fn register_object_commands(
    table: &mut CommandTable<SceneWorld>,
    fmt: VecFormatter,
) -> Result<(), RegistryError> {
    table.register(
        "vget /objects",
        |world, _| Ok(world.actor_names().join(" ")),
        "Get the name of all objects",
    )?;

    table.register(
        "vset /objects/spawn_cube",
        |world, _| {
            world.spawn(CUBE_CLASS, None)?;
            Ok(String::new())
        },
        "Spawn a cube in the scene for debugging purpose",
    )?;

    table.register(
        "vset /objects/spawn_cube [str]",
        |world, args| {
            world.spawn(CUBE_CLASS, Some(args.str_at(0)?))?;
            Ok(String::new())
        },
        "Spawn a cube in the scene for debugging purpose, with a given name",
    )?;

    table.register(
        "vset /objects/spawn [str]",
        |world, args| world.spawn(args.str_at(0)?, None),
        "Spawn an object with a registered class name as the argument",
    )?;

    let triple = fmt.clone();
    table.register(
        "vget /object/[str]/location",
        move |world, args| {
            let actor = lookup(world, args)?;
            Ok(triple.triple(actor.location))
        },
        "Get object location [x, y, z]",
    )?;

    table.register(
        "vset /object/[str]/location [float] [float] [float]",
        |world, args| {
            let location = [args.float_at(1)?, args.float_at(2)?, args.float_at(3)?];
            let actor = lookup(world, args)?;
            actor.location = location;
            Ok(String::new())
        },
        "Set object location [x, y, z]",
    )?;

    let triple = fmt.clone();
    table.register(
        "vget /object/[str]/rotation",
        move |world, args| {
            let actor = lookup(world, args)?;
            Ok(triple.triple(actor.rotation))
        },
        "Get object rotation [pitch, yaw, roll]",
    )?;

    table.register(
        "vset /object/[str]/rotation [float] [float] [float]",
        |world, args| {
            let rotation = [args.float_at(1)?, args.float_at(2)?, args.float_at(3)?];
            let actor = lookup(world, args)?;
            actor.rotation = rotation;
            Ok(String::new())
        },
        "Set object rotation [pitch, yaw, roll]",
    )?;

    table.register(
        "vget /object/[str]/vertex_location",
        |world, args| {
            let actor = lookup(world, args)?;
            Ok(format::vertex_lines(actor.world_vertices()))
        },
        "Get the world-space location of each mesh vertex",
    )?;

    table.register(
        "vget /object/[str]/color",
        |world, args| {
            let actor = lookup(world, args)?;
            Ok(format::color(actor.color))
        },
        "Get the labeling color of an object (used in object instance mask)",
    )?;

    table.register(
        "vset /object/[str]/color [uint] [uint] [uint]",
        |world, args| {
            let channels = [args.uint_at(1)?, args.uint_at(2)?, args.uint_at(3)?];
            let actor = lookup(world, args)?;
            actor.color.r = channels[0].min(255) as u8;
            actor.color.g = channels[1].min(255) as u8;
            actor.color.b = channels[2].min(255) as u8;
            actor.color.a = 255;
            Ok(String::new())
        },
        "Set the labeling color of an object [r, g, b]",
    )?;

    table.register(
        "vget /object/[str]/mobility",
        |world, args| {
            let actor = lookup(world, args)?;
            Ok(actor.mobility.name().to_string())
        },
        "Is the object static or movable?",
    )?;

    table.register(
        "vset /object/[str]/show",
        |world, args| {
            lookup(world, args)?.visible = true;
            Ok(String::new())
        },
        "Show object",
    )?;

    table.register(
        "vset /object/[str]/hide",
        |world, args| {
            lookup(world, args)?.visible = false;
            Ok(String::new())
        },
        "Hide object",
    )?;

    table.register(
        "vset /object/[str]/destroy",
        |world, args| {
            let name = args.str_at(0)?;
            if world.destroy(name) {
                Ok(String::new())
            } else {
                Err("Can not find object".to_string())
            }
        },
        "Destroy object",
    )?;

    table.register(
        "vget /object/[str]/class_name",
        |world, args| {
            let actor = lookup(world, args)?;
            Ok(actor.class_name.clone())
        },
        "Get the class name for filtering objects",
    )?;

    table.register(
        "vget /object/[str]/label",
        |world, args| {
            let actor = lookup(world, args)?;
            Ok(actor.label.clone())
        },
        "Get object label",
    )?;

    table.register(
        "vset /object/[str]/label [str]",
        |world, args| {
            let label = args.str_at(1)?.to_string();
            lookup(world, args)?.label = label;
            Ok(String::new())
        },
        "Set object label",
    )?;

    Ok(())
}

fn register_service_commands(
    table: &mut CommandTable<SceneWorld>,
    help: Arc<OnceLock<Vec<HelpEntry>>>,
) -> Result<(), RegistryError> {
    let listing = help.clone();
    table.register(
        "vget /commands",
        move |_, _| {
            let lines: Vec<String> = listing
                .get()
                .map(|entries| {
                    entries
                        .iter()
                        .map(|entry| format!("{}: {}", entry.pattern, entry.description))
                        .collect()
                })
                .unwrap_or_default();
            Ok(lines.join("\n"))
        },
        "List all commands with descriptions",
    )?;

    let listing = help;
    table.register(
        "vget /scenic/status",
        move |world, _| {
            let commands = listing.get().map_or(0, Vec::len);
            Ok(format!(
                "{} actors, {} commands registered",
                world.actor_count(),
                commands
            ))
        },
        "Server status line",
    )?;

    table.register(
        "vget /scenic/version",
        |_, _| Ok(env!("CARGO_PKG_VERSION").to_string()),
        "Crate version",
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Mobility;

    fn fixture() -> (Dispatcher<SceneWorld>, SceneWorld) {
        let dispatcher = build_dispatcher(VecFormatter::default()).expect("build dispatcher");
        (dispatcher, SceneWorld::test_scene())
    }

    #[test]
    fn object_list_is_space_separated() {
        let (dispatcher, mut world) = fixture();
        let response = dispatcher.execute(&mut world, "vget /objects");
        assert!(response.ok);
        assert_eq!(response.payload, "Cube_0 Floor");
    }

    #[test]
    fn location_round_trips_through_the_payload() {
        let (dispatcher, mut world) = fixture();
        let set = dispatcher.execute(&mut world, "vset /object/Cube_0/location 1.0 2.0 3.0");
        assert!(set.ok, "{}", set.payload);
        assert!(set.payload.is_empty());

        let get = dispatcher.execute(&mut world, "vget /object/Cube_0/location");
        assert!(get.ok);
        let parsed: Vec<f32> = get
            .payload
            .split(' ')
            .map(|part| part.parse().expect("float payload"))
            .collect();
        assert_eq!(parsed, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn rotation_round_trips() {
        let (dispatcher, mut world) = fixture();
        assert!(dispatcher.execute(&mut world, "vset /object/Cube_0/rotation 10.0 20.0 30.0").ok);
        let get = dispatcher.execute(&mut world, "vget /object/Cube_0/rotation");
        assert_eq!(get.payload, "10.000 20.000 30.000");
    }

    #[test]
    fn get_location_does_not_mutate_the_world() {
        let (dispatcher, mut world) = fixture();
        let before = world.actor("Cube_0").expect("cube").location;
        dispatcher.execute(&mut world, "vget /object/Cube_0/location");
        assert_eq!(world.actor("Cube_0").expect("cube").location, before);
    }

    #[test]
    fn missing_object_is_a_uniform_error() {
        let (dispatcher, mut world) = fixture();
        for line in [
            "vget /object/Nope/location",
            "vset /object/Nope/location 1 2 3",
            "vget /object/Nope/mobility",
            "vset /object/Nope/destroy",
        ] {
            let response = dispatcher.execute(&mut world, line);
            assert!(!response.ok, "{line}");
            assert_eq!(response.payload, "Can not find object", "{line}");
        }
    }

    #[test]
    fn color_set_then_get_uses_rgba_wire_form() {
        let (dispatcher, mut world) = fixture();
        assert!(dispatcher.execute(&mut world, "vset /object/Cube_0/color 255 0 128").ok);
        let get = dispatcher.execute(&mut world, "vget /object/Cube_0/color");
        assert_eq!(get.payload, "(R=255,G=0,B=128,A=255)");
    }

    #[test]
    fn color_channels_are_clamped_to_a_byte() {
        let (dispatcher, mut world) = fixture();
        assert!(dispatcher.execute(&mut world, "vset /object/Cube_0/color 999 0 0").ok);
        assert_eq!(world.actor("Cube_0").expect("cube").color.r, 255);
    }

    #[test]
    fn vertex_location_lists_every_corner() {
        let (dispatcher, mut world) = fixture();
        let response = dispatcher.execute(&mut world, "vget /object/Cube_0/vertex_location");
        assert!(response.ok);
        let lines: Vec<&str> = response.payload.lines().collect();
        assert_eq!(lines.len(), 8);
        assert_eq!(lines[0], "-50.00000     -50.00000     0.00000");
        assert!(response.payload.ends_with('\n'));
    }

    #[test]
    fn mobility_names_match_the_engine_vocabulary() {
        let (dispatcher, mut world) = fixture();
        assert_eq!(
            dispatcher.execute(&mut world, "vget /object/Cube_0/mobility").payload,
            "Movable"
        );
        assert_eq!(
            dispatcher.execute(&mut world, "vget /object/Floor/mobility").payload,
            "Static"
        );
    }

    #[test]
    fn show_and_hide_toggle_visibility() {
        let (dispatcher, mut world) = fixture();
        assert!(dispatcher.execute(&mut world, "vset /object/Cube_0/hide").ok);
        assert!(!world.actor("Cube_0").expect("cube").visible);
        assert!(dispatcher.execute(&mut world, "vset /object/Cube_0/show").ok);
        assert!(world.actor("Cube_0").expect("cube").visible);
    }

    #[test]
    fn destroy_then_lookup_fails() {
        let (dispatcher, mut world) = fixture();
        assert!(dispatcher.execute(&mut world, "vset /object/Cube_0/destroy").ok);
        let get = dispatcher.execute(&mut world, "vget /object/Cube_0/location");
        assert_eq!(get.payload, "Can not find object");
    }

    #[test]
    fn spawn_by_class_returns_the_actor_name() {
        let (dispatcher, mut world) = fixture();
        let response = dispatcher.execute(&mut world, "vset /objects/spawn Plane");
        assert!(response.ok);
        assert_eq!(response.payload, "Plane_0");
        assert!(world.actor("Plane_0").is_some());
    }

    #[test]
    fn spawn_unknown_class_reports_the_class_name() {
        let (dispatcher, mut world) = fixture();
        let response = dispatcher.execute(&mut world, "vset /objects/spawn Teapot");
        assert_eq!(response.payload, "Can not find a class with name 'Teapot'");
    }

    #[test]
    fn spawn_cube_overloads_resolve_by_arity() {
        let (dispatcher, mut world) = fixture();
        assert!(dispatcher.execute(&mut world, "vset /objects/spawn_cube").ok);
        let named = dispatcher.execute(&mut world, "vset /objects/spawn_cube MyBox");
        assert!(named.ok);
        assert!(named.payload.is_empty());
        assert!(world.actor("MyBox").is_some());

        let duplicate = dispatcher.execute(&mut world, "vset /objects/spawn_cube MyBox");
        assert_eq!(duplicate.payload, "Failed to spawn actor");
    }

    #[test]
    fn label_set_and_get() {
        let (dispatcher, mut world) = fixture();
        assert!(dispatcher.execute(&mut world, "vset /object/Cube_0/label hero").ok);
        assert_eq!(
            dispatcher.execute(&mut world, "vget /object/Cube_0/label").payload,
            "hero"
        );
    }

    #[test]
    fn class_name_reports_the_spawning_class() {
        let (dispatcher, mut world) = fixture();
        assert_eq!(
            dispatcher.execute(&mut world, "vget /object/Floor/class_name").payload,
            "Plane"
        );
    }

    #[test]
    fn command_listing_covers_the_whole_table() {
        let (dispatcher, mut world) = fixture();
        let response = dispatcher.execute(&mut world, "vget /commands");
        assert!(response.ok);
        assert!(response.payload.contains("vget /objects: Get the name of all objects"));
        assert!(response.payload.contains("vget /commands"));
        assert!(response.payload.contains("vget /scenic/version"));
    }

    #[test]
    fn status_and_version_commands() {
        let (dispatcher, mut world) = fixture();
        let status = dispatcher.execute(&mut world, "vget /scenic/status");
        assert_eq!(status.payload, "2 actors, 21 commands registered");
        let version = dispatcher.execute(&mut world, "vget /scenic/version");
        assert_eq!(version.payload, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn mobility_survives_mobility_free_edits() {
        let (dispatcher, mut world) = fixture();
        world.find_actor("Floor").expect("floor").mobility = Mobility::Stationary;
        assert!(dispatcher.execute(&mut world, "vset /object/Floor/location 0 0 1").ok);
        assert_eq!(
            dispatcher.execute(&mut world, "vget /object/Floor/mobility").payload,
            "Stationary"
        );
    }
}
