//! Builds the diorama's static scene graph and registers its actors.

use std::f64::consts::FRAC_PI_2;

use tracing::debug;

use diorama_choreo::{ActorId, ActorRegistry, Elevator, Motion, PartId, PlatformScreenDoor};
use diorama_core::{Color, DioramaConfig, DioramaResult, ElevatorConfig, Size3, Vec3};

use crate::node::{Geometry, Material, Node, Texture};
use crate::scene::{Camera, Light, Scene};

pub const SKY_COLOR: u32 = 0x87ceeb;
pub const GROUND_COLOR: u32 = 0xcccccc;
pub const PLATFORM_BASE_COLOR: u32 = 0x555555;
pub const DOOR_PANEL_COLOR: u32 = 0xeeeeee;
pub const ELEVATOR_COLOR: u32 = 0x7777ff;

pub const PLATFORM_SURFACE_TEXTURE: &str = "textures/platform_surface.jpg";

const PLATFORM_LENGTH: f64 = 120.0;
const PLATFORM_WIDTH: f64 = 8.0;
const DOOR_HEIGHT: f64 = 2.5;
const DOOR_THICKNESS: f64 = 0.2;
const DOOR_OPACITY: f64 = 0.9;

/// Door groups sit this high above their platform, and this far towards its edge.
const DOOR_Y: f64 = 3.25;
const DOOR_Z: f64 = 1.9;

/// The composed scene and the actors its bound nodes follow.
#[derive(Debug, Clone)]
pub struct Diorama {
    pub scene: Scene,
    pub actors: ActorRegistry,
}

/// A platform deck: grey base with a textured walking surface on top.
pub fn build_platform(id: &str) -> Node {
    let base = Node::mesh(
        format!("{}/base", id),
        Geometry::Box {
            size: Size3::new(PLATFORM_LENGTH, 2.0, PLATFORM_WIDTH),
        },
        Material::solid(Color::from_rgb_u32(PLATFORM_BASE_COLOR)),
    )
    .with_position(0.0, 1.0, 0.0)
    .casting_shadow();

    let surface = Node::mesh(
        format!("{}/surface", id),
        Geometry::Box {
            size: Size3::new(PLATFORM_LENGTH, 0.2, PLATFORM_WIDTH),
        },
        Material::textured(Texture {
            path: PLATFORM_SURFACE_TEXTURE.to_string(),
            repeat: [20.0, 2.0],
        }),
    )
    .with_position(0.0, 2.1, 0.0)
    .receiving_shadow();

    Node::group(id).with_child(base).with_child(surface)
}

/// A platform-screen door: two translucent leaves, each half of `length`
/// wide, bound to the returned actor's panels.
pub fn build_platform_screen_door(
    id: &str,
    length: f64,
    motion: Motion,
) -> (Node, PlatformScreenDoor) {
    let actor_id = ActorId::new(id);
    let door = PlatformScreenDoor::new(actor_id.clone(), length, motion);
    let material =
        Material::solid(Color::from_rgb_u32(DOOR_PANEL_COLOR)).with_opacity(DOOR_OPACITY);
    let leaf = Geometry::Box {
        size: Size3::new(door.leaf_width(), DOOR_HEIGHT, DOOR_THICKNESS),
    };

    let left = Node::mesh(format!("{}/left", id), leaf.clone(), material.clone())
        .with_position(door.left_x(), 0.0, 0.0)
        .casting_shadow()
        .bound_to(actor_id.clone(), PartId::LeftPanel);
    let right = Node::mesh(format!("{}/right", id), leaf, material)
        .with_position(door.right_x(), 0.0, 0.0)
        .casting_shadow()
        .bound_to(actor_id, PartId::RightPanel);

    (Node::group(id).with_child(left).with_child(right), door)
}

/// An elevator car parked at the configured ground floor.
pub fn build_elevator(id: &str, config: &ElevatorConfig) -> DioramaResult<(Node, Elevator)> {
    let actor_id = ActorId::new(id);
    let elevator = Elevator::new(
        actor_id.clone(),
        config.floors.iter().map(|f| (f.number, f.height)),
        config.ground_floor,
        Motion::new(config.duration, config.easing),
    )?;

    let car = Node::mesh(
        format!("{}/car", id),
        Geometry::Box {
            size: Size3::new(4.0, 5.0, 4.0),
        },
        Material::solid(Color::from_rgb_u32(ELEVATOR_COLOR)),
    )
    .with_position(0.0, elevator.height(), 0.0)
    .casting_shadow()
    .bound_to(actor_id, PartId::Car);

    Ok((Node::group(id).with_child(car), elevator))
}

fn environment() -> Scene {
    let mut scene = Scene::new(
        Color::from_rgb_u32(SKY_COLOR),
        Camera {
            position: Vec3::new(20.0, 30.0, 50.0),
            look_at: Vec3::zero(),
            fov: 75.0,
            near: 0.1,
            far: 1000.0,
            orbit_damping: true,
        },
    );
    scene.add_light(Light::Ambient {
        color: Color::WHITE,
        intensity: 0.7,
    });
    scene.add_light(Light::Directional {
        color: Color::WHITE,
        intensity: 1.0,
        position: Vec3::new(30.0, 40.0, 20.0),
        cast_shadow: true,
    });
    scene.add_node(
        Node::mesh(
            "ground",
            Geometry::Plane {
                width: 300.0,
                height: 300.0,
            },
            Material::solid(Color::from_rgb_u32(GROUND_COLOR)),
        )
        .with_rotation(-FRAC_PI_2, 0.0, 0.0)
        .receiving_shadow(),
    );
    scene
}

/// Two platforms, a row of doors along the second one, and the elevator.
pub fn compose_diorama(config: &DioramaConfig) -> DioramaResult<Diorama> {
    let mut scene = environment();
    let mut actors = ActorRegistry::new();

    let platform_1_2 = build_platform("platform_1_2").with_position(0.0, 0.0, -6.0);
    let mut platform_3_4 = build_platform("platform_3_4").with_position(0.0, 0.0, 6.0);

    let motion = Motion::new(config.doors.duration, config.doors.easing);
    for i in 0..config.doors.count {
        let (node, door) =
            build_platform_screen_door(&format!("door-{}", i), config.doors.length, motion);
        let x = config.doors.first_x + i as f64 * config.doors.spacing;
        platform_3_4.add_child(node.with_position(x, DOOR_Y, DOOR_Z));
        actors.insert(door)?;
    }

    let (elevator_node, elevator) = build_elevator("elevator", &config.elevator)?;
    actors.insert(elevator)?;

    scene.add_node(platform_1_2);
    scene.add_node(platform_3_4);
    scene.add_node(elevator_node.with_position(40.0, 0.0, 0.0));

    debug!(
        "composed diorama: {} nodes, {} actors",
        scene.node_count(),
        actors.len()
    );
    Ok(Diorama { scene, actors })
}
