//! # diorama-scene
//!
//! The platform diorama as a backend-neutral scene graph: platforms, doors
//! and the elevator, with the moving meshes bound to choreographed actors.
//! [`Stage`] ties the scene to the choreography engine for a render loop.

pub mod composer;
pub mod node;
pub mod scene;
pub mod stage;
pub mod validate;

pub use composer::{
    build_elevator, build_platform, build_platform_screen_door, compose_diorama, Diorama,
};
pub use node::{ActorBinding, Geometry, Material, Node, NodeContent, NodeId, Texture, Transform3D};
pub use scene::{Camera, Light, Scene};
pub use stage::{ActorSnapshot, FrameSnapshot, ScheduleSnapshot, Stage};
pub use validate::validate_scene;
