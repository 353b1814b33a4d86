//! # diorama-core
//!
//! Core types and primitives for the platform diorama.
//! This crate contains foundational types shared across all diorama crates:
//! durations and timestamps, easing curves, 3D vectors, colors, configuration,
//! and error types.

pub mod color;
pub mod config;
pub mod easing;
pub mod error;
pub mod math;
pub mod time;

pub use color::Color;
pub use config::{DioramaConfig, DoorConfig, ElevatorConfig, RenderConfig};
pub use easing::Easing;
pub use error::{DioramaError, DioramaResult};
pub use math::{Axis, Size3, Vec3};
pub use time::{Duration, Timestamp};
