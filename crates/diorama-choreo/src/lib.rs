//! # diorama-choreo
//!
//! The choreography engine: tweens that move numeric fields over time,
//! the door and elevator actors built on them, virtual-time timers, and
//! periodic schedules that cue actors on a fixed cycle.

pub mod actor;
pub mod choreographer;
pub mod registry;
pub mod schedule;
pub mod timer;
pub mod tween;

pub use actor::{
    Action, ActionLog, ActionRecord, Actor, ActorId, ActorKind, DoorControl, DoorState, Elevator,
    ElevatorControl, FieldRef, Motion, PartId, PlatformScreenDoor, PositionState,
};
pub use choreographer::{Choreographer, CueReport};
pub use registry::ActorRegistry;
pub use schedule::{Cue, CueTarget, Schedule, ScheduleState, Step, IDLE_PHASE};
pub use timer::{Fired, TimerId, TimerQueue};
pub use tween::{FieldStore, Tween, TweenHandle, Tweener};
