//! Actors: the moving parts of the diorama and their action vocabulary.
//!
//! Each actor kind exposes a typed capability trait ([`DoorControl`],
//! [`ElevatorControl`]). The [`Actor`] enum is the closed set the
//! choreographer dispatches [`Action`]s to.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::debug;

use diorama_core::{Axis, DioramaError, DioramaResult, Duration, Easing, Timestamp, Vec3};

use crate::tween::{FieldStore, TweenHandle, Tweener};

/// Unique identifier for an actor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorKind {
    Door,
    Elevator,
}

impl std::fmt::Display for ActorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActorKind::Door => write!(f, "door"),
            ActorKind::Elevator => write!(f, "elevator"),
        }
    }
}

/// A movable piece of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartId {
    LeftPanel,
    RightPanel,
    Car,
}

impl std::fmt::Display for PartId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PartId::LeftPanel => write!(f, "left_panel"),
            PartId::RightPanel => write!(f, "right_panel"),
            PartId::Car => write!(f, "car"),
        }
    }
}

/// One numeric position field: a part and an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FieldRef {
    pub part: PartId,
    pub axis: Axis,
}

impl FieldRef {
    pub fn new(part: PartId, axis: Axis) -> Self {
        Self { part, axis }
    }
}

/// Local positions of an actor's parts, relative to the actor's own origin.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PositionState {
    parts: BTreeMap<PartId, Vec3>,
}

impl PositionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_part(mut self, part: PartId, position: Vec3) -> Self {
        self.parts.insert(part, position);
        self
    }

    pub fn get(&self, part: PartId) -> Option<Vec3> {
        self.parts.get(&part).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PartId, Vec3)> + '_ {
        self.parts.iter().map(|(part, pos)| (*part, *pos))
    }

    pub fn has_part(&self, part: PartId) -> bool {
        self.parts.contains_key(&part)
    }
}

impl FieldStore<FieldRef> for PositionState {
    fn read(&self, key: FieldRef) -> f64 {
        self.parts
            .get(&key.part)
            .map(|pos| pos.get(key.axis))
            .unwrap_or(0.0)
    }

    fn write(&mut self, key: FieldRef, value: f64) {
        if let Some(pos) = self.parts.get_mut(&key.part) {
            pos.set(key.axis, value);
        }
    }
}

/// An instruction the choreographer can send to an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Open,
    Close,
    GoToFloor(u8),
}

impl Action {
    /// Action name without arguments, used for counting.
    pub fn name(&self) -> &'static str {
        match self {
            Action::Open => "open",
            Action::Close => "close",
            Action::GoToFloor(_) => "go_to_floor",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::GoToFloor(floor) => write!(f, "go_to_floor({})", floor),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// How long a motion takes and how it is shaped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    pub duration: Duration,
    pub easing: Easing,
}

impl Motion {
    pub fn new(duration: Duration, easing: Easing) -> Self {
        Self { duration, easing }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActionRecord {
    pub at: Timestamp,
    pub action: Action,
}

const ACTION_LOG_CAPACITY: usize = 32;

/// Accepted actions: lifetime counters plus the most recent entries.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ActionLog {
    counts: BTreeMap<&'static str, u64>,
    recent: VecDeque<ActionRecord>,
}

impl ActionLog {
    fn record(&mut self, action: Action, at: Timestamp) {
        *self.counts.entry(action.name()).or_insert(0) += 1;
        if self.recent.len() == ACTION_LOG_CAPACITY {
            self.recent.pop_front();
        }
        self.recent.push_back(ActionRecord { at, action });
    }

    /// How many times an action with this name was accepted.
    pub fn count(&self, name: &str) -> u64 {
        self.counts.get(name).copied().unwrap_or(0)
    }

    /// Per-action counters, ordered by action name.
    pub fn counts(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        self.counts.iter().map(|(name, n)| (*name, *n))
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Most recent accepted actions, oldest first.
    pub fn recent(&self) -> impl Iterator<Item = &ActionRecord> + '_ {
        self.recent.iter()
    }

    pub fn last(&self) -> Option<&ActionRecord> {
        self.recent.back()
    }
}

/// Position state, its in-flight tweens, and the action log.
#[derive(Debug, Clone)]
struct Body {
    position: PositionState,
    tweens: Tweener<FieldRef>,
    log: ActionLog,
}

impl Body {
    fn new(position: PositionState) -> Self {
        Self {
            position,
            tweens: Tweener::new(),
            log: ActionLog::default(),
        }
    }

    fn move_field(
        &mut self,
        field: FieldRef,
        to: f64,
        motion: Motion,
        now: Timestamp,
    ) -> DioramaResult<TweenHandle<FieldRef>> {
        self.tweens.animate(
            &mut self.position,
            field,
            to,
            motion.duration,
            motion.easing,
            now,
        )
    }

    fn tick(&mut self, now: Timestamp) -> usize {
        self.tweens.tick(&mut self.position, now)
    }
}

/// Door capabilities.
pub trait DoorControl {
    /// Slide both leaves to their open offsets.
    fn open(&mut self, now: Timestamp) -> DioramaResult<()>;
    /// Slide both leaves back to their closed offsets.
    fn close(&mut self, now: Timestamp) -> DioramaResult<()>;
}

/// Elevator capabilities.
pub trait ElevatorControl {
    /// Send the car to a floor. Unknown floors are rejected without moving.
    fn go_to_floor(&mut self, floor: u8, now: Timestamp) -> DioramaResult<()>;
}

/// Coarse door state derived from panel positions and in-flight tweens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorState {
    Closed,
    Opening,
    Open,
    Closing,
    /// Stopped somewhere between the two rest positions.
    Ajar,
}

impl std::fmt::Display for DoorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DoorState::Closed => write!(f, "closed"),
            DoorState::Opening => write!(f, "opening"),
            DoorState::Open => write!(f, "open"),
            DoorState::Closing => write!(f, "closing"),
            DoorState::Ajar => write!(f, "ajar"),
        }
    }
}

/// A platform-screen door with two mirrored sliding leaves.
#[derive(Debug, Clone)]
pub struct PlatformScreenDoor {
    id: ActorId,
    length: f64,
    motion: Motion,
    body: Body,
}

impl PlatformScreenDoor {
    /// A closed door whose leaves together span `length`.
    pub fn new(id: ActorId, length: f64, motion: Motion) -> Self {
        let closed = length / 4.0;
        let position = PositionState::new()
            .with_part(PartId::LeftPanel, Vec3::new(-closed, 0.0, 0.0))
            .with_part(PartId::RightPanel, Vec3::new(closed, 0.0, 0.0));
        Self {
            id,
            length,
            motion,
            body: Body::new(position),
        }
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    /// Width of one leaf.
    pub fn leaf_width(&self) -> f64 {
        self.length / 2.0
    }

    /// |x| of each leaf when closed.
    pub fn closed_offset(&self) -> f64 {
        self.length / 4.0
    }

    /// |x| of each leaf when fully open.
    pub fn open_offset(&self) -> f64 {
        self.length * 0.75
    }

    pub fn left_x(&self) -> f64 {
        self.body.position.read(FieldRef::new(PartId::LeftPanel, Axis::X))
    }

    pub fn right_x(&self) -> f64 {
        self.body.position.read(FieldRef::new(PartId::RightPanel, Axis::X))
    }

    pub fn state(&self) -> DoorState {
        if let Some(tween) = self.body.tweens.get(FieldRef::new(PartId::RightPanel, Axis::X)) {
            return if tween.to == self.open_offset() {
                DoorState::Opening
            } else {
                DoorState::Closing
            };
        }
        let right = self.right_x();
        if right == self.closed_offset() {
            DoorState::Closed
        } else if right == self.open_offset() {
            DoorState::Open
        } else {
            DoorState::Ajar
        }
    }

    fn slide_to(&mut self, offset: f64, now: Timestamp) -> DioramaResult<()> {
        let motion = self.motion;
        self.body
            .move_field(FieldRef::new(PartId::LeftPanel, Axis::X), -offset, motion, now)?;
        self.body
            .move_field(FieldRef::new(PartId::RightPanel, Axis::X), offset, motion, now)?;
        Ok(())
    }
}

impl DoorControl for PlatformScreenDoor {
    fn open(&mut self, now: Timestamp) -> DioramaResult<()> {
        debug!("{} opening at {}", self.id, now);
        self.slide_to(self.open_offset(), now)?;
        self.body.log.record(Action::Open, now);
        Ok(())
    }

    fn close(&mut self, now: Timestamp) -> DioramaResult<()> {
        debug!("{} closing at {}", self.id, now);
        self.slide_to(self.closed_offset(), now)?;
        self.body.log.record(Action::Close, now);
        Ok(())
    }
}

/// An elevator car travelling between a fixed set of floor heights.
#[derive(Debug, Clone)]
pub struct Elevator {
    id: ActorId,
    floors: BTreeMap<u8, f64>,
    motion: Motion,
    target_floor: u8,
    body: Body,
}

impl Elevator {
    /// An elevator parked at `initial_floor`, which must be one of `floors`.
    pub fn new(
        id: ActorId,
        floors: impl IntoIterator<Item = (u8, f64)>,
        initial_floor: u8,
        motion: Motion,
    ) -> DioramaResult<Self> {
        let floors: BTreeMap<u8, f64> = floors.into_iter().collect();
        let height = *floors
            .get(&initial_floor)
            .ok_or_else(|| DioramaError::invalid_floor(id.as_str(), initial_floor))?;
        let position = PositionState::new().with_part(PartId::Car, Vec3::new(0.0, height, 0.0));
        Ok(Self {
            id,
            floors,
            motion,
            target_floor: initial_floor,
            body: Body::new(position),
        })
    }

    pub fn floor_height(&self, floor: u8) -> Option<f64> {
        self.floors.get(&floor).copied()
    }

    pub fn floors(&self) -> impl Iterator<Item = (u8, f64)> + '_ {
        self.floors.iter().map(|(n, h)| (*n, *h))
    }

    /// Current height of the car.
    pub fn height(&self) -> f64 {
        self.body.position.read(FieldRef::new(PartId::Car, Axis::Y))
    }

    /// The floor most recently requested.
    pub fn target_floor(&self) -> u8 {
        self.target_floor
    }

    /// The floor the car is parked at, if it is at rest on one.
    pub fn current_floor(&self) -> Option<u8> {
        if !self.body.tweens.is_empty() {
            return None;
        }
        let height = self.height();
        self.floors
            .iter()
            .find(|(_, h)| **h == height)
            .map(|(n, _)| *n)
    }
}

impl ElevatorControl for Elevator {
    fn go_to_floor(&mut self, floor: u8, now: Timestamp) -> DioramaResult<()> {
        let height = self
            .floor_height(floor)
            .ok_or_else(|| DioramaError::invalid_floor(self.id.as_str(), floor))?;
        debug!("{} heading to floor {} (y = {}) at {}", self.id, floor, height, now);
        self.body
            .move_field(FieldRef::new(PartId::Car, Axis::Y), height, self.motion, now)?;
        self.target_floor = floor;
        self.body.log.record(Action::GoToFloor(floor), now);
        Ok(())
    }
}

/// The closed set of actor kinds.
#[derive(Debug, Clone)]
pub enum Actor {
    Door(PlatformScreenDoor),
    Elevator(Elevator),
}

impl Actor {
    pub fn id(&self) -> &ActorId {
        match self {
            Actor::Door(door) => &door.id,
            Actor::Elevator(elevator) => &elevator.id,
        }
    }

    pub fn kind(&self) -> ActorKind {
        match self {
            Actor::Door(_) => ActorKind::Door,
            Actor::Elevator(_) => ActorKind::Elevator,
        }
    }

    fn body(&self) -> &Body {
        match self {
            Actor::Door(door) => &door.body,
            Actor::Elevator(elevator) => &elevator.body,
        }
    }

    fn body_mut(&mut self) -> &mut Body {
        match self {
            Actor::Door(door) => &mut door.body,
            Actor::Elevator(elevator) => &mut elevator.body,
        }
    }

    pub fn position(&self) -> &PositionState {
        &self.body().position
    }

    pub fn log(&self) -> &ActionLog {
        &self.body().log
    }

    pub fn active_tweens(&self) -> Vec<TweenHandle<FieldRef>> {
        self.body().tweens.active_handles()
    }

    pub fn is_moving(&self) -> bool {
        !self.body().tweens.is_empty()
    }

    /// Check that `action` would be accepted, without performing it.
    pub fn check(&self, action: &Action) -> DioramaResult<()> {
        match (self, action) {
            (Actor::Door(_), Action::Open | Action::Close) => Ok(()),
            (Actor::Elevator(elevator), Action::GoToFloor(floor)) => elevator
                .floor_height(*floor)
                .map(|_| ())
                .ok_or_else(|| DioramaError::invalid_floor(self.id().as_str(), *floor)),
            _ => Err(DioramaError::unsupported(
                self.id().as_str(),
                action.to_string(),
            )),
        }
    }

    /// Dispatch an action. Rejected actions leave the actor untouched.
    pub fn perform(&mut self, action: &Action, now: Timestamp) -> DioramaResult<()> {
        match (self, action) {
            (Actor::Door(door), Action::Open) => door.open(now),
            (Actor::Door(door), Action::Close) => door.close(now),
            (Actor::Elevator(elevator), Action::GoToFloor(floor)) => {
                elevator.go_to_floor(*floor, now)
            }
            (actor, action) => Err(DioramaError::unsupported(
                actor.id().as_str(),
                action.to_string(),
            )),
        }
    }

    /// Advance in-flight tweens to `now`. Returns how many remain.
    pub fn tick(&mut self, now: Timestamp) -> usize {
        self.body_mut().tick(now)
    }

    pub fn as_door(&self) -> Option<&PlatformScreenDoor> {
        match self {
            Actor::Door(door) => Some(door),
            _ => None,
        }
    }

    pub fn as_elevator(&self) -> Option<&Elevator> {
        match self {
            Actor::Elevator(elevator) => Some(elevator),
            _ => None,
        }
    }
}

impl From<PlatformScreenDoor> for Actor {
    fn from(door: PlatformScreenDoor) -> Self {
        Actor::Door(door)
    }
}

impl From<Elevator> for Actor {
    fn from(elevator: Elevator) -> Self {
        Actor::Elevator(elevator)
    }
}
