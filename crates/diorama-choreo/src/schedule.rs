use serde::{Deserialize, Serialize};

use diorama_core::{DioramaError, DioramaResult, DoorConfig, Duration, ElevatorConfig};

use crate::actor::{Action, ActorId, ActorKind};

/// Phase a schedule sits in between the start of a cycle and its first step.
pub const IDLE_PHASE: &str = "idle";

/// Which actors a cue is sent to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CueTarget {
    Actor(ActorId),
    /// Every registered actor of this kind, in registration order.
    AllOfKind(ActorKind),
}

impl std::fmt::Display for CueTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CueTarget::Actor(id) => write!(f, "{}", id),
            CueTarget::AllOfKind(kind) => write!(f, "every {}", kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    pub target: CueTarget,
    pub action: Action,
}

impl Cue {
    pub fn new(target: CueTarget, action: Action) -> Self {
        Self { target, action }
    }
}

/// A cue fired `offset` after the start of every cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub offset: Duration,
    /// Phase the schedule enters when this step fires.
    pub phase: String,
    pub cue: Cue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ScheduleState {
    Stopped,
    Running {
        /// Number of cycles begun so far (0 while waiting on the initial delay).
        cycle: u64,
        phase: String,
    },
}

/// A periodic, ordered list of delayed cues.
#[derive(Debug, Clone)]
pub struct Schedule {
    name: String,
    period: Duration,
    initial_delay: Duration,
    steps: Vec<Step>,
    state: ScheduleState,
}

impl Schedule {
    /// Create an empty schedule. The period must be positive and finite.
    pub fn new(name: impl Into<String>, period: Duration) -> DioramaResult<Self> {
        let name = name.into();
        if period.is_zero() || !period.as_seconds().is_finite() {
            return Err(DioramaError::Config(format!(
                "schedule '{}' needs a positive period",
                name
            )));
        }
        Ok(Self {
            name,
            period,
            initial_delay: Duration::zero(),
            steps: Vec::new(),
            state: ScheduleState::Stopped,
        })
    }

    /// Delay between `start` and the first cycle.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Add a step. Steps are kept sorted by offset; equal offsets keep
    /// insertion order.
    pub fn with_step(mut self, offset: Duration, phase: impl Into<String>, cue: Cue) -> Self {
        self.steps.push(Step {
            offset,
            phase: phase.into(),
            cue,
        });
        self.steps
            .sort_by(|a, b| a.offset.as_seconds().total_cmp(&b.offset.as_seconds()));
        self
    }

    /// Doors: open every door at `open_at`, close every door at `close_at`.
    pub fn door_cycle(config: &DoorConfig) -> DioramaResult<Self> {
        let doors = CueTarget::AllOfKind(ActorKind::Door);
        Ok(Schedule::new("doors", config.period)?
            .with_initial_delay(config.initial_delay)
            .with_step(
                config.open_at,
                "opening_triggered",
                Cue::new(doors.clone(), Action::Open),
            )
            .with_step(
                config.close_at,
                "closing_triggered",
                Cue::new(doors, Action::Close),
            ))
    }

    /// Elevator: go up at `up_at`, come back down at `down_at`.
    pub fn elevator_cycle(config: &ElevatorConfig) -> DioramaResult<Self> {
        let elevators = CueTarget::AllOfKind(ActorKind::Elevator);
        Ok(Schedule::new("elevator", config.period)?
            .with_initial_delay(config.initial_delay)
            .with_step(
                config.up_at,
                "up_triggered",
                Cue::new(elevators.clone(), Action::GoToFloor(config.upper_floor)),
            )
            .with_step(
                config.down_at,
                "down_triggered",
                Cue::new(elevators, Action::GoToFloor(config.ground_floor)),
            ))
    }

    /// Offsets and the initial delay must be finite.
    pub fn validate(&self) -> DioramaResult<()> {
        if !self.initial_delay.as_seconds().is_finite() {
            return Err(DioramaError::Config(format!(
                "schedule '{}' has a non-finite initial delay",
                self.name
            )));
        }
        if let Some(step) = self
            .steps
            .iter()
            .find(|step| !step.offset.as_seconds().is_finite())
        {
            return Err(DioramaError::Config(format!(
                "schedule '{}' step '{}' has a non-finite offset",
                self.name, step.phase
            )));
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn state(&self) -> &ScheduleState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, ScheduleState::Running { .. })
    }

    /// Current phase name, `None` when stopped.
    pub fn phase(&self) -> Option<&str> {
        match &self.state {
            ScheduleState::Running { phase, .. } => Some(phase),
            ScheduleState::Stopped => None,
        }
    }

    pub(crate) fn mark_started(&mut self) {
        self.state = ScheduleState::Running {
            cycle: 0,
            phase: IDLE_PHASE.to_string(),
        };
    }

    pub(crate) fn mark_stopped(&mut self) {
        self.state = ScheduleState::Stopped;
    }

    pub(crate) fn begin_cycle(&mut self, cycle: u64) {
        self.state = ScheduleState::Running {
            cycle,
            phase: IDLE_PHASE.to_string(),
        };
    }

    pub(crate) fn enter_phase(&mut self, step: usize) {
        if let (ScheduleState::Running { phase, .. }, Some(step)) =
            (&mut self.state, self.steps.get(step))
        {
            *phase = step.phase.clone();
        }
    }
}
