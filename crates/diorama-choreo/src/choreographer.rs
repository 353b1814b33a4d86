//! Drives schedules in virtual time and dispatches their cues to actors.

use serde::Serialize;
use tracing::{error, info, warn};

use diorama_core::{DioramaConfig, DioramaError, DioramaResult, Timestamp};

use crate::actor::{Action, ActorId};
use crate::registry::ActorRegistry;
use crate::schedule::{CueTarget, Schedule};
use crate::timer::{TimerId, TimerQueue};

#[derive(Debug, Clone, Copy, PartialEq)]
enum TimerEvent {
    CycleStart { schedule: usize },
    Step { schedule: usize, cycle: u64, step: usize },
}

#[derive(Debug, Clone)]
struct Slot {
    schedule: Schedule,
    cycle_timer: Option<TimerId>,
    step_timers: Vec<TimerId>,
    cycles: u64,
}

/// One cue that was dispatched during [`Choreographer::advance`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CueReport {
    pub schedule: String,
    pub cycle: u64,
    pub phase: String,
    /// When the cue was due. Tweens it started begin at this time.
    pub at: Timestamp,
    pub action: Action,
    pub actors: Vec<ActorId>,
}

/// Owns the schedules and their pending timers.
///
/// The choreographer never reads a clock: the caller passes the current
/// time to [`advance`](Self::advance), which fires every cue due up to then
/// in due-time order.
#[derive(Debug, Clone, Default)]
pub struct Choreographer {
    slots: Vec<Slot>,
    timers: TimerQueue<TimerEvent>,
}

impl Choreographer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The door and elevator cycles described by `config`.
    pub fn from_config(config: &DioramaConfig) -> DioramaResult<Self> {
        let mut choreographer = Self::new();
        choreographer.add_schedule(Schedule::door_cycle(&config.doors)?)?;
        choreographer.add_schedule(Schedule::elevator_cycle(&config.elevator)?)?;
        Ok(choreographer)
    }

    /// Register a schedule. Names must be unique.
    pub fn add_schedule(&mut self, schedule: Schedule) -> DioramaResult<()> {
        schedule.validate()?;
        if self.index_of(schedule.name()).is_some() {
            return Err(DioramaError::Config(format!(
                "duplicate schedule '{}'",
                schedule.name()
            )));
        }
        self.slots.push(Slot {
            schedule,
            cycle_timer: None,
            step_timers: Vec::new(),
            cycles: 0,
        });
        Ok(())
    }

    pub fn schedule(&self, name: &str) -> Option<&Schedule> {
        self.index_of(name).map(|i| &self.slots[i].schedule)
    }

    pub fn schedules(&self) -> impl Iterator<Item = &Schedule> + '_ {
        self.slots.iter().map(|slot| &slot.schedule)
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.schedule.name() == name)
    }

    fn require(&self, name: &str) -> DioramaResult<usize> {
        self.index_of(name)
            .ok_or_else(|| DioramaError::UnknownSchedule(name.to_string()))
    }

    /// Check every cue against the registered actors without dispatching.
    pub fn validate(&self, registry: &ActorRegistry) -> DioramaResult<()> {
        for slot in &self.slots {
            for step in slot.schedule.steps() {
                let targets = resolve(&step.cue.target, registry);
                if targets.is_empty() {
                    warn!(
                        "schedule '{}' step '{}' targets {} but no such actor is registered",
                        slot.schedule.name(),
                        step.phase,
                        step.cue.target
                    );
                }
                for id in &targets {
                    let actor = registry
                        .get(id.as_str())
                        .ok_or_else(|| DioramaError::UnknownActor(id.to_string()))?;
                    actor.check(&step.cue.action)?;
                }
            }
        }
        Ok(())
    }

    /// Start every schedule that is not already running.
    pub fn start(&mut self, now: Timestamp) -> DioramaResult<()> {
        for index in 0..self.slots.len() {
            self.start_slot(index, now)?;
        }
        Ok(())
    }

    /// Stop every schedule. Tweens already in flight keep running.
    pub fn stop(&mut self) {
        for index in 0..self.slots.len() {
            self.stop_slot(index);
        }
    }

    pub fn start_schedule(&mut self, name: &str, now: Timestamp) -> DioramaResult<()> {
        let index = self.require(name)?;
        self.start_slot(index, now)
    }

    /// Stop one schedule and drop its pending steps.
    pub fn stop_schedule(&mut self, name: &str) -> DioramaResult<()> {
        let index = self.require(name)?;
        self.stop_slot(index);
        Ok(())
    }

    fn start_slot(&mut self, index: usize, now: Timestamp) -> DioramaResult<()> {
        let slot = &mut self.slots[index];
        if slot.schedule.is_running() {
            return Ok(());
        }
        let first = now + slot.schedule.initial_delay();
        let id = self.timers.schedule_every(
            first,
            slot.schedule.period(),
            TimerEvent::CycleStart { schedule: index },
        )?;
        slot.cycle_timer = Some(id);
        slot.cycles = 0;
        slot.schedule.mark_started();
        info!(
            "schedule '{}' started, first cycle at {}",
            slot.schedule.name(),
            first
        );
        Ok(())
    }

    fn stop_slot(&mut self, index: usize) {
        let slot = &mut self.slots[index];
        if let Some(id) = slot.cycle_timer.take() {
            self.timers.cancel(id);
        }
        for id in slot.step_timers.drain(..) {
            self.timers.cancel(id);
        }
        if slot.schedule.is_running() {
            info!("schedule '{}' stopped", slot.schedule.name());
        }
        slot.schedule.mark_stopped();
    }

    /// Fire every timer due at or before `now`, in due order.
    ///
    /// Each cue is dispatched with its own due time, so a late call produces
    /// the same actor state as a call made exactly on time. The first
    /// rejected cue aborts the call; timers not yet fired stay queued.
    pub fn advance(
        &mut self,
        now: Timestamp,
        registry: &mut ActorRegistry,
    ) -> DioramaResult<Vec<CueReport>> {
        let mut reports = Vec::new();
        while let Some(fired) = self.timers.pop_due(now) {
            match fired.event {
                TimerEvent::CycleStart { schedule } => {
                    let slot = &mut self.slots[schedule];
                    slot.cycles += 1;
                    let cycle = slot.cycles;
                    slot.schedule.begin_cycle(cycle);
                    slot.step_timers.retain(|id| self.timers.is_pending(*id));
                    for (step, def) in slot.schedule.steps().iter().enumerate() {
                        let id = self.timers.schedule_once(
                            fired.due + def.offset,
                            TimerEvent::Step {
                                schedule,
                                cycle,
                                step,
                            },
                        );
                        slot.step_timers.push(id);
                    }
                    info!(
                        "schedule '{}' cycle {} begins at {}",
                        slot.schedule.name(),
                        cycle,
                        fired.due
                    );
                }
                TimerEvent::Step {
                    schedule,
                    cycle,
                    step,
                } => {
                    let slot = &mut self.slots[schedule];
                    slot.step_timers.retain(|id| *id != fired.id);
                    let Some(def) = slot.schedule.steps().get(step).cloned() else {
                        continue;
                    };
                    slot.schedule.enter_phase(step);

                    let actors = resolve(&def.cue.target, registry);
                    for id in &actors {
                        let result = registry
                            .require_mut(id)
                            .and_then(|actor| actor.perform(&def.cue.action, fired.due));
                        if let Err(e) = result {
                            error!(
                                "schedule '{}' failed to send {} to {}: {}",
                                slot.schedule.name(),
                                def.cue.action,
                                id,
                                e
                            );
                            return Err(e);
                        }
                    }
                    info!(
                        "schedule '{}' cycle {} -> {}: {} x{} at {}",
                        slot.schedule.name(),
                        cycle,
                        def.phase,
                        def.cue.action,
                        actors.len(),
                        fired.due
                    );
                    reports.push(CueReport {
                        schedule: slot.schedule.name().to_string(),
                        cycle,
                        phase: def.phase,
                        at: fired.due,
                        action: def.cue.action,
                        actors,
                    });
                }
            }
        }
        Ok(reports)
    }

    /// When the next timer is due, if any schedule is running.
    pub fn next_due(&self) -> Option<Timestamp> {
        self.timers.next_due()
    }

    pub fn is_running(&self) -> bool {
        self.slots.iter().any(|slot| slot.schedule.is_running())
    }
}

fn resolve(target: &CueTarget, registry: &ActorRegistry) -> Vec<ActorId> {
    match target {
        CueTarget::Actor(id) => vec![id.clone()],
        CueTarget::AllOfKind(kind) => registry.ids_of_kind(*kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{ActorKind, Elevator, Motion, PlatformScreenDoor};
    use crate::schedule::{Cue, ScheduleState};
    use diorama_core::{Duration, Easing};

    fn at(s: f64) -> Timestamp {
        Timestamp::from_seconds(s)
    }

    fn secs(s: f64) -> Duration {
        Duration::from_seconds(s)
    }

    fn registry() -> ActorRegistry {
        let mut registry = ActorRegistry::new();
        let door_motion = Motion::new(secs(1.5), Easing::CubicInOut);
        for i in 0..2 {
            registry
                .insert(PlatformScreenDoor::new(
                    ActorId::new(format!("door-{}", i)),
                    5.0,
                    door_motion,
                ))
                .unwrap();
        }
        registry
            .insert(
                Elevator::new(
                    ActorId::new("elevator"),
                    [(1, 2.5), (2, 12.5)],
                    1,
                    Motion::new(secs(3.0), Easing::QuintInOut),
                )
                .unwrap(),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_from_config_validates_against_registry() {
        let choreographer = Choreographer::from_config(&DioramaConfig::default()).unwrap();
        assert_eq!(choreographer.schedules().count(), 2);
        choreographer.validate(&registry()).unwrap();
    }

    #[test]
    fn test_validate_rejects_unknown_floor() {
        let mut choreographer = Choreographer::new();
        choreographer
            .add_schedule(Schedule::new("bad", secs(10.0)).unwrap().with_step(
                secs(1.0),
                "up",
                Cue::new(CueTarget::AllOfKind(ActorKind::Elevator), Action::GoToFloor(3)),
            ))
            .unwrap();
        let err = choreographer.validate(&registry()).unwrap_err();
        assert!(matches!(err, DioramaError::InvalidFloor { floor: 3, .. }));
    }

    #[test]
    fn test_validate_rejects_unknown_actor() {
        let mut choreographer = Choreographer::new();
        choreographer
            .add_schedule(Schedule::new("ghost", secs(10.0)).unwrap().with_step(
                secs(1.0),
                "boo",
                Cue::new(CueTarget::Actor(ActorId::new("ghost")), Action::Open),
            ))
            .unwrap();
        assert!(matches!(
            choreographer.validate(&registry()),
            Err(DioramaError::UnknownActor(_))
        ));
    }

    #[test]
    fn test_duplicate_schedule_rejected() {
        let mut choreographer = Choreographer::from_config(&DioramaConfig::default()).unwrap();
        let dup = Schedule::door_cycle(&DioramaConfig::default().doors).unwrap();
        assert!(choreographer.add_schedule(dup).is_err());
    }

    #[test]
    fn test_first_cycle_fires_in_order() {
        let mut registry = registry();
        let mut choreographer = Choreographer::from_config(&DioramaConfig::default()).unwrap();
        choreographer.start(at(0.0)).unwrap();

        let reports = choreographer.advance(at(6.0), &mut registry).unwrap();
        let seen: Vec<(&str, Action, f64)> = reports
            .iter()
            .map(|r| (r.schedule.as_str(), r.action, r.at.as_seconds()))
            .collect();
        assert_eq!(
            seen,
            vec![
                ("elevator", Action::GoToFloor(2), 0.0),
                ("doors", Action::Open, 3.0),
                ("elevator", Action::GoToFloor(1), 5.0),
                ("doors", Action::Close, 6.0),
            ]
        );
        assert_eq!(reports[1].actors.len(), 2);
        assert_eq!(
            choreographer.schedule("doors").unwrap().phase(),
            Some("closing_triggered")
        );
    }

    #[test]
    fn test_late_advance_matches_on_time_dispatch() {
        let mut late = registry();
        let mut on_time = registry();
        let config = DioramaConfig::default();

        let mut a = Choreographer::from_config(&config).unwrap();
        let mut b = Choreographer::from_config(&config).unwrap();
        a.start(at(0.0)).unwrap();
        b.start(at(0.0)).unwrap();

        a.advance(at(4.0), &mut late).unwrap();
        for ms in (0..=4000).step_by(100) {
            b.advance(Timestamp::from_seconds(ms as f64 / 1000.0), &mut on_time)
                .unwrap();
        }
        late.tick(at(4.0));
        on_time.tick(at(4.0));
        for (x, y) in late.iter().zip(on_time.iter()) {
            assert_eq!(x.position(), y.position());
        }
    }

    #[test]
    fn test_stop_schedule_drops_pending_steps() {
        let mut registry = registry();
        let mut choreographer = Choreographer::from_config(&DioramaConfig::default()).unwrap();
        choreographer.start(at(0.0)).unwrap();
        choreographer.advance(at(4.0), &mut registry).unwrap();

        choreographer.stop_schedule("doors").unwrap();
        assert_eq!(
            choreographer.schedule("doors").unwrap().state(),
            &ScheduleState::Stopped
        );
        let reports = choreographer.advance(at(30.0), &mut registry).unwrap();
        assert!(reports.iter().all(|r| r.schedule == "elevator"));
        let door = registry.get("door-0").unwrap();
        assert_eq!(door.log().count("close"), 0);
        assert_eq!(door.log().count("open"), 1);
    }

    #[test]
    fn test_unknown_schedule() {
        let mut choreographer = Choreographer::new();
        assert!(matches!(
            choreographer.stop_schedule("nope"),
            Err(DioramaError::UnknownSchedule(_))
        ));
    }

    #[test]
    fn test_restart_is_idempotent_while_running() {
        let mut registry = registry();
        let mut choreographer = Choreographer::from_config(&DioramaConfig::default()).unwrap();
        choreographer.start(at(0.0)).unwrap();
        choreographer.start(at(1.0)).unwrap();
        choreographer.advance(at(9.0), &mut registry).unwrap();
        assert_eq!(registry.get("door-1").unwrap().log().count("open"), 1);
    }
}
