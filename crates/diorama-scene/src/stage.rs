//! The stage: scene, actors and choreographer driven together, one frame at a time.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};

use diorama_choreo::{ActorKind, ActorRegistry, Choreographer, CueReport, DoorState, ScheduleState};
use diorama_core::{DioramaConfig, DioramaError, DioramaResult, Timestamp, Vec3};

use crate::composer::compose_diorama;
use crate::scene::Scene;
use crate::validate::validate_scene;

/// Serializable view of one actor at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActorSnapshot {
    pub id: String,
    pub kind: ActorKind,
    pub parts: BTreeMap<String, Vec3>,
    pub moving: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub door_state: Option<DoorState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor: Option<u8>,
    pub actions: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleSnapshot {
    pub name: String,
    #[serde(flatten)]
    pub state: ScheduleState,
}

/// Everything a renderer or test needs to know about one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSnapshot {
    pub time: Timestamp,
    pub frame: u64,
    pub actors: Vec<ActorSnapshot>,
    pub schedules: Vec<ScheduleSnapshot>,
}

impl FrameSnapshot {
    pub fn actor(&self, id: &str) -> Option<&ActorSnapshot> {
        self.actors.iter().find(|a| a.id == id)
    }
}

/// Scene, actors and choreographer, composed and validated together.
#[derive(Debug, Clone)]
pub struct Stage {
    scene: Scene,
    actors: ActorRegistry,
    choreographer: Choreographer,
    frames: u64,
}

impl Stage {
    /// Compose the diorama for `config` and check that every scheduled cue
    /// is accepted by the actors it targets.
    pub fn new(config: &DioramaConfig) -> DioramaResult<Self> {
        config.validate()?;
        let diorama = compose_diorama(config)?;
        validate_scene(&diorama.scene, &diorama.actors).map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            DioramaError::SceneValidation(messages.join("; "))
        })?;

        let choreographer = Choreographer::from_config(config)?;
        choreographer.validate(&diorama.actors)?;

        info!(
            "stage ready: {} nodes, {} actors, {} schedules",
            diorama.scene.node_count(),
            diorama.actors.len(),
            choreographer.schedules().count()
        );
        Ok(Self {
            scene: diorama.scene,
            actors: diorama.actors,
            choreographer,
            frames: 0,
        })
    }

    pub fn start(&mut self, now: Timestamp) -> DioramaResult<()> {
        self.choreographer.start(now)
    }

    pub fn stop(&mut self) {
        self.choreographer.stop();
    }

    /// Render-loop step: fire due cues, advance tweens, then copy actor
    /// positions into their bound scene nodes.
    pub fn frame(&mut self, now: Timestamp) -> DioramaResult<Vec<CueReport>> {
        let cues = self.choreographer.advance(now, &mut self.actors)?;
        self.actors.tick(now);
        let synced = self.scene.sync_bindings(&self.actors);
        self.frames += 1;
        if !cues.is_empty() {
            debug!("frame {} at {}: {} cues, {} nodes synced", self.frames, now, cues.len(), synced);
        }
        Ok(cues)
    }

    pub fn snapshot(&self, now: Timestamp) -> FrameSnapshot {
        let actors = self
            .actors
            .iter()
            .map(|actor| ActorSnapshot {
                id: actor.id().to_string(),
                kind: actor.kind(),
                parts: actor
                    .position()
                    .iter()
                    .map(|(part, pos)| (part.to_string(), pos))
                    .collect(),
                moving: actor.is_moving(),
                door_state: actor.as_door().map(|d| d.state()),
                floor: actor.as_elevator().and_then(|e| e.current_floor()),
                actions: actor
                    .log()
                    .counts()
                    .map(|(name, n)| (name.to_string(), n))
                    .collect(),
            })
            .collect();
        let schedules = self
            .choreographer
            .schedules()
            .map(|s| ScheduleSnapshot {
                name: s.name().to_string(),
                state: s.state().clone(),
            })
            .collect();
        FrameSnapshot {
            time: now,
            frame: self.frames,
            actors,
            schedules,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn actors(&self) -> &ActorRegistry {
        &self.actors
    }

    pub fn choreographer(&self) -> &Choreographer {
        &self.choreographer
    }

    pub fn choreographer_mut(&mut self) -> &mut Choreographer {
        &mut self.choreographer
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: f64) -> Timestamp {
        Timestamp::from_seconds(s)
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = DioramaConfig::default();
        config.doors.count = 0;
        assert!(Stage::new(&config).is_err());
    }

    #[test]
    fn test_new_checks_floors_up_front() {
        let mut config = DioramaConfig::default();
        config.elevator.upper_floor = 7;
        assert!(Stage::new(&config).is_err());
    }

    #[test]
    fn test_frame_moves_bound_nodes() {
        let mut stage = Stage::new(&DioramaConfig::default()).unwrap();
        stage.start(at(0.0)).unwrap();
        let cues = stage.frame(at(0.0)).unwrap();
        assert_eq!(cues.len(), 1);

        stage.frame(at(3.0)).unwrap();
        stage.frame(at(5.0)).unwrap();
        let right = stage.scene().find("door-2/right").unwrap();
        assert_eq!(right.transform.position.x, 3.75);
        assert_eq!(stage.frames(), 3);
    }

    #[test]
    fn test_snapshot_reports_state() {
        let mut stage = Stage::new(&DioramaConfig::default()).unwrap();
        stage.start(at(0.0)).unwrap();
        stage.frame(at(4.0)).unwrap();
        let snapshot = stage.snapshot(at(4.0));

        assert_eq!(snapshot.actors.len(), 6);
        let door = snapshot.actor("door-0").unwrap();
        assert_eq!(door.door_state, Some(DoorState::Opening));
        assert_eq!(door.actions.get("open"), Some(&1));
        assert!(door.moving);

        let elevator = snapshot.actor("elevator").unwrap();
        // The 3 s ride up finished at 3.0.
        assert_eq!(elevator.floor, Some(2));
        assert!(!elevator.moving);
        assert_eq!(elevator.actions.get("go_to_floor"), Some(&1));

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["schedules"][0]["name"], "doors");
        assert_eq!(json["schedules"][0]["state"], "running");
        assert_eq!(json["schedules"][0]["phase"], "opening_triggered");
        assert!(json["actors"][0]["parts"]["left_panel"]["x"].is_number());
    }
}
