use diorama_choreo::{ActorKind, DoorState, ScheduleState};
use diorama_core::{DioramaConfig, Timestamp};
use diorama_scene::{compose_diorama, validate_scene, NodeContent, Stage};

fn run(stage: &mut Stage, from: f64, to: f64, fps: f64) {
    let first = (from * fps).round() as u64;
    let last = (to * fps).round() as u64;
    for frame in first..=last {
        stage
            .frame(Timestamp::from_seconds(frame as f64 / fps))
            .expect("frame");
    }
}

#[test]
fn test_every_moving_mesh_is_bound() {
    let diorama = compose_diorama(&DioramaConfig::default()).unwrap();
    validate_scene(&diorama.scene, &diorama.actors).unwrap();

    let bound = diorama.scene.bound_nodes();
    // Two leaves per door plus the elevator car.
    assert_eq!(bound.len(), 5 * 2 + 1);
    for node in bound {
        assert!(matches!(node.content, NodeContent::Mesh { .. }), "{}", node.id);
    }
    for actor in diorama.actors.iter() {
        let id = actor.id().as_str();
        assert!(
            diorama.scene.find(id).is_some(),
            "actor {} has no group node",
            id
        );
    }
}

#[test]
fn test_thirty_seconds_on_stage() {
    let mut stage = Stage::new(&DioramaConfig::default()).unwrap();
    stage.start(Timestamp::zero()).unwrap();
    run(&mut stage, 0.0, 30.0, 60.0);

    let snapshot = stage.snapshot(Timestamp::from_seconds(30.0));
    for actor in snapshot.actors.iter().filter(|a| a.kind == ActorKind::Door) {
        assert_eq!(actor.actions.get("open"), Some(&3), "{}", actor.id);
        assert_eq!(actor.actions.get("close"), Some(&3), "{}", actor.id);
        assert_eq!(actor.door_state, Some(DoorState::Closed));
    }
    assert_eq!(stage.frames(), 1801);
}

#[test]
fn test_scene_nodes_follow_actors() {
    let mut stage = Stage::new(&DioramaConfig::default()).unwrap();
    stage.start(Timestamp::zero()).unwrap();
    run(&mut stage, 0.0, 4.5, 30.0);

    for i in 0..5 {
        let left = stage.scene().find(&format!("door-{}/left", i)).unwrap();
        let right = stage.scene().find(&format!("door-{}/right", i)).unwrap();
        assert_eq!(left.transform.position.x, -3.75);
        assert_eq!(right.transform.position.x, 3.75);
    }
    let car = stage.scene().world_position("elevator/car").unwrap();
    assert_eq!(car.y, 12.5);

    run(&mut stage, 4.5, 8.0, 30.0);
    let car = stage.scene().find("elevator/car").unwrap();
    assert_eq!(car.transform.position.y, 2.5);
}

#[test]
fn test_stopped_stage_keeps_finishing_tweens() {
    let mut stage = Stage::new(&DioramaConfig::default()).unwrap();
    stage.start(Timestamp::zero()).unwrap();
    run(&mut stage, 0.0, 3.5, 60.0);
    stage.stop();
    run(&mut stage, 3.5, 20.0, 60.0);

    let snapshot = stage.snapshot(Timestamp::from_seconds(20.0));
    let door = snapshot.actor("door-1").unwrap();
    assert_eq!(door.door_state, Some(DoorState::Open));
    assert_eq!(door.actions.get("close"), None);
    assert!(snapshot
        .schedules
        .iter()
        .all(|s| s.state == ScheduleState::Stopped));
}

#[test]
fn test_scene_json_is_well_formed() {
    let stage = Stage::new(&DioramaConfig::default()).unwrap();
    let json = serde_json::to_value(stage.scene()).unwrap();
    assert_eq!(json["camera"]["fov"], 75.0);
    assert_eq!(json["lights"][0]["type"], "ambient");
    assert_eq!(json["lights"][1]["type"], "directional");
    assert_eq!(json["nodes"].as_array().unwrap().len(), 4);
}
