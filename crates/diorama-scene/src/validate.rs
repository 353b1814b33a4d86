use std::collections::HashSet;

use diorama_choreo::ActorRegistry;
use diorama_core::DioramaError;

use crate::node::{Geometry, NodeContent};
use crate::scene::Scene;

/// Validate a composed scene against the actors its nodes are bound to.
pub fn validate_scene(scene: &Scene, actors: &ActorRegistry) -> Result<(), Vec<DioramaError>> {
    let mut errors = Vec::new();

    if scene.camera.near <= 0.0 || scene.camera.far <= scene.camera.near {
        errors.push(DioramaError::SceneValidation(format!(
            "camera clip range {}..{} is empty",
            scene.camera.near, scene.camera.far
        )));
    }

    let mut node_ids = HashSet::new();
    let mut bound_parts = HashSet::new();
    for node in scene.all_nodes() {
        if !node_ids.insert(&node.id) {
            errors.push(DioramaError::SceneValidation(format!(
                "duplicate node id '{}'",
                node.id
            )));
        }

        if !node.transform.position.is_finite() || !node.transform.rotation.is_finite() {
            errors.push(DioramaError::SceneValidation(format!(
                "node '{}' has a non-finite transform",
                node.id
            )));
        }

        if let NodeContent::Mesh { geometry, material } = &node.content {
            let degenerate = match geometry {
                Geometry::Box { size } => {
                    size.width <= 0.0 || size.height <= 0.0 || size.depth <= 0.0
                }
                Geometry::Plane { width, height } => *width <= 0.0 || *height <= 0.0,
            };
            if degenerate {
                errors.push(DioramaError::SceneValidation(format!(
                    "mesh '{}' has an empty geometry",
                    node.id
                )));
            }
            if !(0.0..=1.0).contains(&material.opacity) {
                errors.push(DioramaError::SceneValidation(format!(
                    "mesh '{}' opacity {} is outside [0, 1]",
                    node.id, material.opacity
                )));
            }
        }

        if let Some(binding) = &node.binding {
            match actors.get(binding.actor.as_str()) {
                None => errors.push(DioramaError::SceneValidation(format!(
                    "node '{}' is bound to unknown actor '{}'",
                    node.id, binding.actor
                ))),
                Some(actor) if !actor.position().has_part(binding.part) => {
                    errors.push(DioramaError::SceneValidation(format!(
                        "node '{}' is bound to '{}' part {}, which it does not have",
                        node.id, binding.actor, binding.part
                    )))
                }
                Some(_) => {
                    if !bound_parts.insert((binding.actor.clone(), binding.part)) {
                        errors.push(DioramaError::SceneValidation(format!(
                            "{} part {} is bound to more than one node",
                            binding.actor, binding.part
                        )));
                    }
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
