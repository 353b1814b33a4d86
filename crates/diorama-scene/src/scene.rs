use serde::{Deserialize, Serialize};

use diorama_choreo::ActorRegistry;
use diorama_core::{Color, DioramaResult, Vec3};

use crate::node::Node;

/// Perspective camera looking at a fixed target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub position: Vec3,
    pub look_at: Vec3,
    /// Vertical field of view in degrees.
    pub fov: f64,
    pub near: f64,
    pub far: f64,
    /// Orbit controls with inertia.
    pub orbit_damping: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Light {
    Ambient {
        color: Color,
        intensity: f64,
    },
    Directional {
        color: Color,
        intensity: f64,
        position: Vec3,
        cast_shadow: bool,
    },
}

/// The static scene: environment plus a forest of nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub background: Color,
    pub camera: Camera,
    pub lights: Vec<Light>,
    /// Whether the renderer should compute shadow maps.
    pub shadows: bool,
    /// Top-level nodes.
    pub nodes: Vec<Node>,
}

impl Scene {
    pub fn new(background: Color, camera: Camera) -> Self {
        Self {
            background,
            camera,
            lights: Vec::new(),
            shadows: false,
            nodes: Vec::new(),
        }
    }

    pub fn add_light(&mut self, light: Light) {
        if matches!(light, Light::Directional { cast_shadow: true, .. }) {
            self.shadows = true;
        }
        self.lights.push(light);
    }

    pub fn add_node(&mut self, node: Node) {
        self.nodes.push(node);
    }

    pub fn find(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find_map(|n| n.find(id))
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find_map(|n| n.find_mut(id))
    }

    /// Every node in the scene, parents before children.
    pub fn all_nodes(&self) -> Vec<&Node> {
        self.nodes.iter().flat_map(|n| n.descendants()).collect()
    }

    pub fn node_count(&self) -> usize {
        self.all_nodes().len()
    }

    /// Nodes whose position is driven by an actor.
    pub fn bound_nodes(&self) -> Vec<&Node> {
        self.all_nodes()
            .into_iter()
            .filter(|n| n.binding.is_some())
            .collect()
    }

    /// Sum of local translations from the root down to `id`.
    ///
    /// Rotations are not applied; none of the diorama's parent nodes rotate.
    pub fn world_position(&self, id: &str) -> Option<Vec3> {
        fn walk(node: &Node, id: &str, acc: Vec3) -> Option<Vec3> {
            let here = acc + node.transform.position;
            if node.id.0 == id {
                return Some(here);
            }
            node.children.iter().find_map(|c| walk(c, id, here))
        }
        self.nodes.iter().find_map(|n| walk(n, id, Vec3::zero()))
    }

    /// Pretty-printed JSON of the whole scene graph.
    pub fn to_json(&self) -> DioramaResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Copy each bound actor part's position into its node.
    /// Returns the number of nodes updated.
    pub fn sync_bindings(&mut self, actors: &ActorRegistry) -> usize {
        let mut updated = 0;
        for root in &mut self.nodes {
            root.visit_mut(&mut |node| {
                let Some(binding) = &node.binding else {
                    return;
                };
                let position = actors
                    .get(binding.actor.as_str())
                    .and_then(|actor| actor.position().get(binding.part));
                if let Some(position) = position {
                    node.transform.position = position;
                    updated += 1;
                }
            });
        }
        updated
    }
}
