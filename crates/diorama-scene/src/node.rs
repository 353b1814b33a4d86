use serde::{Deserialize, Serialize};

use diorama_choreo::{ActorId, PartId};
use diorama_core::{Color, Size3, Vec3};

/// Unique identifier for a scene node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mesh shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Geometry {
    Box { size: Size3 },
    /// A flat rectangle in the local XY plane.
    Plane { width: f64, height: f64 },
}

/// An image mapped onto a surface, tiled `repeat` times per axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Texture {
    pub path: String,
    pub repeat: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub color: Color,
    pub opacity: f64,
    pub transparent: bool,
    pub texture: Option<Texture>,
}

impl Material {
    /// Opaque material with a flat color.
    pub fn solid(color: Color) -> Self {
        Self {
            color,
            opacity: 1.0,
            transparent: false,
            texture: None,
        }
    }

    /// Opaque white material carrying a texture.
    pub fn textured(texture: Texture) -> Self {
        Self {
            texture: Some(texture),
            ..Self::solid(Color::WHITE)
        }
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self.transparent = opacity < 1.0;
        self
    }
}

/// What a node draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeContent {
    /// Draws nothing; positions its children.
    Group,
    Mesh { geometry: Geometry, material: Material },
}

/// Local placement relative to the parent node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform3D {
    pub position: Vec3,
    /// Euler angles in radians, applied X then Y then Z.
    pub rotation: Vec3,
}

impl Transform3D {
    pub fn identity() -> Self {
        Self {
            position: Vec3::zero(),
            rotation: Vec3::zero(),
        }
    }
}

impl Default for Transform3D {
    fn default() -> Self {
        Self::identity()
    }
}

/// Marks a node whose local position is driven by an actor part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorBinding {
    pub actor: ActorId,
    pub part: PartId,
}

/// A node in the scene graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub content: NodeContent,
    pub transform: Transform3D,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<ActorBinding>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(id: NodeId, content: NodeContent) -> Self {
        Self {
            id,
            content,
            transform: Transform3D::identity(),
            cast_shadow: false,
            receive_shadow: false,
            binding: None,
            children: Vec::new(),
        }
    }

    /// An empty group node.
    pub fn group(id: impl Into<String>) -> Self {
        Self::new(NodeId::new(id), NodeContent::Group)
    }

    pub fn mesh(id: impl Into<String>, geometry: Geometry, material: Material) -> Self {
        Self::new(NodeId::new(id), NodeContent::Mesh { geometry, material })
    }

    /// Builder: set position.
    pub fn with_position(mut self, x: f64, y: f64, z: f64) -> Self {
        self.transform.position = Vec3::new(x, y, z);
        self
    }

    /// Builder: set rotation in radians.
    pub fn with_rotation(mut self, x: f64, y: f64, z: f64) -> Self {
        self.transform.rotation = Vec3::new(x, y, z);
        self
    }

    pub fn casting_shadow(mut self) -> Self {
        self.cast_shadow = true;
        self
    }

    pub fn receiving_shadow(mut self) -> Self {
        self.receive_shadow = true;
        self
    }

    /// Builder: drive this node's position from an actor part.
    pub fn bound_to(mut self, actor: ActorId, part: PartId) -> Self {
        self.binding = Some(ActorBinding { actor, part });
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }

    /// This node and all descendants, depth first, parents before children.
    pub fn descendants(&self) -> Vec<&Node> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.descendants());
        }
        out
    }

    pub fn find(&self, id: &str) -> Option<&Node> {
        if self.id.0 == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Node> {
        if self.id.0 == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(id))
    }

    /// Visit every node mutably, parents before children.
    pub fn visit_mut(&mut self, f: &mut impl FnMut(&mut Node)) {
        f(self);
        for child in &mut self.children {
            child.visit_mut(f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Node {
        Node::group("root").with_child(
            Node::group("platform")
                .with_position(0.0, 0.0, 6.0)
                .with_child(Node::mesh(
                    "base",
                    Geometry::Box {
                        size: Size3::new(120.0, 2.0, 8.0),
                    },
                    Material::solid(Color::from_rgb_u32(0x555555)),
                )),
        )
    }

    #[test]
    fn test_node_builders() {
        let node = Node::group("door")
            .with_position(-25.0, 3.25, 1.9)
            .casting_shadow()
            .bound_to(ActorId::new("door-0"), PartId::LeftPanel);
        assert!((node.transform.position.x + 25.0).abs() < 1e-9);
        assert!(node.cast_shadow);
        assert!(!node.receive_shadow);
        assert_eq!(node.binding.unwrap().part, PartId::LeftPanel);
    }

    #[test]
    fn test_find_and_descendants() {
        let mut root = tree();
        assert_eq!(root.descendants().len(), 3);
        assert!(root.find("base").is_some());
        assert!(root.find("missing").is_none());
        root.find_mut("base").unwrap().transform.position.y = 1.0;
        assert_eq!(root.find("base").unwrap().transform.position.y, 1.0);
    }

    #[test]
    fn test_visit_mut_reaches_every_node() {
        let mut root = tree();
        let mut count = 0;
        root.visit_mut(&mut |node| {
            node.receive_shadow = true;
            count += 1;
        });
        assert_eq!(count, 3);
        assert!(root.descendants().iter().all(|n| n.receive_shadow));
    }

    #[test]
    fn test_translucent_material() {
        let material = Material::solid(Color::from_rgb_u32(0xeeeeee)).with_opacity(0.9);
        assert!(material.transparent);
        assert!(!Material::solid(Color::WHITE).transparent);
    }

    #[test]
    fn test_node_json_skips_empty_fields() {
        let json = serde_json::to_value(Node::group("g")).unwrap();
        assert!(json.get("children").is_none());
        assert!(json.get("binding").is_none());
        assert_eq!(json["content"]["kind"], "group");
    }
}
