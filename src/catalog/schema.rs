//! Piece template schema types for TOML deserialization.
//!
//! A template describes one modular piece: its role in the layout, an
//! optional local bounding box used for overlap tests, and a tree of nodes.
//! Nodes carrying a `connector` marker are the doorways pieces join through.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::core::types::{PieceRole, Pose};

/// Complete template definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieceTemplate {
    /// Metadata about the template
    pub piece: PieceMeta,
    /// Local bounding box; templates without one never collide
    #[serde(default)]
    pub bounds: Option<BoundsDef>,
    /// Top-level structure nodes, in authoring order
    #[serde(default)]
    pub nodes: Vec<NodeDef>,
}

/// Template metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieceMeta {
    /// Unique string identifier
    pub name: String,
    /// Role in the layout
    pub role: PieceRole,
    /// Free-form description
    #[serde(default)]
    pub description: String,
}

/// Axis-aligned box in the piece's local frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundsDef {
    pub center: [f32; 3],
    pub size: [f32; 3],
}

impl BoundsDef {
    pub fn center(&self) -> Vec3 {
        Vec3::from_array(self.center)
    }

    pub fn half_extents(&self) -> Vec3 {
        Vec3::from_array(self.size) * 0.5
    }
}

/// Typed capability attached to a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    /// A doorway other pieces may attach to
    Connector,
}

/// A node in the template's hierarchy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
    pub name: String,
    /// Position relative to the parent node
    #[serde(default)]
    pub position: [f32; 3],
    /// Rotation about +Y relative to the parent, in degrees
    #[serde(default)]
    pub yaw: f32,
    #[serde(default)]
    pub marker: Option<Marker>,
    #[serde(default)]
    pub children: Vec<NodeDef>,
}

/// A connector found by scanning a template, expressed in the piece's frame
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorSlot {
    /// Position in scan order
    pub index: usize,
    pub name: String,
    pub position: Vec3,
    /// Unit forward vector (the node's +Z)
    pub forward: Vec3,
}

impl PieceTemplate {
    pub fn new(name: impl Into<String>, role: PieceRole) -> Self {
        Self {
            piece: PieceMeta {
                name: name.into(),
                role,
                description: String::new(),
            },
            bounds: None,
            nodes: Vec::new(),
        }
    }

    pub fn with_bounds(mut self, center: [f32; 3], size: [f32; 3]) -> Self {
        self.bounds = Some(BoundsDef { center, size });
        self
    }

    pub fn with_node(mut self, node: NodeDef) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn name(&self) -> &str {
        &self.piece.name
    }

    pub fn role(&self) -> PieceRole {
        self.piece.role
    }

    /// All connector markers, depth-first in authoring order
    ///
    /// A marked node is listed before its own children, matching the order
    /// a scene-graph walk over the piece would visit them.
    pub fn connector_slots(&self) -> Vec<ConnectorSlot> {
        let mut slots = Vec::new();
        for node in &self.nodes {
            collect_slots(node, Pose::IDENTITY, &mut slots);
        }
        slots
    }

    pub fn connector_count(&self) -> usize {
        self.connector_slots().len()
    }

    /// Check the template for authoring mistakes
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.piece.name.trim().is_empty() {
            errors.push("template name is empty".to_string());
        }

        if let Some(bounds) = &self.bounds {
            let size = Vec3::from_array(bounds.size);
            if !size.is_finite() || size.min_element() <= 0.0 {
                errors.push(format!(
                    "{}: bounds size {:?} must be positive",
                    self.piece.name, bounds.size
                ));
            }
            if !bounds.center().is_finite() {
                errors.push(format!("{}: bounds center is not finite", self.piece.name));
            }
        }

        let mut stack: Vec<&NodeDef> = self.nodes.iter().collect();
        while let Some(node) = stack.pop() {
            if !Vec3::from_array(node.position).is_finite() || !node.yaw.is_finite() {
                errors.push(format!(
                    "{}: node '{}' has a non-finite transform",
                    self.piece.name, node.name
                ));
            }
            stack.extend(node.children.iter());
        }

        errors
    }
}

impl NodeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: [0.0; 3],
            yaw: 0.0,
            marker: None,
            children: Vec::new(),
        }
    }

    /// A connector node at `position` facing `yaw` degrees from +Z
    pub fn connector(name: impl Into<String>, position: [f32; 3], yaw: f32) -> Self {
        Self {
            marker: Some(Marker::Connector),
            ..Self::new(name).at(position).yawed(yaw)
        }
    }

    pub fn at(mut self, position: [f32; 3]) -> Self {
        self.position = position;
        self
    }

    pub fn yawed(mut self, yaw: f32) -> Self {
        self.yaw = yaw;
        self
    }

    pub fn with_child(mut self, child: NodeDef) -> Self {
        self.children.push(child);
        self
    }

    pub fn is_connector(&self) -> bool {
        self.marker == Some(Marker::Connector)
    }

    /// True if this node or any descendant is a connector
    pub fn contains_connector(&self) -> bool {
        self.is_connector() || self.children.iter().any(NodeDef::contains_connector)
    }

    fn local_pose(&self) -> Pose {
        Pose::new(
            Vec3::from_array(self.position),
            Quat::from_rotation_y(self.yaw.to_radians()),
        )
    }
}

fn collect_slots(node: &NodeDef, parent: Pose, slots: &mut Vec<ConnectorSlot>) {
    let local = node.local_pose();
    let pose = Pose::new(
        parent.transform_point(local.position),
        parent.rotation * local.rotation,
    );

    if node.is_connector() {
        slots.push(ConnectorSlot {
            index: slots.len(),
            name: node.name.clone(),
            position: pose.position,
            forward: pose.transform_direction(Vec3::Z).normalize_or_zero(),
        });
    }

    for child in &node.children {
        collect_slots(child, pose, slots);
    }
}
