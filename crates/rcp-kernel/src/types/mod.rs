//! Core value types for the planning graph
//!
//! Nodes are authored by callers; edges are never authored directly and are
//! always derived from node dependency lists.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Stable identifier of a plannable node
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create a node id from anything string-like
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Identifier of a plan (one graph snapshot per planning call)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(pub String);

impl PlanId {
    /// Create a plan id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Owning tenant of a plan
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(pub String);

impl TenantId {
    /// Create a tenant id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Criticality weight of a dependency, ordinal 1..=5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct Criticality(u8);

impl Criticality {
    /// Lowest criticality
    pub const MIN: Self = Self(1);
    /// Highest criticality
    pub const MAX: Self = Self(5);

    /// Create a criticality, clamped into `1..=5`
    #[inline]
    #[must_use]
    pub fn new(value: u8) -> Self {
        Self(value.clamp(Self::MIN.0, Self::MAX.0))
    }

    /// Numeric weight
    #[inline]
    #[must_use]
    pub fn weight(self) -> u8 {
        self.0
    }
}

impl Default for Criticality {
    fn default() -> Self {
        Self::MIN
    }
}

impl From<u8> for Criticality {
    fn from(value: u8) -> Self {
        Self::new(value)
    }
}

impl From<Criticality> for u8 {
    fn from(value: Criticality) -> Self {
        value.0
    }
}

/// Declared prerequisite of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyDescriptor {
    /// Id of the prerequisite node
    pub node_id: NodeId,

    /// How much the dependent relies on this prerequisite succeeding
    #[serde(default)]
    pub criticality: Criticality,

    /// Coupling strength in `[0, 1]`
    #[serde(default)]
    pub coupling: f64,

    /// Optional prerequisites still order execution but may be skipped downstream
    #[serde(default)]
    pub optional: bool,
}

impl DependencyDescriptor {
    /// Create a descriptor; coupling is clamped into `[0, 1]`
    #[must_use]
    pub fn new(node_id: impl Into<NodeId>, criticality: u8, coupling: f64) -> Self {
        Self {
            node_id: node_id.into(),
            criticality: Criticality::new(criticality),
            coupling: clamp_unit(coupling),
            optional: false,
        }
    }

    /// Mark the dependency as optional
    #[inline]
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Coupling clamped into `[0, 1]`; NaN counts as zero
    #[inline]
    #[must_use]
    pub fn coupling_strength(&self) -> f64 {
        clamp_unit(self.coupling)
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// One command/step in a recovery workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique id within a graph
    pub id: NodeId,

    /// Human label
    #[serde(default)]
    pub label: String,

    /// Command / automation kind tag
    #[serde(default)]
    pub command: String,

    /// Expected duration in minutes
    #[serde(default)]
    pub expected_duration_minutes: u32,

    /// Owning team
    #[serde(default)]
    pub owner: String,

    /// Declared prerequisites
    #[serde(default)]
    pub dependencies: Vec<DependencyDescriptor>,

    /// Free-form resource tags
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Node {
    /// Create a node with no dependencies
    #[must_use]
    pub fn new(id: impl Into<NodeId>) -> Self {
        let id = id.into();
        Self {
            label: id.0.clone(),
            id,
            command: String::new(),
            expected_duration_minutes: 0,
            owner: String::new(),
            dependencies: Vec::new(),
            tags: Vec::new(),
        }
    }

    /// Set the human label
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set the command kind
    #[must_use]
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    /// Set the expected duration
    #[must_use]
    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.expected_duration_minutes = minutes;
        self
    }

    /// Set the owning team
    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    /// Add a dependency descriptor
    #[must_use]
    pub fn depends_on(mut self, dependency: DependencyDescriptor) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Add a resource tag
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Sum of criticality weights over incoming dependencies
    #[must_use]
    pub fn incoming_criticality(&self) -> u32 {
        self.dependencies
            .iter()
            .map(|d| u32::from(d.criticality.weight()))
            .sum()
    }

    /// Sum of coupling strengths over incoming dependencies
    #[must_use]
    pub fn incoming_coupling(&self) -> f64 {
        self.dependencies
            .iter()
            .map(DependencyDescriptor::coupling_strength)
            .sum()
    }
}

/// Derived directed edge `from -> to` (prerequisite to dependent)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Prerequisite node
    pub from: NodeId,
    /// Dependent node
    pub to: NodeId,
    /// Coupling strength carried as the edge weight
    pub weight: f64,
    /// Criticality carried as an auxiliary attribute
    pub criticality: Criticality,
    /// Whether the dependency was declared optional
    pub optional: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn criticality_is_clamped() {
        assert_eq!(Criticality::new(0).weight(), 1);
        assert_eq!(Criticality::new(9).weight(), 5);
        assert_eq!(Criticality::new(3).weight(), 3);
    }

    #[test]
    fn coupling_is_clamped() {
        let dep = DependencyDescriptor::new("a", 3, 1.7);
        assert!((dep.coupling_strength() - 1.0).abs() < f64::EPSILON);

        let mut dep = DependencyDescriptor::new("a", 3, 0.5);
        dep.coupling = f64::NAN;
        assert!(dep.coupling_strength().abs() < f64::EPSILON);
    }

    #[test]
    fn incoming_aggregates() {
        let node = Node::new("c")
            .depends_on(DependencyDescriptor::new("a", 5, 0.2))
            .depends_on(DependencyDescriptor::new("b", 2, 0.3));

        assert_eq!(node.incoming_criticality(), 7);
        assert!((node.incoming_coupling() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn node_deserializes_with_defaults() {
        let node: Node = serde_json::from_str(
            r#"{"id":"restart-db","dependencies":[{"node_id":"drain","criticality":4}]}"#,
        )
        .unwrap();

        assert_eq!(node.id.as_str(), "restart-db");
        assert_eq!(node.dependencies[0].criticality.weight(), 4);
        assert!(!node.dependencies[0].optional);
        assert!(node.tags.is_empty());
    }
}
