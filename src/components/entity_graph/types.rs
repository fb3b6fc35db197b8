use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Kind of a real-world item pulled out of the source documents.
///
/// The set is closed: anything the report tags with a type we do not know
/// becomes [`EntityType::Unknown`], so palette and glyph lookups stay total.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum EntityType {
	/// A named individual.
	Person,
	/// Company, agency or other legal body.
	Organization,
	/// An amount or account.
	Money,
	/// A place or jurisdiction.
	Location,
	/// Contract, invoice, filing and the like.
	Document,
	/// Goods or services.
	Product,
	/// Anything else, including names only seen in relationships.
	#[default]
	Unknown,
}

impl EntityType {
	/// Every variant, in declaration order.
	pub const ALL: [EntityType; 7] = [
		EntityType::Person,
		EntityType::Organization,
		EntityType::Money,
		EntityType::Location,
		EntityType::Document,
		EntityType::Product,
		EntityType::Unknown,
	];

	/// Case-insensitive lookup; unrecognized labels map to `Unknown`.
	pub fn parse(label: &str) -> Self {
		let label = label.trim();
		Self::ALL
			.into_iter()
			.find(|kind| kind.as_str().eq_ignore_ascii_case(label))
			.unwrap_or(EntityType::Unknown)
	}

	/// Canonical label, as reports spell it.
	pub fn as_str(self) -> &'static str {
		match self {
			EntityType::Person => "Person",
			EntityType::Organization => "Organization",
			EntityType::Money => "Money",
			EntityType::Location => "Location",
			EntityType::Document => "Document",
			EntityType::Product => "Product",
			EntityType::Unknown => "Unknown",
		}
	}
}

impl fmt::Display for EntityType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl<'de> Deserialize<'de> for EntityType {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let label = String::deserialize(deserializer)?;
		Ok(EntityType::parse(&label))
	}
}

/// Treat an explicit `null` the same as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Default + Deserialize<'de>,
{
	Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A named item extracted from the source material.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entity {
	/// Unique key; also the node id.
	pub name: String,
	/// Kind of item.
	#[serde(rename = "type", default, deserialize_with = "null_as_default")]
	pub kind: EntityType,
	/// Free-form description.
	#[serde(default, deserialize_with = "null_as_default")]
	pub details: String,
}

impl Entity {
	/// Build an entity from its parts.
	pub fn new(name: impl Into<String>, kind: EntityType, details: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			kind,
			details: details.into(),
		}
	}
}

/// Directed, labeled link between two entities, referenced by name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
	/// Name of the entity the link starts at.
	pub source_entity: String,
	/// Name of the entity the link points to.
	pub target_entity: String,
	/// Relation label, e.g. "signed".
	#[serde(default, deserialize_with = "null_as_default")]
	pub relationship_type: String,
	/// Quote or citation backing the link.
	#[serde(default, deserialize_with = "null_as_default")]
	pub supporting_evidence: String,
}

impl Relationship {
	/// Build a relationship from its parts.
	pub fn new(
		source: impl Into<String>,
		target: impl Into<String>,
		relation: impl Into<String>,
		evidence: impl Into<String>,
	) -> Self {
		Self {
			source_entity: source.into(),
			target_entity: target.into(),
			relationship_type: relation.into(),
			supporting_evidence: evidence.into(),
		}
	}
}

/// Index of a node in the simulation arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIdx(pub usize);

/// Index of an edge in the simulation arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeIdx(pub usize);

/// A graph vertex. Position and velocity belong to the layout engine;
/// everyone else reads them through the accessors.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	pub id: String,
	pub kind: EntityType,
	pub details: String,
	pub(super) x: f64,
	pub(super) y: f64,
	pub(super) vx: f64,
	pub(super) vy: f64,
	pub(super) pin: Option<(f64, f64)>,
}

impl Node {
	pub fn new(id: impl Into<String>, kind: EntityType, details: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			kind,
			details: details.into(),
			x: f64::NAN,
			y: f64::NAN,
			vx: 0.0,
			vy: 0.0,
			pin: None,
		}
	}

	pub fn x(&self) -> f64 {
		self.x
	}

	pub fn y(&self) -> f64 {
		self.y
	}

	pub fn is_pinned(&self) -> bool {
		self.pin.is_some()
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
	pub source: NodeIdx,
	pub target: NodeIdx,
	pub relation: String,
	pub evidence: String,
}

impl Edge {
	pub fn is_self_loop(&self) -> bool {
		self.source == self.target
	}

	pub fn touches(&self, idx: NodeIdx) -> bool {
		self.source == idx || self.target == idx
	}

	/// The endpoint that is not `idx`; for a self-loop that is `idx` itself.
	pub fn other(&self, idx: NodeIdx) -> NodeIdx {
		if self.source == idx {
			self.target
		} else {
			self.source
		}
	}
}

/// Deduplicated node and edge set ready for layout.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphData {
	pub nodes: Vec<Node>,
	pub edges: Vec<Edge>,
}

impl GraphData {
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn node(&self, idx: NodeIdx) -> Option<&Node> {
		self.nodes.get(idx.0)
	}

	pub fn edge(&self, idx: EdgeIdx) -> Option<&Edge> {
		self.edges.get(idx.0)
	}

	/// Edges with `idx` at either end, in edge order.
	pub fn edges_touching(&self, idx: NodeIdx) -> impl Iterator<Item = (EdgeIdx, &Edge)> + '_ {
		self.edges
			.iter()
			.enumerate()
			.filter(move |(_, edge)| edge.touches(idx))
			.map(|(i, edge)| (EdgeIdx(i), edge))
	}

	/// Number of link endpoints at each node; a self-loop counts twice.
	pub fn degrees(&self) -> Vec<usize> {
		let mut degrees = vec![0; self.nodes.len()];
		for edge in &self.edges {
			degrees[edge.source.0] += 1;
			degrees[edge.target.0] += 1;
		}
		degrees
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn entity_type_parse_is_case_insensitive() {
		assert_eq!(EntityType::parse("person"), EntityType::Person);
		assert_eq!(EntityType::parse(" ORGANIZATION "), EntityType::Organization);
		assert_eq!(EntityType::parse("Money"), EntityType::Money);
	}

	#[test]
	fn unrecognized_entity_type_is_unknown() {
		assert_eq!(EntityType::parse("Org"), EntityType::Unknown);
		assert_eq!(EntityType::parse(""), EntityType::Unknown);
	}

	#[test]
	fn entity_type_round_trips_through_display() {
		for kind in EntityType::ALL {
			assert_eq!(EntityType::parse(&kind.to_string()), kind);
		}
	}

	#[test]
	fn null_fields_fall_back_to_defaults() {
		let entity: Entity =
			serde_json::from_str(r#"{"name": "A", "type": null, "details": null}"#).unwrap();
		assert_eq!(entity, Entity::new("A", EntityType::Unknown, ""));

		let rel: Relationship = serde_json::from_str(
			r#"{"source_entity": "A", "target_entity": "B", "relationship_type": null, "supporting_evidence": null}"#,
		)
		.unwrap();
		assert_eq!(rel, Relationship::new("A", "B", "", ""));

		let rel: Relationship =
			serde_json::from_str(r#"{"source_entity": "A", "target_entity": "B"}"#).unwrap();
		assert_eq!(rel.relationship_type, "");
	}

	#[test]
	fn edge_other_endpoint() {
		let edge = Edge {
			source: NodeIdx(0),
			target: NodeIdx(1),
			relation: "owns".into(),
			evidence: String::new(),
		};
		assert_eq!(edge.other(NodeIdx(0)), NodeIdx(1));
		assert_eq!(edge.other(NodeIdx(1)), NodeIdx(0));

		let self_loop = Edge {
			target: NodeIdx(0),
			..edge
		};
		assert!(self_loop.is_self_loop());
		assert_eq!(self_loop.other(NodeIdx(0)), NodeIdx(0));
	}
}
