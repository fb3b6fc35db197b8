//! The entity-graph slice of an analysis report.
//!
//! Reports carry many more sections (risk scores, red flags, timeline...);
//! only `entities` and `entity_relationships` are read here and everything
//! else is ignored.

use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::components::entity_graph::{Entity, GraphData, Relationship, build_graph};
use crate::error::Result;

/// Entities and relationships as the report delivers them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphReport {
	/// Explicitly extracted entities.
	#[serde(default, deserialize_with = "entity_list")]
	pub entities: Vec<Entity>,
	/// Directed links between entities, by name.
	#[serde(default, deserialize_with = "relationship_list")]
	pub entity_relationships: Vec<Relationship>,
}

/// Decode a section item by item, dropping entries that do not fit `T`.
/// A `null` section reads as empty.
fn lenient_list<'de, D, T>(
	deserializer: D,
	section: &str,
) -> std::result::Result<Vec<T>, D::Error>
where
	D: Deserializer<'de>,
	T: DeserializeOwned,
{
	let items = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
	Ok(items
		.into_iter()
		.enumerate()
		.filter_map(|(i, item)| {
			serde_json::from_value(item)
				.inspect_err(|err| warn!("skipping {section}[{i}]: {err}"))
				.ok()
		})
		.collect())
}

fn entity_list<'de, D: Deserializer<'de>>(
	deserializer: D,
) -> std::result::Result<Vec<Entity>, D::Error> {
	let entities: Vec<Entity> = lenient_list(deserializer, "entities")?;
	Ok(entities
		.into_iter()
		.filter(|entity| !entity.name.trim().is_empty())
		.collect())
}

fn relationship_list<'de, D: Deserializer<'de>>(
	deserializer: D,
) -> std::result::Result<Vec<Relationship>, D::Error> {
	let relationships: Vec<Relationship> = lenient_list(deserializer, "entity_relationships")?;
	Ok(relationships
		.into_iter()
		.filter(|rel| {
			!rel.source_entity.trim().is_empty() && !rel.target_entity.trim().is_empty()
		})
		.collect())
}

impl GraphReport {
	/// Decode a report; missing graph sections are treated as empty and
	/// entries without a usable name or endpoints are dropped.
	pub fn from_json(json: &str) -> Result<Self> {
		Ok(serde_json::from_str(json)?)
	}

	/// Build the deduplicated node/edge set for this report.
	pub fn graph_data(&self) -> GraphData {
		build_graph(&self.entities, &self.entity_relationships)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::entity_graph::EntityType;
	use crate::error::Error;

	#[test]
	fn parses_graph_sections_and_ignores_the_rest() {
		let report = GraphReport::from_json(
			r#"{
				"c_suite_summary": "All good.",
				"risk_scores": {"financial_risk": 40},
				"entities": [
					{"name": "A", "type": "Person", "details": "Signer"},
					{"name": "X", "type": "Org", "details": "Vendor"}
				],
				"entity_relationships": [
					{"source_entity": "A", "target_entity": "B", "relationship_type": "owns", "supporting_evidence": "Deed p.1"}
				]
			}"#,
		)
		.unwrap();

		assert_eq!(report.entities[0].kind, EntityType::Person);
		assert_eq!(report.entities[1].kind, EntityType::Unknown);

		let graph = report.graph_data();
		assert_eq!(graph.nodes.len(), 3);
		assert_eq!(graph.edges.len(), 1);
		assert_eq!(graph.edges[0].evidence, "Deed p.1");
	}

	#[test]
	fn missing_sections_give_empty_graph() {
		let report = GraphReport::from_json(r#"{"red_flags": []}"#).unwrap();
		assert_eq!(report, GraphReport::default());
		assert!(report.graph_data().is_empty());
	}

	#[test]
	fn optional_text_fields_default_to_empty() {
		let report = GraphReport::from_json(
			r#"{"entities": [{"name": "A", "type": "money"}],
			    "entity_relationships": [{"source_entity": "A", "target_entity": "A", "relationship_type": "self"}]}"#,
		)
		.unwrap();
		assert_eq!(report.entities[0].details, "");
		assert_eq!(report.entities[0].kind, EntityType::Money);
		assert_eq!(report.entity_relationships[0].supporting_evidence, "");
	}

	#[test]
	fn null_fields_do_not_discard_the_graph() {
		let report = GraphReport::from_json(
			r#"{"entities": [{"name": "A", "type": null, "details": null}],
			    "entity_relationships": [
			        {"source_entity": "A", "target_entity": "B", "relationship_type": null, "supporting_evidence": null},
			        {"source_entity": "B", "target_entity": "A"}
			    ]}"#,
		)
		.unwrap();
		assert_eq!(report.entities[0].kind, EntityType::Unknown);
		assert_eq!(report.entities[0].details, "");
		let graph = report.graph_data();
		assert_eq!(graph.nodes.len(), 2);
		assert_eq!(graph.edges.len(), 2);
		assert_eq!(graph.edges[1].relation, "");
	}

	#[test]
	fn unusable_entries_are_skipped() {
		let report = GraphReport::from_json(
			r#"{"entities": [
			        {"type": "Person", "details": "no name"},
			        {"name": "  "},
			        {"name": 42},
			        {"name": "A", "type": "Person"}
			    ],
			    "entity_relationships": [
			        {"target_entity": "A", "relationship_type": "owns"},
			        {"source_entity": "A", "target_entity": null},
			        {"source_entity": "", "target_entity": "A"},
			        "not an object",
			        {"source_entity": "A", "target_entity": "C", "relationship_type": "pays"}
			    ]}"#,
		)
		.unwrap();
		assert_eq!(report.entities, vec![Entity::new("A", EntityType::Person, "")]);
		assert_eq!(report.entity_relationships.len(), 1);
		assert_eq!(report.entity_relationships[0].target_entity, "C");

		let graph = report.graph_data();
		assert_eq!(graph.nodes.len(), 2);
		assert_eq!(graph.edges.len(), 1);
	}

	#[test]
	fn null_sections_read_as_empty() {
		let report =
			GraphReport::from_json(r#"{"entities": null, "entity_relationships": null}"#).unwrap();
		assert!(report.graph_data().is_empty());
	}

	#[test]
	fn malformed_json_is_an_error() {
		let err = GraphReport::from_json("{\"entities\": [").unwrap_err();
		assert!(matches!(err, Error::Json(_)));
		assert!(err.to_string().starts_with("invalid report JSON"));
	}
}
