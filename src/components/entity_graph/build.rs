use std::collections::HashMap;

use log::{info, warn};

use super::types::{Edge, Entity, EntityType, GraphData, Node, NodeIdx, Relationship};

pub const IMPLICIT_DETAILS: &str = "Extracted from relationship";

/// Derive the node and edge set for one report view.
///
/// Entities come first in input order, duplicate names keep their first
/// occurrence. Relationship endpoints with no matching entity are added as
/// `Unknown` nodes in first-seen order. Every relationship yields one edge.
pub fn build_graph(entities: &[Entity], relationships: &[Relationship]) -> GraphData {
	let mut nodes = Vec::with_capacity(entities.len());
	let mut id_to_idx: HashMap<String, NodeIdx> = HashMap::new();

	for entity in entities {
		if id_to_idx.contains_key(&entity.name) {
			continue;
		}
		id_to_idx.insert(entity.name.clone(), NodeIdx(nodes.len()));
		nodes.push(Node::new(
			entity.name.clone(),
			entity.kind,
			entity.details.clone(),
		));
	}

	let mut resolve = |name: &str, nodes: &mut Vec<Node>| -> NodeIdx {
		if let Some(&idx) = id_to_idx.get(name) {
			return idx;
		}
		warn!("relationship references unlisted entity {name:?}, adding placeholder");
		let idx = NodeIdx(nodes.len());
		id_to_idx.insert(name.to_owned(), idx);
		nodes.push(Node::new(name, EntityType::Unknown, IMPLICIT_DETAILS));
		idx
	};

	let edges: Vec<Edge> = relationships
		.iter()
		.map(|rel| {
			let source = resolve(&rel.source_entity, &mut nodes);
			let target = resolve(&rel.target_entity, &mut nodes);
			Edge {
				source,
				target,
				relation: rel.relationship_type.clone(),
				evidence: rel.supporting_evidence.clone(),
			}
		})
		.collect();

	info!("built entity graph: {} nodes, {} edges", nodes.len(), edges.len());
	GraphData { nodes, edges }
}
