use super::types::{EdgeIdx, EntityType, GraphData, NodeIdx};

/// What a click landed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickTarget {
	Node(NodeIdx),
	Edge(EdgeIdx),
	Background,
}

/// At most one node or one edge is selected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Selection {
	#[default]
	None,
	Node(NodeIdx),
	Edge(EdgeIdx),
}

impl Selection {
	pub fn apply(&mut self, target: ClickTarget) {
		*self = match target {
			ClickTarget::Node(idx) => Selection::Node(idx),
			ClickTarget::Edge(idx) => Selection::Edge(idx),
			ClickTarget::Background => Selection::None,
		};
	}

	pub fn clear(&mut self) {
		*self = Selection::None;
	}

	pub fn node(&self) -> Option<NodeIdx> {
		match *self {
			Selection::Node(idx) => Some(idx),
			_ => None,
		}
	}

	pub fn edge(&self) -> Option<EdgeIdx> {
		match *self {
			Selection::Edge(idx) => Some(idx),
			_ => None,
		}
	}

	/// Summary for the detail panel, resolved against `graph`.
	pub fn details(&self, graph: &GraphData) -> Option<SelectionDetails> {
		match *self {
			Selection::None => None,
			Selection::Node(idx) => {
				let node = graph.node(idx)?;
				let relations = graph
					.edges_touching(idx)
					.filter_map(|(_, edge)| {
						let other = graph.node(edge.other(idx))?;
						Some(RelationSummary {
							relation: edge.relation.clone(),
							other: other.id.clone(),
							outgoing: edge.source == idx,
						})
					})
					.collect();
				Some(SelectionDetails::Node(NodeDetails {
					id: node.id.clone(),
					kind: node.kind,
					details: node.details.clone(),
					relations,
				}))
			}
			Selection::Edge(idx) => {
				let edge = graph.edge(idx)?;
				let endpoint = |n: NodeIdx| {
					graph.node(n).map(|node| EndpointSummary {
						id: node.id.clone(),
						kind: node.kind,
					})
				};
				Some(SelectionDetails::Edge(EdgeDetails {
					source: endpoint(edge.source)?,
					target: endpoint(edge.target)?,
					relation: edge.relation.clone(),
					evidence: edge.evidence.clone(),
				}))
			}
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct RelationSummary {
	pub relation: String,
	/// Name of the endpoint that is not the selected node.
	pub other: String,
	pub outgoing: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeDetails {
	pub id: String,
	pub kind: EntityType,
	pub details: String,
	pub relations: Vec<RelationSummary>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EndpointSummary {
	pub id: String,
	pub kind: EntityType,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeDetails {
	pub source: EndpointSummary,
	pub target: EndpointSummary,
	pub relation: String,
	pub evidence: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SelectionDetails {
	Node(NodeDetails),
	Edge(EdgeDetails),
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;

	use super::*;
	use crate::components::entity_graph::build::build_graph;
	use crate::components::entity_graph::types::{Entity, Relationship};

	fn sample() -> GraphData {
		build_graph(
			&[
				Entity::new("Acme", EntityType::Organization, "Vendor"),
				Entity::new("Jane", EntityType::Person, "CFO"),
			],
			&[
				Relationship::new("Jane", "Acme", "approved invoices of", "Invoice 42, p.2"),
				Relationship::new("Acme", "$1.2M", "received", "Ledger row 17"),
			],
		)
	}

	#[test]
	fn node_and_edge_selection_are_exclusive() {
		let mut sel = Selection::default();
		sel.apply(ClickTarget::Node(NodeIdx(0)));
		assert_eq!(sel.node(), Some(NodeIdx(0)));
		assert_eq!(sel.edge(), None);

		sel.apply(ClickTarget::Edge(EdgeIdx(1)));
		assert_eq!(sel.node(), None);
		assert_eq!(sel.edge(), Some(EdgeIdx(1)));

		sel.apply(ClickTarget::Background);
		assert_eq!(sel, Selection::None);
		sel.apply(ClickTarget::Background);
		assert_eq!(sel, Selection::None);
	}

	#[test]
	fn node_details_list_relations_with_other_endpoint() {
		let graph = sample();
		let acme = NodeIdx(0);
		let mut sel = Selection::default();
		sel.apply(ClickTarget::Node(acme));

		let Some(SelectionDetails::Node(details)) = sel.details(&graph) else {
			panic!("expected node details");
		};
		assert_eq!(details.kind, EntityType::Organization);
		assert_eq!(details.details, "Vendor");
		assert_eq!(
			details.relations,
			vec![
				RelationSummary {
					relation: "approved invoices of".into(),
					other: "Jane".into(),
					outgoing: false,
				},
				RelationSummary {
					relation: "received".into(),
					other: "$1.2M".into(),
					outgoing: true,
				},
			]
		);
	}

	#[test]
	fn edge_details_carry_evidence_verbatim() {
		let graph = sample();
		let mut sel = Selection::default();
		sel.apply(ClickTarget::Edge(EdgeIdx(1)));

		let Some(SelectionDetails::Edge(details)) = sel.details(&graph) else {
			panic!("expected edge details");
		};
		assert_eq!(details.source.id, "Acme");
		assert_eq!(details.target.id, "$1.2M");
		assert_eq!(details.target.kind, EntityType::Unknown);
		assert_eq!(details.relation, "received");
		assert_eq!(details.evidence, "Ledger row 17");
	}

	#[test]
	fn stale_index_yields_no_details() {
		let graph = sample();
		let mut sel = Selection::default();
		sel.apply(ClickTarget::Node(NodeIdx(99)));
		assert_eq!(sel.details(&graph), None);
		assert_eq!(Selection::None.details(&graph), None);
	}

	fn click() -> impl Strategy<Value = ClickTarget> {
		prop_oneof![
			(0usize..5).prop_map(|i| ClickTarget::Node(NodeIdx(i))),
			(0usize..5).prop_map(|i| ClickTarget::Edge(EdgeIdx(i))),
			Just(ClickTarget::Background),
		]
	}

	proptest! {
		#[test]
		fn last_click_decides_selection(clicks in prop::collection::vec(click(), 1..40)) {
			let mut sel = Selection::default();
			for c in &clicks {
				sel.apply(*c);
				prop_assert!(sel.node().is_none() || sel.edge().is_none());
			}
			match clicks.last() {
				Some(ClickTarget::Node(idx)) => prop_assert_eq!(sel.node(), Some(*idx)),
				Some(ClickTarget::Edge(idx)) => prop_assert_eq!(sel.edge(), Some(*idx)),
				_ => prop_assert_eq!(sel, Selection::None),
			}
		}
	}
}
