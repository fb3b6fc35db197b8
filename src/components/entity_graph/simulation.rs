//! Force-directed layout over an arena of nodes.
//!
//! One [`Simulation::tick`] applies link, many-body, centering and collision
//! forces scaled by a decaying `alpha`, then integrates velocities. The
//! simulation goes idle once `alpha` falls under `alpha_min`; raising the
//! alpha target (e.g. while a node is dragged) and calling
//! [`Simulation::restart`] wakes it up again.

use std::f64::consts::PI;

use log::debug;
use serde::{Deserialize, Serialize};

use super::types::{Edge, GraphData, Node, NodeIdx};

const INITIAL_RADIUS: f64 = 10.0;
const DISTANCE_MIN2: f64 = 1.0;
const SETTLE_ALPHA: f64 = 0.1;

/// Tuning knobs for the layout forces and the cooling schedule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
	/// Rest length of a link.
	pub link_distance: f64,
	/// Spring coefficient, divided per link by the smaller endpoint degree.
	pub link_strength: f64,
	/// Many-body charge; negative repels.
	pub charge_strength: f64,
	/// Fraction of the centroid offset removed per tick.
	pub center_strength: f64,
	/// Collision radius of every node.
	pub collide_radius: f64,
	/// How much of an overlap is resolved per tick.
	pub collide_strength: f64,
	/// Alpha below which the layout stops ticking.
	pub alpha_min: f64,
	/// Fraction of the gap to the alpha target closed per tick.
	pub alpha_decay: f64,
	/// Alpha target while a node is being dragged.
	pub drag_alpha_target: f64,
	/// Fraction of velocity lost per tick.
	pub velocity_decay: f64,
}

impl Default for SimulationConfig {
	fn default() -> Self {
		let alpha_min = 0.001;
		Self {
			link_distance: 150.0,
			link_strength: 1.0,
			charge_strength: -500.0,
			center_strength: 1.0,
			collide_radius: 40.0,
			collide_strength: 0.7,
			alpha_min,
			alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
			drag_alpha_target: 0.3,
			velocity_decay: 0.4,
		}
	}
}

impl SimulationConfig {
	/// Override [`SimulationConfig::link_distance`].
	pub fn with_link_distance(mut self, distance: f64) -> Self {
		self.link_distance = distance;
		self
	}

	/// Override [`SimulationConfig::charge_strength`].
	pub fn with_charge_strength(mut self, strength: f64) -> Self {
		self.charge_strength = strength;
		self
	}

	/// Override [`SimulationConfig::center_strength`].
	pub fn with_center_strength(mut self, strength: f64) -> Self {
		self.center_strength = strength;
		self
	}

	/// Override collision radius and strength together.
	pub fn with_collision(mut self, radius: f64, strength: f64) -> Self {
		self.collide_radius = radius;
		self.collide_strength = strength;
		self
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationPhase {
	ColdStart,
	Running,
	Settling,
	AtRest,
}

/// Linear congruential generator used to break exact coincidences.
#[derive(Clone, Debug)]
struct Lcg(u32);

impl Lcg {
	fn next_f64(&mut self) -> f64 {
		self.0 = self.0.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
		f64::from(self.0) / 4_294_967_296.0
	}

	fn jiggle(&mut self) -> f64 {
		(self.next_f64() - 0.5) * 1e-6
	}
}

pub struct Simulation {
	graph: GraphData,
	config: SimulationConfig,
	alpha: f64,
	alpha_target: f64,
	active: bool,
	ticks: u64,
	link_strength: Vec<f64>,
	link_bias: Vec<f64>,
	rng: Lcg,
}

impl Simulation {
	pub fn new(mut graph: GraphData, config: SimulationConfig) -> Self {
		let angle_step = PI * (3.0 - 5f64.sqrt());
		for (i, node) in graph.nodes.iter_mut().enumerate() {
			if node.x.is_nan() || node.y.is_nan() {
				let radius = INITIAL_RADIUS * (0.5 + i as f64).sqrt();
				let angle = i as f64 * angle_step;
				node.x = radius * angle.cos();
				node.y = radius * angle.sin();
			}
			node.vx = 0.0;
			node.vy = 0.0;
			node.pin = None;
		}

		let degrees = graph.degrees();
		let (link_strength, link_bias): (Vec<f64>, Vec<f64>) = graph
			.edges
			.iter()
			.map(|edge| {
				let (ds, dt) = (degrees[edge.source.0] as f64, degrees[edge.target.0] as f64);
				(config.link_strength / ds.min(dt), ds / (ds + dt))
			})
			.unzip();

		Self {
			active: !graph.nodes.is_empty(),
			graph,
			config,
			alpha: 1.0,
			alpha_target: 0.0,
			ticks: 0,
			link_strength,
			link_bias,
			rng: Lcg(1),
		}
	}

	pub fn graph(&self) -> &GraphData {
		&self.graph
	}

	pub fn nodes(&self) -> &[Node] {
		&self.graph.nodes
	}

	pub fn edges(&self) -> &[Edge] {
		&self.graph.edges
	}

	pub fn node(&self, idx: NodeIdx) -> Option<&Node> {
		self.graph.node(idx)
	}

	pub fn config(&self) -> &SimulationConfig {
		&self.config
	}

	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	pub fn phase(&self) -> SimulationPhase {
		if !self.active {
			SimulationPhase::AtRest
		} else if self.ticks == 0 {
			SimulationPhase::ColdStart
		} else if self.alpha_target >= self.config.alpha_min || self.alpha > SETTLE_ALPHA {
			SimulationPhase::Running
		} else {
			SimulationPhase::Settling
		}
	}

	pub fn set_alpha_target(&mut self, target: f64) {
		self.alpha_target = target.max(0.0);
	}

	/// Resume ticking without touching the current alpha.
	pub fn restart(&mut self) {
		if !self.graph.nodes.is_empty() {
			self.active = true;
		}
	}

	pub fn stop(&mut self) {
		self.active = false;
	}

	/// Fix `idx` at `(x, y)`; the position is applied immediately and held
	/// on every tick until [`Simulation::unpin`].
	pub fn pin(&mut self, idx: NodeIdx, x: f64, y: f64) {
		if let Some(node) = self.graph.nodes.get_mut(idx.0) {
			node.pin = Some((x, y));
			node.x = x;
			node.y = y;
			node.vx = 0.0;
			node.vy = 0.0;
		}
	}

	pub fn unpin(&mut self, idx: NodeIdx) {
		if let Some(node) = self.graph.nodes.get_mut(idx.0) {
			node.pin = None;
		}
	}

	/// Advance one step. Returns whether the simulation is still active.
	pub fn tick(&mut self) -> bool {
		if !self.active {
			return false;
		}

		self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
		let alpha = self.alpha;

		self.apply_links(alpha);
		self.apply_charge(alpha);
		self.apply_center();
		self.apply_collide();
		self.integrate();
		self.ticks += 1;

		if self.alpha < self.config.alpha_min {
			self.active = false;
			debug!("layout settled after {} ticks", self.ticks);
		}
		self.active
	}

	fn apply_links(&mut self, alpha: f64) {
		let GraphData { nodes, edges } = &mut self.graph;
		for (i, edge) in edges.iter().enumerate() {
			if edge.is_self_loop() {
				continue;
			}
			let (s, t) = (edge.source.0, edge.target.0);
			let mut dx = nodes[t].x + nodes[t].vx - nodes[s].x - nodes[s].vx;
			let mut dy = nodes[t].y + nodes[t].vy - nodes[s].y - nodes[s].vy;
			if dx == 0.0 {
				dx = self.rng.jiggle();
			}
			if dy == 0.0 {
				dy = self.rng.jiggle();
			}
			let len = (dx * dx + dy * dy).sqrt();
			let l = (len - self.config.link_distance) / len * alpha * self.link_strength[i];
			dx *= l;
			dy *= l;

			let bias = self.link_bias[i];
			nodes[t].vx -= dx * bias;
			nodes[t].vy -= dy * bias;
			nodes[s].vx += dx * (1.0 - bias);
			nodes[s].vy += dy * (1.0 - bias);
		}
	}

	fn apply_charge(&mut self, alpha: f64) {
		let strength = self.config.charge_strength;
		if strength == 0.0 {
			return;
		}
		let nodes = &mut self.graph.nodes;
		for i in 0..nodes.len() {
			for j in (i + 1)..nodes.len() {
				let mut dx = nodes[j].x - nodes[i].x;
				let mut dy = nodes[j].y - nodes[i].y;
				if dx == 0.0 {
					dx = self.rng.jiggle();
				}
				if dy == 0.0 {
					dy = self.rng.jiggle();
				}
				let mut l2 = dx * dx + dy * dy;
				if l2 < DISTANCE_MIN2 {
					l2 = (DISTANCE_MIN2 * l2).sqrt();
				}
				let w = strength * alpha / l2;
				nodes[i].vx += dx * w;
				nodes[i].vy += dy * w;
				nodes[j].vx -= dx * w;
				nodes[j].vy -= dy * w;
			}
		}
	}

	/// Shift every node so the centroid moves toward the origin.
	fn apply_center(&mut self) {
		let nodes = &mut self.graph.nodes;
		if nodes.is_empty() {
			return;
		}
		let n = nodes.len() as f64;
		let (sx, sy) = nodes
			.iter()
			.fold((0.0, 0.0), |(sx, sy), node| (sx + node.x, sy + node.y));
		let strength = self.config.center_strength;
		let (sx, sy) = (sx / n * strength, sy / n * strength);
		for node in nodes.iter_mut() {
			node.x -= sx;
			node.y -= sy;
		}
	}

	fn apply_collide(&mut self) {
		let radius = self.config.collide_radius;
		let strength = self.config.collide_strength;
		if radius <= 0.0 || strength == 0.0 {
			return;
		}
		let min_dist = radius * 2.0;
		let nodes = &mut self.graph.nodes;
		for i in 0..nodes.len() {
			for j in (i + 1)..nodes.len() {
				let mut dx = nodes[i].x + nodes[i].vx - nodes[j].x - nodes[j].vx;
				let mut dy = nodes[i].y + nodes[i].vy - nodes[j].y - nodes[j].vy;
				let mut l = dx * dx + dy * dy;
				if l >= min_dist * min_dist {
					continue;
				}
				if dx == 0.0 {
					dx = self.rng.jiggle();
					l += dx * dx;
				}
				if dy == 0.0 {
					dy = self.rng.jiggle();
					l += dy * dy;
				}
				let len = l.sqrt();
				let k = (min_dist - len) / len * strength;
				dx *= k;
				dy *= k;
				// Equal radii split the correction evenly.
				nodes[i].vx += dx * 0.5;
				nodes[i].vy += dy * 0.5;
				nodes[j].vx -= dx * 0.5;
				nodes[j].vy -= dy * 0.5;
			}
		}
	}

	fn integrate(&mut self) {
		let keep = 1.0 - self.config.velocity_decay;
		for node in &mut self.graph.nodes {
			match node.pin {
				Some((fx, fy)) => {
					node.x = fx;
					node.y = fy;
					node.vx = 0.0;
					node.vy = 0.0;
				}
				None => {
					node.vx *= keep;
					node.vy *= keep;
					node.x += node.vx;
					node.y += node.vy;
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::entity_graph::build::build_graph;
	use crate::components::entity_graph::types::{Entity, EntityType, Relationship};

	fn graph(names: &[&str], links: &[(&str, &str)]) -> GraphData {
		let entities: Vec<Entity> = names
			.iter()
			.map(|n| Entity::new(*n, EntityType::Person, ""))
			.collect();
		let relationships: Vec<Relationship> = links
			.iter()
			.map(|(s, t)| Relationship::new(*s, *t, "knows", ""))
			.collect();
		build_graph(&entities, &relationships)
	}

	fn distance(a: &Node, b: &Node) -> f64 {
		((a.x() - b.x()).powi(2) + (a.y() - b.y()).powi(2)).sqrt()
	}

	fn run(sim: &mut Simulation, ticks: usize) {
		for _ in 0..ticks {
			sim.tick();
		}
	}

	#[test]
	fn initial_positions_are_distinct() {
		let sim = Simulation::new(graph(&["a", "b", "c", "d"], &[]), SimulationConfig::default());
		let nodes = sim.nodes();
		for i in 0..nodes.len() {
			assert!(nodes[i].x().is_finite() && nodes[i].y().is_finite());
			for j in (i + 1)..nodes.len() {
				assert!(distance(&nodes[i], &nodes[j]) > 1.0);
			}
		}
		assert_eq!(sim.phase(), SimulationPhase::ColdStart);
	}

	#[test]
	fn isolated_nodes_spread_apart() {
		let mut sim = Simulation::new(graph(&["a", "b", "c"], &[]), SimulationConfig::default());
		run(&mut sim, 300);
		let nodes = sim.nodes();
		for i in 0..nodes.len() {
			for j in (i + 1)..nodes.len() {
				assert!(distance(&nodes[i], &nodes[j]) > 70.0);
			}
		}
	}

	#[test]
	fn centroid_stays_near_origin() {
		let mut sim = Simulation::new(
			graph(&["a", "b", "c", "d", "e"], &[("a", "b"), ("b", "c"), ("d", "e")]),
			SimulationConfig::default(),
		);
		run(&mut sim, 200);
		let n = sim.nodes().len() as f64;
		let cx: f64 = sim.nodes().iter().map(Node::x).sum::<f64>() / n;
		let cy: f64 = sim.nodes().iter().map(Node::y).sum::<f64>() / n;
		assert!(cx.abs() < 1.0 && cy.abs() < 1.0, "centroid drifted to ({cx}, {cy})");
	}

	#[test]
	fn collision_separates_overlapping_nodes() {
		let config = SimulationConfig::default()
			.with_charge_strength(0.0)
			.with_center_strength(0.0);
		let mut sim = Simulation::new(graph(&["a", "b"], &[]), config);
		sim.pin(NodeIdx(0), 0.0, 0.0);
		sim.pin(NodeIdx(1), 5.0, 0.0);
		sim.unpin(NodeIdx(0));
		sim.unpin(NodeIdx(1));
		run(&mut sim, 200);
		assert!(distance(&sim.nodes()[0], &sim.nodes()[1]) > 70.0);
	}

	#[test]
	fn link_pulls_distant_pair_together() {
		let config = SimulationConfig::default().with_charge_strength(0.0);
		let mut sim = Simulation::new(graph(&["a", "b"], &[("a", "b")]), config);
		sim.pin(NodeIdx(0), -500.0, 0.0);
		sim.pin(NodeIdx(1), 500.0, 0.0);
		sim.unpin(NodeIdx(0));
		sim.unpin(NodeIdx(1));
		run(&mut sim, 300);
		let d = distance(&sim.nodes()[0], &sim.nodes()[1]);
		assert!((d - 150.0).abs() < 10.0, "link rest length drifted to {d}");
	}

	#[test]
	fn simulation_cools_to_rest() {
		let mut sim = Simulation::new(graph(&["a", "b"], &[("a", "b")]), SimulationConfig::default());
		let mut ticks = 0;
		while sim.tick() {
			ticks += 1;
			assert!(ticks < 400, "simulation never settled");
		}
		assert_eq!(sim.phase(), SimulationPhase::AtRest);
		assert!(sim.alpha() < sim.config().alpha_min);

		let before: Vec<(f64, f64)> = sim.nodes().iter().map(|n| (n.x(), n.y())).collect();
		assert!(!sim.tick());
		let after: Vec<(f64, f64)> = sim.nodes().iter().map(|n| (n.x(), n.y())).collect();
		assert_eq!(before, after);
	}

	#[test]
	fn pinned_node_holds_position_exactly() {
		let mut sim = Simulation::new(
			graph(&["a", "b", "c"], &[("a", "b"), ("a", "c")]),
			SimulationConfig::default(),
		);
		sim.pin(NodeIdx(0), 42.5, -17.25);
		for _ in 0..50 {
			sim.tick();
			let node = &sim.nodes()[0];
			assert_eq!((node.x(), node.y()), (42.5, -17.25));
			assert!(node.is_pinned());
		}

		sim.unpin(NodeIdx(0));
		sim.set_alpha_target(0.3);
		sim.restart();
		sim.tick();
		sim.tick();
		let node = &sim.nodes()[0];
		assert!(!node.is_pinned());
		assert_ne!((node.x(), node.y()), (42.5, -17.25));
	}

	#[test]
	fn drag_alpha_target_reheats_settled_layout() {
		let mut sim = Simulation::new(graph(&["a", "b"], &[("a", "b")]), SimulationConfig::default());
		while sim.tick() {}
		assert_eq!(sim.phase(), SimulationPhase::AtRest);

		sim.set_alpha_target(0.3);
		sim.restart();
		run(&mut sim, 100);
		assert_eq!(sim.phase(), SimulationPhase::Running);
		assert!(sim.alpha() > 0.2);

		sim.set_alpha_target(0.0);
		let mut ticks = 0;
		while sim.tick() {
			ticks += 1;
			assert!(ticks < 400);
		}
		assert_eq!(sim.phase(), SimulationPhase::AtRest);
	}

	#[test]
	fn stopped_simulation_does_not_tick() {
		let mut sim = Simulation::new(graph(&["a"], &[]), SimulationConfig::default());
		sim.stop();
		assert!(!sim.tick());
		assert_eq!(sim.phase(), SimulationPhase::AtRest);
	}

	#[test]
	fn empty_graph_is_at_rest() {
		let mut sim = Simulation::new(GraphData::default(), SimulationConfig::default());
		assert!(!sim.tick());
		sim.restart();
		assert_eq!(sim.phase(), SimulationPhase::AtRest);
	}

	#[test]
	fn self_loops_and_parallel_edges_stay_finite() {
		let mut sim = Simulation::new(
			graph(&["a", "b"], &[("a", "a"), ("a", "b"), ("a", "b")]),
			SimulationConfig::default(),
		);
		run(&mut sim, 300);
		for node in sim.nodes() {
			assert!(node.x().is_finite() && node.y().is_finite());
		}
	}

	#[test]
	fn config_deserializes_with_defaults_for_missing_fields() {
		let config: SimulationConfig = serde_json::from_str(r#"{"link_distance": 90}"#).unwrap();
		assert_eq!(config, SimulationConfig::default().with_link_distance(90.0));

		let empty: SimulationConfig = serde_json::from_str("{}").unwrap();
		assert_eq!(empty, SimulationConfig::default());
	}

	#[test]
	fn stop_freezes_layout() {
		let mut sim = Simulation::new(
			graph(&["a", "b"], &[("a", "b")]),
			SimulationConfig::default(),
		);
		sim.tick();
		sim.stop();
		let before: Vec<_> = sim.nodes().iter().map(|n| (n.x(), n.y())).collect();
		assert!(!sim.tick());
		let after: Vec<_> = sim.nodes().iter().map(|n| (n.x(), n.y())).collect();
		assert_eq!(before, after);
	}
}
