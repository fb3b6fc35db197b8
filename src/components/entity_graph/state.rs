use log::debug;

use super::selection::{ClickTarget, Selection, SelectionDetails};
use super::simulation::{Simulation, SimulationConfig, SimulationPhase};
use super::style::RenderConfig;
use super::types::{EdgeIdx, GraphData, Node, NodeIdx};
use super::viewport::{Viewport, ViewportConfig};

/// Pointer travel, in pixels, below which a press and release is a click.
pub const CLICK_SLOP: f64 = 3.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HoverTarget {
	Node(NodeIdx),
	Edge(EdgeIdx),
}

/// How the current pointer gesture is interpreted, fixed when it starts.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum GestureMode {
	#[default]
	Idle,
	DragNode {
		idx: NodeIdx,
		start_x: f64,
		start_y: f64,
		/// Node position minus the grabbed graph point, fixed at press.
		offset_x: f64,
		offset_y: f64,
		moved: bool,
	},
	Pan {
		start_x: f64,
		start_y: f64,
		moved: bool,
	},
	Pinch {
		last_distance: f64,
	},
}

/// Circle a self-loop is drawn on, in graph space: `(cx, cy, r)`.
pub fn self_loop_circle(node: &Node, node_radius: f64) -> (f64, f64, f64) {
	let r = node_radius * 0.7;
	(node.x(), node.y() - node_radius - r * 0.5, r)
}

fn distance_to_segment(px: f64, py: f64, (x1, y1): (f64, f64), (x2, y2): (f64, f64)) -> f64 {
	let (dx, dy) = (x2 - x1, y2 - y1);
	let len2 = dx * dx + dy * dy;
	let t = if len2 > 0.0 {
		(((px - x1) * dx + (py - y1) * dy) / len2).clamp(0.0, 1.0)
	} else {
		0.0
	};
	let (cx, cy) = (x1 + t * dx, y1 + t * dy);
	((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
}

/// Everything one graph view owns: layout arena, viewport, selection,
/// hover and the gesture in progress.
pub struct EntityGraphState {
	pub sim: Simulation,
	pub viewport: Viewport,
	pub selection: Selection,
	pub hover: Option<HoverTarget>,
	pub render: RenderConfig,
	gesture: GestureMode,
	phase: SimulationPhase,
}

impl EntityGraphState {
	pub fn new(graph: GraphData, config: SimulationConfig, width: f64, height: f64) -> Self {
		Self {
			sim: Simulation::new(graph, config),
			viewport: Viewport::new(width, height, ViewportConfig::default()),
			selection: Selection::default(),
			hover: None,
			render: RenderConfig::default(),
			gesture: GestureMode::Idle,
			phase: SimulationPhase::ColdStart,
		}
	}

	pub fn gesture(&self) -> GestureMode {
		self.gesture
	}

	fn set_gesture(&mut self, gesture: GestureMode) {
		debug!("gesture: {gesture:?}");
		self.gesture = gesture;
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<NodeIdx> {
		let (gx, gy) = self.viewport.transform().screen_to_graph(sx, sy);
		self.sim
			.nodes()
			.iter()
			.enumerate()
			.filter_map(|(i, node)| {
				let d = ((node.x() - gx).powi(2) + (node.y() - gy).powi(2)).sqrt();
				(d <= self.render.hit_radius).then_some((NodeIdx(i), d))
			})
			.min_by(|a, b| a.1.total_cmp(&b.1))
			.map(|(idx, _)| idx)
	}

	pub fn edge_at_position(&self, sx: f64, sy: f64) -> Option<EdgeIdx> {
		let (gx, gy) = self.viewport.transform().screen_to_graph(sx, sy);
		let half_width = self.render.edge_hit_width / 2.0;
		let nodes = self.sim.nodes();
		self.sim
			.edges()
			.iter()
			.enumerate()
			.filter_map(|(i, edge)| {
				let (source, target) = (&nodes[edge.source.0], &nodes[edge.target.0]);
				let d = if edge.is_self_loop() {
					let (cx, cy, r) = self_loop_circle(source, self.render.node_radius);
					(((gx - cx).powi(2) + (gy - cy).powi(2)).sqrt() - r).abs()
				} else {
					distance_to_segment(
						gx,
						gy,
						(source.x(), source.y()),
						(target.x(), target.y()),
					)
				};
				(d <= half_width).then_some((EdgeIdx(i), d))
			})
			.min_by(|a, b| a.1.total_cmp(&b.1))
			.map(|(idx, _)| idx)
	}

	/// Nodes take precedence over edges, edges over the background.
	pub fn hit_test(&self, sx: f64, sy: f64) -> ClickTarget {
		if let Some(idx) = self.node_at_position(sx, sy) {
			ClickTarget::Node(idx)
		} else if let Some(idx) = self.edge_at_position(sx, sy) {
			ClickTarget::Edge(idx)
		} else {
			ClickTarget::Background
		}
	}

	pub fn pointer_down(&mut self, sx: f64, sy: f64) {
		self.end_gesture();
		if let Some(idx) = self.node_at_position(sx, sy) {
			let Some(node) = self.sim.node(idx) else {
				return;
			};
			let (nx, ny) = (node.x(), node.y());
			let (gx, gy) = self.viewport.transform().screen_to_graph(sx, sy);
			self.sim.pin(idx, nx, ny);
			self.sim.set_alpha_target(self.sim.config().drag_alpha_target);
			self.sim.restart();
			self.set_gesture(GestureMode::DragNode {
				idx,
				start_x: sx,
				start_y: sy,
				offset_x: nx - gx,
				offset_y: ny - gy,
				moved: false,
			});
		} else {
			self.viewport.begin_pan(sx, sy);
			self.set_gesture(GestureMode::Pan {
				start_x: sx,
				start_y: sy,
				moved: false,
			});
		}
	}

	pub fn pointer_move(&mut self, sx: f64, sy: f64) {
		if self.gesture == GestureMode::Idle {
			self.hover = match self.hit_test(sx, sy) {
				ClickTarget::Node(idx) => Some(HoverTarget::Node(idx)),
				ClickTarget::Edge(idx) => Some(HoverTarget::Edge(idx)),
				ClickTarget::Background => None,
			};
			return;
		}
		match &mut self.gesture {
			GestureMode::Idle | GestureMode::Pinch { .. } => {}
			GestureMode::DragNode {
				idx,
				start_x,
				start_y,
				offset_x,
				offset_y,
				moved,
			} => {
				if ((sx - *start_x).powi(2) + (sy - *start_y).powi(2)).sqrt() > CLICK_SLOP {
					*moved = true;
				}
				let (gx, gy) = self.viewport.transform().screen_to_graph(sx, sy);
				let (x, y) = (gx + *offset_x, gy + *offset_y);
				let idx = *idx;
				self.sim.pin(idx, x, y);
			}
			GestureMode::Pan {
				start_x,
				start_y,
				moved,
			} => {
				if ((sx - *start_x).powi(2) + (sy - *start_y).powi(2)).sqrt() > CLICK_SLOP {
					*moved = true;
				}
				self.viewport.pan_to(sx, sy);
			}
		}
	}

	/// Finish the gesture. A press that never moved counts as a click on
	/// whatever was under its start point. Returns whether the selection
	/// changed.
	pub fn pointer_up(&mut self) -> bool {
		let before = self.selection;
		match std::mem::take(&mut self.gesture) {
			GestureMode::DragNode { idx, moved, .. } => {
				self.release_node(idx);
				if !moved {
					self.selection.apply(ClickTarget::Node(idx));
				}
			}
			GestureMode::Pan {
				start_x,
				start_y,
				moved,
			} => {
				self.viewport.end_pan();
				if !moved {
					let target = self.hit_test(start_x, start_y);
					self.selection.apply(target);
				}
			}
			GestureMode::Pinch { .. } | GestureMode::Idle => {}
		}
		self.selection != before
	}

	/// Pointer left the surface: drop any gesture without clicking.
	pub fn pointer_leave(&mut self) {
		self.end_gesture();
		self.hover = None;
	}

	fn end_gesture(&mut self) {
		match std::mem::take(&mut self.gesture) {
			GestureMode::DragNode { idx, .. } => self.release_node(idx),
			GestureMode::Pan { .. } => self.viewport.end_pan(),
			GestureMode::Pinch { .. } | GestureMode::Idle => {}
		}
	}

	fn release_node(&mut self, idx: NodeIdx) {
		self.sim.unpin(idx);
		self.sim.set_alpha_target(0.0);
	}

	pub fn begin_pinch(&mut self, a: (f64, f64), b: (f64, f64)) {
		self.end_gesture();
		let last_distance = ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt();
		self.set_gesture(GestureMode::Pinch { last_distance });
	}

	/// Zoom by the change in finger spread, anchored at the midpoint.
	pub fn pinch_to(&mut self, a: (f64, f64), b: (f64, f64)) {
		let GestureMode::Pinch { last_distance } = &mut self.gesture else {
			return;
		};
		let distance = ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt();
		if *last_distance > 0.0 && distance > 0.0 {
			let factor = distance / *last_distance;
			self.viewport
				.zoom_at((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0, factor);
		}
		*last_distance = distance;
	}

	pub fn wheel(&mut self, sx: f64, sy: f64, delta_y: f64) {
		self.viewport.wheel(sx, sy, delta_y);
	}

	pub fn reset_view(&mut self) {
		self.viewport.reset();
	}

	pub fn clear_selection(&mut self) {
		self.selection.clear();
	}

	pub fn selection_details(&self) -> Option<SelectionDetails> {
		self.selection.details(self.sim.graph())
	}

	pub fn is_hovered_node(&self, idx: NodeIdx) -> bool {
		self.hover == Some(HoverTarget::Node(idx))
	}

	pub fn is_hovered_edge(&self, idx: EdgeIdx) -> bool {
		self.hover == Some(HoverTarget::Edge(idx))
	}

	/// One frame: a simulation step plus any view animation. Returns
	/// whether anything moved.
	pub fn tick(&mut self, now_ms: f64) -> bool {
		let moved = self.sim.tick();
		let phase = self.sim.phase();
		if phase != self.phase {
			debug!(
				"layout {:?} -> {:?} (alpha {:.3})",
				self.phase,
				phase,
				self.sim.alpha()
			);
			self.phase = phase;
		}
		let animated = self.viewport.advance(now_ms);
		moved || animated
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.viewport.resize(width, height);
	}

	/// Halt the layout for good; used when the view is torn down.
	pub fn stop(&mut self) {
		self.end_gesture();
		self.sim.stop();
	}
}
