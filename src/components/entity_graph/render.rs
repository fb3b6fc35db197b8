use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::state::{EntityGraphState, self_loop_circle};
use super::style::{EDGE_COLOR, HOVER_STROKE, LABEL_COLOR, glyph, node_color, truncate_label};
use super::types::{EdgeIdx, NodeIdx};

const BACKGROUND: &str = "#f8fafc";
const ARROW_SIZE: f64 = 8.0;
const LABEL_OFFSET: f64 = 30.0;

pub fn render(state: &EntityGraphState, ctx: &CanvasRenderingContext2d) {
	let (width, height) = state.viewport.size();
	let t = state.viewport.transform();
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, width, height);
	if state.sim.graph().is_empty() {
		return;
	}
	ctx.save();
	let _ = ctx.translate(t.x, t.y);
	let _ = ctx.scale(t.k, t.k);
	draw_edges(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
}

fn draw_edges(state: &EntityGraphState, ctx: &CanvasRenderingContext2d) {
	let nodes = state.sim.nodes();
	let radius = state.render.node_radius;
	let selected = state.selection.edge();

	for (i, edge) in state.sim.edges().iter().enumerate() {
		let idx = EdgeIdx(i);
		let emphasized = selected == Some(idx) || state.is_hovered_edge(idx);
		let (alpha, width) = if emphasized { (0.9, 2.5) } else { (0.4, 1.5) };
		ctx.set_global_alpha(alpha);
		ctx.set_stroke_style_str(EDGE_COLOR);
		ctx.set_fill_style_str(EDGE_COLOR);
		ctx.set_line_width(width);

		let (source, target) = (&nodes[edge.source.0], &nodes[edge.target.0]);
		if edge.is_self_loop() {
			let (cx, cy, r) = self_loop_circle(source, radius);
			ctx.begin_path();
			let _ = ctx.arc(cx, cy, r, 0.0, 2.0 * PI);
			ctx.stroke();
			continue;
		}

		let segment = edge_segment((source.x(), source.y()), (target.x(), target.y()), radius);
		ctx.begin_path();
		ctx.move_to(segment.start.0, segment.start.1);
		ctx.line_to(segment.end.0, segment.end.1);
		ctx.stroke();

		if let Some([tip, left, right]) = segment.arrow {
			ctx.begin_path();
			ctx.move_to(tip.0, tip.1);
			ctx.line_to(left.0, left.1);
			ctx.line_to(right.0, right.1);
			ctx.close_path();
			ctx.fill();
		}
	}
	ctx.set_global_alpha(1.0);
}

/// Line and optional arrowhead for a directed edge between two node centers.
#[derive(Debug, PartialEq)]
struct EdgeSegment {
	start: (f64, f64),
	end: (f64, f64),
	/// Tip and the two back corners.
	arrow: Option<[(f64, f64); 3]>,
}

/// Trims the line to the node rims. When the circles touch or overlap
/// there is no room for an arrowhead, so the bare center line is kept.
fn edge_segment(from: (f64, f64), to: (f64, f64), radius: f64) -> EdgeSegment {
	let (dx, dy) = (to.0 - from.0, to.1 - from.1);
	let dist = (dx * dx + dy * dy).sqrt();
	if dist <= radius * 2.0 {
		return EdgeSegment {
			start: from,
			end: to,
			arrow: None,
		};
	}
	let (ux, uy) = (dx / dist, dy / dist);
	let tip = (to.0 - ux * radius, to.1 - uy * radius);
	let back = (tip.0 - ux * ARROW_SIZE, tip.1 - uy * ARROW_SIZE);
	let (px, py) = (-uy * ARROW_SIZE * 0.5, ux * ARROW_SIZE * 0.5);
	EdgeSegment {
		start: (from.0 + ux * radius, from.1 + uy * radius),
		end: back,
		arrow: Some([tip, (back.0 + px, back.1 + py), (back.0 - px, back.1 - py)]),
	}
}

fn draw_nodes(state: &EntityGraphState, ctx: &CanvasRenderingContext2d) {
	let radius = state.render.node_radius;
	let selected = state.selection.node();
	ctx.set_text_align("center");

	for (i, node) in state.sim.nodes().iter().enumerate() {
		let idx = NodeIdx(i);
		let (x, y) = (node.x(), node.y());

		ctx.begin_path();
		let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(node_color(node.kind));
		ctx.fill();
		if state.is_hovered_node(idx) || node.is_pinned() {
			ctx.set_stroke_style_str(HOVER_STROKE);
			ctx.set_line_width(3.0);
		} else {
			ctx.set_stroke_style_str("#ffffff");
			ctx.set_line_width(2.0);
		}
		ctx.stroke();

		if selected == Some(idx) {
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(4.0),
				&JsValue::from_f64(3.0),
			));
			ctx.begin_path();
			let _ = ctx.arc(x, y, radius + 5.0, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str(HOVER_STROKE);
			ctx.set_line_width(1.5);
			ctx.stroke();
			let _ = ctx.set_line_dash(&js_sys::Array::new());
		}

		ctx.set_text_baseline("middle");
		ctx.set_fill_style_str("#ffffff");
		ctx.set_font("bold 12px sans-serif");
		let _ = ctx.fill_text(glyph(node.kind), x, y);

		ctx.set_text_baseline("alphabetic");
		ctx.set_fill_style_str(LABEL_COLOR);
		ctx.set_font("600 10px sans-serif");
		let label = truncate_label(&node.id, state.render.label_max_chars);
		let _ = ctx.fill_text(&label, x, y + LABEL_OFFSET);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn separated_nodes_get_trimmed_line_and_arrow() {
		let segment = edge_segment((0.0, 0.0), (100.0, 0.0), 16.0);
		assert_eq!(segment.start, (16.0, 0.0));
		assert_eq!(segment.end, (84.0 - ARROW_SIZE, 0.0));
		let [tip, left, right] = segment.arrow.unwrap();
		assert_eq!(tip, (84.0, 0.0));
		assert_eq!(left, (76.0, 4.0));
		assert_eq!(right, (76.0, -4.0));
	}

	#[test]
	fn overlapping_nodes_still_draw_the_edge() {
		let segment = edge_segment((0.0, 0.0), (20.0, 0.0), 16.0);
		assert_eq!(segment.start, (0.0, 0.0));
		assert_eq!(segment.end, (20.0, 0.0));
		assert!(segment.arrow.is_none());

		let stacked = edge_segment((5.0, 5.0), (5.0, 5.0), 16.0);
		assert!(stacked.start.0.is_finite() && stacked.end.1.is_finite());
	}
}
