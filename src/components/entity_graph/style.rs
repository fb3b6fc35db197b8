use std::borrow::Cow;

use super::types::EntityType;

pub const NEUTRAL_GRAY: &str = "#cbd5e1";
pub const EDGE_COLOR: &str = "#94a3b8";
pub const LABEL_COLOR: &str = "#475569";
pub const HOVER_STROKE: &str = "#1e293b";

#[derive(Clone, Debug, PartialEq)]
pub struct RenderConfig {
	pub node_radius: f64,
	/// Pick radius around a node center, in graph units.
	pub hit_radius: f64,
	/// Width of the clickable band around an edge, in graph units.
	pub edge_hit_width: f64,
	pub label_max_chars: usize,
}

impl Default for RenderConfig {
	fn default() -> Self {
		Self {
			node_radius: 16.0,
			hit_radius: 16.0,
			edge_hit_width: 10.0,
			label_max_chars: 15,
		}
	}
}

pub fn node_color(kind: EntityType) -> &'static str {
	match kind {
		EntityType::Person => "#B07CFF",
		EntityType::Organization => "#5AB7FF",
		EntityType::Money => "#4FF2D8",
		EntityType::Location => "#F59E0B",
		EntityType::Document => "#94a3b8",
		EntityType::Product | EntityType::Unknown => NEUTRAL_GRAY,
	}
}

/// One-letter mark drawn inside a node and on the detail panel.
pub fn glyph(kind: EntityType) -> &'static str {
	match kind {
		EntityType::Person => "P",
		EntityType::Organization => "O",
		EntityType::Money => "$",
		EntityType::Location => "L",
		EntityType::Document => "D",
		EntityType::Product => "B",
		EntityType::Unknown => "?",
	}
}

/// Names longer than `max_chars` keep `max_chars - 3` characters plus "...".
pub fn truncate_label(name: &str, max_chars: usize) -> Cow<'_, str> {
	if name.chars().count() <= max_chars {
		return Cow::Borrowed(name);
	}
	let kept: String = name.chars().take(max_chars.saturating_sub(3)).collect();
	Cow::Owned(kept + "...")
}
