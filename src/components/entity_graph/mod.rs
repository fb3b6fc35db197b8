mod build;
mod component;
mod details;
mod render;
mod selection;
mod simulation;
mod state;
mod style;
mod types;
mod viewport;

pub use build::build_graph;
pub use component::EntityGraphCanvas;
pub use simulation::SimulationConfig;
pub use types::{Entity, EntityType, GraphData, Relationship};
