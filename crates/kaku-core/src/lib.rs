pub mod arrowhead;
pub mod config;
pub mod geom;
pub mod id;
pub mod model;
pub mod path;

pub use arrowhead::{ArrowHead, HeadPrimitive, cutoff_distance, generate_head};
pub use config::{ConnectorConfig, HighlightConfig};
pub use geom::Quad;
pub use id::ShapeId;
pub use model::*;

// Re-export kurbo so downstream crates share one geometry vocabulary
pub use kurbo;
