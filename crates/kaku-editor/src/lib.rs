pub mod bindings;
pub mod canvas;
pub mod connector;
pub mod error;
pub mod input;
pub mod proximity;
pub mod scene;
pub mod subscriptions;
pub mod surface;
pub mod tools;

pub use canvas::{Canvas, CanvasMutation, HandleHit, SceneSnapshot};
pub use connector::{ConnectorController, ConnectorGeometry};
pub use error::ConnectorError;
pub use input::InputEvent;
pub use proximity::{Candidate, CandidateShape, Proximity, ProximityBinder};
pub use scene::{Scene, ShapeKind, ShapeRecord};
pub use subscriptions::SubscriptionTable;
pub use surface::{Host, Surface};
pub use tools::{ArrowTool, HandleTool, Tool, ToolKind};
