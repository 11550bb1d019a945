pub mod paint;

pub use paint::{Drawable, paint_canvas, paint_connector, paint_shape};
