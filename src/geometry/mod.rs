//! Geometry primitives: rectangles, distance units, path data, and angle formatting.

mod dms;
pub mod path;
mod rectangle;
mod unit;

pub use dms::{Dms, to_dms};
pub use rectangle::Rectangle;
pub use unit::Unit;
