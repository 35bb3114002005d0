//! `svgproj` re-projects map artwork drawn in SVG documents.
//!
//! An input drawing whose geometry is laid out on a plain longitude/latitude grid is read,
//! matching elements are pushed through a cartographic projection and the result is written
//! into the layers of an output drawing. Grids, lines, symbols and labels can be added along
//! the way.
//!
//! Work is described by TOML configuration files holding resources (styles, matches,
//! projections, units, rectangles, symbol libraries, strings) and maps. A map names an input
//! and an output file, a projection, a viewport and an ordered list of commands.
//!
//! # Usage
//!
//! 1. Load one or more configuration files into a [`Mapper`] with [`Mapper::load`];
//! 2. Run the maps on the run list with [`Mapper::run`], or a single one with
//!    [`Mapper::run_map`].
//!
//! Resources are looked up through a chain of scopes, the map's own first, then the global
//! one (see [`registry`]). Every point goes through a three stage [`Pipeline`]: input document
//! to world radians, projection, projected plane to output document.
//!
//! ## Projections
//!
//! Fifteen projection classes are available, see [`ProjectionClass`]. Each can be re-centred
//! on an oblique pole and rotated.
//!
//! ## Diagnostics
//!
//! Nothing in the library writes to the console. Progress, warnings and failures are handed to
//! a [`Diagnostics`](diagnostics::Diagnostics) sink; the `svgproj` binary forwards them to
//! `tracing`.
//!
//! # Example
//!
//! ```
//! use approx::assert_relative_eq;
//! use svgproj::{Mode, Pipeline, Projection, ProjectionClass, Rectangle, Viewport};
//!
//! // A 360 by 180 drawing of the whole world, drawn again with the sinusoidal projection.
//! let pipeline = Pipeline::new(
//!     &Projection::from_class(ProjectionClass::Sinusoidal),
//!     Rectangle::new(0.0, 0.0, 360.0, 180.0),
//!     Rectangle::new(-180.0, -90.0, 180.0, 90.0),
//!     Mode::Keep,
//!     Viewport::default(),
//! )
//! .unwrap();
//!
//! // The center of the world stays put; meridians converge towards the poles.
//! let (x, y) = pipeline.project(180.0, 90.0);
//! assert_relative_eq!(x, 180.0, epsilon = 1e-9);
//! assert_relative_eq!(y, 90.0, epsilon = 1e-9);
//! let (x, _) = pipeline.project(270.0, 30.0);
//! assert!(x < 270.0);
//! ```

pub mod commands;
pub mod config;
pub mod diagnostics;
mod error;
mod geo_types;
pub mod geometry;
mod lazy;
pub mod map;
pub mod mapper;
pub mod projection;
pub mod registry;
pub mod resources;
mod transform;

pub use crate::error::{MapperError, Result};
pub use crate::geometry::{Rectangle, Unit};
pub use crate::map::{Canvas, Map};
pub use crate::mapper::{Mapper, Summary};
pub use crate::projection::{Projection, ProjectionClass, Projector};
pub use crate::registry::{Ref, ResourceKind, Scope};
pub use crate::transform::{Coord, Mode, Pipeline, Stage, Transform, Viewport};
