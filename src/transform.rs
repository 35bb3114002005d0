//! The coordinate pipeline of one map.
//!
//! Three stages, each a pure function of a point:
//!
//! 1. input document to world radians, an affine map that also flips the downward y-axis
//! 2. world radians to the projected plane, through the map's [`Projector`]
//! 3. projected plane to output document, scaled and anchored so the center of the world lands
//!    on the configured output center
//!
//! [`Pipeline::project`] runs all three; [`Pipeline::project_inner`] starts at stage 2 and is
//! used for geometry built directly in world coordinates.

use crate::error::{MapperError, Result};
use crate::geometry::Rectangle;
use crate::projection::{Projection, Projector};
use kurbo::BezPath;
use num_traits::Float;
use std::fmt;
use std::str::FromStr;

/// What happens to geometry that falls outside the map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Everything is projected as is.
    #[default]
    Keep,
    /// Elements entirely outside the input rectangle are dropped by the commands.
    Clip,
    /// As `Clip`, and coordinates are clamped to the world rectangle before projecting.
    Crop,
}

impl FromStr for Mode {
    type Err = MapperError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "keep" => Ok(Mode::Keep),
            "clip" => Ok(Mode::Clip),
            "crop" => Ok(Mode::Crop),
            _ => Err(MapperError::invalid("Mode::from_str", "mode", s)),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Keep => "keep",
            Mode::Clip => "clip",
            Mode::Crop => "crop",
        })
    }
}

/// Which stages a point goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Input document coordinates, all three stages.
    Full,
    /// World radians, projection and output stages only.
    Inner,
}

/// A 2D point type the pipeline can read and rebuild.
pub trait Coord<T>
where
    T: Float,
{
    fn x(&self) -> T;
    fn y(&self) -> T;
    fn from_xy(x: T, y: T) -> Self;
}

/// Project a geometry through a [`Pipeline`].
pub trait Transform<T> {
    type Output;

    /// Project the geometry in place.
    fn transform(&mut self, pipeline: &Pipeline, stage: Stage);

    /// Immutable flavor of [`Transform::transform`], which allocates a new geometry.
    fn transformed(&self, pipeline: &Pipeline, stage: Stage) -> Self::Output;
}

/// Where the output stage anchors the map and how much it scales it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Viewport {
    /// Output point that the center of the world maps to. Defaults to the input center.
    pub center: Option<(f64, f64)>,
    /// Output units per projected unit. Defaults to the inverse of the input scale.
    pub scale: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    pub rect_in: Rectangle,
    pub rect_world: Rectangle,
    pub rect_world_rad: Rectangle,
    pub mode: Mode,
    projector: Projector,
    dx_in: f64,
    dy_in: f64,
    x0_in: f64,
    y0_in: f64,
    d_out: f64,
    x_out0: f64,
    y_out0: f64,
    x_out1: f64,
    y_out1: f64,
}

impl Pipeline {
    /// Build the pipeline for `rect_in` (document units) showing `rect_world` (degrees).
    ///
    /// Both rectangles are oriented first: the input one with a downward y-axis.
    pub fn new(
        projection: &Projection,
        mut rect_in: Rectangle,
        mut rect_world: Rectangle,
        mode: Mode,
        viewport: Viewport,
    ) -> Result<Self> {
        const OP: &str = "Pipeline::new";
        rect_in.orient(true);
        rect_world.orient(false);
        if rect_in.width() == 0.0 || rect_in.height() == 0.0 {
            return Err(MapperError::invalid(OP, "rect-in", &rect_in));
        }
        if rect_world.width() == 0.0 || rect_world.height() == 0.0 {
            return Err(MapperError::invalid(OP, "rect-world", &rect_world));
        }
        let mut rect_world_rad = rect_world.copy();
        rect_world_rad.scale(std::f64::consts::PI / 180.0);
        let projector = projection.initialize(&rect_world_rad)?;

        let dx_in = rect_world_rad.width() / rect_in.width();
        let dy_in = rect_world_rad.height() / rect_in.height();
        let x0_in = rect_world_rad.x0 - rect_in.x0 * dx_in;
        let y0_in = rect_world_rad.y0 - rect_in.y0 * dy_in;

        let (x_out1, y_out1) = viewport.center.unwrap_or_else(|| rect_in.center());
        let d_out = match viewport.scale {
            Some(s) if s > 0.0 && s.is_finite() => s,
            Some(s) => return Err(MapperError::invalid(OP, "scale", s)),
            None => 2.0 / (dx_in.abs() + dy_in.abs()),
        };
        let (wx, wy) = rect_world_rad.center();
        let (x_out0, y_out0) = projector.project(wx, wy);

        Ok(Pipeline {
            rect_in,
            rect_world,
            rect_world_rad,
            mode,
            projector,
            dx_in,
            dy_in,
            x0_in,
            y0_in,
            d_out,
            x_out0,
            y_out0,
            x_out1,
            y_out1,
        })
    }

    /// Stage 1 alone: input document coordinates to world radians.
    pub fn to_world(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.dx_in + self.x0_in, y * self.dy_in + self.y0_in)
    }

    /// Stage 3 alone: projected plane to output document coordinates.
    pub fn to_output(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.d_out * (x - self.x_out0) + self.x_out1,
            self.d_out * (self.y_out0 - y) + self.y_out1,
        )
    }

    /// Input document coordinates to output document coordinates.
    pub fn project(&self, x: f64, y: f64) -> (f64, f64) {
        let (x, y) = self.to_world(x, y);
        self.project_inner(x, y)
    }

    /// World radians to output document coordinates.
    pub fn project_inner(&self, x: f64, y: f64) -> (f64, f64) {
        let (x, y) = match self.mode {
            Mode::Crop => self.rect_world_rad.crop(x, y),
            Mode::Keep | Mode::Clip => (x, y),
        };
        let (x, y) = self.projector.project(x, y);
        self.to_output(x, y)
    }

    pub fn project_stage(&self, x: f64, y: f64, stage: Stage) -> (f64, f64) {
        match stage {
            Stage::Full => self.project(x, y),
            Stage::Inner => self.project_inner(x, y),
        }
    }

    /// Project any [`Coord`].
    pub fn convert<C, T>(&self, c: &C, stage: Stage) -> C
    where
        C: Coord<T>,
        T: Float,
    {
        let (x, y) = self.project_stage(
            c.x().to_f64().unwrap_or(f64::NAN),
            c.y().to_f64().unwrap_or(f64::NAN),
            stage,
        );
        C::from_xy(T::from(x).unwrap_or_else(T::nan), T::from(y).unwrap_or_else(T::nan))
    }

    /// Does an element with bounding box `bbox` belong on the map? `bbox` is in document units
    /// for [`Stage::Full`] and in world radians for [`Stage::Inner`].
    pub fn keeps(&self, bbox: &Rectangle, stage: Stage) -> bool {
        match self.mode {
            Mode::Keep => true,
            Mode::Clip | Mode::Crop => match stage {
                Stage::Full => self.rect_in.intersects(bbox),
                Stage::Inner => self.rect_world_rad.intersects(bbox),
            },
        }
    }

    pub fn projector(&self) -> &Projector {
        &self.projector
    }
}

impl Transform<f64> for BezPath {
    type Output = BezPath;

    fn transform(&mut self, pipeline: &Pipeline, stage: Stage) {
        *self = self.transformed(pipeline, stage);
    }

    fn transformed(&self, pipeline: &Pipeline, stage: Stage) -> BezPath {
        crate::geometry::path::map_points(self, |x, y| pipeline.project_stage(x, y, stage))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::projection::ProjectionClass;
    use approx::assert_relative_eq;

    fn plate_carree(mode: Mode, viewport: Viewport) -> Pipeline {
        Pipeline::new(
            &Projection::from_class(ProjectionClass::Cylindrical),
            Rectangle::new(0.0, 0.0, 360.0, 180.0),
            Rectangle::new(-180.0, -90.0, 180.0, 90.0),
            mode,
            viewport,
        )
        .unwrap()
    }

    #[test]
    fn test_input_stage_flips_y() {
        let p = plate_carree(Mode::Keep, Viewport::default());
        let (x, y) = p.to_world(0.0, 0.0);
        assert_relative_eq!(x, -std::f64::consts::PI);
        assert_relative_eq!(y, std::f64::consts::FRAC_PI_2);
        let (x, y) = p.to_world(360.0, 180.0);
        assert_relative_eq!(x, std::f64::consts::PI);
        assert_relative_eq!(y, -std::f64::consts::FRAC_PI_2);
    }

    #[test]
    fn test_identity_round_trip_for_plate_carree() {
        // Equal degrees per unit in x and y, so the output reproduces the input.
        let p = plate_carree(Mode::Keep, Viewport::default());
        for (x, y) in [(0.0, 0.0), (180.0, 90.0), (35.5, 120.25), (360.0, 180.0)] {
            let (ox, oy) = p.project(x, y);
            assert_relative_eq!(ox, x, epsilon = 1e-9);
            assert_relative_eq!(oy, y, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_inner_agrees_with_full() {
        let p = plate_carree(Mode::Crop, Viewport::default());
        let (wx, wy) = p.to_world(100.0, 40.0);
        assert_eq!(p.project(100.0, 40.0), p.project_inner(wx, wy));
    }

    #[test]
    fn test_viewport_center_and_scale() {
        let p = plate_carree(
            Mode::Keep,
            Viewport {
                center: Some((10.0, 20.0)),
                scale: Some(2.0),
            },
        );
        let (x, y) = p.project(180.0, 90.0);
        assert_relative_eq!(x, 10.0, epsilon = 1e-12);
        assert_relative_eq!(y, 20.0, epsilon = 1e-12);
        let (x, _) = p.project_inner(1.0, 0.0);
        assert_relative_eq!(x, 12.0, epsilon = 1e-12);
    }

    #[test]
    fn test_crop_clamps_only_in_crop_mode() {
        let outside = (4.0, 0.0);
        let keep = plate_carree(Mode::Keep, Viewport::default());
        let clip = plate_carree(Mode::Clip, Viewport::default());
        let crop = plate_carree(Mode::Crop, Viewport::default());
        assert_eq!(keep.project_inner(outside.0, outside.1), clip.project_inner(outside.0, outside.1));
        let (x, _) = crop.project_inner(outside.0, outside.1);
        assert_relative_eq!(x, 360.0, epsilon = 1e-9);
        let (x, _) = crop.project(400.0, 90.0);
        assert_relative_eq!(x, 360.0, epsilon = 1e-9);
    }

    #[test]
    fn test_keeps() {
        let far = Rectangle::new(500.0, 500.0, 600.0, 600.0);
        assert!(plate_carree(Mode::Keep, Viewport::default()).keeps(&far, Stage::Full));
        assert!(!plate_carree(Mode::Clip, Viewport::default()).keeps(&far, Stage::Full));
        let near = Rectangle::new(-10.0, -10.0, 10.0, 10.0);
        assert!(plate_carree(Mode::Crop, Viewport::default()).keeps(&near, Stage::Full));
    }

    #[test]
    fn test_degenerate_rectangles() {
        let r = Pipeline::new(
            &Projection::from_class(ProjectionClass::Cylindrical),
            Rectangle::new(0.0, 0.0, 0.0, 10.0),
            Rectangle::new(-180.0, -90.0, 180.0, 90.0),
            Mode::Keep,
            Viewport::default(),
        );
        assert!(matches!(r, Err(MapperError::InvalidValue { .. })));
    }

    #[test]
    fn test_mode_names() {
        assert_eq!("crop".parse::<Mode>().unwrap(), Mode::Crop);
        assert!("cut".parse::<Mode>().is_err());
    }
}
