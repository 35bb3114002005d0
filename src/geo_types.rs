use crate::transform::{Coord, Pipeline, Stage, Transform};
use geo_types::{CoordFloat, LineString, MultiLineString, Point};

///```rust
/// use geo_types::coord;
/// use svgproj::geometry::Rectangle;
/// use svgproj::projection::{Projection, ProjectionClass};
/// use svgproj::{Mode, Pipeline, Stage, Viewport};
///
/// let pipeline = Pipeline::new(
///     &Projection::from_class(ProjectionClass::Cylindrical),
///     Rectangle::new(0.0, 0.0, 360.0, 180.0),
///     Rectangle::new(-180.0, -90.0, 180.0, 90.0),
///     Mode::Keep,
///     Viewport::default(),
/// )
/// .unwrap();
/// let c = pipeline.convert(&coord! { x: 90.0f64, y: 45.0f64 }, Stage::Full);
/// assert!((c.x - 90.0).abs() < 1e-9 && (c.y - 45.0).abs() < 1e-9);
/// ```
impl<T: CoordFloat> Coord<T> for geo_types::Coord<T> {
    fn x(&self) -> T {
        self.x
    }
    fn y(&self) -> T {
        self.y
    }
    fn from_xy(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl<T: CoordFloat> Coord<T> for Point<T> {
    fn x(&self) -> T {
        Point::x(*self)
    }
    fn y(&self) -> T {
        Point::y(*self)
    }
    fn from_xy(x: T, y: T) -> Self {
        Self::new(x, y)
    }
}

impl<T: CoordFloat> Transform<T> for Point<T> {
    type Output = Self;

    fn transform(&mut self, pipeline: &Pipeline, stage: Stage) {
        *self = pipeline.convert(self, stage);
    }

    fn transformed(&self, pipeline: &Pipeline, stage: Stage) -> Self {
        pipeline.convert(self, stage)
    }
}

impl<T: CoordFloat> Transform<T> for LineString<T> {
    type Output = Self;

    fn transform(&mut self, pipeline: &Pipeline, stage: Stage) {
        for c in self.coords_mut() {
            *c = pipeline.convert(c, stage);
        }
    }

    fn transformed(&self, pipeline: &Pipeline, stage: Stage) -> Self {
        let mut line = self.clone();
        line.transform(pipeline, stage);
        line
    }
}

impl<T: CoordFloat> Transform<T> for MultiLineString<T> {
    type Output = Self;

    fn transform(&mut self, pipeline: &Pipeline, stage: Stage) {
        for line in self.iter_mut() {
            line.transform(pipeline, stage);
        }
    }

    fn transformed(&self, pipeline: &Pipeline, stage: Stage) -> Self {
        let mut lines = self.clone();
        lines.transform(pipeline, stage);
        lines
    }
}
