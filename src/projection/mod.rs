//! Map projections.
//!
//! A [`Projection`] is the inert binding read from configuration: a class and its raw parameters.
//! [`Projection::initialize`] resolves the symbolic parameters against a world rectangle and
//! returns a [`Projector`], which owns everything it needs. The same `Projection` can therefore
//! be initialized by several maps, one after the other, each getting its own projector.
//!
//! ```
//! use svgproj::geometry::Rectangle;
//! use svgproj::projection::{Projection, ProjectionClass};
//!
//! let sinusoidal = Projection::from_class(ProjectionClass::Sinusoidal);
//! let mut world = Rectangle::new(-180.0, -90.0, 180.0, 90.0);
//! world.scale(std::f64::consts::PI / 180.0);
//! let projector = sinusoidal.initialize(&world).unwrap();
//! assert_eq!(projector.project(0.0, 0.0), (0.0, 0.0));
//! ```

mod robinson;
mod variants;

pub use robinson::Interpolation;
pub use variants::{
    CylinderKind, EPSILON, MercatorAspect, Parallels, ProjectionClass, Variant, conic_radius,
    mollweide_theta, sinc,
};

use crate::config::value::{self, Definition};
use crate::error::{MapperError, Result};
use crate::geometry::Rectangle;
use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt;
use toml::Value;

/// Rotate the sphere so that the pole `(xp, yp)` lands on the geographic pole.
///
/// Both coordinates are brought back into range: the latitude into `[-π/2, π/2]` and the
/// longitude onto the correct side of the antimeridian.
pub fn oblique(x: f64, y: f64, xp: f64, yp: f64) -> (f64, f64) {
    let a = yp.sin() * y.sin() - yp.cos() * y.cos() * x.cos();
    let mut y1 = a.clamp(-1.0, 1.0).asin();
    if yp.sin() * y.cos() + yp.cos() * y.sin() * x.cos() < 0.0 {
        y1 = if y > 0.0 { PI - y1 } else { -PI - y1 };
    }
    let mut x1 = (y.cos() * x.sin() / y1.cos()).clamp(-1.0, 1.0).asin() - xp;
    if x.cos() < -y1.tan() * yp.cos() * x.sin() {
        x1 = PI - x1;
    }
    if y1 > FRAC_PI_2 {
        y1 -= PI;
    }
    if y1 < -FRAC_PI_2 {
        y1 += PI;
    }
    (x1, y1)
}

/// A projection as configured: a class and its raw parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub name: Option<String>,
    pub class: ProjectionClass,
    params: Definition,
}

impl Projection {
    /// A projection from `{name, class, ...}`. Unknown classes are rejected here, so a bad
    /// configuration fails at load time.
    pub fn from_definition(def: &Definition) -> Result<Self> {
        let name = value::opt_str(def, "name", "Projection::from_definition")?;
        let class = value::require_str(
            def,
            "class",
            "Projection::from_definition",
            name.unwrap_or("projection"),
        )?;
        let class = class
            .parse::<ProjectionClass>()
            .map_err(|_| MapperError::invalid("Projection::from_definition", "class", class))?;
        let mut params = def.clone();
        params.remove("name");
        params.remove("class");
        Ok(Projection {
            name: name.map(str::to_string),
            class,
            params,
        })
    }

    /// An anonymous projection of `class` with every parameter at its default.
    pub fn from_class(class: ProjectionClass) -> Self {
        Projection {
            name: None,
            class,
            params: Definition::new(),
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.class.name())
    }

    /// Resolve the parameters against `world`, given in radians, and build the projector.
    ///
    /// - `central-meridian` and `reference-parallel`: degrees, or `"center"` for the middle of
    ///   the world rectangle; 0 when absent
    /// - `standard-parallel-1/2`: degrees; the south and north edges of the world when absent
    /// - `aspect`: `"transverse"` or an oblique pole `[lon, lat]` in degrees
    /// - `rotate`: a planar rotation in degrees applied after projecting
    pub fn initialize(&self, world: &Rectangle) -> Result<Projector> {
        const OP: &str = "Projection::initialize";
        let (x_center, y_center) = world.center();
        let central_meridian = self.angle("central-meridian", x_center)?;
        let reference = self.angle("reference-parallel", y_center)?;
        let standard_1 = value::opt_f64(&self.params, "standard-parallel-1", OP)?
            .map_or(world.y0, f64::to_radians);
        let standard_2 = value::opt_f64(&self.params, "standard-parallel-2", OP)?
            .map_or(world.y1, f64::to_radians);
        let parallels = Parallels {
            reference,
            standard_1,
            standard_2,
        };
        let base = Variant::new(self.class, parallels, &self.params)?;

        let pole = match self.params.get("aspect") {
            None => None,
            Some(Value::String(s)) if s == "transverse" => Some((0.0, 0.0)),
            Some(v @ Value::Array(_)) => {
                let [x, y] = value::numbers_n::<2>(v, "aspect", OP)
                    .map_err(|_| MapperError::invalid(OP, "aspect", v))?;
                Some((x.to_radians(), y.to_radians()))
            }
            Some(v) => return Err(MapperError::invalid(OP, "aspect", v)),
        };
        let rotation = value::opt_f64(&self.params, "rotate", OP)?.map(|angle| {
            let angle = angle.to_radians();
            (angle.cos(), angle.sin())
        });

        Ok(Projector {
            class: self.class,
            base,
            central_meridian,
            pole,
            rotation,
        })
    }

    /// An angle in degrees, or `"center"` for `center`, which is already in radians.
    fn angle(&self, key: &str, center: f64) -> Result<f64> {
        match self.params.get(key) {
            None => Ok(0.0),
            Some(Value::String(s)) if s == "center" => Ok(center),
            Some(v) => value::number(v)
                .map(f64::to_radians)
                .ok_or_else(|| MapperError::invalid("Projection::initialize", key, v)),
        }
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name(), self.class)
    }
}

/// An initialized projection: longitude and latitude in radians to the plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Projector {
    pub class: ProjectionClass,
    base: Variant,
    central_meridian: f64,
    pole: Option<(f64, f64)>,
    rotation: Option<(f64, f64)>,
}

impl Projector {
    pub fn project(&self, x: f64, y: f64) -> (f64, f64) {
        let x = x - self.central_meridian;
        let (x, y) = match self.pole {
            Some((xp, yp)) => oblique(x, y, xp, yp),
            None => (x, y),
        };
        let (x, y) = self.base.project(x, y);
        match self.rotation {
            Some((c, s)) => (c * x - s * y, s * x + c * y),
            None => (x, y),
        }
    }

    pub fn variant(&self) -> &Variant {
        &self.base
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn world(x0: f64, y0: f64, x1: f64, y1: f64) -> Rectangle {
        let mut r = Rectangle::new(x0, y0, x1, y1);
        r.scale(PI / 180.0);
        r
    }

    fn projection(text: &str) -> Projection {
        Projection::from_definition(&text.parse().unwrap()).unwrap()
    }

    #[test]
    fn test_sinusoidal_end_to_end() {
        let p = projection("name = 'sin'\nclass = 'Sinusoidal'\ncentral-meridian = 0");
        let projector = p.initialize(&world(-180.0, -90.0, 180.0, 90.0)).unwrap();
        assert_eq!(projector.project(0.0, 0.0), (0.0, 0.0));
        let (x, y) = projector.project(FRAC_PI_2, 0.0);
        assert_relative_eq!(x, FRAC_PI_2);
        assert_eq!(y, 0.0);
    }

    #[test]
    fn test_mercator_end_to_end_cutoff() {
        let p = projection("class = 'Mercator'\ncutoff = 80");
        let projector = p.initialize(&world(-180.0, -85.0, 180.0, 85.0)).unwrap();
        let (_, y80) = projector.project(0.0, 80f64.to_radians());
        let (_, y89) = projector.project(0.0, 89f64.to_radians());
        assert_eq!(y80, y89);
    }

    #[test]
    fn test_albers_standard_parallels() {
        let p = projection("class = 'Albers'\nreference-parallel = 35\nstandard-parallel-1 = 20\nstandard-parallel-2 = 50");
        let projector = p.initialize(&world(-20.0, 0.0, 20.0, 70.0)).unwrap();
        let Variant::Albers { n, c, r0 } = *projector.variant() else {
            panic!("not an Albers projection");
        };
        assert_relative_eq!(n, (20f64.to_radians().sin() + 50f64.to_radians().sin()) / 2.0);
        assert_eq!(conic_radius(n, c, 35f64.to_radians()), r0);
    }

    #[test]
    fn test_standard_parallels_default_to_world() {
        let p = projection("class = 'Albers'");
        let projector = p.initialize(&world(0.0, 30.0, 10.0, 60.0)).unwrap();
        let Variant::Albers { n, .. } = *projector.variant() else {
            panic!("not an Albers projection");
        };
        assert_relative_eq!(n, (30f64.to_radians().sin() + 60f64.to_radians().sin()) / 2.0);
    }

    #[test]
    fn test_center_resolves_against_each_world() {
        let p = projection("class = 'Cylindrical'\ncentral-meridian = 'center'\nreference-parallel = 'center'");
        let a = p.initialize(&world(10.0, 40.0, 30.0, 60.0)).unwrap();
        let b = p.initialize(&world(-100.0, -20.0, -80.0, 0.0)).unwrap();
        let (x, y) = a.project(20f64.to_radians(), 50f64.to_radians());
        assert_abs_diff_eq!(x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(y, 0.0, epsilon = 1e-12);
        let (x, y) = b.project((-90f64).to_radians(), (-10f64).to_radians());
        assert_abs_diff_eq!(x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(y, 0.0, epsilon = 1e-12);
        // The first projector is unaffected by the second initialization.
        let (x, _) = a.project(20f64.to_radians(), 50f64.to_radians());
        assert_abs_diff_eq!(x, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_bad_meridian_token() {
        let p = projection("class = 'Sinusoidal'\ncentral-meridian = 'middle'");
        assert!(matches!(
            p.initialize(&world(0.0, 0.0, 1.0, 1.0)),
            Err(MapperError::InvalidValue { ref field, .. }) if field == "central-meridian"
        ));
    }

    #[test]
    fn test_unknown_class() {
        let def: Definition = "name = 'x'\nclass = 'Peters'".parse().unwrap();
        assert!(matches!(
            Projection::from_definition(&def),
            Err(MapperError::InvalidValue { ref field, .. }) if field == "class"
        ));
        let def: Definition = "name = 'x'".parse().unwrap();
        assert!(matches!(
            Projection::from_definition(&def),
            Err(MapperError::MissingField { ref field, .. }) if field == "class"
        ));
    }

    #[test]
    fn test_malformed_aspect() {
        let w = world(0.0, 0.0, 1.0, 1.0);
        for aspect in ["aspect = 'sideways'", "aspect = [10]", "aspect = 3"] {
            let p = projection(&format!("class = 'Sinusoidal'\n{aspect}"));
            assert!(
                matches!(p.initialize(&w), Err(MapperError::InvalidValue { .. })),
                "{aspect}"
            );
        }
    }

    #[test]
    fn test_oblique_geographic_pole_is_identity() {
        for (x, y) in [(0.0, 0.0), (0.5, 0.3), (-1.2, -0.7), (1.0, 1.4)] {
            let (x1, y1) = oblique(x, y, 0.0, FRAC_PI_2);
            assert_relative_eq!(x1, x, epsilon = 1e-12);
            assert_relative_eq!(y1, y, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_oblique_stays_in_range() {
        for i in -8..=8 {
            for j in -4..=4 {
                let (x, y) = (i as f64 * 0.35, j as f64 * 0.35);
                let (_, y1) = oblique(x, y, 0.3, 0.9);
                assert!((-FRAC_PI_2..=FRAC_PI_2).contains(&y1), "{x} {y} -> {y1}");
            }
        }
    }

    #[test]
    fn test_rotation_is_applied_last() {
        let p = projection("class = 'Cylindrical'\nrotate = 90");
        let projector = p.initialize(&world(0.0, 0.0, 1.0, 1.0)).unwrap();
        let (x, y) = projector.project(0.5, 0.0);
        assert_abs_diff_eq!(x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(y, 0.5);
    }

    #[test]
    fn test_transverse_aspect_moves_pole_to_equator() {
        let p = projection("class = 'Cylindrical'\naspect = 'transverse'");
        let projector = p.initialize(&world(0.0, 0.0, 1.0, 1.0)).unwrap();
        let (x, y) = projector.project(0.0, FRAC_PI_2 - 1e-9);
        assert!(x.is_finite());
        assert_abs_diff_eq!(y, 0.0, epsilon = 1e-6);
    }
}
