use crate::config::value::{self, Definition};
use crate::error::{MapperError, Result};

/// A real-world distance unit.
///
/// `scale` is the great-circle angle, in radians, covered by one unit. It is the only way the
/// mapper knows what a kilometre is, or how large the planet is.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub name: String,
    pub scale: f64,
}

impl Unit {
    pub fn new(name: impl Into<String>, scale: f64) -> Self {
        Unit {
            name: name.into(),
            scale,
        }
    }

    /// A unit from `{name, scale}`.
    pub fn from_definition(def: &Definition) -> Result<Self> {
        let name = value::require_str(def, "name", "Unit::from_definition", "unit")?;
        let scale = value::require_f64(def, "scale", "Unit::from_definition", name)?;
        if !(scale.is_finite() && scale > 0.0) {
            return Err(MapperError::invalid("Unit::from_definition", "scale", scale));
        }
        Ok(Unit::new(name, scale))
    }

    /// The end of a great-circle path that starts at `(x, y)` (radians), is `d` units long and
    /// leaves at angle `a` (radians) measured from due east.
    ///
    /// With δ = d·U the angular distance:
    /// φ1 = asin(sin φ0 cos δ + cos φ0 sin δ sin a),
    /// λ1 = λ0 + atan2(cos a sin δ cos φ0, cos δ − sin φ0 sin φ1)
    pub fn move_to(&self, x: f64, y: f64, d: f64, a: f64) -> (f64, f64) {
        let d = d * self.scale;
        let y1 = (y.sin() * d.cos() + y.cos() * d.sin() * a.sin()).clamp(-1.0, 1.0).asin();
        let x1 = x + (a.cos() * d.sin() * y.cos()).atan2(d.cos() - y.sin() * y1.sin());
        (x1, y1)
    }

    /// Great-circle (haversine) distance between two points given in radians, in units.
    pub fn measure(&self, x0: f64, y0: f64, x1: f64, y1: f64) -> f64 {
        let a = ((y1 - y0) / 2.0).sin().powi(2)
            + y0.cos() * y1.cos() * ((x1 - x0) / 2.0).sin().powi(2);
        let a = a.clamp(0.0, 1.0);
        2.0 * a.sqrt().atan2((1.0 - a).sqrt()) / self.scale
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_move_then_measure() {
        for scale in [1.0, 1.0 / 6371.0, 0.25] {
            let unit = Unit::new("u", scale);
            for lat in [-80.0_f64, -45.0, 0.0, 12.5, 60.0, 85.0] {
                for bearing in [0.0_f64, 30.0, 90.0, 135.0, 200.0, 300.0] {
                    let (x, y) = (0.3, lat.to_radians());
                    let d = 0.2 / scale;
                    let (x1, y1) = unit.move_to(x, y, d, bearing.to_radians());
                    assert_abs_diff_eq!(unit.measure(x, y, x1, y1) * scale, d * scale, epsilon = 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_due_north() {
        let unit = Unit::new("rad", 1.0);
        let (x, y) = unit.move_to(0.0, 0.0, PI / 4.0, PI / 2.0);
        assert_abs_diff_eq!(x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(y, PI / 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_quarter_equator() {
        let unit = Unit::new("rad", 1.0);
        assert_abs_diff_eq!(unit.measure(0.0, 0.0, PI / 2.0, 0.0), PI / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_definition() {
        let def: Definition = "name = 'km'\nscale = 0.000157".parse().unwrap();
        assert_eq!(Unit::from_definition(&def).unwrap().name, "km");
        let def: Definition = "name = 'km'\nscale = 'big'".parse().unwrap();
        assert!(matches!(
            Unit::from_definition(&def),
            Err(MapperError::InvalidValue { .. })
        ));
        let def: Definition = "name = 'km'".parse().unwrap();
        assert!(matches!(
            Unit::from_definition(&def),
            Err(MapperError::MissingField { .. })
        ));
    }
}
