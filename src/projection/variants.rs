//! The closed family of base projections.
//!
//! Every variant is a pure function of longitude and latitude in radians to a planar point,
//! parameterized once at construction.

use super::robinson::{self, Interpolation};
use crate::config::value::{self, Definition};
use crate::error::{MapperError, Result};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI, SQRT_2};
use std::fmt;
use std::str::FromStr;

/// Guard below which angles are treated as zero.
pub const EPSILON: f64 = 1e-4;

const MOLLWEIDE_MAX_ITERATIONS: usize = 100;

/// `a / sin(a)`, continuous at zero.
pub fn sinc(a: f64) -> f64 {
    if a.abs() < EPSILON { 1.0 } else { a / a.sin() }
}

/// Projection class identifiers as they appear in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectionClass {
    Aitoff,
    Albers,
    Bonne,
    Bottomley,
    Cassini,
    Cylindrical,
    /// The true equidistant conic: meridians keep their length and parallels are evenly
    /// spaced. Its output is not that of the Albers equal-area formula.
    EquidistantConic,
    Gnomonic,
    Hammer,
    KavrayskiyVII,
    Mercator,
    Mollweide,
    Robinson,
    Sinusoidal,
    WinkelTripel,
}

impl ProjectionClass {
    pub const ALL: [ProjectionClass; 15] = [
        ProjectionClass::Aitoff,
        ProjectionClass::Albers,
        ProjectionClass::Bonne,
        ProjectionClass::Bottomley,
        ProjectionClass::Cassini,
        ProjectionClass::Cylindrical,
        ProjectionClass::EquidistantConic,
        ProjectionClass::Gnomonic,
        ProjectionClass::Hammer,
        ProjectionClass::KavrayskiyVII,
        ProjectionClass::Mercator,
        ProjectionClass::Mollweide,
        ProjectionClass::Robinson,
        ProjectionClass::Sinusoidal,
        ProjectionClass::WinkelTripel,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ProjectionClass::Aitoff => "Aitoff",
            ProjectionClass::Albers => "Albers",
            ProjectionClass::Bonne => "Bonne",
            ProjectionClass::Bottomley => "Bottomley",
            ProjectionClass::Cassini => "Cassini",
            ProjectionClass::Cylindrical => "Cylindrical",
            ProjectionClass::EquidistantConic => "Equidistant-Conic",
            ProjectionClass::Gnomonic => "Gnomonic",
            ProjectionClass::Hammer => "Hammer",
            ProjectionClass::KavrayskiyVII => "Kavrayskiy-VII",
            ProjectionClass::Mercator => "Mercator",
            ProjectionClass::Mollweide => "Mollweide",
            ProjectionClass::Robinson => "Robinson",
            ProjectionClass::Sinusoidal => "Sinusoidal",
            ProjectionClass::WinkelTripel => "Winkel-Tripel",
        }
    }
}

impl fmt::Display for ProjectionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProjectionClass {
    type Err = MapperError;

    fn from_str(s: &str) -> Result<Self> {
        ProjectionClass::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| MapperError::unresolved("ProjectionClass::from_str", "projection class", s))
    }
}

/// Latitudes resolved by initialization, in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parallels {
    pub reference: f64,
    pub standard_1: f64,
    pub standard_2: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CylinderKind {
    PlateCarree,
    Lambert,
    Central,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MercatorAspect {
    Normal,
    Transverse,
    Oblique { x_pole: f64, y_pole: f64 },
}

/// A parameterized base projection.
#[derive(Debug, Clone, PartialEq)]
pub enum Variant {
    Aitoff,
    Albers { n: f64, c: f64, r0: f64 },
    Bonne { y1: f64, coty: f64 },
    Bottomley { sin_ref: f64 },
    Cassini,
    Cylindrical { y_ref: f64, kind: CylinderKind },
    EquidistantConic { n: f64, g: f64, r0: f64 },
    Gnomonic { sin_ref: f64, cos_ref: f64 },
    Hammer,
    KavrayskiyVII,
    Mercator { aspect: MercatorAspect, cutoff: f64 },
    Mollweide,
    Robinson(Interpolation),
    Sinusoidal,
    WinkelTripel { cos_ref: f64 },
}

impl Variant {
    /// Build the projection of `class`. `params` holds the class-specific options
    /// (`variant`, `cutoff`, `transverse`, `oblique`, `interpolation`).
    pub fn new(class: ProjectionClass, p: Parallels, params: &Definition) -> Result<Self> {
        const OP: &str = "Variant::new";
        Ok(match class {
            ProjectionClass::Aitoff => Variant::Aitoff,
            ProjectionClass::Albers => {
                let n = (p.standard_1.sin() + p.standard_2.sin()) / 2.0;
                if n.abs() < EPSILON {
                    return Err(MapperError::invalid(
                        OP,
                        "standard-parallel-1/2",
                        format!("{} {}", p.standard_1.to_degrees(), p.standard_2.to_degrees()),
                    ));
                }
                let c = p.standard_1.cos().powi(2) + 2.0 * n * p.standard_1.sin();
                let r0 = (c - 2.0 * n * p.reference.sin()).sqrt() / n;
                Variant::Albers { n, c, r0 }
            }
            ProjectionClass::Bonne => {
                if p.reference.tan().abs() < EPSILON {
                    // A Bonne projection on the equator is the sinusoidal one.
                    Variant::Sinusoidal
                } else {
                    Variant::Bonne {
                        y1: p.reference,
                        coty: 1.0 / p.reference.tan(),
                    }
                }
            }
            ProjectionClass::Bottomley => Variant::Bottomley {
                sin_ref: p.reference.sin(),
            },
            ProjectionClass::Cassini => Variant::Cassini,
            ProjectionClass::Cylindrical => {
                let kind = match value::opt_str(params, "variant", OP)?.unwrap_or("Plate-Carree") {
                    "Plate-Carree" => CylinderKind::PlateCarree,
                    "Lambert" => CylinderKind::Lambert,
                    "Central" => CylinderKind::Central,
                    other => return Err(MapperError::invalid(OP, "variant", other)),
                };
                Variant::Cylindrical {
                    y_ref: p.reference,
                    kind,
                }
            }
            ProjectionClass::EquidistantConic => {
                let (y0, y1) = (p.standard_1, p.standard_2);
                let n = if (y1 - y0).abs() < EPSILON {
                    y0.sin()
                } else {
                    (y0.cos() - y1.cos()) / (y1 - y0)
                };
                if n.abs() < EPSILON {
                    return Err(MapperError::invalid(
                        OP,
                        "standard-parallel-1/2",
                        format!("{} {}", y0.to_degrees(), y1.to_degrees()),
                    ));
                }
                let g = y0.cos() / n + y0;
                Variant::EquidistantConic {
                    n,
                    g,
                    r0: g - p.reference,
                }
            }
            ProjectionClass::Gnomonic => Variant::Gnomonic {
                sin_ref: p.reference.sin(),
                cos_ref: p.reference.cos(),
            },
            ProjectionClass::Hammer => Variant::Hammer,
            ProjectionClass::KavrayskiyVII => Variant::KavrayskiyVII,
            ProjectionClass::Mercator => {
                let cutoff = value::opt_f64(params, "cutoff", OP)?.unwrap_or(80.0);
                if !(0.0..90.0).contains(&cutoff) {
                    return Err(MapperError::invalid(OP, "cutoff", cutoff));
                }
                let aspect = if let Some(pole) = params.get("oblique") {
                    let [x_pole, y_pole] = value::numbers_n::<2>(pole, "oblique", OP)?;
                    MercatorAspect::Oblique {
                        x_pole: x_pole.to_radians(),
                        y_pole: y_pole.to_radians(),
                    }
                } else if value::opt_bool(params, "transverse", OP)?.unwrap_or(false) {
                    MercatorAspect::Transverse
                } else {
                    MercatorAspect::Normal
                };
                Variant::Mercator {
                    aspect,
                    cutoff: cutoff.to_radians(),
                }
            }
            ProjectionClass::Mollweide => Variant::Mollweide,
            ProjectionClass::Robinson => {
                match value::opt_str(params, "interpolation", OP)?.unwrap_or("quadratic") {
                    "quadratic" => Variant::Robinson(Interpolation::Quadratic),
                    "linear" => Variant::Robinson(Interpolation::Linear),
                    other => return Err(MapperError::invalid(OP, "interpolation", other)),
                }
            }
            ProjectionClass::Sinusoidal => Variant::Sinusoidal,
            ProjectionClass::WinkelTripel => Variant::WinkelTripel {
                cos_ref: p.reference.cos(),
            },
        })
    }

    pub fn project(&self, x: f64, y: f64) -> (f64, f64) {
        match *self {
            Variant::Aitoff => {
                let a = sinc((y.cos() * (x / 2.0).cos()).clamp(-1.0, 1.0).acos());
                (2.0 * y.cos() * (x / 2.0).sin() * a, y.sin() * a)
            }
            Variant::Albers { n, c, r0 } => {
                let r = conic_radius(n, c, y);
                let t = n * x;
                (r * t.sin(), r0 - r * t.cos())
            }
            Variant::Bonne { y1, coty } => {
                let r = coty + y1 - y;
                if r.abs() < EPSILON {
                    return (0.0, coty);
                }
                let t = x * y.cos() / r;
                (r * t.sin(), coty - r * t.cos())
            }
            Variant::Bottomley { sin_ref } => {
                let r = FRAC_PI_2 - y;
                let t = if r.abs() < EPSILON {
                    x * sin_ref
                } else {
                    x * sin_ref * r.sin() / r
                };
                (r * t.sin(), FRAC_PI_2 - r * t.cos())
            }
            Variant::Cassini => (
                (y.cos() * x.sin()).clamp(-1.0, 1.0).asin(),
                y.tan().atan2(x.cos()),
            ),
            Variant::Cylindrical { y_ref, kind } => {
                let dy = y - y_ref;
                let fy = match kind {
                    CylinderKind::PlateCarree => dy,
                    CylinderKind::Lambert => dy.sin(),
                    CylinderKind::Central => dy.tan(),
                };
                (x, fy)
            }
            Variant::EquidistantConic { n, g, r0 } => {
                let r = g - y;
                let t = n * x;
                (r * t.sin(), r0 - r * t.cos())
            }
            Variant::Gnomonic { sin_ref, cos_ref } => {
                let cc = sin_ref * y.sin() + cos_ref * y.cos() * x.cos();
                (
                    y.cos() * x.sin() / cc,
                    (cos_ref * y.sin() - sin_ref * y.cos() * x.cos()) / cc,
                )
            }
            Variant::Hammer => {
                let d = (2.0 / (1.0 + y.cos() * (x / 2.0).cos())).sqrt();
                (2.0 * y.cos() * (x / 2.0).sin() * d, y.sin() * d)
            }
            Variant::KavrayskiyVII => (
                1.5 * x * (1.0 / 3.0 - (y / PI).powi(2)).max(0.0).sqrt(),
                y,
            ),
            Variant::Mercator { aspect, cutoff } => mercator(aspect, cutoff, x, y),
            Variant::Mollweide => {
                let t = mollweide_theta(y);
                (2.0 * SQRT_2 * x * t.cos() / PI, SQRT_2 * t.sin())
            }
            Variant::Robinson(interpolation) => {
                let (a, b) = robinson::coefficients(y, interpolation);
                (x * a, b.copysign(y))
            }
            Variant::Sinusoidal => (x * y.cos(), y),
            Variant::WinkelTripel { cos_ref } => {
                let a = sinc((y.cos() * (x / 2.0).cos()).clamp(-1.0, 1.0).acos());
                (
                    (x * cos_ref + 2.0 * y.cos() * (x / 2.0).sin() * a) / 2.0,
                    (y + y.sin() * a) / 2.0,
                )
            }
        }
    }
}

/// Radius of the parallel `y` on an Albers cone.
pub fn conic_radius(n: f64, c: f64, y: f64) -> f64 {
    (c - 2.0 * n * y.sin()).sqrt() / n
}

fn mercator(aspect: MercatorAspect, cutoff: f64, x: f64, y: f64) -> (f64, f64) {
    let limit = cutoff.sin();
    let stretch = |a: f64| {
        let a = a.clamp(-limit, limit);
        ((1.0 + a) / (1.0 - a)).ln() / 2.0
    };
    match aspect {
        MercatorAspect::Normal => {
            let y = y.clamp(-cutoff, cutoff);
            (x, (FRAC_PI_4 + y / 2.0).tan().ln())
        }
        MercatorAspect::Transverse => (stretch(y.cos() * x.sin()), y.tan().atan2(x.cos())),
        MercatorAspect::Oblique { x_pole, y_pole } => {
            let dx = x - x_pole;
            let a = y_pole.sin() * y.sin() + y_pole.cos() * y.cos() * dx.cos();
            (
                stretch(a),
                (y_pole.cos() * y.sin() - y_pole.sin() * y.cos() * dx.cos()).atan2(y.cos() * dx.sin()),
            )
        }
    }
}

/// Solve `2θ + sin 2θ = π sin φ` by Newton iteration.
pub fn mollweide_theta(y: f64) -> f64 {
    if ((2.0 * y).cos() + 1.0).abs() < EPSILON {
        return y;
    }
    let target = PI * y.sin();
    let mut t0 = y;
    for _ in 0..MOLLWEIDE_MAX_ITERATIONS {
        let t1 = t0 - (2.0 * t0 + (2.0 * t0).sin() - target) / (2.0 + 2.0 * (2.0 * t0).cos());
        if (t1 - t0).abs() < EPSILON {
            return t1;
        }
        t0 = t1;
    }
    t0
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn parallels(reference: f64, standard_1: f64, standard_2: f64) -> Parallels {
        Parallels {
            reference: reference.to_radians(),
            standard_1: standard_1.to_radians(),
            standard_2: standard_2.to_radians(),
        }
    }

    fn build(class: ProjectionClass, p: Parallels, params: &str) -> Variant {
        Variant::new(class, p, &params.parse().unwrap()).unwrap()
    }

    #[test]
    fn test_class_names_round_trip() {
        for class in ProjectionClass::ALL {
            assert_eq!(class.name().parse::<ProjectionClass>().unwrap(), class);
        }
        assert!(matches!(
            "Peters".parse::<ProjectionClass>(),
            Err(MapperError::UnresolvedReference { .. })
        ));
    }

    #[test]
    fn test_sinc() {
        assert_eq!(sinc(0.0), 1.0);
        for e in [1e-3, 1e-5, 1e-8] {
            assert_abs_diff_eq!(sinc(e), 1.0, epsilon = 1e-6);
        }
        assert_relative_eq!(sinc(FRAC_PI_2), FRAC_PI_2);
    }

    #[test]
    fn test_sinusoidal() {
        let v = build(ProjectionClass::Sinusoidal, parallels(0.0, 0.0, 0.0), "");
        assert_eq!(v.project(0.0, 0.0), (0.0, 0.0));
        let (x, y) = v.project(FRAC_PI_2, 0.0);
        assert_relative_eq!(x, FRAC_PI_2);
        assert_eq!(y, 0.0);
    }

    #[test]
    fn test_mercator_cutoff() {
        let v = build(ProjectionClass::Mercator, parallels(0.0, 0.0, 0.0), "cutoff = 80");
        let (_, y80) = v.project(0.3, 80f64.to_radians());
        let (_, y89) = v.project(0.3, 89f64.to_radians());
        assert_eq!(y80, y89);
        let (_, y_s) = v.project(0.3, (-89f64).to_radians());
        assert_relative_eq!(y_s, -y80, epsilon = 1e-12);
    }

    #[test]
    fn test_mercator_aspects_stay_finite() {
        for params in ["transverse = true", "oblique = [20, 45]"] {
            let v = build(ProjectionClass::Mercator, parallels(0.0, 0.0, 0.0), params);
            for (x, y) in [(0.0, 0.0), (FRAC_PI_2, 0.0), (0.35, 0.785)] {
                let (px, py) = v.project(x, y);
                assert!(px.is_finite() && py.is_finite(), "{params}: {x} {y}");
            }
        }
    }

    #[test]
    fn test_albers_reference_parallel_radius() {
        let p = parallels(35.0, 20.0, 50.0);
        let Variant::Albers { n, c, r0 } = build(ProjectionClass::Albers, p, "") else {
            panic!("not an Albers projection");
        };
        assert_eq!(conic_radius(n, c, p.reference), r0);
        let v = Variant::Albers { n, c, r0 };
        let (x, y) = v.project(0.0, p.reference);
        assert_eq!(x, 0.0);
        assert_abs_diff_eq!(y, 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_albers_rejects_symmetric_parallels() {
        let p = parallels(0.0, -30.0, 30.0);
        assert!(Variant::new(ProjectionClass::Albers, p, &Definition::new()).is_err());
    }

    #[test]
    fn test_equidistant_conic_keeps_meridian_distances() {
        let v = build(ProjectionClass::EquidistantConic, parallels(40.0, 30.0, 60.0), "");
        let (_, y40) = v.project(0.0, 40f64.to_radians());
        let (_, y50) = v.project(0.0, 50f64.to_radians());
        assert_abs_diff_eq!(y40, 0.0, epsilon = 1e-12);
        assert_relative_eq!(y50 - y40, 10f64.to_radians(), epsilon = 1e-12);
    }

    #[test]
    fn test_cylindrical_variants() {
        let p = parallels(0.0, 0.0, 0.0);
        let y = 0.5;
        let lambert = build(ProjectionClass::Cylindrical, p, "variant = 'Lambert'");
        assert_relative_eq!(lambert.project(1.0, y).1, y.sin());
        let central = build(ProjectionClass::Cylindrical, p, "variant = 'Central'");
        assert_relative_eq!(central.project(1.0, y).1, y.tan());
        let plate = build(ProjectionClass::Cylindrical, p, "");
        assert_eq!(plate.project(1.0, y), (1.0, y));
        assert!(matches!(
            Variant::new(ProjectionClass::Cylindrical, p, &"variant = 'Miller'".parse().unwrap()),
            Err(MapperError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_mollweide_theta() {
        assert_eq!(mollweide_theta(FRAC_PI_2), FRAC_PI_2);
        assert_eq!(mollweide_theta(0.0), 0.0);
        for y in [0.2_f64, 0.7, 1.2, -1.0] {
            let t = mollweide_theta(y);
            assert_abs_diff_eq!(2.0 * t + (2.0 * t).sin(), PI * y.sin(), epsilon = 1e-5);
        }
        let v = Variant::Mollweide;
        let (x, y) = v.project(PI, 0.0);
        assert_relative_eq!(x, 2.0 * SQRT_2);
        assert_eq!(y, 0.0);
    }

    #[test]
    fn test_aitoff_and_winkel_tripel_at_origin() {
        let p = parallels(0.0, 0.0, 0.0);
        for class in [ProjectionClass::Aitoff, ProjectionClass::WinkelTripel, ProjectionClass::Hammer] {
            let (x, y) = build(class, p, "").project(0.0, 0.0);
            assert_abs_diff_eq!(x, 0.0);
            assert_abs_diff_eq!(y, 0.0);
        }
    }

    #[test]
    fn test_winkel_tripel_averages_aitoff() {
        let p = parallels(0.0, 0.0, 0.0);
        let (ax, ay) = Variant::Aitoff.project(0.8, 0.4);
        let (wx, wy) = build(ProjectionClass::WinkelTripel, p, "").project(0.8, 0.4);
        assert_relative_eq!(wx, (0.8 + ax) / 2.0);
        assert_relative_eq!(wy, (0.4 + ay) / 2.0);
    }

    #[test]
    fn test_bonne_on_equator_is_sinusoidal() {
        assert_eq!(
            build(ProjectionClass::Bonne, parallels(0.0, 0.0, 0.0), ""),
            Variant::Sinusoidal
        );
        let v = build(ProjectionClass::Bonne, parallels(45.0, 0.0, 0.0), "");
        let (x, y) = v.project(0.0, 45f64.to_radians());
        assert_abs_diff_eq!(x, 0.0);
        assert_abs_diff_eq!(y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_gnomonic_center() {
        let v = build(ProjectionClass::Gnomonic, parallels(30.0, 0.0, 0.0), "");
        let (x, y) = v.project(0.0, 30f64.to_radians());
        assert_abs_diff_eq!(x, 0.0);
        assert_abs_diff_eq!(y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_robinson_sign() {
        let v = build(ProjectionClass::Robinson, parallels(0.0, 0.0, 0.0), "interpolation = 'linear'");
        let (_, north) = v.project(0.0, 0.5);
        let (_, south) = v.project(0.0, -0.5);
        assert!(north > 0.0);
        assert_eq!(south, -north);
    }
}
