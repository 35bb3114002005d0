//! Path data and transform handling for SVG elements.

use crate::error::{MapperError, Result};
use crate::geometry::Rectangle;
use geo_types::LineString;
use kurbo::{Affine, BezPath, PathEl, Point};
use std::fmt::Write;
use svgproj_doc::Element;

/// Parse SVG path data into absolute path elements.
pub fn parse(d: &str) -> Result<BezPath> {
    BezPath::from_svg(d).map_err(|e| MapperError::invalid("path::parse", "d", format!("{d} ({e})")))
}

/// The parsed `d` attribute of a path element.
pub fn element_path(e: &Element) -> Result<BezPath> {
    let d = e
        .attr("d")
        .ok_or_else(|| MapperError::missing("path::element_path", "d", &e.tag))?;
    parse(d)
}

fn on_curve_points(path: &BezPath) -> impl Iterator<Item = Point> + '_ {
    path.elements().iter().filter_map(|el| match *el {
        PathEl::MoveTo(p) | PathEl::LineTo(p) | PathEl::QuadTo(_, p) | PathEl::CurveTo(_, _, p) => Some(p),
        PathEl::ClosePath => None,
    })
}

/// Bounding box of the path's on-curve points, `None` for an empty path.
pub fn bounding_box(path: &BezPath) -> Option<Rectangle> {
    let mut points = on_curve_points(path);
    let first = points.next()?;
    let mut r = Rectangle::new(first.x, first.y, first.x, first.y);
    for p in points {
        r.x0 = r.x0.min(p.x);
        r.y0 = r.y0.min(p.y);
        r.x1 = r.x1.max(p.x);
        r.y1 = r.y1.max(p.y);
    }
    Some(r)
}

/// Bounding box of a path element, or of every path inside a group.
pub fn element_bounding_box(e: &Element) -> Result<Option<Rectangle>> {
    let mut result: Option<Rectangle> = None;
    for p in e.descendants().filter(|d| d.tag == "path") {
        if let Some(b) = bounding_box(&element_path(p)?) {
            result = Some(match result {
                Some(r) => r.union(&b),
                None => b,
            });
        }
    }
    Ok(result)
}

/// Center of the bounding box of the paths in an element.
pub fn element_center(e: &Element) -> Result<(f64, f64)> {
    element_bounding_box(e)?
        .map(|r| r.center())
        .ok_or_else(|| MapperError::MissingGraphic {
            operation: "path::element_center",
            id: e.attr("id").unwrap_or(&e.tag).to_string(),
            document: "input file".to_string(),
        })
}

/// Map every point of the path, control points included, through `f`.
pub fn map_points(path: &BezPath, mut f: impl FnMut(f64, f64) -> (f64, f64)) -> BezPath {
    let mut m = |p: Point| {
        let (x, y) = f(p.x, p.y);
        Point::new(x, y)
    };
    let mut out = BezPath::new();
    for el in path.elements() {
        out.push(match *el {
            PathEl::MoveTo(p) => PathEl::MoveTo(m(p)),
            PathEl::LineTo(p) => PathEl::LineTo(m(p)),
            PathEl::QuadTo(p1, p2) => PathEl::QuadTo(m(p1), m(p2)),
            PathEl::CurveTo(p1, p2, p3) => PathEl::CurveTo(m(p1), m(p2), m(p3)),
            PathEl::ClosePath => PathEl::ClosePath,
        });
    }
    out
}

/// Path data for an open polyline.
pub fn polyline(line: &LineString<f64>) -> String {
    let mut d = String::new();
    for (i, c) in line.coords().enumerate() {
        let _ = write!(d, "{}{:.6},{:.6}", if i == 0 { "M" } else { " L" }, c.x, c.y);
    }
    d
}

/// Parse the `transform` attribute. `matrix`, `translate` and `scale` are understood; anything
/// else is ignored.
pub fn parse_transform(s: &str) -> Result<Affine> {
    let mut result = Affine::IDENTITY;
    let mut rest = s.trim();
    while let Some(open) = rest.find('(') {
        let name = rest[..open].trim().trim_start_matches(',').trim();
        let close = rest[open..]
            .find(')')
            .map(|c| open + c)
            .ok_or_else(|| MapperError::invalid("path::parse_transform", "transform", s))?;
        let args = rest[open + 1..close]
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|a| !a.is_empty())
            .map(|a| a.parse::<f64>())
            .collect::<std::result::Result<Vec<f64>, _>>()
            .map_err(|_| MapperError::invalid("path::parse_transform", "transform", s))?;
        let step = match (name, args.as_slice()) {
            ("matrix", [a, b, c, d, e, f]) => Affine::new([*a, *b, *c, *d, *e, *f]),
            ("translate", [x]) => Affine::translate((*x, 0.0)),
            ("translate", [x, y]) => Affine::translate((*x, *y)),
            ("scale", [s]) => Affine::scale(*s),
            ("scale", [x, y]) => Affine::scale_non_uniform(*x, *y),
            ("matrix" | "translate" | "scale", _) => {
                return Err(MapperError::invalid("path::parse_transform", "transform", s));
            }
            _ => Affine::IDENTITY,
        };
        result = result * step;
        rest = &rest[close + 1..];
    }
    Ok(result)
}

pub fn format_affine(a: Affine) -> String {
    let [a, b, c, d, e, f] = a.as_coeffs();
    format!("matrix({a:.6},{b:.6},{c:.6},{d:.6},{e:.6},{f:.6})")
}

/// Wrap `fragment` in a group that maps `(x0, y0)` onto `(x1, y1)` and scales by `xs`, `ys`.
pub fn wrap(fragment: Element, x0: f64, y0: f64, x1: f64, y1: f64, xs: f64, ys: f64) -> Element {
    let matrix = Affine::new([xs, 0.0, 0.0, ys, x1 - xs * x0, y1 - ys * y0]);
    Element::new("g")
        .with_attr("transform", format_affine(matrix))
        .with_child(fragment)
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bounding_box_relative_commands() {
        let p = parse("m 10,10 l 5,-20 h 3 v 40 z").unwrap();
        let b = bounding_box(&p).unwrap();
        assert_eq!((b.x0, b.y0, b.x1, b.y1), (10.0, -10.0, 18.0, 30.0));
    }

    #[test]
    fn test_empty_path_has_no_box() {
        assert!(bounding_box(&BezPath::new()).is_none());
    }

    #[test]
    fn test_group_bounding_box() {
        let g = Element::new("g")
            .with_child(Element::new("path").with_attr("d", "M0,0 L2,2"))
            .with_child(Element::new("g").with_child(Element::new("path").with_attr("d", "M5,-1 L6,1")));
        let b = element_bounding_box(&g).unwrap().unwrap();
        assert_eq!((b.x0, b.y0, b.x1, b.y1), (0.0, -1.0, 6.0, 2.0));
        assert_eq!(element_center(&g).unwrap(), (3.0, 0.5));
    }

    #[test]
    fn test_map_points() {
        let p = parse("M1,2 C3,4 5,6 7,8 Z").unwrap();
        let q = map_points(&p, |x, y| (x * 2.0, -y));
        assert_eq!(
            q.elements(),
            &[
                PathEl::MoveTo(Point::new(2.0, -2.0)),
                PathEl::CurveTo(Point::new(6.0, -4.0), Point::new(10.0, -6.0), Point::new(14.0, -8.0)),
                PathEl::ClosePath
            ]
        );
    }

    #[test]
    fn test_parse_transform() {
        let a = parse_transform("matrix(1,0,0,1,5,6)").unwrap();
        assert_eq!(a.as_coeffs(), [1.0, 0.0, 0.0, 1.0, 5.0, 6.0]);
        let a = parse_transform("translate(10 20) scale(2)").unwrap();
        let p = a * Point::new(1.0, 1.0);
        assert_relative_eq!(p.x, 12.0);
        assert_relative_eq!(p.y, 22.0);
        assert_eq!(parse_transform("").unwrap(), Affine::IDENTITY);
        assert!(parse_transform("matrix(1,2)").is_err());
    }

    #[test]
    fn test_wrap() {
        let g = wrap(Element::new("circle"), 1.0, 1.0, 10.0, 20.0, 2.0, 2.0);
        assert_eq!(g.attr("transform"), Some("matrix(2.000000,0.000000,0.000000,2.000000,8.000000,18.000000)"));
        assert_eq!(g.elements().next().unwrap().tag, "circle");
    }

    #[test]
    fn test_polyline() {
        let line: LineString<f64> = vec![(0.0, 0.0), (1.5, 2.0)].into();
        assert_eq!(polyline(&line), "M0.000000,0.000000 L1.500000,2.000000");
    }
}
