use crate::config::value::{self, Definition};
use crate::error::{MapperError, Result};
use svgproj_doc::Element;
use toml::Value;

/// Four ordered scalars, optionally named.
///
/// The corners are stored as given; call [`Rectangle::orient`] before relying on their order.
#[derive(Debug, Clone, PartialEq)]
pub struct Rectangle {
    pub name: Option<String>,
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Default for Rectangle {
    fn default() -> Self {
        Rectangle::new(0.0, 0.0, 1.0, 1.0)
    }
}

impl Rectangle {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Rectangle {
            name: None,
            x0,
            y0,
            x1,
            y1,
        }
    }

    /// A named rectangle from `{name, at = [x0, y0, x1, y1]}`.
    pub fn from_definition(def: &Definition) -> Result<Self> {
        let name = value::opt_str(def, "name", "Rectangle::from_definition")?;
        let at = value::require(
            def,
            "at",
            "Rectangle::from_definition",
            name.unwrap_or("rectangle"),
        )?;
        let [x0, y0, x1, y1] = value::numbers_n::<4>(at, "at", "Rectangle::from_definition")?;
        Ok(Rectangle {
            name: name.map(str::to_string),
            ..Rectangle::new(x0, y0, x1, y1)
        })
    }

    /// An anonymous rectangle from a literal: a 4-element list or an inline definition.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Table(def) => Rectangle::from_definition(def),
            Value::Array(_) => {
                let [x0, y0, x1, y1] = value::numbers_n::<4>(value, "rectangle", "Rectangle::from_value")?;
                Ok(Rectangle::new(x0, y0, x1, y1))
            }
            _ => Err(MapperError::Internal {
                operation: "Rectangle::from_value",
                detail: format!("cannot construct a rectangle from {value}"),
            }),
        }
    }

    /// The geographic bounds carried by a marker element's `lon-min`, `lat-min`, `lon-max` and
    /// `lat-max` attributes.
    pub fn from_bounds_attributes(e: &Element) -> Result<Self> {
        let read = |key: &str| -> Result<f64> {
            let raw = e
                .attr(key)
                .ok_or_else(|| MapperError::missing("Rectangle::from_bounds_attributes", key, "input path"))?;
            raw.trim()
                .parse()
                .map_err(|_| MapperError::invalid("Rectangle::from_bounds_attributes", key, raw))
        };
        Ok(Rectangle::new(
            read("lon-min")?,
            read("lat-min")?,
            read("lon-max")?,
            read("lat-max")?,
        ))
    }

    /// A duplicate that can be modified without touching the original.
    pub fn copy(&self) -> Self {
        Rectangle {
            name: Some(format!("{} (copy)", self.name.as_deref().unwrap_or(""))),
            ..*self
        }
    }

    /// Enforce `x0 <= x1` and `y0 <= y1`, or `y0 >= y1` when `y_negative` is set.
    pub fn orient(&mut self, y_negative: bool) -> &mut Self {
        let (x0, x1) = (self.x0.min(self.x1), self.x0.max(self.x1));
        let (y0, y1) = (self.y0.min(self.y1), self.y0.max(self.y1));
        self.x0 = x0;
        self.x1 = x1;
        if y_negative {
            self.y0 = y1;
            self.y1 = y0;
        } else {
            self.y0 = y0;
            self.y1 = y1;
        }
        self
    }

    pub fn scale(&mut self, s: f64) -> &mut Self {
        self.x0 *= s;
        self.y0 *= s;
        self.x1 *= s;
        self.y1 *= s;
        self
    }

    /// Clamp a point into the rectangle.
    pub fn crop(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x.clamp(self.x0.min(self.x1), self.x0.max(self.x1)),
            y.clamp(self.y0.min(self.y1), self.y0.max(self.y1)),
        )
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// Does the point lie inside or on the border? No orientation is assumed.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.x0.min(self.x1) <= x
            && x <= self.x0.max(self.x1)
            && self.y0.min(self.y1) <= y
            && y <= self.y0.max(self.y1)
    }

    /// Do the two rectangles overlap? No orientation is assumed.
    pub fn intersects(&self, r: &Rectangle) -> bool {
        !(r.x0.min(r.x1) > self.x0.max(self.x1)
            || r.x0.max(r.x1) < self.x0.min(self.x1)
            || r.y0.min(r.y1) > self.y0.max(self.y1)
            || r.y0.max(r.y1) < self.y0.min(self.y1))
    }

    /// Smallest rectangle holding both.
    pub fn union(&self, r: &Rectangle) -> Rectangle {
        Rectangle::new(
            self.x0.min(self.x1).min(r.x0.min(r.x1)),
            self.y0.min(self.y1).min(r.y0.min(r.y1)),
            self.x0.max(self.x1).max(r.x0.max(r.x1)),
            self.y0.max(self.y1).max(r.y0.max(r.y1)),
        )
    }
}

impl std::fmt::Display for Rectangle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}, {}, {}, {}]",
            self.name.as_deref().unwrap_or("(unnamed)"),
            self.x0,
            self.y0,
            self.x1,
            self.y1
        )
    }
}
