use super::{Arg, Context, add_dms, sample_line, string_arguments, style_ref, target, text_element};
use crate::config::value::{self, Definition};
use crate::error::{MapperError, Result};
use crate::geometry::path;
use crate::geometry::Unit;
use crate::registry::Ref;
use crate::resources::Style;
use crate::transform::{Stage, Transform};
use crate::{diag_info, diag_warn};
use std::f64::consts::PI;
use svgproj_doc::Element;

const DEG: f64 = PI / 180.0;

/// How the label of each point is drawn.
#[derive(Debug, Clone)]
struct Label {
    style: Ref<Style>,
    formats: Vec<String>,
    /// Offset of the text from its point, in world radians.
    nudge: (f64, f64),
}

/// Put symbols, connecting lines and labels at a list of geographic positions.
///
/// The first pair in `at` is always a longitude and latitude in degrees. With the `absolute` mode
/// (the default) the following pairs are too; with `relative` they are a distance in the
/// command's unit and an angle in degrees from due east. In `central` mode (the default) every
/// line and offset starts from the first point, in `sequential` mode from the previous one.
#[derive(Debug, Clone)]
pub struct Place {
    relative: bool,
    sequential: bool,
    unit: Ref<Unit>,
    line_style: Option<Ref<Style>>,
    symbols: Vec<String>,
    label: Option<Label>,
    at: Vec<f64>,
    target: String,
}

/// A point of the command in world radians, with the length of the segment leading to it.
#[derive(Debug, Clone, Copy, PartialEq)]
struct WorldPoint {
    x: f64,
    y: f64,
    length: f64,
}

impl Place {
    pub fn from_definition(def: &Definition) -> Result<Self> {
        const OP: &str = "Place::from_definition";
        let (mut relative, mut sequential) = (false, false);
        if let Some(mode) = def.get("mode") {
            for flag in value::strings(mode, "mode", OP)? {
                match flag.as_str() {
                    "absolute" => relative = false,
                    "relative" => relative = true,
                    "central" => sequential = false,
                    "sequential" => sequential = true,
                    _ => return Err(MapperError::invalid(OP, "mode", flag)),
                }
            }
        }
        let at = value::numbers(value::require(def, "at", OP, "place")?, "at", OP)?;
        if at.len() < 2 || at.len() % 2 != 0 {
            return Err(MapperError::invalid(OP, "at", format!("{at:?}")));
        }
        let line_style = match value::opt_table(def, "line", OP)? {
            Some(line) => Some(style_ref(line, "style").unwrap_or_else(|| Ref::named("default-line-style"))),
            None => None,
        };
        let symbols = match def.get("symbol") {
            Some(v) => value::strings(v, "symbol", OP)?,
            None => Vec::new(),
        };
        let label = value::opt_table(def, "label", OP)?
            .map(|label| -> Result<Label> {
                let formats = match label.get("format") {
                    Some(v) => value::strings(v, "format", OP)?,
                    None => vec!["default-label-format".to_string()],
                };
                let nudge = match label.get("nudge") {
                    Some(v) => value::numbers_n::<2>(v, "nudge", OP)?,
                    None => [0.0, 0.0],
                };
                Ok(Label {
                    style: style_ref(label, "style").unwrap_or_else(|| Ref::named("default-text-style")),
                    formats,
                    nudge: (nudge[0] * DEG, nudge[1] * DEG),
                })
            })
            .transpose()?;
        Ok(Place {
            relative,
            sequential,
            unit: def
                .get("unit")
                .map_or_else(|| Ref::named("no-unit"), Ref::from_value),
            line_style,
            symbols,
            label,
            at,
            target: target(def, OP)?,
        })
    }

    /// Absolute positions of all points.
    fn world_points(&self, unit: &Unit) -> Vec<WorldPoint> {
        let (mut x, mut y) = (self.at[0] * DEG, self.at[1] * DEG);
        let mut points = vec![WorldPoint { x, y, length: 0.0 }];
        for pair in self.at[2..].chunks_exact(2) {
            let (x1, y1, length) = if self.relative {
                let (x1, y1) = unit.move_to(x, y, pair[0], pair[1] * DEG);
                (x1, y1, pair[0])
            } else {
                let (x1, y1) = (pair[0] * DEG, pair[1] * DEG);
                (x1, y1, unit.measure(x, y, x1, y1))
            };
            points.push(WorldPoint { x: x1, y: y1, length });
            if self.sequential {
                (x, y) = (x1, y1);
            }
        }
        points
    }

    /// Lines first, then symbols, then labels, so that labels end up on top.
    pub fn run(&self, ctx: &mut Context<'_, '_>) -> Result<()> {
        const OP: &str = "Place::run";
        let unit = ctx.require_unit(&self.unit, OP)?;
        let points = self.world_points(&unit);
        let mut drawn: Vec<Element> = Vec::new();

        if let Some(style) = &self.line_style {
            let style = ctx.require_style(Some(style), OP)?;
            let mut start = points[0];
            for p in &points[1..] {
                let line = sample_line(start.x, start.y, p.x, p.y).transformed(ctx.pipeline, Stage::Inner);
                drawn.push(style.decorate(Element::new("path").with_attr("d", path::polyline(&line))));
                if self.sequential {
                    start = *p;
                }
            }
        }

        if !self.symbols.is_empty() {
            let mut names = self.symbols.as_slice();
            if names.len() > points.len() {
                diag_warn!(ctx.scope.diagnostics(), OP, &self.target, "more symbols than points, discarding extra symbols");
                names = &names[..points.len()];
            }
            let symbols = names
                .iter()
                .map(|name| match name.as_str() {
                    "" => Ok(None),
                    name => ctx.require_symbol(name, OP).map(Some),
                })
                .collect::<Result<Vec<_>>>()?;
            for (i, p) in points.iter().enumerate() {
                let symbol = symbols.get(i).or(symbols.last()).and_then(Option::as_ref);
                if let Some(symbol) = symbol {
                    let (x, y) = ctx.pipeline.project_inner(p.x, p.y);
                    drawn.push(ctx.place_symbol(symbol, x, y)?);
                }
            }
        }

        if let Some(label) = &self.label {
            let mut formats = label.formats.as_slice();
            if formats.len() > points.len() {
                diag_warn!(ctx.scope.diagnostics(), OP, &self.target, "more labels than points, discarding extra labels");
                formats = &formats[..points.len()];
            }
            let style = ctx.require_style(Some(&label.style), OP)?;
            let strings = &ctx.scope.strings;
            let mut args = string_arguments(strings);
            for (i, p) in points.iter().enumerate() {
                let Some(format) = formats.get(i).or(formats.last()) else {
                    break;
                };
                let (x_deg, y_deg) = (p.x / DEG, p.y / DEG);
                args.insert("length".to_string(), Arg::Number(p.length));
                args.insert("unit".to_string(), Arg::from(unit.name.as_str()));
                args.insert("count".to_string(), Arg::Integer(i as i64));
                args.insert("x-pos".to_string(), Arg::Number(x_deg));
                args.insert("y-pos".to_string(), Arg::Number(y_deg));
                add_dms(&mut args, "x-", x_deg, false, strings)?;
                add_dms(&mut args, "y-", y_deg, true, strings)?;
                let text = super::format_label(ctx.scope.translate(format), &args)?;
                let (x, y) = ctx.pipeline.project_inner(p.x + label.nudge.0, p.y + label.nudge.1);
                drawn.push(text_element(x, y, text, &style));
            }
        }

        let count = points.len();
        for e in drawn {
            ctx.canvas.add_to_layer(&self.target, e);
        }
        diag_info!(ctx.scope.diagnostics(), OP, &self.target, "placed {count} points");
        Ok(())
    }
}
