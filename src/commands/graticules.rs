use super::{Arg, Context, add_dms, format_label, sample_line, string_arguments, style_ref, target, text_element};
use crate::config::value::{self, Definition};
use crate::diag_info;
use crate::error::{MapperError, Result};
use crate::geometry::{Rectangle, path};
use crate::registry::Ref;
use crate::resources::Style;
use crate::transform::{Stage, Transform};
use std::f64::consts::PI;
use std::rc::Rc;
use svgproj_doc::Element;
use toml::Value;

const DEG: f64 = PI / 180.0;

/// Where along its line a graticule label goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Start,
    End,
    Mid,
}

#[derive(Debug, Clone)]
struct Labels {
    position: Position,
    style: Ref<Style>,
    format: String,
}

/// One level of the grid: lines every `span` degrees.
#[derive(Debug, Clone)]
struct Division {
    span: f64,
    style: Ref<Style>,
    labels: Option<Labels>,
}

impl Division {
    fn from_definition(def: &Definition) -> Result<Self> {
        const OP: &str = "Graticules::from_definition";
        let span = value::require_f64(def, "span", OP, "divisions")?;
        if !(span.is_finite() && span > 0.0) {
            return Err(MapperError::invalid(OP, "span", span));
        }
        let labels = value::opt_table(def, "labels", OP)?
            .map(|labels| -> Result<Labels> {
                let position = match value::opt_str(labels, "position", OP)?.unwrap_or("start") {
                    "start" => Position::Start,
                    "end" => Position::End,
                    "mid" => Position::Mid,
                    other => return Err(MapperError::invalid(OP, "position", other)),
                };
                Ok(Labels {
                    position,
                    style: style_ref(labels, "style").unwrap_or_else(|| Ref::named("default-text-style")),
                    format: value::opt_str(labels, "format", OP)?
                        .unwrap_or("default-label-format")
                        .to_string(),
                })
            })
            .transpose()?;
        Ok(Division {
            span,
            style: style_ref(def, "style").unwrap_or_else(|| Ref::named("default-line-style")),
            labels,
        })
    }

    /// Is `pos` a whole multiple of this division's span?
    fn divides(&self, pos: f64) -> bool {
        let r = pos / self.span;
        (r - r.round()).abs() < 1e-9
    }
}

/// Parallels or meridians, at one or more levels of detail.
///
/// Divisions go from coarsest to finest and each span must be a whole multiple of the next. The
/// grid is walked at the finest span and every position is drawn with the coarsest division
/// whose span divides it, so a major line is never drawn twice.
#[derive(Debug, Clone)]
pub struct Graticules {
    /// Parallels when `true`, meridians otherwise.
    horizontal: bool,
    clip_to: Option<Ref<Rectangle>>,
    divisions: Vec<Division>,
    target: String,
}

impl Graticules {
    pub fn from_definition(def: &Definition) -> Result<Self> {
        const OP: &str = "Graticules::from_definition";
        let horizontal = match value::opt_str(def, "direction", OP)?.unwrap_or("horizontal") {
            "horizontal" => true,
            "vertical" => false,
            other => return Err(MapperError::invalid(OP, "direction", other)),
        };
        let divisions = value::require(def, "divisions", OP, "graticules")?;
        let divisions = match divisions {
            Value::Array(items) if !items.is_empty() => items
                .iter()
                .map(|d| {
                    d.as_table()
                        .ok_or_else(|| MapperError::invalid(OP, "divisions", d))
                        .and_then(Division::from_definition)
                })
                .collect::<Result<Vec<_>>>()?,
            other => return Err(MapperError::invalid(OP, "divisions", other)),
        };
        for pair in divisions.windows(2) {
            if !pair[1].divides(pair[0].span) {
                return Err(MapperError::invalid(OP, "span", pair[1].span));
            }
        }
        Ok(Graticules {
            horizontal,
            clip_to: def.get("clip-to").map(Ref::from_value),
            divisions,
            target: target(def, OP)?,
        })
    }

    pub fn run(&self, ctx: &mut Context<'_, '_>) -> Result<()> {
        const OP: &str = "Graticules::run";
        let mut clip = match &self.clip_to {
            Some(r) => Rectangle::clone(&*ctx.require_rectangle(r, OP)?),
            None => ctx.pipeline.rect_world.clone(),
        };
        clip.orient(false);
        // t runs across the lines and s along them; t in degrees, s in radians.
        let (t0, t1, s0, s1) = if self.horizontal {
            (clip.y0, clip.y1, clip.x0 * DEG, clip.x1 * DEG)
        } else {
            (clip.x0, clip.x1, clip.y0 * DEG, clip.y1 * DEG)
        };

        struct Level {
            style: Rc<Style>,
            labels: Option<(f64, Rc<Style>, String)>,
        }
        let levels = self
            .divisions
            .iter()
            .map(|d| -> Result<Level> {
                let labels = match &d.labels {
                    Some(l) => {
                        let s = match l.position {
                            Position::Start => s0,
                            Position::End => s1,
                            Position::Mid => (s0 + s1) / 2.0,
                        };
                        let style = ctx.require_style(Some(&l.style), OP)?;
                        Some((s, style, ctx.scope.translate(&l.format).to_string()))
                    }
                    None => None,
                };
                Ok(Level {
                    style: ctx.require_style(Some(&d.style), OP)?,
                    labels,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let strings = &ctx.scope.strings;
        let mut args = string_arguments(strings);
        let Some(finest) = self.divisions.last() else {
            return Ok(());
        };
        let span = finest.span;
        let mut drawn = Vec::new();
        let (first, last) = ((t0 / span).ceil() as i64, (t1 / span).floor() as i64);
        for n in first..=last {
            let pos = span * n as f64;
            let Some(i) = self.divisions.iter().position(|d| d.divides(pos)) else {
                continue;
            };
            let level = &levels[i];
            let t = pos * DEG;
            let line = if self.horizontal {
                sample_line(s0, t, s1, t)
            } else {
                sample_line(t, s0, t, s1)
            };
            let line = line.transformed(ctx.pipeline, Stage::Inner);
            drawn.push(level.style.decorate(Element::new("path").with_attr("d", path::polyline(&line))));

            if let Some((s, style, format)) = &level.labels {
                args.insert("pos".to_string(), Arg::Number(pos));
                add_dms(&mut args, "", pos, self.horizontal, strings)?;
                let (x, y) = if self.horizontal {
                    ctx.pipeline.project_inner(*s, t)
                } else {
                    ctx.pipeline.project_inner(t, *s)
                };
                drawn.push(text_element(x, y, format_label(format, &args)?, style));
            }
        }

        let count = drawn.len();
        for e in drawn {
            ctx.canvas.add_to_layer(&self.target, e);
        }
        diag_info!(
            ctx.scope.diagnostics(),
            OP,
            &self.target,
            "drew {count} {} elements",
            if self.horizontal { "parallel" } else { "meridian" }
        );
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::commands::test::{global_scope, world_pipeline};
    use crate::map::Canvas;
    use crate::transform::Mode;
    use approx::assert_relative_eq;
    use svgproj_doc::Document;

    fn graticules(text: &str) -> Result<Graticules> {
        Graticules::from_definition(&text.parse().unwrap())
    }

    fn run(text: &str) -> Vec<Element> {
        let input = Document::new(Element::new("svg"));
        let scope = global_scope();
        let pipeline = world_pipeline(Mode::Keep);
        let mut canvas = Canvas::fresh(&input);
        let mut ctx = Context {
            scope: &scope,
            pipeline: &pipeline,
            input: &input,
            canvas: &mut canvas,
        };
        graticules(text).unwrap().run(&mut ctx).unwrap();
        canvas
            .layer("grid")
            .map(|l| l.elements().cloned().collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_spans_must_divide_each_other() {
        assert!(matches!(
            graticules("divisions = [{ span = 10 }, { span = 3 }]"),
            Err(MapperError::InvalidValue { ref field, .. }) if field == "span"
        ));
        assert!(graticules("divisions = [{ span = 30 }, { span = 10 }, { span = 2.5 }]").is_ok());
        assert!(matches!(
            graticules("divisions = []"),
            Err(MapperError::InvalidValue { .. })
        ));
        assert!(matches!(graticules("direction = 'diagonal'\ndivisions = [{ span = 10 }]"), Err(MapperError::InvalidValue { .. })));
    }

    #[test]
    fn test_decimal_spans_divide() {
        for spans in ["[{ span = 1 }, { span = 0.1 }]", "[{ span = 0.5 }, { span = 0.1 }]", "[{ span = 0.3 }, { span = 0.1 }]"] {
            assert!(graticules(&format!("divisions = {spans}")).is_ok(), "{spans}");
        }
        assert!(graticules("divisions = [{ span = 1 }, { span = 0.3 }]").is_err());
    }

    #[test]
    fn test_coarsest_division_wins() {
        let drawn = run(
            r#"
target = "grid"
clip-to = [-180, -45, 180, 45]
divisions = [
    { span = 30, style = { style = "stroke:#ff0000" } },
    { span = 15, style = { style = "stroke:#00ff00" } },
]
"#,
        );
        // -45, -30, -15, 0, 15, 30, 45
        let styles: Vec<&str> = drawn.iter().filter_map(|e| e.attr("style")).collect();
        assert_eq!(
            styles,
            ["stroke:#00ff00", "stroke:#ff0000", "stroke:#00ff00", "stroke:#ff0000", "stroke:#00ff00", "stroke:#ff0000", "stroke:#00ff00"]
        );
    }

    #[test]
    fn test_labelled_meridians() {
        let drawn = run(
            r#"
target = "grid"
direction = "vertical"
clip-to = [0, -10, 20, 10]
divisions = [{ span = 10, labels = { position = "end" } }]
"#,
        );
        let texts: Vec<&Element> = drawn.iter().filter(|e| e.tag == "text").collect();
        let labels: Vec<String> = texts.iter().map(|e| e.text()).collect();
        assert_eq!(labels, ["0°0'W", "10°0'E", "20°0'E"]);
        // Labels of meridians at the end of the line sit on latitude 10°N: page y 80.
        assert_relative_eq!(texts[1].attr("x").unwrap().parse::<f64>().unwrap(), 190.0, epsilon = 1e-6);
        assert_relative_eq!(texts[1].attr("y").unwrap().parse::<f64>().unwrap(), 80.0, epsilon = 1e-6);
    }

    #[test]
    fn test_lines_follow_the_projection() {
        let drawn = run("target = 'grid'\nclip-to = [-90, 0, 90, 0.5]\ndivisions = [{ span = 1 }]");
        assert_eq!(drawn.len(), 1);
        let b = path::bounding_box(&path::element_path(&drawn[0]).unwrap()).unwrap();
        assert_relative_eq!(b.x0, 90.0, epsilon = 1e-6);
        assert_relative_eq!(b.x1, 270.0, epsilon = 1e-6);
        assert_relative_eq!(b.y0, 90.0, epsilon = 1e-6);
    }
}
