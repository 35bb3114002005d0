use super::{Context, style_ref, target};
use crate::config::value::{self, Definition};
use crate::diag_info;
use crate::error::{MapperError, Result};
use crate::geometry::path;
use crate::geometry::Rectangle;
use crate::registry::Ref;
use crate::resources::{Match, Style};
use crate::transform::{Stage, Transform};
use kurbo::{Affine, Point};
use std::str::FromStr;
use svgproj_doc::Element;

/// What a [`Project`] command carries over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum What {
    Paths,
    Texts,
    Marks,
}

impl What {
    fn svg_type(self) -> &'static str {
        match self {
            What::Paths => "path",
            What::Texts => "text",
            What::Marks => "g",
        }
    }
}

impl FromStr for What {
    type Err = MapperError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "paths" => Ok(What::Paths),
            "texts" => Ok(What::Texts),
            "marks" => Ok(What::Marks),
            _ => Err(MapperError::invalid("Project::from_definition", "what", s)),
        }
    }
}

/// Copy matching elements of the input into the output, through the map's projection.
///
/// Paths have every point projected. Texts keep their shape and have their anchor moved to the
/// projected position. Marks are groups that stand for a single point, the center of their
/// paths; they are moved whole, or swapped for a library symbol.
#[derive(Debug, Clone)]
pub struct Project {
    pub what: What,
    matcher: Ref<Match>,
    style: Option<Ref<Style>>,
    replacement: Option<String>,
    target: String,
}

impl Project {
    pub fn from_definition(def: &Definition) -> Result<Self> {
        const OP: &str = "Project::from_definition";
        let what = value::require_str(def, "what", OP, "project")?.parse()?;
        let matcher = Ref::from_value(value::require(def, "match", OP, "project")?);
        Ok(Project {
            what,
            matcher,
            style: style_ref(def, "style"),
            replacement: value::opt_str(def, "replacement-symbol", OP)?.map(str::to_string),
            target: target(def, OP)?,
        })
    }

    pub fn run(&self, ctx: &mut Context<'_, '_>) -> Result<()> {
        const OP: &str = "Project::run";
        let style = ctx.require_style(self.style.as_ref(), OP)?;
        let matcher = ctx.scope.get_match(&self.matcher)?.with_svg_type(self.what.svg_type());
        let replacement = self
            .replacement
            .as_deref()
            .map(|name| ctx.require_symbol(name, OP))
            .transpose()?;

        let mut projected = Vec::new();
        let mut rejected = 0;
        for e in matcher.iter(&ctx.input.root)? {
            if let Some(bbox) = self.bounding_box(e)? {
                if !ctx.pipeline.keeps(&bbox, Stage::Full) {
                    rejected += 1;
                    continue;
                }
            }
            let out = match self.what {
                What::Paths => {
                    let mut e = e.clone();
                    style.apply(&mut e);
                    let d = path::element_path(&e)?.transformed(ctx.pipeline, Stage::Full);
                    e.set_attr("d", d.to_svg());
                    e
                }
                What::Texts => {
                    let (x, y) = text_position(e)?;
                    let m = match e.attr("transform") {
                        Some(t) => path::parse_transform(t)?,
                        None => Affine::IDENTITY,
                    };
                    let p0 = m * Point::new(x, y);
                    let (x1, y1) = ctx.pipeline.project(p0.x, p0.y);
                    let m = Affine::translate((x1 - p0.x, y1 - p0.y)) * m;
                    let mut e = e.clone();
                    e.set_attr("transform", path::format_affine(m));
                    e
                }
                What::Marks => {
                    let (x, y) = path::element_center(e)?;
                    let (x1, y1) = ctx.pipeline.project(x, y);
                    match &replacement {
                        Some(symbol) => ctx.place_symbol(symbol, x1, y1)?,
                        None => path::wrap(e.clone(), x, y, x1, y1, 1.0, 1.0),
                    }
                }
            };
            projected.push(out);
        }

        let count = projected.len();
        for e in projected {
            ctx.canvas.add_to_layer(&self.target, e);
        }
        diag_info!(
            ctx.scope.diagnostics(),
            OP,
            &matcher.to_string(),
            "projected {count} {}, rejected {rejected}",
            self.what.svg_type()
        );
        Ok(())
    }

    /// The box tested against the input rectangle: the paths of paths and marks, the anchor of
    /// texts.
    fn bounding_box(&self, e: &Element) -> Result<Option<Rectangle>> {
        match self.what {
            What::Paths | What::Marks => path::element_bounding_box(e),
            What::Texts => {
                let (x, y) = text_position(e)?;
                Ok(Some(Rectangle::new(x, y, x, y)))
            }
        }
    }
}

fn text_position(e: &Element) -> Result<(f64, f64)> {
    const OP: &str = "Project::run";
    let coordinate = |key: &str| -> Result<f64> {
        let v = e.attr(key).ok_or_else(|| MapperError::missing(OP, key, &e.tag))?;
        v.trim().parse().map_err(|_| MapperError::invalid(OP, key, v))
    };
    Ok((coordinate("x")?, coordinate("y")?))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::commands::test::{global_scope, world_pipeline};
    use crate::map::Canvas;
    use crate::transform::Mode;
    use approx::assert_relative_eq;
    use svgproj_doc::Document;

    const INPUT: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="360" height="180">
  <path id="coast" d="M180,90 L270,45" style="stroke:#000000;fill:none"/>
  <path id="far" d="M500,500 L510,510"/>
  <text id="label" x="180" y="90">Origin</text>
  <g id="town"><path d="M90,45 L100,55"/></g>
</svg>"#;

    fn run(def: &str, mode: Mode) -> Canvas {
        let input = Document::parse(INPUT).unwrap();
        let scope = global_scope();
        let pipeline = world_pipeline(mode);
        let mut canvas = Canvas::fresh(&input);
        let mut ctx = Context {
            scope: &scope,
            pipeline: &pipeline,
            input: &input,
            canvas: &mut canvas,
        };
        Project::from_definition(&def.parse().unwrap())
            .unwrap()
            .run(&mut ctx)
            .unwrap();
        canvas
    }

    fn layer<'c>(canvas: &'c Canvas, name: &str) -> Vec<&'c Element> {
        canvas.layer(name).map(|l| l.elements().collect()).unwrap_or_default()
    }

    #[test]
    fn test_paths_are_styled_and_projected() {
        let canvas = run(
            "what = 'paths'\nmatch = 'coast'\nstyle = { style = 'stroke:#ff0000' }",
            Mode::Keep,
        );
        let paths = layer(&canvas, "default");
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].attr("style"), Some("stroke:#ff0000;fill:none"));
        let d = path::element_path(paths[0]).unwrap();
        let b = path::bounding_box(&d).unwrap();
        assert_relative_eq!(b.x0, 180.0, epsilon = 1e-9);
        assert_relative_eq!(b.x1, 270.0, epsilon = 1e-9);
    }

    #[test]
    fn test_clip_rejects_outside_elements() {
        let def = "what = 'paths'\nmatch = { pattern = { id = '.*' } }\ntarget = 'land'";
        // The path inside `town` has no id.
        assert_eq!(layer(&run(def, Mode::Keep), "land").len(), 2);
        assert_eq!(layer(&run(def, Mode::Clip), "land").len(), 1);
    }

    #[test]
    fn test_text_is_moved_by_transform() {
        let canvas = run("what = 'texts'\nmatch = 'label'", Mode::Keep);
        let texts = layer(&canvas, "default");
        assert_eq!(texts.len(), 1);
        let m = path::parse_transform(texts[0].attr("transform").unwrap()).unwrap();
        let p = m * Point::new(180.0, 90.0);
        assert_relative_eq!(p.x, 180.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 90.0, epsilon = 1e-6);
        assert_eq!(texts[0].text(), "Origin");
    }

    #[test]
    fn test_marks_are_wrapped() {
        let canvas = run("what = 'marks'\nmatch = 'town'", Mode::Keep);
        let marks = layer(&canvas, "default");
        assert_eq!(marks.len(), 1);
        assert_eq!(marks[0].tag, "g");
        assert_eq!(marks[0].elements().next().and_then(|e| e.attr("id")), Some("town"));
    }

    #[test]
    fn test_unknown_what() {
        assert!(matches!(
            Project::from_definition(&"what = 'lines'\nmatch = 'x'".parse().unwrap()),
            Err(MapperError::InvalidValue { .. })
        ));
        assert!(matches!(
            Project::from_definition(&"what = 'paths'".parse().unwrap()),
            Err(MapperError::MissingField { .. })
        ));
    }
}
