//! Commands: the statements of a map that draw into the output document.
//!
//! Commands are built when a map loads its `do` section and run, in order, once the map's
//! pipeline and output document exist. Each one reads the map's [`Context`] and appends
//! elements to a target layer of the output.

mod graticules;
mod place;
mod project;

pub use graticules::Graticules;
pub use place::Place;
pub use project::Project;

use crate::config::value::Definition;
use crate::error::{MapperError, Result};
use crate::geometry::{Rectangle, Unit, to_dms};
use crate::map::Canvas;
use crate::registry::{Ref, Scope};
use crate::resources::{Strings, Style, Symbol};
use crate::transform::Pipeline;
use indexmap::IndexMap;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;
use svgproj_doc::{Document, Element, Node};

/// Layer that commands draw into unless told otherwise.
pub const DEFAULT_TARGET: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Project,
    Place,
    Graticules,
}

impl CommandKind {
    pub const ALL: [CommandKind; 3] = [CommandKind::Project, CommandKind::Place, CommandKind::Graticules];

    pub fn keyword(self) -> &'static str {
        match self {
            CommandKind::Project => "project",
            CommandKind::Place => "place",
            CommandKind::Graticules => "graticules",
        }
    }
}

impl FromStr for CommandKind {
    type Err = MapperError;

    fn from_str(s: &str) -> Result<Self> {
        CommandKind::ALL
            .into_iter()
            .find(|k| k.keyword() == s)
            .ok_or_else(|| MapperError::UnexpectedField {
                operation: "CommandKind::from_str",
                field: s.to_string(),
                context: "commands".to_string(),
            })
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug, Clone)]
pub enum Command {
    Project(Project),
    Place(Place),
    Graticules(Graticules),
}

impl Command {
    pub fn from_definition(kind: CommandKind, def: &Definition) -> Result<Self> {
        Ok(match kind {
            CommandKind::Project => Command::Project(Project::from_definition(def)?),
            CommandKind::Place => Command::Place(Place::from_definition(def)?),
            CommandKind::Graticules => Command::Graticules(Graticules::from_definition(def)?),
        })
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Project(_) => CommandKind::Project,
            Command::Place(_) => CommandKind::Place,
            Command::Graticules(_) => CommandKind::Graticules,
        }
    }

    pub fn run(&self, ctx: &mut Context<'_, '_>) -> Result<()> {
        match self {
            Command::Project(c) => c.run(ctx),
            Command::Place(c) => c.run(ctx),
            Command::Graticules(c) => c.run(ctx),
        }
    }
}

/// What a running command can see and change.
pub struct Context<'a, 's> {
    pub scope: &'a Scope<'s>,
    pub pipeline: &'a Pipeline,
    pub input: &'a Document,
    pub canvas: &'a mut Canvas,
}

impl Context<'_, '_> {
    /// A style that must exist. No style at all is an empty one.
    fn require_style(&self, r: Option<&Ref<Style>>, operation: &'static str) -> Result<Rc<Style>> {
        let Some(r) = r else {
            return Ok(Rc::new(Style::default()));
        };
        self.scope
            .get_style(r)?
            .ok_or_else(|| MapperError::unresolved(operation, "style", &r.to_string()))
    }

    fn require_symbol(&self, name: &str, operation: &'static str) -> Result<Rc<Symbol>> {
        self.scope
            .get_symbol(name)?
            .ok_or_else(|| MapperError::unresolved(operation, "symbol", name))
    }

    fn require_unit(&self, r: &Ref<Unit>, operation: &'static str) -> Result<Rc<Unit>> {
        self.scope
            .get_unit(r)?
            .ok_or_else(|| MapperError::unresolved(operation, "unit", &r.to_string()))
    }

    fn require_rectangle(&self, r: &Ref<Rectangle>, operation: &'static str) -> Result<Rc<Rectangle>> {
        self.scope
            .get_rectangle(r)?
            .ok_or_else(|| MapperError::unresolved(operation, "rectangle", &r.to_string()))
    }

    /// Draw a symbol with its anchor on the output point `(x, y)`.
    fn place_symbol(&self, symbol: &Symbol, x: f64, y: f64) -> Result<Element> {
        let graphic = symbol.graphic()?;
        let (ax, ay) = symbol.anchor;
        Ok(crate::geometry::path::wrap(
            Element::clone(&graphic),
            ax,
            ay,
            x,
            y,
            symbol.scale,
            symbol.scale,
        ))
    }
}

/// A value a label format can refer to.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Text(String),
    Integer(i64),
    Number(f64),
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Text(s) => f.write_str(s),
            Arg::Integer(i) => write!(f, "{i}"),
            Arg::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::Text(s.to_string())
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Arg::Text(s)
    }
}

impl From<f64> for Arg {
    fn from(n: f64) -> Self {
        Arg::Number(n)
    }
}

impl From<i64> for Arg {
    fn from(i: i64) -> Self {
        Arg::Integer(i)
    }
}

/// Named values for [`format_label`].
pub type Arguments = IndexMap<String, Arg>;

/// Arguments holding every entry of the string table.
pub fn string_arguments(strings: &Strings) -> Arguments {
    strings
        .iter()
        .map(|(k, v)| (k.to_string(), Arg::from(v)))
        .collect()
}

/// Add `{prefix}deg`, `min`, `sec` and `card` for an angle in degrees.
pub fn add_dms(args: &mut Arguments, prefix: &str, degrees: f64, is_latitude: bool, strings: &Strings) -> Result<()> {
    let dms = to_dms(degrees, is_latitude, strings)?;
    args.insert(format!("{prefix}deg"), Arg::Integer(i64::from(dms.deg)));
    args.insert(format!("{prefix}min"), Arg::Integer(i64::from(dms.min)));
    args.insert(format!("{prefix}sec"), Arg::Number(dms.sec));
    args.insert(format!("{prefix}card"), Arg::Text(dms.card));
    Ok(())
}

/// Fill a label template.
///
/// `{key}` is replaced by the argument's text and `{key:.Nf}` by the number with `N` decimals.
/// `{{` and `}}` stand for literal braces.
///
/// ```
/// use svgproj::commands::{Arg, Arguments, format_label};
///
/// let mut args = Arguments::new();
/// args.insert("deg".to_string(), Arg::Integer(45));
/// args.insert("sec".to_string(), Arg::Number(12.345));
/// assert_eq!(format_label("{deg}° {sec:.1f}\"", &args).unwrap(), "45° 12.3\"");
/// ```
pub fn format_label(template: &str, args: &Arguments) -> Result<String> {
    const OP: &str = "format_label";
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(i) = rest.find(['{', '}']) {
        out.push_str(&rest[..i]);
        let tail = &rest[i..];
        if tail.starts_with("{{") || tail.starts_with("}}") {
            out.push_str(&tail[..1]);
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with('}') {
            return Err(MapperError::invalid(OP, "format", template));
        }
        let close = tail
            .find('}')
            .ok_or_else(|| MapperError::invalid(OP, "format", template))?;
        let field = &tail[1..close];
        let (key, spec) = match field.split_once(':') {
            Some((key, spec)) => (key, Some(spec)),
            None => (field, None),
        };
        let arg = args
            .get(key)
            .ok_or_else(|| MapperError::unresolved(OP, "label format value", key))?;
        match spec {
            None | Some("") => out.push_str(&arg.to_string()),
            Some(spec) => {
                let precision = spec
                    .strip_prefix('.')
                    .and_then(|s| s.strip_suffix('f'))
                    .and_then(|n| n.parse::<usize>().ok())
                    .ok_or_else(|| MapperError::invalid(OP, "format", field))?;
                let n = match arg {
                    Arg::Number(n) => *n,
                    Arg::Integer(i) => *i as f64,
                    Arg::Text(_) => return Err(MapperError::invalid(OP, key, arg)),
                };
                out.push_str(&format!("{n:.precision$}"));
            }
        }
        rest = &tail[close + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// A text element at `(x, y)`.
fn text_element(x: f64, y: f64, text: String, style: &Style) -> Element {
    style.decorate(
        Element::new("text")
            .with_attr("x", format!("{x:.6}"))
            .with_attr("y", format!("{y:.6}"))
            .with_child(Node::Text(text)),
    )
}

/// Number of straight pieces a line drawn in world coordinates is cut into before projecting.
const LINE_SAMPLES: usize = 64;

/// Points evenly spaced from `(x0, y0)` to `(x1, y1)`, both included.
fn sample_line(x0: f64, y0: f64, x1: f64, y1: f64) -> geo_types::LineString<f64> {
    (0..=LINE_SAMPLES)
        .map(|i| {
            let t = i as f64 / LINE_SAMPLES as f64;
            geo_types::coord! { x: x0 + (x1 - x0) * t, y: y0 + (y1 - y0) * t }
        })
        .collect()
}

/// Optional `style` reference of a command statement.
fn style_ref(def: &Definition, key: &str) -> Option<Ref<Style>> {
    def.get(key).map(Ref::from_value)
}

fn target(def: &Definition, operation: &'static str) -> Result<String> {
    Ok(crate::config::value::opt_str(def, "target", operation)?
        .unwrap_or(DEFAULT_TARGET)
        .to_string())
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::diagnostics::NoDiagnostics;
    use crate::projection::{Projection, ProjectionClass};
    use crate::transform::{Mode, Viewport};

    /// A plate carrée map of the whole world on a 360 by 180 page.
    pub(crate) fn world_pipeline(mode: Mode) -> Pipeline {
        Pipeline::new(
            &Projection::from_class(ProjectionClass::Cylindrical),
            Rectangle::new(0.0, 0.0, 360.0, 180.0),
            Rectangle::new(-180.0, -90.0, 180.0, 90.0),
            mode,
            Viewport::default(),
        )
        .unwrap()
    }

    pub(crate) fn global_scope() -> Scope<'static> {
        Scope::global(".", Rc::new(NoDiagnostics))
    }

    fn args() -> Arguments {
        let mut args = Arguments::new();
        args.insert("count".to_string(), Arg::Integer(3));
        args.insert("length".to_string(), Arg::Number(12.3456));
        args.insert("unit".to_string(), Arg::from("km"));
        args
    }

    #[test]
    fn test_format_fields() {
        let args = args();
        assert_eq!(format_label("#{count}: {length:.1f} {unit}", &args).unwrap(), "#3: 12.3 km");
        assert_eq!(format_label("{count:.2f}", &args).unwrap(), "3.00");
        assert_eq!(format_label("{{{unit}}}", &args).unwrap(), "{km}");
        assert_eq!(format_label("plain", &args).unwrap(), "plain");
    }

    #[test]
    fn test_format_errors() {
        let args = args();
        assert!(matches!(
            format_label("{missing}", &args),
            Err(MapperError::UnresolvedReference { ref name, .. }) if name == "missing"
        ));
        assert!(matches!(format_label("{unit:.1f}", &args), Err(MapperError::InvalidValue { .. })));
        assert!(matches!(format_label("{count", &args), Err(MapperError::InvalidValue { .. })));
        assert!(matches!(format_label("count}", &args), Err(MapperError::InvalidValue { .. })));
    }

    #[test]
    fn test_dms_arguments() {
        let strings = Strings::default();
        let mut args = Arguments::new();
        add_dms(&mut args, "y-", -45.5, true, &strings).unwrap();
        assert_eq!(format_label("{y-deg}°{y-min}'{y-card}", &args).unwrap(), "45°30'S");
        let mut args = string_arguments(&strings);
        add_dms(&mut args, "", 10.25, false, &strings).unwrap();
        let template = strings.translate("default-label-format");
        assert_eq!(format_label(template, &args).unwrap(), "10°15'E");
    }

    #[test]
    fn test_sampled_line_keeps_its_ends() {
        let line = sample_line(0.0, 1.0, 2.0, 3.0);
        assert_eq!(line.0.len(), LINE_SAMPLES + 1);
        assert_eq!(line.0[0], geo_types::coord! { x: 0.0, y: 1.0 });
        assert_eq!(line.0[LINE_SAMPLES], geo_types::coord! { x: 2.0, y: 3.0 });
    }

    #[test]
    fn test_command_keywords() {
        assert_eq!("graticules".parse::<CommandKind>().unwrap(), CommandKind::Graticules);
        assert!("draw".parse::<CommandKind>().is_err());
    }
}
