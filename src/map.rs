//! One map: an input drawing, a projection, a list of commands and an output drawing.

use crate::commands::{Command, Context};
use crate::config::value::{self, Definition};
use crate::config::{Keyword, MapDefinition, Statement};
use crate::error::{MapperError, Result};
use crate::geometry::{Rectangle, path};
use crate::projection::{Projection, ProjectionClass};
use crate::registry::{Ref, Scope};
use crate::transform::{Mode, Pipeline, Viewport};
use crate::{diag_debug, diag_info};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use svgproj_doc::{Document, Element, INKSCAPE_NAMESPACE, Node};
use toml::Value;

/// The output document of a map, with its layers indexed by label.
#[derive(Debug, Clone)]
pub struct Canvas {
    pub document: Document,
    /// Label to position among the root's children.
    layers: HashMap<String, usize>,
}

impl Canvas {
    /// A blank copy of `input`: the root attributes and the top-level children that are neither
    /// groups nor paths, such as `defs` and `metadata`.
    pub fn fresh(input: &Document) -> Self {
        let mut root = Element::new(input.root.tag.clone());
        root.attrs = input.root.attrs.clone();
        for e in input.root.elements().filter(|e| e.tag != "g" && e.tag != "path") {
            root.append(e.clone());
        }
        Canvas::from_document(Document::new(root))
    }

    /// An existing output document, to add to.
    pub fn open(file: &Path) -> Result<Self> {
        Ok(Canvas::from_document(Document::load(file)?))
    }

    fn from_document(mut document: Document) -> Self {
        if !document.root.has_attr("xmlns:inkscape") {
            document.root.set_attr("xmlns:inkscape", INKSCAPE_NAMESPACE);
        }
        let layers = document
            .root
            .children
            .iter()
            .enumerate()
            .filter_map(|(i, node)| {
                let e = node.as_element()?;
                let label = e.label().filter(|_| e.is_layer())?;
                Some((label.to_string(), i))
            })
            .collect();
        Canvas { document, layers }
    }

    /// Append `e` to the layer labelled `name`, creating the layer if needed.
    pub fn add_to_layer(&mut self, name: &str, e: Element) {
        let children = &mut self.document.root.children;
        let index = *self.layers.entry(name.to_string()).or_insert_with(|| {
            children.push(Node::Element(Element::layer(name)));
            children.len() - 1
        });
        if let Some(Node::Element(layer)) = children.get_mut(index) {
            layer.append(e);
        }
    }

    pub fn layer(&self, name: &str) -> Option<&Element> {
        let index = *self.layers.get(name)?;
        self.document.root.children.get(index)?.as_element()
    }

    pub fn layer_names(&self) -> impl Iterator<Item = &str> {
        self.layers.keys().map(String::as_str)
    }
}

/// A map as declared in the configuration. Nothing is built until [`Map::run`].
#[derive(Debug, Clone)]
pub struct Map {
    pub name: String,
    definition: Definition,
    statements: Vec<Statement>,
    dir: PathBuf,
}

impl From<MapDefinition> for Map {
    fn from(def: MapDefinition) -> Self {
        Map {
            name: def.name,
            definition: def.definition,
            statements: def.statements,
            dir: def.dir,
        }
    }
}

impl Map {
    /// Build the map's scope and commands, read the input, project and save the output.
    pub fn run(&self, parent: &Scope<'_>) -> Result<()> {
        const OP: &str = "Map::run";
        let mut scope = parent.child(self.name.clone(), self.dir.clone());
        let mut commands = Vec::new();
        for statement in &self.statements {
            match statement.keyword {
                Keyword::Resource(kind) => scope.add_resource(kind, &statement.definition, &statement.dir)?,
                Keyword::Command(kind) => commands.push(Command::from_definition(kind, &statement.definition)?),
            }
        }
        scope.inherit_strings();

        let projection = self.projection(&mut scope)?;

        let file_in = self.file(&mut scope, "file-in", "input-file")?;
        let input = Document::load(&file_in)?;
        let (rect_in, rect_world, viewport) = self.viewport(&scope, &input)?;
        let file_out = self.file(&mut scope, "file-out", "output-file")?;

        let mode = match value::opt_str(&self.definition, "mode", OP)? {
            Some(mode) => mode.parse()?,
            None => Mode::Keep,
        };
        let append = value::opt_bool(&self.definition, "append", OP)?.unwrap_or(false);

        let pipeline = Pipeline::new(&projection, rect_in, rect_world, mode, viewport)?;
        let mut canvas = if append && file_out.is_file() {
            Canvas::open(&file_out)?
        } else {
            Canvas::fresh(&input)
        };
        diag_debug!(
            scope.diagnostics(),
            OP,
            &self.name,
            "{} from {} to {}, world {}",
            projection.display_name(),
            pipeline.rect_in,
            file_out.display(),
            pipeline.rect_world
        );

        let mut ctx = Context {
            scope: &scope,
            pipeline: &pipeline,
            input: &input,
            canvas: &mut canvas,
        };
        for command in &commands {
            command.run(&mut ctx)?;
        }
        canvas.document.save(&file_out)?;
        diag_info!(scope.diagnostics(), OP, &self.name, "wrote {}", file_out.display());
        Ok(())
    }

    /// The `projection` of the map, by name or inline. A name that is not a known projection
    /// is tried as a projection class.
    fn projection(&self, scope: &mut Scope<'_>) -> Result<Rc<Projection>> {
        const OP: &str = "Map::projection";
        let projection = match self.definition.get("projection") {
            None => Ref::named("default-projection"),
            Some(Value::String(name)) => Ref::named(scope.translate(name)),
            Some(v) => Ref::from_value(v),
        };
        let found = match scope.get_projection(&projection)? {
            Some(p) => p,
            None => {
                let name = projection.to_string();
                let class: ProjectionClass = name
                    .parse()
                    .map_err(|_| MapperError::unresolved(OP, "projection", &name))?;
                Rc::new(Projection::from_class(class))
            }
        };
        let name = match &projection {
            Ref::Named(name) => name.clone(),
            _ => found.display_name().to_string(),
        };
        scope.strings.insert("projection-name", name);
        scope.strings.insert("projection-class", found.class.name());
        Ok(found)
    }

    /// A file named by `key`, translated and resolved against the map's directory, and
    /// published in the string table as `publish`.
    fn file(&self, scope: &mut Scope<'_>, key: &str, publish: &str) -> Result<PathBuf> {
        let name = value::require_str(&self.definition, key, "Map::run", &self.name)?;
        let file = self.dir.join(scope.translate(name));
        scope.strings.insert(publish, file.display().to_string());
        Ok(file)
    }

    /// The input rectangle, world rectangle and output placement.
    ///
    /// `viewport` is the name of a match, or a table with `match`, `rect-in`, `rect-world`,
    /// `center` and `scale`. The first element the match finds is the scaler: its bounding box
    /// is the input rectangle and, when it carries `lon-min` and the other bounds, it gives
    /// the world rectangle too.
    fn viewport(&self, scope: &Scope<'_>, input: &Document) -> Result<(Rectangle, Rectangle, Viewport)> {
        const OP: &str = "Map::viewport";
        let viewport = value::require(&self.definition, "viewport", OP, &self.name)?;
        let empty = Definition::new();
        let (matcher, table) = match viewport {
            Value::String(name) => (Some(Ref::named(name.as_str())), &empty),
            Value::Table(t) => (t.get("match").map(Ref::from_value), t),
            other => return Err(MapperError::invalid(OP, "viewport", other)),
        };

        let scaler = match &matcher {
            Some(r) => {
                let m = scope.get_match(r)?;
                let scaler = m.iter(&input.root)?.next().ok_or_else(|| MapperError::MissingGraphic {
                    operation: OP,
                    id: r.to_string(),
                    document: "input file".to_string(),
                })?;
                Some(scaler)
            }
            None => None,
        };

        let rectangle = |key: &str| -> Result<Rectangle> {
            let r = Ref::from_value(value::require(table, key, OP, "viewport")?);
            let found = scope
                .get_rectangle(&r)?
                .ok_or_else(|| MapperError::unresolved(OP, "rectangle", &r.to_string()))?;
            Ok(Rectangle::clone(&found))
        };
        let rect_in = match scaler {
            Some(e) => path::element_bounding_box(e)?.ok_or_else(|| MapperError::MissingGraphic {
                operation: OP,
                id: e.attr("id").unwrap_or(&e.tag).to_string(),
                document: "input file".to_string(),
            })?,
            None => rectangle("rect-in")?,
        };
        let rect_world = match scaler {
            Some(e) if e.has_attr("lon-min") => Rectangle::from_bounds_attributes(e)?,
            _ => rectangle("rect-world")?,
        };

        let center = match table.get("center") {
            Some(v) => {
                let [x, y] = value::numbers_n::<2>(v, "center", OP)?;
                Some((x, y))
            }
            None => None,
        };
        let scale = value::opt_f64(table, "scale", OP)?;
        Ok((rect_in, rect_world, Viewport { center, scale }))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Loader;
    use crate::diagnostics::NoDiagnostics;
    use std::fs;

    const INPUT: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="360" height="180">
  <defs id="defs"/>
  <path id="frame" d="M0,0 L360,180" lon-min="-180" lat-min="-90" lon-max="180" lat-max="90"/>
  <g id="land"><path id="coast" d="M180,90 L270,45"/></g>
</svg>"#;

    #[test]
    fn test_fresh_canvas_keeps_the_header() {
        let input = Document::parse(INPUT).unwrap();
        let canvas = Canvas::fresh(&input);
        let tags: Vec<&str> = canvas.document.root.elements().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, ["defs"]);
        assert_eq!(canvas.document.root.attr("width"), Some("360"));
        assert_eq!(canvas.document.root.attr("xmlns:inkscape"), Some(INKSCAPE_NAMESPACE));
    }

    #[test]
    fn test_layers_are_created_once() {
        let mut canvas = Canvas::fresh(&Document::new(Element::new("svg")));
        canvas.add_to_layer("roads", Element::new("path"));
        canvas.add_to_layer("towns", Element::new("g"));
        canvas.add_to_layer("roads", Element::new("path"));
        assert_eq!(canvas.document.root.elements().count(), 2);
        assert_eq!(canvas.layer("roads").unwrap().elements().count(), 2);
        assert!(canvas.layer("roads").unwrap().is_layer());

        let reopened = Canvas::from_document(Document::parse(&canvas.document.to_svg_string()).unwrap());
        let mut names: Vec<&str> = reopened.layer_names().collect();
        names.sort_unstable();
        assert_eq!(names, ["roads", "towns"]);
    }

    fn map(dir: &Path, config: &str) -> Map {
        let file = dir.join("map.toml");
        fs::write(&file, config).unwrap();
        let mut config = Loader::new().load(&file).unwrap();
        Map::from(config.maps.remove(0))
    }

    #[test]
    fn test_run_projects_into_the_output() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("world.svg"), INPUT).unwrap();
        let m = map(
            dir.path(),
            r#"
[[map]]
name = "world"
file-in = "world.svg"
file-out = "out.svg"
projection = "Sinusoidal"
viewport = "frame"
do = [
    { strings = { title = "World" } },
    { project = { what = "paths", match = "coast", target = "land" } },
]
"#,
        );
        let global = Scope::global(dir.path(), Rc::new(NoDiagnostics));
        m.run(&global).unwrap();
        let out = Document::load(dir.path().join("out.svg")).unwrap();
        let layer = out.root.elements().find(|e| e.label() == Some("land")).unwrap();
        assert_eq!(layer.elements().count(), 1);
    }

    #[test]
    fn test_append_adds_to_existing_layers() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("world.svg"), INPUT).unwrap();
        let m = map(
            dir.path(),
            r#"
[[map]]
name = "world"
file-in = "world.svg"
file-out = "out.svg"
append = true
viewport = { rect-in = [0, 0, 360, 180], rect-world = [-180, -90, 180, 90] }
do = [{ project = { what = "paths", match = "coast" } }]
"#,
        );
        let global = Scope::global(dir.path(), Rc::new(NoDiagnostics));
        m.run(&global).unwrap();
        m.run(&global).unwrap();
        let out = Document::load(dir.path().join("out.svg")).unwrap();
        let layers: Vec<&Element> = out.root.elements().filter(|e| e.is_layer()).collect();
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].elements().count(), 2);
    }

    #[test]
    fn test_unknown_projection() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("world.svg"), INPUT).unwrap();
        let m = map(
            dir.path(),
            "[[map]]\nname = 'm'\nfile-in = 'world.svg'\nfile-out = 'o.svg'\nprojection = 'Polar'\nviewport = 'frame'\ndo = []\n",
        );
        let global = Scope::global(dir.path(), Rc::new(NoDiagnostics));
        assert!(matches!(
            m.run(&global),
            Err(MapperError::UnresolvedReference { kind: "projection", .. })
        ));
    }

    #[test]
    fn test_missing_scaler() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("world.svg"), INPUT).unwrap();
        let m = map(
            dir.path(),
            "[[map]]\nname = 'm'\nfile-in = 'world.svg'\nfile-out = 'o.svg'\nviewport = 'nowhere'\ndo = []\n",
        );
        let global = Scope::global(dir.path(), Rc::new(NoDiagnostics));
        assert!(matches!(m.run(&global), Err(MapperError::MissingGraphic { .. })));
    }
}
