//! Scoped resource registry.
//!
//! A [`Scope`] owns the resources declared at its level and borrows its parent. Lookups by name
//! walk up the chain; what happens when the root is reached without a hit depends on the kind:
//!
//! | kind                                     | not found anywhere                    |
//! |------------------------------------------|---------------------------------------|
//! | style, projection, unit, library, symbol | `None`, the caller decides            |
//! | rectangle                                | `None`; literals are built directly   |
//! | match                                    | a match on `id == name`               |
//!
//! Only the string table is copied down the chain, once, by [`Scope::inherit_strings`].

use crate::config::value::Definition;
use crate::diagnostics::Diagnostics;
use crate::error::{MapperError, Result};
use crate::geometry::{Rectangle, Unit};
use crate::projection::{Projection, ProjectionClass};
use crate::resources::{Library, Match, Strings, Style, Symbol};
use crate::{diag_debug, diag_warn};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::str::FromStr;
use toml::Value;

/// The kinds of statement that declare a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Style,
    Match,
    Projection,
    Unit,
    Strings,
    Library,
    Rectangle,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 7] = [
        ResourceKind::Style,
        ResourceKind::Match,
        ResourceKind::Projection,
        ResourceKind::Unit,
        ResourceKind::Strings,
        ResourceKind::Library,
        ResourceKind::Rectangle,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            ResourceKind::Style => "style",
            ResourceKind::Match => "match",
            ResourceKind::Projection => "projection",
            ResourceKind::Unit => "unit",
            ResourceKind::Strings => "strings",
            ResourceKind::Library => "library",
            ResourceKind::Rectangle => "rectangle",
        }
    }
}

impl FromStr for ResourceKind {
    type Err = MapperError;

    fn from_str(s: &str) -> Result<Self> {
        ResourceKind::ALL
            .into_iter()
            .find(|k| k.keyword() == s)
            .ok_or_else(|| MapperError::UnexpectedField {
                operation: "ResourceKind::from_str",
                field: s.to_string(),
                context: "resources".to_string(),
            })
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// How a resource is referred to from a statement.
#[derive(Debug, Clone)]
pub enum Ref<T> {
    /// Already resolved; handed back unchanged.
    Resolved(Rc<T>),
    /// An inline definition, built into a fresh anonymous resource on every lookup.
    Inline(Value),
    /// A name, looked up through the scope chain.
    Named(String),
}

impl<T> Ref<T> {
    /// Strings are names, anything else is an inline definition.
    pub fn from_value(v: &Value) -> Self {
        match v {
            Value::String(name) => Ref::Named(name.clone()),
            other => Ref::Inline(other.clone()),
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Ref::Named(name.into())
    }
}

impl<T> From<Rc<T>> for Ref<T> {
    fn from(value: Rc<T>) -> Self {
        Ref::Resolved(value)
    }
}

impl<T> fmt::Display for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ref::Resolved(_) => f.write_str("(resolved)"),
            Ref::Inline(v) => write!(f, "{v}"),
            Ref::Named(name) => f.write_str(name),
        }
    }
}

type Dictionary<T> = HashMap<String, Rc<T>>;

/// One level of the resource chain.
pub struct Scope<'p> {
    pub name: String,
    /// Directory that relative file names are resolved against.
    pub dir: PathBuf,
    pub strings: Strings,
    parent: Option<&'p Scope<'p>>,
    diagnostics: Rc<dyn Diagnostics>,
    styles: Dictionary<Style>,
    matches: Dictionary<Match>,
    projections: Dictionary<Projection>,
    units: Dictionary<Unit>,
    libraries: Dictionary<Library>,
    rectangles: Dictionary<Rectangle>,
}

impl fmt::Debug for Scope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("name", &self.name)
            .field("dir", &self.dir)
            .field("parent", &self.parent.map(|p| &p.name))
            .finish_non_exhaustive()
    }
}

impl Scope<'static> {
    /// An empty root scope.
    pub fn root(dir: impl Into<PathBuf>, diagnostics: Rc<dyn Diagnostics>) -> Self {
        Scope {
            name: "global".to_string(),
            dir: dir.into(),
            strings: Strings::new(),
            parent: None,
            diagnostics,
            styles: HashMap::new(),
            matches: HashMap::new(),
            projections: HashMap::new(),
            units: HashMap::new(),
            libraries: HashMap::new(),
            rectangles: HashMap::new(),
        }
    }

    /// A root scope holding the built-in resources: the `no-unit` unit, the
    /// `default-projection`, the `default-line-style` and `default-text-style` styles and the
    /// default string table.
    pub fn global(dir: impl Into<PathBuf>, diagnostics: Rc<dyn Diagnostics>) -> Self {
        let mut scope = Scope::root(dir, diagnostics);
        scope.strings = Strings::default();
        scope
            .units
            .insert("no-unit".to_string(), Rc::new(Unit::new("no-unit", 1.0)));
        let mut projection = Projection::from_class(ProjectionClass::Cylindrical);
        projection.name = Some("default-projection".to_string());
        scope
            .projections
            .insert("default-projection".to_string(), Rc::new(projection));
        for (name, attrs) in [
            ("default-line-style", [("style", "fill:none;stroke:#000000;stroke-width:0.5")]),
            ("default-text-style", [("style", "font-size:8px;font-family:sans-serif;fill:#000000")]),
        ] {
            let style = Style {
                name: Some(name.to_string()),
                attrs: attrs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            };
            scope.styles.insert(name.to_string(), Rc::new(style));
        }
        scope
    }
}

impl<'p> Scope<'p> {
    /// A child scope that falls back on `self`. The child starts with an empty string table.
    pub fn child<'s>(&'s self, name: impl Into<String>, dir: impl Into<PathBuf>) -> Scope<'s> {
        Scope {
            name: name.into(),
            dir: dir.into(),
            strings: Strings::new(),
            parent: Some(self),
            diagnostics: Rc::clone(&self.diagnostics),
            styles: HashMap::new(),
            matches: HashMap::new(),
            projections: HashMap::new(),
            units: HashMap::new(),
            libraries: HashMap::new(),
            rectangles: HashMap::new(),
        }
    }

    pub fn parent(&self) -> Option<&'p Scope<'p>> {
        self.parent
    }

    pub fn diagnostics(&self) -> &dyn Diagnostics {
        self.diagnostics.as_ref()
    }

    /// Copy in the parent's strings that this scope does not define.
    pub fn inherit_strings(&mut self) {
        if let Some(parent) = self.parent {
            self.strings.inherit(&parent.strings);
        }
    }

    /// Build the resource declared by a `kind` statement and register it under its name,
    /// replacing (with a warning) anything registered here under the same name. `dir` is the
    /// directory of the file holding the statement.
    pub fn add_resource(&mut self, kind: ResourceKind, def: &Definition, dir: &Path) -> Result<()> {
        const OP: &str = "Scope::add_resource";
        let named = |name: &Option<String>| {
            name.clone()
                .ok_or_else(|| MapperError::missing(OP, "name", kind.keyword()))
        };
        match kind {
            ResourceKind::Style => {
                let style = Style::from_definition(def)?;
                let name = named(&style.name)?;
                self.insert(kind, name, style, |s| &mut s.styles);
            }
            ResourceKind::Match => {
                let m = Match::from_definition(def)?;
                let name = named(&m.name)?;
                self.insert(kind, name, m, |s| &mut s.matches);
            }
            ResourceKind::Projection => {
                let p = Projection::from_definition(def)?;
                let name = named(&p.name)?;
                self.insert(kind, name, p, |s| &mut s.projections);
            }
            ResourceKind::Unit => {
                let u = Unit::from_definition(def)?;
                self.insert(kind, u.name.clone(), u, |s| &mut s.units);
            }
            ResourceKind::Library => {
                let l = Library::from_definition(def, dir)?;
                self.insert(kind, l.name.clone(), l, |s| &mut s.libraries);
            }
            ResourceKind::Rectangle => {
                let r = Rectangle::from_definition(def)?;
                let name = named(&r.name)?;
                self.insert(kind, name, r, |s| &mut s.rectangles);
            }
            ResourceKind::Strings => self.strings.update(def)?,
        }
        Ok(())
    }

    fn insert<T>(
        &mut self,
        kind: ResourceKind,
        name: String,
        resource: T,
        dictionary: fn(&mut Self) -> &mut Dictionary<T>,
    ) {
        if dictionary(self).contains_key(&name) {
            diag_warn!(self.diagnostics, "Scope::add_resource", &name, "overwriting {kind} in {}", self.name);
        } else {
            diag_debug!(self.diagnostics, "Scope::add_resource", &name, "loaded {kind} in {}", self.name);
        }
        dictionary(self).insert(name, Rc::new(resource));
    }

    /// Walk up the chain looking for `name`.
    fn lookup<T>(&self, name: &str, dictionary: for<'a> fn(&'a Scope<'_>) -> &'a Dictionary<T>) -> Option<Rc<T>> {
        std::iter::successors(Some(self), |s| s.parent)
            .find_map(|s| dictionary(s).get(name))
            .cloned()
    }

    pub fn get_style(&self, r: &Ref<Style>) -> Result<Option<Rc<Style>>> {
        match r {
            Ref::Resolved(s) => Ok(Some(Rc::clone(s))),
            Ref::Inline(Value::Table(def)) => Ok(Some(Rc::new(Style::from_definition(def)?))),
            Ref::Inline(v) => Err(MapperError::invalid("Scope::get_style", "style", v)),
            Ref::Named(name) => Ok(self.lookup(name, |s| &s.styles)),
        }
    }

    /// Never fails to find a match: an unknown name becomes a match on that id.
    pub fn get_match(&self, r: &Ref<Match>) -> Result<Rc<Match>> {
        match r {
            Ref::Resolved(m) => Ok(Rc::clone(m)),
            Ref::Inline(Value::Table(def)) => Ok(Rc::new(Match::from_definition(def)?)),
            Ref::Inline(v) => Err(MapperError::invalid("Scope::get_match", "match", v)),
            Ref::Named(name) => Ok(self
                .lookup(name, |s| &s.matches)
                .unwrap_or_else(|| Rc::new(Match::by_id(name)))),
        }
    }

    pub fn get_projection(&self, r: &Ref<Projection>) -> Result<Option<Rc<Projection>>> {
        match r {
            Ref::Resolved(p) => Ok(Some(Rc::clone(p))),
            Ref::Inline(Value::Table(def)) => Ok(Some(Rc::new(Projection::from_definition(def)?))),
            Ref::Inline(v) => Err(MapperError::invalid("Scope::get_projection", "projection", v)),
            Ref::Named(name) => Ok(self.lookup(name, |s| &s.projections)),
        }
    }

    pub fn get_unit(&self, r: &Ref<Unit>) -> Result<Option<Rc<Unit>>> {
        match r {
            Ref::Resolved(u) => Ok(Some(Rc::clone(u))),
            Ref::Inline(Value::Table(def)) => Ok(Some(Rc::new(Unit::from_definition(def)?))),
            Ref::Inline(v) => Err(MapperError::invalid("Scope::get_unit", "unit", v)),
            Ref::Named(name) => Ok(self.lookup(name, |s| &s.units)),
        }
    }

    /// Literals, a list of four numbers or an inline table, are built directly.
    pub fn get_rectangle(&self, r: &Ref<Rectangle>) -> Result<Option<Rc<Rectangle>>> {
        match r {
            Ref::Resolved(rect) => Ok(Some(Rc::clone(rect))),
            Ref::Inline(v) => Ok(Some(Rc::new(Rectangle::from_value(v)?))),
            Ref::Named(name) => {
                let found = self.lookup(name, |s| &s.rectangles);
                if found.is_none() {
                    diag_warn!(self.diagnostics, "Scope::get_rectangle", name, "rectangle not found");
                }
                Ok(found)
            }
        }
    }

    pub fn get_library(&self, name: &str) -> Option<Rc<Library>> {
        self.lookup(name, |s| &s.libraries)
    }

    /// A symbol named `library::symbol`. `None` if the library is unknown; an error if the
    /// library is known but does not have the symbol.
    pub fn get_symbol(&self, name: &str) -> Result<Option<Rc<Symbol>>> {
        let (library, symbol) = name
            .split_once(crate::resources::LAYER_SEPARATOR)
            .ok_or_else(|| MapperError::invalid("Scope::get_symbol", "symbol", name))?;
        match self.get_library(library) {
            Some(library) => library.get_symbol(symbol).map(Some),
            None => Ok(None),
        }
    }

    /// The string table entry for `s`, or `s` itself.
    pub fn translate<'a>(&'a self, s: &'a str) -> &'a str {
        self.strings.translate(s)
    }
}
