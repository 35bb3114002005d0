use crate::config::value::{self, Definition};
use crate::error::{MapperError, Result};
use crate::lazy::Lazy;
use indexmap::IndexMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use svgproj_doc::{Document, Element};

type SharedDocument = Rc<Lazy<PathBuf, Document>>;

/// A file of reusable graphics, each exposed as a named [`Symbol`].
///
/// The file is read the first time one of its symbols is drawn.
#[derive(Debug)]
pub struct Library {
    pub name: String,
    pub file: PathBuf,
    symbols: IndexMap<String, Rc<Symbol>>,
}

impl Library {
    /// A library from `{name, path, filename, symbols = {...}}`. `path` is relative to `base`, the
    /// directory of the configuration file that declared the library.
    pub fn from_definition(def: &Definition, base: &Path) -> Result<Self> {
        const OP: &str = "Library::from_definition";
        let name = value::require_str(def, "name", OP, "library")?;
        let filename = value::require_str(def, "filename", OP, name)?;
        let path = value::opt_str(def, "path", OP)?.unwrap_or(".");
        let file = base.join(path).join(filename);
        let document: SharedDocument = Rc::new(Lazy::pending(file.clone()));

        let symbols = value::require(def, "symbols", OP, name)?;
        let symbols = symbols
            .as_table()
            .ok_or_else(|| MapperError::invalid(OP, "symbols", symbols))?
            .iter()
            .map(|(key, v)| {
                let def = v
                    .as_table()
                    .ok_or_else(|| MapperError::invalid(OP, key, v))?;
                let symbol = Symbol::from_definition(def, name, Rc::clone(&document))?;
                Ok((key.clone(), Rc::new(symbol)))
            })
            .collect::<Result<_>>()?;

        Ok(Library {
            name: name.to_string(),
            file,
            symbols,
        })
    }

    pub fn get_symbol(&self, name: &str) -> Result<Rc<Symbol>> {
        self.symbols
            .get(name)
            .cloned()
            .ok_or_else(|| MapperError::unresolved("Library::get_symbol", "symbol", name))
    }

    pub fn symbol_names(&self) -> impl Iterator<Item = &str> {
        self.symbols.keys().map(String::as_str)
    }
}

impl fmt::Display for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.file.display())
    }
}

/// A graphic that can be placed in one step: a path or a group, with the point of it that lands
/// on the target position and a scale factor.
#[derive(Debug)]
pub struct Symbol {
    pub id: String,
    pub anchor: (f64, f64),
    pub scale: f64,
    library: String,
    graphic: Lazy<SharedDocument, Element>,
}

impl Symbol {
    /// `{id, anchor = [x, y], scale = 1.0}`.
    fn from_definition(def: &Definition, library: &str, document: SharedDocument) -> Result<Self> {
        const OP: &str = "Symbol::from_definition";
        let id = value::require_str(def, "id", OP, "symbol")?;
        let anchor = value::require(def, "anchor", OP, id)?;
        let [ax, ay] = value::numbers_n::<2>(anchor, "anchor", OP)?;
        let scale = value::opt_f64(def, "scale", OP)?.unwrap_or(1.0);
        Ok(Symbol {
            id: id.to_string(),
            anchor: (ax, ay),
            scale,
            library: library.to_string(),
            graphic: Lazy::pending(document),
        })
    }

    /// A symbol built around a graphic that is already at hand.
    pub fn inline(graphic: Element, anchor: (f64, f64), scale: f64) -> Self {
        Symbol {
            id: graphic.attr("id").unwrap_or_default().to_string(),
            anchor,
            scale,
            library: String::new(),
            graphic: Lazy::ready(graphic),
        }
    }

    /// The symbol's graphic, loading the library file if needed.
    pub fn graphic(&self) -> Result<Rc<Element>> {
        self.graphic.get_or_try_resolve(|document| {
            let document = document.get_or_try_resolve(|file| Document::load(file))?;
            document
                .find_by_id(&self.id)
                .cloned()
                .ok_or_else(|| MapperError::MissingGraphic {
                    operation: "Symbol::graphic",
                    id: self.id.clone(),
                    document: self.library.clone(),
                })
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    const SYMBOLS: &str = r#"<svg xmlns="http://www.w3.org/2000/svg">
  <g id="city"><circle cx="5" cy="5" r="2"/></g>
  <path id="peak" d="M0,10 L5,0 L10,10 Z"/>
</svg>"#;

    fn library(dir: &Path) -> Library {
        let def: Definition = r#"
name = "icons"
path = "art"
filename = "symbols.svg"
[symbols.city]
id = "city"
anchor = [5, 5]
scale = 0.5
[symbols.ghost]
id = "ghost"
anchor = [0, 0]
"#
        .parse()
        .unwrap();
        Library::from_definition(&def, dir).unwrap()
    }

    #[test]
    fn test_symbols_resolve_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let lib = library(dir.path());
        assert_eq!(lib.file, dir.path().join("art").join("symbols.svg"));
        let city = lib.get_symbol("city").unwrap();
        assert_eq!((city.anchor, city.scale), ((5.0, 5.0), 0.5));
        // Nothing has been read yet, so the file can still be created.
        fs::create_dir(dir.path().join("art")).unwrap();
        fs::write(&lib.file, SYMBOLS).unwrap();
        assert_eq!(city.graphic().unwrap().tag, "g");
        fs::remove_file(&lib.file).unwrap();
        assert_eq!(city.graphic().unwrap().tag, "g");
    }

    #[test]
    fn test_missing_graphic_and_symbol() {
        let dir = tempfile::tempdir().unwrap();
        let lib = library(dir.path());
        fs::create_dir(dir.path().join("art")).unwrap();
        fs::write(&lib.file, SYMBOLS).unwrap();
        assert!(matches!(
            lib.get_symbol("ghost").unwrap().graphic(),
            Err(MapperError::MissingGraphic { ref id, .. }) if id == "ghost"
        ));
        assert!(matches!(
            lib.get_symbol("castle"),
            Err(MapperError::UnresolvedReference { .. })
        ));
    }

    #[test]
    fn test_inline_symbol() {
        let s = Symbol::inline(Element::new("circle").with_attr("id", "dot"), (1.0, 1.0), 2.0);
        assert_eq!(s.id, "dot");
        assert_eq!(s.graphic().unwrap().tag, "circle");
    }

    #[test]
    fn test_symbol_needs_anchor() {
        let def: Definition = "name = 'x'\nfilename = 'x.svg'\n[symbols.a]\nid = 'a'".parse().unwrap();
        assert!(matches!(
            Library::from_definition(&def, Path::new(".")),
            Err(MapperError::MissingField { ref field, .. }) if field == "anchor"
        ));
    }
}
