//! Configuration loading.
//!
//! A configuration file is a TOML document. Its top-level keys are statements:
//!
//! ```toml
//! import = ["common", { from = "styles", elements = { coast = "_", sea = "ocean" } }]
//! run = ["europe"]
//!
//! [[style]]
//! name = "coast"
//! attrs = { style = "stroke:#0000ff" }
//!
//! [[map]]
//! name = "europe"
//! file-in = "world.svg"
//! file-out = "europe.svg"
//! viewport = "frame"
//! do = [
//!     { projection = { name = "albers", class = "Albers" } },
//!     { project = { what = "paths", match = "coastline" } },
//! ]
//! ```
//!
//! Imports are loaded before the statements of the importing file, relative to its directory.
//! A filtered import only loads the named resources listed in `elements`, renaming each to its
//! alias unless the alias is `"_"`. Every statement remembers the directory of its file.

pub mod value;

use crate::commands::CommandKind;
use crate::error::{MapperError, Result};
use crate::registry::ResourceKind;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use toml::Value;
use value::Definition;

/// Extension tried when a configuration file is not found under its given name.
pub const CONFIG_EXTENSION: &str = "toml";

/// What a statement declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Resource(ResourceKind),
    Command(CommandKind),
}

impl Keyword {
    pub fn parse(s: &str) -> Option<Self> {
        s.parse()
            .map(Keyword::Resource)
            .or_else(|_| s.parse().map(Keyword::Command))
            .ok()
    }
}

/// One resource or command statement.
#[derive(Debug, Clone)]
pub struct Statement {
    pub keyword: Keyword,
    pub definition: Definition,
    /// Directory of the file that holds the statement.
    pub dir: PathBuf,
}

/// A `map` statement with its imports expanded.
#[derive(Debug, Clone)]
pub struct MapDefinition {
    pub name: String,
    /// The map's own keys, without `do`.
    pub definition: Definition,
    /// The `do` section, in order.
    pub statements: Vec<Statement>,
    pub dir: PathBuf,
}

/// Everything a file and its imports declare.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub statements: Vec<Statement>,
    pub maps: Vec<MapDefinition>,
    pub run: Vec<String>,
}

impl Config {
    fn extend(&mut self, other: Config) {
        self.statements.extend(other.statements);
        self.maps.extend(other.maps);
        self.run.extend(other.run);
    }
}

/// Statement names to load from an import, each with its alias.
type Filter = HashMap<String, String>;

/// Reads configuration files, following imports.
#[derive(Debug, Default)]
pub struct Loader {
    /// Files being loaded, outermost first.
    stack: Vec<PathBuf>,
}

impl Loader {
    pub fn new() -> Self {
        Loader::default()
    }

    /// Load `file` and everything it imports.
    pub fn load(&mut self, file: &Path) -> Result<Config> {
        let (dir, name) = match file.parent() {
            Some(dir) => (dir.to_path_buf(), file.strip_prefix(dir).unwrap_or(file)),
            None => (PathBuf::new(), file),
        };
        self.load_filtered(&dir, name, None)
    }

    fn load_filtered(&mut self, base: &Path, name: &Path, filter: Option<&Filter>) -> Result<Config> {
        const OP: &str = "Loader::load";
        let file = resolve_file(base, name)?;
        if self.stack.contains(&file) {
            return Err(MapperError::Config {
                operation: OP,
                file,
                detail: "import cycle".to_string(),
            });
        }
        let text = fs::read_to_string(&file).map_err(|e| MapperError::Config {
            operation: OP,
            file: file.clone(),
            detail: e.to_string(),
        })?;
        let table: Definition = text.parse().map_err(|e: toml::de::Error| MapperError::Config {
            operation: OP,
            file: file.clone(),
            detail: e.to_string(),
        })?;
        let dir = file.parent().map(Path::to_path_buf).unwrap_or_default();

        self.stack.push(file);
        let result = self.statements(&table, &dir, filter);
        self.stack.pop();
        result
    }

    fn statements(&mut self, table: &Definition, dir: &Path, filter: Option<&Filter>) -> Result<Config> {
        let mut config = Config::default();
        if let Some(imports) = table.get("import") {
            for import in as_list(imports) {
                config.extend(self.import(import, dir)?);
            }
        }
        let mut keyed = Vec::new();
        for (key, v) in table {
            if matches!(key.as_str(), "import" | "run" | "map") {
                continue;
            }
            let keyword = Keyword::parse(key).ok_or_else(|| self.error(format!("unknown statement `{key}`")))?;
            keyed.push((keyword, key, v));
        }
        // Resources before commands.
        keyed.sort_by_key(|(keyword, _, _)| matches!(keyword, Keyword::Command(_)));
        for (keyword, key, v) in keyed {
            for mut definition in self.definitions(key, v)? {
                if let (Some(filter), Keyword::Resource(_)) = (filter, keyword) {
                    let Some(alias) = definition
                        .get("name")
                        .and_then(Value::as_str)
                        .and_then(|name| filter.get(name))
                    else {
                        continue;
                    };
                    if alias != "_" {
                        definition.insert("name".to_string(), Value::String(alias.clone()));
                    }
                }
                config.statements.push(Statement {
                    keyword,
                    definition,
                    dir: dir.to_path_buf(),
                });
            }
        }
        if let Some(maps) = table.get("map") {
            for map in self.definitions("map", maps)? {
                config.maps.push(self.map(map, dir)?);
            }
        }
        if let Some(run) = table.get("run") {
            config.run.extend(value::strings(run, "run", "Loader::load")?);
        }
        Ok(config)
    }

    /// `import = "file"` or `import = { from = "file", elements = { name = "alias" } }`.
    fn import(&mut self, import: &Value, dir: &Path) -> Result<Config> {
        match import {
            Value::String(name) => self.load_filtered(dir, Path::new(name), None),
            Value::Table(t) => {
                let from = t.get("from").and_then(Value::as_str);
                let elements = t.get("elements").and_then(Value::as_table);
                let (Some(from), Some(elements)) = (from, elements) else {
                    return Err(self.error(format!("cannot understand import statement {import}")));
                };
                let filter = elements
                    .iter()
                    .map(|(name, alias)| {
                        alias
                            .as_str()
                            .map(|a| (name.clone(), a.to_string()))
                            .ok_or_else(|| self.error(format!("alias of `{name}` must be a string")))
                    })
                    .collect::<Result<Filter>>()?;
                self.load_filtered(dir, Path::new(from), Some(&filter))
            }
            _ => Err(self.error(format!("cannot understand import statement {import}"))),
        }
    }

    fn map(&mut self, mut definition: Definition, dir: &Path) -> Result<MapDefinition> {
        let name = value::require_str(&definition, "name", "Loader::map", "map")?.to_string();
        let Some(Value::Array(steps)) = definition.remove("do") else {
            return Err(self.error(format!("map `{name}` should have a `do` list")));
        };
        let mut statements = Vec::new();
        for step in &steps {
            let (key, v) = match step.as_table().map(|t| (t.len(), t.iter().next())) {
                Some((1, Some(entry))) => entry,
                _ => return Err(self.error(format!("map `{name}`: each step should have one key, found {step}"))),
            };
            if key == "import" {
                let imported = self.import(v, dir)?;
                if !imported.maps.is_empty() || !imported.run.is_empty() {
                    return Err(self.error(format!("map `{name}`: imports into a map can only hold resources and commands")));
                }
                statements.extend(imported.statements);
                continue;
            }
            let keyword = Keyword::parse(key)
                .ok_or_else(|| self.error(format!("map `{name}`: `{key}` is not understood")))?;
            for definition in self.definitions(key, v)? {
                statements.push(Statement {
                    keyword,
                    definition,
                    dir: dir.to_path_buf(),
                });
            }
        }
        Ok(MapDefinition {
            name,
            definition,
            statements,
            dir: dir.to_path_buf(),
        })
    }

    /// A table, or a list of tables.
    fn definitions(&self, key: &str, v: &Value) -> Result<Vec<Definition>> {
        as_list(v)
            .map(|item| {
                item.as_table()
                    .cloned()
                    .ok_or_else(|| self.error(format!("`{key}` should be a table, found {item}")))
            })
            .collect()
    }

    fn error(&self, detail: String) -> MapperError {
        MapperError::Config {
            operation: "Loader::load",
            file: self.stack.last().cloned().unwrap_or_default(),
            detail,
        }
    }
}

fn as_list(v: &Value) -> impl Iterator<Item = &Value> {
    match v {
        Value::Array(items) => items.iter().collect::<Vec<_>>().into_iter(),
        other => vec![other].into_iter(),
    }
}

/// `base/name`, or `base/name.toml` when the former does not exist.
fn resolve_file(base: &Path, name: &Path) -> Result<PathBuf> {
    let file = base.join(name);
    if file.is_file() {
        return Ok(file);
    }
    let mut with_extension = file.clone().into_os_string();
    with_extension.push(".");
    with_extension.push(CONFIG_EXTENSION);
    let with_extension = PathBuf::from(with_extension);
    if with_extension.is_file() {
        return Ok(with_extension);
    }
    Err(MapperError::Config {
        operation: "Loader::load",
        file,
        detail: "file not found".to_string(),
    })
}
