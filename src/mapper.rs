//! The batch driver: loads configuration files into the global scope and runs maps.

use crate::config::{Keyword, Loader};
use crate::diagnostics::Diagnostics;
use crate::error::{MapperError, Result};
use crate::map::Map;
use crate::registry::Scope;
use crate::{diag_error, diag_info, diag_warn};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// How a batch went.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
}

impl Summary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct Mapper {
    scope: Scope<'static>,
    maps: IndexMap<String, Map>,
    run_list: Vec<String>,
}

impl Mapper {
    /// A mapper whose global scope holds the built-in resources.
    pub fn new(dir: impl Into<PathBuf>, diagnostics: Rc<dyn Diagnostics>) -> Self {
        Mapper {
            scope: Scope::global(dir, diagnostics),
            maps: IndexMap::new(),
            run_list: Vec::new(),
        }
    }

    /// Load a configuration file: its resources go into the global scope, its maps into the
    /// map table and its `run` entries, without duplicates, onto the run list.
    pub fn load(&mut self, file: &Path) -> Result<()> {
        const OP: &str = "Mapper::load";
        let config = Loader::new().load(file)?;
        for statement in &config.statements {
            match statement.keyword {
                Keyword::Resource(kind) => self.scope.add_resource(kind, &statement.definition, &statement.dir)?,
                Keyword::Command(kind) => {
                    return Err(MapperError::UnexpectedField {
                        operation: OP,
                        field: kind.to_string(),
                        context: file.display().to_string(),
                    });
                }
            }
        }
        for def in config.maps {
            let map = Map::from(def);
            if self.maps.contains_key(&map.name) {
                diag_warn!(self.scope.diagnostics(), OP, &map.name, "overwriting map");
            }
            self.maps.insert(map.name.clone(), map);
        }
        for name in config.run {
            if !self.run_list.contains(&name) {
                self.run_list.push(name);
            }
        }
        diag_info!(
            self.scope.diagnostics(),
            OP,
            &file.display().to_string(),
            "{} maps, {} to run",
            self.maps.len(),
            self.run_list.len()
        );
        Ok(())
    }

    /// Replace the run list.
    pub fn set_run_list(&mut self, maps: Vec<String>) {
        self.run_list = maps;
    }

    pub fn run_list(&self) -> &[String] {
        &self.run_list
    }

    pub fn map_names(&self) -> impl Iterator<Item = &str> {
        self.maps.keys().map(String::as_str)
    }

    pub fn scope(&self) -> &Scope<'static> {
        &self.scope
    }

    /// Every map on the run list must exist.
    pub fn check(&self) -> Result<()> {
        match self.run_list.iter().find(|name| !self.maps.contains_key(*name)) {
            Some(name) => Err(MapperError::unresolved("Mapper::check", "map", name)),
            None => Ok(()),
        }
    }

    pub fn run_map(&self, name: &str) -> Result<()> {
        self.maps
            .get(name)
            .ok_or_else(|| MapperError::unresolved("Mapper::run_map", "map", name))?
            .run(&self.scope)
    }

    /// Run the maps on the run list in order. A map that fails is reported and skipped.
    pub fn run(&self) -> Result<Summary> {
        self.check()?;
        let mut summary = Summary::default();
        for name in &self.run_list {
            match self.run_map(name) {
                Ok(()) => summary.succeeded.push(name.clone()),
                Err(e) => {
                    diag_error!(self.scope.diagnostics(), "Mapper::run", name, "{e}");
                    summary.failed.push(name.clone());
                }
            }
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::diagnostics::{Recorder, Severity};
    use crate::registry::Ref;
    use std::fs;

    fn mapper() -> (Rc<Recorder>, Mapper) {
        let recorder = Rc::new(Recorder::default());
        let mapper = Mapper::new(".", recorder.clone());
        (recorder, mapper)
    }

    #[test]
    fn test_run_list_has_no_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.toml");
        fs::write(&a, "run = ['x', 'y']\n[[map]]\nname = 'x'\ndo = []\n[[map]]\nname = 'y'\ndo = []\n").unwrap();
        let b = dir.path().join("b.toml");
        fs::write(&b, "run = ['y', 'x']\n[[unit]]\nname = 'km'\nscale = 1.5678e-4\n").unwrap();
        let (_, mut m) = mapper();
        m.load(&a).unwrap();
        m.load(&b).unwrap();
        assert_eq!(m.run_list(), ["x", "y"]);
        assert_eq!(m.map_names().collect::<Vec<_>>(), ["x", "y"]);
        assert!(m.scope().get_unit(&Ref::named("km")).unwrap().is_some());
        m.set_run_list(vec!["y".to_string()]);
        assert_eq!(m.run_list(), ["y"]);
    }

    #[test]
    fn test_commands_are_not_allowed_at_top_level() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.toml");
        fs::write(&file, "[[graticules]]\ndivisions = [{ span = 10 }]\n").unwrap();
        let (_, mut m) = mapper();
        assert!(matches!(m.load(&file), Err(MapperError::UnexpectedField { .. })));
    }

    #[test]
    fn test_unknown_map() {
        let (_, mut m) = mapper();
        m.set_run_list(vec!["atlantis".to_string()]);
        assert!(matches!(
            m.run(),
            Err(MapperError::UnresolvedReference { kind: "map", ref name, .. }) if name == "atlantis"
        ));
        assert!(m.run_map("atlantis").is_err());
    }

    #[test]
    fn test_failed_map_does_not_stop_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.toml");
        fs::write(
            &file,
            "run = ['broken', 'also-broken']\n[[map]]\nname = 'broken'\ndo = []\n[[map]]\nname = 'also-broken'\nfile-in = 'none.svg'\ndo = []\n",
        )
        .unwrap();
        let (recorder, mut m) = mapper();
        m.load(&file).unwrap();
        let summary = m.run().unwrap();
        assert_eq!(summary.failed, ["broken", "also-broken"]);
        assert!(!summary.is_success());
        assert_eq!(recorder.count(Severity::Error), 2);
    }
}
