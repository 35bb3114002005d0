use crate::config::value::Definition;
use crate::error::{MapperError, Result};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use toml::Value;

const CARDINALS: [&str; 4] = ["cardinal-north", "cardinal-east", "cardinal-south", "cardinal-west"];

/// The localized string table of a scope.
#[derive(Debug, Clone, PartialEq)]
pub struct Strings {
    table: HashMap<String, String>,
}

impl Default for Strings {
    /// The table every mapper starts with: English cardinal directions and label formats.
    fn default() -> Self {
        let mut table = HashMap::new();
        for (key, value) in CARDINALS.into_iter().zip(["N", "E", "S", "W"]) {
            table.insert(key.to_string(), value.to_string());
        }
        table.insert(
            "default-label-format".to_string(),
            "{deg}°{min}'{card}".to_string(),
        );
        Strings { table }
    }
}

impl Strings {
    /// An empty table.
    pub fn new() -> Self {
        Strings {
            table: HashMap::new(),
        }
    }

    /// Add the entries of a `strings` statement. `cardinal-directions = [N, E, S, W]` is expanded
    /// into the four `cardinal-*` keys.
    pub fn update(&mut self, def: &Definition) -> Result<()> {
        const OP: &str = "Strings::update";
        for (key, value) in def {
            if key == "cardinal-directions" {
                let names = value
                    .as_array()
                    .filter(|a| a.len() == 4)
                    .ok_or_else(|| MapperError::invalid(OP, key, value))?;
                for (cardinal, name) in CARDINALS.into_iter().zip(names) {
                    let name = name
                        .as_str()
                        .ok_or_else(|| MapperError::invalid(OP, key, value))?;
                    self.insert(cardinal, name);
                }
                continue;
            }
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Integer(_) | Value::Float(_) | Value::Boolean(_) => value.to_string(),
                _ => return Err(MapperError::invalid(OP, key, value)),
            };
            self.insert(key, text);
        }
        Ok(())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.table.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.table.get(key).map(String::as_str)
    }

    /// The table value for `s`, or `s` itself.
    pub fn translate<'a>(&'a self, s: &'a str) -> &'a str {
        self.get(s).unwrap_or(s)
    }

    /// Copy the entries of `parent` that this table does not define.
    pub fn inherit(&mut self, parent: &Strings) {
        for (k, v) in &parent.table {
            if let Entry::Vacant(slot) = self.table.entry(k.clone()) {
                slot.insert(v.clone());
            }
        }
    }

    /// Entries, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.table.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
