use crate::config::value::{self, Definition};
use crate::error::{MapperError, Result};
use indexmap::IndexMap;
use std::fmt;
use svgproj_doc::Element;
use toml::Value;

/// A set of attribute values laid over existing elements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    pub name: Option<String>,
    pub attrs: IndexMap<String, String>,
}

/// Text of a scalar configuration value as it goes into an attribute.
pub(crate) fn attribute_text(key: &str, v: &Value, operation: &'static str) -> Result<String> {
    match v {
        Value::String(s) => Ok(s.clone()),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Boolean(b) => Ok(b.to_string()),
        _ => Err(MapperError::invalid(operation, key, v)),
    }
}

/// Split a CSS-like `key:value;key:value` list. Empty entries are skipped.
pub fn parse_declarations(style: &str) -> IndexMap<String, String> {
    style
        .split(';')
        .filter_map(|entry| {
            let (k, v) = entry.split_once(':')?;
            let k = k.trim();
            (!k.is_empty()).then(|| (k.to_string(), v.trim().to_string()))
        })
        .collect()
}

pub fn format_declarations(declarations: &IndexMap<String, String>) -> String {
    declarations
        .iter()
        .map(|(k, v)| format!("{k}:{v}"))
        .collect::<Vec<_>>()
        .join(";")
}

impl Style {
    /// A named style `{name, attrs = {...}}`, or an anonymous one when the table has no name.
    pub fn from_definition(def: &Definition) -> Result<Self> {
        const OP: &str = "Style::from_definition";
        let (name, attrs) = match value::opt_str(def, "name", OP)? {
            Some(name) => {
                let attrs = value::require(def, "attrs", OP, name)?;
                let attrs = attrs
                    .as_table()
                    .ok_or_else(|| MapperError::invalid(OP, "attrs", attrs))?;
                (Some(name.to_string()), attrs)
            }
            None => (None, def),
        };
        let attrs = attrs
            .iter()
            .map(|(k, v)| Ok((k.clone(), attribute_text(k, v, OP)?)))
            .collect::<Result<_>>()?;
        Ok(Style { name, attrs })
    }

    /// The `style` attribute of this style, empty if there is none.
    pub fn style(&self) -> &str {
        self.attrs.get("style").map_or("", String::as_str)
    }

    /// Overwrite the attributes that `e` already has with the values of this style, leaving the
    /// rest alone. The `style` attribute is merged declaration by declaration.
    pub fn apply(&self, e: &mut Element) {
        for (k, v) in &self.attrs {
            let Some(existing) = e.attr(k) else {
                continue;
            };
            let merged = if k == "style" {
                let mut declarations = parse_declarations(existing);
                declarations.extend(parse_declarations(v));
                format_declarations(&declarations)
            } else {
                v.clone()
            };
            e.set_attr(k.as_str(), merged);
        }
    }

    /// Set every attribute of this style on a freshly created element.
    pub fn decorate(&self, mut e: Element) -> Element {
        for (k, v) in &self.attrs {
            e.set_attr(k.as_str(), v.as_str());
        }
        e
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name.as_deref().unwrap_or("(unnamed)"))
    }
}
