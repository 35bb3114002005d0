use crate::config::value::{self, Definition};
use crate::error::{MapperError, Result};
use crate::lazy::Lazy;
use regex::Regex;
use std::fmt;
use std::rc::Rc;
use svgproj_doc::Element;
use toml::Value;

/// Separator of the labels in a layer path.
pub const LAYER_SEPARATOR: &str = "::";

type Patterns = Vec<(String, String)>;
type Compiled = Vec<(String, Regex)>;

/// Selects elements of the input document: a layer path to descend into, an element kind and
/// a regular expression per attribute.
///
/// Patterns are compiled on first use.
#[derive(Debug, Clone)]
pub struct Match {
    pub name: Option<String>,
    pub layer: Vec<String>,
    pub svg_type: String,
    patterns: Lazy<Patterns, Compiled>,
}

impl Match {
    /// A match from `{name, layer = "a::b", svg-type = "path", pattern = {...} | "id"}`.
    pub fn from_definition(def: &Definition) -> Result<Self> {
        const OP: &str = "Match::from_definition";
        let name = value::opt_str(def, "name", OP)?;
        let layer = value::opt_str(def, "layer", OP)?
            .map(|l| l.split(LAYER_SEPARATOR).map(str::to_string).collect())
            .unwrap_or_default();
        let svg_type = value::opt_str(def, "svg-type", OP)?.unwrap_or("path");
        let patterns = match def.get("pattern") {
            None => Vec::new(),
            Some(Value::String(id)) => vec![("id".to_string(), id.clone())],
            Some(Value::Table(t)) => t
                .iter()
                .map(|(k, v)| {
                    v.as_str()
                        .map(|p| (k.clone(), p.to_string()))
                        .ok_or_else(|| MapperError::invalid(OP, k, v))
                })
                .collect::<Result<_>>()?,
            Some(v) => return Err(MapperError::invalid(OP, "pattern", v)),
        };
        Ok(Match {
            name: name.map(str::to_string),
            layer,
            svg_type: svg_type.to_string(),
            patterns: Lazy::pending(patterns),
        })
    }

    /// The fallback for an unknown name: the path whose id is exactly `id`, anywhere.
    pub fn by_id(id: &str) -> Self {
        Match {
            name: None,
            layer: Vec::new(),
            svg_type: "path".to_string(),
            patterns: Lazy::pending(vec![(
                "id".to_string(),
                format!("^{}$", regex::escape(id)),
            )]),
        }
    }

    /// The same match looking for another element kind.
    pub fn with_svg_type(&self, svg_type: &str) -> Self {
        Match {
            svg_type: svg_type.to_string(),
            ..self.clone()
        }
    }

    fn compiled(&self) -> Result<Rc<Compiled>> {
        self.patterns.get_or_try_resolve(|patterns| {
            patterns
                .iter()
                .map(|(k, p)| {
                    Regex::new(p)
                        .map(|r| (k.clone(), r))
                        .map_err(|e| MapperError::invalid("Match::compile", k, format!("{p} ({e})")))
                })
                .collect()
        })
    }

    /// Descend from `root` through the layer path. Each label is looked up among the immediate
    /// children that are layers.
    pub fn locate_layer<'d>(&self, root: &'d Element) -> Option<&'d Element> {
        self.layer.iter().try_fold(root, |current, label| {
            current
                .elements()
                .find(|e| e.is_layer() && e.label() == Some(label.as_str()))
        })
    }

    /// Does `e` satisfy the kind and every pattern? A missing attribute never matches.
    fn is_match(&self, e: &Element, compiled: &Compiled) -> bool {
        e.tag == self.svg_type
            && compiled
                .iter()
                .all(|(k, r)| e.attr(k).is_some_and(|v| r.is_match(v)))
    }

    /// Matching elements under the layer, depth first. The subtree of a matching element is not
    /// searched. A missing layer yields nothing.
    pub fn iter<'m, 'd>(&'m self, root: &'d Element) -> Result<Matches<'m, 'd>> {
        let compiled = self.compiled()?;
        let stack = self.locate_layer(root).into_iter().collect();
        Ok(Matches {
            matcher: self,
            compiled,
            stack,
        })
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name.as_deref().unwrap_or("(unnamed)"))
    }
}

/// Iterator returned by [`Match::iter`].
pub struct Matches<'m, 'd> {
    matcher: &'m Match,
    compiled: Rc<Compiled>,
    stack: Vec<&'d Element>,
}

impl<'d> Iterator for Matches<'_, 'd> {
    type Item = &'d Element;

    fn next(&mut self) -> Option<&'d Element> {
        while let Some(e) = self.stack.pop() {
            if self.matcher.is_match(e, &self.compiled) {
                return Some(e);
            }
            let len = self.stack.len();
            self.stack.extend(e.elements());
            self.stack[len..].reverse();
        }
        None
    }
}
