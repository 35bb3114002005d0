use crate::{Element, Node};
use std::collections::HashSet;

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

pub(crate) fn parse(text: &str) -> Result<Element, roxmltree::Error> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    let doc = roxmltree::Document::parse_with_options(text, options)?;
    Ok(convert(doc.root_element(), &HashSet::new()))
}

/// Prefixed name for a namespaced node, or the local name when the namespace is the default one.
fn qualified(node: roxmltree::Node, namespace: Option<&str>, local: &str, is_tag: bool) -> String {
    let Some(uri) = namespace else {
        return local.to_string();
    };
    if is_tag && node.lookup_namespace_uri(None) == Some(uri) {
        return local.to_string();
    }
    if uri == XML_NAMESPACE {
        return format!("xml:{local}");
    }
    match node.lookup_prefix(uri) {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}:{local}"),
        _ => local.to_string(),
    }
}

fn convert(node: roxmltree::Node, inherited: &HashSet<(Option<String>, String)>) -> Element {
    let tag = node.tag_name();
    let mut element = Element::new(qualified(node, tag.namespace(), tag.name(), true));

    // Namespace declarations are stored on the element that introduces them.
    let mut in_scope = HashSet::new();
    for ns in node.namespaces() {
        if ns.uri() == XML_NAMESPACE {
            continue;
        }
        let key = (ns.name().map(str::to_string), ns.uri().to_string());
        if !inherited.contains(&key) {
            let name = match ns.name() {
                Some(prefix) => format!("xmlns:{prefix}"),
                None => "xmlns".to_string(),
            };
            element.set_attr(name, ns.uri());
        }
        in_scope.insert(key);
    }

    for attr in node.attributes() {
        element.set_attr(
            qualified(node, attr.namespace(), attr.name(), false),
            attr.value(),
        );
    }

    for child in node.children() {
        if child.is_element() {
            element.append(Node::Element(convert(child, &in_scope)));
        } else if child.is_text() {
            let text = child.text().unwrap_or_default();
            if !text.trim().is_empty() {
                element.append(Node::Text(text.to_string()));
            }
        }
    }
    element
}
