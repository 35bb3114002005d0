use crate::{Element, Node};
use std::fmt::Write;

pub(crate) fn to_string(root: &Element) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\n");
    write_element(&mut out, root, 0, true);
    out.push('\n');
    out
}

fn escape(s: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn write_element(out: &mut String, e: &Element, depth: usize, indent: bool) {
    let pad = "  ".repeat(depth);
    if indent {
        out.push_str(&pad);
    }
    let _ = write!(out, "<{}", e.tag);
    for (k, v) in &e.attrs {
        let _ = write!(out, " {}=\"{}\"", k, escape(v, true));
    }
    if e.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');

    // Mixed content is written inline, whitespace would change the rendered text.
    let mixed = e.children.iter().any(|c| matches!(c, Node::Text(_)));
    for child in &e.children {
        match child {
            Node::Text(t) => out.push_str(&escape(t, false)),
            Node::Element(c) => {
                if !mixed {
                    out.push('\n');
                }
                write_element(out, c, depth + 1, !mixed);
            }
        }
    }
    if !mixed {
        out.push('\n');
        out.push_str(&pad);
    }
    let _ = write!(out, "</{}>", e.tag);
}
