//! DOT format utilities for graph rendering.

use std::fmt::{self, Write};

use strum_macros::Display;

/// Sanitize a string to be a valid DOT identifier.
/// Replaces any non-alphanumeric character with underscore.
pub fn sanitize_id(input: &str) -> String {
    input
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Escape special characters for quoted DOT strings.
pub fn escape_quoted(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Write indentation to output.
fn write_indent(output: &mut String, level: usize) {
    for _ in 0..level {
        output.push_str("  ");
    }
}

#[derive(Debug, Clone, PartialEq)]
enum AttrValue {
    Quoted(String),
    Bare(String),
    Html(String),
}

/// One `key=value` pair of a DOT attribute list.
#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    key: &'static str,
    value: AttrValue,
}

impl Attr {
    /// `key="value"`, with the value escaped.
    pub fn quoted(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: AttrValue::Quoted(value.into()),
        }
    }

    /// `key=value` for numbers and keywords (`LR`, `both`, `.4`).
    pub fn bare(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: AttrValue::Bare(value.into()),
        }
    }

    /// `key=<markup>`; the markup must already be escaped, see [`crate::html`].
    pub fn html(key: &'static str, markup: impl Into<String>) -> Self {
        Self {
            key,
            value: AttrValue::Html(markup.into()),
        }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }
}

impl fmt::Display for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            AttrValue::Quoted(v) => write!(f, "{}=\"{}\"", self.key, escape_quoted(v)),
            AttrValue::Bare(v) => write!(f, "{}={}", self.key, v),
            AttrValue::Html(v) => write!(f, "{}=<{}>", self.key, v),
        }
    }
}

/// Compass point of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Compass {
    N,
    S,
    E,
    W,
    C,
}

/// Edge endpoint: `node`, `node:port` or `node:port:compass`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    node: String,
    port: Option<String>,
    compass: Option<Compass>,
}

impl Endpoint {
    pub fn node(id: impl Into<String>) -> Self {
        Self {
            node: id.into(),
            port: None,
            compass: None,
        }
    }

    pub fn port(mut self, port: impl Into<String>) -> Self {
        self.port = Some(port.into());
        self
    }

    pub fn compass(mut self, compass: Compass) -> Self {
        self.compass = Some(compass);
        self
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.node)?;
        if let Some(port) = &self.port {
            write!(f, ":{port}")?;
        }
        if let Some(compass) = self.compass {
            write!(f, ":{compass}")?;
        }
        Ok(())
    }
}

fn write_attr_list(output: &mut String, attrs: &[Attr]) {
    output.push('[');
    for (i, attr) in attrs.iter().enumerate() {
        if i > 0 {
            output.push_str(", ");
        }
        let _ = write!(output, "{attr}");
    }
    output.push(']');
}

/// A DOT graph builder for constructing valid DOT output.
pub struct DotBuilder {
    output: String,
    indent: usize,
}

impl DotBuilder {
    /// Create a new directed graph with the given name.
    pub fn new(name: &str) -> Self {
        let mut output = String::with_capacity(4096);
        let _ = writeln!(output, "digraph {} {{", sanitize_id(name));
        Self { output, indent: 1 }
    }

    /// Add a graph attribute statement (`rankdir=LR;`).
    pub fn attr(&mut self, attr: Attr) -> &mut Self {
        write_indent(&mut self.output, self.indent);
        let _ = writeln!(self.output, "{attr};");
        self
    }

    /// Add a node style default.
    pub fn node_defaults(&mut self, attrs: &[Attr]) -> &mut Self {
        write_indent(&mut self.output, self.indent);
        self.output.push_str("node ");
        write_attr_list(&mut self.output, attrs);
        self.output.push_str(";\n");
        self
    }

    /// Add a blank line for readability.
    pub fn blank(&mut self) -> &mut Self {
        self.output.push('\n');
        self
    }

    /// Add a node with attributes.
    pub fn node(&mut self, id: &str, attrs: &[Attr]) -> &mut Self {
        write_indent(&mut self.output, self.indent);
        self.output.push_str(id);
        if !attrs.is_empty() {
            self.output.push(' ');
            write_attr_list(&mut self.output, attrs);
        }
        self.output.push_str(";\n");
        self
    }

    /// Add an edge with attributes.
    pub fn edge(&mut self, from: &Endpoint, to: &Endpoint, attrs: &[Attr]) -> &mut Self {
        write_indent(&mut self.output, self.indent);
        let _ = write!(self.output, "{from} -> {to}");
        if !attrs.is_empty() {
            self.output.push(' ');
            write_attr_list(&mut self.output, attrs);
        }
        self.output.push_str(";\n");
        self
    }

    /// Start a subgraph cluster.
    pub fn start_cluster(&mut self, id: &str, attrs: &[Attr]) -> &mut Self {
        write_indent(&mut self.output, self.indent);
        let _ = writeln!(self.output, "subgraph cluster_{} {{", sanitize_id(id));
        self.indent += 1;
        for attr in attrs {
            write_indent(&mut self.output, self.indent);
            let _ = writeln!(self.output, "{attr};");
        }
        self
    }

    /// End the current subgraph cluster.
    pub fn end_cluster(&mut self) -> &mut Self {
        self.indent = self.indent.saturating_sub(1).max(1);
        write_indent(&mut self.output, self.indent);
        self.output.push_str("}\n");
        self
    }

    /// Finish building and return the DOT string.
    pub fn build(mut self) -> String {
        self.output.push_str("}\n");
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sanitize_id() {
        assert_eq!(sanitize_id("chain 0"), "chain_0");
        assert_eq!(sanitize_id("a::b"), "a__b");
    }

    #[test]
    fn test_attr_rendering() {
        assert_eq!(Attr::bare("rankdir", "LR").to_string(), "rankdir=LR");
        assert_eq!(
            Attr::quoted("color", "say \"hi\"").to_string(),
            "color=\"say \\\"hi\\\"\""
        );
        assert_eq!(
            Attr::html("label", "<b>x</b>").to_string(),
            "label=<<b>x</b>>"
        );
    }

    #[test]
    fn test_endpoint_rendering() {
        assert_eq!(Endpoint::node("node1").to_string(), "node1");
        assert_eq!(
            Endpoint::node("node1")
                .port("f2")
                .compass(Compass::C)
                .to_string(),
            "node1:f2:c"
        );
    }

    #[test]
    fn test_builder_output() {
        let mut dot = DotBuilder::new("G");
        dot.attr(Attr::bare("rankdir", "LR"))
            .node_defaults(&[Attr::bare("shape", "box")])
            .start_cluster("chain0", &[Attr::bare("style", "invis")])
            .node("node0", &[Attr::quoted("color", "#444443")])
            .end_cluster()
            .edge(
                &Endpoint::node("node0").port("f1").compass(Compass::C),
                &Endpoint::node("node1"),
                &[Attr::bare("arrowsize", ".4")],
            );
        let expected = "digraph G {\n  rankdir=LR;\n  node [shape=box];\n  subgraph cluster_chain0 {\n    style=invis;\n    node0 [color=\"#444443\"];\n  }\n  node0:f1:c -> node1 [arrowsize=.4];\n}\n";
        assert_eq!(dot.build(), expected);
    }
}
