//! HTML-like label markup.
//!
//! Graphviz HTML labels treat `<`, `>` and `&` as markup and lolviz's record
//! grammar treats braces specially, so every text fragment placed in a label
//! must pass through [`escape_html`]. [`Cell::text`] does that; [`Cell::markup`]
//! is for fragments that were already built from escaped pieces.

use std::fmt::Write;

/// Escape the characters that are reserved in HTML-like labels.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '{' => out.push_str("&#123;"),
            '}' => out.push_str("&#125;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap escaped markup in a `<font>` element.
pub fn font(markup: &str, color: Option<&str>, point_size: Option<u32>) -> String {
    let mut out = String::from("<font");
    if let Some(color) = color {
        let _ = write!(out, " color=\"{}\"", escape_html(color));
    }
    if let Some(size) = point_size {
        let _ = write!(out, " point-size=\"{size}\"");
    }
    let _ = write!(out, ">{markup}</font>");
    out
}

fn write_html_attrs(out: &mut String, attrs: &[(&'static str, String)]) {
    for (key, value) in attrs {
        let _ = write!(out, " {key}=\"{}\"", escape_html(value));
    }
}

/// A `<td>` element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    markup: String,
    attrs: Vec<(&'static str, String)>,
}

impl Cell {
    /// Cell holding plain text, escaped here.
    pub fn text(text: &str) -> Self {
        Self::markup(escape_html(text))
    }

    /// Cell holding already-escaped markup.
    pub fn markup(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
            attrs: Vec::new(),
        }
    }

    pub fn attr(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((key, value.into()));
        self
    }

    /// Name the port edges leave from.
    pub fn port(self, port: impl Into<String>) -> Self {
        self.attr("port", port)
    }

    pub fn bgcolor(self, color: &str) -> Self {
        self.attr("bgcolor", color)
    }

    fn render(&self, out: &mut String) {
        out.push_str("<td");
        write_html_attrs(out, &self.attrs);
        out.push('>');
        // An empty <td> collapses; a space keeps the cell's size.
        if self.markup.is_empty() {
            out.push(' ');
        } else {
            out.push_str(&self.markup);
        }
        out.push_str("</td>");
    }
}

/// A `<table>` element laid out row by row.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    attrs: Vec<(&'static str, String)>,
    rows: Vec<Vec<Cell>>,
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

impl Table {
    /// Borderless table with bordered cells and no spacing.
    pub fn new() -> Self {
        Self {
            attrs: vec![
                ("BORDER", "0".to_string()),
                ("CELLBORDER", "1".to_string()),
                ("CELLSPACING", "0".to_string()),
            ],
            rows: Vec::new(),
        }
    }

    /// Set or replace a table attribute.
    pub fn attr(mut self, key: &'static str, value: impl Into<String>) -> Self {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((key, value)),
        }
        self
    }

    pub fn row(&mut self, cells: Vec<Cell>) -> &mut Self {
        self.rows.push(cells);
        self
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn render(&self) -> String {
        let mut out = String::from("<table");
        write_html_attrs(&mut out, &self.attrs);
        out.push('>');
        for row in &self.rows {
            out.push_str("<tr>");
            for cell in row {
                cell.render(&mut out);
            }
            out.push_str("</tr>");
        }
        out.push_str("</table>");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_escape_reserved() {
        assert_eq!(escape_html("a<b>&{c}"), "a&lt;b&gt;&amp;&#123;c&#125;");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_font() {
        assert_eq!(
            font("x", Some("#444443"), Some(9)),
            "<font color=\"#444443\" point-size=\"9\">x</font>"
        );
        assert_eq!(font("x", None, None), "<font>x</font>");
    }

    #[test]
    fn test_table_render() {
        let mut table = Table::new().attr("CELLBORDER", "0");
        table.row(vec![Cell::text("<0>").port("f0"), Cell::markup("")]);
        assert_eq!(table.row_count(), 1);
        assert_eq!(
            table.render(),
            "<table BORDER=\"0\" CELLBORDER=\"0\" CELLSPACING=\"0\"><tr><td port=\"f0\">&lt;0&gt;</td><td> </td></tr></table>"
        );
    }
}
