//! Text for atoms: quoting, truncation, float rounding, escaping.

use std::borrow::Cow;

use lolviz_dot::escape_html;

use crate::model::Atom;
use crate::prefs::Prefs;

/// Marker appended to truncated strings and placed in elided slots.
pub const ELLIPSIS: &str = "...";

/// Keep the first `max_len` characters, appending [`ELLIPSIS`] if anything
/// was cut.
pub fn truncate(text: &str, max_len: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max_len) {
        Some((cut, _)) => Cow::Owned(format!("{}{ELLIPSIS}", &text[..cut])),
        None => Cow::Borrowed(text),
    }
}

/// Round to `precision` places; integral results drop the fraction
/// (`3.0` prints as `3`).
pub fn format_float(value: f64, precision: usize) -> String {
    let factor = 10f64.powi(precision as i32);
    let scaled = value * factor;
    let rounded = if scaled.is_finite() {
        scaled.round() / factor
    } else {
        value
    };
    // f64's Display is the shortest round-trip form and omits ".0".
    format!("{rounded}")
}

/// Raw text of an atom: no quotes, no truncation, no escaping.
pub fn plain_atom(atom: &Atom) -> String {
    match atom {
        Atom::Bool(b) => b.to_string(),
        Atom::Int(i) => i.to_string(),
        Atom::Float(f) => f.to_string(),
        Atom::Char(c) => c.to_string(),
        Atom::Str(s) => s.clone(),
    }
}

/// Display text of an atom, before escaping.
pub fn atom_text(atom: &Atom, prefs: &Prefs) -> String {
    match atom {
        Atom::Bool(b) => b.to_string(),
        Atom::Int(i) => i.to_string(),
        Atom::Float(f) => format_float(*f, prefs.float_precision),
        Atom::Char(c) => format!("'{c}'"),
        Atom::Str(s) => format!("'{}'", truncate(s, prefs.max_str_len)),
    }
}

/// Escaped display text of an atom, ready for a label.
pub fn atom_html(atom: &Atom, prefs: &Prefs) -> String {
    escape_html(&atom_text(atom, prefs))
}

/// `key → value` for association views.
pub fn pair_html(key: &Atom, value: &Atom, prefs: &Prefs) -> String {
    format!("{}&rarr;{}", atom_html(key, prefs), atom_html(value, prefs))
}

/// Unescaped width of a `key → value` pair, for layout estimates.
pub fn pair_width(key: &Atom, value: &Atom, prefs: &Prefs) -> usize {
    atom_text(key, prefs).chars().count() + 1 + atom_text(value, prefs).chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_truncate_at_limit() {
        assert_eq!(truncate("abcdefgh", 5), "abcde...");
        assert_eq!(truncate("abcde", 5), "abcde");
        assert_eq!(truncate("", 5), "");
        // character based, not byte based
        assert_eq!(truncate("ééééé", 2), "éé...");
    }

    #[test]
    fn test_string_atom_truncation() {
        let prefs = Prefs::default().with_max_str_len(4);
        assert_eq!(atom_text(&Atom::Str("parrt".into()), &prefs), "'parr...'");
        assert_eq!(atom_text(&Atom::Str("mom".into()), &prefs), "'mom'");
    }

    #[test]
    fn test_float_rounding() {
        assert_eq!(format_float(3.0, 5), "3");
        assert_eq!(format_float(2.5, 5), "2.5");
        assert_eq!(format_float(3.14159265, 3), "3.142");
        assert_eq!(format_float(0.1 + 0.2, 5), "0.3");
        assert_eq!(format_float(5.3, 0), "5");
    }

    #[test]
    fn test_escaping_applies_to_atoms() {
        let prefs = Prefs::default();
        assert_eq!(
            atom_html(&Atom::Str("<a&b>".into()), &prefs),
            "'&lt;a&amp;b&gt;'"
        );
        assert_eq!(
            pair_html(&Atom::Str("b".into()), &Atom::Int(230), &prefs),
            "'b'&rarr;230"
        );
        assert_eq!(pair_width(&Atom::Str("b".into()), &Atom::Int(230), &prefs), 7);
    }

    #[test]
    fn test_plain_atom() {
        assert_eq!(plain_atom(&Atom::Str("x y".into())), "x y");
        assert_eq!(plain_atom(&Atom::Bool(true)), "true");
        assert_eq!(plain_atom(&Atom::Char('c')), "c");
    }
}
