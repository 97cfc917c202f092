//! Rendering preferences.

use std::fs;
use std::path::Path;

use lolviz_error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Read-only knobs for one render call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Prefs {
    /// Characters of string content shown before the ellipsis.
    pub max_str_len: usize,
    /// Estimated width (12 px per character) above which a flat row is
    /// drawn as a column instead.
    pub max_horiz_width: usize,
    /// Collections longer than this show their first `max_list_elems - 1`
    /// items, an ellipsis, and the last item.
    pub max_list_elems: usize,
    /// Decimal places floats are rounded to.
    pub float_precision: usize,
}

impl Default for Prefs {
    fn default() -> Self {
        Self {
            max_str_len: 20,
            max_horiz_width: 300,
            max_list_elems: 10,
            float_precision: 5,
        }
    }
}

impl Prefs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_str_len(mut self, len: usize) -> Self {
        self.max_str_len = len;
        self
    }

    pub fn with_max_horiz_width(mut self, width: usize) -> Self {
        self.max_horiz_width = width;
        self
    }

    pub fn with_max_list_elems(mut self, elems: usize) -> Self {
        self.max_list_elems = elems;
        self
    }

    pub fn with_float_precision(mut self, precision: usize) -> Self {
        self.float_precision = precision;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |key: &'static str, message: String| {
            Err(Error::config_invalid(message)
                .with_operation("prefs::validate")
                .with_context("key", key))
        };
        if self.max_str_len == 0 {
            return fail("max_str_len", "max_str_len must be at least 1".into());
        }
        if self.max_list_elems < 2 {
            return fail(
                "max_list_elems",
                format!("max_list_elems must be at least 2, got {}", self.max_list_elems),
            );
        }
        if self.float_precision > 15 {
            return fail(
                "float_precision",
                format!(
                    "float_precision must be at most 15, got {}",
                    self.float_precision
                ),
            );
        }
        Ok(())
    }

    /// Parse and validate TOML; missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let prefs: Prefs = toml::from_str(text).map_err(|err| {
            Error::config_invalid(err.to_string())
                .with_operation("prefs::from_toml_str")
                .set_source(err)
        })?;
        prefs.validate()?;
        Ok(prefs)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| {
            Error::from(err)
                .with_operation("prefs::load")
                .with_context("path", path.display().to_string())
        })?;
        Self::from_toml_str(&text).map_err(|err| {
            err.with_operation("prefs::load")
                .with_context("path", path.display().to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lolviz_error::ErrorKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let prefs = Prefs::from_toml_str("max_str_len = 8\nfloat_precision = 2\n").unwrap();
        assert_eq!(
            prefs,
            Prefs::default()
                .with_max_str_len(8)
                .with_float_precision(2)
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = Prefs::from_toml_str("max_list_elems = 1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert_eq!(err.context_value("key"), Some("max_list_elems"));

        let err = Prefs::from_toml_str("max_str_len = \"long\"").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.toml");
        std::fs::write(&path, "max_list_elems = 4\n").unwrap();
        assert_eq!(Prefs::load(&path).unwrap().max_list_elems, 4);

        let err = Prefs::load(dir.path().join("missing.toml")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
    }
}
