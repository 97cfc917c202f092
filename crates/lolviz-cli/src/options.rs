//! Command-line options shared by the binary and its tests.

use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use lolviz_core::{Prefs, Result};
use strum_macros::{Display, EnumString};

/// Which rendering operation to apply to the input root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    /// Any object graph.
    #[default]
    Obj,
    /// A sequence or set as one row.
    List,
    /// A list of lists (hash table buckets).
    Lol,
    Dict,
    /// A string root as indexed characters.
    Str,
    /// A frame root and its callers.
    Calls,
    /// Records linked through `value`/`next`.
    Chain,
    /// Records linked through `value`/`left`/`right`.
    Tree,
}

/// Rendering preferences: an optional TOML file, then per-key overrides.
#[derive(Args, Debug, Clone, Default)]
pub struct PrefsOptions {
    /// TOML file with `max_str_len`, `max_horiz_width`, `max_list_elems`, `float_precision`.
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Characters of a string shown before the ellipsis.
    #[arg(long = "max-str-len")]
    pub max_str_len: Option<usize>,

    /// Estimated width in pixels above which a row becomes a column.
    #[arg(long = "max-horiz-width")]
    pub max_horiz_width: Option<usize>,

    /// Collections longer than this are elided in the middle.
    #[arg(long = "max-list-elems")]
    pub max_list_elems: Option<usize>,

    /// Decimal places floats are rounded to.
    #[arg(long = "float-precision")]
    pub float_precision: Option<usize>,
}

impl PrefsOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, path: impl AsRef<Path>) -> Self {
        self.config = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_max_list_elems(mut self, elems: usize) -> Self {
        self.max_list_elems = Some(elems);
        self
    }

    pub fn with_max_str_len(mut self, len: usize) -> Self {
        self.max_str_len = Some(len);
        self
    }

    /// Merge the config file (if any) with the command-line overrides.
    pub fn resolve(&self) -> Result<Prefs> {
        let mut prefs = match &self.config {
            Some(path) => Prefs::load(path)?,
            None => Prefs::default(),
        };
        if let Some(len) = self.max_str_len {
            prefs = prefs.with_max_str_len(len);
        }
        if let Some(width) = self.max_horiz_width {
            prefs = prefs.with_max_horiz_width(width);
        }
        if let Some(elems) = self.max_list_elems {
            prefs = prefs.with_max_list_elems(elems);
        }
        if let Some(precision) = self.float_precision {
            prefs = prefs.with_float_precision(precision);
        }
        prefs.validate()?;
        Ok(prefs)
    }
}
