use std::fmt;
use std::path::Path;

use lolviz_error::{Error, Result};

use crate::engine::LayoutEngine;

/// A finished graph description. Rendering functions return one of these;
/// nothing is displayed until the caller saves or renders it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagram {
    source: String,
}

impl Diagram {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// The DOT text.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn into_source(self) -> String {
        self.source
    }

    /// Write the DOT text to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, &self.source).map_err(|err| {
            Error::from(err)
                .with_operation("diagram::save")
                .with_context("path", path.display().to_string())
        })?;
        tracing::info!(path = %path.display(), "diagram saved");
        Ok(())
    }

    /// Hand the text to the layout engine and write the image to `path`.
    pub fn render(&self, engine: &LayoutEngine, path: impl AsRef<Path>) -> Result<()> {
        engine.render(&self.source, path.as_ref())
    }
}

impl fmt::Display for Diagram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("g.dot");
        let diagram = Diagram::new("digraph G {\n}\n");
        diagram.save(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), diagram.source());
        assert_eq!(diagram.to_string(), "digraph G {\n}\n");
    }

    #[test]
    fn test_save_into_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("g.dot");
        let err = Diagram::new("digraph G {}").save(&path).unwrap_err();
        assert_eq!(err.operation(), "diagram::save");
        assert!(err.context_value("path").is_some());
    }
}
