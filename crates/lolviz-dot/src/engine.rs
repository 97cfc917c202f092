//! The external layout engine.
//!
//! lolviz only produces graph-description text; turning it into pixels is the
//! job of an off-the-shelf engine such as Graphviz `dot`. The engine is run
//! synchronously with the DOT text on stdin.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use lolviz_error::{Error, Result};
use strum_macros::{Display, EnumString, IntoStaticStr};

/// Image format requested from the engine (`-T<format>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Svg,
    Pdf,
    Jpg,
    Dot,
}

/// A layout engine invocation: which program, which output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutEngine {
    program: String,
    format: OutputFormat,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self {
            program: "dot".to_string(),
            format: OutputFormat::default(),
        }
    }
}

impl LayoutEngine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Lay out `source` and write the image to `path`.
    pub fn render(&self, source: &str, path: &Path) -> Result<()> {
        tracing::debug!(
            program = %self.program,
            format = %self.format,
            path = %path.display(),
            "invoking layout engine"
        );

        let mut child = Command::new(&self.program)
            .arg(format!("-T{}", self.format))
            .arg("-o")
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| {
                let err = if err.kind() == std::io::ErrorKind::NotFound {
                    Error::layout_engine_missing(&self.program).set_source(err)
                } else {
                    Error::from(err).with_context("program", self.program.clone())
                };
                err.with_operation("engine::render")
            })?;

        // An engine that exits early closes the pipe; its stderr still says why.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(source.as_bytes()),
            None => Ok(()),
        };

        let output = child
            .wait_with_output()
            .map_err(|err| Error::from(err).with_operation("engine::render"))?;

        if !output.status.success() || written.is_err() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::error!(program = %self.program, %stderr, "layout engine failed");
            let message = if stderr.is_empty() {
                format!("{} exited with {}", self.program, output.status)
            } else {
                stderr
            };
            let mut err = Error::layout_failed(message)
                .with_operation("engine::render")
                .with_context("program", self.program.clone())
                .with_context("status", output.status.to_string());
            if let Err(write_err) = written {
                err = err.set_source(write_err);
            }
            return Err(err);
        }

        Ok(())
    }
}
