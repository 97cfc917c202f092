//! lolviz command-line interface.
//!
//! Loads an object graph from a JSON document (see [`input`]) and renders it
//! with one of the visualization operations.
pub mod input;
pub mod options;

use std::path::{Path, PathBuf};

use lolviz_core::{
    Atom, Diagram, Error, HeapRef, LayoutEngine, Prefs, Result, Value, Visualizer, llistviz,
    strviz, treeviz,
};

pub use input::{Document, load_path, load_str};
pub use options::{Mode, PrefsOptions};

/// Options for running lolviz.
#[derive(Debug, Clone, Default)]
pub struct LolvizOptions {
    pub input: PathBuf,
    pub mode: Mode,
    pub prefs: PrefsOptions,
    pub varnames: Option<Vec<String>>,
}

/// Main entry point
pub fn run_main(opts: &LolvizOptions) -> Result<Diagram> {
    let prefs = opts.prefs.resolve()?;
    let document = input::load_path(&opts.input)?;
    tracing::info!(mode = %opts.mode, nodes = document.heap.len(), "rendering");
    render_document(&document, opts.mode, &prefs, opts.varnames.as_deref())
}

/// Render an already loaded document.
pub fn render_document(
    document: &Document,
    mode: Mode,
    prefs: &Prefs,
    varnames: Option<&[String]>,
) -> Result<Diagram> {
    let names: Option<Vec<&str>> =
        varnames.map(|names| names.iter().map(String::as_str).collect());
    let visualizer = Visualizer::new(&document.heap, prefs);
    let root = &document.root;

    match mode {
        Mode::Obj => visualizer.objviz(std::slice::from_ref(root), names.as_deref()),
        Mode::List => visualizer.listviz(root),
        Mode::Lol => visualizer.lolviz(root),
        Mode::Dict => visualizer.dictviz(root),
        Mode::Str => match root {
            Value::Atom(Atom::Str(text)) => strviz(text, prefs),
            _ => Err(wrong_root("a string", mode)),
        },
        Mode::Calls => match root {
            Value::Ref(frame) => visualizer.callsviz(*frame, names.as_deref()),
            _ => Err(wrong_root("a frame", mode)),
        },
        Mode::Chain => {
            let head = linked_root(document, mode)?;
            llistviz(
                head,
                |node| node.value("value"),
                |node| node.link("next"),
                prefs,
            )
        }
        Mode::Tree => {
            let root = linked_root(document, mode)?;
            treeviz(
                root,
                |node| node.value("value"),
                |node| node.link("left"),
                |node| node.link("right"),
                prefs,
            )
        }
    }
}

/// Lay `diagram` out into `image`. Engine failures carry a hint, since the
/// DOT text itself is still usable.
pub fn render_image(diagram: &Diagram, engine: &LayoutEngine, image: &Path) -> Result<()> {
    diagram.render(engine, image).map_err(|err| {
        if err.kind().is_backend() {
            tracing::error!(error = %err, "layout engine failed");
            err.with_context(
                "hint",
                format!(
                    "is '{}' installed? write the DOT text with -o, or pick another --engine",
                    engine.program()
                ),
            )
        } else {
            err
        }
    })
}

/// Chain and tree modes start from a record, or from nothing at all.
fn linked_root(document: &Document, mode: Mode) -> Result<Option<HeapRef<'_>>> {
    match document.root {
        Value::Empty => Ok(None),
        Value::Ref(id) => Ok(Some(HeapRef::new(&document.heap, id))),
        Value::Atom(_) => Err(wrong_root("a record or null", mode)),
    }
}

fn wrong_root(expected: &str, mode: Mode) -> Error {
    Error::invalid_argument(format!("{mode} mode needs {expected} as the document root"))
        .with_operation("cli::render")
        .with_context("mode", mode.to_string())
}
