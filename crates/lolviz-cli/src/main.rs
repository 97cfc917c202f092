use std::path::PathBuf;

use clap::Parser;

use lolviz_cli::{LolvizOptions, Mode, PrefsOptions, render_image, run_main};
use lolviz_core::{LayoutEngine, OutputFormat, Result};

#[derive(Parser, Debug)]
#[command(
    name = "lolviz",
    about = "lolviz: draw object graphs as Graphviz diagrams",
    version
)]
pub struct Cli {
    /// JSON document describing the object graph
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Visualization to apply to the document root
    #[arg(short = 'm', long, value_enum, default_value_t = Mode::Obj)]
    mode: Mode,

    #[command(flatten)]
    prefs: PrefsOptions,

    /// Only show these frame arguments and locals (calls and obj modes)
    #[arg(
        long = "varnames",
        value_name = "NAME",
        num_args = 1..,
        action = clap::ArgAction::Append
    )]
    varnames: Option<Vec<String>>,

    /// Output file path for the DOT source (writes to file instead of stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: Option<PathBuf>,

    /// Also lay the diagram out into an image of this format
    #[arg(long = "render", value_name = "FORMAT", requires = "image")]
    render: Option<OutputFormat>,

    /// Image path used with --render
    #[arg(long = "image", value_name = "FILE", requires = "render")]
    image: Option<PathBuf>,

    /// Layout program to invoke
    #[arg(long = "engine", value_name = "PROGRAM", default_value = "dot")]
    engine: String,
}

pub fn run(args: Cli) -> Result<()> {
    // Initialize tracing subscriber for logging
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }

    let opts = LolvizOptions {
        input: args.input,
        mode: args.mode,
        prefs: args.prefs,
        varnames: args.varnames,
    };

    let diagram = match run_main(&opts) {
        Ok(diagram) => diagram,
        Err(e) => {
            tracing::error!(error = %e, "execution failed");
            return Err(e);
        }
    };

    if let Some(ref path) = args.output {
        diagram.save(path)?;
        tracing::info!(path = %path.display(), "output written");
    } else {
        println!("{diagram}");
    }

    if let (Some(format), Some(image)) = (args.render, args.image) {
        let engine = LayoutEngine::new(args.engine).with_format(format);
        render_image(&diagram, &engine, &image)?;
        tracing::info!(path = %image.display(), %format, "image rendered");
    }
    Ok(())
}

pub fn main() -> Result<()> {
    let args = Cli::parse();
    run(args)
}
