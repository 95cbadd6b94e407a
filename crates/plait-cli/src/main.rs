//! plaitc - compilation driver CLI for Plait parser modules.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser;

use plait_core::{Driver, GlueCompiler, ReferenceCompiler};

#[derive(Parser)]
#[command(name = "plaitc")]
#[command(about = "Compile Plait parser modules and their host glue")]
#[command(version)]
struct Cli {
    /// Input files (.plait, .pir, .pob, .cc/.cxx, .glue)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Add a directory to the module search path
    #[arg(short = 'L', long = "library-path", value_name = "DIR")]
    library_paths: Vec<PathBuf>,

    /// Print all recorded types as JSON after compilation
    #[arg(long)]
    dump_types: bool,

    /// Restrict --dump-types to exported types
    #[arg(long, requires = "dump_types")]
    exported_only: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("plaitc: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let mut driver = Driver::new(
        Box::new(ReferenceCompiler::new()),
        Box::new(GlueCompiler::new()),
    );

    for dir in &cli.library_paths {
        driver.search_paths_mut().push(dir.clone());
    }

    for input in &cli.inputs {
        driver.load_file(input, None)?;
    }

    if let Err(err) = driver.compile() {
        // Report the description first, the backend's extra context
        // after it.
        let context = err.context().map(str::to_string);
        let mut report = anyhow::Error::new(err);
        if let Some(context) = context {
            report = report.context(context);
        }
        return Err(report);
    }

    if cli.dump_types {
        let types = driver.types(cli.exported_only);
        let json =
            serde_json::to_string_pretty(&types).context("cannot serialize type records")?;
        println!("{json}");
    }

    Ok(())
}
