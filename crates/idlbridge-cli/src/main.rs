use std::path::{Path, PathBuf};

use clap::Parser;
use clap_verbosity_flag::Verbosity;
use idlbridge_cli::{generate, write_outputs, CliError, Config, Outputs, Overrides, DEFAULT_CONFIG};

#[derive(Parser, Debug)]
#[command(name = "idlbridge")]
#[command(about = "TypeScript declarations and native binding glue from an interface library", long_about = None)]
struct Args {
    /// Configuration file (defaults to ./idlbridge.toml when present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Interface library (JSON)
    #[arg(short, long, value_name = "FILE")]
    library: Option<PathBuf>,

    /// Native namespace of the interface types
    #[arg(short, long)]
    namespace: Option<String>,

    /// Write TypeScript declarations to FILE
    #[arg(long, value_name = "FILE")]
    typescript: Option<PathBuf>,

    /// Write nan glue to FILE
    #[arg(long, value_name = "FILE")]
    nan: Option<PathBuf>,

    /// Write napi glue to FILE
    #[arg(long, value_name = "FILE")]
    napi: Option<PathBuf>,

    /// Write jsi glue to FILE
    #[arg(long, value_name = "FILE")]
    jsi: Option<PathBuf>,

    /// Fail without writing anything if any member had to be skipped
    #[arg(long)]
    deny_warnings: bool,

    #[command(flatten)]
    verbosity: Verbosity,
}

fn main() -> miette::Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbosity.log_level_filter())
        .init();

    run(args)?;
    Ok(())
}

fn run(args: Args) -> Result<(), CliError> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None if Path::new(DEFAULT_CONFIG).is_file() => Config::load(Path::new(DEFAULT_CONFIG))?,
        None => Config::default(),
    };
    let settings = config
        .merge(Overrides {
            library: args.library,
            namespace: args.namespace,
            outputs: Outputs {
                typescript: args.typescript,
                nan: args.nan,
                napi: args.napi,
                jsi: args.jsi,
            },
        })
        .into_settings()?;

    let outputs = generate(&settings)?;

    let mut count = 0;
    for output in &outputs {
        for diagnostic in &output.diagnostics {
            count += 1;
            eprintln!("{:?}", miette::Report::new(diagnostic.clone()));
        }
    }
    if count > 0 && args.deny_warnings {
        return Err(CliError::DiagnosticsDenied { count });
    }

    write_outputs(&outputs)?;
    for output in &outputs {
        println!("{} -> {}", output.kind, output.path.display());
    }
    Ok(())
}
