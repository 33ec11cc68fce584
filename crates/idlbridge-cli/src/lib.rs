//! Driver for the `idlbridge` binary: resolves the configuration, runs the
//! backends and writes their artifacts.

pub mod config;
pub mod error;
mod io;

use std::path::PathBuf;

use idlbridge_codegen::{emit_all, BackendKind, Diagnostics};
use idlbridge_model::Library;

pub use config::{Config, Outputs, Overrides, Settings, DEFAULT_CONFIG};
pub use error::CliError;

/// One generated artifact and where it goes.
#[derive(Debug)]
pub struct Output {
    pub kind: BackendKind,
    pub path: PathBuf,
    pub text: String,
    pub diagnostics: Diagnostics,
}

/// Loads the library and runs every configured backend. Nothing is written.
pub fn generate(settings: &Settings) -> Result<Vec<Output>, CliError> {
    let library = Library::load(&settings.library)?;
    log::info!(
        "Loaded {} interfaces from {}",
        library.interfaces().len(),
        settings.library.display()
    );

    let kinds: Vec<BackendKind> = settings.outputs.iter().map(|(kind, _)| *kind).collect();
    let outputs = emit_all(&library, &settings.options, &kinds)
        .into_iter()
        .zip(&settings.outputs)
        .map(|((kind, artifact), (_, path))| Output {
            kind,
            path: path.clone(),
            text: artifact.text,
            diagnostics: artifact.diagnostics,
        })
        .collect();
    Ok(outputs)
}

/// Writes each output's text to its path.
pub fn write_outputs(outputs: &[Output]) -> Result<(), CliError> {
    for output in outputs {
        io::write_file(&output.path, &output.text)?;
        log::info!("Wrote {} output to {}", output.kind, output.path.display());
    }
    Ok(())
}
