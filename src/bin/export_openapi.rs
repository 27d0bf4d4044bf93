use clap::Parser;
use notes_backend::handlers::rest::ApiDoc;
use utoipa::OpenApi;

use std::{fs, path::PathBuf};

/// Write the OpenAPI document of the notes API to a file for client generation.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Output path for the OpenAPI JSON file
    #[arg(long, default_value = "interfaces/openapi.json")]
    out: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let mut document = ApiDoc::openapi().to_pretty_json()?;
    document.push('\n');

    if let Some(parent) = args.out.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(&args.out, document)?;

    tracing::info!("Wrote OpenAPI schema to {}", args.out.display());

    Ok(())
}
