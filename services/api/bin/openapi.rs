//! Writes the OpenAPI document of the flight API.
//!
//! Usage: `openapi [OUTPUT]`, defaulting to `openapi.json` in the working directory.

use flight_api::router::ApiDoc;
use std::path::{Path, PathBuf};
use utoipa::OpenApi;

fn write_document(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let document = ApiDoc::openapi().to_pretty_json()?;
    std::fs::write(path, document)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("openapi.json"));
    write_document(&path)?;
    println!("Wrote OpenAPI document to {}", path.display());
    Ok(())
}
