//! JSON catalog writer

use crate::output::CatalogEntry;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while writing the catalog
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize catalog: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

const INDENT: &[u8] = b"    ";

/// Writes the catalog as a pretty-printed JSON array
///
/// Any existing file at `path` is replaced.
///
/// # Arguments
///
/// * `path` - Destination file
/// * `catalog` - Every entry collected during the run, in crawl order
pub fn write_catalog(path: &Path, catalog: &[CatalogEntry]) -> OutputResult<()> {
    let io_err = |source: std::io::Error| OutputError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);

    write_pretty(&mut writer, catalog)?;
    writer.write_all(b"\n").map_err(io_err)?;
    writer.flush().map_err(io_err)?;

    tracing::info!("Wrote {} products to {}", catalog.len(), path.display());
    Ok(())
}

/// Renders the catalog to a string with the same layout as [`write_catalog`]
pub fn render_catalog(catalog: &[CatalogEntry]) -> OutputResult<String> {
    let mut buffer = Vec::new();
    write_pretty(&mut buffer, catalog)?;
    String::from_utf8(buffer)
        .map_err(|e| OutputError::Serialize(<serde_json::Error as serde::ser::Error>::custom(e)))
}

fn write_pretty<W: Write, T: Serialize + ?Sized>(writer: W, value: &T) -> OutputResult<()> {
    let mut serializer =
        serde_json::Serializer::with_formatter(writer, PrettyFormatter::with_indent(INDENT));
    value.serialize(&mut serializer)?;
    Ok(())
}
