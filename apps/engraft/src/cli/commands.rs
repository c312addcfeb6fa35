//! # CLI Command Implementations

use engraft_core::{GraphMlReader, IngestError, PropertyGraph, RedbGraph};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Validate an input file path.
///
/// Canonicalization resolves symlinks and "..", and fails on paths that do
/// not exist; the explicit file check rejects directories.
fn validate_file_path(path: &Path) -> Result<PathBuf, IngestError> {
    let canonical = path.canonicalize()?;
    if !canonical.is_file() {
        return Err(IngestError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("path '{}' is not a regular file", path.display()),
        )));
    }
    Ok(canonical)
}

// =============================================================================
// LOAD COMMAND
// =============================================================================

/// Stream a GraphML document into the database.
pub fn cmd_load(
    db_path: &Path,
    file: &Path,
    buffer_size: usize,
    json_mode: bool,
) -> Result<(), IngestError> {
    let file_path = validate_file_path(file)?;
    let mut graph = RedbGraph::open(db_path)?;

    tracing::info!(
        database = %db_path.display(),
        file = %file_path.display(),
        buffer_size,
        "loading GraphML document"
    );

    let started = Instant::now();
    let input = BufReader::new(File::open(&file_path)?);
    GraphMlReader::with_buffer_size(buffer_size).read(&mut graph, input)?;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    let vertices = graph.vertex_count()?;
    let edges = graph.edge_count()?;

    tracing::debug!(vertices, edges, elapsed_ms, "load complete");

    if json_mode {
        let output = serde_json::json!({
            "database": db_path.to_string_lossy(),
            "file": file_path.to_string_lossy(),
            "vertices": vertices,
            "edges": edges,
            "elapsed_ms": elapsed_ms
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Loaded {}", file_path.display());
    println!();
    println!("Vertices: {}", vertices);
    println!("Edges:    {}", edges);
    println!("Elapsed:  {} ms", elapsed_ms);

    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show database status.
pub fn cmd_status(db_path: &Path, json_mode: bool) -> Result<(), IngestError> {
    let graph = RedbGraph::open(db_path)?;
    let vertices = graph.vertex_count()?;
    let edges = graph.edge_count()?;

    if json_mode {
        let output = serde_json::json!({
            "database": db_path.to_string_lossy(),
            "vertices": vertices,
            "edges": edges
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("engraft Graph Status");
    println!("====================");
    println!("Database: {:?}", db_path);
    println!();
    println!("Vertices: {}", vertices);
    println!("Edges:    {}", edges);

    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
