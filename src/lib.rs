//! # Typesplit - JSON resources to per-type CSV files
//!
//! Reads a JSON document holding an array of heterogeneous resources, groups
//! the resources by the type names they declare, flattens each one into
//! dotted/bracketed columns and writes one CSV file per type.
//!
//! ## Modules
//!
//! - **flatten**: Nested JSON -> flat `path -> scalar` records
//! - **classify**: Group flattened records by their declared types
//! - **writer**: One CSV per type group, sorted union of columns
//!
//! ## Quick Start
//!
//! ```rust
//! use typesplit::{classify, flatten, ConvertConfig};
//! use serde_json::json;
//!
//! let flat = flatten(&json!({"a": {"b": 1, "c": [2, 3]}}), "");
//! assert_eq!(flat["a.c[1]"], json!(3));
//!
//! let resources = vec![
//!     json!({"id": 1, "types": ["Pod", "Workload"], "spec": {"replicas": 2}}),
//!     json!({"id": 2, "types": "Pod"}),
//! ];
//! let result = classify(&resources, &ConvertConfig::default());
//! assert_eq!(result.groups.get("Pod").unwrap().records.len(), 2);
//! ```

use serde_json::Value;
use std::io::Write;
use std::path::Path;
use tracing::{debug, error, info, warn};

pub mod classify;
pub mod error;
pub mod flatten;
pub mod types;
pub mod writer;

// Re-export commonly used types for convenience
pub use classify::{classify, Classification, ClassifyStats, TypeGroup, TypeGroups};
pub use error::{ConvertError, FlattenError, WriteError};
pub use flatten::{flatten, Flattener};
pub use types::{ConvertConfig, FlatRecord, RunSummary};
pub use writer::CsvTypeWriter;

/// Deepest container nesting accepted in an input document.
///
/// Parsing, flattening and dropping a document all recurse once per level, so
/// anything deeper is refused up front instead of exhausting the stack.
pub const MAX_DOCUMENT_DEPTH: usize = 1000;

/// Whether raw JSON opens more than `limit` nested containers at any point.
/// Brackets inside string literals are ignored; syntax is left to the parser.
fn nesting_exceeds(content: &[u8], limit: usize) -> bool {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for &byte in content {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                if depth > limit {
                    return true;
                }
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    false
}

/// Read and parse the input JSON document
pub fn load_document(path: &Path) -> Result<Value, ConvertError> {
    let mut content = std::fs::read(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConvertError::InputNotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConvertError::InputRead {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    if nesting_exceeds(&content, MAX_DOCUMENT_DEPTH) {
        return Err(ConvertError::TooDeep {
            path: path.to_path_buf(),
            limit: MAX_DOCUMENT_DEPTH,
        });
    }

    simd_json::serde::from_slice::<Value>(&mut content).map_err(|source| {
        ConvertError::MalformedJson {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Locate the resources array in a parsed document
pub fn resources_of<'a>(
    document: &'a Value,
    config: &ConvertConfig,
) -> Result<&'a [Value], ConvertError> {
    let field = &config.resources_field;
    match document.get(field) {
        Some(Value::Array(resources)) => Ok(resources),
        Some(other) => Err(ConvertError::ResourcesNotArray {
            field: field.clone(),
            found: classify::json_kind(other),
        }),
        None => Err(ConvertError::ResourcesMissing {
            field: field.clone(),
        }),
    }
}

fn ensure_output_dir(output_dir: &Path) -> Result<(), ConvertError> {
    if output_dir.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(output_dir).map_err(|source| ConvertError::OutputDir {
        path: output_dir.to_path_buf(),
        source,
    })?;
    info!("Created output directory: {}", output_dir.display());
    Ok(())
}

/// Run a whole conversion: load, validate, classify, then write every group.
///
/// Per-file success lines go to `report`; diagnostics go through `tracing`.
/// Only run-level problems are returned as errors. Bad records and failed
/// files are logged, counted in the summary and otherwise skipped.
pub fn convert<W: Write>(
    input: &Path,
    output_dir: &Path,
    config: &ConvertConfig,
    report: &mut W,
) -> Result<RunSummary, ConvertError> {
    ensure_output_dir(output_dir)?;

    let document = load_document(input)?;
    let resources = resources_of(&document, config)?;
    debug!("Loaded {} resources from {}", resources.len(), input.display());

    let Classification { groups, stats } = classify(resources, config);
    let mut summary = RunSummary {
        resources_seen: stats.resources_seen,
        records_filed: stats.records_filed,
        records_skipped: stats.records_skipped,
        type_entries_skipped: stats.type_entries_skipped,
        groups: groups.len(),
        ..RunSummary::default()
    };

    if groups.is_empty() {
        info!(
            "No resources with valid '{}' found to generate CSV files.",
            config.types_field
        );
        return Ok(summary);
    }

    let writer = CsvTypeWriter::new(output_dir);
    for group in groups.iter() {
        match writer.write_group(group) {
            Ok(path) => {
                let line = format!("Successfully created CSV file: '{}'", path.display());
                if let Err(err) = writeln!(report, "{}", line) {
                    warn!("Could not report written file {}: {}", path.display(), err);
                }
                summary.files_written.push(path);
            }
            Err(err) => {
                error!("{}", err);
                summary.files_failed.push(err.path().to_path_buf());
            }
        }
    }

    info!(
        "Wrote {} of {} CSV files ({} records filed, {} skipped)",
        summary.files_written.len(),
        summary.groups,
        summary.records_filed,
        summary.records_skipped
    );
    Ok(summary)
}
