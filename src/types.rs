use serde::Serialize;
use serde_json::{Map, Value};
use std::path::PathBuf;

/// A resource flattened to a single level: path string -> scalar leaf.
///
/// Paths use `.` for object members and `[i]` for array elements, e.g.
/// `spec.ports[0].name`. Values are always JSON scalars.
pub type FlatRecord = Map<String, Value>;

/// Configuration for a conversion run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertConfig {
    /// Top-level field holding the array of resources
    pub resources_field: String,

    /// Per-resource field declaring one type name or a list of them
    pub types_field: String,

    /// Per-resource field used to identify a record in diagnostics
    pub id_field: String,

    /// Deepest nesting a record may have before flattening refuses it
    /// (`None` = unlimited, bounded only by [`crate::MAX_DOCUMENT_DEPTH`])
    pub max_depth: Option<usize>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        ConvertConfig {
            resources_field: String::from("resources"),
            types_field: String::from("types"),
            id_field: String::from("id"),
            max_depth: None,
        }
    }
}

/// What a run did, reported at the end
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Elements found in the resources array
    pub resources_seen: usize,

    /// Records filed under at least one type group
    pub records_filed: usize,

    /// Records skipped entirely (not an object, bad `types`, flatten failure)
    pub records_skipped: usize,

    /// Individual non-string entries dropped from `types` lists
    pub type_entries_skipped: usize,

    /// Number of distinct type groups
    pub groups: usize,

    /// CSV files written successfully
    pub files_written: Vec<PathBuf>,

    /// CSV files that failed to write
    pub files_failed: Vec<PathBuf>,
}

impl RunSummary {
    /// True when at least one output file could not be written
    pub fn has_failures(&self) -> bool {
        !self.files_failed.is_empty()
    }
}
