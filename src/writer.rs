use crate::classify::TypeGroup;
use crate::error::WriteError;
use crate::types::FlatRecord;
use serde_json::Value;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Turn a type name into a file stem by replacing `/` and `\` with `_`
pub fn sanitize_file_stem(type_name: &str) -> String {
    type_name.replace(['/', '\\'], "_")
}

/// Render a scalar leaf as a CSV cell
pub fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        // Flattened records only hold scalars
        other => other.to_string(),
    }
}

/// Sorted union of every key across the records
pub fn columns_for(records: &[Rc<FlatRecord>]) -> Vec<&str> {
    let columns: BTreeSet<&str> = records
        .iter()
        .flat_map(|record| record.keys().map(String::as_str))
        .collect();
    columns.into_iter().collect()
}

/// Write a header of sorted columns then one row per record.
/// Columns a record lacks are left empty; rows end in CRLF.
pub fn write_csv<W: Write>(writer: W, records: &[Rc<FlatRecord>]) -> Result<(), csv::Error> {
    let columns = columns_for(records);
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(writer);

    wtr.write_record(&columns)?;
    for record in records {
        wtr.write_record(
            columns
                .iter()
                .map(|column| record.get(*column).map(render_cell).unwrap_or_default()),
        )?;
    }

    wtr.flush()?;
    Ok(())
}

/// Writes one CSV file per type group into an output directory
pub struct CsvTypeWriter {
    output_dir: PathBuf,
}

impl CsvTypeWriter {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        CsvTypeWriter {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    /// Where the CSV for a type name goes
    pub fn output_path(&self, type_name: &str) -> PathBuf {
        self.output_dir.join(format!("{}.csv", sanitize_file_stem(type_name)))
    }

    /// Write a group's CSV file, returning its path
    pub fn write_group(&self, group: &TypeGroup) -> Result<PathBuf, WriteError> {
        let path = self.output_path(&group.name);
        let file = std::fs::File::create(&path).map_err(|err| WriteError::Csv {
            path: path.clone(),
            source: err.into(),
        })?;

        write_csv(std::io::BufWriter::new(file), &group.records).map_err(|source| {
            WriteError::Csv {
                path: path.clone(),
                source,
            }
        })?;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Rc<FlatRecord> {
        Rc::new(crate::flatten::flatten(&value, ""))
    }

    fn to_csv(records: &[Rc<FlatRecord>]) -> String {
        let mut buffer = Vec::new();
        write_csv(&mut buffer, records).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_header_sorted_and_rows_in_order() {
        let records = vec![
            record(json!({"id": 1, "types": "A", "v": 1})),
            record(json!({"id": 2, "types": "A", "v": 2})),
        ];

        assert_eq!(to_csv(&records), "id,types,v\r\n1,A,1\r\n2,A,2\r\n");
    }

    #[test]
    fn test_missing_columns_are_empty() {
        let records = vec![
            record(json!({"b": 1, "tags": ["x", "y"]})),
            record(json!({"a": "z", "b": 2})),
        ];

        assert_eq!(to_csv(&records), "a,b,tags[0],tags[1]\r\n,1,x,y\r\nz,2,,\r\n");
    }

    #[test]
    fn test_cell_rendering_and_quoting() {
        let records = vec![record(json!({
            "flag": true,
            "none": null,
            "ratio": 0.5,
            "text": "hello, \"world\""
        }))];

        assert_eq!(
            to_csv(&records),
            "flag,none,ratio,text\r\ntrue,,0.5,\"hello, \"\"world\"\"\"\r\n"
        );
    }

    #[test]
    fn test_rows_end_with_crlf() {
        let records = vec![record(json!({"id": 1})), record(json!({"id": 2}))];
        let output = to_csv(&records);

        assert_eq!(output.matches("\r\n").count(), 3);
        assert_eq!(output.matches('\n').count(), 3);
    }

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(sanitize_file_stem("apps/v1"), "apps_v1");
        assert_eq!(sanitize_file_stem(r"a\b/c"), "a_b_c");
        assert_eq!(sanitize_file_stem("Pod"), "Pod");
        assert_eq!(sanitize_file_stem("//"), "__");
    }

    #[test]
    fn test_write_group_to_directory() {
        let dir = tempfile::tempdir().unwrap();
        let writer = CsvTypeWriter::new(dir.path());
        let group = TypeGroup {
            name: String::from("k8s/Service"),
            records: vec![record(json!({"id": "svc", "spec": {"port": 80}}))],
        };

        let path = writer.write_group(&group).unwrap();

        assert_eq!(path, dir.path().join("k8s_Service.csv"));
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "id,spec.port\r\nsvc,80\r\n");
    }

    #[test]
    fn test_write_group_reports_path_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let writer = CsvTypeWriter::new(dir.path().join("missing"));
        let group = TypeGroup {
            name: String::from("A"),
            records: vec![record(json!({"id": 1}))],
        };

        let err = writer.write_group(&group).unwrap_err();

        assert_eq!(err.path(), dir.path().join("missing").join("A.csv"));
    }
}
