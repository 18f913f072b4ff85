//! JSON output: sorted keys, four-space indent.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{PipelineError, PipelineResult};

/// Render `value` as pretty JSON with object keys sorted.
pub fn render_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    // Going through Value sorts struct fields along with map keys.
    let value = serde_json::to_value(value)?;

    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    buf.push(b'\n');

    // serde_json only emits valid UTF-8.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write `value` to `path`, creating parent directories.
pub fn write_json<T: Serialize>(value: &T, path: &Path) -> PipelineResult<()> {
    let rendered = render_json(value)?;
    let io_err = |source| PipelineError::Output {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, rendered).map_err(io_err)?;
    info!(output = %path.display(), "Result written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_render_sorted_and_indented() {
        let rendered = render_json(&json!({"b": [1], "a": {"d": 2, "c": 1}})).unwrap();
        assert_eq!(
            rendered,
            "{\n    \"a\": {\n        \"c\": 1,\n        \"d\": 2\n    },\n    \"b\": [\n        1\n    ]\n}\n"
        );
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("output").join("nested").join("result.json");
        write_json(&json!({"Asia": {}}), &path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(serde_json::from_str::<serde_json::Value>(&content).unwrap(), json!({"Asia": {}}));
    }

    #[test]
    fn test_write_into_file_path_fails() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();
        let err = write_json(&json!({}), &blocker.join("out.json")).unwrap_err();
        assert!(matches!(err, PipelineError::Output { .. }));
    }
}
