//! Delimited source reader with encoding and delimiter auto-detection.
//!
//! Produces a [`SourceTable`]: the header row is read and discarded, every
//! following record is kept by position. Records are read in flexible mode so
//! short or long lines reach the completeness check instead of failing here.

use std::path::Path;
use tracing::{info, warn};

use crate::error::{IngestError, IngestResult};
use crate::models::SourceTable;

/// Result of reading a source with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Ingested records
    pub table: SourceTable,
    /// Detected encoding
    pub encoding: String,
    /// Detected or configured delimiter
    pub delimiter: char,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> IngestResult<String> {
    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => match std::str::from_utf8(bytes) {
            Ok(s) => s.to_string(),
            Err(_) => String::from_utf8_lossy(bytes).into_owned(),
        },
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.into_owned()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        other => {
            let label = encoding_rs::Encoding::for_label(other.as_bytes()).ok_or_else(|| {
                IngestError::Encoding(format!("unsupported encoding '{}'", other))
            })?;
            label.decode(bytes).0.into_owned()
        }
    };
    Ok(decoded)
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Read a source file, matching record positions to `fields`.
///
/// A missing file and a file with no header row are errors; a file with only
/// a header yields an empty table.
pub fn read_source(
    path: &Path,
    fields: &[String],
    delimiter: Option<char>,
) -> IngestResult<ParseResult> {
    if !path.is_file() {
        return Err(IngestError::NotFound(path.to_path_buf()));
    }
    info!(source = %path.display(), "Reading source file");
    let bytes = std::fs::read(path)?;
    parse_bytes(&bytes, fields, delimiter)
}

/// Parse source bytes with auto-detection of encoding and (optionally) delimiter.
pub fn parse_bytes(
    bytes: &[u8],
    fields: &[String],
    delimiter: Option<char>,
) -> IngestResult<ParseResult> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(&content));
    let table = parse_str(&content, fields, delimiter)?;

    Ok(ParseResult {
        table,
        encoding,
        delimiter,
    })
}

/// Parse decoded source text with an explicit delimiter.
pub fn parse_str(content: &str, fields: &[String], delimiter: char) -> IngestResult<SourceTable> {
    let content = content.trim_start_matches('\u{feff}');
    if content.trim().is_empty() {
        return Err(IngestError::EmptySource);
    }
    let delimiter_byte =
        u8::try_from(delimiter).map_err(|_| IngestError::InvalidDelimiter(delimiter))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter_byte)
        .from_reader(content.as_bytes());
    let mut records = reader.records();

    let headers: Vec<String> = match records.next() {
        Some(header) => header?.iter().map(|h| h.trim().to_string()).collect(),
        None => return Err(IngestError::EmptySource),
    };
    if headers != fields {
        warn!(
            headers = ?headers,
            expected = ?fields,
            "Header does not match configured source fields"
        );
    }

    // Blank lines are dropped by the reader and never become records.
    let mut rows = Vec::new();
    for result in records {
        let record = result?;
        rows.push(record.iter().map(String::from).collect());
    }
    info!("{} records extracted", rows.len());

    Ok(SourceTable::new(fields.to_vec(), headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_simple_csv() {
        let table = parse_str("name,age\nAlice,30\nBob,25", &fields(&["name", "age"]), ',').unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.records[0].values, vec!["Alice", "30"]);
        assert_eq!(table.records[1].values, vec!["Bob", "25"]);
        assert_eq!(table.records[1].id.0, 2);
        assert_eq!(table.headers, vec!["name", "age"]);
    }

    #[test]
    fn test_quoted_values() {
        let csv = "name;value\n\"Alice\";\"Hello; World\"";
        let table = parse_str(csv, &fields(&["name", "value"]), ';').unwrap();
        assert_eq!(table.records[0].values, vec!["Alice", "Hello; World"]);
    }

    #[test]
    fn test_short_and_long_records_kept() {
        let csv = "a,b,c\n1,2\n1,2,3,4\n";
        let table = parse_str(csv, &fields(&["a", "b", "c"]), ',').unwrap();
        assert_eq!(table.records[0].values.len(), 2);
        assert_eq!(table.records[1].values.len(), 4);
    }

    #[test]
    fn test_blank_lines_are_not_records() {
        let csv = "a,b\n1,2\n\n3,4\n\n";
        let table = parse_str(csv, &fields(&["a", "b"]), ',').unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records[1].values, vec!["3", "4"]);
        assert_eq!(table.records[1].id.0, 2);
    }

    #[test]
    fn test_header_only_source() {
        let table = parse_str("a,b,c\n", &fields(&["a", "b", "c"]), ',').unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_empty_source_error() {
        let err = parse_str("", &fields(&["a"]), ',').unwrap_err();
        assert!(matches!(err, IngestError::EmptySource));
        let err = parse_str("\u{feff}  \n", &fields(&["a"]), ',').unwrap_err();
        assert!(matches!(err, IngestError::EmptySource));
    }

    #[test]
    fn test_non_ascii_delimiter() {
        let err = parse_str("a§b", &fields(&["a", "b"]), '§').unwrap_err();
        assert!(matches!(err, IngestError::InvalidDelimiter('§')));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
        assert_eq!(detect_delimiter("single"), ',');
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1").unwrap();
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_read_source_not_found() {
        let dir = tempdir().unwrap();
        let err = read_source(&dir.path().join("missing.csv"), &fields(&["a"]), None).unwrap_err();
        assert!(matches!(err, IngestError::NotFound(_)));
    }

    #[test]
    fn test_read_source_auto_detect() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, "a;b\n1;2\n").unwrap();

        let result = read_source(&path, &fields(&["a", "b"]), None).unwrap();
        assert_eq!(result.delimiter, ';');
        assert_eq!(result.encoding, "utf-8");
        assert_eq!(result.table.records[0].values, vec!["1", "2"]);
    }
}
