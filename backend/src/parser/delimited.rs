//! Delimited text sheets with encoding and delimiter auto-detection.

use crate::error::{WorkbookError, WorkbookResult};
use crate::models::{CellValue, Table};

use super::build_table;

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding.
///
/// Unknown encodings fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF".as_slice()).unwrap_or(bytes);
    match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [';', ',', '\t', '|'];
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

/// Type a raw text field the way a spreadsheet would show it.
///
/// Integers with a leading zero (`0042`) and decimals whose number form would
/// not reproduce the field (`25.10`, `1e5`) stay text, so lot numbers are
/// kept exactly as written.
pub fn infer_cell(raw: &str) -> CellValue {
    let s = raw.trim();
    if s.is_empty() {
        return CellValue::Empty;
    }

    let digits = s.trim_start_matches(['-', '+']);
    let padded = digits.len() > 1 && digits.starts_with('0') && !digits.starts_with("0.");
    if !padded {
        if let Ok(n) = s.parse::<i64>() {
            return CellValue::Int(n);
        }
        if s.bytes().any(|b| b.is_ascii_digit()) {
            if let Ok(f) = s.parse::<f64>() {
                if f.is_finite() && f.to_string() == s {
                    return CellValue::Float(f);
                }
            }
        }
    }

    CellValue::Text(s.to_string())
}

/// Parse decoded CSV content into a table.
///
/// The first record is the header; blank records are skipped; short records
/// are padded with empty cells.
pub fn parse_table(content: &str, delimiter: char) -> WorkbookResult<Table> {
    let delimiter = u8::try_from(delimiter)
        .map_err(|_| WorkbookError::Unreadable(format!("unsupported delimiter '{}'", delimiter)))?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record.map_err(|e| WorkbookError::Unreadable(format!("Cannot read header: {}", e)))?,
        None => return Ok(Table::default()),
    };
    let header: Vec<String> = header.iter().map(|h| h.to_string()).collect();

    let mut rows = Vec::new();
    for (line_idx, record) in records.enumerate() {
        let record = record.map_err(|e| {
            WorkbookError::Unreadable(format!("Line {}: {}", line_idx + 2, e))
        })?;
        rows.push(record.iter().map(infer_cell).collect::<Vec<_>>());
    }

    Ok(build_table(header, rows))
}

/// Decode raw bytes and parse them as a CSV sheet.
pub fn parse_bytes(bytes: &[u8]) -> WorkbookResult<Table> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);
    parse_table(&content, delimiter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_csv() {
        let table = parse_table("sow.nr;transplant\n25s.0001;10\n25s.0002;8", ';').unwrap();

        assert_eq!(table.columns(), &["sow.nr", "transplant"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].value("sow.nr"), &CellValue::from("25s.0001"));
        assert_eq!(table.rows()[1].value("transplant"), &CellValue::Int(8));
    }

    #[test]
    fn test_quoted_values() {
        let csv = "sow.nr,note\n\"25s.0001\",\"cross, late\"";
        let table = parse_table(csv, ',').unwrap();
        assert_eq!(table.rows()[0].value("note"), &CellValue::from("cross, late"));
    }

    #[test]
    fn test_empty_lines_skipped() {
        let table = parse_table("a;b\n1;2\n\n;\n3;4\n", ';').unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_missing_values() {
        let table = parse_table("a;b;c\n1;;3\n4", ';').unwrap();
        assert_eq!(table.rows()[0].value("b"), &CellValue::Empty);
        assert_eq!(table.rows()[1].value("c"), &CellValue::Empty);
    }

    #[test]
    fn test_infer_cell() {
        assert_eq!(infer_cell(""), CellValue::Empty);
        assert_eq!(infer_cell(" 12 "), CellValue::Int(12));
        assert_eq!(infer_cell("2.5"), CellValue::Float(2.5));
        assert_eq!(infer_cell("0.5"), CellValue::Float(0.5));
        assert_eq!(infer_cell("0"), CellValue::Int(0));
        assert_eq!(infer_cell("0042"), CellValue::from("0042"));
        assert_eq!(infer_cell("F2"), CellValue::from("F2"));
        assert_eq!(infer_cell("NaN"), CellValue::from("NaN"));
        assert_eq!(infer_cell("25s.0001"), CellValue::from("25s.0001"));
    }

    #[test]
    fn test_decimal_lot_numbers_kept_verbatim() {
        assert_eq!(infer_cell("25.10"), CellValue::from("25.10"));
        assert_eq!(infer_cell("25.1"), CellValue::Float(25.1));
        assert_eq!(infer_cell("1e5"), CellValue::from("1e5"));
        assert_eq!(infer_cell("3.0"), CellValue::from("3.0"));
        assert_eq!(infer_cell("-0.25"), CellValue::Float(-0.25));

        let table = parse_table("sow.nr,transplant\n25.10,1\n25.1,1\n", ',').unwrap();
        assert_eq!(table.rows()[0].value("sow.nr").to_string(), "25.10");
        assert_eq!(table.rows()[1].value("sow.nr").to_string(), "25.1");
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
    }

    #[test]
    fn test_auto_parse() {
        let table = parse_bytes(b"sow.nr,transplant,generation\n25s.0001,2,F2\n").unwrap();
        assert_eq!(table.columns(), &["sow.nr", "transplant", "generation"]);
        assert_eq!(table.rows()[0].value("transplant"), &CellValue::Int(2));
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_empty_content() {
        let table = parse_table("", ',').unwrap();
        assert!(table.columns().is_empty());
        assert!(table.is_empty());
    }
}
