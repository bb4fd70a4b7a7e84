//! Reads the first worksheet of an uploaded workbook, or a CSV file, into
//! plain cell values.

use calamine::{open_workbook_auto, Data, Reader};
use chrono::NaiveDate;
use std::fmt;
use std::path::Path;

use super::dates;
use crate::errors::ServiceError;

/// Supported upload formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Workbook,
    Csv,
}

impl SheetFormat {
    pub fn from_file_name(name: &str) -> Option<(Self, String)> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())?
            .to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some((SheetFormat::Workbook, ext)),
            "csv" => Some((SheetFormat::Csv, ext)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl CellValue {
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Cell content as a trimmed string.
    pub fn as_text(&self) -> String {
        self.to_string().trim().to_string()
    }

    /// Date carried by the cell, if it can be read as one.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(d) => Some(*d),
            CellValue::Number(n) => dates::from_excel_serial(*n),
            CellValue::Text(s) => dates::parse_date(s),
            CellValue::Empty => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl From<&Data> for CellValue {
    fn from(cell: &Data) -> Self {
        match cell {
            Data::Empty | Data::Error(_) => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::Bool(b) => CellValue::Text(b.to_string()),
            Data::DateTime(dt) => match dates::from_excel_serial(dt.as_f64()) {
                Some(date) if dt.is_datetime() => CellValue::Date(date),
                _ => CellValue::Number(dt.as_f64()),
            },
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        }
    }
}

/// Header row plus data rows tagged with their 1-based sheet row number.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<(usize, Vec<CellValue>)>,
}

pub fn read_sheet(path: &Path, format: SheetFormat) -> Result<Sheet, ServiceError> {
    match format {
        SheetFormat::Workbook => read_workbook(path),
        SheetFormat::Csv => read_csv(path),
    }
}

fn read_workbook(path: &Path) -> Result<Sheet, ServiceError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| ServiceError::ImportError(format!("Unable to read workbook: {}", e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ServiceError::ImportError("Workbook has no worksheets".to_string()))?
        .map_err(|e| ServiceError::ImportError(format!("Unable to read worksheet: {}", e)))?;

    // the range starts at the first used cell, not necessarily A1
    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(cells) => cells
            .iter()
            .map(|c| CellValue::from(c).as_text())
            .collect(),
        None => return Ok(Sheet::default()),
    };

    let rows = rows
        .enumerate()
        .map(|(idx, cells)| {
            (
                first_row + idx + 2,
                cells.iter().map(CellValue::from).collect(),
            )
        })
        .collect();

    Ok(Sheet { headers, rows })
}

fn read_csv(path: &Path) -> Result<Sheet, ServiceError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| ServiceError::ImportError(format!("Unable to read CSV file: {}", e)))?;

    let mut records = reader.records();
    let headers = match records.next() {
        Some(record) => record
            .map_err(|e| ServiceError::ImportError(format!("Unable to read CSV header: {}", e)))?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect(),
        None => return Ok(Sheet::default()),
    };

    let mut rows = Vec::new();
    for (idx, record) in records.enumerate() {
        let record = record.map_err(|e| {
            ServiceError::ImportError(format!("Unable to read CSV row {}: {}", idx + 2, e))
        })?;
        let cells = record
            .iter()
            .map(|v| {
                if v.is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(v.to_string())
                }
            })
            .collect();
        rows.push((idx + 2, cells));
    }

    Ok(Sheet { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn format_follows_extension() {
        assert_eq!(
            SheetFormat::from_file_name("catalog.XLSX").map(|(f, _)| f),
            Some(SheetFormat::Workbook)
        );
        assert_eq!(
            SheetFormat::from_file_name("catalog.csv").map(|(f, _)| f),
            Some(SheetFormat::Csv)
        );
        assert_eq!(SheetFormat::from_file_name("catalog.pdf"), None);
        assert_eq!(SheetFormat::from_file_name("catalog"), None);
    }

    #[test]
    fn numbers_render_without_trailing_zero() {
        assert_eq!(CellValue::Number(500.0).to_string(), "500");
        assert_eq!(CellValue::Number(12.5).to_string(), "12.5");
        assert!(CellValue::Text("   ".into()).is_blank());
        assert!(!CellValue::Number(0.0).is_blank());
    }

    #[test]
    fn csv_rows_are_numbered_from_two() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "\u{feff}Name,Dose,Price").unwrap();
        writeln!(file, "Paracetamol,500mg,12.50").unwrap();
        writeln!(file, ",,").unwrap();
        writeln!(file, "Ibuprofen,400mg").unwrap();
        file.flush().unwrap();

        let sheet = read_sheet(file.path(), SheetFormat::Csv).unwrap();

        assert_eq!(sheet.headers, vec!["Name", "Dose", "Price"]);
        assert_eq!(sheet.rows.len(), 3);
        assert_eq!(sheet.rows[0].0, 2);
        assert_eq!(sheet.rows[0].1[0], CellValue::Text("Paracetamol".into()));
        assert!(sheet.rows[1].1.iter().all(CellValue::is_blank));
        assert_eq!(sheet.rows[2].0, 4);
        assert_eq!(sheet.rows[2].1.len(), 2);
    }

    #[test]
    fn unreadable_workbook_is_an_import_error() {
        let mut file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        file.write_all(b"definitely not a zip archive").unwrap();
        file.flush().unwrap();

        let err = read_sheet(file.path(), SheetFormat::Workbook).unwrap_err();
        assert!(matches!(err, ServiceError::ImportError(_)));
    }
}
