#![cfg(not(tarpaulin_include))]

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use log::{info, warn};
use std::io::Cursor;
use std::path::Path;
use uuid::Uuid;

use crate::columns::{self, HeaderMap};
use crate::error::{GradeError, Result};
use crate::scoring::recalculate;
use crate::student::{QuestionScore, QuestionSlot, Student};
use crate::workbook::{SheetData, WorkbookData};

/// Load a grading workbook from memory
///
/// Every sheet is read; the first non-blank row holds the headers and each
/// following non-blank row becomes a `Student`. Grades are inferred
/// from the question cells and totals are derived before returning.
///
/// # Arguments
/// * `filename` - Name of the source file, kept for the export name
/// * `bytes` - Raw file content (xlsx, xlsm, xlsb, xls or ods)
///
/// # Returns
/// * `Result<WorkbookData>` - The whole workbook, or an error if any sheet
///   cannot be read. No partial workbook is ever returned.
///
/// # Examples
/// ```no_run
/// use grademaster::loader::load_workbook;
///
/// let bytes = std::fs::read("ispit.xlsx").unwrap();
/// match load_workbook("ispit.xlsx", &bytes) {
///     Ok(workbook) => println!("Loaded {} sheets", workbook.sheets.len()),
///     Err(e) => eprintln!("Error loading workbook: {}", e),
/// }
/// ```
pub fn load_workbook(filename: &str, bytes: &[u8]) -> Result<WorkbookData> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

    let mut sheets = Vec::new();
    for sheet_name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&sheet_name)?;
        sheets.push(read_sheet(&sheet_name, &range));
    }

    let data = WorkbookData::new(filename, sheets);
    info!(
        "Loaded '{}': {} sheets, {} students",
        filename,
        data.sheets.len(),
        data.student_count()
    );
    Ok(data)
}

/// Read a workbook from disk, keeping only its file name
pub fn load_workbook_file(filepath: impl AsRef<Path>) -> Result<WorkbookData> {
    let path = filepath.as_ref();
    let bytes = std::fs::read(path)?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| GradeError::ingest(format!("invalid file name: {}", path.display())))?;
    load_workbook(filename, &bytes)
}

fn read_sheet(sheet_name: &str, range: &Range<Data>) -> SheetData {
    let mut rows = range.rows().skip_while(|row| is_blank_row(row));
    let Some(header_row) = rows.next() else {
        return SheetData::new(sheet_name, Vec::new());
    };

    let headers = HeaderMap::from_cells(
        header_row
            .iter()
            .enumerate()
            .map(|(c, cell)| (c as u32, cell_text(cell))),
    );
    let layout = SheetLayout::resolve(sheet_name, &headers);

    let students = rows
        .enumerate()
        .filter(|(_, row)| !is_blank_row(row))
        .map(|(position, row)| layout.read_student(row, position as u32))
        .collect();

    SheetData::new(sheet_name, students)
}

/// Columns of one sheet, relative to the start of its used range
struct SheetLayout {
    surname: Option<usize>,
    name: Option<usize>,
    student_id: Option<usize>,
    base_score: Option<usize>,
    questions: [Option<usize>; 10],
}

impl SheetLayout {
    fn resolve(sheet_name: &str, headers: &HeaderMap) -> Self {
        let lookup = |header: &str| {
            let col = headers.get(header).map(|c| c as usize);
            if col.is_none() {
                warn!("Sheet '{}' has no '{}' column", sheet_name, header);
            }
            col
        };

        let questions = std::array::from_fn(|i| {
            let slot = QuestionSlot::ALL[i];
            let col = headers.question(slot).map(|c| c as usize);
            if col.is_none() {
                warn!(
                    "Sheet '{}' has no '{}' column",
                    sheet_name,
                    columns::question_column(slot)
                );
            }
            col
        });

        SheetLayout {
            surname: lookup(columns::COL_SURNAME),
            name: lookup(columns::COL_NAME),
            student_id: lookup(columns::COL_ID),
            base_score: lookup(columns::COL_BASE_SCORE),
            questions,
        }
    }

    fn read_student(&self, row: &[Data], row_position: u32) -> Student {
        let cell = |col: Option<usize>| col.and_then(|c| row.get(c));
        let text = |col: Option<usize>| cell(col).map(cell_text).unwrap_or_default();
        let number = |col: Option<usize>| cell(col).map(cell_number).unwrap_or(0.0);

        let questions = std::array::from_fn(|i| {
            let slot = QuestionSlot::ALL[i];
            QuestionScore::from_original(slot.kind(), number(self.questions[i]))
        });

        recalculate(&Student {
            id: Uuid::new_v4(),
            student_id: text(self.student_id),
            surname: text(self.surname),
            name: text(self.name),
            base_score: number(self.base_score),
            questions,
            total_graph_points: 0.0,
            total_calc_points: 0.0,
            total_correction: 0.0,
            final_result: 0.0,
            row_position,
        })
    }
}

/// A row counts as blank when every cell is empty or whitespace text.
/// The exporter locates the header row with the same rule.
fn is_blank_row(row: &[Data]) -> bool {
    row.iter().all(|cell| match cell {
        Data::Empty => true,
        Data::String(s) => columns::is_blank(s),
        _ => false,
    })
}

/// Numeric value of a cell; anything unreadable counts as 0
pub fn cell_number(cell: &Data) -> f64 {
    let value = match cell {
        Data::Float(f) => *f,
        Data::Int(i) => *i as f64,
        Data::String(s) => parse_decimal(s).unwrap_or(0.0),
        _ => 0.0,
    };
    if value.is_finite() { value } else { 0.0 }
}

/// Text of a cell; whole numbers are written without a fraction
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

// Accepts "1.25" as well as the decimal comma form "1,25"
fn parse_decimal(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    trimmed
        .parse::<f64>()
        .or_else(|_| trimmed.replace(',', ".").parse::<f64>())
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_from_cells() {
        assert_eq!(cell_number(&Data::Float(1.25)), 1.25);
        assert_eq!(cell_number(&Data::Int(1)), 1.0);
        assert_eq!(cell_number(&Data::String(" 0.25 ".into())), 0.25);
        assert_eq!(cell_number(&Data::String("1,25".into())), 1.25);
        assert_eq!(cell_number(&Data::String("n/a".into())), 0.0);
        assert_eq!(cell_number(&Data::String("".into())), 0.0);
        assert_eq!(cell_number(&Data::Bool(true)), 0.0);
        assert_eq!(cell_number(&Data::Empty), 0.0);
        assert_eq!(cell_number(&Data::String("inf".into())), 0.0);
    }

    #[test]
    fn text_from_cells() {
        assert_eq!(cell_text(&Data::String(" Horvat ".into())), "Horvat");
        assert_eq!(cell_text(&Data::Float(36512345.0)), "36512345");
        assert_eq!(cell_text(&Data::Float(1.5)), "1.5");
        assert_eq!(cell_text(&Data::Int(42)), "42");
        assert_eq!(cell_text(&Data::Empty), "");
    }

    #[test]
    fn whitespace_rows_are_blank() {
        assert!(is_blank_row(&[Data::Empty, Data::String(" ".into())]));
        assert!(is_blank_row(&[Data::String("".into())]));
        assert!(!is_blank_row(&[Data::Empty, Data::Float(0.0)]));
        assert!(!is_blank_row(&[Data::String("Prezime".into())]));
    }

    #[test]
    fn garbage_bytes_fail_to_load() {
        let result = load_workbook("broken.xlsx", b"definitely not a spreadsheet");
        assert!(matches!(result, Err(GradeError::Ingest { .. })));
    }
}
