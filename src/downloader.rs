#![cfg(not(tarpaulin_include))]

use log::{debug, info};
use std::io::Cursor;
use umya_spreadsheet::{Spreadsheet as XlsxBook, Worksheet};

use crate::columns::{self, HeaderMap};
use crate::error::{GradeError, Result};
use crate::student::{QuestionSlot, Student};
use crate::workbook::{SheetData, WorkbookData};

/// Write the current grades back into a copy of the original workbook
///
/// The original file is re-read and, for every sheet that also exists in
/// `workbook`, the ten question cells and the four summary cells of each
/// student's row are overwritten. Nothing else in the file is changed.
/// Sheets or columns that cannot be found are skipped.
///
/// # Arguments
/// * `original` - Bytes of the file the workbook was loaded from (xlsx/xlsm)
/// * `workbook` - The graded snapshot to write
///
/// # Returns
/// * `Result<Vec<u8>>` - The new file content, or an error if the original
///   cannot be re-read or the result cannot be written
///
/// # Examples
/// ```no_run
/// use grademaster::downloader::{export_filename, export_workbook};
/// use grademaster::loader::load_workbook;
///
/// let original = std::fs::read("ispit.xlsx").unwrap();
/// let workbook = load_workbook("ispit.xlsx", &original).unwrap();
/// match export_workbook(&original, &workbook) {
///     Ok(xlsx) => std::fs::write(export_filename(&workbook), xlsx).unwrap(),
///     Err(e) => eprintln!("Failed to export: {}", e),
/// }
/// ```
pub fn export_workbook(original: &[u8], workbook: &WorkbookData) -> Result<Vec<u8>> {
    let mut book = umya_spreadsheet::reader::xlsx::read_reader(Cursor::new(original), true)
        .map_err(|e| GradeError::export(format!("cannot re-read original file: {e}")))?;

    for sheet in &workbook.sheets {
        match find_sheet_mut(&mut book, &sheet.name) {
            Some(worksheet) => write_sheet(worksheet, sheet),
            None => debug!("Sheet '{}' not in original file, skipped", sheet.name),
        }
    }

    let mut buffer = Cursor::new(Vec::new());
    umya_spreadsheet::writer::xlsx::write_writer(&book, &mut buffer)
        .map_err(|e| GradeError::export(e.to_string()))?;

    let bytes = buffer.into_inner();
    info!(
        "Exported '{}' ({} bytes)",
        export_filename(workbook),
        bytes.len()
    );
    Ok(bytes)
}

/// Name offered for the exported file, e.g. `Graded_ispit.xlsx`
pub fn export_filename(workbook: &WorkbookData) -> String {
    format!("{}{}", columns::EXPORT_PREFIX, workbook.filename)
}

fn find_sheet_mut<'a>(book: &'a mut XlsxBook, name: &str) -> Option<&'a mut Worksheet> {
    book.get_sheet_collection_mut()
        .iter_mut()
        .find(|ws| ws.get_name() == name)
}

fn write_sheet(worksheet: &mut Worksheet, sheet: &SheetData) {
    let (max_col, max_row) = worksheet.get_highest_column_and_row();
    let Some(header_row) = find_header_row(worksheet, max_col, max_row) else {
        debug!("Sheet '{}' is empty, skipped", sheet.name);
        return;
    };

    let headers = HeaderMap::from_cells(
        (1..=max_col).map(|col| (col, worksheet.get_value((col, header_row)))),
    );

    let question_cols: Vec<(QuestionSlot, Option<u32>)> = QuestionSlot::ALL
        .iter()
        .map(|slot| (*slot, headers.question(*slot)))
        .collect();
    let summary_cols = [
        (columns::COL_GRAPH_TOTAL, headers.get(columns::COL_GRAPH_TOTAL)),
        (columns::COL_CALC_TOTAL, headers.get(columns::COL_CALC_TOTAL)),
        (columns::COL_CORRECTION_TOTAL, headers.get(columns::COL_CORRECTION_TOTAL)),
        (columns::COL_FINAL, headers.get(columns::COL_FINAL)),
    ];
    for (name, col) in &summary_cols {
        if col.is_none() {
            debug!("Sheet '{}' has no '{}' column, skipped", sheet.name, name);
        }
    }

    for student in &sheet.students {
        let row = header_row + 1 + student.row_position;
        for (slot, col) in &question_cols {
            if let Some(col) = col {
                set_number(worksheet, *col, row, student.question(*slot).manual_points);
            }
        }
        for ((_, col), value) in summary_cols.iter().zip(summary_values(student)) {
            if let Some(col) = col {
                set_number(worksheet, *col, row, value);
            }
        }
    }
}

// Same order as the summary columns above
fn summary_values(student: &Student) -> [f64; 4] {
    [
        student.total_graph_points,
        student.total_calc_points,
        student.total_correction,
        student.final_result,
    ]
}

/// First row (1-based) holding any non-blank value, matching the loader
fn find_header_row(worksheet: &Worksheet, max_col: u32, max_row: u32) -> Option<u32> {
    (1..=max_row).find(|row| {
        (1..=max_col).any(|col| !columns::is_blank(&worksheet.get_value((col, *row))))
    })
}

fn set_number(worksheet: &mut Worksheet, col: u32, row: u32, value: f64) {
    worksheet.get_cell_mut((col, row)).set_value_number(value);
}
