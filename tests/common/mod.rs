#![allow(dead_code)]

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};
use std::io::Cursor;

pub const FULL_HEADERS: [&str; 19] = [
    "Prezime",
    "Ime",
    "ID broj",
    "Napomena",
    "Ocjena/30,00",
    "P: 21 /1,00",
    "P: 22 /1,00",
    "P: 23 /1,00",
    "P: 24 /1,00",
    "P: 25 /1,00",
    "P: 26 /1,00",
    "P: 27 /1,00",
    "P: 28 /1,00",
    "P: 29 /1,00",
    "P: 30 /1,00",
    "Korekcija graf",
    "KOREKCIJA RAČ",
    "KOREKCIJA -  Ukupna",
    "KONAČNI REZULTAT",
];

/// Column of the first question in `FULL_HEADERS`
pub const FIRST_QUESTION_COL: u16 = 5;
pub const NOTE_COL: u16 = 3;
pub const BASE_COL: u16 = 4;
pub const GRAPH_TOTAL_COL: u16 = 15;
pub const FINAL_COL: u16 = 18;

pub struct Row<'a> {
    pub surname: &'a str,
    pub name: &'a str,
    pub id: f64,
    pub note: &'a str,
    pub base: f64,
    pub questions: [f64; 10],
}

fn write_headers(ws: &mut Worksheet, row: u32, headers: &[&str]) -> Result<(), XlsxError> {
    for (c, header) in headers.iter().enumerate() {
        ws.write_string(row, c as u16, *header)?;
    }
    Ok(())
}

fn write_row(ws: &mut Worksheet, r: u32, row: &Row, summaries: bool) -> Result<(), XlsxError> {
    ws.write_string(r, 0, row.surname)?;
    ws.write_string(r, 1, row.name)?;
    ws.write_number(r, 2, row.id)?;
    if !row.note.is_empty() {
        ws.write_string(r, NOTE_COL, row.note)?;
    }
    ws.write_number(r, BASE_COL, row.base)?;
    for (i, value) in row.questions.iter().enumerate() {
        ws.write_number(r, FIRST_QUESTION_COL + i as u16, *value)?;
    }
    if summaries {
        // stale values the export is expected to replace
        for c in GRAPH_TOTAL_COL..=FINAL_COL {
            ws.write_number(r, c, -1.0)?;
        }
    }
    Ok(())
}

/// Three sheets: a complete one with a blank row, one without the final
/// result column, one whose header sits on the third row. Plus a notes sheet.
pub fn exam_workbook() -> Vec<u8> {
    build().expect("fixture workbook")
}

fn build() -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();

    let ws = workbook.add_worksheet();
    ws.set_name("Grupa A")?;
    write_headers(ws, 0, &FULL_HEADERS)?;
    write_row(
        ws,
        1,
        &Row {
            surname: "Horvat",
            name: "Ana",
            id: 36500001.0,
            note: "ok",
            base: 18.0,
            questions: [1.25, 1.0, 0.25, 0.0, 1.25, 1.0, 0.0, 1.0, 1.0, 0.0],
        },
        true,
    )?;
    write_row(
        ws,
        2,
        &Row {
            surname: "Kovač",
            name: "Ivo",
            id: 36500002.0,
            note: "",
            base: 12.5,
            questions: [1.0; 10],
        },
        true,
    )?;
    // row 3 left blank
    write_row(
        ws,
        4,
        &Row {
            surname: "Babić",
            name: "Maja",
            id: 36500003.0,
            note: "žalba",
            base: 15.0,
            questions: [0.5, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.3],
        },
        true,
    )?;

    let ws = workbook.add_worksheet();
    ws.set_name("Grupa B")?;
    write_headers(ws, 0, &FULL_HEADERS[..18])?;
    write_row(
        ws,
        1,
        &Row {
            surname: "Novak",
            name: "Luka",
            id: 36500004.0,
            note: "",
            base: 20.0,
            questions: [0.0; 10],
        },
        false,
    )?;

    let ws = workbook.add_worksheet();
    ws.set_name("Grupa C")?;
    write_headers(ws, 2, &FULL_HEADERS)?;
    write_row(
        ws,
        3,
        &Row {
            surname: "Perić",
            name: "Eva",
            id: 36500005.0,
            note: "",
            base: 10.0,
            questions: [0.25; 10],
        },
        true,
    )?;

    let ws = workbook.add_worksheet();
    ws.set_name("Upute")?;
    ws.write_string(0, 0, "Upute za ocjenjivanje")?;

    workbook.save_to_buffer()
}

/// One sheet whose header sits below a row holding only a space
pub fn padded_workbook() -> Vec<u8> {
    build_padded().expect("padded workbook")
}

fn build_padded() -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let ws = workbook.add_worksheet();
    ws.set_name("Grupa A")?;
    ws.write_string(0, 0, " ")?;
    write_headers(ws, 1, &FULL_HEADERS)?;
    write_row(
        ws,
        2,
        &Row {
            surname: "Horvat",
            name: "Ana",
            id: 36500001.0,
            note: "",
            base: 18.0,
            questions: [1.0; 10],
        },
        true,
    )?;
    workbook.save_to_buffer()
}

/// Raw cell of an exported file, by absolute 0-based position
pub fn raw_cell(bytes: &[u8], sheet: &str, row: u32, col: u32) -> Data {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).expect("readable workbook");
    let range = workbook.worksheet_range(sheet).expect("sheet exists");
    range.get_value((row, col)).cloned().unwrap_or(Data::Empty)
}

pub fn raw_number(bytes: &[u8], sheet: &str, row: u32, col: u32) -> f64 {
    match raw_cell(bytes, sheet, row, col) {
        Data::Float(f) => f,
        Data::Int(i) => i as f64,
        other => panic!("expected a number at ({row}, {col}) in {sheet}, got {other:?}"),
    }
}
