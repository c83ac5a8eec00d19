//! Header names the grading workbooks use, and lookup of their columns.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

use crate::student::QuestionSlot;

pub const COL_SURNAME: &str = "Prezime";
pub const COL_NAME: &str = "Ime";
pub const COL_ID: &str = "ID broj";
pub const COL_BASE_SCORE: &str = "Ocjena/30,00";

pub const COL_GRAPH_TOTAL: &str = "Korekcija graf";
pub const COL_CALC_TOTAL: &str = "KOREKCIJA RAČ";
pub const COL_CORRECTION_TOTAL: &str = "KOREKCIJA -  Ukupna";
pub const COL_FINAL: &str = "KONAČNI REZULTAT";

/// Prepended to the source file name when exporting.
pub const EXPORT_PREFIX: &str = "Graded_";

lazy_static! {
    static ref QUESTION_HEADER_REGEX: Regex = Regex::new(r"^P:\s*(\d+)\s*/\s*1,00$").unwrap();
}

/// Header of the column holding `slot`, e.g. `P: 21 /1,00`.
pub fn question_column(slot: QuestionSlot) -> String {
    format!("P: {} /1,00", slot.number())
}

/// Whether a cell's text counts as empty when looking for the header row.
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Column positions found in a sheet's header row.
///
/// Names are trimmed. When a name repeats, the right-most column wins.
#[derive(Debug, Clone, Default)]
pub struct HeaderMap {
    columns: HashMap<String, u32>,
}

impl HeaderMap {
    /// Build from `(column index, header text)` pairs.
    pub fn from_cells<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = (u32, S)>,
        S: AsRef<str>,
    {
        let mut columns = HashMap::new();
        for (col, text) in cells {
            let name = text.as_ref().trim();
            if !name.is_empty() {
                columns.insert(name.to_string(), col);
            }
        }
        HeaderMap { columns }
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.columns.get(name).copied()
    }

    /// Column of a question, tolerating spacing differences in the header.
    pub fn question(&self, slot: QuestionSlot) -> Option<u32> {
        if let Some(col) = self.get(&question_column(slot)) {
            return Some(col);
        }
        self.columns
            .iter()
            .filter(|(name, _)| {
                QUESTION_HEADER_REGEX
                    .captures(name)
                    .and_then(|caps| caps[1].parse::<u32>().ok())
                    == Some(slot.number())
            })
            .map(|(_, col)| *col)
            .max()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
