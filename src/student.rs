use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::GradeError;
use crate::grade::{Grade, QuestionKind};

/// Internal identifier generated for every student at ingestion.
pub type StudentId = Uuid;

/// One of the ten re-graded questions, 21 through 30.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum QuestionSlot {
    Q21,
    Q22,
    Q23,
    Q24,
    Q25,
    Q26,
    Q27,
    Q28,
    Q29,
    Q30,
}

impl QuestionSlot {
    pub const ALL: [QuestionSlot; 10] = [
        QuestionSlot::Q21,
        QuestionSlot::Q22,
        QuestionSlot::Q23,
        QuestionSlot::Q24,
        QuestionSlot::Q25,
        QuestionSlot::Q26,
        QuestionSlot::Q27,
        QuestionSlot::Q28,
        QuestionSlot::Q29,
        QuestionSlot::Q30,
    ];

    pub const GRAPH: [QuestionSlot; 5] = [
        QuestionSlot::Q21,
        QuestionSlot::Q22,
        QuestionSlot::Q23,
        QuestionSlot::Q24,
        QuestionSlot::Q25,
    ];

    pub const CALC: [QuestionSlot; 5] = [
        QuestionSlot::Q26,
        QuestionSlot::Q27,
        QuestionSlot::Q28,
        QuestionSlot::Q29,
        QuestionSlot::Q30,
    ];

    /// Position of the slot inside `Student::questions`.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Question number as printed on the exam.
    pub fn number(self) -> u32 {
        21 + self as u32
    }

    pub fn from_number(number: u32) -> Option<QuestionSlot> {
        number
            .checked_sub(21)
            .and_then(|i| Self::ALL.get(i as usize).copied())
    }

    pub fn kind(self) -> QuestionKind {
        if self.number() <= 25 {
            QuestionKind::Graph
        } else {
            QuestionKind::Calc
        }
    }
}

impl fmt::Display for QuestionSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.number())
    }
}

/// Accepts `q21`, `Q21` or `21`.
impl FromStr for QuestionSlot {
    type Err = GradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('q')
            .or_else(|| trimmed.strip_prefix('Q'))
            .unwrap_or(trimmed);
        digits
            .parse::<u32>()
            .ok()
            .and_then(QuestionSlot::from_number)
            .ok_or_else(|| GradeError::UnknownQuestion(trimmed.to_string()))
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct QuestionScore {
    /// Value found in the source file.
    pub original_value: f64,
    /// Grade currently selected for the question.
    pub manual_grade: Option<Grade>,
    /// Points implied by `manual_grade`.
    pub manual_points: f64,
    /// Set when `manual_points` differs from `original_value`.
    pub is_discrepancy: bool,
}

impl QuestionScore {
    /// Score read from a cell, with its grade guessed from the value.
    pub fn from_original(kind: QuestionKind, original_value: f64) -> Self {
        QuestionScore {
            original_value,
            manual_grade: kind.infer(original_value),
            manual_points: original_value,
            is_discrepancy: false,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Student {
    pub id: StudentId,
    /// "ID broj" column.
    pub student_id: String,
    pub surname: String,
    pub name: String,
    /// Score for questions 1-20, never modified here.
    pub base_score: f64,
    /// Indexed by `QuestionSlot::index`.
    pub questions: [QuestionScore; 10],
    pub total_graph_points: f64,
    pub total_calc_points: f64,
    pub total_correction: f64,
    pub final_result: f64,
    /// 0-based position below the header row, used to find the row on export.
    pub row_position: u32,
}

impl Student {
    pub fn question(&self, slot: QuestionSlot) -> &QuestionScore {
        &self.questions[slot.index()]
    }

    pub fn question_mut(&mut self, slot: QuestionSlot) -> &mut QuestionScore {
        &mut self.questions[slot.index()]
    }

    pub fn has_discrepancy(&self) -> bool {
        self.questions.iter().any(|q| q.is_discrepancy)
    }

    /// Slots whose current points differ from the source file.
    pub fn discrepancies(&self) -> Vec<QuestionSlot> {
        QuestionSlot::ALL
            .iter()
            .copied()
            .filter(|slot| self.question(*slot).is_discrepancy)
            .collect()
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.surname, self.name).trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_numbers_and_kinds() {
        assert_eq!(QuestionSlot::Q21.number(), 21);
        assert_eq!(QuestionSlot::Q30.number(), 30);
        assert_eq!(QuestionSlot::Q25.kind(), QuestionKind::Graph);
        assert_eq!(QuestionSlot::Q26.kind(), QuestionKind::Calc);
        assert_eq!(QuestionSlot::Q27.index(), 6);
        assert!(QuestionSlot::GRAPH.iter().all(|s| s.kind() == QuestionKind::Graph));
        assert!(QuestionSlot::CALC.iter().all(|s| s.kind() == QuestionKind::Calc));
    }

    #[test]
    fn slot_parsing() {
        assert_eq!("q21".parse::<QuestionSlot>().unwrap(), QuestionSlot::Q21);
        assert_eq!("Q30".parse::<QuestionSlot>().unwrap(), QuestionSlot::Q30);
        assert_eq!("26".parse::<QuestionSlot>().unwrap(), QuestionSlot::Q26);
        assert!("q20".parse::<QuestionSlot>().is_err());
        assert!("q31".parse::<QuestionSlot>().is_err());
        assert!("x".parse::<QuestionSlot>().is_err());
        assert_eq!(QuestionSlot::Q28.to_string(), "q28");
    }

    #[test]
    fn from_number_bounds() {
        assert_eq!(QuestionSlot::from_number(0), None);
        assert_eq!(QuestionSlot::from_number(20), None);
        assert_eq!(QuestionSlot::from_number(24), Some(QuestionSlot::Q24));
        assert_eq!(QuestionSlot::from_number(31), None);
    }
}
