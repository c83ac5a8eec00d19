use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::grade::Grade;
use crate::scoring::recalculate;
use crate::student::{QuestionSlot, Student, StudentId};

/// One worksheet's students, in row order.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct SheetData {
    pub name: String,
    pub students: Vec<Arc<Student>>,
}

/// An immutable snapshot of everything read from a workbook.
///
/// Cloning is cheap: sheets and students are shared, and an edit only
/// replaces the path from the workbook down to the edited student.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct WorkbookData {
    pub filename: String,
    pub sheets: Vec<Arc<SheetData>>,
}

impl SheetData {
    pub fn new(name: impl Into<String>, students: Vec<Student>) -> Self {
        SheetData {
            name: name.into(),
            students: students.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn find(&self, id: &StudentId) -> Option<&Arc<Student>> {
        self.students.iter().find(|s| &s.id == id)
    }

    fn position(&self, id: &StudentId) -> Option<usize> {
        self.students.iter().position(|s| &s.id == id)
    }
}

impl WorkbookData {
    pub fn new(filename: impl Into<String>, sheets: Vec<SheetData>) -> Self {
        WorkbookData {
            filename: filename.into(),
            sheets: sheets.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn sheet(&self, index: usize) -> Option<&SheetData> {
        self.sheets.get(index).map(|s| s.as_ref())
    }

    pub fn student_count(&self) -> usize {
        self.sheets.iter().map(|s| s.students.len()).sum()
    }
}

/// Set one question's grade for one student and re-derive the totals.
///
/// Returns a new snapshot; `workbook` itself is never touched. An unknown
/// sheet or student, or a grade meant for the other question family,
/// yields an unchanged copy whose sheets are all shared with the input.
pub fn apply_grade(
    workbook: &WorkbookData,
    sheet_index: usize,
    student_id: &StudentId,
    slot: QuestionSlot,
    grade: Grade,
) -> WorkbookData {
    if grade.kind() != slot.kind() {
        warn!("Ignoring grade '{}' for {}: wrong question type", grade.key(), slot);
        return workbook.clone();
    }

    let Some(sheet) = workbook.sheets.get(sheet_index) else {
        debug!("Sheet {} not found, grade not applied", sheet_index);
        return workbook.clone();
    };
    let Some(position) = sheet.position(student_id) else {
        debug!("Student {} not found in sheet '{}'", student_id, sheet.name);
        return workbook.clone();
    };

    let mut edited = Student::clone(&sheet.students[position]);
    edited.question_mut(slot).manual_grade = Some(grade);
    let edited = recalculate(&edited);

    let mut students = sheet.students.clone();
    students[position] = Arc::new(edited);

    let mut sheets = workbook.sheets.clone();
    sheets[sheet_index] = Arc::new(SheetData {
        name: sheet.name.clone(),
        students,
    });

    WorkbookData {
        filename: workbook.filename.clone(),
        sheets,
    }
}
