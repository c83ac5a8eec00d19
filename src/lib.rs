/*!
# GradeMaster

Review and re-grade questions 21-30 of an exam workbook, with totals
recomputed on every change and an export that keeps the original file intact.

## Overview

Exam results arrive as a spreadsheet workbook: one sheet per group, one row
per student, a base score for questions 1-20 and one column per re-graded
question. Questions 21-25 are graph questions, 26-30 are calculations. The
reviewer picks a grade for each answer; points, discrepancies against the
source file and the correction totals follow from those grades.

## Architecture

### Data Layer
- **grade**: grade labels, their point values, and inference from raw cell values
- **student**: `Student`, `QuestionScore` and the ten `QuestionSlot`s
- **workbook**: immutable `WorkbookData` / `SheetData` snapshots and `apply_grade`
- **scoring**: pure recomputation of points and totals

### File Layer
- **columns**: the header names of the grading workbooks
- **loader**: reads any calamine-supported workbook into `WorkbookData`
- **downloader**: writes grades back into a copy of the original xlsx

### Session Layer
- **state**: `AppState` and the `update` reducer shared by every front end
- **stats**: sheet statistics and student filtering
- **config**: server settings from the environment
- **app**: axum JSON API (feature `web`)

## Known Limitations

Grade inference is lossy. A cell holding 0 in a graph question could have
been "Nema crteža" or "Loše"; it is always read as "Nema crteža" and the
reviewer corrects it by hand when needed.

## REST API Endpoints

- `POST /api/upload` - Loads a workbook (multipart field `workbook`)
- `GET /api/workbook` - Returns the whole workbook
- `POST /api/sheet/{index}` - Selects the active sheet
- `GET /api/students` - Lists students, filtered by `search` / `discrepancies`
- `GET /api/stats` - Statistics of the active sheet
- `POST /api/grade` - Sets one grade for one student
- `POST /api/export` - Downloads the graded workbook
*/

pub mod columns;
pub mod config;
pub mod downloader;
pub mod error;
pub mod grade;
pub mod loader;
pub mod scoring;
pub mod state;
pub mod stats;
pub mod student;
pub mod workbook;

#[cfg(feature = "web")]
pub mod app;

/// Re-export the commonly used types to make them easier to reach
pub use error::{GradeError, Result};
pub use grade::{CalcGrade, Grade, GraphGrade, QuestionKind};
pub use student::{QuestionScore, QuestionSlot, Student, StudentId};
pub use workbook::{SheetData, WorkbookData, apply_grade};
