//! Session state and the only function allowed to change it.
//!
//! Every surface (web handlers, the terminal loop) keeps one `AppState`
//! and replaces it with the result of `update`. Snapshots share their
//! workbook data, so keeping old states around for undo costs little.

use log::{info, warn};
use std::sync::Arc;

use crate::error::{GradeError, Result};
use crate::grade::Grade;
use crate::stats::{SheetStats, StudentFilter};
use crate::student::{QuestionSlot, StudentId};
use crate::workbook::{apply_grade, SheetData, WorkbookData};

/// The file a workbook was loaded from, kept for export.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceFile {
    pub name: String,
    pub bytes: Arc<[u8]>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppState {
    pub source: Option<SourceFile>,
    pub workbook: Option<WorkbookData>,
    pub active_sheet: usize,
    pub filter: StudentFilter,
    pub loading: bool,
    pub exporting: bool,
}

#[derive(Clone, Debug)]
pub enum Action {
    LoadStarted,
    Loaded {
        source: SourceFile,
        workbook: WorkbookData,
    },
    LoadFailed,
    SelectSheet(usize),
    ApplyGrade {
        student_id: StudentId,
        slot: QuestionSlot,
        grade: Grade,
    },
    SetFilter(StudentFilter),
    ExportStarted,
    ExportFinished,
}

impl AppState {
    pub fn active_sheet(&self) -> Option<&SheetData> {
        self.workbook
            .as_ref()
            .and_then(|wb| wb.sheet(self.active_sheet))
    }

    /// Everything an export needs, taken from the current snapshot.
    /// Statistics of the active sheet, passing at `pass_mark`.
    pub fn active_stats(&self, pass_mark: f64) -> Option<SheetStats> {
        self.active_sheet()
            .map(|sheet| SheetStats::compute(sheet.students.iter().map(|s| s.as_ref()), pass_mark))
    }

    pub fn export_snapshot(&self) -> Result<(SourceFile, WorkbookData)> {
        match (&self.source, &self.workbook) {
            (Some(source), Some(workbook)) => Ok((source.clone(), workbook.clone())),
            _ => Err(GradeError::NoWorkbook),
        }
    }
}

/// Compute the state that follows `action`.
///
/// Rejected actions return an error and leave `state` as it was.
pub fn update(state: &AppState, action: Action) -> Result<AppState> {
    let mut next = state.clone();

    match action {
        Action::LoadStarted => {
            if state.loading {
                return Err(GradeError::Busy("a workbook is already loading"));
            }
            next.loading = true;
        }
        Action::Loaded { source, workbook } => {
            info!("Session switched to '{}'", source.name);
            next.source = Some(source);
            next.workbook = Some(workbook);
            next.active_sheet = 0;
            next.filter = StudentFilter::default();
            next.loading = false;
        }
        Action::LoadFailed => {
            warn!("Load failed, keeping previous workbook");
            next.loading = false;
        }
        Action::SelectSheet(index) => {
            ensure_not_loading(state)?;
            let workbook = state.workbook.as_ref().ok_or(GradeError::NoWorkbook)?;
            if index >= workbook.sheets.len() {
                return Err(GradeError::SheetOutOfRange(index));
            }
            next.active_sheet = index;
        }
        Action::ApplyGrade {
            student_id,
            slot,
            grade,
        } => {
            ensure_not_loading(state)?;
            let workbook = state.workbook.as_ref().ok_or(GradeError::NoWorkbook)?;
            next.workbook = Some(apply_grade(
                workbook,
                state.active_sheet,
                &student_id,
                slot,
                grade,
            ));
        }
        Action::SetFilter(filter) => {
            next.filter = filter;
        }
        Action::ExportStarted => {
            ensure_not_loading(state)?;
            if state.exporting {
                return Err(GradeError::Busy("an export is already running"));
            }
            if state.workbook.is_none() || state.source.is_none() {
                return Err(GradeError::NoWorkbook);
            }
            next.exporting = true;
        }
        Action::ExportFinished => {
            next.exporting = false;
        }
    }

    Ok(next)
}

fn ensure_not_loading(state: &AppState) -> Result<()> {
    if state.loading {
        Err(GradeError::Busy("a workbook is loading"))
    } else {
        Ok(())
    }
}
