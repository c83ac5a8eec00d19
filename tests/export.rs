mod common;

use calamine::Data;
use grademaster::downloader::{export_filename, export_workbook};
use grademaster::loader::load_workbook;
use grademaster::{Grade, GradeError, GraphGrade, QuestionSlot, SheetData, apply_grade};

use common::{BASE_COL, FINAL_COL, FIRST_QUESTION_COL, GRAPH_TOTAL_COL, NOTE_COL, raw_cell, raw_number};

#[test]
fn export_file_name_has_prefix() {
    let workbook = load_workbook("ispit.xlsx", &common::exam_workbook()).unwrap();
    assert_eq!(export_filename(&workbook), "Graded_ispit.xlsx");
}

#[test]
fn unedited_round_trip_reproduces_values() {
    let original = common::exam_workbook();
    let workbook = load_workbook("ispit.xlsx", &original).unwrap();
    let exported = export_workbook(&original, &workbook).unwrap();
    let reloaded = load_workbook("Graded_ispit.xlsx", &exported).unwrap();

    for (before, after) in workbook.sheets.iter().zip(reloaded.sheets.iter()) {
        assert_eq!(before.name, after.name);
        assert_eq!(before.students.len(), after.students.len());
        for (a, b) in before.students.iter().zip(after.students.iter()) {
            for slot in QuestionSlot::ALL {
                assert_eq!(a.question(slot).manual_points, b.question(slot).original_value);
            }
            assert_eq!(a.total_graph_points, b.total_graph_points);
            assert_eq!(a.total_calc_points, b.total_calc_points);
            assert_eq!(a.final_result, b.final_result);
            assert_eq!(a.row_position, b.row_position);
        }
    }

    // inferable source values come back unchanged
    let ana = &reloaded.sheets[0].students[0];
    assert!(!ana.has_discrepancy());
    assert_eq!(raw_number(&exported, "Grupa A", 1, FIRST_QUESTION_COL as u32), 1.25);
}

#[test]
fn summary_columns_are_overwritten() {
    let original = common::exam_workbook();
    let workbook = load_workbook("ispit.xlsx", &original).unwrap();
    let exported = export_workbook(&original, &workbook).unwrap();

    let graph_col = GRAPH_TOTAL_COL as u32;
    let final_col = FINAL_COL as u32;
    assert_eq!(raw_number(&exported, "Grupa A", 1, graph_col), 3.75);
    assert_eq!(raw_number(&exported, "Grupa A", 1, graph_col + 1), 3.0);
    assert_eq!(raw_number(&exported, "Grupa A", 1, graph_col + 2), 6.75);
    assert_eq!(raw_number(&exported, "Grupa A", 1, final_col), 24.75);
    assert_eq!(raw_number(&exported, "Grupa A", 2, final_col), 22.5);
    assert_eq!(raw_number(&exported, "Grupa A", 4, final_col), 23.0);
    // header on the third row
    assert_eq!(raw_number(&exported, "Grupa C", 3, final_col), 11.25);
}

#[test]
fn untouched_cells_survive() {
    let original = common::exam_workbook();
    let workbook = load_workbook("ispit.xlsx", &original).unwrap();
    let exported = export_workbook(&original, &workbook).unwrap();

    assert_eq!(
        raw_cell(&exported, "Grupa A", 1, NOTE_COL as u32),
        Data::String("ok".into())
    );
    assert_eq!(
        raw_cell(&exported, "Grupa A", 4, NOTE_COL as u32),
        Data::String("žalba".into())
    );
    assert_eq!(raw_number(&exported, "Grupa A", 4, BASE_COL as u32), 15.0);
    assert_eq!(
        raw_cell(&exported, "Grupa A", 0, FINAL_COL as u32),
        Data::String("KONAČNI REZULTAT".into())
    );
    // the blank row stays blank
    assert_eq!(raw_cell(&exported, "Grupa A", 3, 0), Data::Empty);
    assert_eq!(raw_cell(&exported, "Grupa A", 3, FIRST_QUESTION_COL as u32), Data::Empty);
    assert_eq!(
        raw_cell(&exported, "Upute", 0, 0),
        Data::String("Upute za ocjenjivanje".into())
    );
}

#[test]
fn uninferable_values_are_replaced_by_points() {
    let original = common::exam_workbook();
    let workbook = load_workbook("ispit.xlsx", &original).unwrap();
    let exported = export_workbook(&original, &workbook).unwrap();

    assert_eq!(raw_number(&exported, "Grupa A", 4, FIRST_QUESTION_COL as u32), 0.0);
    assert_eq!(raw_number(&exported, "Grupa A", 4, FIRST_QUESTION_COL as u32 + 9), 0.0);
}

#[test]
fn edited_grade_is_exported() {
    let original = common::exam_workbook();
    let workbook = load_workbook("ispit.xlsx", &original).unwrap();
    let ivo = workbook.sheets[0].students[1].id;

    let edited = apply_grade(&workbook, 0, &ivo, QuestionSlot::Q21, Grade::Graph(GraphGrade::NoDrawing));
    let exported = export_workbook(&original, &edited).unwrap();

    assert_eq!(raw_number(&exported, "Grupa A", 2, FIRST_QUESTION_COL as u32), 0.0);
    assert_eq!(raw_number(&exported, "Grupa A", 2, GRAPH_TOTAL_COL as u32), 4.0);
    assert_eq!(raw_number(&exported, "Grupa A", 2, FINAL_COL as u32), 21.5);
    // neighbours keep their values
    assert_eq!(raw_number(&exported, "Grupa A", 1, FINAL_COL as u32), 24.75);

    let reloaded = load_workbook("Graded_ispit.xlsx", &exported).unwrap();
    let ivo_after = &reloaded.sheets[0].students[1];
    assert_eq!(ivo_after.question(QuestionSlot::Q21).original_value, 0.0);
    assert_eq!(ivo_after.final_result, 21.5);
}

#[test]
fn missing_column_and_sheet_are_skipped() {
    let original = common::exam_workbook();
    let mut workbook = load_workbook("ispit.xlsx", &original).unwrap();
    workbook
        .sheets
        .push(std::sync::Arc::new(SheetData::new("Nepostojeći", Vec::new())));

    let exported = export_workbook(&original, &workbook).unwrap();

    // "Grupa B" has no final result column; the rest is still written
    assert_eq!(raw_number(&exported, "Grupa B", 1, GRAPH_TOTAL_COL as u32), 0.0);
    assert_eq!(raw_number(&exported, "Grupa B", 1, GRAPH_TOTAL_COL as u32 + 2), 0.0);
    assert_eq!(raw_cell(&exported, "Grupa B", 1, FINAL_COL as u32), Data::Empty);
}

#[test]
fn broken_original_is_an_export_error() {
    let original = common::exam_workbook();
    let workbook = load_workbook("ispit.xlsx", &original).unwrap();
    let err = export_workbook(b"not a workbook", &workbook).unwrap_err();
    assert!(matches!(err, GradeError::Export { .. }));
}

#[test]
fn whitespace_row_above_headers_keeps_rows_aligned() {
    let original = common::padded_workbook();
    let workbook = load_workbook("ispit.xlsx", &original).unwrap();
    let ana = workbook.sheets[0].students[0].id;

    let edited = apply_grade(&workbook, 0, &ana, QuestionSlot::Q21, Grade::Graph(GraphGrade::Excellent));
    let exported = export_workbook(&original, &edited).unwrap();

    assert_eq!(
        raw_cell(&exported, "Grupa A", 1, FIRST_QUESTION_COL as u32),
        Data::String("P: 21 /1,00".into())
    );
    assert_eq!(raw_number(&exported, "Grupa A", 2, FIRST_QUESTION_COL as u32), 1.25);
    assert_eq!(raw_number(&exported, "Grupa A", 2, FINAL_COL as u32), 28.25);
    assert_eq!(raw_cell(&exported, "Grupa A", 3, BASE_COL as u32), Data::Empty);
    assert_eq!(raw_cell(&exported, "Grupa A", 3, FINAL_COL as u32), Data::Empty);
}
