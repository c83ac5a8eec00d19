#![cfg(not(tarpaulin_include))]

use grademaster::downloader::{export_filename, export_workbook};
use grademaster::grade::Grade;
use grademaster::loader::load_workbook;
use grademaster::state::{Action, AppState, SourceFile, update};
use grademaster::config::ServerConfig;
use grademaster::stats::{SheetStats, StudentFilter};
use grademaster::student::{QuestionSlot, Student};
use dotenvy::dotenv;
use std::env;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let pass_mark = ServerConfig::from_env()?.pass_mark;

    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <workbook.xlsx>", args[0]);
        return Ok(());
    }

    let path = Path::new(&args[1]);
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("workbook.xlsx")
        .to_string();

    let mut state = update(&AppState::default(), Action::LoadStarted)?;
    let workbook = match load_workbook(&name, &bytes) {
        Ok(workbook) => workbook,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(());
        }
    };
    let source = SourceFile {
        name,
        bytes: Arc::from(bytes),
    };
    state = update(&state, Action::Loaded { source, workbook })?;

    let mut start_time = Instant::now();
    let mut status = String::from("ok");
    let mut show = true;
    loop {
        if show {
            display_sheet(&state);
        }

        print!("[{:.1}] ({}) > ", start_time.elapsed().as_secs_f64(), status);
        io::stdout().flush()?;

        let mut command = String::new();
        if io::stdin().read_line(&mut command)? == 0 {
            break;
        }
        let command = command.trim();
        start_time = Instant::now();

        if command == "q" {
            break;
        }
        show = execute_command(&mut state, command, pass_mark, &mut status);
    }

    Ok(())
}

/// Run one command; returns whether the sheet should be shown again
fn execute_command(state: &mut AppState, cmd: &str, pass_mark: f64, status: &mut String) -> bool {
    let parts: Vec<&str> = cmd.split_whitespace().collect();
    let result = match parts.as_slice() {
        ["help"] => {
            print_help();
            return false;
        }
        ["sheets"] => {
            if let Some(workbook) = &state.workbook {
                for (i, sheet) in workbook.sheets.iter().enumerate() {
                    println!("{}: {} ({} students)", i, sheet.name, sheet.students.len());
                }
            }
            return false;
        }
        ["sheet", index] => match index.parse::<usize>() {
            Ok(index) => dispatch(state, Action::SelectSheet(index)),
            Err(_) => Err("invalid sheet number".to_string()),
        },
        ["list"] => dispatch(state, Action::SetFilter(StudentFilter::default())),
        ["issues"] => dispatch(
            state,
            Action::SetFilter(StudentFilter {
                search: String::new(),
                discrepancies_only: true,
            }),
        ),
        ["find", words @ ..] if !words.is_empty() => {
            let filter = StudentFilter {
                search: words.join(" "),
                discrepancies_only: state.filter.discrepancies_only,
            };
            dispatch(state, Action::SetFilter(filter))
        }
        ["show", row] => {
            match student_at(state, row) {
                Some(student) => display_student(student),
                None => *status = String::from("no such student"),
            }
            return false;
        }
        ["grade", row, question, grade @ ..] if !grade.is_empty() => {
            grade_student(state, row, question, &grade.join(" "))
        }
        ["stats"] => {
            if let (Some(sheet), Some(stats)) = (state.active_sheet(), state.active_stats(pass_mark)) {
                display_stats(&sheet.name, &stats);
            }
            return false;
        }
        ["export"] => export(state, None),
        ["export", target] => export(state, Some(*target)),
        _ => Err("invalid command".to_string()),
    };

    match result {
        Ok(()) => {
            *status = String::from("ok");
            true
        }
        Err(message) => {
            *status = message;
            false
        }
    }
}

fn dispatch(state: &mut AppState, action: Action) -> Result<(), String> {
    *state = update(state, action).map_err(|e| e.to_string())?;
    Ok(())
}

/// Student by the row number shown in the listing (1-based)
fn student_at<'a>(state: &'a AppState, row: &str) -> Option<&'a Student> {
    let index = row.parse::<usize>().ok()?.checked_sub(1)?;
    state.active_sheet()?.students.get(index).map(|s| s.as_ref())
}

fn grade_student(state: &mut AppState, row: &str, question: &str, grade: &str) -> Result<(), String> {
    let student_id = student_at(state, row)
        .map(|s| s.id)
        .ok_or_else(|| "no such student".to_string())?;
    let slot: QuestionSlot = question.parse().map_err(|e: grademaster::GradeError| e.to_string())?;
    let grade: Grade = grade.parse().map_err(|e: grademaster::GradeError| e.to_string())?;
    if grade.kind() != slot.kind() {
        return Err(format!("'{}' is not a grade for {}", grade.key(), slot));
    }
    dispatch(
        state,
        Action::ApplyGrade {
            student_id,
            slot,
            grade,
        },
    )
}

fn export(state: &mut AppState, target: Option<&str>) -> Result<(), String> {
    dispatch(state, Action::ExportStarted)?;
    let written = state
        .export_snapshot()
        .and_then(|(source, workbook)| {
            let bytes = export_workbook(&source.bytes, &workbook)?;
            let target = target
                .map(str::to_string)
                .unwrap_or_else(|| export_filename(&workbook));
            std::fs::write(&target, bytes)?;
            Ok(target)
        })
        .map_err(|e| e.to_string());
    dispatch(state, Action::ExportFinished)?;

    let target = written?;
    println!("Written {}", target);
    Ok(())
}

fn display_sheet(state: &AppState) {
    let Some(sheet) = state.active_sheet() else {
        return;
    };

    println!("== {} ==", sheet.name);
    print!("{:<4}{:<28}", "#", "Student");
    for slot in QuestionSlot::ALL {
        print!("{:<7}", slot.to_string());
    }
    println!("{:>8}{:>8}{:>8}", "Graph", "Calc", "Final");

    for (i, student) in sheet.students.iter().enumerate() {
        if !state.filter.matches(student) {
            continue;
        }
        let name: String = student.full_name().chars().take(26).collect();
        print!("{:<4}{:<28}", i + 1, name);
        for slot in QuestionSlot::ALL {
            let q = student.question(slot);
            let marker = if q.is_discrepancy { "*" } else { "" };
            print!("{:<7}", format!("{}{}", q.manual_points, marker));
        }
        println!(
            "{:>8.2}{:>8.2}{:>8.2}",
            student.total_graph_points, student.total_calc_points, student.final_result
        );
    }
}

fn display_student(student: &Student) {
    println!("{} ({})", student.full_name(), student.student_id);
    println!("  base score: {:.2}", student.base_score);
    for slot in QuestionSlot::ALL {
        let q = student.question(slot);
        let grade = q.manual_grade.map(|g| g.label()).unwrap_or("-");
        print!("  {}: {:<14} {:>5}", slot, grade, q.manual_points);
        if q.is_discrepancy {
            println!("  (was {})", q.original_value);
        } else {
            println!();
        }
    }
    println!(
        "  graph {:.2}  calc {:.2}  correction {:.2}  final {:.2}",
        student.total_graph_points,
        student.total_calc_points,
        student.total_correction,
        student.final_result
    );
}

fn display_stats(sheet_name: &str, stats: &SheetStats) {
    println!("== {} ==", sheet_name);
    println!("  students:      {}", stats.total_students);
    println!("  passed:        {}", stats.passed_students);
    println!("  discrepancies: {}", stats.students_with_discrepancy);
    println!("  average:       {:.2}", stats.average_score);
    for bucket in &stats.distribution {
        println!("  {:<6} {}", bucket.name, "#".repeat(bucket.count));
    }
}

fn print_help() {
    println!("Commands:");
    println!("  q: Quit");
    println!("  sheets: List sheets");
    println!("  sheet <n>: Switch to sheet n");
    println!("  list: Show all students");
    println!("  find <text>: Show students matching name, surname or ID");
    println!("  issues: Show students with discrepancies");
    println!("  show <row>: Show one student");
    println!("  grade <row> <q21..q30> <grade>: Set a grade");
    println!("      graph: no_drawing, bad, partial, good, excellent");
    println!("      calc:  not_solved, correct");
    println!("  stats: Sheet statistics");
    println!("  export [path]: Write the graded workbook");
}
