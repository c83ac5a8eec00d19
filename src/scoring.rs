//! Pure recomputation of points, discrepancy flags and totals.

use crate::grade::QuestionKind;
use crate::student::{QuestionSlot, Student};

/// Round to two decimals, half away from zero.
///
/// Rounding works on the shortest decimal form of `value`, so `1.005`
/// becomes `1.01` even though its binary value sits slightly below.
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() || value.abs() >= 1e15 {
        return value;
    }

    let text = value.abs().to_string();
    let (whole, frac) = match text.split_once('.') {
        Some((w, f)) => (w, f),
        None => return value,
    };
    if frac.len() <= 2 {
        return value;
    }

    let kept = &frac[..2];
    let round_up = frac.as_bytes()[2] >= b'5';
    let cents = match format!("{whole}{kept}").parse::<i64>() {
        Ok(c) => c + i64::from(round_up),
        Err(_) => return value,
    };

    let rounded = cents as f64 / 100.0;
    if value.is_sign_negative() { -rounded } else { rounded }
}

/// Recompute every derived field of `student`.
///
/// Points follow the selected grades; totals are exact sums rounded to
/// two decimals. Applying this to its own output changes nothing.
pub fn recalculate(student: &Student) -> Student {
    let mut next = student.clone();

    let mut graph_sum = 0.0;
    let mut calc_sum = 0.0;

    for slot in QuestionSlot::ALL {
        let kind = slot.kind();
        let question = next.question_mut(slot);
        let points = kind.points_for(question.manual_grade);
        question.manual_points = points;
        question.is_discrepancy = points != question.original_value;

        match kind {
            QuestionKind::Graph => graph_sum += points,
            QuestionKind::Calc => calc_sum += points,
        }
    }

    let total_correction = graph_sum + calc_sum;
    let final_result = next.base_score + total_correction;

    next.total_graph_points = round2(graph_sum);
    next.total_calc_points = round2(calc_sum);
    next.total_correction = round2(total_correction);
    next.final_result = round2(final_result);
    next
}
