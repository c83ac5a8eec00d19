//! Sheet statistics and student filtering.

use serde::{Deserialize, Serialize};

use crate::student::Student;

/// Final result needed to pass, unless configured otherwise.
pub const DEFAULT_PASS_MARK: f64 = 15.0;

/// Result ranges of the score distribution; the last one is open-ended.
pub const BUCKETS: [(&str, f64); 5] = [
    ("0-10", 0.0),
    ("10-15", 10.0),
    ("15-20", 15.0),
    ("20-25", 20.0),
    ("25-30", 25.0),
];

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct BucketCount {
    pub name: String,
    pub count: usize,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct SheetStats {
    pub total_students: usize,
    pub passed_students: usize,
    pub students_with_discrepancy: usize,
    pub average_score: f64,
    pub distribution: Vec<BucketCount>,
}

impl SheetStats {
    pub fn compute<'a, I>(students: I, pass_mark: f64) -> Self
    where
        I: IntoIterator<Item = &'a Student>,
    {
        let mut counts = [0usize; BUCKETS.len()];
        let mut total_students = 0;
        let mut passed_students = 0;
        let mut students_with_discrepancy = 0;
        let mut score_sum = 0.0;

        for student in students {
            total_students += 1;
            score_sum += student.final_result;
            if student.final_result >= pass_mark {
                passed_students += 1;
            }
            if student.has_discrepancy() {
                students_with_discrepancy += 1;
            }
            counts[bucket_of(student.final_result)] += 1;
        }

        let average_score = if total_students == 0 {
            0.0
        } else {
            score_sum / total_students as f64
        };

        SheetStats {
            total_students,
            passed_students,
            students_with_discrepancy,
            average_score,
            distribution: BUCKETS
                .iter()
                .zip(counts)
                .map(|((name, _), count)| BucketCount {
                    name: name.to_string(),
                    count,
                })
                .collect(),
        }
    }
}

fn bucket_of(result: f64) -> usize {
    BUCKETS
        .iter()
        .rposition(|(_, lower)| result >= *lower)
        .unwrap_or(0)
}

/// Which students of a sheet to show.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct StudentFilter {
    /// Case-insensitive text matched against name, surname and external id.
    #[serde(default)]
    pub search: String,
    /// Keep only students with at least one discrepant question.
    #[serde(default)]
    pub discrepancies_only: bool,
}

impl StudentFilter {
    pub fn matches(&self, student: &Student) -> bool {
        let query = self.search.trim().to_lowercase();
        let matches_search = query.is_empty()
            || student.name.to_lowercase().contains(&query)
            || student.surname.to_lowercase().contains(&query)
            || student.student_id.to_lowercase().contains(&query);

        matches_search && (!self.discrepancies_only || student.has_discrepancy())
    }

    pub fn apply<'a, I>(&self, students: I) -> Vec<&'a Student>
    where
        I: IntoIterator<Item = &'a Student>,
    {
        students.into_iter().filter(|s| self.matches(s)).collect()
    }
}
