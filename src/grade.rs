use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GradeError;

/// The two families of re-graded questions.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// Questions 21-25, answered with a drawing.
    Graph,
    /// Questions 26-30, answered with a computation.
    Calc,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GraphGrade {
    NoDrawing,
    Bad,
    Partial,
    Good,
    Excellent,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CalcGrade {
    NotSolved,
    Correct,
}

/// A grade assigned by the reviewer, tagged with its question family.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum Grade {
    Graph(GraphGrade),
    Calc(CalcGrade),
}

impl GraphGrade {
    pub const ALL: [GraphGrade; 5] = [
        GraphGrade::NoDrawing,
        GraphGrade::Bad,
        GraphGrade::Partial,
        GraphGrade::Good,
        GraphGrade::Excellent,
    ];

    pub fn points(self) -> f64 {
        match self {
            GraphGrade::NoDrawing => 0.0,
            GraphGrade::Bad => 0.0,
            GraphGrade::Partial => 0.25,
            GraphGrade::Good => 1.0,
            GraphGrade::Excellent => 1.25,
        }
    }

    /// Label used on the printed grading sheets.
    pub fn label(self) -> &'static str {
        match self {
            GraphGrade::NoDrawing => "Nema crteža",
            GraphGrade::Bad => "Loše",
            GraphGrade::Partial => "Djelomično",
            GraphGrade::Good => "Dobro",
            GraphGrade::Excellent => "Odlično",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            GraphGrade::NoDrawing => "no_drawing",
            GraphGrade::Bad => "bad",
            GraphGrade::Partial => "partial",
            GraphGrade::Good => "good",
            GraphGrade::Excellent => "excellent",
        }
    }

    /// Guess the grade that produced a raw cell value.
    ///
    /// A value of 0 is shared by `NoDrawing` and `Bad`; it always maps to
    /// `NoDrawing` and the reviewer switches it by hand when needed.
    pub fn infer(value: f64) -> Option<GraphGrade> {
        if value == 1.25 {
            Some(GraphGrade::Excellent)
        } else if value == 1.0 {
            Some(GraphGrade::Good)
        } else if value == 0.25 {
            Some(GraphGrade::Partial)
        } else if value == 0.0 {
            Some(GraphGrade::NoDrawing)
        } else {
            None
        }
    }
}

impl CalcGrade {
    pub const ALL: [CalcGrade; 2] = [CalcGrade::NotSolved, CalcGrade::Correct];

    pub fn points(self) -> f64 {
        match self {
            CalcGrade::NotSolved => 0.0,
            CalcGrade::Correct => 1.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CalcGrade::NotSolved => "Nije riješio",
            CalcGrade::Correct => "Točno",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            CalcGrade::NotSolved => "not_solved",
            CalcGrade::Correct => "correct",
        }
    }

    pub fn infer(value: f64) -> Option<CalcGrade> {
        if value == 1.0 {
            Some(CalcGrade::Correct)
        } else if value == 0.0 {
            Some(CalcGrade::NotSolved)
        } else {
            None
        }
    }
}

impl Grade {
    pub fn kind(self) -> QuestionKind {
        match self {
            Grade::Graph(_) => QuestionKind::Graph,
            Grade::Calc(_) => QuestionKind::Calc,
        }
    }

    pub fn points(self) -> f64 {
        match self {
            Grade::Graph(g) => g.points(),
            Grade::Calc(g) => g.points(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Grade::Graph(g) => g.label(),
            Grade::Calc(g) => g.label(),
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Grade::Graph(g) => g.key(),
            Grade::Calc(g) => g.key(),
        }
    }

    /// Every grade a question of `kind` can receive.
    pub fn options(kind: QuestionKind) -> Vec<Grade> {
        match kind {
            QuestionKind::Graph => GraphGrade::ALL.iter().map(|g| Grade::Graph(*g)).collect(),
            QuestionKind::Calc => CalcGrade::ALL.iter().map(|g| Grade::Calc(*g)).collect(),
        }
    }
}

impl QuestionKind {
    pub fn infer(self, value: f64) -> Option<Grade> {
        match self {
            QuestionKind::Graph => GraphGrade::infer(value).map(Grade::Graph),
            QuestionKind::Calc => CalcGrade::infer(value).map(Grade::Calc),
        }
    }

    /// Points a question of this kind earns with `grade`.
    ///
    /// No grade, or a grade from the other family, is worth nothing.
    pub fn points_for(self, grade: Option<Grade>) -> f64 {
        match grade {
            Some(g) if g.kind() == self => g.points(),
            _ => 0.0,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Accepts the snake_case key (`excellent`) or the sheet label (`Odlično`).
impl FromStr for Grade {
    type Err = GradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        let graph = GraphGrade::ALL.iter().map(|g| Grade::Graph(*g));
        let calc = CalcGrade::ALL.iter().map(|g| Grade::Calc(*g));
        graph
            .chain(calc)
            .find(|g| g.key().eq_ignore_ascii_case(wanted) || g.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| GradeError::UnknownGrade(wanted.to_string()))
    }
}
