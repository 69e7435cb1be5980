use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

/// The closed set of task categories shown on the dashboard.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Assessment,
    Exam,
    Teamwork,
}

impl Category {
    /// Display order of the dashboard columns.
    pub const ALL: [Category; 3] = [Category::Assessment, Category::Exam, Category::Teamwork];

    pub fn key(self) -> &'static str {
        match self {
            Category::Assessment => "assessment",
            Category::Exam => "exam",
            Category::Teamwork => "teamwork",
        }
    }

    pub fn heading(self) -> &'static str {
        match self {
            Category::Assessment => "Assessments",
            Category::Exam => "Exams",
            Category::Teamwork => "Teamwork",
        }
    }

    /// ANSI SGR code used for the column heading when color is enabled.
    pub fn color_code(self) -> &'static str {
        match self {
            Category::Assessment => "33",
            Category::Exam => "31",
            Category::Teamwork => "34",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Task {
    pub id: u64,

    pub title: String,

    pub category: Category,

    pub due: NaiveDate,
}

impl Task {
    pub fn new(id: u64, title: impl Into<String>, category: Category, due: NaiveDate) -> Self {
        Self {
            id,
            title: title.into(),
            category,
            due,
        }
    }
}
