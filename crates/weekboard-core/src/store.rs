use std::collections::HashSet;

use anyhow::anyhow;
use chrono::NaiveDate;
use tracing::debug;

use crate::task::{Category, Task};

const fn seed_date(year: i32, month: u32, day: u32) -> NaiveDate {
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => date,
        None => panic!("invalid seed date"),
    }
}

const SEED_TASKS: [(u64, &str, Category, NaiveDate); 7] = [
    (1, "Project Proposal", Category::Teamwork, seed_date(2025, 3, 14)),
    (2, "Midterm Exam", Category::Exam, seed_date(2025, 3, 15)),
    (3, "Essay Submission", Category::Assessment, seed_date(2025, 3, 16)),
    (4, "Group Presentation", Category::Teamwork, seed_date(2025, 3, 17)),
    (5, "Quiz", Category::Exam, seed_date(2025, 3, 18)),
    (6, "Lab Report", Category::Assessment, seed_date(2025, 3, 19)),
    (7, "Final Project Submission", Category::Teamwork, seed_date(2025, 3, 20)),
];

/// Read-only task collection. Insertion order is the display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStore {
    tasks: Vec<Task>,
}

impl TaskStore {
    /// Builds a store, rejecting duplicate ids.
    pub fn new(tasks: Vec<Task>) -> anyhow::Result<Self> {
        let mut seen = HashSet::with_capacity(tasks.len());
        for task in &tasks {
            if !seen.insert(task.id) {
                return Err(anyhow!("duplicate task id: {}", task.id));
            }
        }

        debug!(count = tasks.len(), "built task store");
        Ok(Self { tasks })
    }

    /// The compiled-in seed tasks.
    pub fn seed() -> Self {
        let tasks = SEED_TASKS
            .iter()
            .map(|(id, title, category, due)| Task::new(*id, *title, *category, *due))
            .collect();
        Self { tasks }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
