use serde::Serialize;

use crate::store::TaskStore;
use crate::task::{
  Category,
  Task
};
use crate::week::WeekWindow;

/// Tasks due inside `window`, in store order.
pub fn tasks_in_window<'a>(
  store: &'a TaskStore,
  window: &WeekWindow
) -> Vec<&'a Task> {
  store
    .iter()
    .filter(|task| {
      window.contains(task.due)
    })
    .collect()
}

/// Per-category partition of a task list. All three categories are always
/// present; a category with no tasks holds an empty list.
#[derive(
  Debug, Clone, Default, PartialEq, Eq, Serialize,
)]
pub struct Grouping<'a> {
  pub assessment: Vec<&'a Task>,
  pub exam:       Vec<&'a Task>,
  pub teamwork:   Vec<&'a Task>
}

impl<'a> Grouping<'a> {
  pub fn get(
    &self,
    category: Category
  ) -> &[&'a Task] {
    match category {
      | Category::Assessment => {
        &self.assessment
      }
      | Category::Exam => &self.exam,
      | Category::Teamwork => {
        &self.teamwork
      }
    }
  }

  /// Groups in dashboard column order.
  pub fn iter(
    &self
  ) -> impl Iterator<
    Item = (Category, &[&'a Task])
  > + '_ {
    Category::ALL
      .into_iter()
      .map(|category| {
        (category, self.get(category))
      })
  }

  pub fn total(&self) -> usize {
    self.assessment.len()
      + self.exam.len()
      + self.teamwork.len()
  }

  pub fn is_empty(&self) -> bool {
    self.total() == 0
  }

  fn bucket_mut(
    &mut self,
    category: Category
  ) -> &mut Vec<&'a Task> {
    match category {
      | Category::Assessment => {
        &mut self.assessment
      }
      | Category::Exam => {
        &mut self.exam
      }
      | Category::Teamwork => {
        &mut self.teamwork
      }
    }
  }
}

/// Partitions `tasks` by category, keeping input order inside each group.
pub fn group_by_category<'a, I>(
  tasks: I
) -> Grouping<'a>
where
  I: IntoIterator<Item = &'a Task>
{
  let mut grouping = Grouping::default();
  for task in tasks {
    grouping
      .bucket_mut(task.category)
      .push(task);
  }
  grouping
}
