use chrono::{
  Datelike,
  Duration,
  NaiveDate
};
use tracing::warn;

const DAYS_PER_WEEK: i64 = 7;

/// A Monday-starting seven day window.
///
/// `start` is always a Monday. The upper bound is exclusive: a date belongs
/// to the window when `start <= date < end()`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash,
)]
pub struct WeekWindow {
  start: NaiveDate
}

impl WeekWindow {
  /// The window containing `reference`.
  #[must_use]
  pub fn current_week(
    reference: NaiveDate
  ) -> Self {
    Self {
      start: start_of_week(reference)
    }
  }

  /// Moves the window by whole weeks.
  ///
  /// Offsets that would leave the representable date range leave the
  /// window where it is.
  #[must_use]
  pub fn shift(
    self,
    delta_weeks: i64
  ) -> Self {
    let shifted =
      Duration::try_weeks(delta_weeks)
        .and_then(|delta| {
          self
            .start
            .checked_add_signed(delta)
        });

    match shifted {
      | Some(start) => Self { start },
      | None => {
        warn!(
          start = %self.start,
          delta_weeks,
          "week shift out of date range; keeping window"
        );
        self
      }
    }
  }

  pub fn start(&self) -> NaiveDate {
    self.start
  }

  /// Exclusive upper bound, seven days after `start`. Clamped to
  /// `NaiveDate::MAX` for the last representable week.
  pub fn end(&self) -> NaiveDate {
    add_days(self.start, DAYS_PER_WEEK)
  }

  /// Inclusive last day (the Sunday).
  pub fn last_day(&self) -> NaiveDate {
    add_days(
      self.start,
      DAYS_PER_WEEK - 1
    )
  }

  pub fn contains(
    &self,
    date: NaiveDate
  ) -> bool {
    date >= self.start
      && date < self.end()
  }

  /// Human readable range, e.g. `10 Mar - 16 Mar 2025`.
  pub fn label(&self) -> String {
    format!(
      "{} - {}",
      self.start.format("%d %b"),
      self.last_day().format("%d %b %Y")
    )
  }
}

fn start_of_week(
  day: NaiveDate
) -> NaiveDate {
  let diff = day
    .weekday()
    .num_days_from_monday()
    as i64;
  add_days(day, -diff)
}

// Clamps at the edges of chrono's range; only the far end of the last
// representable week can hit this.
fn add_days(
  date: NaiveDate,
  days: i64
) -> NaiveDate {
  date
    .checked_add_signed(Duration::days(
      days
    ))
    .unwrap_or(if days < 0 {
      NaiveDate::MIN
    } else {
      NaiveDate::MAX
    })
}
