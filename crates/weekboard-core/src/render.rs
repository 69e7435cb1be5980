use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use chrono::NaiveDate;
use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::filter::Grouping;
use crate::task::Task;
use crate::week::WeekWindow;

pub const DASHBOARD_TITLE: &str = "Weekly Task Dashboard";
pub const EMPTY_GROUP_TEXT: &str = "No tasks this week";

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

#[derive(Debug, Serialize)]
struct DashboardSnapshot<'g, 'a> {
    week_start: NaiveDate,
    week_end: NaiveDate,
    total: usize,
    groups: &'g Grouping<'a>,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self {
            color: color && io::stdout().is_terminal(),
        })
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    #[tracing::instrument(skip(self, out, grouping), fields(week = %window.start()))]
    pub fn render_dashboard<W: Write>(
        &self,
        mut out: W,
        window: &WeekWindow,
        grouping: &Grouping<'_>,
    ) -> anyhow::Result<()> {
        writeln!(out, "{}", self.paint(DASHBOARD_TITLE, "1"))?;
        writeln!(
            out,
            "[p] Previous Week  {}  Next Week [n]",
            self.paint(&window.label(), "1")
        )?;

        for (category, tasks) in grouping.iter() {
            let heading = category.heading();
            writeln!(out)?;
            writeln!(out, "{}", self.paint(heading, category.color_code()))?;
            writeln!(out, "{:-<width$}", "", width = UnicodeWidthStr::width(heading))?;

            if tasks.is_empty() {
                writeln!(out, "  {EMPTY_GROUP_TEXT}")?;
                continue;
            }

            write_task_rows(&mut out, tasks)?;
        }

        Ok(())
    }

    #[tracing::instrument(skip(self, out, grouping), fields(week = %window.start()))]
    pub fn render_json<W: Write>(
        &self,
        mut out: W,
        window: &WeekWindow,
        grouping: &Grouping<'_>,
    ) -> anyhow::Result<()> {
        let snapshot = DashboardSnapshot {
            week_start: window.start(),
            week_end: window.last_day(),
            total: grouping.total(),
            groups: grouping,
        };
        let text = serde_json::to_string_pretty(&snapshot)?;
        writeln!(out, "{text}")?;
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_task_rows<W: Write>(out: &mut W, tasks: &[&Task]) -> anyhow::Result<()> {
    let width = tasks
        .iter()
        .map(|task| UnicodeWidthStr::width(task.title.as_str()))
        .max()
        .unwrap_or(0);

    for task in tasks {
        let padding = width.saturating_sub(UnicodeWidthStr::width(task.title.as_str()));
        writeln!(
            out,
            "  {}{}  Due: {}",
            task.title,
            " ".repeat(padding),
            task.due.format("%d %b %Y")
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{group_by_category, tasks_in_window};
    use crate::store::TaskStore;

    fn base_window() -> WeekWindow {
        WeekWindow::current_week(NaiveDate::from_ymd_opt(2025, 3, 10).expect("valid date"))
    }

    fn render_text(window: &WeekWindow) -> String {
        let store = TaskStore::seed();
        let grouping = group_by_category(tasks_in_window(&store, window));
        let mut buf = Vec::new();
        Renderer::plain()
            .render_dashboard(&mut buf, window, &grouping)
            .expect("render");
        String::from_utf8(buf).expect("utf8 output")
    }

    #[test]
    fn text_lists_tasks_under_their_headings() {
        let text = render_text(&base_window());

        assert!(text.starts_with(DASHBOARD_TITLE));
        assert!(text.contains("10 Mar - 16 Mar 2025"));

        let assessments = text.find("Assessments").expect("assessments heading");
        let exams = text.find("Exams").expect("exams heading");
        let teamwork = text.find("Teamwork").expect("teamwork heading");
        assert!(assessments < exams && exams < teamwork);

        let essay = text.find("Essay Submission").expect("essay listed");
        assert!(assessments < essay && essay < exams);
        assert!(text.contains("Due: 16 Mar 2025"));
        assert!(!text.contains("Quiz"));
        assert!(!text.contains(EMPTY_GROUP_TEXT));
    }

    #[test]
    fn empty_groups_show_placeholder() {
        let text = render_text(&base_window().shift(2));
        assert_eq!(text.matches(EMPTY_GROUP_TEXT).count(), 3);
        assert!(!text.contains("\x1b["));
    }

    #[test]
    fn rows_align_due_column() {
        let text = render_text(&base_window().shift(1));
        let teamwork_rows: Vec<&str> = text
            .lines()
            .filter(|line| line.contains("Group Presentation") || line.contains("Final Project"))
            .collect();
        assert_eq!(teamwork_rows.len(), 2);
        let first = teamwork_rows[0].find("Due:").expect("due column");
        let second = teamwork_rows[1].find("Due:").expect("due column");
        assert_eq!(first, second);
    }

    #[test]
    fn json_snapshot_has_all_groups() {
        let store = TaskStore::seed();
        let window = base_window().shift(1);
        let grouping = group_by_category(tasks_in_window(&store, &window));
        let mut buf = Vec::new();
        Renderer::plain()
            .render_json(&mut buf, &window, &grouping)
            .expect("render json");

        let value: serde_json::Value = serde_json::from_slice(&buf).expect("valid json");
        assert_eq!(value["week_start"], "2025-03-17");
        assert_eq!(value["week_end"], "2025-03-23");
        assert_eq!(value["total"], 4);
        assert_eq!(value["groups"]["exam"][0]["id"], 5);
        assert_eq!(value["groups"]["teamwork"][1]["title"], "Final Project Submission");
        assert_eq!(value["groups"]["assessment"][0]["category"], "assessment");
    }

    #[test]
    fn invalid_color_setting_is_rejected() {
        let mut cfg = Config::default();
        cfg.apply_overrides(vec![("color".to_string(), "purple".to_string())]);
        assert!(Renderer::new(&cfg).is_err());
    }
}
