use std::io::{BufRead, Write};

use anyhow::{Context, anyhow};
use chrono::NaiveDate;
use tracing::{debug, info, instrument, warn};

use crate::datetime::parse_week_of;
use crate::filter::{Grouping, group_by_category, tasks_in_window};
use crate::render::Renderer;
use crate::store::TaskStore;
use crate::task::Task;
use crate::week::WeekWindow;

const PROMPT: &str = "> ";

pub fn known_command_names() -> Vec<&'static str> {
    vec!["previous", "next", "today", "goto", "quit", "help"]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavCommand {
    PreviousWeek,
    NextWeek,
    Today,
    GoTo(NaiveDate),
    Help,
    Quit,
}

impl NavCommand {
    /// Parses one line of interactive input. `today` anchors relative dates.
    pub fn parse(input: &str, today: NaiveDate) -> anyhow::Result<Self> {
        let mut parts = input.split_whitespace();
        let token = parts
            .next()
            .ok_or_else(|| anyhow!("empty command"))?
            .to_ascii_lowercase();
        let arg = parts.next();

        let known = known_command_names();
        let name = expand_command_abbrev(&token, &known)
            .ok_or_else(|| anyhow!("unknown command: {token}"))?;

        let cmd = match name {
            "previous" => NavCommand::PreviousWeek,
            "next" => NavCommand::NextWeek,
            "today" => NavCommand::Today,
            "goto" => {
                let raw = arg.ok_or_else(|| anyhow!("goto needs a date, e.g. goto 2025-03-17"))?;
                NavCommand::GoTo(parse_week_of(raw, today)?)
            }
            "help" => NavCommand::Help,
            "quit" => NavCommand::Quit,
            other => return Err(anyhow!("unhandled command: {other}")),
        };

        if name != "goto" && arg.is_some() {
            warn!(command = name, "ignoring extra arguments");
        }

        Ok(cmd)
    }
}

/// Whether the interactive session keeps going after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// The dashboard view state: a read-only store plus the selected week.
#[derive(Debug, Clone)]
pub struct Dashboard {
    store: TaskStore,
    reference: NaiveDate,
    today: NaiveDate,
    window: WeekWindow,
}

impl Dashboard {
    /// Opens on the week containing `reference`; the `today` command returns
    /// there. Relative `goto` dates count from `reference` until
    /// [`Dashboard::with_today`] supplies the calendar date.
    pub fn new(store: TaskStore, reference: NaiveDate) -> Self {
        Self {
            store,
            reference,
            today: reference,
            window: WeekWindow::current_week(reference),
        }
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn window(&self) -> WeekWindow {
        self.window
    }

    pub fn reference(&self) -> NaiveDate {
        self.reference
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn visible_tasks(&self) -> Vec<&Task> {
        tasks_in_window(&self.store, &self.window)
    }

    pub fn grouping(&self) -> Grouping<'_> {
        group_by_category(self.visible_tasks())
    }

    pub fn previous_week(&mut self) {
        self.shift_weeks(-1);
    }

    pub fn next_week(&mut self) {
        self.shift_weeks(1);
    }

    pub fn shift_weeks(&mut self, delta_weeks: i64) {
        self.window = self.window.shift(delta_weeks);
        debug!(start = %self.window.start(), delta_weeks, "moved week window");
    }

    pub fn go_to(&mut self, date: NaiveDate) {
        self.window = WeekWindow::current_week(date);
        debug!(start = %self.window.start(), %date, "jumped to week");
    }

    pub fn apply(&mut self, cmd: NavCommand) -> Flow {
        match cmd {
            NavCommand::PreviousWeek => self.previous_week(),
            NavCommand::NextWeek => self.next_week(),
            NavCommand::Today => self.go_to(self.reference),
            NavCommand::GoTo(date) => self.go_to(date),
            NavCommand::Help => {}
            NavCommand::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    pub fn render<W: Write>(
        &self,
        renderer: &Renderer,
        format: OutputFormat,
        out: W,
    ) -> anyhow::Result<()> {
        let grouping = self.grouping();
        match format {
            OutputFormat::Text => renderer.render_dashboard(out, &self.window, &grouping),
            OutputFormat::Json => renderer.render_json(out, &self.window, &grouping),
        }
    }
}

/// Renders the dashboard, then re-renders after every navigation command read
/// from `input` until `quit` or end of input.
#[instrument(skip_all)]
pub fn run_session<R: BufRead, W: Write>(
    dashboard: &mut Dashboard,
    renderer: &Renderer,
    format: OutputFormat,
    input: R,
    mut out: W,
) -> anyhow::Result<()> {
    dashboard.render(renderer, format, &mut out)?;
    write_prompt(&mut out)?;

    for line in input.lines() {
        let line = line.context("failed reading command")?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            write_prompt(&mut out)?;
            continue;
        }

        let cmd = match NavCommand::parse(trimmed, dashboard.today()) {
            Ok(cmd) => cmd,
            Err(err) => {
                debug!(input = %trimmed, error = %err, "rejected command");
                writeln!(out, "{err:#}")?;
                writeln!(out, "{}", help_text())?;
                write_prompt(&mut out)?;
                continue;
            }
        };

        if cmd == NavCommand::Help {
            writeln!(out, "{}", help_text())?;
            write_prompt(&mut out)?;
            continue;
        }

        if dashboard.apply(cmd) == Flow::Quit {
            writeln!(out)?;
            break;
        }

        writeln!(out)?;
        dashboard.render(renderer, format, &mut out)?;
        write_prompt(&mut out)?;
    }

    info!(start = %dashboard.window().start(), "session ended");
    Ok(())
}

fn write_prompt<W: Write>(out: &mut W) -> anyhow::Result<()> {
    write!(out, "{PROMPT}")?;
    out.flush()?;
    Ok(())
}

pub fn help_text() -> &'static str {
    "commands: p(revious)  n(ext)  t(oday)  g(oto) DATE  h(elp)  q(uit)"
}
