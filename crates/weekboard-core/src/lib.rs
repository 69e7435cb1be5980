pub mod cli;
pub mod config;
pub mod dashboard;
pub mod datetime;
pub mod filter;
pub mod render;
pub mod store;
pub mod task;
pub mod week;

use std::ffi::OsString;
use std::io;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

use crate::dashboard::{
  Dashboard,
  OutputFormat
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let split =
    cli::split_rc_overrides(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    split.clap_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting weekboard"
  );
  debug!(?split.rc_overrides, "positional rc overrides");

  let mut cfg = config::Config::load(
    cli.rcfile.as_deref()
  )?;
  cfg.apply_overrides(
    split
      .rc_overrides
      .into_iter()
      .chain(cli.rc_overrides)
      .map(|rc| (rc.key, rc.value))
  );

  let tz = datetime::resolve_timezone(
    cfg.get("timezone").as_deref()
  );
  let today = datetime::today_in(tz);
  let reference =
    datetime::parse_week_of(
      &cli.week_of,
      today
    )
    .with_context(|| {
      format!(
        "invalid --week-of value: {}",
        cli.week_of
      )
    })?;

  let renderer =
    render::Renderer::new(&cfg)?;
  let format = if cli.json {
    OutputFormat::Json
  } else {
    OutputFormat::Text
  };

  let mut dashboard = Dashboard::new(
    store::TaskStore::seed(),
    reference
  )
  .with_today(today);
  if cli.offset != 0 {
    dashboard.shift_weeks(cli.offset);
  }
  info!(
    week = %dashboard.window().start(),
    tasks = dashboard.store().len(),
    "dashboard ready"
  );

  let stdout = io::stdout();
  if cli.interactive {
    dashboard::run_session(
      &mut dashboard,
      &renderer,
      format,
      io::stdin().lock(),
      stdout.lock()
    )?;
  } else {
    dashboard.render(
      &renderer,
      format,
      stdout.lock()
    )?;
  }

  info!("done");
  Ok(())
}
