use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::anyhow;
use clap::{ArgAction, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// One `key=value` setting given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RcOverride {
    pub key: String,
    pub value: String,
}

impl RcOverride {
    /// Parses the part after `rc.` in a positional override, where `:` is
    /// accepted as well as `=`.
    fn from_positional(rest: &str) -> Option<anyhow::Result<Self>> {
        let (key, value) = rest.split_once('=').or_else(|| rest.split_once(':'))?;
        Some(Self::build(key, value))
    }

    fn build(key: &str, value: &str) -> anyhow::Result<Self> {
        let key = key.trim();
        if key.is_empty() {
            return Err(anyhow!("empty key in rc override"));
        }
        Ok(Self {
            key: key.to_string(),
            value: value.trim().to_string(),
        })
    }
}

impl FromStr for RcOverride {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Self::build(key, value)
    }
}

/// Arguments with positional `rc.KEY=VALUE` overrides pulled out.
#[derive(Debug, Clone)]
pub struct SplitArgs {
    pub clap_args: Vec<OsString>,
    pub rc_overrides: Vec<RcOverride>,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "weekboard",
    version,
    about = "Weekly task dashboard: assessments, exams and teamwork due this week"
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,

    #[arg(long = "rc", value_name = "KEY=VALUE", action = ArgAction::Append)]
    pub rc_overrides: Vec<RcOverride>,

    #[arg(long = "rcfile")]
    pub rcfile: Option<PathBuf>,

    /// Show the week containing this date (today, 2025-03-14, +1w, -3d).
    #[arg(long = "week-of", default_value = "today")]
    pub week_of: String,

    /// Move the initial week by this many weeks.
    #[arg(long = "offset", default_value_t = 0, allow_negative_numbers = true)]
    pub offset: i64,

    #[arg(long = "json")]
    pub json: bool,

    /// Read navigation commands from stdin after the first render.
    #[arg(short = 'i', long = "interactive")]
    pub interactive: bool,
}

fn level_for(verbose: u8, quiet: u8) -> LevelFilter {
    match (quiet, verbose) {
        (2.., _) => LevelFilter::ERROR,
        (1, _) | (0, 0) => LevelFilter::WARN,
        (0, 1) => LevelFilter::INFO,
        (0, 2) => LevelFilter::DEBUG,
        (0, _) => LevelFilter::TRACE,
    }
}

/// Logs go to stderr so they never mix with the rendered dashboard.
/// `RUST_LOG` wins over `-v`/`-q`.
pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let level = level_for(verbose, quiet);
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::builder()
            .with_default_directive(level.into())
            .parse("")
            .map_err(|e| anyhow!("invalid log filter: {e}"))?,
    };

    let installed = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = installed {
        debug!(error = %err, "global subscriber already installed");
    }

    Ok(())
}

#[tracing::instrument(skip_all)]
pub fn split_rc_overrides(raw: &[OsString]) -> anyhow::Result<SplitArgs> {
    let mut clap_args = Vec::with_capacity(raw.len());
    let mut rc_overrides = Vec::new();

    for (idx, arg) in raw.iter().enumerate() {
        let text = arg.to_string_lossy();
        let positional = (idx > 0)
            .then(|| text.strip_prefix("rc."))
            .flatten()
            .and_then(RcOverride::from_positional);

        match positional {
            Some(parsed) => {
                let parsed = parsed?;
                debug!(key = %parsed.key, value = %parsed.value, "positional rc override");
                rc_overrides.push(parsed);
            }
            None => clap_args.push(arg.clone()),
        }
    }

    Ok(SplitArgs {
        clap_args,
        rc_overrides,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn os_args(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    fn rc(key: &str, value: &str) -> RcOverride {
        RcOverride {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn positional_rc_overrides_are_extracted() {
        let split = split_rc_overrides(&os_args(&[
            "weekboard",
            "rc.color=off",
            "--json",
            "rc.timezone:Asia/Tokyo",
            "rc.nothing",
        ]))
        .expect("split args");

        assert_eq!(split.clap_args, os_args(&["weekboard", "--json", "rc.nothing"]));
        assert_eq!(
            split.rc_overrides,
            vec![rc("color", "off"), rc("timezone", "Asia/Tokyo")]
        );
    }

    #[test]
    fn empty_override_key_is_an_error() {
        assert!(split_rc_overrides(&os_args(&["weekboard", "rc.=on"])).is_err());
        assert!("=on".parse::<RcOverride>().is_err());
        assert!("color".parse::<RcOverride>().is_err());
    }

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_for(0, 0), LevelFilter::WARN);
        assert_eq!(level_for(1, 0), LevelFilter::INFO);
        assert_eq!(level_for(2, 0), LevelFilter::DEBUG);
        assert_eq!(level_for(5, 0), LevelFilter::TRACE);
        assert_eq!(level_for(3, 1), LevelFilter::WARN);
        assert_eq!(level_for(0, 2), LevelFilter::ERROR);
    }

    #[test]
    fn parses_navigation_flags() {
        let cli = GlobalCli::try_parse_from([
            "weekboard",
            "--week-of",
            "2025-03-12",
            "--offset",
            "-2",
            "--rc",
            "color=off",
            "-vv",
        ])
        .expect("parse cli");

        assert_eq!(cli.week_of, "2025-03-12");
        assert_eq!(cli.offset, -2);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.rc_overrides, vec![rc("color", "off")]);
        assert!(!cli.json);
        assert!(!cli.interactive);
    }

    #[test]
    fn defaults_to_current_week_text_view() {
        let cli = GlobalCli::try_parse_from(["weekboard"]).expect("parse cli");
        assert_eq!(cli.week_of, "today");
        assert_eq!(cli.offset, 0);
        assert!(cli.rc_overrides.is_empty());
    }
}
