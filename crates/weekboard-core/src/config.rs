use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use tracing::{
  debug,
  info,
  trace,
  warn
};

const RC_ENV_VAR: &str = "WEEKBOARDRC";
const RC_FILE_NAME: &str =
  ".weekboardrc";

/// Dashboard settings: built-in defaults, then the rc file, then command
/// line overrides.
#[derive(Debug, Clone)]
pub struct Config {
  values:           HashMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

#[derive(Debug, PartialEq, Eq)]
enum RcLine<'a> {
  Blank,
  Include(&'a str),
  Setting(&'a str, &'a str)
}

impl Default for Config {
  fn default() -> Self {
    let values = HashMap::from([(
      "color".to_string(),
      "on".to_string()
    )]);
    Self {
      values,
      loaded_files: vec![]
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    rc_override
  ))]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();

    let home = dirs::home_dir();
    match locate_rc(
      rc_override,
      std::env::var(RC_ENV_VAR).ok(),
      home.as_deref()
    ) {
      | Some(path) => {
        info!(rc = %path.display(), "loading weekboardrc");
        cfg.read_rc(&path)?;
      }
      | None => {
        warn!(
          "no weekboardrc found; \
           using defaults"
        );
      }
    }

    Ok(cfg)
  }

  /// Applies `key=value` pairs; a leading `rc.` on the key is ignored.
  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (raw_key, value) in overrides {
      let key = raw_key
        .strip_prefix("rc.")
        .unwrap_or(&raw_key)
        .to_string();
      debug!(key = %key, value = %value, "applying override");
      self.values.insert(key, value);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self.values.get(key).cloned()
  }

  fn read_rc(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let written = home_relative(path);
    let path = fs::canonicalize(&written)
      .with_context(|| {
        format!(
          "failed to read {}",
          written.display()
        )
      })?;
    if self.loaded_files.contains(&path)
    {
      warn!(rc = %path.display(), "rc file already loaded; skipping");
      return Ok(());
    }

    let text = fs::read_to_string(
      &path
    )
    .with_context(|| {
      format!(
        "failed to read {}",
        path.display()
      )
    })?;
    self
      .loaded_files
      .push(path.clone());

    let base_dir = path
      .parent()
      .map(Path::to_path_buf)
      .unwrap_or_default();

    for (idx, raw_line) in
      text.lines().enumerate()
    {
      let line_no = idx + 1;
      let parsed = parse_rc_line(
        raw_line
      )
      .ok_or_else(|| {
        anyhow!(
          "invalid config line \
           {}:{line_no}: {raw_line}",
          path.display()
        )
      })?;

      match parsed {
        | RcLine::Blank => {}
        | RcLine::Include(target) => {
          let target =
            base_dir.join(home_relative(
              Path::new(target)
            ));
          if target.exists() {
            debug!(
              from = %path.display(),
              include = %target.display(),
              line = line_no,
              "following include"
            );
            self.read_rc(&target)?;
          } else {
            warn!(include = %target.display(), "include file does not exist; skipping");
          }
        }
        | RcLine::Setting(key, value) => {
          trace!(key, value, "loaded config key");
          self.values.insert(
            key.to_string(),
            value.to_string()
          );
        }
      }
    }

    Ok(())
  }
}

/// Classifies one rc line; `None` means the line is malformed.
fn parse_rc_line(
  raw: &str
) -> Option<RcLine<'_>> {
  let line = raw
    .split_once('#')
    .map_or(raw, |(before, _)| before)
    .trim();

  if line.is_empty() {
    return Some(RcLine::Blank);
  }

  if let Some(target) =
    line.strip_prefix("include ")
  {
    let target = target.trim();
    return (!target.is_empty())
      .then_some(RcLine::Include(target));
  }

  let (key, value) =
    line.split_once('=')?;
  let key = key.trim();
  (!key.is_empty()).then(|| {
    RcLine::Setting(key, value.trim())
  })
}

/// `--rcfile` wins, then `WEEKBOARDRC` (`/dev/null` disables the rc file),
/// then `~/.weekboardrc` when it exists.
fn locate_rc(
  explicit: Option<&Path>,
  from_env: Option<String>,
  home: Option<&Path>
) -> Option<PathBuf> {
  if let Some(path) = explicit {
    return Some(path.to_path_buf());
  }

  if let Some(from_env) = from_env {
    return (from_env != "/dev/null")
      .then(|| PathBuf::from(from_env));
  }

  let candidate =
    home?.join(RC_FILE_NAME);
  candidate
    .exists()
    .then_some(candidate)
}

// Absolute paths survive `Path::join`, so this only has to expand `~/`.
fn home_relative(
  path: &Path
) -> PathBuf {
  match (
    path.strip_prefix("~"),
    dirs::home_dir()
  ) {
    | (Ok(rest), Some(home)) => {
      home.join(rest)
    }
    | _ => path.to_path_buf()
  }
}
