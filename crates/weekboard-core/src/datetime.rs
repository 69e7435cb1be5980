use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use chrono::{
  Duration,
  NaiveDate,
  Utc
};
use chrono_tz::Tz;
use regex::Regex;
use serde::Deserialize;

const TIMEZONE_CONFIG_FILE: &str =
  "weekboard-time.toml";
const TIMEZONE_ENV_VAR: &str =
  "WEEKBOARD_TIMEZONE";
const TIMEZONE_CONFIG_ENV_VAR: &str =
  "WEEKBOARD_TIME_CONFIG";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TimezoneFile {
  timezone: Option<String>,
  time:     TimezoneSection
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TimezoneSection {
  timezone: Option<String>
}

impl TimezoneFile {
  fn into_timezone(
    self
  ) -> Option<String> {
    self.timezone.or(self.time.timezone)
  }
}

/// Resolves the timezone that decides what "today" is.
///
/// Order: the `timezone` config key, `WEEKBOARD_TIMEZONE`, then
/// `weekboard-time.toml` (or the file named by `WEEKBOARD_TIME_CONFIG`).
/// Anything unparseable is logged and skipped; the fallback is UTC.
#[tracing::instrument]
pub fn resolve_timezone(
  configured: Option<&str>
) -> Tz {
  let inline_sources = [
    ("config", configured.map(str::to_string)),
    (
      TIMEZONE_ENV_VAR,
      std::env::var(TIMEZONE_ENV_VAR).ok()
    )
  ];
  for (source, raw) in inline_sources {
    if let Some(raw) = raw
      && let Some(tz) =
        parse_timezone(&raw, source)
    {
      return tz;
    }
  }

  let path = timezone_file_path();
  match read_timezone_file(&path) {
    | Ok(Some(raw)) => {
      let source = format!(
        "file:{}",
        path.display()
      );
      if let Some(tz) =
        parse_timezone(&raw, &source)
      {
        return tz;
      }
    }
    | Ok(None) => {}
    | Err(err) => {
      tracing::error!(
        error = %format!("{err:#}"),
        "ignoring timezone file"
      );
    }
  }

  tracing::debug!(
    "no timezone configured; using UTC"
  );
  chrono_tz::UTC
}

#[must_use]
pub fn today_in(tz: Tz) -> NaiveDate {
  Utc::now()
    .with_timezone(&tz)
    .date_naive()
}

fn timezone_file_path() -> PathBuf {
  std::env::var(TIMEZONE_CONFIG_ENV_VAR)
    .ok()
    .map(|raw| raw.trim().to_string())
    .filter(|raw| !raw.is_empty())
    .map(PathBuf::from)
    .unwrap_or_else(|| {
      PathBuf::from(TIMEZONE_CONFIG_FILE)
    })
}

/// Reads the timezone id out of a toml file. A missing file, or one
/// without a timezone entry, yields `Ok(None)`.
fn read_timezone_file(
  path: &Path
) -> anyhow::Result<Option<String>> {
  if !path.exists() {
    tracing::trace!(
      file = %path.display(),
      "timezone file not found"
    );
    return Ok(None);
  }

  let raw = fs::read_to_string(path)
    .with_context(|| {
      format!(
        "failed reading {}",
        path.display()
      )
    })?;
  let parsed: TimezoneFile =
    toml::from_str(&raw).with_context(
      || {
        format!(
          "failed parsing {}",
          path.display()
        )
      }
    )?;

  let timezone = parsed.into_timezone();
  if timezone.is_none() {
    tracing::warn!(
      file = %path.display(),
      "timezone file has no timezone entry"
    );
  }
  Ok(timezone)
}

fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "empty timezone value"
    );
    return None;
  }

  trimmed
    .parse::<Tz>()
    .inspect(|_| {
      tracing::info!(
        source,
        timezone = %trimmed,
        "using configured timezone"
      );
    })
    .inspect_err(|err| {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %err,
        "unknown timezone id"
      );
    })
    .ok()
}

/// Parses a reference date for week selection.
///
/// Accepts `today`, `yesterday`, `tomorrow`, ISO dates (`2025-03-14`) and
/// offsets from today such as `+3d`, `-2w`.
#[tracing::instrument(skip(today), fields(input = input))]
pub fn parse_week_of(
  input: &str,
  today: NaiveDate
) -> anyhow::Result<NaiveDate> {
  let token = input.trim();
  let lower =
    token.to_ascii_lowercase();

  match lower.as_str() {
    | "" => {
      return Err(anyhow!(
        "date expression cannot be \
         empty"
      ));
    }
    | "today" => return Ok(today),
    | "tomorrow" => {
      return offset_date(
        today,
        Duration::try_days(1)
      );
    }
    | "yesterday" => {
      return offset_date(
        today,
        Duration::try_days(-1)
      );
    }
    | _ => {}
  }

  let rel_re = Regex::new(r"^(?P<sign>[+-])(?P<num>\d+)(?P<unit>[dw])$")
        .map_err(|e| anyhow!("internal regex compile failure: {e}"))?;

  if let Some(caps) =
    rel_re.captures(&lower)
  {
    let negative = caps
      .name("sign")
      .is_some_and(|m| m.as_str() == "-");
    let num: i64 = caps
      .name("num")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!(
          "missing relative amount"
        )
      })?
      .parse()
      .context(
        "invalid relative number"
      )?;
    let num =
      if negative { -num } else { num };

    let delta = match caps
      .name("unit")
      .map(|m| m.as_str())
    {
      | Some("d") => {
        Duration::try_days(num)
      }
      | Some("w") => {
        Duration::try_weeks(num)
      }
      | other => {
        return Err(anyhow!(
          "unknown relative unit: \
           {other:?}"
        ));
      }
    };
    return offset_date(today, delta);
  }

  NaiveDate::parse_from_str(
    token, "%Y-%m-%d"
  )
  .with_context(|| {
    format!(
      "unrecognized date \
       expression: {token}"
    )
  })
}

fn offset_date(
  today: NaiveDate,
  delta: Option<Duration>
) -> anyhow::Result<NaiveDate> {
  delta
    .and_then(|delta| {
      today.checked_add_signed(delta)
    })
    .ok_or_else(|| {
      anyhow!(
        "date offset out of range"
      )
    })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ymd(
    year: i32,
    month: u32,
    day: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(
      year, month, day
    )
    .expect("valid date")
  }

  #[test]
  fn parses_named_days() {
    let today = ymd(2025, 3, 12);
    assert_eq!(
      parse_week_of("today", today)
        .expect("today"),
      today
    );
    assert_eq!(
      parse_week_of("Tomorrow", today)
        .expect("tomorrow"),
      ymd(2025, 3, 13)
    );
    assert_eq!(
      parse_week_of("yesterday", today)
        .expect("yesterday"),
      ymd(2025, 3, 11)
    );
  }

  #[test]
  fn parses_iso_date() {
    let today = ymd(2025, 3, 12);
    assert_eq!(
      parse_week_of(
        " 2025-03-17 ",
        today
      )
      .expect("iso date"),
      ymd(2025, 3, 17)
    );
  }

  #[test]
  fn parses_relative_offsets() {
    let today = ymd(2025, 3, 12);
    assert_eq!(
      parse_week_of("+2w", today)
        .expect("weeks"),
      ymd(2025, 3, 26)
    );
    assert_eq!(
      parse_week_of("-3d", today)
        .expect("days"),
      ymd(2025, 3, 9)
    );
  }

  #[test]
  fn rejects_garbage_and_overflow() {
    let today = ymd(2025, 3, 12);
    assert!(
      parse_week_of("someday", today)
        .is_err()
    );
    assert!(
      parse_week_of("", today).is_err()
    );
    assert!(
      parse_week_of(
        "+99999999999w",
        today
      )
      .is_err()
    );
    assert!(
      parse_week_of("2025-02-30", today)
        .is_err()
    );
  }

  #[test]
  fn configured_timezone_wins() {
    let tz = resolve_timezone(Some(
      "Asia/Tokyo"
    ));
    assert_eq!(tz, chrono_tz::Asia::Tokyo);
  }

  #[test]
  fn unknown_configured_timezone_is_skipped()
  {
    assert_eq!(
      parse_timezone("Mars/Olympus", "test"),
      None
    );
    assert_eq!(
      parse_timezone("  ", "test"),
      None
    );
  }

  #[test]
  fn timezone_file_supports_both_layouts()
  {
    let temp = tempfile::tempdir()
      .expect("tempdir");

    let flat =
      temp.path().join("flat.toml");
    fs::write(
      &flat,
      "timezone = \"Europe/Madrid\"\n"
    )
    .expect("write flat config");
    assert_eq!(
      read_timezone_file(&flat)
        .expect("read flat"),
      Some("Europe/Madrid".to_string())
    );

    let nested =
      temp.path().join("nested.toml");
    fs::write(
      &nested,
      "[time]\ntimezone = \"America/Lima\"\n"
    )
    .expect("write nested config");
    assert_eq!(
      read_timezone_file(&nested)
        .expect("read nested"),
      Some("America/Lima".to_string())
    );

    let empty =
      temp.path().join("empty.toml");
    fs::write(&empty, "")
      .expect("write empty config");
    assert_eq!(
      read_timezone_file(&empty)
        .expect("read empty"),
      None
    );

    let broken =
      temp.path().join("broken.toml");
    fs::write(&broken, "timezone = [")
      .expect("write broken config");
    assert!(
      read_timezone_file(&broken)
        .is_err()
    );

    assert_eq!(
      read_timezone_file(
        &temp.path().join("absent.toml")
      )
      .expect("missing file"),
      None
    );
  }
}
