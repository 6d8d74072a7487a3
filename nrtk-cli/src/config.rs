//! Runtime settings resolved from the environment and command line.
//!
//! | Setting        | Environment       | Flag            | Precedence | Default |
//! |----------------|-------------------|-----------------|------------|---------|
//! | API URL        | `NRTK_API_URL`    | –               | –          | required |
//! | API token      | `NRTK_API_TOKEN`  | –               | –          | required |
//! | log level      | `LOGLEVEL`        | `-l/--loglevel` | env wins   | `DEBUG` |
//! | interval (s)   | `INFINITY`        | `-i/--infinity` | env wins   | `0`     |
//! | base directory | `NRTK_BASE_DIR`   | `--base-dir`    | flag wins  | cwd     |
//!
//! Empty environment values count as unset. Intervals of zero or less
//! disable interval mode.

use std::fmt;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use tracing::Level;

use crate::Cli;

pub const API_URL_VAR: &str = "NRTK_API_URL";
pub const API_TOKEN_VAR: &str = "NRTK_API_TOKEN";
pub const LOGLEVEL_VAR: &str = "LOGLEVEL";
pub const INFINITY_VAR: &str = "INFINITY";
pub const BASE_DIR_VAR: &str = "NRTK_BASE_DIR";

#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub api_token: String,
    pub level: Level,
    pub interval_secs: u64,
    pub base_dir: PathBuf,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_url", &self.api_url)
            .field("api_token", &"<redacted>")
            .field("level", &self.level)
            .field("interval_secs", &self.interval_secs)
            .field("base_dir", &self.base_dir)
            .finish()
    }
}

impl Settings {
    /// Resolve settings from `cli` and the variables visible through `env`.
    pub fn resolve(cli: &Cli, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let api_url = var(API_URL_VAR).ok_or_else(|| missing(API_URL_VAR))?;
        let api_token = var(API_TOKEN_VAR).ok_or_else(|| missing(API_TOKEN_VAR))?;

        let level = var(LOGLEVEL_VAR)
            .or_else(|| cli.loglevel.clone())
            .map(|raw| parse_level(&raw))
            .unwrap_or(Level::DEBUG);

        let interval = match var(INFINITY_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .with_context(|| format!("{INFINITY_VAR} must be a number of seconds, got {raw:?}"))?,
            None => cli.infinity,
        };
        let interval_secs = u64::try_from(interval).unwrap_or(0);

        let base_dir = match cli.base_dir.clone().or_else(|| var(BASE_DIR_VAR).map(PathBuf::from)) {
            Some(dir) => dir,
            None => std::env::current_dir().context("unable to determine current directory")?,
        };

        Ok(Settings {
            api_url,
            api_token,
            level,
            interval_secs,
            base_dir,
        })
    }
}

fn missing(var: &str) -> anyhow::Error {
    anyhow!("{var} is not set; both {API_URL_VAR} and {API_TOKEN_VAR} are required")
}

/// Map a level name or number (`DEBUG`, `warning`, `20`, ...) to a tracing
/// level. Unknown names fall back to debug.
pub fn parse_level(raw: &str) -> Level {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<u32>() {
        return match n {
            0..=9 => Level::TRACE,
            10..=19 => Level::DEBUG,
            20..=29 => Level::INFO,
            30..=39 => Level::WARN,
            _ => Level::ERROR,
        };
    }
    match raw.to_ascii_uppercase().as_str() {
        "TRACE" => Level::TRACE,
        "DEBUG" => Level::DEBUG,
        "INFO" => Level::INFO,
        "WARNING" | "WARN" => Level::WARN,
        "ERROR" | "CRITICAL" | "FATAL" => Level::ERROR,
        _ => Level::DEBUG,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("NRTK_API_URL", "https://api.example/content"),
        ("NRTK_API_TOKEN", "t0ken"),
    ];

    fn cli() -> Cli {
        Cli {
            base_dir: Some(PathBuf::from("/srv/mirror")),
            ..Cli::default()
        }
    }

    #[test]
    fn defaults_with_required_vars() {
        let settings = Settings::resolve(&cli(), env_of(&REQUIRED)).unwrap();
        assert_eq!(settings.api_url, "https://api.example/content");
        assert_eq!(settings.api_token, "t0ken");
        assert_eq!(settings.level, Level::DEBUG);
        assert_eq!(settings.interval_secs, 0);
        assert_eq!(settings.base_dir, PathBuf::from("/srv/mirror"));
    }

    #[rstest]
    #[case::no_url(&[("NRTK_API_TOKEN", "t")], "NRTK_API_URL")]
    #[case::no_token(&[("NRTK_API_URL", "https://x")], "NRTK_API_TOKEN")]
    #[case::empty_url(&[("NRTK_API_URL", ""), ("NRTK_API_TOKEN", "t")], "NRTK_API_URL")]
    fn missing_required_var_is_an_error(#[case] pairs: &[(&str, &str)], #[case] named: &str) {
        let err = Settings::resolve(&cli(), env_of(pairs)).unwrap_err();
        assert!(err.to_string().contains(named), "{err}");
    }

    #[test]
    fn env_wins_over_flags_for_level_and_interval() {
        let cli = Cli {
            loglevel: Some("error".into()),
            infinity: 120,
            ..cli()
        };
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([("LOGLEVEL", "INFO"), ("INFINITY", "300")]);
        let settings = Settings::resolve(&cli, env_of(&pairs)).unwrap();
        assert_eq!(settings.level, Level::INFO);
        assert_eq!(settings.interval_secs, 300);
    }

    #[test]
    fn flags_apply_when_env_is_unset() {
        let cli = Cli {
            loglevel: Some("warning".into()),
            infinity: 90,
            ..cli()
        };
        let settings = Settings::resolve(&cli, env_of(&REQUIRED)).unwrap();
        assert_eq!(settings.level, Level::WARN);
        assert_eq!(settings.interval_secs, 90);
    }

    #[test]
    fn base_dir_flag_wins_over_env() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("NRTK_BASE_DIR", "/from/env"));
        let settings = Settings::resolve(&cli(), env_of(&pairs)).unwrap();
        assert_eq!(settings.base_dir, PathBuf::from("/srv/mirror"));

        let settings = Settings::resolve(&Cli::default(), env_of(&pairs)).unwrap();
        assert_eq!(settings.base_dir, PathBuf::from("/from/env"));
    }

    #[rstest]
    #[case::negative_env(Some("-5"), 0, 0)]
    #[case::zero_env(Some("0"), 600, 0)]
    #[case::negative_flag(None, -30, 0)]
    #[case::positive_flag(None, 120, 120)]
    fn non_positive_interval_disables_interval_mode(
        #[case] env_value: Option<&str>,
        #[case] flag: i64,
        #[case] expected: u64,
    ) {
        let cli = Cli {
            infinity: flag,
            ..cli()
        };
        let mut pairs = REQUIRED.to_vec();
        if let Some(v) = env_value {
            pairs.push(("INFINITY", v));
        }
        let settings = Settings::resolve(&cli, env_of(&pairs)).unwrap();
        assert_eq!(settings.interval_secs, expected);
    }

    #[test]
    fn negative_interval_flag_parses() {
        use clap::Parser;

        let cli = Cli::try_parse_from(["nrtk", "-i", "-5"]).expect("negative interval accepted");
        assert_eq!(cli.infinity, -5);
    }

    #[test]
    fn non_numeric_interval_is_an_error() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("INFINITY", "hourly"));
        let err = Settings::resolve(&cli(), env_of(&pairs)).unwrap_err();
        assert!(err.to_string().contains("INFINITY"));
    }

    #[test]
    fn debug_output_redacts_token() {
        let settings = Settings::resolve(&cli(), env_of(&REQUIRED)).unwrap();
        assert!(!format!("{settings:?}").contains("t0ken"));
    }

    #[rstest]
    #[case("DEBUG", Level::DEBUG)]
    #[case("info", Level::INFO)]
    #[case("Warning", Level::WARN)]
    #[case("WARN", Level::WARN)]
    #[case("ERROR", Level::ERROR)]
    #[case("CRITICAL", Level::ERROR)]
    #[case("5", Level::TRACE)]
    #[case("10", Level::DEBUG)]
    #[case("20", Level::INFO)]
    #[case("30", Level::WARN)]
    #[case("50", Level::ERROR)]
    #[case("verbose", Level::DEBUG)]
    fn level_names_and_numbers(#[case] raw: &str, #[case] expected: Level) {
        assert_eq!(parse_level(raw), expected);
    }
}
