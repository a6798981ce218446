// Configuration loading and parsing (game.toml, credentials.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use chrome_war_core::schedule::{ScheduleRule, ScheduleConfig};
use chrome_war_core::{ClockError, Phase};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueConfig,
    pub schedule: ScheduleRule,
    pub display: DisplayConfig,
    pub eligibility: EligibilityConfig,
    pub credentials: CredentialsConfig,
}

// ---------------------------------------------------------------------------
// game.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire game.toml file.
#[derive(Debug, Clone, Deserialize)]
struct GameFile {
    league: LeagueConfig,
    schedule: ScheduleConfig,
    display: DisplaySection,
    #[serde(default)]
    eligibility: EligibilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    pub name: String,
    #[serde(default)]
    pub tagline: String,
}

#[derive(Debug, Clone, Deserialize)]
struct DisplaySection {
    refresh_interval_ms: u64,
    /// Demo override, e.g. "FINAL_HOUR". Empty or absent means "follow the
    /// schedule".
    #[serde(default)]
    forced_phase: Option<String>,
}

/// Polling cadence and demo override for the status display.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayConfig {
    pub refresh_interval: Duration,
    pub forced_phase: Option<Phase>,
}

/// US states where entering the paid draft is not offered.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EligibilityConfig {
    #[serde(default)]
    pub blocked_states: Vec<String>,
}

// ---------------------------------------------------------------------------
// credentials.toml structs
// ---------------------------------------------------------------------------

/// The signed-in user for the console session, standing in for an external
/// identity provider.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CredentialsConfig {
    pub user_id: Option<String>,
    pub email: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

const MAX_REFRESH_MS: u64 = 60_000;

/// Load and validate configuration from `config/game.toml` and (optionally)
/// `config/credentials.toml`, relative to `base_dir`.
///
/// This does not copy defaults. Prefer `load_config()`.
pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- game.toml (required) ---
    let game_path = config_dir.join("game.toml");
    let game_text = read_file(&game_path)?;
    let game: GameFile = toml::from_str(&game_text).map_err(|e| ConfigError::ParseError {
        path: game_path.clone(),
        source: e,
    })?;

    // --- credentials.toml (optional) ---
    let credentials_path = config_dir.join("credentials.toml");
    let credentials = if credentials_path.exists() {
        let cred_text = read_file(&credentials_path)?;
        toml::from_str(&cred_text).map_err(|e| ConfigError::ParseError {
            path: credentials_path.clone(),
            source: e,
        })?
    } else {
        CredentialsConfig::default()
    };

    let schedule = ScheduleRule::from_config(game.schedule).map_err(schedule_error)?;
    let display = validate_display(game.display)?;

    let config = Config {
        league: game.league,
        schedule,
        display,
        eligibility: game.eligibility,
        credentials,
    };

    validate(&config)?;

    Ok(config)
}

/// Config files seeded from `defaults/` when absent. `credentials.toml` is
/// per-player and only ships as `defaults/credentials.toml.example`.
const SEEDED_FILES: [&str; 1] = ["game.toml"];

/// Seed `config/` from `defaults/` on first run. Returns the files written.
///
/// An existing file is never overwritten. Running without `defaults/` is fine
/// as long as `config/` already has everything it needs.
pub fn seed_config_dir(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let config_dir = base_dir.join("config");
    let defaults_dir = base_dir.join("defaults");

    let mut seeded = Vec::new();
    for name in SEEDED_FILES {
        let target = config_dir.join(name);
        if target.exists() {
            continue;
        }
        let source = defaults_dir.join(name);
        if !source.is_file() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "{} is missing and there is no {} to seed it from",
                    target.display(),
                    source.display()
                ),
            });
        }
        std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to create {}: {e}", config_dir.display()),
        })?;
        std::fs::copy(&source, &target).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to copy {} to {}: {e}", source.display(), target.display()),
        })?;
        seeded.push(target);
    }
    Ok(seeded)
}

/// Loads config relative to the current working directory, seeding
/// `config/game.toml` first if needed.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    seed_config_dir(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn schedule_error(err: ClockError) -> ConfigError {
    match err {
        ClockError::InvalidSchedule { field, message } => {
            ConfigError::ValidationError { field, message }
        }
        other => ConfigError::ValidationError {
            field: "schedule".into(),
            message: other.to_string(),
        },
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_display(raw: DisplaySection) -> Result<DisplayConfig, ConfigError> {
    if raw.refresh_interval_ms == 0 || raw.refresh_interval_ms > MAX_REFRESH_MS {
        return Err(ConfigError::ValidationError {
            field: "display.refresh_interval_ms".into(),
            message: format!(
                "must be between 1 and {MAX_REFRESH_MS}, got {}",
                raw.refresh_interval_ms
            ),
        });
    }

    let forced_phase = match raw.forced_phase.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(name) => Some(name.parse::<Phase>().map_err(|message| {
            ConfigError::ValidationError {
                field: "display.forced_phase".into(),
                message,
            }
        })?),
    };

    Ok(DisplayConfig {
        refresh_interval: Duration::from_millis(raw.refresh_interval_ms),
        forced_phase,
    })
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.league.name.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "league.name".into(),
            message: "must not be empty".into(),
        });
    }

    for state in &config.eligibility.blocked_states {
        if state.len() != 2 || !state.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ConfigError::ValidationError {
                field: "eligibility.blocked_states".into(),
                message: format!("`{state}` is not a two-letter upper-case state code"),
            });
        }
    }

    if let Some(user_id) = &config.credentials.user_id {
        if user_id.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: "credentials.user_id".into(),
                message: "must not be blank when present".into(),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Path to the chrome-war-app crate root (works whether `cargo test` runs
    /// from the crate or the workspace root).
    fn project_root() -> PathBuf {
        let cwd = std::env::current_dir().unwrap();
        if cwd.join("defaults").exists() {
            cwd
        } else if cwd.join("crates/chrome-war-app/defaults").exists() {
            cwd.join("crates/chrome-war-app")
        } else {
            panic!("Cannot locate defaults/ directory from CWD {:?}", cwd);
        }
    }

    /// Fresh temp dir with `config/game.toml` holding `game_toml`.
    fn temp_with_game(name: &str, game_toml: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::write(tmp.join("config/game.toml"), game_toml).unwrap();
        tmp
    }

    fn default_game_toml() -> String {
        fs::read_to_string(project_root().join("defaults/game.toml")).unwrap()
    }

    fn expect_validation_field(err: ConfigError, expected: &str) {
        match &err {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, expected),
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn load_valid_config_from_project_files() {
        let tmp = temp_with_game("chrome_war_config_defaults", &default_game_toml());
        let config = load_config_from(&tmp).expect("should load valid config");

        assert_eq!(config.league.name, "Chrome War");
        assert_eq!(config.league.tagline, "Battle Royale for Stock Traders");
        assert_eq!(config.schedule, ScheduleRule::chrome_war());
        assert_eq!(config.display.refresh_interval, Duration::from_secs(1));
        assert_eq!(config.display.forced_phase, None);
        assert_eq!(
            config.eligibility.blocked_states,
            vec!["NY", "NJ", "MD", "VT", "SC", "HI", "UT"]
        );
        assert!(config.credentials.user_id.is_none());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn credentials_toml_with_user() {
        let tmp = temp_with_game("chrome_war_config_creds", &default_game_toml());
        fs::write(
            tmp.join("config/credentials.toml"),
            "user_id = \"user-42\"\nemail = \"trader@example.com\"\n",
        )
        .unwrap();

        let config = load_config_from(&tmp).expect("should load with credentials.toml");
        assert_eq!(config.credentials.user_id.as_deref(), Some("user-42"));
        assert_eq!(config.credentials.email.as_deref(), Some("trader@example.com"));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn blank_user_id_is_rejected() {
        let tmp = temp_with_game("chrome_war_config_blank_user", &default_game_toml());
        fs::write(tmp.join("config/credentials.toml"), "user_id = \"  \"\n").unwrap();

        expect_validation_field(load_config_from(&tmp).unwrap_err(), "credentials.user_id");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn forced_phase_is_parsed() {
        let modified = default_game_toml().replace("forced_phase = \"\"", "forced_phase = \"final-hour\"");
        let tmp = temp_with_game("chrome_war_config_forced", &modified);

        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.display.forced_phase, Some(Phase::FinalHour));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_unknown_forced_phase() {
        let modified = default_game_toml().replace("forced_phase = \"\"", "forced_phase = \"overtime\"");
        let tmp = temp_with_game("chrome_war_config_bad_forced", &modified);

        expect_validation_field(load_config_from(&tmp).unwrap_err(), "display.forced_phase");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_refresh_interval() {
        let modified = default_game_toml().replace("refresh_interval_ms = 1000", "refresh_interval_ms = 0");
        let tmp = temp_with_game("chrome_war_config_zero_refresh", &modified);

        expect_validation_field(load_config_from(&tmp).unwrap_err(), "display.refresh_interval_ms");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_out_of_order_schedule() {
        let modified = default_game_toml().replace(
            "final_hour_start = \"Fri 15:00\"",
            "final_hour_start = \"Fri 17:00\"",
        );
        let tmp = temp_with_game("chrome_war_config_bad_schedule", &modified);

        expect_validation_field(load_config_from(&tmp).unwrap_err(), "schedule.week_end");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_unknown_timezone() {
        let modified = default_game_toml().replace("America/New_York", "America/Atlantis");
        let tmp = temp_with_game("chrome_war_config_bad_tz", &modified);

        expect_validation_field(load_config_from(&tmp).unwrap_err(), "schedule.timezone");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_lowercase_blocked_state() {
        let modified = default_game_toml().replace("\"NY\"", "\"ny\"");
        let tmp = temp_with_game("chrome_war_config_bad_state", &modified);

        expect_validation_field(load_config_from(&tmp).unwrap_err(), "eligibility.blocked_states");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parse_error_for_malformed_weekly_time() {
        let modified = default_game_toml().replace("\"Mon 09:30\"", "\"Monday morning\"");
        let tmp = temp_with_game("chrome_war_config_bad_time", &modified);

        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ParseError { path, .. } => assert!(path.ends_with("game.toml")),
            other => panic!("expected ParseError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn file_not_found_for_missing_game_toml() {
        let tmp = std::env::temp_dir().join("chrome_war_config_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();

        match load_config_from(&tmp).unwrap_err() {
            ConfigError::FileNotFound { path } => assert!(path.ends_with("game.toml")),
            other => panic!("expected FileNotFound, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }

    /// Temp dir holding only `defaults/`, as on a fresh checkout.
    fn fresh_checkout(name: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&tmp);
        let defaults_dir = tmp.join("defaults");
        fs::create_dir_all(&defaults_dir).unwrap();
        fs::write(defaults_dir.join("game.toml"), default_game_toml()).unwrap();
        fs::write(
            defaults_dir.join("credentials.toml.example"),
            "user_id = \"...\"\n",
        )
        .unwrap();
        tmp
    }

    #[test]
    fn first_run_seeds_game_toml_only() {
        let tmp = fresh_checkout("chrome_war_config_first_run");

        let seeded = seed_config_dir(&tmp).unwrap();
        assert_eq!(seeded, vec![tmp.join("config/game.toml")]);
        assert!(!tmp.join("config/credentials.toml").exists());
        assert!(!tmp.join("config/credentials.toml.example").exists());

        // The seeded file loads, signed out.
        let config = load_config_from(&tmp).unwrap();
        assert!(config.credentials.user_id.is_none());

        assert!(seed_config_dir(&tmp).unwrap().is_empty());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn edited_game_toml_is_kept() {
        let tmp = fresh_checkout("chrome_war_config_edited");
        fs::create_dir_all(tmp.join("config")).unwrap();
        let edited = default_game_toml().replace("\"Chrome War\"", "\"Office League\"");
        fs::write(tmp.join("config/game.toml"), &edited).unwrap();

        assert!(seed_config_dir(&tmp).unwrap().is_empty());
        assert_eq!(load_config_from(&tmp).unwrap().league.name, "Office League");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn config_without_defaults_dir_is_fine() {
        let tmp = temp_with_game("chrome_war_config_no_defaults", &default_game_toml());
        assert!(seed_config_dir(&tmp).unwrap().is_empty());
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn nothing_to_seed_from_is_an_error() {
        let tmp = std::env::temp_dir().join("chrome_war_config_nothing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        match seed_config_dir(&tmp).unwrap_err() {
            ConfigError::DefaultsCopyError { message } => {
                assert!(message.contains("game.toml is missing"));
            }
            other => panic!("expected DefaultsCopyError, got: {other}"),
        }

        let _ = fs::remove_dir_all(&tmp);
    }
}
