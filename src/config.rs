//! Configuration loading for bibly.
//!
//! Configuration follows a precedence chain:
//! 1. Environment variables (highest priority)
//! 2. Project config (`.bibly/config.toml`)
//! 3. User config (`~/.bibly/config.toml`)
//! 4. Defaults (lowest priority)
//!
//! All configuration is optional. The scheduler runs with the classic
//! defaults (title not quizzed, 200 history entries) when no config exists.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BiblyError, Result};
use crate::history::{DEFAULT_ACCURACY_WINDOW, DEFAULT_CAPACITY};

/// Default number of entries shown by `history` and `stats`.
pub const DEFAULT_RECENT_COUNT: usize = 10;

/// Name of the per-project and per-user config directory.
pub const BIBLY_DIR: &str = ".bibly";

/// Main configuration struct for bibly.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Review session behavior.
    pub review: ReviewConfig,
    /// History ledger and statistics.
    pub history: HistoryConfig,
}

/// Review session behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReviewConfig {
    /// Quiz the title field as well as year, publisher, area and authors.
    pub quiz_title: bool,
    /// Start a due session automatically when a completed session finds
    /// new due items.
    pub auto_resume: bool,
}

/// History ledger and statistics configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of retained history entries.
    pub capacity: usize,
    /// Number of most recent entries used for the accuracy figure.
    pub accuracy_window: usize,
    /// Number of entries listed by `history` and `stats`.
    pub recent_count: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            accuracy_window: DEFAULT_ACCURACY_WINDOW,
            recent_count: DEFAULT_RECENT_COUNT,
        }
    }
}

impl Config {
    /// Load configuration with full precedence chain.
    ///
    /// Precedence (highest to lowest):
    /// 1. Environment variables
    /// 2. Project config (`.bibly/config.toml` in the project root)
    /// 3. User config (`~/.bibly/config.toml`)
    /// 4. Defaults
    pub fn load() -> Self {
        match env::current_dir() {
            Ok(cwd) => Self::load_from_cwd(&cwd),
            Err(_) => {
                let mut config = Config::default();
                if let Some(user_config) = Self::load_user_config() {
                    config = config.merge(user_config);
                }
                config.apply_env_overrides();
                config
            }
        }
    }

    /// Load configuration with a specific working directory.
    pub fn load_from_cwd(cwd: &Path) -> Self {
        let mut config = Config::default();

        if let Some(user_config) = Self::load_user_config() {
            config = config.merge(user_config);
        }

        if let Some(project_config) = Self::load_project_config(cwd) {
            config = config.merge(project_config);
        }

        config.apply_env_overrides();

        config
    }

    /// Load user config from `<bibly_home>/config.toml`.
    fn load_user_config() -> Option<Config> {
        let home = bibly_home()?;
        Self::load_optional(&home.join("config.toml"))
    }

    /// Load project config from `.bibly/config.toml` under the project root.
    fn load_project_config(cwd: &Path) -> Option<Config> {
        let path = find_project_root(cwd).join(BIBLY_DIR).join("config.toml");
        Self::load_optional(&path)
    }

    /// Load a config file that may legitimately be absent.
    ///
    /// A file that exists but does not parse is reported and skipped.
    fn load_optional(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        match Self::load_from_file(path) {
            Ok(config) => Some(config),
            Err(err) => {
                tracing::warn!("ignoring config {}: {}", path.display(), err);
                None
            }
        }
    }

    /// Load config from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|e| BiblyError::storage(path, e))?;
        toml::from_str(&content).map_err(|e| BiblyError::config(e.to_string()))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        // BIBLY_QUIZ_TITLE
        if let Ok(val) = env::var("BIBLY_QUIZ_TITLE") {
            match parse_bool(&val) {
                Some(b) => self.review.quiz_title = b,
                None => eprintln!(
                    "Warning: Invalid BIBLY_QUIZ_TITLE value '{}'. \
                    Expected true/false. Using '{}'.",
                    val, self.review.quiz_title
                ),
            }
        }

        // BIBLY_AUTO_RESUME
        if let Ok(val) = env::var("BIBLY_AUTO_RESUME") {
            match parse_bool(&val) {
                Some(b) => self.review.auto_resume = b,
                None => eprintln!(
                    "Warning: Invalid BIBLY_AUTO_RESUME value '{}'. \
                    Expected true/false. Using '{}'.",
                    val, self.review.auto_resume
                ),
            }
        }

        // BIBLY_HISTORY_CAPACITY
        if let Ok(val) = env::var("BIBLY_HISTORY_CAPACITY") {
            match parse_positive(&val) {
                Some(n) => self.history.capacity = n,
                None => eprintln!(
                    "Warning: Invalid BIBLY_HISTORY_CAPACITY value '{}'. \
                    Must be >= 1. Using '{}'.",
                    val, self.history.capacity
                ),
            }
        }

        // BIBLY_ACCURACY_WINDOW
        if let Ok(val) = env::var("BIBLY_ACCURACY_WINDOW") {
            match parse_positive(&val) {
                Some(n) => self.history.accuracy_window = n,
                None => eprintln!(
                    "Warning: Invalid BIBLY_ACCURACY_WINDOW value '{}'. \
                    Must be >= 1. Using '{}'.",
                    val, self.history.accuracy_window
                ),
            }
        }
    }

    /// Merge another config into this one, taking non-default values.
    ///
    /// A higher layer that explicitly sets a value equal to the default
    /// cannot override a lower layer's customization. Layers only need to
    /// specify what they change.
    fn merge(mut self, other: Config) -> Self {
        let default_review = ReviewConfig::default();
        if other.review.quiz_title != default_review.quiz_title {
            self.review.quiz_title = other.review.quiz_title;
        }
        if other.review.auto_resume != default_review.auto_resume {
            self.review.auto_resume = other.review.auto_resume;
        }

        let default_history = HistoryConfig::default();
        if other.history.capacity != default_history.capacity {
            self.history.capacity = other.history.capacity;
        }
        if other.history.accuracy_window != default_history.accuracy_window {
            self.history.accuracy_window = other.history.accuracy_window;
        }
        if other.history.recent_count != default_history.recent_count {
            self.history.recent_count = other.history.recent_count;
        }

        self.sanitized()
    }

    /// Clamp counts that must be positive.
    fn sanitized(mut self) -> Self {
        self.history.capacity = self.history.capacity.max(1);
        self.history.accuracy_window = self.history.accuracy_window.max(1);
        self
    }
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_positive(val: &str) -> Option<usize> {
    val.trim().parse::<usize>().ok().filter(|n| *n >= 1)
}

/// Get the bibly home directory.
///
/// Returns `$BIBLY_HOME` if set and non-empty, otherwise `~/.bibly`. Falls
/// back to a per-user temp location when no home directory is available.
pub fn bibly_home() -> Option<PathBuf> {
    if let Ok(home) = env::var("BIBLY_HOME") {
        if home.is_empty() {
            tracing::warn!("BIBLY_HOME is empty, using default");
        } else {
            let path = PathBuf::from(&home);
            if path.is_absolute() {
                return Some(path);
            }
            if let Ok(canonical) = path.canonicalize() {
                return Some(canonical);
            }
            tracing::warn!("BIBLY_HOME is relative and doesn't exist, using as-is");
            return Some(path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        return Some(home.join(BIBLY_DIR));
    }

    let fallback_path = fallback_bibly_home();
    tracing::warn!(
        "HOME not set, using fallback location: {}",
        fallback_path.display()
    );
    Some(fallback_path)
}

#[cfg(unix)]
fn fallback_bibly_home() -> PathBuf {
    use std::os::unix::fs::MetadataExt;
    let uid = std::fs::metadata("/").map(|m| m.uid()).unwrap_or(0);
    PathBuf::from(format!("/tmp/bibly-{}", uid))
}

#[cfg(not(unix))]
fn fallback_bibly_home() -> PathBuf {
    std::env::temp_dir().join("bibly")
}

/// Find the project root for a given working directory.
///
/// Walks up from `cwd` looking for a `.bibly/` directory and returns the
/// first ancestor that has one. Falls back to `cwd` itself.
pub fn find_project_root(cwd: &Path) -> PathBuf {
    for ancestor in cwd.ancestors() {
        if ancestor.join(BIBLY_DIR).is_dir() {
            return ancestor.to_path_buf();
        }
    }
    cwd.to_path_buf()
}

/// Get the crash log path, `<bibly_home>/crash.log`.
pub fn crash_log_path() -> Option<PathBuf> {
    bibly_home().map(|h| h.join("crash.log"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    const ENV_VARS: [&str; 4] = [
        "BIBLY_QUIZ_TITLE",
        "BIBLY_AUTO_RESUME",
        "BIBLY_HISTORY_CAPACITY",
        "BIBLY_ACCURACY_WINDOW",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            env::remove_var(var);
        }
    }

    fn write_project_config(root: &Path, content: &str) {
        let dir = root.join(BIBLY_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.toml"), content).unwrap();
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.review.quiz_title);
        assert!(!config.review.auto_resume);
        assert_eq!(config.history.capacity, 200);
        assert_eq!(config.history.accuracy_window, 20);
        assert_eq!(config.history.recent_count, 10);
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[review]
quiz_title = true

[history]
capacity = 50
"#,
        )
        .unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert!(config.review.quiz_title);
        assert!(!config.review.auto_resume);
        assert_eq!(config.history.capacity, 50);
        assert_eq!(config.history.accuracy_window, 20);
    }

    #[test]
    fn test_load_from_file_missing() {
        let result = Config::load_from_file(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(BiblyError::Storage { .. })));
    }

    #[test]
    fn test_load_from_file_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[review\nquiz_title = ").unwrap();

        let result = Config::load_from_file(&path);
        assert!(matches!(result, Err(BiblyError::Config { .. })));
    }

    #[test]
    #[serial]
    fn test_project_config_precedence() {
        clear_env();
        let home = TempDir::new().unwrap();
        env::set_var("BIBLY_HOME", home.path());
        fs::write(
            home.path().join("config.toml"),
            "[history]\ncapacity = 30\naccuracy_window = 5\n",
        )
        .unwrap();

        let project = TempDir::new().unwrap();
        write_project_config(project.path(), "[history]\ncapacity = 70\n");

        let config = Config::load_from_cwd(project.path());

        // Project overrides user, user overrides default
        assert_eq!(config.history.capacity, 70);
        assert_eq!(config.history.accuracy_window, 5);
        assert_eq!(config.history.recent_count, 10);

        env::remove_var("BIBLY_HOME");
    }

    #[test]
    #[serial]
    fn test_project_config_found_from_subdirectory() {
        clear_env();
        let home = TempDir::new().unwrap();
        env::set_var("BIBLY_HOME", home.path());

        let project = TempDir::new().unwrap();
        write_project_config(project.path(), "[review]\nquiz_title = true\n");
        let nested = project.path().join("notes").join("ch1");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_project_root(&nested), project.path());
        assert!(Config::load_from_cwd(&nested).review.quiz_title);

        env::remove_var("BIBLY_HOME");
    }

    #[test]
    #[serial]
    fn test_invalid_project_config_is_skipped() {
        clear_env();
        let home = TempDir::new().unwrap();
        env::set_var("BIBLY_HOME", home.path());

        let project = TempDir::new().unwrap();
        write_project_config(project.path(), "not = [valid");

        let config = Config::load_from_cwd(project.path());
        assert_eq!(config, Config::default());

        env::remove_var("BIBLY_HOME");
    }

    #[test]
    #[serial]
    fn test_env_var_precedence() {
        clear_env();
        let home = TempDir::new().unwrap();
        env::set_var("BIBLY_HOME", home.path());

        let project = TempDir::new().unwrap();
        write_project_config(project.path(), "[history]\ncapacity = 70\n");

        env::set_var("BIBLY_HISTORY_CAPACITY", "15");
        let config = Config::load_from_cwd(project.path());
        assert_eq!(config.history.capacity, 15);

        clear_env();
        env::remove_var("BIBLY_HOME");
    }

    #[test]
    #[serial]
    fn test_env_var_overrides() {
        clear_env();
        env::set_var("BIBLY_QUIZ_TITLE", "true");
        env::set_var("BIBLY_AUTO_RESUME", "yes");
        env::set_var("BIBLY_HISTORY_CAPACITY", "42");
        env::set_var("BIBLY_ACCURACY_WINDOW", "7");

        let mut config = Config::default();
        config.apply_env_overrides();

        assert!(config.review.quiz_title);
        assert!(config.review.auto_resume);
        assert_eq!(config.history.capacity, 42);
        assert_eq!(config.history.accuracy_window, 7);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_env_values_ignored() {
        clear_env();
        env::set_var("BIBLY_QUIZ_TITLE", "maybe");
        env::set_var("BIBLY_HISTORY_CAPACITY", "0");
        env::set_var("BIBLY_ACCURACY_WINDOW", "-3");

        let mut config = Config::default();
        config.apply_env_overrides();

        assert!(!config.review.quiz_title);
        assert_eq!(config.history.capacity, 200);
        assert_eq!(config.history.accuracy_window, 20);

        clear_env();
    }

    #[test]
    fn test_merge_configs() {
        let base = Config::default();
        let other = Config {
            review: ReviewConfig {
                quiz_title: true,
                auto_resume: false,
            },
            ..Config::default()
        };

        let merged = base.merge(other);
        assert!(merged.review.quiz_title);
        assert!(!merged.review.auto_resume);
        assert_eq!(merged.history, HistoryConfig::default());
    }

    #[test]
    fn test_merge_clamps_zero_counts() {
        let other = Config {
            history: HistoryConfig {
                capacity: 0,
                accuracy_window: 0,
                recent_count: 3,
            },
            ..Config::default()
        };
        let merged = Config::default().merge(other);
        assert_eq!(merged.history.capacity, 1);
        assert_eq!(merged.history.accuracy_window, 1);
        assert_eq!(merged.history.recent_count, 3);
    }

    #[test]
    #[serial]
    fn test_bibly_home_with_env() {
        let dir = TempDir::new().unwrap();
        env::set_var("BIBLY_HOME", dir.path());

        assert_eq!(bibly_home().unwrap(), dir.path());
        assert_eq!(crash_log_path().unwrap(), dir.path().join("crash.log"));

        env::remove_var("BIBLY_HOME");
    }

    #[test]
    #[serial]
    fn test_bibly_home_empty_env() {
        env::set_var("BIBLY_HOME", "");

        let home = bibly_home();
        assert!(home.is_some());
        assert!(home.unwrap().ends_with(BIBLY_DIR) || dirs::home_dir().is_none());

        env::remove_var("BIBLY_HOME");
    }

    #[test]
    fn test_find_project_root_falls_back_to_cwd() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a");
        fs::create_dir_all(&nested).unwrap();
        // No .bibly anywhere under the temp dir; an ancestor like $HOME may
        // have one, so only assert when the search stays inside.
        let root = find_project_root(&nested);
        assert!(root == nested || !root.starts_with(dir.path()));
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_bool(" TRUE "), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("2"), None);
        assert_eq!(parse_positive("5"), Some(5));
        assert_eq!(parse_positive("0"), None);
        assert_eq!(parse_positive("x"), None);
    }
}
