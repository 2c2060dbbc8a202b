use crate::Result;
use crate::interactive::DisplayOptions;
use crate::render::RenderStyle;
use camino::{Utf8Path, Utf8PathBuf};
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// Name of the configuration file looked up in the current directory
pub const DEFAULT_CONFIG_FILE: &str = "stagewatch.toml";

const MIN_REFRESH: Duration = Duration::from_millis(20);
const MAX_REFRESH: Duration = Duration::from_secs(5);
const MIN_BAR_WIDTH: usize = 10;
const MAX_BAR_WIDTH: usize = 200;
const MIN_CONFIG_WIDTH: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub style: RenderStyle,

    /// Time between redraws
    #[serde(default = "default_refresh", with = "humantime_serde")]
    pub refresh: Duration,

    #[serde(default = "default_bar_width")]
    pub bar_width: usize,

    /// Fixed line width; the terminal's width when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<usize>,

    #[serde(default = "default_true")]
    pub show_spinner: bool,

    #[serde(default = "default_true")]
    pub show_time: bool,

    #[serde(default = "default_true")]
    pub show_percentage: bool,

    #[serde(default)]
    pub clear_on_complete: bool,

    #[serde(default = "default_true")]
    pub interactive: bool,

    /// Capacity of the job's message ring buffer
    #[serde(default = "default_message_capacity")]
    pub message_capacity: usize,

    /// Messages and errors listed by the detailed style
    #[serde(default = "default_recent_messages")]
    pub recent_messages: usize,
}

const fn default_refresh() -> Duration {
    Duration::from_millis(200)
}

const fn default_bar_width() -> usize {
    30
}

const fn default_true() -> bool {
    true
}

const fn default_message_capacity() -> usize {
    50
}

const fn default_recent_messages() -> usize {
    5
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// Without an explicit path, `stagewatch.toml` in `base_dir` is used when present.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or holds out-of-range values
    pub fn load(base_dir: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading stagewatch configuration file '{path}'"))?;
            (path.clone(), text)
        } else {
            let path = base_dir.join(DEFAULT_CONFIG_FILE);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    log::debug!("no '{path}' found, using the default configuration");
                    return Ok(Self::default());
                }
                Err(e) => return Err(e).into_app_err_with(|| format!("reading stagewatch configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate()?;

        Ok(config)
    }

    /// Save the default configuration to a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    /// Check that every value is in range
    ///
    /// # Errors
    ///
    /// Returns an error naming the first out-of-range setting
    pub fn validate(&self) -> Result<()> {
        if !(MIN_REFRESH..=MAX_REFRESH).contains(&self.refresh) {
            return Err(app_err!(
                "refresh must be between {}ms and {}s, got {}",
                MIN_REFRESH.as_millis(),
                MAX_REFRESH.as_secs(),
                humantime::format_duration(self.refresh)
            ));
        }

        if !(MIN_BAR_WIDTH..=MAX_BAR_WIDTH).contains(&self.bar_width) {
            return Err(app_err!(
                "bar_width must be between {MIN_BAR_WIDTH} and {MAX_BAR_WIDTH}, got {}",
                self.bar_width
            ));
        }

        if let Some(width) = self.width
            && width < MIN_CONFIG_WIDTH
        {
            return Err(app_err!("width must be at least {MIN_CONFIG_WIDTH}, got {width}"));
        }

        if self.message_capacity == 0 {
            return Err(app_err!("message_capacity must be at least 1"));
        }

        Ok(())
    }

    /// The display settings this configuration describes
    #[must_use]
    pub fn display_options(&self) -> DisplayOptions {
        DisplayOptions {
            style: self.style,
            refresh: self.refresh,
            bar_width: self.bar_width,
            width: self.width,
            show_spinner: self.show_spinner,
            show_time: self.show_time,
            show_percentage: self.show_percentage,
            clear_on_complete: self.clear_on_complete,
            interactive: self.interactive,
            use_colors: false,
            recent_messages: self.recent_messages,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("default_config.toml should be valid TOML that deserializes to Config")
    }
}
