//! Run configuration.
//!
//! A [`Config`] is an immutable value built once per run and passed down
//! explicitly. Sources, lowest precedence first: built-in defaults, an
//! optional YAML file, environment variables, CLI flags. The last two are
//! merged by clap and arrive here as [`ConfigOverrides`].
//!
//! ```yaml
//! # issue2hugo.yaml
//! categories: [life, tech, study]
//! publish_label: publish
//! bot_login: github-actions[bot]
//! output_root: content/posts
//! date_format: day
//! default_category: misc
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::assemble::DEFAULT_OUTPUT_ROOT;
use crate::error::Issue2HugoError;
use crate::frontmatter::DateFormat;
use crate::tags::CategoryVocabulary;

pub const DEFAULT_PUBLISH_LABEL: &str = "publish";
pub const DEFAULT_BOT_LOGIN: &str = "github-actions[bot]";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Ordered category vocabulary.
    pub categories: CategoryVocabulary,
    /// Only issues carrying this label are published.
    pub publish_label: String,
    /// Issues authored by this login are ignored.
    pub bot_login: String,
    pub output_root: PathBuf,
    pub date_format: DateFormat,
    /// Category used when neither tags nor labels name one.
    pub default_category: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            categories: CategoryVocabulary::default(),
            publish_label: DEFAULT_PUBLISH_LABEL.to_string(),
            bot_login: DEFAULT_BOT_LOGIN.to_string(),
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            date_format: DateFormat::Day,
            default_category: None,
        }
    }
}

/// Values supplied on the command line or through the environment.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub categories: Option<String>,
    pub publish_label: Option<String>,
    pub bot_login: Option<String>,
    pub output_root: Option<PathBuf>,
    pub date_format: Option<DateFormat>,
    pub default_category: Option<String>,
}

impl Config {
    /// Reads a YAML config file.
    pub fn from_yaml_file(path: &Path) -> Result<Self, Issue2HugoError> {
        let text = fs::read_to_string(path)?;
        serde_yaml::from_str(&text).map_err(|source| Issue2HugoError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the optional file, applies overrides, and validates the result.
    pub fn load(file: Option<&Path>, overrides: ConfigOverrides) -> Result<Self, Issue2HugoError> {
        let base = match file {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        let config = base.with_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(list) = overrides.categories {
            self.categories = CategoryVocabulary::from_csv(&list);
        }
        if let Some(label) = overrides.publish_label {
            self.publish_label = label;
        }
        if let Some(login) = overrides.bot_login {
            self.bot_login = login;
        }
        if let Some(root) = overrides.output_root {
            self.output_root = root;
        }
        if let Some(format) = overrides.date_format {
            self.date_format = format;
        }
        if let Some(category) = overrides.default_category {
            self.default_category = Some(category);
        }
        self
    }

    pub fn validate(&self) -> Result<(), Issue2HugoError> {
        if self.publish_label.trim().is_empty() {
            return Err(Issue2HugoError::InvalidConfig(
                "publish label must not be empty".to_string(),
            ));
        }
        if self.output_root.as_os_str().is_empty() {
            return Err(Issue2HugoError::InvalidConfig(
                "output root must not be empty".to_string(),
            ));
        }
        if self
            .default_category
            .as_deref()
            .is_some_and(|c| c.trim().is_empty())
        {
            return Err(Issue2HugoError::InvalidConfig(
                "default category must not be blank".to_string(),
            ));
        }
        Ok(())
    }
}
