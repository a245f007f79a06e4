//! Coarse permission sliders over the fine-grained rule language.
//!
//! Users see eight categories, each set to [`SliderValue::Block`],
//! [`SliderValue::Ask`] or [`SliderValue::Allow`]. The [`codec`] turns a set
//! of slider values into `allow`/`deny`/`ask` patterns and back. Pattern
//! comparison goes through the [`matcher`].

pub mod codec;
pub mod matcher;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use strsim::levenshtein;

use crate::core::SettingsError;

pub use codec::{apply_sliders, are_slider_values_equal, rules_to_slider, sliders_to_rules};
pub use matcher::{MatchMode, match_mode, matches};

/// Maximum edit distance, as a percentage of the input length, for a
/// category name to be offered as a suggestion.
const SUGGESTION_THRESHOLD_PERCENT: usize = 50;

/// One of the eight permission groupings shown to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SliderCategory {
    /// Reading files
    FileRead,
    /// Editing existing files
    FileEdit,
    /// Creating new files
    FileCreate,
    /// Package manager and build tool invocations
    BuildCommands,
    /// Git subcommands
    GitCommands,
    /// Destructive shell commands
    Dangerous,
    /// Fetching well-known documentation sites and web search
    NetworkDocs,
    /// Fetching arbitrary URLs
    NetworkOther,
}

impl SliderCategory {
    /// All categories in display order.
    pub const ALL: [Self; 8] = [
        Self::FileRead,
        Self::FileEdit,
        Self::FileCreate,
        Self::BuildCommands,
        Self::GitCommands,
        Self::Dangerous,
        Self::NetworkDocs,
        Self::NetworkOther,
    ];

    /// camelCase name as used in JSON and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FileRead => "fileRead",
            Self::FileEdit => "fileEdit",
            Self::FileCreate => "fileCreate",
            Self::BuildCommands => "buildCommands",
            Self::GitCommands => "gitCommands",
            Self::Dangerous => "dangerous",
            Self::NetworkDocs => "networkDocs",
            Self::NetworkOther => "networkOther",
        }
    }

    /// Closest category name to `input`, if any is close enough.
    fn suggest(input: &str) -> Option<&'static str> {
        let lowered = input.to_lowercase();
        Self::ALL
            .iter()
            .map(|c| (c.as_str(), levenshtein(&lowered, &c.as_str().to_lowercase())))
            .filter(|(_, distance)| *distance <= input.len() * SUGGESTION_THRESHOLD_PERCENT / 100)
            .min_by_key(|(_, distance)| *distance)
            .map(|(name, _)| name)
    }
}

impl fmt::Display for SliderCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SliderCategory {
    type Err = SettingsError;

    /// Accepts the camelCase name, case-insensitively, or the kebab-case form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s.chars().filter(|c| *c != '-' && *c != '_').collect();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| SettingsError::UnknownSliderCategory {
                name: s.to_string(),
                suggestion: Self::suggest(s).map(str::to_string),
            })
    }
}

/// Tri-state slider position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SliderValue {
    /// Always refuse
    Block = 0,
    /// Prompt each time
    #[default]
    Ask = 1,
    /// Run without prompting
    Allow = 2,
}

impl SliderValue {
    /// Numeric position on the slider.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Slider position from its numeric form.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Block),
            1 => Some(Self::Ask),
            2 => Some(Self::Allow),
            _ => None,
        }
    }

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::Ask => "ask",
            Self::Allow => "allow",
        }
    }
}

impl fmt::Display for SliderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SliderValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "block" | "0" => Ok(Self::Block),
            "ask" | "1" => Ok(Self::Ask),
            "allow" | "2" => Ok(Self::Allow),
            other => Err(format!("invalid slider value '{other}' (expected block, ask or allow)")),
        }
    }
}

/// A value for every category. Missing categories read as `Ask`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SliderValues(BTreeMap<SliderCategory, SliderValue>);

impl Default for SliderValues {
    fn default() -> Self {
        Self::uniform(SliderValue::Ask)
    }
}

impl SliderValues {
    /// Every category set to the same value.
    #[must_use]
    pub fn uniform(value: SliderValue) -> Self {
        Self(SliderCategory::ALL.into_iter().map(|c| (c, value)).collect())
    }

    /// Value of a category.
    #[must_use]
    pub fn get(&self, category: SliderCategory) -> SliderValue {
        self.0.get(&category).copied().unwrap_or_default()
    }

    /// Set one category.
    pub fn set(&mut self, category: SliderCategory, value: SliderValue) {
        self.0.insert(category, value);
    }

    /// Builder form of [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, category: SliderCategory, value: SliderValue) -> Self {
        self.set(category, value);
        self
    }

    /// `(category, value)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (SliderCategory, SliderValue)> + '_ {
        SliderCategory::ALL.into_iter().map(|c| (c, self.get(c)))
    }
}

/// Parse a `category=value` assignment as given on the command line.
pub fn parse_assignment(input: &str) -> Result<(SliderCategory, SliderValue), SettingsError> {
    let (name, value) = input.split_once('=').ok_or_else(|| SettingsError::ConfigError {
        message: format!("expected <category>=<block|ask|allow>, got '{input}'"),
    })?;
    let category: SliderCategory = name.trim().parse()?;
    let value: SliderValue = value.parse().map_err(|message| SettingsError::ConfigError {
        message,
    })?;
    Ok((category, value))
}
