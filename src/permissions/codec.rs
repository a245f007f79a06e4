//! Slider ↔ rule conversion.
//!
//! Each `(category, value)` cell of a fixed table contributes patterns to
//! `allow`, `deny` and `ask`. The forward direction concatenates the cells
//! for all eight categories. The reverse direction is lossy: a category is
//! summarised by looking for its key patterns in `deny`, then `allow`, then
//! `ask`, defaulting to `Ask` when none of them is present. A rule that one
//! category's cells write and another's never do only counts for the first,
//! so `WebFetch` and `WebFetch(domain:docs.rs)` are read apart.
//!
//! Some cells are deliberately asymmetric. `gitCommands = Ask` auto-allows
//! read-only subcommands and asks for the rest, and every `dangerous` cell
//! denies `Bash(DROP:*)`, including `Allow`.

use super::matcher::matches_any;
use super::{SliderCategory, SliderValue, SliderValues};
use crate::settings::{PermissionsConfig, dedup_in_place};

/// Patterns one table cell adds to each list.
#[derive(Debug, Clone, Copy, Default)]
struct CellRules {
    allow: &'static [&'static str],
    deny: &'static [&'static str],
    ask: &'static [&'static str],
}

impl CellRules {
    const fn allow(patterns: &'static [&'static str]) -> Self {
        Self {
            allow: patterns,
            deny: &[],
            ask: &[],
        }
    }

    const fn deny(patterns: &'static [&'static str]) -> Self {
        Self {
            allow: &[],
            deny: patterns,
            ask: &[],
        }
    }

    const fn ask(patterns: &'static [&'static str]) -> Self {
        Self {
            allow: &[],
            deny: &[],
            ask: patterns,
        }
    }

    /// Same patterns in the list chosen by `value`.
    const fn by_value(value: SliderValue, patterns: &'static [&'static str]) -> Self {
        match value {
            SliderValue::Block => Self::deny(patterns),
            SliderValue::Ask => Self::ask(patterns),
            SliderValue::Allow => Self::allow(patterns),
        }
    }
}

const FILE_READ: &[&str] = &["Read"];
const FILE_EDIT: &[&str] = &["Edit", "MultiEdit", "NotebookEdit"];
const FILE_CREATE: &[&str] = &["Write"];
const BUILD_COMMANDS: &[&str] = &[
    "Bash(npm run:*)",
    "Bash(yarn:*)",
    "Bash(pnpm:*)",
    "Bash(cargo build:*)",
    "Bash(make:*)",
];
const GIT_SAFE: &[&str] =
    &["Bash(git status:*)", "Bash(git diff:*)", "Bash(git add:*)", "Bash(git log:*)"];
const GIT_RISKY: &[&str] = &["Bash(git commit:*)", "Bash(git push:*)", "Bash(git reset:*)"];
const GIT_ALL: &[&str] = &[
    "Bash(git status:*)",
    "Bash(git diff:*)",
    "Bash(git add:*)",
    "Bash(git log:*)",
    "Bash(git commit:*)",
    "Bash(git push:*)",
    "Bash(git reset:*)",
];
const DANGEROUS: &[&str] = &["Bash(rm -rf:*)", "Bash(sudo:*)", "Bash(chmod 777:*)"];
const DANGEROUS_ALL: &[&str] =
    &["Bash(rm -rf:*)", "Bash(sudo:*)", "Bash(chmod 777:*)", "Bash(DROP:*)"];
const ALWAYS_DENIED: &[&str] = &["Bash(DROP:*)"];
const NETWORK_DOCS: &[&str] = &[
    "WebFetch(domain:docs.rs)",
    "WebFetch(domain:developer.mozilla.org)",
    "WebFetch(domain:docs.python.org)",
    "WebSearch",
];
const NETWORK_OTHER: &[&str] = &["WebFetch"];

/// The table cell for a category at a value.
const fn cell(category: SliderCategory, value: SliderValue) -> CellRules {
    match (category, value) {
        (SliderCategory::FileRead, v) => CellRules::by_value(v, FILE_READ),
        (SliderCategory::FileEdit, v) => CellRules::by_value(v, FILE_EDIT),
        (SliderCategory::FileCreate, v) => CellRules::by_value(v, FILE_CREATE),
        (SliderCategory::BuildCommands, v) => CellRules::by_value(v, BUILD_COMMANDS),
        (SliderCategory::GitCommands, SliderValue::Block) => CellRules::deny(GIT_ALL),
        (SliderCategory::GitCommands, SliderValue::Ask) => CellRules {
            allow: GIT_SAFE,
            deny: &[],
            ask: GIT_RISKY,
        },
        (SliderCategory::GitCommands, SliderValue::Allow) => CellRules::allow(GIT_ALL),
        (SliderCategory::Dangerous, SliderValue::Block) => CellRules::deny(DANGEROUS_ALL),
        (SliderCategory::Dangerous, SliderValue::Ask) => CellRules {
            allow: &[],
            deny: ALWAYS_DENIED,
            ask: DANGEROUS,
        },
        (SliderCategory::Dangerous, SliderValue::Allow) => CellRules {
            allow: DANGEROUS,
            deny: ALWAYS_DENIED,
            ask: &[],
        },
        (SliderCategory::NetworkDocs, v) => CellRules::by_value(v, NETWORK_DOCS),
        (SliderCategory::NetworkOther, v) => CellRules::by_value(v, NETWORK_OTHER),
    }
}

/// Patterns whose list placement decides a category's reverse value.
const fn key_patterns(category: SliderCategory) -> &'static [&'static str] {
    match category {
        SliderCategory::FileRead => FILE_READ,
        SliderCategory::FileEdit => &["Edit"],
        SliderCategory::FileCreate => FILE_CREATE,
        SliderCategory::BuildCommands => BUILD_COMMANDS,
        SliderCategory::GitCommands => GIT_RISKY,
        SliderCategory::Dangerous => &["Bash(rm -rf:*)", "Bash(sudo:*)"],
        SliderCategory::NetworkDocs => NETWORK_DOCS,
        SliderCategory::NetworkOther => NETWORK_OTHER,
    }
}

/// Whether any cell of `category` writes `pattern` verbatim.
fn writes_pattern(category: SliderCategory, pattern: &str) -> bool {
    [SliderValue::Block, SliderValue::Ask, SliderValue::Allow].into_iter().any(|value| {
        let rules = cell(category, value);
        rules.allow.iter().chain(rules.deny).chain(rules.ask).any(|p| *p == pattern)
    })
}

/// Whether a pattern appears verbatim in any table cell.
fn is_table_pattern(pattern: &str) -> bool {
    SliderCategory::ALL.into_iter().any(|category| writes_pattern(category, pattern))
}

/// Generated by another category's cells and never by this one's.
fn owned_elsewhere(pattern: &str, category: SliderCategory) -> bool {
    !writes_pattern(category, pattern)
        && SliderCategory::ALL
            .into_iter()
            .any(|other| other != category && writes_pattern(other, pattern))
}

/// Build permission lists from slider values.
///
/// Lists are de-duplicated and empty lists are left empty, so they are
/// omitted when serialized.
#[must_use]
pub fn sliders_to_rules(values: &SliderValues) -> PermissionsConfig {
    let mut config = PermissionsConfig::default();

    for (category, value) in values.iter() {
        let rules = cell(category, value);
        config.allow.extend(rules.allow.iter().map(|p| (*p).to_string()));
        config.deny.extend(rules.deny.iter().map(|p| (*p).to_string()));
        config.ask.extend(rules.ask.iter().map(|p| (*p).to_string()));
    }

    config.dedup();
    config
}

/// Slider position of one category in a permission block.
#[must_use]
pub fn category_value(config: &PermissionsConfig, category: SliderCategory) -> SliderValue {
    let keys = key_patterns(category);
    if matches_any(relevant(&config.deny, category), keys) {
        SliderValue::Block
    } else if matches_any(relevant(&config.allow, category), keys) {
        SliderValue::Allow
    } else {
        // Present in `ask` or absent everywhere
        SliderValue::Ask
    }
}

/// Rules that may decide `category`'s value.
fn relevant(rules: &[String], category: SliderCategory) -> impl Iterator<Item = &String> {
    rules.iter().filter(move |rule| !owned_elsewhere(rule, category))
}

/// Summarise a permission block as slider values.
///
/// `None` reads as all `Ask`. Patterns that belong to no category are
/// ignored, so the conversion is lossy.
#[must_use]
pub fn rules_to_slider(config: Option<&PermissionsConfig>) -> SliderValues {
    let Some(config) = config else {
        return SliderValues::default();
    };

    let mut values = SliderValues::default();
    for category in SliderCategory::ALL {
        values.set(category, category_value(config, category));
    }
    values
}

/// Rewrite a permission block from slider values.
///
/// Rules that appear in the slider table are replaced. Hand-written rules,
/// `additionalDirectories`, `defaultMode` and unknown keys are kept.
#[must_use]
pub fn apply_sliders(existing: Option<&PermissionsConfig>, values: &SliderValues) -> PermissionsConfig {
    let generated = sliders_to_rules(values);
    let mut result = existing.cloned().unwrap_or_default();

    for (key, kept, fresh) in [
        ("allow", &mut result.allow, generated.allow),
        ("deny", &mut result.deny, generated.deny),
        ("ask", &mut result.ask, generated.ask),
    ] {
        kept.retain(|pattern| !is_table_pattern(pattern));
        kept.extend(fresh);
        dedup_in_place(kept);
        if !kept.is_empty() {
            // A malformed list of the same name is superseded
            result.other.remove(key);
        }
    }

    result
}

/// Whether two sets of slider values agree on every category.
#[must_use]
pub fn are_slider_values_equal(a: &SliderValues, b: &SliderValues) -> bool {
    SliderCategory::ALL.into_iter().all(|category| a.get(category) == b.get(category))
}
