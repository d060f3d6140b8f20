//! Plugin descriptor
//!
//! What Embulk needs to know to load the plugin: the Java entry point, the
//! plugin category and the type name users write in their configs
//! (`in: {type: example}`).
//!
//! Raw settings are validated once, all at once: every problem is collected
//! into a single [`ValidationError`] so users fix them in one go.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Plugin category, a closed set defined by Embulk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Input,
    Output,
    Parser,
    Formatter,
    Decoder,
    Encoder,
    Filter,
    Guess,
    Executor,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Input,
        Category::Output,
        Category::Parser,
        Category::Formatter,
        Category::Decoder,
        Category::Encoder,
        Category::Filter,
        Category::Guess,
        Category::Executor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Input => "input",
            Category::Output => "output",
            Category::Parser => "parser",
            Category::Formatter => "formatter",
            Category::Decoder => "decoder",
            Category::Encoder => "encoder",
            Category::Filter => "filter",
            Category::Guess => "guess",
            Category::Executor => "executor",
        }
    }

    /// Returns the comma-separated list of accepted names
    pub fn names() -> String {
        Self::ALL
            .iter()
            .map(Category::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("'category' must be one of: {names}, got '{0}'", names = Category::names())]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// A single problem found in the raw plugin settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    MissingMainClass,
    MissingCategory,
    UnknownCategory(String),
    MissingType,

    /// A value that would end up in the manifest spans several lines
    LineBreak(&'static str),

    /// A type that is not usable as a single file name
    InvalidType(String),
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::MissingMainClass => {
                write!(f, "'main_class' must be available in [plugin].")
            }
            Violation::MissingCategory => write!(f, "'category' must be available in [plugin]."),
            Violation::UnknownCategory(value) => write!(
                f,
                "'category' must be one of: {} (got '{}').",
                Category::names(),
                value
            ),
            Violation::MissingType => write!(f, "'type' must be available in [plugin]."),
            Violation::LineBreak(field) => write!(f, "'{}' must not contain line breaks.", field),
            Violation::InvalidType(value) => write!(
                f,
                "'type' must be a plain name without path separators (got '{}').",
                value
            ),
        }
    }
}

/// Every violation found while validating plugin settings
#[derive(Debug, Error, PartialEq)]
#[error("[embulk-plugins] {}", joined(.violations))]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

fn joined(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Plugin settings as written by the user, not yet validated
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawDescriptor {
    pub main_class: Option<String>,
    pub category: Option<String>,

    #[serde(rename = "type")]
    pub plugin_type: Option<String>,
}

impl RawDescriptor {
    /// Validates the settings, collecting every violation
    pub fn validate(&self) -> Result<PluginDescriptor, ValidationError> {
        let mut violations = Vec::new();

        let main_class = non_empty(&self.main_class);
        match main_class {
            None => violations.push(Violation::MissingMainClass),
            Some(value) if has_line_break(value) => violations.push(Violation::LineBreak("main_class")),
            Some(_) => {}
        }

        let category = match non_empty(&self.category) {
            None => {
                violations.push(Violation::MissingCategory);
                None
            }
            Some(raw) => match raw.parse::<Category>() {
                Ok(category) => Some(category),
                Err(UnknownCategory(value)) => {
                    violations.push(Violation::UnknownCategory(value));
                    None
                }
            },
        };

        let plugin_type = non_empty(&self.plugin_type);
        match plugin_type {
            None => violations.push(Violation::MissingType),
            Some(value) if has_line_break(value) => violations.push(Violation::LineBreak("type")),
            Some(value) if !is_file_name(value) => {
                violations.push(Violation::InvalidType(value.to_string()))
            }
            Some(_) => {}
        }

        match (main_class, category, plugin_type) {
            (Some(main_class), Some(category), Some(plugin_type)) if violations.is_empty() => {
                Ok(PluginDescriptor {
                    main_class: main_class.to_string(),
                    category,
                    plugin_type: plugin_type.to_string(),
                })
            }
            _ => Err(ValidationError { violations }),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn has_line_break(value: &str) -> bool {
    value.contains(['\r', '\n'])
}

/// True for a single, non-special path component
///
/// The plugin type names the Ruby stub `lib/embulk/{category}/{type}.rb`.
pub(crate) fn is_file_name(value: &str) -> bool {
    !value.is_empty() && value != "." && value != ".." && !value.contains(['/', '\\', '\0'])
}

/// Validated plugin metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginDescriptor {
    main_class: String,
    category: Category,

    #[serde(rename = "type")]
    plugin_type: String,
}

impl PluginDescriptor {
    /// Builds a descriptor through the same validation as raw settings
    pub fn new(
        main_class: impl Into<String>,
        category: impl Into<String>,
        plugin_type: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        RawDescriptor {
            main_class: Some(main_class.into()),
            category: Some(category.into()),
            plugin_type: Some(plugin_type.into()),
        }
        .validate()
    }

    pub fn main_class(&self) -> &str {
        &self.main_class
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn plugin_type(&self) -> &str {
        &self.plugin_type
    }
}
