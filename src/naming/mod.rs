//! Identifier normalization.
//!
//! Every identifier read from a row (table, column, foreign-key and
//! referenced names) passes through a [`NameNormalizer`] before it is used,
//! so naming conventions can be translated without the graph builder
//! knowing about any SQL dialect.

mod inflection;

pub use inflection::{pluralize, singularize};

use inflector::Inflector;
use serde::{Deserialize, Serialize};

/// Maps a raw identifier to the name used in the graph.
pub trait NameNormalizer {
    fn normalize(&self, raw: &str) -> String;
}

impl<F> NameNormalizer for F
where
    F: Fn(&str) -> String,
{
    fn normalize(&self, raw: &str) -> String {
        self(raw)
    }
}

/// Built-in naming conventions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingConvention {
    /// Use identifiers exactly as reported.
    #[default]
    Preserve,
    Lower,
    Upper,
    /// `OrderLine` → `order_line`
    Snake,
    /// `order_lines` → `order_line`
    Singular,
    /// `order_line` → `order_lines`
    Plural,
}

impl NameNormalizer for NamingConvention {
    fn normalize(&self, raw: &str) -> String {
        match self {
            NamingConvention::Preserve => raw.to_string(),
            NamingConvention::Lower => raw.to_lowercase(),
            NamingConvention::Upper => raw.to_uppercase(),
            NamingConvention::Snake => raw.to_snake_case(),
            NamingConvention::Singular => singularize(raw),
            NamingConvention::Plural => pluralize(raw),
        }
    }
}

impl std::str::FromStr for NamingConvention {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "preserve" | "identity" => Ok(NamingConvention::Preserve),
            "lower" => Ok(NamingConvention::Lower),
            "upper" => Ok(NamingConvention::Upper),
            "snake" => Ok(NamingConvention::Snake),
            "singular" => Ok(NamingConvention::Singular),
            "plural" => Ok(NamingConvention::Plural),
            other => Err(format!("unknown naming convention: {other}")),
        }
    }
}
