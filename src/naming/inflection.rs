//! Pluralization and singularization of table names.
//!
//! Uses the `inflector` crate with a table of irregular plurals that show
//! up in database schemas and that inflector gets wrong or leaves alone.

use inflector::Inflector;

static IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("mouse", "mice"),
    ("leaf", "leaves"),
    ("life", "lives"),
    ("half", "halves"),
    ("analysis", "analyses"),
    ("basis", "bases"),
    ("criterion", "criteria"),
    ("datum", "data"),
    ("medium", "media"),
    ("index", "indices"),
    ("matrix", "matrices"),
    ("vertex", "vertices"),
];

/// Plural form of `word`; already-plural irregulars pass through.
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }

    let lower = word.to_lowercase();
    for (singular, plural) in IRREGULAR_PLURALS {
        if lower == *singular || lower == *plural {
            return plural.to_string();
        }
    }

    word.to_plural()
}

/// Singular form of `word`; already-singular irregulars pass through.
pub fn singularize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }

    let lower = word.to_lowercase();
    for (singular, plural) in IRREGULAR_PLURALS {
        if lower == *singular || lower == *plural {
            return singular.to_string();
        }
    }

    word.to_singular()
}
