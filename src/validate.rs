//! Request input validation
//!
//! Handlers collect field-level problems into a [`Validator`] and reject the
//! request with a 422 payload keyed by field name when any check fails.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// Pattern for acceptable email addresses (HTML5 input[type=email] grammar)
pub static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email pattern must compile")
});

/// Accumulates validation failures keyed by field name
///
/// The first failure recorded for a field wins; later checks on the same
/// field do not overwrite it.
#[derive(Debug, Default)]
pub struct Validator {
    errors: HashMap<String, String>,
}

impl Validator {
    /// Create an empty validator
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for `field` unless `ok` holds
    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add_error(field, message);
        }
    }

    /// Record a failure for `field` directly
    pub fn add_error(&mut self, field: &str, message: &str) {
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| message.to_string());
    }

    /// True when no check has failed
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Consume the validator, yielding the collected field errors
    pub fn into_errors(self) -> HashMap<String, String> {
        self.errors
    }
}

/// True when every value in the slice is distinct
pub fn unique(values: &[String]) -> bool {
    let mut seen = std::collections::HashSet::new();
    values.iter().all(|v| seen.insert(v))
}
