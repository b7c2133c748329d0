//! `{{variable}}` placeholders in prompt bodies.
//!
//! A prompt body may reference the same variable several times. The picker
//! asks once per distinct name ([`unique_variables`]) and [`substitute`]
//! fills every occurrence from a name-keyed map.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::TemplateError;

pub type Bindings = HashMap<String, String>;

static VARIABLE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(.*?)\}\}").expect("variable pattern is valid"));

/// Every placeholder name in left-to-right order, repeats included.
pub fn parse_variables(template: &str) -> Vec<String> {
    VARIABLE_PATTERN
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Distinct placeholder names in order of first appearance.
pub fn unique_variables(template: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    parse_variables(template)
        .into_iter()
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

pub fn has_variables(template: &str) -> bool {
    VARIABLE_PATTERN.is_match(template)
}

/// Replaces every placeholder with its bound value.
///
/// Fails with [`TemplateError::MissingBinding`] on the first referenced name
/// that has no entry in `bindings`; nothing is substituted in that case.
pub fn substitute(template: &str, bindings: &Bindings) -> Result<String, TemplateError> {
    if let Some(name) = parse_variables(template)
        .into_iter()
        .find(|name| !bindings.contains_key(name))
    {
        return Err(TemplateError::MissingBinding { name });
    }

    let replaced = VARIABLE_PATTERN.replace_all(template, |caps: &Captures| {
        bindings.get(&caps[1]).cloned().unwrap_or_default()
    });
    Ok(replaced.into_owned())
}

/// Pairs values collected positionally (one per distinct variable) with
/// their names.
pub fn bind_positional(
    variables: &[String],
    values: &[String],
) -> Result<Bindings, TemplateError> {
    if variables.len() != values.len() {
        return Err(TemplateError::BindingCountMismatch {
            expected: variables.len(),
            actual: values.len(),
        });
    }
    Ok(variables
        .iter()
        .cloned()
        .zip(values.iter().cloned())
        .collect())
}

#[cfg(test)]
#[path = "../tests/unit/variables_tests.rs"]
mod tests;
