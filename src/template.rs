//! Endpoint path templates
//!
//! Resource endpoints are declared as paths with `{{ variable }}`
//! placeholders, e.g. `/orchestrator_/odata/Buckets({{ id }})`.

use crate::error::{Error, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Regex for matching template variables: {{ variable }}
static TEMPLATE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*)\s*\}\}").unwrap());

/// Values substituted into a path template
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    values: BTreeMap<String, String>,
}

impl PathParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value, builder style
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl ToString) -> &mut Self {
        self.values.insert(name.into(), value.to_string());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// Render a template, failing on any variable without a value
pub fn render(template: &str, params: &PathParams) -> Result<String> {
    let mut result = String::with_capacity(template.len());
    let mut last_end = 0;

    for cap in TEMPLATE_REGEX.captures_iter(template) {
        let Some(full_match) = cap.get(0) else {
            continue;
        };
        let name = &cap[1];

        result.push_str(&template[last_end..full_match.start()]);
        let value = params.get(name).ok_or_else(|| Error::undefined_var(name))?;
        result.push_str(value);
        last_end = full_match.end();
    }

    result.push_str(&template[last_end..]);
    Ok(result)
}

/// Check if a string contains template variables
pub fn has_templates(s: &str) -> bool {
    TEMPLATE_REGEX.is_match(s)
}

/// Names of all variables in a template, in order of appearance
pub fn extract_variables(template: &str) -> Vec<String> {
    TEMPLATE_REGEX
        .captures_iter(template)
        .map(|cap| cap[1].to_string())
        .collect()
}
