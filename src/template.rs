//! Template interpolation for config files
//!
//! Handles `{{ env.NAME }}` interpolation so secrets can stay out of the
//! YAML file. `{{ vars.NAME }}` reads explicitly supplied variables.

use crate::error::{Error, Result};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Regex for matching template variables: {{ root.NAME }}
static TEMPLATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*(env|vars)\.([A-Za-z_][A-Za-z0-9_]*)\s*\}\}")
        .expect("template regex is valid")
});

/// Context for template interpolation
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    /// Explicit variables
    vars: HashMap<String, String>,
    /// Overrides for environment lookups (tests)
    env: Option<HashMap<String, String>>,
}

impl TemplateContext {
    /// Create a context that reads the process environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context with a fixed environment instead of the process one
    pub fn with_env(env: HashMap<String, String>) -> Self {
        Self {
            vars: HashMap::new(),
            env: Some(env),
        }
    }

    /// Set an explicit variable
    pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Look up `root.name`
    fn get(&self, root: &str, name: &str) -> Option<String> {
        match root {
            "env" => match &self.env {
                Some(env) => env.get(name).cloned(),
                None => std::env::var(name).ok(),
            },
            "vars" => self.vars.get(name).cloned(),
            _ => None,
        }
    }
}

/// Render a template string with the given context
///
/// Every referenced variable must be defined; the error lists all missing ones.
pub fn render(template: &str, ctx: &TemplateContext) -> Result<String> {
    let mut missing = Vec::new();

    let rendered = TEMPLATE_REGEX.replace_all(template, |cap: &regex::Captures<'_>| {
        let root = &cap[1];
        let name = &cap[2];
        ctx.get(root, name).unwrap_or_else(|| {
            missing.push(format!("{root}.{name}"));
            String::new()
        })
    });

    if missing.is_empty() {
        Ok(rendered.into_owned())
    } else {
        Err(Error::undefined_var(missing.join(", ")))
    }
}

/// Check if a string contains template variables
pub fn has_templates(s: &str) -> bool {
    TEMPLATE_REGEX.is_match(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> TemplateContext {
        TemplateContext::with_env(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_env_substitution() {
        let ctx = env(&[("REDSHIFT_PASSWORD", "hunter2")]);
        let result = render("password: {{ env.REDSHIFT_PASSWORD }}", &ctx).unwrap();
        assert_eq!(result, "password: hunter2");
    }

    #[test]
    fn test_multiple_substitutions() {
        let ctx = env(&[("HOST", "db.example.com"), ("PORT", "5439")]);
        let result = render("{{ env.HOST }}:{{env.PORT}}", &ctx).unwrap();
        assert_eq!(result, "db.example.com:5439");
    }

    #[test]
    fn test_vars_substitution() {
        let mut ctx = env(&[]);
        ctx.set_var("table", "events");
        assert_eq!(render("{{ vars.table }}", &ctx).unwrap(), "events");
    }

    #[test]
    fn test_undefined_variable() {
        let ctx = env(&[]);
        let err = render("{{ env.A }} {{ env.B }}", &ctx).unwrap_err();
        assert!(err.to_string().contains("env.A, env.B"));
    }

    #[test]
    fn test_no_templates() {
        let ctx = env(&[]);
        let result = render("plain: {value}", &ctx).unwrap();
        assert_eq!(result, "plain: {value}");
    }

    #[test]
    fn test_has_templates() {
        assert!(has_templates("{{ env.KEY }}"));
        assert!(has_templates("prefix {{ vars.x }} suffix"));
        assert!(!has_templates("{{ config.key }}"));
        assert!(!has_templates("{ not a template }"));
    }
}
