// SPDX-License-Identifier: MIT

//! Request field validation.
//!
//! Handlers collect per-field failures into a `field → message` map and
//! reject the request with a single "Validation error" response carrying the
//! whole map, so clients can annotate every offending form field at once.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());

/// Rules applied to a single field. Unset options are not checked.
#[derive(Debug, Default, Clone)]
pub struct FieldRules {
    pub required: bool,
    pub min_len: Option<usize>,
    pub max_len: Option<usize>,
    pub email: bool,
    /// Require an absolute http(s) URL.
    pub url: bool,
    pub min: Option<i64>,
    pub max: Option<i64>,
}

/// Accumulates field errors across a request body.
#[derive(Debug, Default)]
pub struct Validator {
    errors: BTreeMap<String, String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a string field. `None` and `Some("")` both count as absent.
    pub fn str_field(&mut self, field: &str, value: Option<&str>, rules: &FieldRules) {
        let value = value.filter(|v| !v.is_empty());
        let Some(value) = value else {
            if rules.required {
                self.errors
                    .insert(field.to_string(), format!("{field} is required"));
            }
            return;
        };

        if let Some(min) = rules.min_len {
            if value.chars().count() < min {
                self.errors.insert(
                    field.to_string(),
                    format!("{field} must be at least {min} characters"),
                );
                return;
            }
        }
        if let Some(max) = rules.max_len {
            if value.chars().count() > max {
                self.errors.insert(
                    field.to_string(),
                    format!("{field} must be no more than {max} characters"),
                );
                return;
            }
        }
        if rules.email && !EMAIL_RE.is_match(value) {
            self.errors.insert(
                field.to_string(),
                format!("{field} must be a valid email address"),
            );
            return;
        }
        if rules.url && !(value.starts_with("http://") || value.starts_with("https://")) {
            self.errors
                .insert(field.to_string(), format!("{field} format is invalid"));
        }
    }

    /// Validate an integer field (quantities, prices in cents).
    pub fn int_field(&mut self, field: &str, value: Option<i64>, rules: &FieldRules) {
        let Some(value) = value else {
            if rules.required {
                self.errors
                    .insert(field.to_string(), format!("{field} is required"));
            }
            return;
        };

        if let Some(min) = rules.min {
            if value < min {
                self.errors.insert(
                    field.to_string(),
                    format!("{field} must be at least {min}"),
                );
                return;
            }
        }
        if let Some(max) = rules.max {
            if value > max {
                self.errors.insert(
                    field.to_string(),
                    format!("{field} must be no more than {max}"),
                );
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// `Ok(())` when every field passed, otherwise the collected map.
    pub fn finish(self) -> Result<(), BTreeMap<String, String>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required() -> FieldRules {
        FieldRules {
            required: true,
            ..Default::default()
        }
    }

    #[test]
    fn required_field_missing() {
        let mut v = Validator::new();
        v.str_field("name", None, &required());
        let errors = v.finish().unwrap_err();
        assert_eq!(errors["name"], "name is required");
    }

    #[test]
    fn empty_string_counts_as_missing() {
        let mut v = Validator::new();
        v.str_field("name", Some(""), &required());
        assert!(v.finish().is_err());
    }

    #[test]
    fn optional_field_skips_other_rules_when_absent() {
        let mut v = Validator::new();
        v.str_field(
            "description",
            None,
            &FieldRules {
                min_len: Some(10),
                ..Default::default()
            },
        );
        assert!(v.finish().is_ok());
    }

    #[test]
    fn email_rule() {
        let mut v = Validator::new();
        let rules = FieldRules {
            required: true,
            email: true,
            ..Default::default()
        };
        v.str_field("email", Some("not-an-email"), &rules);
        let errors = v.finish().unwrap_err();
        assert_eq!(errors["email"], "email must be a valid email address");

        let mut v = Validator::new();
        v.str_field("email", Some("jane@example.com"), &rules);
        assert!(v.finish().is_ok());
    }

    #[test]
    fn length_bounds() {
        let mut v = Validator::new();
        let rules = FieldRules {
            required: true,
            min_len: Some(2),
            max_len: Some(5),
            ..Default::default()
        };
        v.str_field("name", Some("a"), &rules);
        assert!(!v.is_empty());

        let mut v = Validator::new();
        v.str_field("name", Some("abcdef"), &rules);
        assert!(!v.is_empty());

        let mut v = Validator::new();
        v.str_field("name", Some("abc"), &rules);
        assert!(v.is_empty());
    }

    #[test]
    fn int_bounds() {
        let mut v = Validator::new();
        let rules = FieldRules {
            required: true,
            min: Some(1),
            max: Some(99),
            ..Default::default()
        };
        v.int_field("quantity", Some(0), &rules);
        assert!(!v.is_empty());

        let mut v = Validator::new();
        v.int_field("quantity", Some(100), &rules);
        assert!(!v.is_empty());

        let mut v = Validator::new();
        v.int_field("quantity", Some(3), &rules);
        assert!(v.is_empty());
    }

    #[test]
    fn url_rule() {
        let mut v = Validator::new();
        let rules = FieldRules {
            required: true,
            url: true,
            ..Default::default()
        };
        v.str_field("image_url", Some("ftp://nope"), &rules);
        assert!(!v.is_empty());

        let mut v = Validator::new();
        v.str_field("image_url", Some("https://cdn.example.com/a.png"), &rules);
        assert!(v.is_empty());
    }
}
