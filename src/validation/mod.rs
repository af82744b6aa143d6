//! Declarative per-field input checks.
//!
//! Each field lists its rules broad to narrow. Checking a field stops at the
//! first failing rule; failures from every field are gathered into a single
//! [`ApiError::Validation`].

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::ApiError;
use crate::i18n::Translator;

pub const PASSWORD_MIN_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Value must be present (and a string must be non-empty).
    Required,
    /// Skip the remaining rules when the value is absent or empty.
    OmitEmpty,
    /// Strings must contain a non-whitespace character; lists must be non-empty.
    NotBlank,
    Uuid4,
    /// Calendar date written as `yyyy-mm-dd`.
    IsoDate,
    /// Every string (or list element) must be one of the given values.
    OneOf(&'static [&'static str]),
    MinLen(usize),
    /// At least one lowercase, uppercase, digit and symbol character.
    Password,
    /// ASCII letters, digits, `.`, `-` and `_`. Usernames end up inside
    /// policy subjects and resource patterns, so nothing else gets through.
    Username,
}

/// A field value as the validator sees it.
#[derive(Debug, Clone, Copy)]
pub enum FieldValue<'a> {
    Text(Option<&'a str>),
    List(Option<&'a [String]>),
}

impl<'a> From<&'a str> for FieldValue<'a> {
    fn from(value: &'a str) -> Self {
        FieldValue::Text(Some(value))
    }
}

impl<'a> From<&'a String> for FieldValue<'a> {
    fn from(value: &'a String) -> Self {
        FieldValue::Text(Some(value.as_str()))
    }
}

impl<'a> From<&'a Option<String>> for FieldValue<'a> {
    fn from(value: &'a Option<String>) -> Self {
        FieldValue::Text(value.as_deref())
    }
}

impl<'a> From<&'a Option<Vec<String>>> for FieldValue<'a> {
    fn from(value: &'a Option<Vec<String>>) -> Self {
        FieldValue::List(value.as_deref())
    }
}

impl<'a> From<&'a Vec<String>> for FieldValue<'a> {
    fn from(value: &'a Vec<String>) -> Self {
        FieldValue::List(Some(value.as_slice()))
    }
}

impl FieldValue<'_> {
    fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(v) => v.map_or(true, str::is_empty),
            FieldValue::List(v) => v.map_or(true, <[String]>::is_empty),
        }
    }
}

/// Collects field failures as translated messages.
pub struct Validator<'t> {
    translator: &'t Translator,
    errors: Vec<String>,
}

impl<'t> Validator<'t> {
    pub fn new(translator: &'t Translator) -> Self {
        Self {
            translator,
            errors: Vec::new(),
        }
    }

    /// Check one field. `name` is the human label used in messages.
    pub fn field<'v>(&mut self, name: &str, value: impl Into<FieldValue<'v>>, rules: &[Rule]) -> &mut Self {
        let value = value.into();
        for rule in rules {
            match self.check(name, value, *rule) {
                Outcome::Pass => continue,
                Outcome::Skip => break,
                Outcome::Fail(message) => {
                    self.errors.push(message);
                    break;
                }
            }
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation(std::mem::take(&mut self.errors)))
        }
    }

    fn check(&self, name: &str, value: FieldValue<'_>, rule: Rule) -> Outcome {
        let t = self.translator;
        match rule {
            Rule::Required => {
                let missing = match value {
                    FieldValue::Text(v) => v.map_or(true, str::is_empty),
                    FieldValue::List(v) => v.is_none(),
                };
                Outcome::fail_if(missing, || t.t("required", &[name]))
            }
            Rule::OmitEmpty => {
                if value.is_empty() {
                    Outcome::Skip
                } else {
                    Outcome::Pass
                }
            }
            Rule::NotBlank => match value {
                FieldValue::Text(v) => Outcome::fail_if(v.map_or(true, |s| s.trim().is_empty()), || {
                    t.t("notBlank-string", &[name])
                }),
                FieldValue::List(v) => Outcome::fail_if(v.map_or(true, <[String]>::is_empty), || {
                    t.t("notBlank-items", &[name])
                }),
            },
            Rule::Uuid4 => each_text(value, |s| is_uuid4(s), || t.t("uuid4", &[name])),
            Rule::IsoDate => each_text(value, |s| NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok(), || {
                t.t("isIsoDate", &[name])
            }),
            Rule::OneOf(allowed) => each_text(value, |s| allowed.iter().any(|a| *a == s), || {
                t.t("oneof", &[name, &allowed.join(" ")])
            }),
            Rule::MinLen(min) => each_text(value, |s| s.chars().count() >= min, || {
                t.t("min-string", &[name, &min.to_string()])
            }),
            Rule::Password => each_text(value, is_strong_password, || t.t("password", &[name])),
            Rule::Username => each_text(value, is_username, || t.t("username", &[name])),
        }
    }
}

enum Outcome {
    Pass,
    Skip,
    Fail(String),
}

impl Outcome {
    fn fail_if(failed: bool, message: impl FnOnce() -> String) -> Self {
        if failed {
            Outcome::Fail(message())
        } else {
            Outcome::Pass
        }
    }
}

/// Apply a string predicate to a text value or to every list element.
/// Absent values pass; presence is `Required`'s job.
fn each_text(value: FieldValue<'_>, ok: impl Fn(&str) -> bool, message: impl FnOnce() -> String) -> Outcome {
    let valid = match value {
        FieldValue::Text(v) => v.map_or(true, &ok),
        FieldValue::List(v) => v.map_or(true, |items| items.iter().all(|s| ok(s.as_str()))),
    };
    Outcome::fail_if(!valid, message)
}

/// Canonical lowercase hyphenated version-4 UUID.
pub fn is_uuid4(s: &str) -> bool {
    s.len() == 36
        && !s.chars().any(|c| c.is_ascii_uppercase())
        && Uuid::parse_str(s).map_or(false, |u| {
            u.get_version_num() == 4 && u.get_variant() == uuid::Variant::RFC4122
        })
}

pub fn is_username(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

pub fn is_strong_password(s: &str) -> bool {
    let mut lower = false;
    let mut upper = false;
    let mut digit = false;
    let mut symbol = false;
    for c in s.chars() {
        if c.is_numeric() {
            digit = true;
        } else if c.is_lowercase() {
            lower = true;
        } else if c.is_uppercase() {
            upper = true;
        } else if c.is_ascii_punctuation() || (!c.is_alphanumeric() && !c.is_whitespace() && !c.is_control()) {
            symbol = true;
        }
    }
    lower && upper && digit && symbol
}
