//! Shape validation for the create-client payload.
//!
//! Every rule runs on every request and all violations are collected, so a
//! caller sees the full list of problems in one response.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;
use travel_shared::Masked;

use crate::models::NewClient;

pub const NAME_MAX_CHARS: usize = 50;
pub const PESEL_DIGITS: usize = 11;

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
static PHONE_RE: OnceLock<Regex> = OnceLock::new();
static PESEL_RE: OnceLock<Regex> = OnceLock::new();

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|error| panic!("pattern {pattern} failed to compile: {error}"))
}

fn email_regex() -> &'static Regex {
    // One '@' with something non-blank on either side.
    EMAIL_RE.get_or_init(|| compile(r"^[^@\s]+@[^@\s]+$"))
}

fn phone_regex() -> &'static Regex {
    PHONE_RE.get_or_init(|| {
        compile(r"^\+?[0-9 ().\-]*[0-9][0-9 ().\-]*(\s*(x|ext\.?)\s*[0-9]+)?$")
    })
}

fn pesel_regex() -> &'static Regex {
    PESEL_RE.get_or_init(|| compile(r"^[0-9]{11}$"))
}

/// Field name to list of violated rules, in stable field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Raw client payload as received over HTTP. Every field is optional here so
/// that missing values become validation errors instead of parse failures.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientRequest {
    #[serde(default, alias = "FirstName")]
    pub first_name: Option<String>,
    #[serde(default, alias = "LastName")]
    pub last_name: Option<String>,
    #[serde(default, alias = "Email")]
    pub email: Option<Masked<String>>,
    #[serde(default, alias = "Telephone")]
    pub telephone: Option<String>,
    #[serde(default, alias = "Pesel")]
    pub pesel: Option<Masked<String>>,
}

impl CreateClientRequest {
    pub fn validate(self) -> Result<NewClient, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let first_name = required(&mut errors, "firstName", self.first_name);
        let last_name = required(&mut errors, "lastName", self.last_name);
        let email = required(&mut errors, "email", self.email.map(Masked::into_inner));
        let telephone = required(&mut errors, "telephone", self.telephone);
        let pesel = required(&mut errors, "pesel", self.pesel.map(Masked::into_inner));

        if let Some(name) = &first_name {
            max_chars(&mut errors, "firstName", name);
        }
        if let Some(name) = &last_name {
            max_chars(&mut errors, "lastName", name);
        }
        if let Some(email) = &email {
            if !email_regex().is_match(email) {
                errors.add("email", "must be a valid email address");
            }
        }
        if let Some(telephone) = &telephone {
            if !phone_regex().is_match(telephone.trim()) {
                errors.add("telephone", "must be a valid phone number");
            }
        }
        if let Some(pesel) = &pesel {
            if !pesel_regex().is_match(pesel) {
                errors.add("pesel", format!("must consist of exactly {PESEL_DIGITS} digits"));
            }
        }

        match (first_name, last_name, email, telephone, pesel) {
            (Some(first_name), Some(last_name), Some(email), Some(telephone), Some(pesel))
                if errors.is_empty() =>
            {
                Ok(NewClient {
                    first_name: Masked::new(first_name),
                    last_name: Masked::new(last_name),
                    email: Masked::new(email),
                    telephone: Masked::new(telephone),
                    pesel: Masked::new(pesel),
                })
            }
            _ => Err(errors),
        }
    }
}

fn required(errors: &mut ValidationErrors, field: &'static str, value: Option<String>) -> Option<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Some(v),
        _ => {
            errors.add(field, "is required");
            None
        }
    }
}

fn max_chars(errors: &mut ValidationErrors, field: &'static str, value: &str) {
    if value.chars().count() > NAME_MAX_CHARS {
        errors.add(field, format!("must be at most {NAME_MAX_CHARS} characters"));
    }
}
