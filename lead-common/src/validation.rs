use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::phone::PhoneWidget;

/// Loose `local@domain.tld` shape. Deliverability is the webhook's problem, not ours.
static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid"));

/// The lead form fields, in the order they are validated at submit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Email,
    Phone,
    Education,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Name, Field::Email, Field::Phone, Field::Education];

    /// The DOM id of the input backing this field.
    pub fn id(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Phone => "phone",
            Field::Education => "education",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationReason {
    Required,
    TooShort,
    InvalidFormat,
    PhoneInvalid,
    PhoneUnavailable,
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ValidationReason::Required => write!(f, "required"),
            ValidationReason::TooShort => write!(f, "too short"),
            ValidationReason::InvalidFormat => write!(f, "invalid format"),
            ValidationReason::PhoneInvalid => write!(f, "phone invalid"),
            ValidationReason::PhoneUnavailable => write!(f, "phone widget not initialized"),
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("field {field} failed validation: {reason}")]
pub struct ValidationError {
    pub field: Field,
    pub reason: ValidationReason,
}

impl ValidationError {
    fn new(field: Field, reason: ValidationReason) -> Self {
        Self { field, reason }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ValidationRules {
    /// Minimum length of the trimmed name, in characters.
    pub name_min_length: usize,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self { name_min_length: 3 }
    }
}

/// Check a single field against its rule. Rules are checked in order and the first failure wins.
///
/// `value` is ignored for `Field::Phone`: phone validity is owned by the phone widget, and an
/// uninitialized widget (`None`) fails the field.
pub fn validate_field(
    field: Field,
    value: &str,
    rules: &ValidationRules,
    phone: Option<&dyn PhoneWidget>,
) -> Result<(), ValidationError> {
    let value = value.trim();

    match field {
        Field::Name => {
            if value.is_empty() {
                Err(ValidationError::new(field, ValidationReason::Required))
            } else if value.chars().count() < rules.name_min_length {
                Err(ValidationError::new(field, ValidationReason::TooShort))
            } else {
                Ok(())
            }
        }
        Field::Email => {
            if value.is_empty() {
                Err(ValidationError::new(field, ValidationReason::Required))
            } else if !EMAIL_REGEX.is_match(value) {
                Err(ValidationError::new(field, ValidationReason::InvalidFormat))
            } else {
                Ok(())
            }
        }
        Field::Education => {
            if value.is_empty() {
                Err(ValidationError::new(field, ValidationReason::Required))
            } else {
                Ok(())
            }
        }
        Field::Phone => match phone {
            None => Err(ValidationError::new(
                field,
                ValidationReason::PhoneUnavailable,
            )),
            Some(widget) if !widget.is_valid_number() => {
                Err(ValidationError::new(field, ValidationReason::PhoneInvalid))
            }
            Some(_) => Ok(()),
        },
    }
}
