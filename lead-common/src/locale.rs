use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::validation::{Field, ValidationReason};

/// Language of the landing page. Selects every piece of user-visible copy the pipeline produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    PtBr,
    En,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("{0} is not a supported locale")]
pub struct ParseLocaleError(pub String);

impl FromStr for Locale {
    type Err = ParseLocaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_ref() {
            "pt-br" | "pt_br" | "pt" => Ok(Locale::PtBr),
            "en" | "en-us" | "en_us" => Ok(Locale::En),
            invalid => Err(ParseLocaleError(invalid.to_owned())),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Locale::PtBr => write!(f, "pt-BR"),
            Locale::En => write!(f, "en"),
        }
    }
}

impl Locale {
    /// The message rendered next to a field that failed validation.
    pub fn validation_message(&self, field: Field, reason: ValidationReason) -> &'static str {
        use ValidationReason as R;

        match (self, field, reason) {
            (Locale::PtBr, Field::Name, R::TooShort) => "Nome muito curto",
            (Locale::PtBr, Field::Name, _) => "Nome é obrigatório",
            (Locale::PtBr, Field::Email, R::InvalidFormat) => "E-mail inválido",
            (Locale::PtBr, Field::Email, _) => "E-mail é obrigatório",
            (Locale::PtBr, Field::Phone, R::PhoneUnavailable) => "Erro ao validar telefone",
            (Locale::PtBr, Field::Phone, _) => "Telefone inválido",
            (Locale::PtBr, Field::Education, _) => "Selecione sua formação",
            (Locale::En, Field::Name, R::TooShort) => "Name too short",
            (Locale::En, Field::Name, _) => "Name is required",
            (Locale::En, Field::Email, R::InvalidFormat) => "Invalid e-mail",
            (Locale::En, Field::Email, _) => "E-mail is required",
            (Locale::En, Field::Phone, R::PhoneUnavailable) => "Error validating phone",
            (Locale::En, Field::Phone, _) => "Invalid phone number",
            (Locale::En, Field::Education, _) => "Select your education level",
        }
    }

    pub fn timeout_message(&self) -> &'static str {
        match self {
            Locale::PtBr => "Timeout: requisição demorou muito",
            Locale::En => "Timeout: request took too long",
        }
    }

    pub fn http_status_message(&self, status: u16) -> String {
        format!("HTTP error! status: {status}")
    }

    pub fn generic_submit_message(&self) -> &'static str {
        match self {
            Locale::PtBr => "Erro ao enviar formulário. Tente novamente.",
            Locale::En => "Error submitting form. Please try again.",
        }
    }

    /// Stand-in for city and region when the geolocation lookup gave us nothing.
    pub fn unknown_location(&self) -> &'static str {
        match self {
            Locale::PtBr => "Desconhecido",
            Locale::En => "Unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_locale() {
        assert_eq!("pt-BR".parse::<Locale>(), Ok(Locale::PtBr));
        assert_eq!(" EN ".parse::<Locale>(), Ok(Locale::En));
        assert_eq!(
            "fr".parse::<Locale>(),
            Err(ParseLocaleError("fr".to_owned()))
        );
    }

    #[test]
    fn test_parse_locale_error_is_an_error() {
        let error: Box<dyn std::error::Error> = Box::new(ParseLocaleError("fr".to_owned()));

        assert_eq!(error.to_string(), "fr is not a supported locale");
    }

    #[test]
    fn test_locale_display_parses_back() {
        for locale in [Locale::PtBr, Locale::En] {
            assert_eq!(locale.to_string().parse::<Locale>(), Ok(locale));
        }
    }

    #[test]
    fn test_unknown_location_per_locale() {
        assert_eq!(Locale::PtBr.unknown_location(), "Desconhecido");
        assert_eq!(Locale::En.unknown_location(), "Unknown");
    }
}
