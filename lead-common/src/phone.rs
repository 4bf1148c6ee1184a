//! Brazilian phone masking and the contract of the international phone widget.
//!
//! The mask is progressive: it shapes whatever digits have been typed so far into
//! `(DD) DDDDD-DDDD`, never inserting characters the user hasn't reached yet.

use serde::Serialize;

pub const BRAZIL_ISO2: &str = "br";

/// Digits the mask can place: 2 area code + 5 + 4 subscriber digits.
const MAX_MASKED_DIGITS: usize = 11;

/// Country currently selected in the phone widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryData {
    pub iso2: String,
    pub dial_code: String,
}

impl CountryData {
    pub fn new(iso2: &str, dial_code: &str) -> Self {
        Self {
            iso2: iso2.to_owned(),
            dial_code: dial_code.to_owned(),
        }
    }

    pub fn brazil() -> Self {
        Self::new(BRAZIL_ISO2, "55")
    }

    pub fn is_brazil(&self) -> bool {
        self.iso2.eq_ignore_ascii_case(BRAZIL_ISO2)
    }
}

/// The external phone-number widget. The form owns one for the lifetime of the page.
pub trait PhoneWidget: Send + Sync {
    fn selected_country(&self) -> CountryData;
    fn is_valid_number(&self) -> bool;
}

/// Options the adapter layer hands to the phone widget when constructing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneWidgetOptions {
    pub initial_country: String,
    pub preferred_countries: Vec<String>,
    pub separate_dial_code: bool,
    pub auto_placeholder: String,
    pub format_on_display: bool,
}

impl Default for PhoneWidgetOptions {
    fn default() -> Self {
        Self {
            initial_country: BRAZIL_ISO2.to_owned(),
            preferred_countries: vec!["br".to_owned(), "us".to_owned(), "pt".to_owned()],
            separate_dial_code: true,
            auto_placeholder: "polite".to_owned(),
            format_on_display: true,
        }
    }
}

/// Remove every non-digit character.
pub fn strip_mask(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Shape the digits of `value` into `(DD) DDDDD-DDDD`, progressively.
///
/// One digit opens `(DD`, three append `) DDDDD`, eight append `-DDDD`. Digits past the
/// eleventh are dropped.
pub fn apply_mask(value: &str) -> String {
    let digits = strip_mask(value);
    let digits = &digits[..digits.len().min(MAX_MASKED_DIGITS)];
    let mut formatted = String::with_capacity(digits.len() + 5);

    if !digits.is_empty() {
        formatted.push('(');
        formatted.push_str(&digits[..digits.len().min(2)]);
    }
    if digits.len() >= 3 {
        formatted.push_str(") ");
        formatted.push_str(&digits[2..digits.len().min(7)]);
    }
    if digits.len() >= 8 {
        formatted.push('-');
        formatted.push_str(&digits[7..]);
    }

    formatted
}

/// An input value together with the caret position (in characters) to restore after writing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskedInput {
    pub value: String,
    pub caret: usize,
}

/// Re-mask a value after a keystroke, shifting the caret by however much the value grew or shrank.
pub fn reformat(value: &str, caret: usize) -> MaskedInput {
    let formatted = apply_mask(value);
    let old_len = value.chars().count() as isize;
    let new_len = formatted.chars().count() as isize;
    let caret = (caret as isize + new_len - old_len).clamp(0, new_len) as usize;

    MaskedInput {
        value: formatted,
        caret,
    }
}

/// The value the phone input should hold after the selected country changed.
/// `None` means the input stays untouched.
pub fn on_country_change(value: &str, country: &CountryData) -> Option<String> {
    if value.is_empty() {
        None
    } else if country.is_brazil() {
        Some(apply_mask(value))
    } else {
        Some(strip_mask(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_mask_progressive_prefixes() {
        let digits = "11987654321";
        let expected = [
            "",
            "(1",
            "(11",
            "(11) 9",
            "(11) 98",
            "(11) 987",
            "(11) 9876",
            "(11) 98765",
            "(11) 98765-4",
            "(11) 98765-43",
            "(11) 98765-432",
            "(11) 98765-4321",
        ];

        for (n, want) in expected.iter().enumerate() {
            let masked = apply_mask(&digits[..n]);
            assert_eq!(&masked, want, "masking {n} digits");
            assert_eq!(strip_mask(&masked), &digits[..n]);
        }
    }

    #[test]
    fn test_apply_mask_ignores_existing_formatting() {
        assert_eq!(apply_mask("(11) 9876"), "(11) 9876");
        assert_eq!(apply_mask("11-98765 4321"), "(11) 98765-4321");
        assert_eq!(apply_mask("abc"), "");
    }

    #[test]
    fn test_apply_mask_drops_extra_digits() {
        assert_eq!(apply_mask("119876543210"), "(11) 98765-4321");
    }

    #[test]
    fn test_strip_mask() {
        assert_eq!(strip_mask("(11) 98765-4321"), "11987654321");
        assert_eq!(strip_mask("+1 (415) 555-1212"), "14155551212");
        assert_eq!(strip_mask(""), "");
    }

    #[test]
    fn test_reformat_moves_caret_with_inserted_characters() {
        // Typing the third digit at the end inserts ") ".
        let masked = reformat("(119", 4);
        assert_eq!(masked.value, "(11) 9");
        assert_eq!(masked.caret, 6);

        // Typing the eighth digit inserts "-".
        let masked = reformat("(11) 987654", 11);
        assert_eq!(masked.value, "(11) 98765-4");
        assert_eq!(masked.caret, 12);
    }

    #[test]
    fn test_reformat_keeps_caret_in_bounds() {
        let masked = reformat("abc", 3);
        assert_eq!(masked.value, "");
        assert_eq!(masked.caret, 0);

        let masked = reformat("1", 0);
        assert_eq!(masked.value, "(1");
        assert_eq!(masked.caret, 1);
    }

    #[test]
    fn test_on_country_change() {
        let us = CountryData::new("us", "1");

        assert_eq!(on_country_change("", &CountryData::brazil()), None);
        assert_eq!(on_country_change("", &us), None);
        assert_eq!(
            on_country_change("11987654321", &CountryData::brazil()),
            Some("(11) 98765-4321".to_owned())
        );
        assert_eq!(
            on_country_change("(11) 98765-4321", &us),
            Some("11987654321".to_owned())
        );
    }

    #[test]
    fn test_default_widget_options() {
        let options = PhoneWidgetOptions::default();

        assert_eq!(options.initial_country, "br");
        assert_eq!(options.preferred_countries, vec!["br", "us", "pt"]);
        assert!(options.format_on_display);
        assert_eq!(
            serde_json::to_value(&options).unwrap()["autoPlaceholder"],
            "polite"
        );
    }
}
