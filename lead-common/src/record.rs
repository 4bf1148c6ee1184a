use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::phone::strip_mask;
use crate::utm::UtmParams;

/// Wall-clock layout of `LeadRecord::submitted_at_local`, e.g. `2024-05-01 14:03:59`.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DEFAULT_COUNTRY: &str = "br";

/// The page the form lives on, as reported by the adapter layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContext {
    pub url: String,
    pub user_agent: String,
}

/// Best-effort visitor location, as returned by the IP geolocation endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserLocation {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// Raw form values at the moment of submit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadFields {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub education: String,
}

/// Everything besides the form values that goes into a `LeadRecord`.
#[derive(Debug, Clone)]
pub struct RecordContext<'a> {
    pub funnel_id: i32,
    pub timezone: Tz,
    /// City and region to report when the location is unknown.
    pub unknown_location: &'a str,
    pub page: &'a PageContext,
    pub location: Option<&'a UserLocation>,
}

/// The normalized lead sent to the webhook. Built once per submit attempt and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeadRecord {
    pub funnel_id: i32,
    #[serde(rename = "datetime")]
    pub submitted_at_local: String,
    pub name: String,
    #[serde(rename = "ddi")]
    pub dial_code: String,
    #[serde(rename = "phone")]
    pub phone_digits: String,
    pub email: String,
    #[serde(rename = "educationLevel")]
    pub education_level: String,
    #[serde(rename = "device")]
    pub user_agent: String,
    pub city: String,
    #[serde(rename = "state")]
    pub region: String,
    pub country: String,
    #[serde(rename = "page")]
    pub page_url: String,
    pub utm_source: String,
    pub utm_medium: String,
    pub utm_campaign: String,
    pub utm_term: String,
    pub utm_content: String,
}

impl LeadRecord {
    /// Snapshot the form and page into a record. Name and email are trimmed, the phone is
    /// reduced to its digits, and missing location fields fall back to the context defaults.
    pub fn assemble(
        context: &RecordContext,
        fields: &LeadFields,
        dial_code: &str,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        let utm = UtmParams::from_page_url(&context.page.url);
        let location = context.location;

        let city = location_field(location.and_then(|l| l.city.as_deref()))
            .unwrap_or(context.unknown_location)
            .to_owned();
        let region = location_field(location.and_then(|l| l.region.as_deref()))
            .unwrap_or(context.unknown_location)
            .to_owned();
        let country = location_field(location.and_then(|l| l.country.as_deref()))
            .map(str::to_lowercase)
            .unwrap_or_else(|| DEFAULT_COUNTRY.to_owned());

        LeadRecord {
            funnel_id: context.funnel_id,
            submitted_at_local: format_local(submitted_at, context.timezone),
            name: fields.name.trim().to_owned(),
            dial_code: dial_code.to_owned(),
            phone_digits: strip_mask(&fields.phone),
            email: fields.email.trim().to_owned(),
            education_level: fields.education.clone(),
            user_agent: context.page.user_agent.clone(),
            city,
            region,
            country,
            page_url: context.page.url.clone(),
            utm_source: utm.source,
            utm_medium: utm.medium,
            utm_campaign: utm.campaign,
            utm_term: utm.term,
            utm_content: utm.content,
        }
    }

    /// The attribution parameters this record carries.
    pub fn utm(&self) -> UtmParams {
        UtmParams {
            source: self.utm_source.clone(),
            medium: self.utm_medium.clone(),
            campaign: self.utm_campaign.clone(),
            term: self.utm_term.clone(),
            content: self.utm_content.clone(),
        }
    }
}

/// Empty strings count as missing, same as an absent key.
fn location_field(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

pub fn format_local(instant: DateTime<Utc>, timezone: Tz) -> String {
    instant
        .with_timezone(&timezone)
        .format(DATETIME_FORMAT)
        .to_string()
}
