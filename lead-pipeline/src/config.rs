use std::collections::HashMap;
use std::str::FromStr;
use std::time;

use chrono_tz::Tz;
use envconfig::Envconfig;
use lead_common::locale::Locale;
use lead_common::validation::ValidationRules;

#[derive(Envconfig, Clone, Debug)]
pub struct Config {
    #[envconfig(default = "https://webhook-editor.infrab42.com/webhook/leads-lista-espera")]
    pub webhook_url: String,

    #[envconfig(default = "12")]
    pub funnel_id: i32,

    #[envconfig(default = "10000")]
    pub webhook_timeout: EnvMsDuration,

    #[envconfig(default = "https://metaanalysisacademy.com/semana-da-publicacao/obrigado-sdp")]
    pub redirect_url: String,

    #[envconfig(default = "500")]
    pub redirect_delay: EnvMsDuration,

    #[envconfig(default = "https://ipinfo.io/json")]
    pub location_url: String,

    #[envconfig(default = "5000")]
    pub location_timeout: EnvMsDuration,

    #[envconfig(default = "America/Sao_Paulo")]
    pub timezone: EnvTimezone,

    #[envconfig(default = "pt-BR")]
    pub locale: Locale,

    #[envconfig(default = "3")]
    pub name_min_length: usize,
}

impl Config {
    /// The landing page defaults, ignoring the process environment.
    pub fn default_test_config() -> Self {
        Self::init_from_hashmap(&HashMap::new()).expect("failed to create default config")
    }

    pub fn validation_rules(&self) -> ValidationRules {
        ValidationRules {
            name_min_length: self.name_min_length,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EnvMsDuration(pub time::Duration);

#[derive(Debug, PartialEq, Eq)]
pub struct ParseEnvMsDurationError;

impl FromStr for EnvMsDuration {
    type Err = ParseEnvMsDurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ms = s.parse::<u64>().map_err(|_| ParseEnvMsDurationError)?;

        Ok(EnvMsDuration(time::Duration::from_millis(ms)))
    }
}

/// An IANA timezone name, e.g. `America/Sao_Paulo`.
#[derive(Debug, Clone, Copy)]
pub struct EnvTimezone(pub Tz);

#[derive(Debug, PartialEq, Eq)]
pub struct ParseEnvTimezoneError(pub String);

impl FromStr for EnvTimezone {
    type Err = ParseEnvTimezoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<Tz>()
            .map(EnvTimezone)
            .map_err(|_| ParseEnvTimezoneError(s.to_owned()))
    }
}
