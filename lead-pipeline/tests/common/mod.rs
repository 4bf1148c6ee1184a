#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use envconfig::Envconfig;
use lead_common::phone::{CountryData, PhoneWidget};
use lead_common::record::PageContext;
use lead_common::validation::Field;
use lead_pipeline::analytics::{Analytics, DataLayer, EventSink};
use lead_pipeline::config::Config;
use lead_pipeline::form::FormSurface;
use lead_pipeline::pipeline::LeadSession;
use lead_pipeline::webhook::WebhookDispatcher;

static TRACING_INIT: Once = Once::new();
pub fn setup_tracing() {
    TRACING_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_writer(tracing_subscriber::fmt::TestWriter::new())
            .init()
    });
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCall {
    ShowError(Field, String),
    ClearError(Field),
    Focus(Field),
    SetValue(Field, String, Option<usize>),
    SetLoading(bool),
    Notify(String),
    Navigate(String),
}

/// Remembers every call so tests can assert on what the visitor would have seen.
#[derive(Default)]
pub struct RecordingSurface {
    calls: Mutex<Vec<SurfaceCall>>,
}

impl RecordingSurface {
    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SurfaceCall::Navigate(url) => Some(url),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: SurfaceCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl FormSurface for RecordingSurface {
    fn show_error(&self, field: Field, message: &str) {
        self.record(SurfaceCall::ShowError(field, message.to_owned()));
    }

    fn clear_error(&self, field: Field) {
        self.record(SurfaceCall::ClearError(field));
    }

    fn focus(&self, field: Field) {
        self.record(SurfaceCall::Focus(field));
    }

    fn set_value(&self, field: Field, value: &str, caret: Option<usize>) {
        self.record(SurfaceCall::SetValue(field, value.to_owned(), caret));
    }

    fn set_loading(&self, loading: bool) {
        self.record(SurfaceCall::SetLoading(loading));
    }

    fn notify(&self, message: &str) {
        self.record(SurfaceCall::Notify(message.to_owned()));
    }

    fn navigate(&self, url: &str) {
        self.record(SurfaceCall::Navigate(url.to_owned()));
    }
}

/// A phone widget whose country and validity tests can flip.
pub struct FakePhone {
    country: Mutex<CountryData>,
    valid: Mutex<bool>,
}

impl FakePhone {
    pub fn new(country: CountryData, valid: bool) -> Self {
        Self {
            country: Mutex::new(country),
            valid: Mutex::new(valid),
        }
    }

    pub fn select(&self, country: CountryData) {
        *self.country.lock().unwrap() = country;
    }

    pub fn set_valid(&self, valid: bool) {
        *self.valid.lock().unwrap() = valid;
    }
}

impl PhoneWidget for FakePhone {
    fn selected_country(&self) -> CountryData {
        self.country.lock().unwrap().clone()
    }

    fn is_valid_number(&self) -> bool {
        *self.valid.lock().unwrap()
    }
}

pub fn config_for(webhook_url: &str, overrides: &[(&str, &str)]) -> Config {
    let mut env = HashMap::from([
        ("WEBHOOK_URL".to_owned(), webhook_url.to_owned()),
        ("REDIRECT_URL".to_owned(), "https://lp.example.com/obrigado".to_owned()),
        ("REDIRECT_DELAY".to_owned(), "20".to_owned()),
    ]);
    for (key, value) in overrides {
        env.insert((*key).to_owned(), (*value).to_owned());
    }

    Config::init_from_hashmap(&env).expect("failed to build test config")
}

pub struct TestSession {
    pub session: Arc<LeadSession>,
    pub surface: Arc<RecordingSurface>,
    pub phone: Arc<FakePhone>,
    pub data_layer: Arc<DataLayer>,
}

impl TestSession {
    pub fn new(config: Config, page_url: &str) -> Self {
        let surface = Arc::new(RecordingSurface::default());
        let phone = Arc::new(FakePhone::new(CountryData::brazil(), true));
        let data_layer = Arc::new(DataLayer::default());

        let primary: Arc<dyn EventSink> = data_layer.clone();
        let (analytics, _) = Analytics::spawn(primary, Vec::new());
        let dispatcher =
            Arc::new(WebhookDispatcher::from_config(&config).expect("failed to build dispatcher"));
        let page = PageContext {
            url: page_url.to_owned(),
            user_agent: "Mozilla/5.0 (integration test)".to_owned(),
        };

        let session = LeadSession::new(config, page, surface.clone(), dispatcher, analytics)
            .with_phone_widget(phone.clone());

        Self {
            session: Arc::new(session),
            surface,
            phone,
            data_layer,
        }
    }

    /// Type a complete, valid lead into the form.
    pub fn fill_valid(&self) {
        self.session.on_input(Field::Name, "  Maria Silva ", 14);
        self.session.on_input(Field::Email, "maria@example.com", 17);
        self.session.on_input(Field::Phone, "11987654321", 11);
        self.session.on_input(Field::Education, "mestrado", 8);
    }

    /// Wait until the surface saw a navigation, or give up after a second.
    pub async fn wait_for_navigation(&self) -> Option<String> {
        for _ in 0..100 {
            if let Some(url) = self.surface.navigations().pop() {
                return Some(url);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        None
    }

    /// Wait until at least `n` analytics events reached the data layer.
    pub async fn wait_for_events(&self, n: usize) -> Vec<lead_pipeline::analytics::AnalyticsEvent> {
        for _ in 0..100 {
            let events = self.data_layer.events();
            if events.len() >= n {
                return events;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.data_layer.events()
    }
}
