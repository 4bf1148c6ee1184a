//! The lead submission state machine.
//!
//! A `LeadSession` owns everything one page load needs: form state, the visitor location slot,
//! the analytics handle and the submission state. Page events (`on_input`, `on_blur`, `submit`,
//! ...) are routed to it by whatever adapter wires the surface up.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use lead_common::locale::Locale;
use lead_common::phone::{self, PhoneWidget};
use lead_common::record::{LeadRecord, PageContext, RecordContext};
use lead_common::redirect::build_redirect_url;
use lead_common::validation::{validate_field, Field, ValidationError};
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::analytics::Analytics;
use crate::config::Config;
use crate::error::SubmitError;
use crate::form::{FormFieldState, FormSurface, LeadForm};
use crate::location::{LocationClient, LocationSlot};
use crate::webhook::LeadSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Validating,
    Submitting,
    Redirecting,
}

impl PipelineState {
    /// True while a submission is underway. The submit control is inert in every such state.
    pub fn is_busy(&self) -> bool {
        !matches!(self, PipelineState::Idle)
    }
}

#[derive(Debug)]
pub enum SubmitOutcome {
    /// Another submission was already underway.
    Ignored,
    /// At least one field failed validation. Every failure is listed in form order.
    Invalid(Vec<ValidationError>),
    /// The webhook call failed and the form is usable again.
    Failed(SubmitError),
    /// The lead was accepted. Navigation to this URL happens after the redirect delay.
    Redirecting(String),
}

pub struct LeadSession {
    config: Config,
    page: PageContext,
    surface: Arc<dyn FormSurface>,
    sink: Arc<dyn LeadSink>,
    analytics: Analytics,
    phone: Option<Arc<dyn PhoneWidget>>,
    location: LocationSlot,
    form: Mutex<LeadForm>,
    state: Mutex<PipelineState>,
}

impl LeadSession {
    pub fn new(
        config: Config,
        page: PageContext,
        surface: Arc<dyn FormSurface>,
        sink: Arc<dyn LeadSink>,
        analytics: Analytics,
    ) -> Self {
        Self {
            config,
            page,
            surface,
            sink,
            analytics,
            phone: None,
            location: LocationSlot::default(),
            form: Mutex::new(LeadForm::default()),
            state: Mutex::new(PipelineState::Idle),
        }
    }

    /// Attach the phone widget once it has initialized. Until then the phone field never
    /// validates.
    pub fn with_phone_widget(mut self, widget: Arc<dyn PhoneWidget>) -> Self {
        self.phone = Some(widget);
        self
    }

    pub fn locale(&self) -> Locale {
        self.config.locale
    }

    pub fn state(&self) -> PipelineState {
        *self.lock_state()
    }

    pub fn field(&self, field: Field) -> FormFieldState {
        self.lock_form().field(field).clone()
    }

    pub fn location(&self) -> &LocationSlot {
        &self.location
    }

    /// Kick off the page-load geolocation lookup. Submitting never waits for it.
    pub fn spawn_location_lookup(&self, client: LocationClient) -> tokio::task::JoinHandle<()> {
        self.location.spawn_lookup(client)
    }

    /// The visitor typed into `field`. `caret` is the cursor position after the keystroke.
    pub fn on_input(&self, field: Field, value: &str, caret: usize) {
        let mut form = self.lock_form();

        let brazilian_phone = field == Field::Phone
            && self
                .phone
                .as_ref()
                .is_some_and(|widget| widget.selected_country().is_brazil());

        if brazilian_phone {
            let masked = phone::reformat(value, caret);
            self.surface
                .set_value(field, &masked.value, Some(masked.caret));
            form.edit(field, masked.value, self.surface.as_ref());
        } else {
            form.edit(field, value.to_owned(), self.surface.as_ref());
        }
    }

    /// The visitor left `field`. Returns whether it is valid.
    pub fn on_blur(&self, field: Field) -> bool {
        let mut form = self.lock_form();

        self.check_field(&mut form, field).is_ok()
    }

    /// The phone widget switched country: re-mask for Brazil, strip the mask otherwise.
    pub fn on_country_change(&self) {
        let Some(widget) = &self.phone else {
            return;
        };

        let country = widget.selected_country();
        let mut form = self.lock_form();

        if let Some(value) = phone::on_country_change(&form.field(Field::Phone).raw_value, &country)
        {
            debug!("phone country changed to {}", country.iso2);
            self.surface.set_value(Field::Phone, &value, None);
            form.edit(Field::Phone, value, self.surface.as_ref());
        }
    }

    pub fn clear_form(&self) {
        self.lock_form().clear(self.surface.as_ref());
    }

    /// Validate, assemble and deliver the lead, then schedule the redirect.
    ///
    /// Only one submission runs at a time: calls made while one is underway return
    /// `SubmitOutcome::Ignored` without touching the form or the network.
    pub async fn submit(&self) -> SubmitOutcome {
        {
            let mut state = self.lock_state();
            if state.is_busy() {
                metrics::counter!("lead_submissions_dropped").increment(1);
                debug!("submit ignored while {:?}", *state);
                return SubmitOutcome::Ignored;
            }
            *state = PipelineState::Validating;
        }

        let (fields, errors) = {
            let mut form = self.lock_form();
            let mut errors = Vec::new();

            for field in Field::ALL {
                if let Err(error) = self.check_field(&mut form, field) {
                    errors.push(error);
                }
            }

            (form.lead_fields(), errors)
        };

        if !errors.is_empty() {
            debug!("submit blocked by {} invalid field(s)", errors.len());
            self.set_state(PipelineState::Idle);
            return SubmitOutcome::Invalid(errors);
        }

        let dial_code = self
            .phone
            .as_ref()
            .map(|widget| widget.selected_country().dial_code)
            .unwrap_or_default();
        let context = RecordContext {
            funnel_id: self.config.funnel_id,
            timezone: self.config.timezone.0,
            unknown_location: self.config.locale.unknown_location(),
            page: &self.page,
            location: self.location.get(),
        };
        let record = LeadRecord::assemble(&context, &fields, &dial_code, Utc::now());

        self.set_state(PipelineState::Submitting);
        self.surface.set_loading(true);
        let started = tokio::time::Instant::now();

        let in_flight = InFlight {
            session: self,
            settled: false,
        };
        let result = self.sink.submit(&record).await;
        in_flight.settle();

        match result {
            Ok(ack) => {
                self.set_state(PipelineState::Redirecting);
                debug!("webhook acknowledged lead: {}", ack);

                let url = build_redirect_url(
                    &self.config.redirect_url,
                    &record.name,
                    &record.email,
                    &record.utm(),
                );
                self.schedule_redirect(url.clone());

                SubmitOutcome::Redirecting(url)
            }
            Err(err) => {
                error!(
                    funnel_id = record.funnel_id,
                    kind = err.kind(),
                    elapsed = started.elapsed().as_secs_f64(),
                    page = %record.page_url,
                    submitted_at = %record.submitted_at_local,
                    "failed to submit lead: {}",
                    err
                );

                self.surface.notify(&err.user_message(self.config.locale));
                self.surface.set_loading(false);
                self.set_state(PipelineState::Idle);

                SubmitOutcome::Failed(err)
            }
        }
    }

    fn schedule_redirect(&self, url: String) {
        let surface = self.surface.clone();
        let delay = self.config.redirect_delay.0;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            info!("redirecting to {}", url);
            surface.navigate(&url);
        });
    }

    /// Run one field's rule and mirror the result onto the form and surface. A failing field
    /// takes focus, so after a full pass focus rests on the last failure.
    fn check_field(&self, form: &mut LeadForm, field: Field) -> Result<(), ValidationError> {
        let result = validate_field(
            field,
            &form.field(field).raw_value,
            &self.config.validation_rules(),
            self.phone.as_deref(),
        );

        match result {
            Ok(()) => form.accept(field, self.surface.as_ref()),
            Err(error) => {
                let message = self.config.locale.validation_message(field, error.reason);
                form.reject(field, message, self.surface.as_ref());
                self.surface.focus(field);
                self.track_validation_error(field, message);
            }
        }

        result
    }

    fn track_validation_error(&self, field: Field, message: &str) {
        metrics::counter!("lead_validation_errors_total", "field" => field.id()).increment(1);

        let mut data = Map::new();
        data.insert("eventCategory".to_owned(), Value::from("Form"));
        data.insert("eventAction".to_owned(), Value::from("Validation Error"));
        data.insert("eventLabel".to_owned(), Value::from(field.id()));
        data.insert("error_message".to_owned(), Value::from(message));

        self.analytics.track("form_validation_error", data);
    }

    fn lock_form(&self) -> MutexGuard<'_, LeadForm> {
        self.form.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_state(&self) -> MutexGuard<'_, PipelineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, next: PipelineState) {
        *self.lock_state() = next;
    }
}

/// Held across the webhook call. If the submit future is dropped before the call settles, the
/// session goes back to `Idle` with the submit control re-enabled.
struct InFlight<'a> {
    session: &'a LeadSession,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(mut self) {
        self.settled = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("lead submission abandoned while waiting on the webhook");
            self.session.surface.set_loading(false);
            self.session.set_state(PipelineState::Idle);
        }
    }
}
