use lead_common::record::LeadFields;
use lead_common::validation::Field;

/// The rendering surface behind the lead form: the DOM in a browser, a recorder in tests.
///
/// Implementations only draw. Every decision about what to draw is taken by the pipeline.
pub trait FormSurface: Send + Sync {
    /// Decorate `field` as errored and render `message` next to it, replacing any previous one.
    fn show_error(&self, field: Field, message: &str);
    /// Remove the error decoration and message from `field`.
    fn clear_error(&self, field: Field);
    fn focus(&self, field: Field);
    /// Overwrite the value of `field`, placing the caret at `caret` when given.
    fn set_value(&self, field: Field, value: &str, caret: Option<usize>);
    /// Toggle the disabled/loading look of the submit control.
    fn set_loading(&self, loading: bool);
    /// Blocking notification, e.g. `alert`.
    fn notify(&self, message: &str);
    fn navigate(&self, url: &str);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFieldState {
    pub raw_value: String,
    /// Set iff the field failed its rule at the last blur/submit and hasn't been edited since.
    pub error_message: Option<String>,
}

/// Field state for the four lead inputs. Every change to an error flag is mirrored to the
/// surface in the same call, so the decoration can never go stale.
#[derive(Debug, Clone, Default)]
pub struct LeadForm {
    name: FormFieldState,
    email: FormFieldState,
    phone: FormFieldState,
    education: FormFieldState,
}

impl LeadForm {
    pub fn field(&self, field: Field) -> &FormFieldState {
        match field {
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::Phone => &self.phone,
            Field::Education => &self.education,
        }
    }

    fn field_mut(&mut self, field: Field) -> &mut FormFieldState {
        match field {
            Field::Name => &mut self.name,
            Field::Email => &mut self.email,
            Field::Phone => &mut self.phone,
            Field::Education => &mut self.education,
        }
    }

    /// Record an edit. Any error on the field is cleared without re-running its rule.
    pub fn edit(&mut self, field: Field, value: String, surface: &dyn FormSurface) {
        let state = self.field_mut(field);
        state.raw_value = value;

        if state.error_message.take().is_some() {
            surface.clear_error(field);
        }
    }

    pub fn reject(&mut self, field: Field, message: &str, surface: &dyn FormSurface) {
        self.field_mut(field).error_message = Some(message.to_owned());
        surface.show_error(field, message);
    }

    pub fn accept(&mut self, field: Field, surface: &dyn FormSurface) {
        if self.field_mut(field).error_message.take().is_some() {
            surface.clear_error(field);
        }
    }

    /// Empty every field and drop its error state.
    pub fn clear(&mut self, surface: &dyn FormSurface) {
        for field in Field::ALL {
            self.accept(field, surface);
            self.field_mut(field).raw_value.clear();
            surface.set_value(field, "", None);
        }
    }

    pub fn lead_fields(&self) -> LeadFields {
        LeadFields {
            name: self.name.raw_value.clone(),
            email: self.email.raw_value.clone(),
            phone: self.phone.raw_value.clone(),
            education: self.education.raw_value.clone(),
        }
    }
}
