use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::{debug, info, warn};
use regex::Regex;

use crate::config::BehaviorConfig;
use crate::dom::{Dom, EventKind, Listener, Target, UiEvent};

const FIELD_ERROR_CLASS: &str = "field-error";
const FIELDS_SELECTOR: &str = "input, select, textarea";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    Idle,
    Submitting,
    Submitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted,
    Rejected,
}

/// A named value read from the form once validation passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub value: String,
}

/// Where validated submissions go. `done` must be called exactly once.
pub trait Submitter<D: Dom> {
    fn submit(&self, dom: &Rc<D>, fields: Vec<FormField>, done: Box<dyn FnOnce(SubmitOutcome)>);
}

/// Stand-in for a real form endpoint: accepts everything after a fixed delay.
pub struct SimulatedSubmitter {
    delay_ms: u32,
}

impl SimulatedSubmitter {
    pub fn new(delay_ms: u32) -> Self {
        Self { delay_ms }
    }
}

impl<D: Dom> Submitter<D> for SimulatedSubmitter {
    fn submit(&self, dom: &Rc<D>, fields: Vec<FormField>, done: Box<dyn FnOnce(SubmitOutcome)>) {
        debug!("Simulating submission of {} fields", fields.len());
        dom.set_timeout(self.delay_ms, Box::new(move || done(SubmitOutcome::Accepted)));
    }
}

/// True when a required field has nothing in it.
pub fn is_missing(checkbox: bool, checked: bool, value: &str) -> bool {
    if checkbox {
        !checked
    } else {
        value.trim().is_empty()
    }
}

/// Empty values are left to the required check.
pub fn is_bad_email(value: &str, pattern: &Regex) -> bool {
    !value.is_empty() && !pattern.is_match(value)
}

pub struct ContactForm<D: Dom> {
    dom: Rc<D>,
    form: D::Node,
    success: Option<D::Node>,
    email_field_id: String,
    email_rule: Regex,
    error_color: String,
    required_message: String,
    email_message: String,
    sending_label: String,
    success_margin: f64,
    submitter: Box<dyn Submitter<D>>,
    phase: Cell<FormPhase>,
    idle_label: RefCell<Option<String>>,
}

impl<D: Dom> ContactForm<D> {
    pub fn attach(
        dom: &Rc<D>,
        config: &BehaviorConfig,
        email_rule: Regex,
        submitter: Box<dyn Submitter<D>>,
        listeners: &mut Vec<Listener>,
    ) -> Option<Rc<Self>> {
        let Some(form) = dom.element_by_id(&config.contact_form_id) else {
            debug!("No #{} element, contact form disabled", config.contact_form_id);
            return None;
        };

        let contact = Rc::new(Self {
            dom: Rc::clone(dom),
            form: form.clone(),
            success: dom.element_by_id(&config.form_success_id),
            email_field_id: config.email_field_id.clone(),
            email_rule,
            error_color: config.error_color.clone(),
            required_message: config.required_message.clone(),
            email_message: config.email_message.clone(),
            sending_label: config.sending_label.clone(),
            success_margin: config.success_scroll_margin,
            submitter,
            phase: Cell::new(FormPhase::Idle),
            idle_label: RefCell::new(None),
        });

        let c = Rc::clone(&contact);
        listeners.push(dom.listen(
            Target::Element(form),
            EventKind::Submit,
            Box::new(move |event: &UiEvent| c.on_submit(event)),
        ));

        info!("Contact form validation active");
        Some(contact)
    }

    pub fn phase(&self) -> FormPhase {
        self.phase.get()
    }

    fn on_submit(self: &Rc<Self>, event: &UiEvent) {
        event.prevent_default();
        if self.phase.get() != FormPhase::Idle {
            debug!("Submit ignored while {:?}", self.phase.get());
            return;
        }

        if !self.validate() {
            debug!("Contact form has errors, submission blocked");
            return;
        }

        self.phase.set(FormPhase::Submitting);
        if let Some(button) = self.submit_button() {
            *self.idle_label.borrow_mut() = Some(self.dom.text_content(&button));
            self.dom.set_text(&button, &self.sending_label);
            self.dom.set_disabled(&button, true);
        }

        let fields = self.fields();
        let this = Rc::clone(self);
        self.submitter
            .submit(&self.dom, fields, Box::new(move |outcome| this.finish(outcome)));
    }

    /// Clears the previous attempt's feedback and flags every failing field.
    pub fn validate(&self) -> bool {
        let dom = &self.dom;
        for stale in dom.query_within(&self.form, &format!(".{}", FIELD_ERROR_CLASS)) {
            dom.remove(&stale);
        }
        for field in dom.query_within(&self.form, FIELDS_SELECTOR) {
            dom.set_style(&field, "border-color", "");
        }

        let mut valid = true;
        for field in dom.query_within(&self.form, "[required]") {
            let checkbox = dom
                .attribute(&field, "type")
                .is_some_and(|t| t.eq_ignore_ascii_case("checkbox"));
            if !is_missing(checkbox, dom.checked(&field), &dom.value(&field)) {
                continue;
            }
            valid = false;
            dom.set_style(&field, "border-color", &self.error_color);
            if !checkbox {
                self.show_error(&field, &self.required_message);
            }
        }

        if let Some(email) = dom.element_by_id(&self.email_field_id) {
            if is_bad_email(&dom.value(&email), &self.email_rule) {
                valid = false;
                dom.set_style(&email, "border-color", &self.error_color);
                self.show_error(&email, &self.email_message);
            }
        }

        valid
    }

    fn show_error(&self, field: &D::Node, message: &str) {
        let Some(error) = self.dom.create_element("p") else {
            return;
        };
        self.dom.set_attribute(&error, "class", FIELD_ERROR_CLASS);
        self.dom.set_attribute(
            &error,
            "style",
            &format!("color: {}; font-size: 0.72rem; margin-top: 4px;", self.error_color),
        );
        self.dom.set_text(&error, message);
        self.dom.insert_after(field, &error);
    }

    fn submit_button(&self) -> Option<D::Node> {
        self.dom
            .query_within(&self.form, r#"button[type="submit"]"#)
            .into_iter()
            .next()
    }

    fn fields(&self) -> Vec<FormField> {
        self.dom
            .query_within(&self.form, FIELDS_SELECTOR)
            .into_iter()
            .filter_map(|field| {
                let name = self
                    .dom
                    .attribute(&field, "name")
                    .or_else(|| self.dom.attribute(&field, "id"))?;
                let checkbox = self
                    .dom
                    .attribute(&field, "type")
                    .is_some_and(|t| t.eq_ignore_ascii_case("checkbox"));
                let value = if checkbox {
                    if self.dom.checked(&field) { "on".to_string() } else { String::new() }
                } else {
                    self.dom.value(&field)
                };
                Some(FormField { name, value })
            })
            .collect()
    }

    fn finish(&self, outcome: SubmitOutcome) {
        match outcome {
            SubmitOutcome::Accepted => {
                self.phase.set(FormPhase::Submitted);
                self.dom.set_style(&self.form, "display", "none");
                if let Some(success) = &self.success {
                    self.dom.set_style(success, "display", "block");
                }
                let top = self
                    .success
                    .as_ref()
                    .and_then(|s| self.dom.offset_top(s))
                    .map(|t| t - self.success_margin)
                    .filter(|t| t.is_finite())
                    .unwrap_or(0.0);
                self.dom.smooth_scroll_to(top);
                info!("Contact form submitted");
            }
            SubmitOutcome::Rejected => {
                warn!("Contact form submission rejected, form re-enabled");
                self.phase.set(FormPhase::Idle);
                if let Some(button) = self.submit_button() {
                    if let Some(label) = self.idle_label.borrow_mut().take() {
                        self.dom.set_text(&button, &label);
                    }
                    self.dom.set_disabled(&button, false);
                }
            }
        }
    }
}
