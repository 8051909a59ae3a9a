//! Client-side behavior for the Maison Concierge marketing pages, compiled
//! to WebAssembly and bound to the static markup at load.

use std::rc::Rc;

use log::info;

pub mod config;
pub mod dom;
pub mod behaviors {
    pub mod navbar;
    pub mod mobile_menu;
    pub mod fade_in;
    pub mod faq;
    pub mod contact_form;
    pub mod smooth_scroll;
    pub mod active_link;
}

#[cfg(target_arch = "wasm32")]
mod web;
#[cfg(test)]
mod sim;

use behaviors::{
    contact_form::{ContactForm, SimulatedSubmitter, Submitter},
    fade_in::FadeIn,
    faq::FaqAccordion,
    mobile_menu::MobileMenu,
    navbar::NavBar,
};
use config::{BehaviorConfig, ConfigError};
use dom::{Dom, Listener};

/// Every behavior wired to one page. Dropping it unregisters all listeners
/// and observers; timers already scheduled still run.
pub struct Behaviors<D: Dom> {
    pub navbar: Option<Rc<NavBar<D>>>,
    pub mobile_menu: Option<Rc<MobileMenu<D>>>,
    pub fade_in: Option<Rc<FadeIn<D>>>,
    pub faq: Option<Rc<FaqAccordion<D>>>,
    pub contact_form: Option<Rc<ContactForm<D>>>,
    pub anchor_links: usize,
    pub active_links: usize,
    listeners: Vec<Listener>,
}

impl<D: Dom> Behaviors<D> {
    pub fn dispose(self) {
        info!("Disposing {} page listeners", self.listeners.len());
    }
}

pub fn init<D: Dom>(dom: &Rc<D>, config: &BehaviorConfig) -> Result<Behaviors<D>, ConfigError> {
    let submitter = Box::new(SimulatedSubmitter::new(config.submit_delay_ms));
    init_with_submitter(dom, config, submitter)
}

/// Same as [`init`] but validated contact-form submissions go to `submitter`.
pub fn init_with_submitter<D: Dom>(
    dom: &Rc<D>,
    config: &BehaviorConfig,
    submitter: Box<dyn Submitter<D>>,
) -> Result<Behaviors<D>, ConfigError> {
    let email_rule = config.validate()?;
    let mut listeners = Vec::new();

    let page = Behaviors {
        navbar: NavBar::attach(dom, config, &mut listeners),
        mobile_menu: MobileMenu::attach(dom, config, &mut listeners),
        fade_in: FadeIn::attach(dom, config, &mut listeners),
        faq: FaqAccordion::attach(dom, config, &mut listeners),
        contact_form: ContactForm::attach(dom, config, email_rule, submitter, &mut listeners),
        anchor_links: behaviors::smooth_scroll::attach(dom, config, &mut listeners),
        active_links: behaviors::active_link::mark(dom, config),
        listeners,
    };

    info!("Page behaviors ready ({} listeners)", page.listeners.len());
    Ok(page)
}
