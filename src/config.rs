use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid email pattern: {0}")]
    EmailPattern(#[from] regex::Error),
    #[error("`{0}` must not be empty")]
    Empty(&'static str),
    #[error("fade-in threshold must be within 0.0..=1.0, got {0}")]
    Threshold(f64),
    #[error("could not read configuration object: {0}")]
    Js(String),
}

/// Element ids, selectors, class names and timings the behaviors bind to.
///
/// Every field has a default matching the site's markup, so a JS caller
/// only has to pass the keys it wants to change.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BehaviorConfig {
    pub navbar_id: String,
    pub nav_scroll_threshold: f64,
    pub nav_scrolled_class: String,
    pub nav_transparent_class: String,

    pub hamburger_id: String,
    pub mobile_nav_id: String,
    pub mobile_overlay_id: String,
    pub mobile_links_selector: String,
    pub open_class: String,

    pub fade_in_selector: String,
    pub visible_class: String,
    pub fade_in_threshold: f64,
    pub fade_in_root_margin: String,
    pub stagger_step_ms: u32,

    pub faq_item_selector: String,
    pub faq_question_selector: String,
    pub faq_icon_selector: String,
    pub faq_open_glyph: String,
    pub faq_closed_glyph: String,

    pub contact_form_id: String,
    pub form_success_id: String,
    pub email_field_id: String,
    pub email_pattern: String,
    pub error_color: String,
    pub required_message: String,
    pub email_message: String,
    pub sending_label: String,
    pub submit_delay_ms: u32,
    pub success_scroll_margin: f64,

    pub anchor_selector: String,
    pub anchor_margin: f64,

    pub nav_links_selector: String,
    pub active_class: String,
    pub home_page: String,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            navbar_id: "navbar".to_string(),
            nav_scroll_threshold: 60.0,
            nav_scrolled_class: "nav--scrolled".to_string(),
            nav_transparent_class: "nav--transparent".to_string(),

            hamburger_id: "hamburger".to_string(),
            mobile_nav_id: "mobileNav".to_string(),
            mobile_overlay_id: "mobileOverlay".to_string(),
            mobile_links_selector: ".mobile-nav__links a".to_string(),
            open_class: "open".to_string(),

            fade_in_selector: ".fade-in".to_string(),
            visible_class: "visible".to_string(),
            fade_in_threshold: 0.1,
            fade_in_root_margin: "0px 0px -40px 0px".to_string(),
            stagger_step_ms: 80,

            faq_item_selector: ".faq-item".to_string(),
            faq_question_selector: ".faq-item__question".to_string(),
            faq_icon_selector: ".faq-item__icon".to_string(),
            faq_open_glyph: "×".to_string(),
            faq_closed_glyph: "+".to_string(),

            contact_form_id: "contactForm".to_string(),
            form_success_id: "formSuccess".to_string(),
            email_field_id: "email".to_string(),
            email_pattern: r"^[^\s@]+@[^\s@]+\.[^\s@]+$".to_string(),
            error_color: "#c0392b".to_string(),
            required_message: "This field is required.".to_string(),
            email_message: "Please enter a valid email address.".to_string(),
            sending_label: "Sending...".to_string(),
            submit_delay_ms: 1200,
            success_scroll_margin: 100.0,

            anchor_selector: r##"a[href^="#"]"##.to_string(),
            anchor_margin: 20.0,

            nav_links_selector: ".nav__links a".to_string(),
            active_class: "active".to_string(),
            home_page: "index.html".to_string(),
        }
    }
}

impl BehaviorConfig {
    /// Checks the values that would otherwise fail silently at runtime and
    /// compiles the email pattern.
    pub fn validate(&self) -> Result<Regex, ConfigError> {
        let required = [
            ("navScrolledClass", &self.nav_scrolled_class),
            ("navTransparentClass", &self.nav_transparent_class),
            ("openClass", &self.open_class),
            ("visibleClass", &self.visible_class),
            ("activeClass", &self.active_class),
            ("homePage", &self.home_page),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Empty(name));
            }
        }
        if !(0.0..=1.0).contains(&self.fade_in_threshold) {
            return Err(ConfigError::Threshold(self.fade_in_threshold));
        }
        Ok(Regex::new(&self.email_pattern)?)
    }

    #[cfg(target_arch = "wasm32")]
    pub fn from_js(value: wasm_bindgen::JsValue) -> Result<Self, ConfigError> {
        if value.is_undefined() || value.is_null() {
            return Ok(Self::default());
        }
        serde_wasm_bindgen::from_value(value).map_err(|e| ConfigError::Js(e.to_string()))
    }
}
