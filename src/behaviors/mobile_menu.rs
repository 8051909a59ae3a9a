use std::cell::Cell;
use std::rc::Rc;

use log::{debug, info};

use crate::config::BehaviorConfig;
use crate::dom::{Dom, EventKind, Listener, Target, UiEvent};

pub struct MobileMenu<D: Dom> {
    dom: Rc<D>,
    toggle: Option<D::Node>,
    panel: Option<D::Node>,
    overlay: Option<D::Node>,
    open_class: String,
    open: Cell<bool>,
}

impl<D: Dom> MobileMenu<D> {
    pub fn attach(dom: &Rc<D>, config: &BehaviorConfig, listeners: &mut Vec<Listener>) -> Option<Rc<Self>> {
        let toggle = dom.element_by_id(&config.hamburger_id);
        let panel = dom.element_by_id(&config.mobile_nav_id);
        let overlay = dom.element_by_id(&config.mobile_overlay_id);
        if toggle.is_none() && panel.is_none() {
            debug!("No mobile menu markup, menu behavior disabled");
            return None;
        }

        let open = panel
            .as_ref()
            .is_some_and(|p| dom.has_class(p, &config.open_class));
        let menu = Rc::new(Self {
            dom: Rc::clone(dom),
            toggle,
            panel,
            overlay,
            open_class: config.open_class.clone(),
            open: Cell::new(open),
        });

        if let Some(toggle) = &menu.toggle {
            let m = Rc::clone(&menu);
            listeners.push(dom.listen(
                Target::Element(toggle.clone()),
                EventKind::Click,
                Box::new(move |_: &UiEvent| m.toggle()),
            ));
        }

        if let Some(overlay) = &menu.overlay {
            let m = Rc::clone(&menu);
            listeners.push(dom.listen(
                Target::Element(overlay.clone()),
                EventKind::Click,
                Box::new(move |_: &UiEvent| m.close()),
            ));
        }

        // Close menu on link click
        for link in dom.query_all(&config.mobile_links_selector) {
            let m = Rc::clone(&menu);
            listeners.push(dom.listen(Target::Element(link), EventKind::Click, Box::new(move |_: &UiEvent| m.close())));
        }

        let m = Rc::clone(&menu);
        listeners.push(dom.listen(
            Target::Document,
            EventKind::KeyDown,
            Box::new(move |event: &UiEvent| {
                if event.key() == Some("Escape") {
                    m.close();
                }
            }),
        ));

        info!("Mobile menu active");
        Some(menu)
    }

    pub fn is_open(&self) -> bool {
        self.open.get()
    }

    pub fn toggle(&self) {
        if self.open.get() {
            self.close();
        } else {
            self.open();
        }
    }

    pub fn open(&self) {
        self.open.set(true);
        self.render();
    }

    /// Safe to call while already closed; the scroll lock and
    /// `aria-expanded` are still reset.
    pub fn close(&self) {
        self.open.set(false);
        self.render();
    }

    fn render(&self) {
        let open = self.open.get();
        for node in [&self.panel, &self.overlay].into_iter().flatten() {
            self.dom.set_class(node, &self.open_class, open);
        }
        self.dom.set_body_style("overflow", if open { "hidden" } else { "" });
        if let Some(toggle) = &self.toggle {
            self.dom
                .set_attribute(toggle, "aria-expanded", if open { "true" } else { "false" });
        }
    }
}
