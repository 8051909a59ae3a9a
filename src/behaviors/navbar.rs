use std::cell::Cell;
use std::rc::Rc;

use log::{debug, info};

use crate::config::BehaviorConfig;
use crate::dom::{Dom, EventKind, Listener, Target, UiEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    Transparent,
    Scrolled,
}

impl NavState {
    /// Strictly above the threshold counts as scrolled.
    pub fn for_offset(scroll_y: f64, threshold: f64) -> Self {
        if scroll_y > threshold {
            NavState::Scrolled
        } else {
            NavState::Transparent
        }
    }
}

pub struct NavBar<D: Dom> {
    dom: Rc<D>,
    navbar: D::Node,
    threshold: f64,
    scrolled_class: String,
    transparent_class: String,
    state: Cell<NavState>,
}

impl<D: Dom> NavBar<D> {
    pub fn attach(dom: &Rc<D>, config: &BehaviorConfig, listeners: &mut Vec<Listener>) -> Option<Rc<Self>> {
        let Some(navbar) = dom.element_by_id(&config.navbar_id) else {
            debug!("No #{} element, navbar scroll state disabled", config.navbar_id);
            return None;
        };

        let nav = Rc::new(Self {
            dom: Rc::clone(dom),
            navbar,
            threshold: config.nav_scroll_threshold,
            scrolled_class: config.nav_scrolled_class.clone(),
            transparent_class: config.nav_transparent_class.clone(),
            state: Cell::new(NavState::Transparent),
        });

        let on_scroll = Rc::clone(&nav);
        listeners.push(dom.listen(
            Target::Window,
            EventKind::Scroll,
            Box::new(move |_: &UiEvent| on_scroll.refresh()),
        ));

        // Initial check
        nav.refresh();
        info!("Navbar scroll state active (threshold {}px)", nav.threshold);
        Some(nav)
    }

    pub fn refresh(&self) {
        let state = NavState::for_offset(self.dom.scroll_y(), self.threshold);
        self.state.set(state);
        let scrolled = state == NavState::Scrolled;
        self.dom.set_class(&self.navbar, &self.scrolled_class, scrolled);
        self.dom.set_class(&self.navbar, &self.transparent_class, !scrolled);
    }

    pub fn state(&self) -> NavState {
        self.state.get()
    }
}
