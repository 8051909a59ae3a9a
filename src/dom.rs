//! The slice of the browser the behaviors need.
//!
//! Every lookup returns an `Option`/empty list instead of failing, so a page
//! missing part of the markup just leaves the matching behavior inert.

use std::cell::Cell;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Scroll,
    Click,
    Submit,
    KeyDown,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Scroll => "scroll",
            EventKind::Click => "click",
            EventKind::Submit => "submit",
            EventKind::KeyDown => "keydown",
        }
    }

    /// Scroll handlers never cancel, so the browser can keep scrolling off
    /// the main thread.
    pub fn passive(self) -> bool {
        matches!(self, EventKind::Scroll)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Target<N> {
    Window,
    Document,
    Element(N),
}

/// What a handler sees of the event that triggered it.
#[derive(Debug, Default)]
pub struct UiEvent {
    key: Option<String>,
    default_prevented: Cell<bool>,
}

impl UiEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(key: &str) -> Self {
        Self {
            key: Some(key.to_string()),
            default_prevented: Cell::new(false),
        }
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

pub type Handler = Box<dyn FnMut(&UiEvent)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    Keep,
    Stop,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionOptions {
    pub threshold: f64,
    pub root_margin: String,
}

/// Called once per intersecting entry; returning `Stop` unobserves that
/// element before any later entry can be delivered for it.
pub type IntersectionHandler<N> = Box<dyn FnMut(&N) -> Observation>;

/// Registration guard. Dropping it removes the listener or disconnects the
/// observer.
pub struct Listener {
    release: Option<Box<dyn FnOnce()>>,
}

impl Listener {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    pub fn inert() -> Self {
        Self { release: None }
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

pub trait Dom: 'static {
    type Node: Clone + PartialEq + 'static;

    fn element_by_id(&self, id: &str) -> Option<Self::Node>;
    /// Returns `None` both for no match and for a selector the browser
    /// rejects.
    fn query(&self, selector: &str) -> Option<Self::Node>;
    fn query_all(&self, selector: &str) -> Vec<Self::Node>;
    fn query_within(&self, scope: &Self::Node, selector: &str) -> Vec<Self::Node>;

    fn has_class(&self, node: &Self::Node, class: &str) -> bool;
    fn set_class(&self, node: &Self::Node, class: &str, on: bool);
    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;
    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);
    fn text_content(&self, node: &Self::Node) -> String;
    fn set_text(&self, node: &Self::Node, text: &str);
    /// An empty `value` clears the inline property.
    fn set_style(&self, node: &Self::Node, property: &str, value: &str);
    fn set_body_style(&self, property: &str, value: &str);

    fn create_element(&self, tag: &str) -> Option<Self::Node>;
    fn insert_after(&self, anchor: &Self::Node, node: &Self::Node);
    fn remove(&self, node: &Self::Node);
    /// Position among the parent's element children, `None` without a parent.
    fn sibling_index(&self, node: &Self::Node) -> Option<usize>;

    /// Live form value of an input, select or textarea.
    fn value(&self, node: &Self::Node) -> String;
    fn checked(&self, node: &Self::Node) -> bool;
    fn set_disabled(&self, node: &Self::Node, disabled: bool);

    fn scroll_y(&self) -> f64;
    fn smooth_scroll_to(&self, top: f64);
    fn offset_height(&self, node: &Self::Node) -> f64;
    fn offset_top(&self, node: &Self::Node) -> Option<f64>;
    fn bounding_top(&self, node: &Self::Node) -> f64;
    fn pathname(&self) -> String;

    fn listen(&self, target: Target<Self::Node>, kind: EventKind, handler: Handler) -> Listener;
    fn observe_intersections(
        &self,
        options: &IntersectionOptions,
        targets: &[Self::Node],
        handler: IntersectionHandler<Self::Node>,
    ) -> Listener;
    /// Fire-and-forget, there is no cancellation path.
    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>);
}
