//! Browser bindings: `WebDom` over web-sys, plus the exported entry points.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use log::{info, warn, Level};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::js_sys;
use web_sys::{
    AddEventListenerOptions, Document, Element, EventTarget, HtmlButtonElement, HtmlElement,
    HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement, IntersectionObserver,
    IntersectionObserverEntry, IntersectionObserverInit, KeyboardEvent, NodeList, ScrollBehavior,
    ScrollToOptions, Window,
};

use crate::config::{BehaviorConfig, ConfigError};
use crate::dom::{
    Dom, EventKind, Handler, IntersectionHandler, IntersectionOptions, Listener, Observation,
    Target, UiEvent,
};
use crate::Behaviors;

pub struct WebDom {
    window: Window,
    document: Document,
}

impl WebDom {
    pub fn new() -> Option<Self> {
        let window = web_sys::window()?;
        let document = window.document()?;
        Some(Self { window, document })
    }

    fn event_target(&self, target: Target<Element>) -> EventTarget {
        match target {
            Target::Window => self.window.clone().into(),
            Target::Document => self.document.clone().into(),
            Target::Element(element) => element.into(),
        }
    }

    fn style_of(node: &Element, property: &str, value: &str) {
        let Some(html) = node.dyn_ref::<HtmlElement>() else {
            return;
        };
        let style = html.style();
        let result = if value.is_empty() {
            style.remove_property(property).map(|_| ())
        } else {
            style.set_property(property, value)
        };
        if let Err(e) = result {
            warn!("Failed to set style {}: {:?}", property, e);
        }
    }
}

fn elements(list: Result<NodeList, JsValue>) -> Vec<Element> {
    let Ok(list) = list else {
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

impl Dom for WebDom {
    type Node = Element;

    fn element_by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn query(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).ok().flatten()
    }

    fn query_all(&self, selector: &str) -> Vec<Element> {
        elements(self.document.query_selector_all(selector))
    }

    fn query_within(&self, scope: &Element, selector: &str) -> Vec<Element> {
        elements(scope.query_selector_all(selector))
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn set_class(&self, node: &Element, class: &str, on: bool) {
        let _ = node.class_list().toggle_with_force(class, on);
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_attribute(&self, node: &Element, name: &str, value: &str) {
        let _ = node.set_attribute(name, value);
    }

    fn text_content(&self, node: &Element) -> String {
        node.text_content().unwrap_or_default()
    }

    fn set_text(&self, node: &Element, text: &str) {
        node.set_text_content(Some(text));
    }

    fn set_style(&self, node: &Element, property: &str, value: &str) {
        Self::style_of(node, property, value);
    }

    fn set_body_style(&self, property: &str, value: &str) {
        if let Some(body) = self.document.body() {
            Self::style_of(&body, property, value);
        }
    }

    fn create_element(&self, tag: &str) -> Option<Element> {
        self.document.create_element(tag).ok()
    }

    fn insert_after(&self, anchor: &Element, node: &Element) {
        let _ = anchor.after_with_node_1(node);
    }

    fn remove(&self, node: &Element) {
        node.remove();
    }

    fn sibling_index(&self, node: &Element) -> Option<usize> {
        let children = node.parent_element()?.children();
        (0..children.length()).position(|i| children.item(i).as_ref() == Some(node))
    }

    fn value(&self, node: &Element) -> String {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.value()
        } else if let Some(select) = node.dyn_ref::<HtmlSelectElement>() {
            select.value()
        } else if let Some(area) = node.dyn_ref::<HtmlTextAreaElement>() {
            area.value()
        } else {
            node.get_attribute("value").unwrap_or_default()
        }
    }

    fn checked(&self, node: &Element) -> bool {
        node.dyn_ref::<HtmlInputElement>().is_some_and(|i| i.checked())
    }

    fn set_disabled(&self, node: &Element, disabled: bool) {
        if let Some(button) = node.dyn_ref::<HtmlButtonElement>() {
            button.set_disabled(disabled);
        } else if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.set_disabled(disabled);
        } else if disabled {
            let _ = node.set_attribute("disabled", "");
        } else {
            let _ = node.remove_attribute("disabled");
        }
    }

    fn scroll_y(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }

    fn smooth_scroll_to(&self, top: f64) {
        let options = ScrollToOptions::new();
        options.set_top(top);
        options.set_behavior(ScrollBehavior::Smooth);
        self.window.scroll_to_with_scroll_to_options(&options);
    }

    fn offset_height(&self, node: &Element) -> f64 {
        node.dyn_ref::<HtmlElement>()
            .map_or(0.0, |h| f64::from(h.offset_height()))
    }

    fn offset_top(&self, node: &Element) -> Option<f64> {
        node.dyn_ref::<HtmlElement>().map(|h| f64::from(h.offset_top()))
    }

    fn bounding_top(&self, node: &Element) -> f64 {
        node.get_bounding_client_rect().top()
    }

    fn pathname(&self) -> String {
        self.window.location().pathname().unwrap_or_default()
    }

    fn listen(&self, target: Target<Element>, kind: EventKind, mut handler: Handler) -> Listener {
        let target = self.event_target(target);
        let callback = Closure::wrap(Box::new(move |event: web_sys::Event| {
            let ui = match event.dyn_ref::<KeyboardEvent>() {
                Some(key) => UiEvent::with_key(&key.key()),
                None => UiEvent::new(),
            };
            handler(&ui);
            if ui.default_prevented() {
                event.prevent_default();
            }
        }) as Box<dyn FnMut(web_sys::Event)>);

        let options = AddEventListenerOptions::new();
        options.set_passive(kind.passive());
        if let Err(e) = target.add_event_listener_with_callback_and_add_event_listener_options(
            kind.as_str(),
            callback.as_ref().unchecked_ref(),
            &options,
        ) {
            warn!("Failed to listen for {}: {:?}", kind.as_str(), e);
            return Listener::inert();
        }

        Listener::new(move || {
            let _ = target.remove_event_listener_with_callback(
                kind.as_str(),
                callback.as_ref().unchecked_ref(),
            );
        })
    }

    fn observe_intersections(
        &self,
        options: &IntersectionOptions,
        targets: &[Element],
        mut handler: IntersectionHandler<Element>,
    ) -> Listener {
        let callback = Closure::wrap(Box::new(
            move |entries: js_sys::Array, observer: IntersectionObserver| {
                for entry in entries.iter() {
                    let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                        continue;
                    };
                    if !entry.is_intersecting() {
                        continue;
                    }
                    let target = entry.target();
                    if handler(&target) == Observation::Stop {
                        observer.unobserve(&target);
                    }
                }
            },
        ) as Box<dyn FnMut(js_sys::Array, IntersectionObserver)>);

        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(options.threshold));
        init.set_root_margin(&options.root_margin);
        let observer = match IntersectionObserver::new_with_options(
            callback.as_ref().unchecked_ref(),
            &init,
        ) {
            Ok(observer) => observer,
            Err(e) => {
                warn!("IntersectionObserver unavailable: {:?}", e);
                return Listener::inert();
            }
        };
        for target in targets {
            observer.observe(target);
        }

        Listener::new(move || {
            observer.disconnect();
            drop(callback);
        })
    }

    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) {
        Timeout::new(delay_ms, callback).forget();
    }
}

thread_local! {
    static ACTIVE: RefCell<Option<Behaviors<WebDom>>> = const { RefCell::new(None) };
}

fn install(config: BehaviorConfig) -> Result<(), ConfigError> {
    teardown();
    let Some(dom) = WebDom::new() else {
        warn!("No window/document, page behaviors not started");
        return Ok(());
    };
    let page = crate::init(&Rc::new(dom), &config)?;
    ACTIVE.with(|active| *active.borrow_mut() = Some(page));
    Ok(())
}

/// Runs `f` once the document has been parsed.
fn when_ready(f: impl FnOnce() + 'static) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    if document.ready_state() != "loading" {
        f();
        return;
    }
    let callback = Closure::once_into_js(f);
    if let Err(e) = document.add_event_listener_with_callback("DOMContentLoaded", callback.unchecked_ref()) {
        warn!("Failed to wait for DOMContentLoaded: {:?}", e);
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    // Initialize console error panic hook for better error messages
    console_error_panic_hook::set_once();

    if console_log::init_with_level(Level::Info).is_err() {
        warn!("Logger already initialized");
    }

    info!("Starting page behaviors");
    when_ready(|| {
        if let Err(e) = install(BehaviorConfig::default()) {
            warn!("Page behaviors not started: {}", e);
        }
    });
}

/// Re-binds every behavior with settings from a JS object; omitted keys keep
/// their defaults.
#[wasm_bindgen(js_name = initWithConfig)]
pub fn init_with_config(config: JsValue) -> Result<(), JsValue> {
    let config = BehaviorConfig::from_js(config).map_err(|e| JsValue::from_str(&e.to_string()))?;
    install(config).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[wasm_bindgen]
pub fn teardown() {
    let previous = ACTIVE.with(|active| active.borrow_mut().take());
    if let Some(page) = previous {
        page.dispose();
    }
}
