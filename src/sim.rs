//! In-memory page used by the unit tests: a small element tree with a
//! selector matcher, event dispatch with bubbling, a virtual clock and a
//! hand-driven viewport.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

use crate::dom::{
    Dom, EventKind, Handler, IntersectionHandler, IntersectionOptions, Listener, Observation,
    Target, UiEvent,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SimNode(usize);

#[derive(Debug, Default)]
struct NodeData {
    tag: String,
    parent: Option<usize>,
    children: Vec<usize>,
    classes: Vec<String>,
    attrs: BTreeMap<String, String>,
    style: BTreeMap<String, String>,
    text: String,
    value: String,
    checked: bool,
    disabled: bool,
    top: f64,
    height: f64,
}

struct Registration {
    id: u64,
    target: Target<SimNode>,
    kind: EventKind,
    handler: Rc<RefCell<Handler>>,
}

struct ObserverEntry {
    id: u64,
    options: IntersectionOptions,
    targets: Rc<RefCell<Vec<SimNode>>>,
    handler: Rc<RefCell<IntersectionHandler<SimNode>>>,
}

struct PendingTimer {
    due: u64,
    seq: u64,
    callback: Box<dyn FnOnce()>,
}

pub struct SimDom {
    nodes: RefCell<Vec<NodeData>>,
    pathname: RefCell<String>,
    scroll_y: Cell<f64>,
    scroll_requests: RefCell<Vec<f64>>,
    in_view: RefCell<HashSet<SimNode>>,
    listeners: Rc<RefCell<Vec<Registration>>>,
    observers: Rc<RefCell<Vec<ObserverEntry>>>,
    timers: RefCell<Vec<PendingTimer>>,
    clock: Cell<u64>,
    next_id: Cell<u64>,
}

pub const BODY: SimNode = SimNode(0);

impl SimDom {
    pub fn new() -> Rc<Self> {
        let body = NodeData {
            tag: "body".to_string(),
            ..Default::default()
        };
        Rc::new(Self {
            nodes: RefCell::new(vec![body]),
            pathname: RefCell::new("/".to_string()),
            scroll_y: Cell::new(0.0),
            scroll_requests: RefCell::new(Vec::new()),
            in_view: RefCell::new(HashSet::new()),
            listeners: Rc::new(RefCell::new(Vec::new())),
            observers: Rc::new(RefCell::new(Vec::new())),
            timers: RefCell::new(Vec::new()),
            clock: Cell::new(0),
            next_id: Cell::new(1),
        })
    }

    fn fresh_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    // ---- building the page ----

    /// Appends an element under `parent` (the body when `None`). `class`,
    /// `id`, `value` and `checked` attributes also seed the live state.
    pub fn element(&self, parent: Option<SimNode>, tag: &str, attrs: &[(&str, &str)]) -> SimNode {
        let parent = parent.unwrap_or(BODY);
        let mut data = NodeData {
            tag: tag.to_ascii_lowercase(),
            parent: Some(parent.0),
            ..Default::default()
        };
        for (name, value) in attrs {
            match *name {
                "class" => data.classes = value.split_whitespace().map(str::to_string).collect(),
                "value" => data.value = value.to_string(),
                "checked" => data.checked = true,
                _ => {}
            }
            data.attrs.insert(name.to_string(), value.to_string());
        }
        let mut nodes = self.nodes.borrow_mut();
        let id = nodes.len();
        nodes.push(data);
        nodes[parent.0].children.push(id);
        SimNode(id)
    }

    pub fn set_pathname(&self, path: &str) {
        *self.pathname.borrow_mut() = path.to_string();
    }

    pub fn set_layout(&self, node: SimNode, top: f64, height: f64) {
        let mut nodes = self.nodes.borrow_mut();
        nodes[node.0].top = top;
        nodes[node.0].height = height;
    }

    pub fn set_value(&self, node: SimNode, value: &str) {
        self.nodes.borrow_mut()[node.0].value = value.to_string();
    }

    pub fn set_checked(&self, node: SimNode, checked: bool) {
        self.nodes.borrow_mut()[node.0].checked = checked;
    }

    // ---- inspecting the page ----

    pub fn classes(&self, node: SimNode) -> Vec<String> {
        self.nodes.borrow()[node.0].classes.clone()
    }

    pub fn text(&self, node: SimNode) -> String {
        self.nodes.borrow()[node.0].text.clone()
    }

    pub fn style(&self, node: SimNode, property: &str) -> Option<String> {
        self.nodes.borrow()[node.0].style.get(property).cloned()
    }

    pub fn body_style(&self, property: &str) -> Option<String> {
        self.style(BODY, property)
    }

    pub fn is_disabled(&self, node: SimNode) -> bool {
        self.nodes.borrow()[node.0].disabled
    }

    pub fn children(&self, node: SimNode) -> Vec<SimNode> {
        self.nodes.borrow()[node.0].children.iter().copied().map(SimNode).collect()
    }

    pub fn scroll_requests(&self) -> Vec<f64> {
        self.scroll_requests.borrow().clone()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn observed_count(&self) -> usize {
        self.observers
            .borrow()
            .iter()
            .map(|o| o.targets.borrow().len())
            .sum()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.borrow().len()
    }

    pub fn now(&self) -> u64 {
        self.clock.get()
    }

    // ---- driving the page ----

    pub fn dispatch(&self, target: Target<SimNode>, kind: EventKind) -> UiEvent {
        self.dispatch_event(target, kind, UiEvent::new())
    }

    /// Runs handlers on the target, then on each ancestor, the document and
    /// the window, like a bubbling DOM event.
    fn dispatch_event(&self, target: Target<SimNode>, kind: EventKind, event: UiEvent) -> UiEvent {
        let mut path = Vec::new();
        if let Target::Element(node) = &target {
            let mut current = Some(node.0);
            while let Some(id) = current {
                path.push(Target::Element(SimNode(id)));
                current = self.nodes.borrow()[id].parent;
            }
            path.push(Target::Document);
            path.push(Target::Window);
        } else if target == Target::Document {
            path.push(Target::Document);
            path.push(Target::Window);
        } else {
            path.push(Target::Window);
        }

        for hop in path {
            let handlers: Vec<_> = self
                .listeners
                .borrow()
                .iter()
                .filter(|r| r.kind == kind && r.target == hop)
                .map(|r| Rc::clone(&r.handler))
                .collect();
            for handler in handlers {
                (*handler.borrow_mut())(&event);
            }
        }
        event
    }

    pub fn click(&self, node: SimNode) -> UiEvent {
        self.dispatch(Target::Element(node), EventKind::Click)
    }

    pub fn submit(&self, form: SimNode) -> UiEvent {
        self.dispatch(Target::Element(form), EventKind::Submit)
    }

    pub fn key_down(&self, key: &str) -> UiEvent {
        self.dispatch_event(Target::Document, EventKind::KeyDown, UiEvent::with_key(key))
    }

    /// Moves the viewport, fires `scroll` on the window, then delivers
    /// intersection entries.
    pub fn scroll_to(&self, y: f64) {
        self.scroll_y.set(y);
        self.dispatch(Target::Window, EventKind::Scroll);
        self.flush_intersections();
    }

    pub fn set_in_view(&self, node: SimNode, visible: bool) {
        if visible {
            self.in_view.borrow_mut().insert(node);
        } else {
            self.in_view.borrow_mut().remove(&node);
        }
    }

    /// Delivers one entry per observed element that is currently in view.
    pub fn flush_intersections(&self) {
        let batches: Vec<_> = self
            .observers
            .borrow()
            .iter()
            .map(|o| (Rc::clone(&o.targets), Rc::clone(&o.handler)))
            .collect();
        for (targets, handler) in batches {
            let snapshot = targets.borrow().clone();
            for node in snapshot {
                if !self.in_view.borrow().contains(&node) || !targets.borrow().contains(&node) {
                    continue;
                }
                if (*handler.borrow_mut())(&node) == Observation::Stop {
                    targets.borrow_mut().retain(|n| *n != node);
                }
            }
        }
    }

    pub fn observer_options(&self) -> Vec<IntersectionOptions> {
        self.observers.borrow().iter().map(|o| o.options.clone()).collect()
    }

    /// Advances the virtual clock, running due timers in order.
    pub fn advance(&self, ms: u64) {
        let deadline = self.clock.get() + ms;
        loop {
            let next = {
                let mut timers = self.timers.borrow_mut();
                let earliest = timers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due <= deadline)
                    .min_by_key(|(_, t)| (t.due, t.seq))
                    .map(|(i, _)| i);
                earliest.map(|i| timers.remove(i))
            };
            match next {
                Some(timer) => {
                    self.clock.set(timer.due);
                    (timer.callback)();
                }
                None => break,
            }
        }
        self.clock.set(deadline);
    }

    // ---- selectors ----

    fn matches(&self, node: usize, selector: &Selector) -> bool {
        let nodes = self.nodes.borrow();
        let Some((last, ancestors)) = selector.parts.split_last() else {
            return false;
        };
        if !last.matches(&nodes[node]) {
            return false;
        }
        let mut remaining = ancestors.iter().rev().peekable();
        let mut current = nodes[node].parent;
        while let Some(compound) = remaining.peek() {
            match current {
                Some(id) if id != BODY.0 || compound.tag.as_deref() == Some("body") => {
                    if compound.matches(&nodes[id]) {
                        remaining.next();
                    }
                    current = nodes[id].parent;
                }
                _ => return false,
            }
        }
        true
    }

    fn descendants(&self, root: usize) -> Vec<usize> {
        let nodes = self.nodes.borrow();
        let mut out = Vec::new();
        let mut stack: Vec<usize> = nodes[root].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(nodes[id].children.iter().rev().copied());
        }
        out
    }

    fn select(&self, root: usize, selector: &str) -> Option<Vec<SimNode>> {
        let groups = parse_selector_list(selector)?;
        Some(
            self.descendants(root)
                .into_iter()
                .filter(|id| groups.iter().any(|g| self.matches(*id, g)))
                .map(SimNode)
                .collect(),
        )
    }
}

#[derive(Debug, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, AttrTest)>,
}

#[derive(Debug)]
enum AttrTest {
    Present,
    Equals(String),
    Prefix(String),
}

impl Compound {
    fn matches(&self, data: &NodeData) -> bool {
        if self.tag.as_ref().is_some_and(|t| *t != data.tag) {
            return false;
        }
        if self.id.as_ref().is_some_and(|id| data.attrs.get("id") != Some(id)) {
            return false;
        }
        if !self.classes.iter().all(|c| data.classes.contains(c)) {
            return false;
        }
        self.attrs.iter().all(|(name, test)| match (data.attrs.get(name), test) {
            (None, _) => false,
            (Some(_), AttrTest::Present) => true,
            (Some(v), AttrTest::Equals(want)) => v == want,
            (Some(v), AttrTest::Prefix(want)) => v.starts_with(want.as_str()),
        })
    }
}

#[derive(Debug)]
struct Selector {
    parts: Vec<Compound>,
}

fn parse_selector_list(input: &str) -> Option<Vec<Selector>> {
    input.split(',').map(parse_selector).collect()
}

fn parse_selector(input: &str) -> Option<Selector> {
    let parts = input
        .split_whitespace()
        .map(parse_compound)
        .collect::<Option<Vec<_>>>()?;
    if parts.is_empty() {
        return None;
    }
    Some(Selector { parts })
}

fn ident(chars: &[char], mut i: usize) -> (String, usize) {
    let start = i;
    while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '-' || chars[i] == '_') {
        i += 1;
    }
    (chars[start..i].iter().collect(), i)
}

fn parse_compound(input: &str) -> Option<Compound> {
    let chars: Vec<char> = input.chars().collect();
    let mut compound = Compound::default();
    let (tag, mut i) = ident(&chars, 0);
    if !tag.is_empty() {
        compound.tag = Some(tag.to_ascii_lowercase());
    }
    while i < chars.len() {
        match chars[i] {
            '.' | '#' => {
                let (name, next) = ident(&chars, i + 1);
                if name.is_empty() {
                    return None;
                }
                if chars[i] == '.' {
                    compound.classes.push(name);
                } else {
                    compound.id = Some(name);
                }
                i = next;
            }
            '[' => {
                let close = chars[i..].iter().position(|c| *c == ']')? + i;
                let body: String = chars[i + 1..close].iter().collect();
                let unquote = |v: &str| v.trim().trim_matches('"').trim_matches('\'').to_string();
                let attr = if let Some((name, value)) = body.split_once("^=") {
                    (name.trim().to_string(), AttrTest::Prefix(unquote(value)))
                } else if let Some((name, value)) = body.split_once('=') {
                    (name.trim().to_string(), AttrTest::Equals(unquote(value)))
                } else {
                    (body.trim().to_string(), AttrTest::Present)
                };
                if attr.0.is_empty() {
                    return None;
                }
                compound.attrs.push(attr);
                i = close + 1;
            }
            _ => return None,
        }
    }
    Some(compound)
}

impl Dom for SimDom {
    type Node = SimNode;

    fn element_by_id(&self, id: &str) -> Option<SimNode> {
        let nodes = self.nodes.borrow();
        self.descendants(BODY.0)
            .into_iter()
            .find(|n| nodes[*n].attrs.get("id").map(String::as_str) == Some(id))
            .map(SimNode)
    }

    fn query(&self, selector: &str) -> Option<SimNode> {
        self.select(BODY.0, selector)?.into_iter().next()
    }

    fn query_all(&self, selector: &str) -> Vec<SimNode> {
        self.select(BODY.0, selector).unwrap_or_default()
    }

    fn query_within(&self, scope: &SimNode, selector: &str) -> Vec<SimNode> {
        self.select(scope.0, selector).unwrap_or_default()
    }

    fn has_class(&self, node: &SimNode, class: &str) -> bool {
        self.nodes.borrow()[node.0].classes.iter().any(|c| c == class)
    }

    fn set_class(&self, node: &SimNode, class: &str, on: bool) {
        let mut nodes = self.nodes.borrow_mut();
        let classes = &mut nodes[node.0].classes;
        let present = classes.iter().any(|c| c == class);
        if on && !present {
            classes.push(class.to_string());
        } else if !on {
            classes.retain(|c| c != class);
        }
    }

    fn attribute(&self, node: &SimNode, name: &str) -> Option<String> {
        self.nodes.borrow()[node.0].attrs.get(name).cloned()
    }

    fn set_attribute(&self, node: &SimNode, name: &str, value: &str) {
        let mut nodes = self.nodes.borrow_mut();
        let data = &mut nodes[node.0];
        if name == "class" {
            data.classes = value.split_whitespace().map(str::to_string).collect();
        }
        data.attrs.insert(name.to_string(), value.to_string());
    }

    fn text_content(&self, node: &SimNode) -> String {
        self.text(*node)
    }

    fn set_text(&self, node: &SimNode, text: &str) {
        self.nodes.borrow_mut()[node.0].text = text.to_string();
    }

    fn set_style(&self, node: &SimNode, property: &str, value: &str) {
        let mut nodes = self.nodes.borrow_mut();
        let style = &mut nodes[node.0].style;
        if value.is_empty() {
            style.remove(property);
        } else {
            style.insert(property.to_string(), value.to_string());
        }
    }

    fn set_body_style(&self, property: &str, value: &str) {
        self.set_style(&BODY, property, value);
    }

    fn create_element(&self, tag: &str) -> Option<SimNode> {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(NodeData {
            tag: tag.to_ascii_lowercase(),
            ..Default::default()
        });
        Some(SimNode(nodes.len() - 1))
    }

    fn insert_after(&self, anchor: &SimNode, node: &SimNode) {
        self.remove(node);
        let mut nodes = self.nodes.borrow_mut();
        let Some(parent) = nodes[anchor.0].parent else {
            return;
        };
        let siblings = &mut nodes[parent].children;
        let at = siblings.iter().position(|c| *c == anchor.0).map_or(siblings.len(), |p| p + 1);
        siblings.insert(at, node.0);
        nodes[node.0].parent = Some(parent);
    }

    fn remove(&self, node: &SimNode) {
        let mut nodes = self.nodes.borrow_mut();
        if let Some(parent) = nodes[node.0].parent.take() {
            nodes[parent].children.retain(|c| *c != node.0);
        }
    }

    fn sibling_index(&self, node: &SimNode) -> Option<usize> {
        let nodes = self.nodes.borrow();
        let parent = nodes[node.0].parent?;
        nodes[parent].children.iter().position(|c| *c == node.0)
    }

    fn value(&self, node: &SimNode) -> String {
        self.nodes.borrow()[node.0].value.clone()
    }

    fn checked(&self, node: &SimNode) -> bool {
        self.nodes.borrow()[node.0].checked
    }

    fn set_disabled(&self, node: &SimNode, disabled: bool) {
        self.nodes.borrow_mut()[node.0].disabled = disabled;
    }

    fn scroll_y(&self) -> f64 {
        self.scroll_y.get()
    }

    fn smooth_scroll_to(&self, top: f64) {
        self.scroll_requests.borrow_mut().push(top);
    }

    fn offset_height(&self, node: &SimNode) -> f64 {
        self.nodes.borrow()[node.0].height
    }

    fn offset_top(&self, node: &SimNode) -> Option<f64> {
        Some(self.nodes.borrow()[node.0].top)
    }

    fn bounding_top(&self, node: &SimNode) -> f64 {
        self.nodes.borrow()[node.0].top - self.scroll_y.get()
    }

    fn pathname(&self) -> String {
        self.pathname.borrow().clone()
    }

    fn listen(&self, target: Target<SimNode>, kind: EventKind, handler: Handler) -> Listener {
        let id = self.fresh_id();
        self.listeners.borrow_mut().push(Registration {
            id,
            target,
            kind,
            handler: Rc::new(RefCell::new(handler)),
        });
        let listeners = Rc::clone(&self.listeners);
        Listener::new(move || listeners.borrow_mut().retain(|r| r.id != id))
    }

    fn observe_intersections(
        &self,
        options: &IntersectionOptions,
        targets: &[SimNode],
        handler: IntersectionHandler<SimNode>,
    ) -> Listener {
        let id = self.fresh_id();
        self.observers.borrow_mut().push(ObserverEntry {
            id,
            options: options.clone(),
            targets: Rc::new(RefCell::new(targets.to_vec())),
            handler: Rc::new(RefCell::new(handler)),
        });
        let observers = Rc::clone(&self.observers);
        Listener::new(move || observers.borrow_mut().retain(|o| o.id != id))
    }

    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) {
        let seq = self.fresh_id();
        self.timers.borrow_mut().push(PendingTimer {
            due: self.clock.get() + u64::from(delay_ms),
            seq,
            callback,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selectors_follow_document_order() {
        let dom = SimDom::new();
        let nav = dom.element(None, "ul", &[("class", "nav__links")]);
        let a = dom.element(Some(nav), "a", &[("href", "about.html")]);
        let b = dom.element(Some(nav), "a", &[("href", "#faq")]);
        let outside = dom.element(None, "a", &[("href", "#top")]);

        assert_eq!(dom.query_all(".nav__links a"), vec![a, b]);
        assert_eq!(dom.query_all(r##"a[href^="#"]"##), vec![b, outside]);
        assert_eq!(dom.query_all("ul, a[href=\"about.html\"]"), vec![nav, a]);
        assert_eq!(dom.query("#"), None);
        assert!(dom.query_all("").is_empty());
    }

    #[test]
    fn timers_run_in_due_order() {
        let dom = SimDom::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for (delay, tag) in [(30, "c"), (10, "a"), (10, "b")] {
            let log = Rc::clone(&log);
            dom.set_timeout(delay, Box::new(move || log.borrow_mut().push(tag)));
        }
        dom.advance(9);
        assert!(log.borrow().is_empty());
        dom.advance(21);
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
        assert_eq!(dom.now(), 30);
    }

    #[test]
    fn dropping_listener_unregisters() {
        let dom = SimDom::new();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let listener = dom.listen(
            Target::Window,
            EventKind::Scroll,
            Box::new(move |_: &UiEvent| counter.set(counter.get() + 1)),
        );
        dom.scroll_to(10.0);
        drop(listener);
        dom.scroll_to(20.0);
        assert_eq!(hits.get(), 1);
        assert_eq!(dom.listener_count(), 0);
    }
}
