use std::cell::Cell;
use std::rc::Rc;

use log::{debug, info};

use crate::config::BehaviorConfig;
use crate::dom::{Dom, EventKind, Listener, Target, UiEvent};

struct FaqItem<N> {
    item: N,
    icon: Option<N>,
}

/// Accordion over the page's FAQ items: at most one open at a time.
pub struct FaqAccordion<D: Dom> {
    dom: Rc<D>,
    items: Vec<FaqItem<D::Node>>,
    open_class: String,
    open_glyph: String,
    closed_glyph: String,
    open: Cell<Option<usize>>,
}

/// Next open item after a click on `clicked`.
pub fn next_open(current: Option<usize>, clicked: usize) -> Option<usize> {
    if current == Some(clicked) {
        None
    } else {
        Some(clicked)
    }
}

impl<D: Dom> FaqAccordion<D> {
    pub fn attach(dom: &Rc<D>, config: &BehaviorConfig, listeners: &mut Vec<Listener>) -> Option<Rc<Self>> {
        let nodes = dom.query_all(&config.faq_item_selector);
        if nodes.is_empty() {
            debug!("No {} elements, FAQ accordion disabled", config.faq_item_selector);
            return None;
        }

        let items: Vec<_> = nodes
            .into_iter()
            .map(|item| {
                let icon = dom.query_within(&item, &config.faq_icon_selector).into_iter().next();
                FaqItem { item, icon }
            })
            .collect();
        let open = items
            .iter()
            .position(|i| dom.has_class(&i.item, &config.open_class));

        let faq = Rc::new(Self {
            dom: Rc::clone(dom),
            items,
            open_class: config.open_class.clone(),
            open_glyph: config.faq_open_glyph.clone(),
            closed_glyph: config.faq_closed_glyph.clone(),
            open: Cell::new(open),
        });
        faq.render();

        for (index, entry) in faq.items.iter().enumerate() {
            let Some(question) = dom
                .query_within(&entry.item, &config.faq_question_selector)
                .into_iter()
                .next()
            else {
                continue;
            };
            let f = Rc::clone(&faq);
            listeners.push(dom.listen(
                Target::Element(question),
                EventKind::Click,
                Box::new(move |_: &UiEvent| f.click(index)),
            ));
        }

        info!("FAQ accordion active over {} items", faq.items.len());
        Some(faq)
    }

    pub fn click(&self, index: usize) {
        let next = next_open(self.open.get(), index);
        debug!("FAQ item {} clicked, open item now {:?}", index, next);
        self.open.set(next);
        self.render();
    }

    pub fn open_item(&self) -> Option<usize> {
        self.open.get()
    }

    fn render(&self) {
        let open = self.open.get();
        for (index, entry) in self.items.iter().enumerate() {
            let is_open = open == Some(index);
            self.dom.set_class(&entry.item, &self.open_class, is_open);
            if let Some(icon) = &entry.icon {
                let glyph = if is_open { &self.open_glyph } else { &self.closed_glyph };
                self.dom.set_text(icon, glyph);
            }
        }
    }
}
