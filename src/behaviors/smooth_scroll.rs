use std::rc::Rc;

use log::{debug, info};

use crate::config::BehaviorConfig;
use crate::dom::{Dom, EventKind, Listener, Target, UiEvent};

/// Scroll position that puts a target `margin` pixels below the navbar.
pub fn anchor_top(bounding_top: f64, scroll_y: f64, navbar_height: Option<f64>, margin: f64) -> f64 {
    let offset = navbar_height.map_or(0.0, |h| h + margin);
    bounding_top + scroll_y - offset
}

pub fn attach<D: Dom>(dom: &Rc<D>, config: &BehaviorConfig, listeners: &mut Vec<Listener>) -> usize {
    let links = dom.query_all(&config.anchor_selector);
    let count = links.len();
    for link in links {
        let d = Rc::clone(dom);
        let href_link = link.clone();
        let navbar_id = config.navbar_id.clone();
        let margin = config.anchor_margin;
        listeners.push(dom.listen(
            Target::Element(link),
            EventKind::Click,
            Box::new(move |event: &UiEvent| {
                let Some(href) = d.attribute(&href_link, "href") else {
                    return;
                };
                // Unknown or malformed fragments keep the browser default.
                let Some(target) = d.query(&href) else {
                    debug!("Anchor {} has no target", href);
                    return;
                };
                event.prevent_default();
                let navbar_height = d.element_by_id(&navbar_id).map(|n| d.offset_height(&n));
                let top = anchor_top(d.bounding_top(&target), d.scroll_y(), navbar_height, margin);
                d.smooth_scroll_to(top);
            }),
        ));
    }
    if count > 0 {
        info!("Smooth scrolling bound to {} anchor links", count);
    }
    count
}
