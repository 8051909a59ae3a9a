use std::rc::Rc;

use log::info;

use crate::config::BehaviorConfig;
use crate::dom::Dom;

/// Last `/` segment of a path or href, `home` when there is none.
pub fn page_name<'a>(path: &'a str, home: &'a str) -> &'a str {
    match path.rsplit('/').next() {
        Some(name) if !name.is_empty() => name,
        _ => home,
    }
}

/// Marks the primary nav links pointing at the current page. Runs once.
pub fn mark<D: Dom>(dom: &Rc<D>, config: &BehaviorConfig) -> usize {
    let pathname = dom.pathname();
    let current = page_name(&pathname, &config.home_page);
    let mut marked = 0;
    for link in dom.query_all(&config.nav_links_selector) {
        let Some(href) = dom.attribute(&link, "href") else {
            continue;
        };
        if page_name(&href, &config.home_page) == current {
            dom.set_class(&link, &config.active_class, true);
            marked += 1;
        }
    }
    info!("Current page {}, {} nav links marked active", current, marked);
    marked
}
