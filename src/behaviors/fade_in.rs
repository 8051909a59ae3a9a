use std::cell::Cell;
use std::rc::Rc;

use log::{debug, info};

use crate::config::BehaviorConfig;
use crate::dom::{Dom, IntersectionOptions, Listener, Observation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reveal {
    Pending,
    Scheduled,
    Visible,
}

/// Delay before revealing the element at `sibling_index` within its parent.
pub fn stagger_delay(sibling_index: usize, step_ms: u32) -> u32 {
    u32::try_from(sibling_index)
        .unwrap_or(u32::MAX)
        .saturating_mul(step_ms)
}

struct Watched<N> {
    node: N,
    state: Rc<Cell<Reveal>>,
}

pub struct FadeIn<D: Dom> {
    targets: Vec<Watched<D::Node>>,
}

impl<D: Dom> FadeIn<D> {
    pub fn attach(dom: &Rc<D>, config: &BehaviorConfig, listeners: &mut Vec<Listener>) -> Option<Rc<Self>> {
        let nodes = dom.query_all(&config.fade_in_selector);
        if nodes.is_empty() {
            debug!("No {} elements, fade-in disabled", config.fade_in_selector);
            return None;
        }

        let fade = Rc::new(Self {
            targets: nodes
                .iter()
                .map(|node| Watched {
                    node: node.clone(),
                    state: Rc::new(Cell::new(Reveal::Pending)),
                })
                .collect(),
        });

        let options = IntersectionOptions {
            threshold: config.fade_in_threshold,
            root_margin: config.fade_in_root_margin.clone(),
        };
        let handler_dom = Rc::clone(dom);
        let handler_fade = Rc::clone(&fade);
        let visible_class = config.visible_class.clone();
        let step = config.stagger_step_ms;
        listeners.push(dom.observe_intersections(
            &options,
            &nodes,
            Box::new(move |node: &D::Node| {
                let Some(state) = handler_fade.state_cell(node) else {
                    return Observation::Stop;
                };
                if state.get() != Reveal::Pending {
                    return Observation::Stop;
                }
                state.set(Reveal::Scheduled);

                // Stagger follows DOM position among all siblings, not only
                // the fade-in ones.
                let index = handler_dom.sibling_index(node).unwrap_or(0);
                let delay = stagger_delay(index, step);
                let dom = Rc::clone(&handler_dom);
                let node = node.clone();
                let class = visible_class.clone();
                handler_dom.set_timeout(
                    delay,
                    Box::new(move || {
                        dom.set_class(&node, &class, true);
                        state.set(Reveal::Visible);
                    }),
                );
                Observation::Stop
            }),
        ));

        info!("Fade-in watching {} elements", fade.targets.len());
        Some(fade)
    }

    fn state_cell(&self, node: &D::Node) -> Option<Rc<Cell<Reveal>>> {
        self.targets
            .iter()
            .find(|t| t.node == *node)
            .map(|t| Rc::clone(&t.state))
    }

    pub fn state(&self, node: &D::Node) -> Option<Reveal> {
        self.state_cell(node).map(|s| s.get())
    }
}
