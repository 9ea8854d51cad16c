use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{Document, DragEvent, Element, HtmlElement};

use crate::config::{self, ScriptConfig};
use crate::drag::DragController;
use crate::util;

/// Finds list items and equips them for dragging.
///
/// All equipped items share the same six handler functions, built once per
/// manager; the manager (and with it the closures) lives for the page
/// lifetime, so items never need unbinding.
pub(crate) struct AttachmentManager {
    config: Rc<ScriptConfig>,
    handlers: DragHandlers,
}

struct DragHandlers {
    start: Closure<dyn FnMut(DragEvent)>,
    over: Closure<dyn FnMut(DragEvent)>,
    enter: Closure<dyn FnMut(DragEvent)>,
    leave: Closure<dyn FnMut(DragEvent)>,
    drop: Closure<dyn FnMut(DragEvent)>,
    end: Closure<dyn FnMut(DragEvent)>,
}

impl DragHandlers {
    fn new(controller: DragController) -> Self {
        let c = controller.clone();
        let start =
            Closure::wrap(Box::new(move |ev: DragEvent| c.on_drag_start(ev)) as Box<dyn FnMut(_)>);
        let c = controller.clone();
        let over =
            Closure::wrap(Box::new(move |ev: DragEvent| c.on_drag_over(ev)) as Box<dyn FnMut(_)>);
        let c = controller.clone();
        let enter =
            Closure::wrap(Box::new(move |ev: DragEvent| c.on_drag_enter(ev)) as Box<dyn FnMut(_)>);
        let c = controller.clone();
        let leave =
            Closure::wrap(Box::new(move |ev: DragEvent| c.on_drag_leave(ev)) as Box<dyn FnMut(_)>);
        let c = controller.clone();
        let drop =
            Closure::wrap(Box::new(move |ev: DragEvent| c.on_drop(ev)) as Box<dyn FnMut(_)>);
        let end = Closure::wrap(
            Box::new(move |ev: DragEvent| controller.on_drag_end(ev)) as Box<dyn FnMut(_)>
        );

        Self {
            start,
            over,
            enter,
            leave,
            drop,
            end,
        }
    }

    fn bindings(&self) -> [(&'static str, &js_sys::Function); 6] {
        [
            ("dragstart", self.start.as_ref().unchecked_ref()),
            ("dragover", self.over.as_ref().unchecked_ref()),
            ("dragenter", self.enter.as_ref().unchecked_ref()),
            ("dragleave", self.leave.as_ref().unchecked_ref()),
            ("drop", self.drop.as_ref().unchecked_ref()),
            ("dragend", self.end.as_ref().unchecked_ref()),
        ]
    }
}

impl AttachmentManager {
    pub(crate) fn new(config: Rc<ScriptConfig>, controller: DragController) -> Self {
        Self {
            config,
            handlers: DragHandlers::new(controller),
        }
    }

    /// Equip every matching item that is not equipped yet. Returns how many
    /// items were newly equipped; safe to call any number of times.
    pub(crate) fn equip_all(&self, document: &Document) -> usize {
        let selector = self.config.item_selector();
        let Ok(items) = document.query_selector_all(&selector) else {
            util::warn(&format!("postsort: bad item selector: {selector}"));
            return 0;
        };

        let mut equipped = 0;
        for i in 0..items.length() {
            let Some(node) = items.get(i) else {
                continue;
            };
            let Ok(item) = node.dyn_into::<Element>() else {
                continue;
            };
            if self.equip(&item) {
                equipped += 1;
            }
        }
        if equipped > 0 {
            util::debug(&format!("postsort: equipped {equipped} item(s)"));
        }
        equipped
    }

    fn equip(&self, item: &Element) -> bool {
        if item.has_attribute(config::EQUIPPED_ATTR) {
            return false;
        }

        let _ = item.set_attribute(config::EQUIPPED_ATTR, "true");
        let _ = item.set_attribute("draggable", "true");
        if let Some(html) = item.dyn_ref::<HtmlElement>() {
            let _ = html.style().set_property("cursor", "move");
        }

        for (event, handler) in self.handlers.bindings() {
            let _ = item.add_event_listener_with_callback(event, handler);
        }
        true
    }
}
