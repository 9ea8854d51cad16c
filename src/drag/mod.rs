use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use web_sys::{DragEvent, Element};

use crate::config::{self, ScriptConfig};
use crate::store::BlockStore;
use crate::sync;
use crate::util;

/// The one open gesture: which item left its slot, and from which position.
pub(crate) struct DragSession {
    pub source: Element,
    pub source_index: u32,
}

/// Where the source lands relative to the drop target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum InsertPosition {
    Before,
    After,
}

/// Dragging down puts the source after the target; dragging up puts it in
/// front. Combined with the removal implied by reinsertion this is plain
/// "move to the target's position" semantics, no midpoint math needed.
pub(crate) fn insert_position(source_index: u32, target_index: u32) -> InsertPosition {
    if source_index < target_index {
        InsertPosition::After
    } else {
        InsertPosition::Before
    }
}

/// Position among element siblings (text nodes don't count).
pub(crate) fn element_index(el: &Element) -> u32 {
    let mut index = 0;
    let mut cursor = el.previous_element_sibling();
    while let Some(prev) = cursor {
        index += 1;
        cursor = prev.previous_element_sibling();
    }
    index
}

/// Move `source` next to `target` per the index rule. Returns the parent
/// container when the move happened, so the caller can synchronize it.
pub(crate) fn reinsert(source: &Element, source_index: u32, target: &Element) -> Option<Element> {
    let container = target.parent_element()?;
    match insert_position(source_index, element_index(target)) {
        InsertPosition::After => {
            // None appends, which is exactly "after the last item".
            let next = target.next_sibling();
            container.insert_before(source, next.as_ref()).ok()?;
        }
        InsertPosition::Before => {
            container.insert_before(source, Some(target.as_ref())).ok()?;
        }
    }
    Some(container)
}

/// Drag lifecycle handlers plus the session register they share.
///
/// Responsibilities:
/// - transient session state (one slot: opened on dragstart, closed on dragend)
/// - transient visual markers while a gesture is open
/// - the DOM reorder on drop, then handing the container to the synchronizer
///
/// Non-responsibilities:
/// - finding and equipping items (attach)
/// - store access details (store)
#[derive(Clone)]
pub(crate) struct DragController {
    session: Rc<RefCell<Option<DragSession>>>,
    store: Rc<dyn BlockStore>,
    config: Rc<ScriptConfig>,
}

impl DragController {
    pub(crate) fn new(store: Rc<dyn BlockStore>, config: Rc<ScriptConfig>) -> Self {
        Self {
            session: Rc::new(RefCell::new(None)),
            store,
            config,
        }
    }

    fn session_source(&self) -> Option<(Element, u32)> {
        self.session
            .borrow()
            .as_ref()
            .map(|s| (s.source.clone(), s.source_index))
    }

    fn is_source(&self, el: &Element) -> bool {
        self.session
            .borrow()
            .as_ref()
            .map(|s| s.source.is_same_node(Some(el.as_ref())))
            .unwrap_or(false)
    }

    pub(crate) fn on_drag_start(&self, ev: DragEvent) {
        let Some(source) = event_element(&ev) else {
            return;
        };
        if let Some(dt) = ev.data_transfer() {
            dt.set_effect_allowed("move");
            // Some engines only start a native drag once the gesture carries data.
            let _ = dt.set_data("text/html", &source.inner_html());
        }
        self.begin(source);
    }

    /// Open the session: the source item and its index at this instant.
    pub(crate) fn begin(&self, source: Element) {
        if self.session.borrow().is_some() {
            // One pointer delivers dragend before the next dragstart; if a
            // session is still open anyway, replacing beats wedging.
            util::debug("postsort: replacing a drag session that never ended");
        }

        let _ = source.class_list().add_1(config::DRAGGING_CLASS);
        let source_index = element_index(&source);
        *self.session.borrow_mut() = Some(DragSession {
            source,
            source_index,
        });
    }

    pub(crate) fn on_drag_over(&self, ev: DragEvent) {
        // The default on dragover is "not a drop target"; suppress it on
        // every item or drop never fires.
        ev.prevent_default();
        if let Some(dt) = ev.data_transfer() {
            dt.set_drop_effect("move");
        }
    }

    pub(crate) fn on_drag_enter(&self, ev: DragEvent) {
        let Some(item) = event_element(&ev) else {
            return;
        };
        // The source never shows itself as its own drop target.
        if !self.is_source(&item) {
            let _ = item.class_list().add_1(config::DRAG_OVER_CLASS);
        }
    }

    pub(crate) fn on_drag_leave(&self, ev: DragEvent) {
        let Some(item) = event_element(&ev) else {
            return;
        };
        let _ = item.class_list().remove_1(config::DRAG_OVER_CLASS);
    }

    pub(crate) fn on_drop(&self, ev: DragEvent) {
        ev.prevent_default();
        ev.stop_propagation();

        let Some(target) = event_element(&ev) else {
            return;
        };
        self.drop_on(&target);
    }

    /// Land the open session on `target`: reorder the DOM, then push the
    /// container's new order into its block record.
    pub(crate) fn drop_on(&self, target: &Element) {
        let Some((source, source_index)) = self.session_source() else {
            return;
        };
        if source.is_same_node(Some(target.as_ref())) {
            // Order unchanged; the store must not hear about it.
            return;
        }

        let Some(container) = reinsert(&source, source_index, target) else {
            return;
        };

        match sync::sync_container(&container, self.store.as_ref(), &self.config.wrapper_selector)
        {
            Ok(outcome) => util::log(&format!(
                "postsort: wrote {} id(s) to {} on block {}",
                outcome.order.len(),
                outcome.slot,
                outcome.client_id
            )),
            Err(e) => util::warn(&format!("postsort: order not stored: {e}")),
        }
    }

    pub(crate) fn on_drag_end(&self, _ev: DragEvent) {
        self.end();
    }

    /// Close the session and drop every transient marker.
    pub(crate) fn end(&self) {
        // Sweep the whole document, not just the gesture's container; a
        // missed dragleave must not leave a marker behind.
        if let Some(document) = web_sys::window().and_then(|w| w.document()) {
            let selector = format!("[{}]", config::EQUIPPED_ATTR);
            if let Ok(items) = document.query_selector_all(&selector) {
                for i in 0..items.length() {
                    let Some(node) = items.get(i) else {
                        continue;
                    };
                    let Ok(item) = node.dyn_into::<Element>() else {
                        continue;
                    };
                    let _ = item
                        .class_list()
                        .remove_2(config::DRAGGING_CLASS, config::DRAG_OVER_CLASS);
                }
            }
        }
        *self.session.borrow_mut() = None;
    }
}

fn event_element(ev: &DragEvent) -> Option<Element> {
    ev.current_target()?.dyn_into::<Element>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_position_is_after_only_when_dragging_down() {
        assert_eq!(insert_position(0, 1), InsertPosition::After);
        assert_eq!(insert_position(2, 5), InsertPosition::After);

        assert_eq!(insert_position(1, 0), InsertPosition::Before);
        assert_eq!(insert_position(5, 2), InsertPosition::Before);
        assert_eq!(insert_position(3, 3), InsertPosition::Before);
    }
}
