use wasm_bindgen::JsCast;
use web_sys::Element;

use crate::config;
use crate::resolve;
use crate::store::{AttrMap, BlockStore};
use crate::util;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SyncErrorKind {
    /// Block wrapper, block element, or client id missing above a container.
    Context,
    /// The store has no record for the client id.
    Record,
    /// The page registry is missing or a call across the boundary failed.
    Store,
}

#[derive(Clone, Debug)]
pub(crate) struct SyncError {
    pub kind: SyncErrorKind,
    pub message: String,
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl SyncError {
    pub(crate) fn context(message: impl Into<String>) -> Self {
        Self {
            kind: SyncErrorKind::Context,
            message: message.into(),
        }
    }

    pub(crate) fn record(message: impl Into<String>) -> Self {
        Self {
            kind: SyncErrorKind::Record,
            message: message.into(),
        }
    }

    pub(crate) fn store(message: impl Into<String>) -> Self {
        Self {
            kind: SyncErrorKind::Store,
            message: message.into(),
        }
    }

    pub(crate) fn js(context: &str, e: wasm_bindgen::JsValue) -> Self {
        Self {
            kind: SyncErrorKind::Store,
            message: format!(
                "{context} failed: {}",
                e.as_string().unwrap_or_else(|| format!("{e:?}"))
            ),
        }
    }
}

pub(crate) type SyncResult<T> = Result<T, SyncError>;

/// What a completed synchronization wrote.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SyncOutcome {
    pub client_id: String,
    pub slot: String,
    pub order: Vec<u64>,
    /// Items left out because no strategy resolved them.
    pub skipped: usize,
}

/// Push a container's current visual order into its block record.
///
/// Steps: enumerate equipped items in DOM order, resolve each id, climb to
/// the owning block's client id, read the record, pick the order slot, write
/// the full mapping back. Failing context or record lookup aborts with the
/// error for the caller to log; the DOM keeps its new order either way.
pub(crate) fn sync_container(
    container: &Element,
    store: &dyn BlockStore,
    wrapper_selector: &str,
) -> SyncResult<SyncOutcome> {
    let (order, skipped) = collect_order(container);
    if skipped > 0 {
        util::warn(&format!(
            "postsort: {skipped} item(s) have no resolvable id; they stay visible but are left out of the stored order"
        ));
    }

    let client_id = find_block_client_id(container, wrapper_selector)?;
    write_order(store, &client_id, &order, skipped)
}

/// Ids of all equipped items under `container`, in DOM order. Items that do
/// not resolve are counted and flagged with a marker attribute; items that
/// resolve get a stale marker cleared. Identity is re-derived on every call,
/// never cached, because reorders change what sits where.
pub(crate) fn collect_order(container: &Element) -> (Vec<u64>, usize) {
    let selector = format!("[{}]", config::EQUIPPED_ATTR);
    let Ok(items) = container.query_selector_all(&selector) else {
        return (Vec::new(), 0);
    };

    let mut order = Vec::with_capacity(items.length() as usize);
    let mut skipped = 0;
    for i in 0..items.length() {
        let Some(node) = items.get(i) else {
            continue;
        };
        let Ok(item) = node.dyn_into::<Element>() else {
            continue;
        };
        match resolve::resolve(&item) {
            Some(id) => {
                let _ = item.remove_attribute(config::UNRESOLVED_ATTR);
                order.push(id);
            }
            None => {
                let _ = item.set_attribute(config::UNRESOLVED_ATTR, "true");
                skipped += 1;
            }
        }
    }
    (order, skipped)
}

/// Climb from the container to the block wrapper, then on to the block
/// element carrying the client id.
pub(crate) fn find_block_client_id(
    container: &Element,
    wrapper_selector: &str,
) -> SyncResult<String> {
    let wrapper = container
        .closest(wrapper_selector)
        .map_err(|e| SyncError::js("closest(wrapper)", e))?
        .ok_or_else(|| SyncError::context("no block wrapper above the item container"))?;

    let block_selector = format!("[{}]", config::BLOCK_ID_ATTR);
    let block = wrapper
        .closest(&block_selector)
        .map_err(|e| SyncError::js("closest(block)", e))?
        .ok_or_else(|| SyncError::context("no block element above the wrapper"))?;

    block
        .get_attribute(config::BLOCK_ID_ATTR)
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| SyncError::context("block element has no client id"))
}

/// Store half of the pipeline, DOM-free: read, choose the slot, write.
pub(crate) fn write_order(
    store: &dyn BlockStore,
    client_id: &str,
    order: &[u64],
    skipped: usize,
) -> SyncResult<SyncOutcome> {
    let attributes = store.block_attributes(client_id)?;
    let slot = choose_order_slot(&attributes);
    let next = apply_order(&attributes, slot, order);
    store.update_block_attributes(client_id, next)?;

    Ok(SyncOutcome {
        client_id: client_id.to_string(),
        slot: slot.to_string(),
        order: order.to_vec(),
        skipped,
    })
}

/// First candidate slot present on the record, falling back to the default.
/// A key holding `null` still counts as present; slot identity matters, not
/// the current value shape.
pub(crate) fn choose_order_slot(attributes: &AttrMap) -> &'static str {
    config::ORDER_ATTR_CANDIDATES
        .iter()
        .copied()
        .find(|candidate| attributes.contains_key(*candidate))
        .unwrap_or(config::DEFAULT_ORDER_ATTR)
}

/// Full-replace write: the same mapping with `slot` holding the new
/// sequence. No merging of whatever the slot held before.
pub(crate) fn apply_order(attributes: &AttrMap, slot: &str, order: &[u64]) -> AttrMap {
    let mut next = attributes.clone();
    next.insert(
        slot.to_string(),
        serde_json::Value::Array(order.iter().map(|id| serde_json::Value::from(*id)).collect()),
    );
    next
}
