use wasm_bindgen::{JsCast, JsValue};

use crate::sync::{SyncError, SyncResult};

/// Attribute mapping of one block record.
pub(crate) type AttrMap = serde_json::Map<String, serde_json::Value>;

/// Read/write access to block records. One read and one write per completed
/// reorder; both are synchronous from the caller's perspective.
pub(crate) trait BlockStore {
    fn block_attributes(&self, client_id: &str) -> SyncResult<AttrMap>;
    fn update_block_attributes(&self, client_id: &str, attributes: AttrMap) -> SyncResult<()>;
}

/// Name of the editor data store inside the page registry.
const BLOCK_EDITOR_STORE: &str = "core/block-editor";

/// Production binding to the page's `window.wp.data` registry:
/// `select(...).getBlock(id)` for reads,
/// `dispatch(...).updateBlockAttributes(id, attributes)` for writes.
pub(crate) struct EditorBlockStore;

impl EditorBlockStore {
    fn data_registry() -> SyncResult<JsValue> {
        let Some(window) = web_sys::window() else {
            return Err(SyncError::store("no window"));
        };
        let wp = js_sys::Reflect::get(&window, &"wp".into())
            .map_err(|e| SyncError::js("window.wp", e))?;
        if wp.is_undefined() || wp.is_null() {
            return Err(SyncError::store("window.wp is not available"));
        }
        let data = js_sys::Reflect::get(&wp, &"data".into())
            .map_err(|e| SyncError::js("wp.data", e))?;
        if data.is_undefined() || data.is_null() {
            return Err(SyncError::store("wp.data is not available"));
        }
        Ok(data)
    }

    /// `wp.data.select(...)` or `wp.data.dispatch(...)` for the editor store.
    fn registry_store(method: &str) -> SyncResult<JsValue> {
        let data = Self::data_registry()?;
        let f = js_sys::Reflect::get(&data, &method.into())
            .map_err(|e| SyncError::js(method, e))?
            .dyn_into::<js_sys::Function>()
            .map_err(|_| SyncError::store(format!("wp.data.{method} is not a function")))?;
        let store = f
            .call1(&data, &BLOCK_EDITOR_STORE.into())
            .map_err(|e| SyncError::js(method, e))?;
        if store.is_undefined() || store.is_null() {
            return Err(SyncError::store(format!(
                "{BLOCK_EDITOR_STORE} store is not registered"
            )));
        }
        Ok(store)
    }

    fn store_fn(store: &JsValue, name: &str) -> SyncResult<js_sys::Function> {
        js_sys::Reflect::get(store, &name.into())
            .map_err(|e| SyncError::js(name, e))?
            .dyn_into::<js_sys::Function>()
            .map_err(|_| SyncError::store(format!("{name} is not a function")))
    }
}

impl BlockStore for EditorBlockStore {
    fn block_attributes(&self, client_id: &str) -> SyncResult<AttrMap> {
        let select = Self::registry_store("select")?;
        let get_block = Self::store_fn(&select, "getBlock")?;
        let block = get_block
            .call1(&select, &client_id.into())
            .map_err(|e| SyncError::js("getBlock", e))?;
        if block.is_undefined() || block.is_null() {
            return Err(SyncError::record(format!(
                "no block in the store for client id {client_id}"
            )));
        }
        let attributes = js_sys::Reflect::get(&block, &"attributes".into())
            .map_err(|e| SyncError::js("block.attributes", e))?;
        attr_map_from_js(&attributes)
    }

    fn update_block_attributes(&self, client_id: &str, attributes: AttrMap) -> SyncResult<()> {
        let dispatch = Self::registry_store("dispatch")?;
        let update = Self::store_fn(&dispatch, "updateBlockAttributes")?;
        let js_attributes = attr_map_to_js(&attributes)?;
        update
            .call2(&dispatch, &client_id.into(), &js_attributes)
            .map_err(|e| SyncError::js("updateBlockAttributes", e))?;
        Ok(())
    }
}

// Attribute mappings cross the JS boundary as JSON text. Block attributes
// are plain data by contract, so the round trip is lossless.

fn attr_map_from_js(value: &JsValue) -> SyncResult<AttrMap> {
    if value.is_undefined() || value.is_null() {
        // A block with no attributes yet still accepts a full-replace write.
        return Ok(AttrMap::new());
    }
    let json = js_sys::JSON::stringify(value)
        .map_err(|e| SyncError::js("JSON.stringify(attributes)", e))?;
    serde_json::from_str(&String::from(json))
        .map_err(|e| SyncError::store(format!("could not decode block attributes: {e}")))
}

fn attr_map_to_js(attributes: &AttrMap) -> SyncResult<JsValue> {
    let json = serde_json::to_string(attributes)
        .map_err(|e| SyncError::store(format!("could not encode block attributes: {e}")))?;
    js_sys::JSON::parse(&json).map_err(|e| SyncError::js("JSON.parse(attributes)", e))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::{AttrMap, BlockStore};
    use crate::sync::{SyncError, SyncResult};

    /// In-memory store that records every write, for asserting on what the
    /// synchronizer dispatched (and that it dispatched at all).
    pub(crate) struct RecordingStore {
        blocks: RefCell<HashMap<String, AttrMap>>,
        updates: RefCell<Vec<(String, AttrMap)>>,
    }

    impl RecordingStore {
        pub(crate) fn new() -> Self {
            Self {
                blocks: RefCell::new(HashMap::new()),
                updates: RefCell::new(Vec::new()),
            }
        }

        pub(crate) fn with_block(client_id: &str, attributes: AttrMap) -> Self {
            let store = Self::new();
            store
                .blocks
                .borrow_mut()
                .insert(client_id.to_string(), attributes);
            store
        }

        pub(crate) fn update_count(&self) -> usize {
            self.updates.borrow().len()
        }

        pub(crate) fn last_update(&self) -> Option<(String, AttrMap)> {
            self.updates.borrow().last().cloned()
        }
    }

    impl BlockStore for RecordingStore {
        fn block_attributes(&self, client_id: &str) -> SyncResult<AttrMap> {
            self.blocks.borrow().get(client_id).cloned().ok_or_else(|| {
                SyncError::record(format!("no block in the store for client id {client_id}"))
            })
        }

        fn update_block_attributes(&self, client_id: &str, attributes: AttrMap) -> SyncResult<()> {
            self.blocks
                .borrow_mut()
                .insert(client_id.to_string(), attributes.clone());
            self.updates
                .borrow_mut()
                .push((client_id.to_string(), attributes));
            Ok(())
        }
    }
}
