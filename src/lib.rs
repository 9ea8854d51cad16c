//! Drag-and-drop ordering for the block editor's manual post lists.
//!
//! Equips every "manual post" list item with drag handlers, reorders the DOM
//! on drop, and writes the resulting id sequence back into the owning block's
//! order attribute through the page's `wp.data` registry.

mod attach;
mod config;
mod drag;
mod observe;
mod resolve;
mod store;
mod sync;
mod util;

use std::rc::Rc;

use crate::attach::AttachmentManager;
use crate::config::ScriptConfig;
use crate::drag::DragController;
use crate::store::{BlockStore, EditorBlockStore};

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();

    let config = Rc::new(ScriptConfig::load());
    let store: Rc<dyn BlockStore> = Rc::new(EditorBlockStore);
    let controller = DragController::new(store, Rc::clone(&config));
    let manager = Rc::new(AttachmentManager::new(Rc::clone(&config), controller));

    observe::start(config, manager);
}
