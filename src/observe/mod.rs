use std::cell::Cell;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{Document, MutationObserver, MutationObserverInit, MutationRecord};

use crate::attach::AttachmentManager;
use crate::config::ScriptConfig;
use crate::util;

/// Equip now, or once the document finishes parsing.
pub(crate) fn start(config: Rc<ScriptConfig>, manager: Rc<AttachmentManager>) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        util::warn("postsort: no document; drag ordering disabled");
        return;
    };

    if document.ready_state() == "loading" {
        let doc = document.clone();
        let cb = Closure::once_into_js(move || boot(&doc, &config, &manager));
        let _ = document.add_event_listener_with_callback("DOMContentLoaded", cb.unchecked_ref());
    } else {
        boot(&document, &config, &manager);
    }
}

fn boot(document: &Document, config: &Rc<ScriptConfig>, manager: &Rc<AttachmentManager>) {
    manager.equip_all(document);
    observe_editor(document, config, manager);
    schedule_rescans(document, config, manager);

    // The manager owns the handler closures bound to equipped items. With no
    // editor root and the re-scan window disabled, neither long-lived closure
    // holds a clone, so leak one handle; the handlers must live as long as
    // the page.
    std::mem::forget(Rc::clone(manager));
}

/// Re-equip whenever nodes land under the editing-surface root.
fn observe_editor(document: &Document, config: &Rc<ScriptConfig>, manager: &Rc<AttachmentManager>) {
    let root = match document.query_selector(&config.editor_root) {
        Ok(Some(root)) => root,
        _ => {
            util::debug(&format!(
                "postsort: editor root {} not found; relying on the re-scan window",
                config.editor_root
            ));
            return;
        }
    };

    let doc = document.clone();
    let mgr = Rc::clone(manager);
    let cb = Closure::wrap(Box::new(
        move |records: js_sys::Array, _observer: MutationObserver| {
            let added = records.iter().any(|record| {
                record
                    .dyn_ref::<MutationRecord>()
                    .map(|r| r.added_nodes().length() > 0)
                    .unwrap_or(false)
            });
            if added {
                mgr.equip_all(&doc);
            }
        },
    ) as Box<dyn FnMut(js_sys::Array, MutationObserver)>);

    let Ok(observer) = MutationObserver::new(cb.as_ref().unchecked_ref()) else {
        util::warn("postsort: could not create a mutation observer");
        return;
    };

    let init = MutationObserverInit::new();
    init.set_child_list(true);
    init.set_subtree(true);
    if observer.observe_with_options(&root, &init).is_err() {
        util::warn("postsort: could not observe the editor root");
        return;
    }

    // Observer callback lives as long as the page.
    cb.forget();
}

/// One self-cancelling interval covers content that renders after load but
/// outside the observed subtree. Extra passes are harmless; equipping is
/// idempotent.
fn schedule_rescans(
    document: &Document,
    config: &Rc<ScriptConfig>,
    manager: &Rc<AttachmentManager>,
) {
    if config.rescan_interval_ms <= 0 || config.rescan_window_ms <= 0 {
        return;
    }
    let Some(window) = web_sys::window() else {
        return;
    };

    let ticks = (config.rescan_window_ms / config.rescan_interval_ms).max(1);
    let ticks_left = Rc::new(Cell::new(ticks));
    let timer_id = Rc::new(Cell::new(0));

    let doc = document.clone();
    let mgr = Rc::clone(manager);
    let ticks2 = Rc::clone(&ticks_left);
    let timer2 = Rc::clone(&timer_id);
    let cb = Closure::wrap(Box::new(move || {
        mgr.equip_all(&doc);
        ticks2.set(ticks2.get() - 1);
        if ticks2.get() <= 0 {
            if let Some(win) = web_sys::window() {
                win.clear_interval_with_handle(timer2.get());
            }
        }
    }) as Box<dyn FnMut()>);

    let tid = window
        .set_interval_with_callback_and_timeout_and_arguments_0(
            cb.as_ref().unchecked_ref(),
            config.rescan_interval_ms,
        )
        .unwrap_or(0);
    timer_id.set(tid);

    // The interval clears itself; the closure stays alive with the page.
    cb.forget();
}
