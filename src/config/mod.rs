use serde::{Deserialize, Serialize};

/// Marker attribute set on every equipped item. Its presence is the
/// idempotence guard: an item carrying it is never equipped twice.
pub(crate) const EQUIPPED_ATTR: &str = "data-drag-enabled";

/// Transient class on the item being dragged.
pub(crate) const DRAGGING_CLASS: &str = "dragging";

/// Transient class on the item currently under the pointer.
pub(crate) const DRAG_OVER_CLASS: &str = "drag-over";

/// Marker attribute on items the resolver could not map to a record id.
pub(crate) const UNRESOLVED_ATTR: &str = "data-order-unresolved";

/// Attribute carrying a block's client id; `[data-block]` is also the
/// ancestor signature of a block element.
pub(crate) const BLOCK_ID_ATTR: &str = "data-block";

/// Attribute names that may hold the ordered id sequence on a block record,
/// probed in this order. The first one present on the record wins.
pub(crate) const ORDER_ATTR_CANDIDATES: &[&str] =
    &["post__in", "postIn", "selectedPosts", "manualPosts", "include"];

/// Slot created when none of the candidates exists on the record yet.
pub(crate) const DEFAULT_ORDER_ATTR: &str = "post__in";

/// One structural signature of a list item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ItemMatcher {
    /// The element carries this exact class.
    ExactClass(&'static str),
    /// The element's class attribute contains this fragment (case-sensitive).
    ClassFragment(&'static str),
}

/// Built-in list item signatures. New host markup is covered through
/// `ScriptConfig::extra_item_classes` rather than code changes.
pub(crate) const ITEM_MATCHERS: &[ItemMatcher] = &[
    ItemMatcher::ExactClass("gspb-manual-post-item"),
    ItemMatcher::ClassFragment("manual-post"),
    ItemMatcher::ClassFragment("ManualPost"),
];

impl ItemMatcher {
    pub(crate) fn css(&self) -> String {
        match self {
            ItemMatcher::ExactClass(class) => format!(".{class}"),
            ItemMatcher::ClassFragment(fragment) => format!("[class*=\"{fragment}\"]"),
        }
    }

    /// Predicate form of `css()` over a raw class attribute value.
    #[cfg(test)]
    pub(crate) fn matches_class_attr(&self, class_attr: &str) -> bool {
        match self {
            ItemMatcher::ExactClass(class) => class_attr.split_whitespace().any(|c| c == *class),
            ItemMatcher::ClassFragment(fragment) => class_attr.contains(fragment),
        }
    }
}

const CONFIG_GLOBAL: &str = "POSTSORT";

/// Runtime configuration. Defaults are compiled in; a page may override any
/// field through a `window.POSTSORT` object with camelCase keys, e.g.
/// `window.POSTSORT = { editorRoot: ".editor-styles-wrapper" };`.
/// Unknown keys are ignored; a malformed object falls back to the defaults.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct ScriptConfig {
    /// Selector of the editing-surface root observed for added nodes.
    pub editor_root: String,

    /// Ancestor signature of the builder's block wrapper.
    pub wrapper_selector: String,

    /// Re-scan cadence after load; non-positive disables the re-scan window.
    pub rescan_interval_ms: i32,
    /// How long after load re-scans keep running.
    pub rescan_window_ms: i32,

    /// Extra exact item classes appended to the built-in signatures.
    pub extra_item_classes: Vec<String>,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            editor_root: ".edit-post-visual-editor".to_string(),
            wrapper_selector: "[data-type*=\"greenshift\"], [class*=\"greenshift\"]".to_string(),
            rescan_interval_ms: 1000,
            rescan_window_ms: 3000,
            extra_item_classes: Vec::new(),
        }
    }
}

impl ScriptConfig {
    /// Read overrides from `window.POSTSORT`, falling back to defaults when
    /// the global is absent or malformed.
    pub(crate) fn load() -> Self {
        let Some(window) = web_sys::window() else {
            return Self::default();
        };
        let Some(global) = window.get(CONFIG_GLOBAL) else {
            return Self::default();
        };
        if global.is_undefined() || !global.is_object() {
            return Self::default();
        }

        let Ok(json) = js_sys::JSON::stringify(&global) else {
            crate::util::warn("postsort: window.POSTSORT is not serializable; using defaults");
            return Self::default();
        };
        match serde_json::from_str(&String::from(json)) {
            Ok(config) => config,
            Err(e) => {
                crate::util::warn(&format!("postsort: window.POSTSORT ignored: {e}"));
                Self::default()
            }
        }
    }

    /// CSS selector group matching every known item signature.
    pub(crate) fn item_selector(&self) -> String {
        let mut parts: Vec<String> = ITEM_MATCHERS.iter().map(|m| m.css()).collect();
        parts.extend(self.extra_item_classes.iter().map(|class| format!(".{class}")));
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_the_known_editor_markup() {
        let config = ScriptConfig::default();
        assert_eq!(config.editor_root, ".edit-post-visual-editor");
        assert!(config.wrapper_selector.contains("greenshift"));
        assert_eq!(config.rescan_interval_ms, 1000);
        assert_eq!(config.rescan_window_ms, 3000);
        assert!(config.extra_item_classes.is_empty());
    }

    #[test]
    fn test_partial_override_keeps_defaults_for_missing_keys() {
        let json = r#"{ "editorRoot": ".my-editor", "rescanWindowMs": 0 }"#;
        let config: ScriptConfig = serde_json::from_str(json).expect("partial config should parse");
        assert_eq!(config.editor_root, ".my-editor");
        assert_eq!(config.rescan_window_ms, 0);
        assert_eq!(config.rescan_interval_ms, 1000);
        assert_eq!(config.wrapper_selector, ScriptConfig::default().wrapper_selector);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let json = r#"{ "rescanIntervalMs": 250, "somethingElse": true }"#;
        let config: ScriptConfig = serde_json::from_str(json).expect("unknown keys should be ignored");
        assert_eq!(config.rescan_interval_ms, 250);
    }

    #[test]
    fn test_item_selector_includes_builtin_signatures_and_extras() {
        let mut config = ScriptConfig::default();
        config.extra_item_classes = vec!["my-item".to_string()];

        let selector = config.item_selector();
        assert_eq!(
            selector,
            ".gspb-manual-post-item, [class*=\"manual-post\"], [class*=\"ManualPost\"], .my-item"
        );
    }

    #[test]
    fn test_matcher_predicates() {
        let exact = ItemMatcher::ExactClass("gspb-manual-post-item");
        assert!(exact.matches_class_attr("card gspb-manual-post-item active"));
        assert!(!exact.matches_class_attr("gspb-manual-post-item-wide"));

        let fragment = ItemMatcher::ClassFragment("manual-post");
        assert!(fragment.matches_class_attr("theme-manual-post-row"));
        // Fragment matching is case-sensitive; `ManualPost` is its own signature.
        assert!(!fragment.matches_class_attr("ManualPostRow"));
    }

    #[test]
    fn test_candidate_slots_keep_their_probe_order() {
        assert_eq!(
            ORDER_ATTR_CANDIDATES,
            &["post__in", "postIn", "selectedPosts", "manualPosts", "include"]
        );
        assert_eq!(DEFAULT_ORDER_ATTR, "post__in");
    }
}
