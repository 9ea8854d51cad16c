use std::sync::OnceLock;

use regex::Regex;
use wasm_bindgen::JsCast;
use web_sys::Element;

/// One identifier-recovery heuristic. Strategies are pure: element in,
/// optional id out, no DOM mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Strategy {
    /// The item's own `data-post-id` attribute.
    ItemDataField,
    /// A `post-<digits>` token in the item's class list.
    ItemClassPattern,
    /// A descendant carrying `data-post-id` (or `data-id`).
    DescendantDataField,
    /// An `ID: <digits>` pattern somewhere in the item's text.
    TextIdPattern,
    /// A numeric `value` on a descendant button or input.
    ControlValue,
}

/// Probe order. Earlier strategies are cheaper and more specific; the first
/// one that yields a parseable id wins and the rest are never consulted.
pub(crate) const STRATEGY_ORDER: [Strategy; 5] = [
    Strategy::ItemDataField,
    Strategy::ItemClassPattern,
    Strategy::DescendantDataField,
    Strategy::TextIdPattern,
    Strategy::ControlValue,
];

/// Resolve a list item to its record id, or `None` when no strategy applies.
/// `None` means "leave this item out of the stored order", never an error.
pub(crate) fn resolve(item: &Element) -> Option<u64> {
    STRATEGY_ORDER
        .iter()
        .find_map(|&strategy| apply(strategy, item))
}

fn apply(strategy: Strategy, item: &Element) -> Option<u64> {
    match strategy {
        Strategy::ItemDataField => parse_identifier(&item.get_attribute("data-post-id")?),
        Strategy::ItemClassPattern => parse_post_class(&item.class_name()),
        Strategy::DescendantDataField => {
            let holder = item.query_selector("[data-post-id], [data-id]").ok()??;
            holder
                .get_attribute("data-post-id")
                .and_then(|raw| parse_identifier(&raw))
                .or_else(|| {
                    holder
                        .get_attribute("data-id")
                        .and_then(|raw| parse_identifier(&raw))
                })
        }
        Strategy::TextIdPattern => parse_id_from_text(&item.text_content()?),
        Strategy::ControlValue => {
            let control = item.query_selector("button[value], input[value]").ok()??;
            parse_identifier(&control_value(&control)?)
        }
    }
}

/// `value` property of a form control (the attribute only seeds it).
fn control_value(el: &Element) -> Option<String> {
    if let Some(input) = el.dyn_ref::<web_sys::HtmlInputElement>() {
        return Some(input.value());
    }
    if let Some(button) = el.dyn_ref::<web_sys::HtmlButtonElement>() {
        return Some(button.value());
    }
    None
}

/// Strict id parse: trimmed, digits only, must fit the id type. Anything
/// else makes the strategy yield nothing so the next one gets a turn.
pub(crate) fn parse_identifier(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}

/// First whole `post-<digits>` token in a class attribute value.
pub(crate) fn parse_post_class(class_attr: &str) -> Option<u64> {
    class_attr
        .split_whitespace()
        .find_map(|token| parse_identifier(token.strip_prefix("post-")?))
}

/// First `ID: <digits>` occurrence (case-insensitive; colon or whitespace
/// separated) in free text.
pub(crate) fn parse_id_from_text(text: &str) -> Option<u64> {
    static ID_PATTERN: OnceLock<Regex> = OnceLock::new();
    let re = ID_PATTERN
        .get_or_init(|| Regex::new(r"(?i)ID[:\s]+([0-9]+)").expect("Invalid id pattern regex"));
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_order_is_the_documented_one() {
        assert_eq!(
            STRATEGY_ORDER,
            [
                Strategy::ItemDataField,
                Strategy::ItemClassPattern,
                Strategy::DescendantDataField,
                Strategy::TextIdPattern,
                Strategy::ControlValue,
            ]
        );
    }

    #[test]
    fn test_parse_identifier_is_strict() {
        assert_eq!(parse_identifier("42"), Some(42));
        assert_eq!(parse_identifier("  42  "), Some(42));
        assert_eq!(parse_identifier("0"), Some(0));

        assert_eq!(parse_identifier(""), None);
        assert_eq!(parse_identifier("   "), None);
        assert_eq!(parse_identifier("-5"), None);
        assert_eq!(parse_identifier("+5"), None);
        assert_eq!(parse_identifier("42px"), None);
        assert_eq!(parse_identifier("4 2"), None);
        assert_eq!(parse_identifier("12.5"), None);
        // All digits but too large for the id type.
        assert_eq!(parse_identifier("99999999999999999999999999"), None);
    }

    #[test]
    fn test_parse_post_class_wants_a_whole_token() {
        assert_eq!(parse_post_class("post-123"), Some(123));
        assert_eq!(parse_post_class("card post-7 is-active"), Some(7));
        // First matching token wins.
        assert_eq!(parse_post_class("post-1 post-2"), Some(1));

        assert_eq!(parse_post_class(""), None);
        assert_eq!(parse_post_class("post-"), None);
        assert_eq!(parse_post_class("post-abc"), None);
        assert_eq!(parse_post_class("repost-9"), None);
        assert_eq!(parse_post_class("gspb-manual-post-item"), None);
    }

    #[test]
    fn test_parse_id_from_text_matches_the_id_pattern() {
        assert_eq!(parse_id_from_text("ID: 123"), Some(123));
        assert_eq!(parse_id_from_text("id 77"), Some(77));
        assert_eq!(parse_id_from_text("Post ID:\t88 (draft)"), Some(88));
        assert_eq!(parse_id_from_text("Id:   5"), Some(5));
        // First occurrence wins.
        assert_eq!(parse_id_from_text("ID: 12 and ID: 99"), Some(12));

        assert_eq!(parse_id_from_text(""), None);
        assert_eq!(parse_id_from_text("no identifier here"), None);
        // "ID" must be followed by a colon or whitespace.
        assert_eq!(parse_id_from_text("IDEA 12"), None);
        assert_eq!(parse_id_from_text("ID:"), None);
    }
}
