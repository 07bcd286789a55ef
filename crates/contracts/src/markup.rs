//! Class names and generated CSS for the overlay container.

use std::fmt::Write as _;

pub const CSS_PREFIX: &str = "apfm-";

pub const CONTAINER_CLASS: &str = "apfm-container";
pub const WRAPPER_CLASS: &str = "apfm-wrapper";
pub const CLEARFIX_CLASS: &str = "apfm-clearfix";
pub const CLOSE_BUTTON_CLASS: &str = "apfm-close-button";
pub const PLACEHOLDER_CLASS: &str = "apfm-placeholder";

/// Set on the container while shown, and on the document root while any modal is shown.
pub const OPEN_CLASS: &str = "apfm-open";
pub const OPENING_CLASS: &str = "apfm-opening";
pub const CLOSING_CLASS: &str = "apfm-closing";

/// Class the built-in close button carries so the default close selector matches it.
pub const DEFAULT_CLOSE_CLASS: &str = "close-modal";

const VENDOR_PREFIXES: [&str; 5] = ["-webkit-", "-moz-", "-ms-", "-o-", ""];

pub fn container_id(index: u64) -> String {
    format!("{CSS_PREFIX}container-{index}")
}

/// `200` -> `"0.200s"`.
pub fn duration_seconds(millis: u32) -> String {
    format!("{:.3}s", f64::from(millis) / 1000.0)
}

/// Stylesheet block giving the container its transform/opacity transition.
pub fn transition_css(container_id: &str, millis: u32) -> String {
    let duration = duration_seconds(millis);
    let mut css = format!("#{container_id} {{\n");
    for prefix in VENDOR_PREFIXES {
        let _ = writeln!(
            css,
            "\t{prefix}transition: {prefix}transform {duration}, opacity {duration};"
        );
    }
    css.push_str("}\n");
    css
}
