//! Static asset constants.

/// Stylesheet for the gallery and listing pages.
pub const CSS: &str = include_str!("styles.css");
