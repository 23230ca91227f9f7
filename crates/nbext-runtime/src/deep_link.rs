//! `?nbextension=<require>` deep links.

use nbext_registry::{encode_uri_components, MergedExtension};
use url::form_urlencoded;

/// Query parameter naming the focused extension.
pub const DEEP_LINK_PARAMETER: &str = "nbextension";

/// Extracts the `nbextension` value from a query string or a full URL.
pub fn deep_link_require(query_or_url: &str) -> Option<String> {
    let trimmed = query_or_url.trim();
    let query = match url::Url::parse(trimmed) {
        Ok(parsed) => parsed.query().unwrap_or_default().to_string(),
        Err(_) => trimmed
            .split_once('?')
            .map_or(trimmed, |(_, query)| query)
            .split('#')
            .next()
            .unwrap_or_default()
            .to_string(),
    };
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == DEEP_LINK_PARAMETER)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// Builds the `?nbextension=...` query recorded when an extension gains focus.
///
/// Path separators in `require` stay literal; every component is encoded the
/// same way readme paths are.
pub fn deep_link_query(require: &str) -> String {
    format!(
        "?{DEEP_LINK_PARAMETER}={}",
        encode_uri_components(require)
    )
}

/// Picks the focused extension among `visible`.
///
/// The linked extension wins when it is visible; otherwise the last visible
/// entry is focused.
pub fn focus_from_query<'a>(
    query_or_url: &str,
    visible: &[&'a MergedExtension],
) -> Option<&'a MergedExtension> {
    deep_link_require(query_or_url)
        .and_then(|require| {
            visible
                .iter()
                .copied()
                .find(|extension| extension.require == require)
        })
        .or_else(|| visible.last().copied())
}
