use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::utm::UtmParams;

/// Characters left alone by JavaScript's `encodeURIComponent`. The thank-you page decodes with
/// browser semantics, so we match them exactly.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn encode_uri_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

/// The `src` attribution value: every present UTM parameter as `key=value`, joined by `|`.
/// Returns `None` when no UTM parameter is present.
pub fn composite_source(utm: &UtmParams) -> Option<String> {
    let pairs: Vec<String> = utm
        .present()
        .map(|(key, value)| format!("{key}={value}"))
        .collect();

    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("|"))
    }
}

/// Build the post-submit destination carrying the lead's identity and attribution.
///
/// The query always starts with `email` and `name`, followed by the composite `src` and then
/// each present UTM parameter on its own. The separator is `&` when `base_url` already has a
/// query string.
pub fn build_redirect_url(base_url: &str, name: &str, email: &str, utm: &UtmParams) -> String {
    let mut params = vec![
        format!("email={}", encode_uri_component(email)),
        format!("name={}", encode_uri_component(name)),
    ];

    if let Some(src) = composite_source(utm) {
        params.push(format!("src={}", encode_uri_component(&src)));
    }

    params.extend(
        utm.present()
            .map(|(key, value)| format!("{key}={}", encode_uri_component(value))),
    );

    let separator = if base_url.contains('?') { '&' } else { '?' };

    format!("{base_url}{separator}{}", params.join("&"))
}
