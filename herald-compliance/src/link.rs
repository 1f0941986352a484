//! Opt-out link construction
//!
//! The receiving endpoint is external: it verifies the token and, on
//! success, calls back into suppression. This module only builds the URL
//! carried in outbound footers.

use herald_common::EmailAddress;
use url::Url;

/// Build an opt-out URL carrying `email`, `campaign`, and `token` query
/// parameters.
///
/// # Errors
///
/// Returns an error when `base` is not a parseable absolute URL.
pub fn opt_out_url(
    base: &str,
    email: &EmailAddress,
    campaign: &str,
    token: &str,
) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(base)?;
    url.query_pairs_mut()
        .append_pair("email", email.as_str())
        .append_pair("campaign", campaign)
        .append_pair("token", token);
    Ok(url)
}
