use crate::{UrlError, UrlResult};
use url::Url;

/// Extracts the host an address is fetched from
///
/// The host is lowercased so that `EXAMPLE.com` and `example.com` share one
/// per-host gate. Ports are not part of the key.
///
/// # Examples
///
/// ```
/// use sumi_tide::url::extract_host;
///
/// assert_eq!(extract_host("https://Example.COM/path").unwrap(), "example.com");
/// assert!(extract_host("not a url").is_err());
/// ```
pub fn extract_host(address: &str) -> UrlResult<String> {
    let url = Url::parse(address).map_err(|source| UrlError::Parse {
        url: address.to_string(),
        source,
    })?;

    url.host_str()
        .map(|h| h.to_lowercase())
        .ok_or_else(|| UrlError::MissingHost(address.to_string()))
}
