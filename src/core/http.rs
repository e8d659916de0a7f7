use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::Client;

const APP_USER_AGENT: &str = concat!("mc-mod-getter/", env!("CARGO_PKG_VERSION"));

/// Upper bound for every host call: search, version listing and byte download.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub fn build_http_client() -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .timeout(HTTP_TIMEOUT)
        .build()
}
