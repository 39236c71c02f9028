use std::time::Duration;

pub const DEFAULT_ORIGINATOR: &str = "scotty_cli_rs";

pub fn get_scotty_user_agent(originator: Option<&str>) -> String {
    let build_version = env!("CARGO_PKG_VERSION");
    let os_info = os_info::get();
    format!(
        "{}/{build_version} ({} {}; {})",
        originator.unwrap_or(DEFAULT_ORIGINATOR),
        os_info.os_type(),
        os_info.version(),
        os_info.architecture().unwrap_or("unknown"),
    )
}

/// Create a reqwest client with default `originator`, `Accept` and
/// `User-Agent` headers set.
///
/// The backend serves HTML to anything that accepts it, so every request must
/// ask for JSON only.
pub fn create_client(originator: &str, timeout: Option<Duration>) -> reqwest::Client {
    use reqwest::header::ACCEPT;
    use reqwest::header::HeaderMap;
    use reqwest::header::HeaderValue;

    let mut headers = HeaderMap::new();
    let originator_value = HeaderValue::from_str(originator)
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_ORIGINATOR));
    headers.insert("originator", originator_value);
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    let ua = get_scotty_user_agent(Some(originator));

    let mut builder = reqwest::Client::builder()
        // Set UA via dedicated helper to avoid header validation pitfalls
        .user_agent(ua)
        .default_headers(headers);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }

    match builder.build() {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!("failed to build http client, falling back to defaults: {e}");
            reqwest::Client::new()
        }
    }
}
