use std::time::Duration;

use once_cell::sync::Lazy;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::FetchError;

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 20;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 6;

static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent(concat!("liquidity-watch/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
        .build()
        .unwrap_or_default()
});

/// POST a JSON body and decode the JSON response. Non-2xx statuses become
/// `FetchError::Status` with a short body preview.
pub async fn post_json<B, T>(url: &str, body: &B) -> Result<T, FetchError>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let response = HTTP_CLIENT.post(url).json(body).send().await?;
    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            body: preview(&text),
        });
    }
    serde_json::from_str(&text).map_err(|e| FetchError::InvalidValue {
        field: "response body",
        value: format!("{e}: {}", preview(&text)),
    })
}

fn preview(text: &str) -> String {
    text.chars().take(180).collect()
}
