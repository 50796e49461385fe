use std::time::Duration;

use anyhow::{Context, bail};
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;

use crate::config::RECV_BUFFER_BYTES;

/// One-shot JSON POST used for bootstrap and diagnostics, never on the polling path.
///
/// Non-200 answers and bodies that do not fit the receive buffer are errors.
pub fn http_post_json(url: &str, body: &str, timeout: Duration) -> anyhow::Result<String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .tcp_nodelay(true)
        .build()
        .context("[HttpBootstrap] failed to build client")?;

    let resp = client
        .post(url)
        .header(CONTENT_TYPE, "application/json")
        .body(body.to_owned())
        .send()
        .with_context(|| format!("unable to request data from {url}"))?;

    let status = resp.status();
    if status != StatusCode::OK {
        bail!("server responded with code {}", status.as_u16());
    }

    let text = resp.text().context("failed to read response body")?;
    if text.len() >= RECV_BUFFER_BYTES {
        bail!("response of {} bytes does not fit the receive buffer", text.len());
    }
    Ok(text)
}
