// Initial reads: map layout and agent pose, fetched concurrently
use futures_util::future::try_join;
use protocol::{AgentPose, MapLayout, ProtocolError};
use thiserror::Error;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use crate::config::ViewerOptions;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("invalid {what}: {source}")]
    Payload {
        what: &'static str,
        #[source]
        source: ProtocolError,
    },
}

/// Fetch both bootstrap bodies and decode them. Either failing fails the
/// whole bootstrap.
pub async fn fetch_initial(options: &ViewerOptions) -> Result<(MapLayout, AgentPose), BootstrapError> {
    let (map_body, pose_body) =
        try_join(fetch_text(&options.map_url), fetch_text(&options.pose_url)).await?;
    decode_initial(&map_body, &pose_body)
}

/// Decode and validate both bodies.
pub fn decode_initial(map_body: &str, pose_body: &str) -> Result<(MapLayout, AgentPose), BootstrapError> {
    let layout = MapLayout::decode(map_body).map_err(|source| BootstrapError::Payload {
        what: "map layout",
        source,
    })?;
    let pose = AgentPose::decode(pose_body).map_err(|source| BootstrapError::Payload {
        what: "agent pose",
        source,
    })?;
    Ok((layout, pose))
}

async fn fetch_text(url: &str) -> Result<String, BootstrapError> {
    let transport = |reason: String| BootstrapError::Transport {
        url: url.to_string(),
        reason,
    };

    let window = web_sys::window().ok_or_else(|| transport("no window".to_string()))?;
    let response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|e| transport(format!("{e:?}")))?;
    let response: web_sys::Response = response
        .dyn_into()
        .map_err(|_| transport("not a Response".to_string()))?;

    if !response.ok() {
        return Err(BootstrapError::Status {
            url: url.to_string(),
            status: response.status(),
        });
    }

    let text = JsFuture::from(response.text().map_err(|e| transport(format!("{e:?}")))?)
        .await
        .map_err(|e| transport(format!("{e:?}")))?;
    text.as_string()
        .ok_or_else(|| transport("body is not text".to_string()))
}
