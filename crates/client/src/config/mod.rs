// Viewer options passed from the embedding page
use serde::Deserialize;
use wasm_bindgen::JsValue;

/// Reconnect schedule for the push channel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReconnectPolicy {
    pub initial_delay_ms: u32,
    pub max_delay_ms: u32,
    pub factor: f64,
    /// 0 retries forever.
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1000,
            max_delay_ms: 5000,
            factor: 1.5,
            max_attempts: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewerOptions {
    /// Element whose width drives the surface size.
    pub container_id: String,
    pub static_canvas_id: String,
    pub dynamic_canvas_id: String,
    pub map_url: String,
    pub pose_url: String,
    pub channel_url: String,
    pub reconnect: ReconnectPolicy,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            container_id: "map-container".to_string(),
            static_canvas_id: "static-layer".to_string(),
            dynamic_canvas_id: "dynamic-layer".to_string(),
            map_url: "/api/map_data".to_string(),
            pose_url: "/api/robot_position".to_string(),
            channel_url: "/ws".to_string(),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

impl ViewerOptions {
    /// Read options from a JS object; `undefined` / `null` gives the defaults.
    pub fn from_js(value: JsValue) -> Result<Self, JsValue> {
        if value.is_undefined() || value.is_null() {
            return Ok(Self::default());
        }
        serde_wasm_bindgen::from_value(value).map_err(JsValue::from)
    }
}
