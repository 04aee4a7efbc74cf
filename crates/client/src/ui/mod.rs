// DOM side effects: container size, load failure notice, blocking alerts
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement};

pub struct UI {
    document: Document,
}

impl UI {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    /// UI bound to the current page, if there is one.
    pub fn current() -> Option<Self> {
        web_sys::window().and_then(|w| w.document()).map(Self::new)
    }

    fn get_el(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    /// Content width of the container in CSS pixels (padding excluded).
    pub fn container_width(&self, container_id: &str) -> Option<u32> {
        let el = self.get_el(container_id)?.dyn_into::<HtmlElement>().ok()?;
        let padding = web_sys::window()
            .and_then(|w| w.get_computed_style(&el).ok().flatten())
            .map(|style| {
                let side = |name: &str| css_px(&style.get_property_value(name).unwrap_or_default());
                side("padding-left") + side("padding-right")
            })
            .unwrap_or(0.0);
        Some(content_width(el.client_width(), padding))
    }

    /// Replace the container contents with a static failure notice.
    /// The viewer is not usable afterwards.
    pub fn show_load_error(&self, container_id: &str, reason: &str) {
        let Some(container) = self.get_el(container_id) else {
            return;
        };
        container.set_inner_html(&format!(
            "<div class=\"floorview-error\" role=\"alert\">\
             <p><b>Map unavailable</b></p><p>{}</p></div>",
            html_escape(reason),
        ));
    }
}

/// Blocking user acknowledgement (navigation faults).
pub fn alert(message: &str) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or("No window")?;
    window.alert_with_message(&format!("Navigation error: {message}"))
}

/// Parse a computed length such as `"12.5px"`; anything else counts as zero.
fn css_px(value: &str) -> f64 {
    value.trim().trim_end_matches("px").parse().unwrap_or(0.0)
}

fn content_width(client_width: i32, padding: f64) -> u32 {
    (client_width as f64 - padding).max(0.0).floor() as u32
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
