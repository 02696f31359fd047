use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;
use std::future::Future;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

#[rustfmt::skip]
use web_sys::{
    CanvasRenderingContext2d,
    Document,
    Element,
    EventTarget,
    HtmlCanvasElement,
    HtmlElement,
    HtmlImageElement,
    Response,
    Window,
};

// ==================== Constants ====================
// Constants related to HTML elements
mod html {
    pub const CANVAS_ID: &str = "canvas";
    pub const CONTEXT_2D: &str = "2d";
}

pub type LoopClosure = Closure<dyn FnMut(f64)>;

// ==================== Logging ====================
/// `log` backend writing to the browser devtools console
struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from(format!(
            "[{}] {}: {}",
            record.level(),
            record.target(),
            record.args()
        ));
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&line),
            log::Level::Warn => web_sys::console::warn_1(&line),
            _ => web_sys::console::log_1(&line),
        }
    }

    fn flush(&self) {}
}

/// Route `log` macros to the console. Safe to call more than once.
pub fn init_logger(level: log::LevelFilter) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

// ==================== DOM ====================
pub fn window() -> Result<Window> {
    web_sys::window().ok_or_else(|| anyhow!("Window not found"))
}

pub fn document() -> Result<Document> {
    window()?
        .document()
        .ok_or_else(|| anyhow!("No Document Found"))
}

pub fn canvas() -> Result<HtmlCanvasElement> {
    element_by_id::<HtmlCanvasElement>(html::CANVAS_ID)
}

pub fn context() -> Result<CanvasRenderingContext2d> {
    let context = canvas()?
        .get_context(html::CONTEXT_2D)
        // get_context returns Result<Option<Object>, JsValue>
        // - map the JsValue error to anyhow
        // - map the None case to an error
        .map_err(|js_value| anyhow!("Error getting context : {:#?}", js_value))?
        .ok_or_else(|| anyhow!("No 2d context found"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|element| {
            anyhow!(
                "Error converting {:#?} to CanvasRenderingContext2d",
                element
            )
        })?;
    // nearest neighbour sampling keeps scaled pixel art crisp
    context.set_image_smoothing_enabled(false);
    Ok(context)
}

pub fn element_by_id<T: JsCast>(id: &str) -> Result<T> {
    document()?
        .get_element_by_id(id)
        .ok_or_else(|| anyhow!("No Element found with ID : '{}'", id))?
        .dyn_into::<T>()
        .map_err(|element| anyhow!("Error converting {:#?} for ID '{}'", element, id))
}

pub fn new_image() -> Result<HtmlImageElement> {
    HtmlImageElement::new()
        .map_err(|err| anyhow!("Could not create image element : {:#?}", err))
}

pub fn inner_size() -> Result<(f64, f64)> {
    let window = window()?;
    let width = window
        .inner_width()
        .map_err(|err| anyhow!("Could not read window width : {:#?}", err))?
        .as_f64()
        .ok_or_else(|| anyhow!("Window width is not a number"))?;
    let height = window
        .inner_height()
        .map_err(|err| anyhow!("Could not read window height : {:#?}", err))?
        .as_f64()
        .ok_or_else(|| anyhow!("Window height is not a number"))?;
    Ok((width, height))
}

pub fn set_visible(element: &HtmlElement, visible: bool) -> Result<()> {
    let value = if visible { "1" } else { "0" };
    element
        .style()
        .set_property("opacity", value)
        .map_err(|err| anyhow!("Could not set opacity : {:#?}", err))
}

pub fn alert(message: &str) -> Result<()> {
    window()?
        .alert_with_message(message)
        .map_err(|err| anyhow!("Could not show alert : {:#?}", err))
}

// ==================== Fullscreen ====================
pub fn is_fullscreen() -> bool {
    document()
        .map(|document| document.fullscreen_element().is_some())
        .unwrap_or(false)
}

pub fn toggle_fullscreen(element: &Element) -> Result<()> {
    let document = document()?;
    if document.fullscreen_element().is_some() {
        document.exit_fullscreen();
        Ok(())
    } else {
        element
            .request_fullscreen()
            .map_err(|err| anyhow!("Fullscreen request refused : {:#?}", err))
    }
}

// ==================== Closures & Events ====================
pub fn closure_once(f: impl FnOnce() + 'static) -> Closure<dyn FnMut()> {
    Closure::once(f)
}

pub fn closure_once_with_value(f: impl FnOnce(JsValue) + 'static) -> Closure<dyn FnMut(JsValue)> {
    Closure::once(f)
}

/// Attach a listener for the lifetime of the page
pub fn add_listener(target: &EventTarget, event: &str, handler: impl FnMut() + 'static) -> Result<()> {
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut()>);
    target
        .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("Could not listen for '{}' : {:#?}", event, err))?;
    closure.forget();
    Ok(())
}

pub fn set_timeout(delay_ms: i32, handler: impl FnOnce() + 'static) -> Result<i32> {
    let closure = closure_once(handler);
    let id = window()?
        .set_timeout_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            delay_ms,
        )
        .map_err(|err| anyhow!("Could not set timeout : {:#?}", err))?;
    closure.forget();
    Ok(id)
}

pub fn spawn_local<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
}

// ==================== Animation Frames ====================
pub fn now() -> Result<f64> {
    Ok(window()?
        .performance()
        .ok_or_else(|| anyhow!("Performance object not found"))?
        .now())
}

pub fn create_raf_closure(f: impl FnMut(f64) + 'static) -> LoopClosure {
    Closure::wrap(Box::new(f) as Box<dyn FnMut(f64)>)
}

pub fn request_animation_frame(callback: &LoopClosure) -> Result<i32> {
    window()?
        .request_animation_frame(callback.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("Cannot request animation frame : {:#?}", err))
}

// ==================== Fetch ====================
pub async fn fetch_json<T>(json_path: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    let resp_value = fetch_with_str(json_path).await?;
    let resp: Response = resp_value
        .dyn_into()
        .map_err(|element| anyhow!("error converting [{:#?}] to Response", element))?;
    if !resp.ok() {
        return Err(anyhow!(
            "fetching [{}] returned status {}",
            json_path,
            resp.status()
        ));
    }
    let json = resp
        .json()
        .map_err(|err| anyhow!("Could not get JSON from response [{:#?}]", err))?;

    let json_value = JsFuture::from(json)
        .await
        .map_err(|err| anyhow!("error fetching [{:#?}]", err))?;

    serde_wasm_bindgen::from_value(json_value)
        .map_err(|err| anyhow!("error converting response : {:#?}", err))
}

async fn fetch_with_str(resource: &str) -> Result<JsValue> {
    let resp = window()?.fetch_with_str(resource);

    JsFuture::from(resp)
        .await
        .map_err(|err| anyhow!("error fetching : {:#?}", err))
}
