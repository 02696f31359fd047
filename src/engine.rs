use crate::browser;
use anyhow::{anyhow, Error, Result};
// web assembly is a single threaded environment, so Rc RefCell > Mutex
use async_trait::async_trait;
use futures::channel::oneshot::channel;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::ops::Add;
use std::rc::Rc;
use wasm_bindgen::{
    // unchecked_ref (unsafe) cast from Javascript type to Rust type
    // - we control the closure creation and specify the expected type
    JsCast,
    JsValue,
};
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

/// Anything the render loop can drive : one `update` then one `draw` per
/// display frame, both on the same thread
pub trait Game {
    fn update(&mut self, now: f64);
    fn draw(&self, renderer: &Renderer);
}

pub struct GameLoop;

type SharedLoopClosure = Rc<RefCell<Option<browser::LoopClosure>>>;

impl GameLoop {
    /// Hands the game to requestAnimationFrame. The game is shared because
    /// asset continuations and UI handlers mutate it between frames.
    pub fn start<G: Game + 'static>(game: Rc<RefCell<G>>) -> Result<()> {
        let renderer = Renderer::new(browser::context()?);
        let f: SharedLoopClosure = Rc::new(RefCell::new(None));
        let g = f.clone();
        *g.borrow_mut() = Some(browser::create_raf_closure(move |now: f64| {
            {
                let mut game = game.borrow_mut();
                game.update(now);
                game.draw(&renderer);
            }
            if let Some(next) = f.borrow().as_ref() {
                if let Err(err) = browser::request_animation_frame(next) {
                    log::error!("GameLoop: could not schedule next frame : {:#}", err);
                }
            }
        }));

        browser::request_animation_frame(
            g.borrow()
                .as_ref()
                .ok_or_else(|| anyhow!("GameLoop: Loop is None"))?,
        )?;

        Ok(())
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, other: Point) -> Point {
        Point {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Size { width, height }
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Rect {
    pub position: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(position: Point, size: Size) -> Self {
        Rect { position, size }
    }

    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect::new(Point::new(x, y), Size::new(width, height))
    }

    pub fn x(&self) -> f64 {
        self.position.x
    }

    pub fn y(&self) -> f64 {
        self.position.y
    }

    pub fn width(&self) -> f64 {
        self.size.width
    }

    pub fn height(&self) -> f64 {
        self.size.height
    }

    pub fn center(&self) -> Point {
        Point {
            x: self.x() + self.width() * 0.5,
            y: self.y() + self.height() * 0.5,
        }
    }
}

/// Logical -> physical mapping. Motion runs in a fixed logical space, only
/// the final draw coordinates go through here.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Scale {
    pub factor: f64,
}

impl Default for Scale {
    fn default() -> Self {
        Scale { factor: 1.0 }
    }
}

impl Scale {
    /// Largest factor that keeps `base` inside `available`
    pub fn fit(base: Size, available: Size) -> Self {
        let factor = (available.width / base.width).min(available.height / base.height);
        if factor.is_finite() && factor > 0.0 {
            Scale { factor }
        } else {
            Scale::default()
        }
    }

    pub fn capped(self, max: f64) -> Self {
        Scale {
            factor: self.factor.min(max),
        }
    }

    pub fn size(&self, size: Size) -> Size {
        Size {
            width: (size.width * self.factor).round(),
            height: (size.height * self.factor).round(),
        }
    }

    /// Rounded to whole pixels, sub-pixel destinations blur pixel art
    pub fn rect(&self, rect: &Rect) -> Rect {
        Rect::from_xywh(
            (rect.x() * self.factor).round(),
            (rect.y() * self.factor).round(),
            (rect.width() * self.factor).round(),
            (rect.height() * self.factor).round(),
        )
    }
}

/// Drawing seam between sprites and the canvas
pub trait Surface {
    type Image;

    fn save(&self);
    fn restore(&self);
    fn translate(&self, x: f64, y: f64);
    fn rotate(&self, angle: f64);
    fn scale(&self, x: f64, y: f64);
    fn clear(&self, rect: &Rect);
    /// Blit the whole image stretched over `destination`
    fn draw_image(&self, image: &Self::Image, destination: &Rect);
    /// Blit the `frame` sub-rectangle of the image onto `destination`
    fn draw_frame(&self, image: &Self::Image, frame: &Rect, destination: &Rect);
}

pub struct Renderer {
    context: CanvasRenderingContext2d,
}

impl Renderer {
    pub fn new(context: CanvasRenderingContext2d) -> Self {
        Renderer { context }
    }

    fn report(operation: &str, result: Result<(), JsValue>) {
        if let Err(err) = result {
            log::error!("Renderer::{} failed : {:#?}", operation, err);
        }
    }
}

impl Surface for Renderer {
    type Image = HtmlImageElement;

    fn save(&self) {
        self.context.save();
    }

    fn restore(&self) {
        self.context.restore();
    }

    fn translate(&self, x: f64, y: f64) {
        Self::report("translate", self.context.translate(x, y));
    }

    fn rotate(&self, angle: f64) {
        Self::report("rotate", self.context.rotate(angle));
    }

    fn scale(&self, x: f64, y: f64) {
        Self::report("scale", self.context.scale(x, y));
    }

    fn clear(&self, rect: &Rect) {
        // resizing the canvas resets context state, so smoothing is
        // switched off again every frame
        self.context.set_image_smoothing_enabled(false);
        self.context
            .clear_rect(rect.x(), rect.y(), rect.width(), rect.height());
    }

    fn draw_image(&self, image: &HtmlImageElement, destination: &Rect) {
        Self::report(
            "draw_image",
            self.context.draw_image_with_html_image_element_and_dw_and_dh(
                image,
                destination.x(),
                destination.y(),
                destination.width(),
                destination.height(),
            ),
        );
    }

    fn draw_frame(&self, image: &HtmlImageElement, frame: &Rect, destination: &Rect) {
        Self::report(
            "draw_frame",
            self.context
                .draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                    image,
                    frame.x(),
                    frame.y(),
                    frame.width(),
                    frame.height(),
                    destination.x(),
                    destination.y(),
                    destination.width(),
                    destination.height(),
                ),
        );
    }
}

/// Asynchronously load an image from a given source path
/// # Arguments
/// * `source` - string slice to path/url
/// # Returns
/// * `Ok(HtmlImageElement)` - on load success
/// * `Err` - on load fail
pub async fn load_image(source: &str) -> Result<HtmlImageElement> {
    let image = browser::new_image()?;
    let (tx, rx) = channel::<Result<(), Error>>();
    let success_tx = Rc::new(RefCell::new(Some(tx)));
    let error_tx = success_tx.clone();

    let success_callback = browser::closure_once(move || {
        if let Some(tx) = success_tx.borrow_mut().take() {
            let _ = tx.send(Ok(()));
        }
    });

    let error_callback = browser::closure_once_with_value(move |err: JsValue| {
        if let Some(tx) = error_tx.borrow_mut().take() {
            let _ = tx.send(Err(anyhow!(
                "[engine.rs::load_image] Error loading image: {:#?}",
                err
            )));
        }
    });

    image.set_onload(Some(success_callback.as_ref().unchecked_ref()));
    image.set_onerror(Some(error_callback.as_ref().unchecked_ref()));
    image.set_src(source);

    // keep callback alive until image is loaded or errors
    success_callback.forget();
    error_callback.forget();

    // ?? - Result<Result<(), Error>, oneshot::Canceled>
    // - first ? yields channel result : Result<(), Error>
    // - second ? yields image load result : () or propagating Error
    rx.await??;

    Ok(image)
}

/// Source of decoded images. The browser build resolves paths through
/// `load_image`, tests substitute their own handles.
#[async_trait(?Send)]
pub trait ImageLoader {
    type Image;

    async fn load(&self, source: &str) -> Result<Self::Image>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlImageLoader;

#[async_trait(?Send)]
impl ImageLoader for HtmlImageLoader {
    type Image = HtmlImageElement;

    async fn load(&self, source: &str) -> Result<HtmlImageElement> {
        load_image(source).await
    }
}
