use crate::browser;
use crate::config::SceneConfig;
use crate::engine::{HtmlImageLoader, Size};
use crate::game::{self, Aquarium};
use anyhow::Result;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlButtonElement, HtmlCanvasElement, HtmlElement};

mod ids {
    pub const HAT_BUTTON: &str = "hatButton";
    pub const FULLSCREEN_BUTTON: &str = "fullscreenButton";
    pub const CONTROLS: &str = "controls";
    pub const CONTAINER: &str = "container";
}

type SharedAquarium = Rc<RefCell<Aquarium<web_sys::HtmlImageElement>>>;

/// Decides when the fullscreen controls may fade out. Every burst of pointer
/// activity bumps the generation, a hide timer only fires for the
/// generation that scheduled it.
#[derive(Debug, Default)]
pub struct ControlsTimer {
    generation: u64,
}

impl ControlsTimer {
    pub fn activity(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    pub fn should_hide(&self, generation: u64, fullscreen: bool) -> bool {
        fullscreen && generation == self.generation
    }
}

/// Hook every control up to the scene. Missing optional controls only log.
pub fn wire(scene: &SharedAquarium, config: &SceneConfig) -> Result<()> {
    match browser::element_by_id::<HtmlButtonElement>(ids::HAT_BUTTON) {
        Ok(button) => wire_hat_button(scene, button)?,
        Err(err) => log::warn!("hat toggle disabled : {:#}", err),
    }

    let canvas = browser::canvas()?;
    fit_canvas(scene, &canvas);

    let controls = browser::element_by_id::<HtmlElement>(ids::CONTROLS).ok();
    let timer = Rc::new(RefCell::new(ControlsTimer::default()));
    let delay = config.controls_hide_delay_ms;

    let window = browser::window()?;
    {
        let scene = scene.clone();
        let canvas = canvas.clone();
        browser::add_listener(&window, "resize", move || fit_canvas(&scene, &canvas))?;
    }

    let document = browser::document()?;
    {
        let scene = scene.clone();
        let canvas = canvas.clone();
        let controls = controls.clone();
        let timer = timer.clone();
        browser::add_listener(&document, "fullscreenchange", move || {
            fit_canvas(&scene, &canvas);
            if let Some(controls) = &controls {
                reveal_controls(controls, &timer, delay);
            }
        })?;
    }
    if let Some(controls) = controls {
        browser::add_listener(&document, "pointermove", move || {
            reveal_controls(&controls, &timer, delay)
        })?;
    }

    match browser::element_by_id::<HtmlButtonElement>(ids::FULLSCREEN_BUTTON) {
        Ok(button) => {
            let target: Element = browser::element_by_id::<Element>(ids::CONTAINER)
                .unwrap_or_else(|_| canvas.clone().unchecked_into());
            browser::add_listener(&button, "click", move || {
                if let Err(err) = browser::toggle_fullscreen(&target) {
                    log::error!("{:#}", err);
                }
            })?;
        }
        Err(err) => log::warn!("fullscreen toggle disabled : {:#}", err),
    }

    Ok(())
}

fn wire_hat_button(scene: &SharedAquarium, button: HtmlButtonElement) -> Result<()> {
    let label = scene.borrow().hat_config().label(false).to_string();
    button.set_text_content(Some(&label));

    let scene = scene.clone();
    let target = button.clone();
    browser::add_listener(&button, "click", move || {
        let scene = scene.clone();
        let button = target.clone();
        button.set_disabled(true);
        browser::spawn_local(async move {
            match game::toggle_hat(&*scene, &HtmlImageLoader).await {
                Ok(Some(worn)) => {
                    let label = scene.borrow().hat_config().label(worn).to_string();
                    button.set_text_content(Some(&label));
                }
                Ok(None) => log::info!("no fish to put a hat on yet"),
                Err(err) => {
                    log::error!("{:#}", err);
                    // outermost context only, e.g. "Could not load fishhat.png"
                    if let Err(err) = browser::alert(&err.to_string()) {
                        log::error!("{:#}", err);
                    }
                }
            }
            button.set_disabled(false);
        });
    })
}

/// Resize the canvas to the space it is given. Outside fullscreen the tank
/// only shrinks, never grows past its logical size.
fn fit_canvas(scene: &SharedAquarium, canvas: &HtmlCanvasElement) {
    let (width, height) = match browser::inner_size() {
        Ok(size) => size,
        Err(err) => {
            log::error!("{:#}", err);
            return;
        }
    };
    let physical = scene
        .borrow_mut()
        .resize(Size::new(width, height), browser::is_fullscreen());
    canvas.set_width(physical.width as u32);
    canvas.set_height(physical.height as u32);
    log::info!(
        "canvas resized to {}x{} (scale {:.3})",
        physical.width,
        physical.height,
        scene.borrow().scale().factor
    );
}

fn reveal_controls(controls: &HtmlElement, timer: &Rc<RefCell<ControlsTimer>>, delay: i32) {
    if let Err(err) = browser::set_visible(controls, true) {
        log::error!("{:#}", err);
    }
    let generation = timer.borrow_mut().activity();

    let controls = controls.clone();
    let timer = timer.clone();
    let scheduled = browser::set_timeout(delay, move || {
        if timer.borrow().should_hide(generation, browser::is_fullscreen()) {
            if let Err(err) = browser::set_visible(&controls, false) {
                log::error!("{:#}", err);
            }
        }
    });
    if let Err(err) = scheduled {
        log::error!("{:#}", err);
    }
}
