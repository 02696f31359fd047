// ==================== Imports ====================
use anyhow::Result;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

mod browser;
pub mod config;
pub mod engine;
pub mod game;
pub mod sprite;
mod ui;

use config::SceneConfig;
use engine::{GameLoop, HtmlImageLoader};
use game::Aquarium;

// ==================== Main Functions ====================
/// Main entry for Webassembly module
/// - reads the scene manifest
/// - wires the controls
/// - starts every asset load independently
/// - starts drawing
#[wasm_bindgen]
pub fn main_js() -> Result<(), JsValue> {
    // setup better panic messages for debugging
    console_error_panic_hook::set_once();
    browser::init_logger(log::LevelFilter::Info);

    browser::spawn_local(async move {
        if let Err(err) = run().await {
            log::error!("aquarium failed to start : {:#}", err);
        }
    });

    Ok(())
}

async fn run() -> Result<()> {
    let config = SceneConfig::load_or_default(config::SCENE_PATH).await;
    let scene = Rc::new(RefCell::new(Aquarium::new(&config, browser::now()?)));

    ui::wire(&scene, &config)?;

    // no ordering between loads, each one lands in the tank when it resolves
    {
        let scene = scene.clone();
        let path = config.background.clone();
        browser::spawn_local(async move {
            game::load_background(&*scene, &HtmlImageLoader, &path).await;
        });
    }
    for creature in config.creatures {
        let scene = scene.clone();
        browser::spawn_local(async move {
            game::spawn_creature(&*scene, &HtmlImageLoader, &creature).await;
        });
    }

    GameLoop::start(scene)
}
