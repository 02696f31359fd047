use crate::config::{CreatureConfig, HatConfig, SceneConfig};
use crate::engine::{Game, ImageLoader, Rect, Renderer, Scale, Size, Surface};
use crate::sprite::motion::Bounds;
use crate::sprite::Sprite;
use anyhow::{Context, Result};
use std::cell::RefCell;
use web_sys::HtmlImageElement;

/// TABLE
/// ┌───────────────────── Aquarium Overview ─────────────────────────────────┐
/// │                                                                         │
/// │    ┌─────────────┐  update(now)  ┌─────────────┐  update(now)           │
/// │    │  engine.rs  ├──────────────►│   game.rs   ├──────────► Sprite ...  │
/// │    │  GameLoop   │  draw         │  Aquarium   │  draw                  │
/// │    └─────────────┘               └──────▲──────┘                        │
/// │                                         │ borrow_mut between frames     │
/// │                        ┌────────────────┴───────────────┐               │
/// │                        │ asset continuations, ui.rs     │               │
/// │                        │ (spawn_creature, toggle_hat)   │               │
/// │                        └────────────────────────────────┘               │
/// └─────────────────────────────────────────────────────────────────────────┘
///
/// Owns everything drawn each frame. `I` is the image handle so the scene
/// logic runs without a browser.
pub struct Aquarium<I> {
    bounds: Bounds,
    logical: Size,
    scale: Scale,
    background: Option<I>,
    sprites: Vec<Sprite<I>>,
    hat: Hat<I>,
    // time of the latest frame, new sprites start their motion from here
    clock: f64,
}

/// Hat toggle bookkeeping. Whichever strip is not on the fish is kept here
/// once it has been loaded.
struct Hat<I> {
    config: HatConfig,
    worn: bool,
    spare_plain: Option<I>,
    spare_hatted: Option<I>,
}

impl<I> Hat<I> {
    fn spare(&mut self, wear: bool) -> &mut Option<I> {
        if wear {
            &mut self.spare_hatted
        } else {
            &mut self.spare_plain
        }
    }
}

/// Outcome of pressing the hat button
#[derive(Debug, Clone, PartialEq)]
pub enum HatRequest {
    /// swapped from cache, `worn` is the new state
    Applied { worn: bool },
    /// the strip for `wear` has to be loaded from `path` first
    Load { wear: bool, path: String },
    /// the hat wearer has not arrived yet
    Unavailable,
}

impl<I> Aquarium<I> {
    pub fn new(config: &SceneConfig, now: f64) -> Self {
        Aquarium {
            bounds: config.bounds(),
            logical: config.logical_size(),
            scale: Scale::default(),
            background: None,
            sprites: Vec::new(),
            hat: Hat {
                config: config.hat.clone(),
                worn: false,
                spare_plain: None,
                spare_hatted: None,
            },
            clock: now,
        }
    }

    pub fn set_background(&mut self, image: I) {
        self.background = Some(image);
    }

    /// Build the sprite for a creature whose strip just resolved
    pub fn add_creature(&mut self, creature: &CreatureConfig, image: I) -> Result<()> {
        let size = creature.size();
        let position = creature
            .placement
            .resolve(self.logical.width, self.logical.height, size);
        let sprite = Sprite::new(
            creature.name.as_str(),
            image,
            creature.sheet,
            creature.motion,
            position,
            size,
            self.clock,
        )
        .with_context(|| format!("Could not create creature '{}'", creature.name))?;
        log::info!("{} joined the tank", creature.name);
        self.sprites.push(sprite);
        Ok(())
    }

    /// Recompute the logical -> physical factor for the space the canvas may
    /// take, returns the physical canvas size to apply
    pub fn resize(&mut self, available: Size, allow_upscale: bool) -> Size {
        let scale = Scale::fit(self.logical, available);
        self.scale = if allow_upscale {
            scale
        } else {
            scale.capped(1.0)
        };
        self.scale.size(self.logical)
    }

    pub fn advance(&mut self, now: f64) {
        self.clock = now;
        for sprite in self.sprites.iter_mut() {
            sprite.update(now, &self.bounds);
        }
    }

    pub fn render<S: Surface<Image = I>>(&self, surface: &S) {
        let canvas = Rect::new(Default::default(), self.scale.size(self.logical));
        surface.clear(&canvas);
        // draw order matters : background -> creatures in arrival order
        if let Some(background) = &self.background {
            surface.draw_image(background, &canvas);
        }
        for sprite in &self.sprites {
            sprite.draw(surface, self.scale);
        }
    }

    pub fn toggle_hat(&mut self) -> HatRequest {
        let wear = !self.hat.worn;
        let Some(index) = self.hat_wearer() else {
            return HatRequest::Unavailable;
        };
        match self.hat.spare(wear).take() {
            Some(image) => {
                self.dress(index, wear, image);
                HatRequest::Applied { worn: wear }
            }
            None => HatRequest::Load {
                wear,
                path: self.hat.config.path(wear).to_string(),
            },
        }
    }

    /// Apply a strip loaded for a `HatRequest::Load`. A result that no
    /// longer matches the requested state is cached instead. Returns the new
    /// hat state when the image was put on.
    pub fn finish_hat(&mut self, wear: bool, image: I) -> Option<bool> {
        if wear == self.hat.worn {
            *self.hat.spare(wear) = Some(image);
            return None;
        }
        let index = self.hat_wearer()?;
        self.dress(index, wear, image);
        Some(wear)
    }

    fn dress(&mut self, index: usize, wear: bool, image: I) {
        let previous = self.sprites[index].swap_image(image);
        *self.hat.spare(!wear) = Some(previous);
        self.hat.worn = wear;
    }

    fn hat_wearer(&self) -> Option<usize> {
        self.sprites
            .iter()
            .position(|sprite| sprite.name() == self.hat.config.target)
    }

    pub fn hat_worn(&self) -> bool {
        self.hat.worn
    }

    pub fn hat_config(&self) -> &HatConfig {
        &self.hat.config
    }

    pub fn sprites(&self) -> &[Sprite<I>] {
        &self.sprites
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }
}

impl Game for Aquarium<HtmlImageElement> {
    fn update(&mut self, now: f64) {
        self.advance(now);
    }

    fn draw(&self, renderer: &Renderer) {
        self.render(renderer);
    }
}

/// Load the background. A failure leaves the tank with a cleared canvas.
pub async fn load_background<L: ImageLoader>(
    scene: &RefCell<Aquarium<L::Image>>,
    loader: &L,
    path: &str,
) {
    match loader
        .load(path)
        .await
        .with_context(|| format!("Failed to load background from : {}", path))
    {
        Ok(image) => scene.borrow_mut().set_background(image),
        Err(err) => log::error!("{:#}", err),
    }
}

/// Load a creature's strip and add it to the tank. A failure only costs
/// that creature.
pub async fn spawn_creature<L: ImageLoader>(
    scene: &RefCell<Aquarium<L::Image>>,
    loader: &L,
    creature: &CreatureConfig,
) {
    let result = loader
        .load(&creature.image)
        .await
        .with_context(|| format!("Failed to load creature image from : {}", creature.image))
        .and_then(|image| scene.borrow_mut().add_creature(creature, image));
    if let Err(err) = result {
        log::error!("{:#}", err);
    }
}

/// Press the hat button. `Ok(Some(worn))` when the fish changed,
/// `Ok(None)` when there was nothing to change.
pub async fn toggle_hat<L: ImageLoader>(
    scene: &RefCell<Aquarium<L::Image>>,
    loader: &L,
) -> Result<Option<bool>> {
    // the borrow must end before awaiting, the render loop needs the scene
    let request = scene.borrow_mut().toggle_hat();
    match request {
        HatRequest::Applied { worn } => Ok(Some(worn)),
        HatRequest::Unavailable => Ok(None),
        HatRequest::Load { wear, path } => {
            let image = loader
                .load(&path)
                .await
                .with_context(|| format!("Could not load {}", path))?;
            Ok(scene.borrow_mut().finish_hat(wear, image))
        }
    }
}
