// TABLE:
// ┌──────────────────────────────────────────────────────────────────────────┐
// │                      Directory Structure Analogy                         │
// ├───────────────────┬──────────────────────────────────────────────────────┤
// │ Code Directory    │          Aquarium Equivalent                         │
// ├───────────────────┼──────────────────────────────────────────────────────┤
// │ src/              │ The tank                                             │
// │ ├── lib.rs        │ Switching the tank light on                          │
// │ ├── config.rs     │ Stocking list (which creatures, where)               │
// │ ├── game.rs       │ The tank contents, background + creatures            │
// │ ├── ui.rs         │ Buttons on the glass                                 │
// │ └── sprite/       │ One creature                                         │
// │     ├── mod.rs    │ Its sprite sheet + how it is drawn                   │
// │     ├── animator  │ Flipping through the frames                          │
// │     └── motion    │ How it swims                                         │
// └───────────────────┴──────────────────────────────────────────────────────┘

pub mod animator;
pub mod motion;

use self::animator::FrameAnimator;
use self::motion::{Bounds, MotionProfile, MotionState};
use crate::engine::{Point, Rect, Scale, Size, Surface};
use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// Layout of a frame strip : equally sized cells, row-major
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteSheet {
    pub frame_width: f64,
    pub frame_height: f64,
    pub frame_count: usize,
    /// cells per row, a single strip when omitted
    #[serde(default)]
    pub columns: Option<usize>,
    pub fps: f64,
}

impl SpriteSheet {
    pub fn strip(frame_width: f64, frame_height: f64, frame_count: usize, fps: f64) -> Self {
        SpriteSheet {
            frame_width,
            frame_height,
            frame_count,
            columns: None,
            fps,
        }
    }

    pub fn columns(&self) -> usize {
        self.columns.unwrap_or(self.frame_count).max(1)
    }

    /// Source sub-rectangle of `frame` inside the sheet image
    pub fn source_rect(&self, frame: usize) -> Rect {
        let columns = self.columns();
        Rect::from_xywh(
            (frame % columns) as f64 * self.frame_width,
            (frame / columns) as f64 * self.frame_height,
            self.frame_width,
            self.frame_height,
        )
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.frame_width > 0.0 && self.frame_height > 0.0,
            "frame size must be positive, got {}x{}",
            self.frame_width,
            self.frame_height
        );
        ensure!(self.frame_count > 0, "sheet needs at least one frame");
        ensure!(self.columns != Some(0), "sheet needs at least one column");
        ensure!(
            self.fps.is_finite() && self.fps > 0.0,
            "animation speed must be positive, got {} fps",
            self.fps
        );
        Ok(())
    }
}

/// One creature in the tank : frame strip + animator + motion.
///
/// `I` is the image handle, `HtmlImageElement` in the browser.
pub struct Sprite<I> {
    name: String,
    image: I,
    sheet: SpriteSheet,
    animator: FrameAnimator,
    profile: MotionProfile,
    motion: MotionState,
    size: Size,
}

impl<I> Sprite<I> {
    pub fn new(
        name: impl Into<String>,
        image: I,
        sheet: SpriteSheet,
        profile: MotionProfile,
        position: Point,
        size: Size,
        now: f64,
    ) -> Result<Self> {
        sheet.validate()?;
        profile.validate()?;
        Ok(Sprite {
            name: name.into(),
            image,
            animator: FrameAnimator::new(sheet.frame_count, sheet.fps, now)?,
            sheet,
            profile,
            motion: MotionState::new(position, now),
            size,
        })
    }

    pub fn update(&mut self, now: f64, bounds: &Bounds) {
        self.animator.advance(now);
        self.profile
            .advance(&mut self.motion, now, bounds, self.size);
    }

    /// Replace the frame strip, animation and motion carry on untouched.
    /// Returns the previous image.
    pub fn swap_image(&mut self, image: I) -> I {
        std::mem::replace(&mut self.image, image)
    }

    pub fn draw<S: Surface<Image = I>>(&self, surface: &S, scale: Scale) {
        let frame = self.sheet.source_rect(self.animator.frame_index());
        let destination = scale.rect(&Rect::new(self.motion.position(), self.size));

        surface.save();

        let rotation = self.motion.rotation();
        if rotation != 0.0 {
            let center = destination.center();
            surface.translate(center.x, center.y);
            surface.rotate(rotation);
            surface.translate(-center.x, -center.y);
        }

        if self.motion.facing_right() {
            // strips face left, mirror about the sprite's own centre line
            surface.translate(destination.x() + destination.width(), destination.y());
            surface.scale(-1.0, 1.0);
            surface.draw_frame(
                &self.image,
                &frame,
                &Rect::new(Point::default(), destination.size),
            );
        } else {
            surface.draw_frame(&self.image, &frame, &destination);
        }

        surface.restore();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image(&self) -> &I {
        &self.image
    }

    pub fn frame_index(&self) -> usize {
        self.animator.frame_index()
    }

    pub fn motion(&self) -> &MotionState {
        &self.motion
    }
}
