use crate::browser;
use crate::engine::{Point, Size};
use crate::sprite::motion::{Bounds, MotionProfile};
use crate::sprite::SpriteSheet;
use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

pub const SCENE_PATH: &str = "scene.json";

/// Everything that describes a tank. Loaded from `scene.json` when present,
/// any field left out falls back to the built-in scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// logical design space, motion never sees physical pixels
    pub width: f64,
    pub height: f64,
    pub padding: f64,
    pub background: String,
    pub hat: HatConfig,
    pub controls_hide_delay_ms: i32,
    pub creatures: Vec<CreatureConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HatConfig {
    /// name of the creature that wears the hat
    pub target: String,
    pub plain: String,
    pub hatted: String,
    pub wear_label: String,
    pub remove_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureConfig {
    pub name: String,
    pub image: String,
    pub sheet: SpriteSheet,
    /// drawn size is the frame size times this
    #[serde(default = "CreatureConfig::default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub placement: Placement,
    pub motion: MotionProfile,
}

/// Where a creature starts, in logical units
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Placement {
    #[default]
    Center,
    /// horizontally centred, `margin` above the floor
    Floor { margin: f64 },
    At { x: f64, y: f64 },
}

impl Placement {
    pub fn resolve(&self, width: f64, height: f64, size: Size) -> Point {
        match *self {
            Placement::Center => Point::new(
                width / 2.0 - size.width / 2.0,
                height / 2.0 - size.height / 2.0,
            ),
            Placement::Floor { margin } => Point::new(
                width / 2.0 - size.width / 2.0,
                height - size.height - margin,
            ),
            Placement::At { x, y } => Point::new(x, y),
        }
    }
}

impl CreatureConfig {
    fn default_scale() -> f64 {
        3.0
    }

    fn new(
        name: &str,
        image: &str,
        sheet: SpriteSheet,
        placement: Placement,
        motion: MotionProfile,
    ) -> Self {
        CreatureConfig {
            name: name.to_string(),
            image: image.to_string(),
            sheet,
            scale: Self::default_scale(),
            placement,
            motion,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(
            self.sheet.frame_width * self.scale,
            self.sheet.frame_height * self.scale,
        )
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.scale.is_finite() && self.scale > 0.0,
            "scale must be positive, got {}",
            self.scale
        );
        self.sheet.validate()?;
        self.motion.validate()
    }
}

impl Default for HatConfig {
    fn default() -> Self {
        HatConfig {
            target: "fish".to_string(),
            plain: "fish.png".to_string(),
            hatted: "fishhat.png".to_string(),
            wear_label: "Give Fishy a hat! 🎩".to_string(),
            remove_label: "Take the hat off".to_string(),
        }
    }
}

impl HatConfig {
    pub fn path(&self, wear: bool) -> &str {
        if wear {
            &self.hatted
        } else {
            &self.plain
        }
    }

    /// Label offering the next toggle
    pub fn label(&self, worn: bool) -> &str {
        if worn {
            &self.remove_label
        } else {
            &self.wear_label
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        let fish = SpriteSheet::strip(32.0, 32.0, 3, 8.0);
        SceneConfig {
            width: 760.0,
            height: 560.0,
            padding: 20.0,
            background: "background.png".to_string(),
            hat: HatConfig::default(),
            controls_hide_delay_ms: 1500,
            creatures: vec![
                CreatureConfig::new(
                    "fish",
                    "fish.png",
                    fish,
                    Placement::Center,
                    MotionProfile::float_drift(),
                ),
                CreatureConfig::new(
                    "snippy",
                    "snippy.png",
                    SpriteSheet::strip(32.0, 32.0, 4, 10.0),
                    Placement::Floor { margin: 20.0 },
                    MotionProfile::walk(),
                ),
                CreatureConfig::new(
                    "drifter",
                    "slowfish.png",
                    fish,
                    Placement::At { x: 120.0, y: 120.0 },
                    MotionProfile::slow(),
                ),
                CreatureConfig::new(
                    "dart",
                    "fastfish.png",
                    SpriteSheet::strip(32.0, 32.0, 3, 12.0),
                    Placement::At { x: 520.0, y: 140.0 },
                    MotionProfile::fast(),
                ),
                CreatureConfig::new(
                    "glider",
                    "hoverfish.png",
                    fish,
                    Placement::At { x: 600.0, y: 60.0 },
                    MotionProfile::hover(),
                ),
                CreatureConfig::new(
                    "puffy",
                    "puffy.png",
                    SpriteSheet::strip(32.0, 32.0, 4, 6.0),
                    Placement::At { x: 560.0, y: 330.0 },
                    MotionProfile::puffy(),
                ),
                CreatureConfig::new(
                    "jelly",
                    "jelly.png",
                    SpriteSheet::strip(32.0, 32.0, 4, 5.0),
                    Placement::At { x: 90.0, y: 300.0 },
                    MotionProfile::jelly(),
                ),
            ],
        }
    }
}

impl SceneConfig {
    pub fn bounds(&self) -> Bounds {
        Bounds {
            width: self.width,
            height: self.height,
            padding: self.padding,
        }
    }

    pub fn logical_size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn creature(&self, name: &str) -> Option<&CreatureConfig> {
        self.creatures.iter().find(|creature| creature.name == name)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.width > 0.0 && self.height > 0.0,
            "scene size must be positive, got {}x{}",
            self.width,
            self.height
        );
        ensure!(self.padding >= 0.0, "padding can't be negative");
        ensure!(
            self.controls_hide_delay_ms >= 0,
            "controls hide delay can't be negative"
        );
        for creature in &self.creatures {
            creature
                .validate()
                .with_context(|| format!("invalid creature '{}'", creature.name))?;
        }
        Ok(())
    }

    /// Fetch and validate the scene manifest
    pub async fn fetch(path: &str) -> Result<SceneConfig> {
        let config = browser::fetch_json::<SceneConfig>(path)
            .await
            .with_context(|| format!("Failed to load scene from : {}", path))?;
        config.validate()?;
        Ok(config)
    }

    /// Like `fetch`, but a missing or broken manifest only costs a warning
    pub async fn load_or_default(path: &str) -> SceneConfig {
        match Self::fetch(path).await {
            Ok(config) => config,
            Err(err) => {
                log::warn!("{:#}, using the built-in scene", err);
                SceneConfig::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_scene_is_valid() {
        let config = SceneConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.creature(&config.hat.target).is_some());
    }

    #[test]
    fn center_and_floor_placements_match_the_tank() {
        let size = Size::new(96.0, 96.0);

        let center = Placement::Center.resolve(760.0, 560.0, size);
        assert_relative_eq!(center.x, 332.0);
        assert_relative_eq!(center.y, 232.0);

        let floor = Placement::Floor { margin: 20.0 }.resolve(760.0, 560.0, size);
        assert_relative_eq!(floor.x, 332.0);
        assert_relative_eq!(floor.y, 444.0);
    }

    #[test]
    fn creature_size_is_frame_times_scale() {
        let config = SceneConfig::default();
        let crab = config.creature("snippy").unwrap();
        assert_eq!(crab.size(), Size::new(96.0, 96.0));
    }

    #[test]
    fn hat_labels_offer_the_next_toggle() {
        let hat = HatConfig::default();
        assert_eq!(hat.label(false), hat.wear_label);
        assert_eq!(hat.label(true), hat.remove_label);
        assert_eq!(hat.path(true), "fishhat.png");
        assert_eq!(hat.path(false), "fish.png");
    }

    #[test]
    fn validate_names_the_broken_creature() {
        let mut config = SceneConfig::default();
        config.creatures[1].sheet.fps = 0.0;

        let err = config.validate().unwrap_err();
        assert!(format!("{:#}", err).contains("snippy"));
    }

    #[test]
    fn zero_sized_scene_is_rejected() {
        let config = SceneConfig {
            width: 0.0,
            ..SceneConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
