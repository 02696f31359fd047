use crate::engine::{Point, Size};
use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Region sprites are kept inside, in logical units
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
}

impl Bounds {
    /// Allowed range for the top-left corner on the x axis
    pub fn x_range(&self, size: Size) -> (f64, f64) {
        (self.padding, self.width - size.width - self.padding)
    }

    pub fn y_range(&self, size: Size) -> (f64, f64) {
        (self.padding, self.height - size.height - self.padding)
    }
}

/// One sinusoidal term : `amplitude` logical units over `period` ms
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wave {
    pub amplitude: f64,
    pub period: f64,
}

impl Wave {
    pub const fn new(amplitude: f64, period: f64) -> Self {
        Wave { amplitude, period }
    }

    fn phase(&self, elapsed: f64) -> f64 {
        elapsed / self.period * TAU
    }

    pub fn sin(&self, elapsed: f64) -> f64 {
        self.phase(elapsed).sin() * self.amplitude
    }

    pub fn cos(&self, elapsed: f64) -> f64 {
        self.phase(elapsed).cos() * self.amplitude
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.period.is_finite() && self.period > 0.0,
            "wave period must be positive, got {}",
            self.period
        );
        ensure!(self.amplitude.is_finite(), "wave amplitude must be finite");
        Ok(())
    }
}

/// Sine on x, cosine on y
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Orbit {
    pub x: Wave,
    pub y: Wave,
}

impl Orbit {
    pub const fn new(x: Wave, y: Wave) -> Self {
        Orbit { x, y }
    }

    pub fn offset(&self, elapsed: f64) -> Point {
        Point::new(self.x.sin(elapsed), self.y.cos(elapsed))
    }

    fn validate(&self) -> Result<()> {
        self.x.validate()?;
        self.y.validate()
    }
}

/// Per-sprite motion bookkeeping.
///
/// `anchor` is what a profile perturbs, `position` is the clamped result
/// that gets drawn.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MotionState {
    anchor: Point,
    position: Point,
    facing_right: bool,
    start: f64,
    last_tick: f64,
    rotation: f64,
}

impl MotionState {
    pub fn new(position: Point, now: f64) -> Self {
        MotionState {
            anchor: position,
            position,
            facing_right: false,
            start: now,
            last_tick: now,
            rotation: 0.0,
        }
    }

    pub fn anchor(&self) -> Point {
        self.anchor
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn facing_right(&self) -> bool {
        self.facing_right
    }

    /// Draw-time rotation in radians, only puffers use it
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    fn face_towards(&mut self, next_x: f64) {
        if next_x > self.position.x {
            self.facing_right = true;
        } else if next_x < self.position.x {
            self.facing_right = false;
        }
    }

    fn clamp_x(&mut self, bounds: &Bounds, size: Size) {
        let (low, high) = bounds.x_range(size);
        clamp_and_snap(&mut self.position.x, &mut self.anchor.x, low, high);
    }

    fn clamp_y(&mut self, bounds: &Bounds, size: Size) {
        let (low, high) = bounds.y_range(size);
        clamp_and_snap(&mut self.position.y, &mut self.anchor.y, low, high);
    }
}

/// Clamp `position` into `[low, high]`. When it had to move, the anchor
/// moves with it so the next tick oscillates around the boundary instead of
/// re-running the original trajectory into it.
///
/// Returns true when the position was clamped.
pub fn clamp_and_snap(position: &mut f64, anchor: &mut f64, low: f64, high: f64) -> bool {
    if *position < low {
        *position = low;
    } else if *position > high {
        *position = high;
    } else {
        return false;
    }
    *anchor = *position;
    true
}

/// How a sprite moves through the tank. Every variant is a closed form of
/// elapsed time around the sprite's anchor.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MotionProfile {
    /// Back and forth along the floor, y never changes
    Walk { stride: Wave },
    /// Two superimposed orbits, kept inside the tank
    Float { primary: Orbit, secondary: Orbit },
    /// Float-like bob on top of a constant sideways drift. Leaving the tank
    /// on the left re-enters it on the right, y stays clamped.
    Hover {
        primary: Orbit,
        secondary: Orbit,
        /// logical units per ms added to the anchor
        drift_speed: f64,
    },
    /// Small bob plus a rocking rotation, never clamped
    Puffy { bob: Orbit, spin: Wave },
    /// Slow bob around its own anchor, always facing the same way
    Jelly { bob: Orbit },
}

impl MotionProfile {
    pub const fn walk() -> Self {
        MotionProfile::Walk {
            stride: Wave::new(150.0, 25_000.0),
        }
    }

    pub const fn float_drift() -> Self {
        MotionProfile::Float {
            primary: Orbit::new(Wave::new(80.0, 4_000.0), Wave::new(60.0, 5_000.0)),
            secondary: Orbit::new(Wave::new(100.0, 8_000.0), Wave::new(80.0, 10_000.0)),
        }
    }

    pub const fn slow() -> Self {
        MotionProfile::Float {
            primary: Orbit::new(Wave::new(40.0, 8_000.0), Wave::new(30.0, 10_000.0)),
            secondary: Orbit::new(Wave::new(60.0, 16_000.0), Wave::new(40.0, 20_000.0)),
        }
    }

    pub const fn fast() -> Self {
        MotionProfile::Float {
            primary: Orbit::new(Wave::new(110.0, 2_500.0), Wave::new(80.0, 3_000.0)),
            secondary: Orbit::new(Wave::new(130.0, 5_000.0), Wave::new(90.0, 6_000.0)),
        }
    }

    pub const fn hover() -> Self {
        MotionProfile::Hover {
            primary: Orbit::new(Wave::new(30.0, 6_000.0), Wave::new(25.0, 4_000.0)),
            secondary: Orbit::new(Wave::new(15.0, 11_000.0), Wave::new(20.0, 9_000.0)),
            drift_speed: -0.04,
        }
    }

    pub const fn puffy() -> Self {
        MotionProfile::Puffy {
            bob: Orbit::new(Wave::new(12.0, 3_000.0), Wave::new(10.0, 2_400.0)),
            spin: Wave::new(0.15, 4_000.0),
        }
    }

    pub const fn jelly() -> Self {
        MotionProfile::Jelly {
            bob: Orbit::new(Wave::new(20.0, 7_000.0), Wave::new(35.0, 5_000.0)),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            MotionProfile::Walk { stride } => stride.validate(),
            MotionProfile::Float { primary, secondary } => {
                primary.validate()?;
                secondary.validate()
            }
            MotionProfile::Hover {
                primary,
                secondary,
                drift_speed,
            } => {
                ensure!(drift_speed.is_finite(), "drift speed must be finite");
                primary.validate()?;
                secondary.validate()
            }
            MotionProfile::Puffy { bob, spin } => {
                bob.validate()?;
                spin.validate()
            }
            MotionProfile::Jelly { bob } => bob.validate(),
        }
    }

    /// Move `state` to where this profile puts it at `now`.
    ///
    /// Calling again with the same (or an older) timestamp changes nothing.
    pub fn advance(&self, state: &mut MotionState, now: f64, bounds: &Bounds, size: Size) {
        if now <= state.last_tick {
            return;
        }
        let elapsed = now - state.start;
        let delta = now - state.last_tick;
        state.last_tick = now;

        match *self {
            MotionProfile::Walk { stride } => {
                let x = state.anchor.x + stride.sin(elapsed);
                state.face_towards(x);
                state.position.x = x;
                state.clamp_x(bounds, size);
            }
            MotionProfile::Float { primary, secondary } => {
                let next = state.anchor + primary.offset(elapsed) + secondary.offset(elapsed);
                state.face_towards(next.x);
                state.position = next;
                state.clamp_x(bounds, size);
                state.clamp_y(bounds, size);
            }
            MotionProfile::Hover {
                primary,
                secondary,
                drift_speed,
            } => {
                state.anchor.x += drift_speed * delta;
                state.position =
                    state.anchor + primary.offset(elapsed) + secondary.offset(elapsed);
                // left exit only, the drift is one-directional. A long stall
                // can leave it several tank widths out, wrap in one step.
                if state.position.x + size.width < 0.0 {
                    let span = bounds.width + size.width;
                    let wrapped = (state.position.x + size.width).rem_euclid(span) - size.width;
                    state.anchor.x += wrapped - state.position.x;
                    state.position.x = wrapped;
                }
                state.clamp_y(bounds, size);
            }
            MotionProfile::Puffy { bob, spin } => {
                let next = state.anchor + bob.offset(elapsed);
                state.face_towards(next.x);
                state.position = next;
                state.rotation = spin.sin(elapsed);
            }
            MotionProfile::Jelly { bob } => {
                state.position = state.anchor + bob.offset(elapsed);
                state.clamp_x(bounds, size);
                state.clamp_y(bounds, size);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    const TANK: Bounds = Bounds {
        width: 760.0,
        height: 560.0,
        padding: 20.0,
    };
    const SPRITE: Size = Size {
        width: 96.0,
        height: 96.0,
    };

    fn walk_from(x: f64) -> MotionState {
        MotionState::new(Point::new(x, 444.0), 0.0)
    }

    fn still() -> Orbit {
        Orbit::new(Wave::new(0.0, 1_000.0), Wave::new(0.0, 1_000.0))
    }

    #[test]
    fn walk_follows_a_sine_around_its_anchor() {
        let profile = MotionProfile::walk();

        let mut quarter = walk_from(400.0);
        profile.advance(&mut quarter, 6_250.0, &TANK, SPRITE);
        assert_relative_eq!(quarter.position().x, 550.0, epsilon = 1e-9);

        let mut half = walk_from(400.0);
        profile.advance(&mut half, 12_500.0, &TANK, SPRITE);
        assert_abs_diff_eq!(half.position().x, 400.0, epsilon = 1e-9);

        let mut full = walk_from(400.0);
        profile.advance(&mut full, 25_000.0, &TANK, SPRITE);
        assert_abs_diff_eq!(full.position().x, 400.0, epsilon = 1e-9);
    }

    #[test]
    fn walk_keeps_its_height() {
        let mut state = walk_from(400.0);
        MotionProfile::walk().advance(&mut state, 3_000.0, &TANK, SPRITE);
        assert_relative_eq!(state.position().y, 444.0);
    }

    #[test]
    fn right_edge_clamps_and_snaps_the_anchor() {
        let mut state = walk_from(600.0);
        let profile = MotionProfile::walk();

        // unclamped target is 750, past 760 - 20
        profile.advance(&mut state, 6_250.0, &TANK, SPRITE);
        let edge = TANK.width - SPRITE.width - TANK.padding;
        assert_eq!(state.position().x, edge);
        assert_eq!(state.anchor().x, edge);

        // next tick swings around the snapped anchor, not the original one
        profile.advance(&mut state, 12_500.0, &TANK, SPRITE);
        assert_abs_diff_eq!(state.position().x, edge, epsilon = 1e-9);
        profile.advance(&mut state, 18_750.0, &TANK, SPRITE);
        assert_relative_eq!(state.position().x, edge - 150.0, epsilon = 1e-9);
    }

    #[test]
    fn left_edge_clamps_to_padding() {
        let mut state = walk_from(100.0);
        MotionProfile::walk().advance(&mut state, 18_750.0, &TANK, SPRITE);

        assert_eq!(state.position().x, TANK.padding);
        assert_eq!(state.anchor().x, TANK.padding);
    }

    #[test]
    fn clamp_and_snap_leaves_values_in_range_alone() {
        let (mut position, mut anchor) = (50.0, 40.0);
        assert!(!clamp_and_snap(&mut position, &mut anchor, 20.0, 100.0));
        assert_eq!((position, anchor), (50.0, 40.0));

        let (mut position, mut anchor) = (150.0, 40.0);
        assert!(clamp_and_snap(&mut position, &mut anchor, 20.0, 100.0));
        assert_eq!((position, anchor), (100.0, 100.0));
    }

    #[test]
    fn facing_follows_the_sign_of_the_x_delta() {
        let profile = MotionProfile::walk();
        let mut state = walk_from(400.0);

        profile.advance(&mut state, 1_000.0, &TANK, SPRITE);
        assert!(state.facing_right());

        profile.advance(&mut state, 15_000.0, &TANK, SPRITE);
        assert!(!state.facing_right());
    }

    #[test]
    fn facing_is_kept_when_x_does_not_change() {
        let profile = MotionProfile::Walk {
            stride: Wave::new(0.0, 25_000.0),
        };
        let mut state = walk_from(400.0);
        state.facing_right = true;

        profile.advance(&mut state, 1_000.0, &TANK, SPRITE);
        profile.advance(&mut state, 2_000.0, &TANK, SPRITE);
        assert!(state.facing_right());
    }

    #[test]
    fn float_combines_both_orbits() {
        let profile = MotionProfile::float_drift();
        let mut state = MotionState::new(Point::new(330.0, 230.0), 0.0);

        profile.advance(&mut state, 1_000.0, &TANK, SPRITE);

        let x = 330.0 + (TAU / 4.0).sin() * 80.0 + (TAU / 8.0).sin() * 100.0;
        let y = 230.0 + (TAU / 5.0).cos() * 60.0 + (TAU / 10.0).cos() * 80.0;
        assert_relative_eq!(state.position().x, x, epsilon = 1e-9);
        assert_relative_eq!(state.position().y, y, epsilon = 1e-9);
    }

    #[test]
    fn float_stays_inside_the_tank() {
        let profile = MotionProfile::fast();
        let mut state = MotionState::new(Point::new(330.0, 230.0), 0.0);
        let (min_x, max_x) = TANK.x_range(SPRITE);
        let (min_y, max_y) = TANK.y_range(SPRITE);

        for step in 1..2_000 {
            profile.advance(&mut state, step as f64 * 16.0, &TANK, SPRITE);
            let position = state.position();
            assert!(position.x >= min_x && position.x <= max_x);
            assert!(position.y >= min_y && position.y <= max_y);
        }
    }

    #[test]
    fn slow_and_fast_presets_differ_only_in_parameters() {
        for profile in [MotionProfile::slow(), MotionProfile::fast()] {
            assert!(matches!(profile, MotionProfile::Float { .. }));
            assert!(profile.validate().is_ok());
        }
        assert_ne!(MotionProfile::slow(), MotionProfile::fast());
    }

    #[test]
    fn same_timestamp_twice_does_not_move() {
        let profile = MotionProfile::float_drift();
        let mut state = MotionState::new(Point::new(600.0, 400.0), 0.0);

        profile.advance(&mut state, 1_234.0, &TANK, SPRITE);
        let before = state;
        profile.advance(&mut state, 1_234.0, &TANK, SPRITE);

        assert_eq!(state, before);
    }

    #[test]
    fn hover_drifts_and_wraps_from_left_to_right() {
        let profile = MotionProfile::Hover {
            primary: still(),
            secondary: still(),
            drift_speed: -1.0,
        };
        let mut state = MotionState::new(Point::new(10.0, 200.0), 0.0);

        profile.advance(&mut state, 100.0, &TANK, SPRITE);
        assert_relative_eq!(state.position().x, -90.0);

        // x + width < 0 : re-enter from the right edge
        profile.advance(&mut state, 200.0, &TANK, SPRITE);
        assert_relative_eq!(state.position().x, -190.0 + 760.0 + 96.0);
        assert_relative_eq!(state.anchor().x, state.position().x);
        assert!(!state.facing_right());
    }

    #[test]
    fn hover_wraps_back_in_after_a_long_stall() {
        let profile = MotionProfile::hover();
        let mut state = MotionState::new(Point::new(600.0, 60.0), 0.0);
        profile.advance(&mut state, 16.0, &TANK, SPRITE);

        // a hidden tab pauses frames for an hour
        profile.advance(&mut state, 3_600_016.0, &TANK, SPRITE);

        let x = state.position().x;
        assert!(x + SPRITE.width >= 0.0, "still off-screen at x = {}", x);
        assert!(x < TANK.width);

        // the bob continues from the wrapped anchor on the next frame
        let anchor = state.anchor().x;
        profile.advance(&mut state, 3_600_032.0, &TANK, SPRITE);
        assert!((state.anchor().x - anchor).abs() < 1.0);
    }

    #[test]
    fn hover_does_not_wrap_on_the_right() {
        let profile = MotionProfile::Hover {
            primary: still(),
            secondary: still(),
            drift_speed: 1.0,
        };
        let mut state = MotionState::new(Point::new(700.0, 200.0), 0.0);

        profile.advance(&mut state, 1_000.0, &TANK, SPRITE);
        assert_relative_eq!(state.position().x, 1_700.0);
    }

    #[test]
    fn hover_clamps_only_vertically() {
        let profile = MotionProfile::Hover {
            primary: still(),
            secondary: still(),
            drift_speed: 0.0,
        };
        let mut state = MotionState::new(Point::new(-50.0, 900.0), 0.0);

        profile.advance(&mut state, 16.0, &TANK, SPRITE);
        assert_relative_eq!(state.position().x, -50.0);
        assert_relative_eq!(state.position().y, 560.0 - 96.0 - 20.0);
        assert_relative_eq!(state.anchor().y, state.position().y);
    }

    #[test]
    fn hover_drift_is_proportional_to_elapsed_ticks() {
        let profile = MotionProfile::Hover {
            primary: still(),
            secondary: still(),
            drift_speed: -0.5,
        };
        let mut state = MotionState::new(Point::new(400.0, 200.0), 0.0);

        profile.advance(&mut state, 100.0, &TANK, SPRITE);
        profile.advance(&mut state, 100.0, &TANK, SPRITE);
        profile.advance(&mut state, 300.0, &TANK, SPRITE);
        assert_relative_eq!(state.position().x, 250.0);
    }

    #[test]
    fn puffy_rocks_and_is_never_clamped() {
        let profile = MotionProfile::puffy();
        let mut state = MotionState::new(Point::new(-30.0, -30.0), 0.0);

        profile.advance(&mut state, 1_000.0, &TANK, SPRITE);

        assert!(state.position().x < TANK.padding);
        assert!(state.position().y < TANK.padding);
        assert_relative_eq!(state.rotation(), (TAU / 4.0).sin() * 0.15, epsilon = 1e-12);
    }

    #[test]
    fn jelly_bobs_around_its_anchor_and_keeps_facing() {
        let profile = MotionProfile::jelly();
        let mut state = MotionState::new(Point::new(300.0, 300.0), 0.0);

        profile.advance(&mut state, 1_750.0, &TANK, SPRITE);
        assert_relative_eq!(state.position().x, 320.0, epsilon = 1e-9);
        assert!(!state.facing_right());
        assert_eq!(state.anchor(), Point::new(300.0, 300.0));
    }

    #[test]
    fn jelly_clamps_to_the_tank() {
        let profile = MotionProfile::jelly();
        let mut state = MotionState::new(Point::new(300.0, 10.0), 0.0);

        profile.advance(&mut state, 2_500.0, &TANK, SPRITE);
        assert_eq!(state.position().y, TANK.padding);
        assert_eq!(state.anchor().y, TANK.padding);
    }

    #[test]
    fn validate_rejects_zero_periods() {
        let profile = MotionProfile::Walk {
            stride: Wave::new(150.0, 0.0),
        };
        assert!(profile.validate().is_err());
        assert!(MotionProfile::walk().validate().is_ok());
        assert!(MotionProfile::hover().validate().is_ok());
    }
}
