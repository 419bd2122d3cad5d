/// The actor (player body): kinematic state plus a two-state life-cycle.
///
/// The actor is built once and `reset` on every spawn; it is never
/// recreated while the game runs.

use std::fmt;

use super::physics::{Rect, Resolution};

/// Life-cycle: Alive → Dead → (respawn) → Alive.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LifeState {
    Alive,
    /// Frozen and hidden until the pending respawn fires.
    Dead,
}

/// Boolean intent vector for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Intent {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

impl Intent {
    /// Union of two input sources (keyboard and gamepad).
    pub fn merge(self, other: Intent) -> Intent {
        Intent {
            left: self.left || other.left,
            right: self.right || other.right,
            jump: self.jump || other.jump,
        }
    }
}

/// Kinematic constants for the actor.
#[derive(Clone, Debug)]
pub struct Kinematics {
    pub gravity: f32,
    pub move_speed: f32,
    /// Negative: up is -y.
    pub jump_velocity: f32,
}

impl Default for Kinematics {
    fn default() -> Self {
        Kinematics { gravity: 0.6, move_speed: 5.0, jump_velocity: -12.0 }
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum ActorError {
    NonPositiveSize { width: f32, height: f32 },
}

impl fmt::Display for ActorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveSize { width, height } => {
                write!(f, "actor size must be positive, got {width}x{height}")
            }
        }
    }
}

impl std::error::Error for ActorError {}

#[derive(Clone, Debug)]
pub struct Actor {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    width: f32,
    height: f32,
    pub grounded: bool,
    pub life: LifeState,
}

impl Actor {
    pub fn new(width: f32, height: f32) -> Result<Self, ActorError> {
        // Written as a negated comparison so NaN is rejected too.
        if !(width > 0.0 && height > 0.0) {
            return Err(ActorError::NonPositiveSize { width, height });
        }
        Ok(Actor {
            x: 0.0,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
            width,
            height,
            grounded: false,
            life: LifeState::Alive,
        })
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn is_dead(&self) -> bool {
        self.life == LifeState::Dead
    }

    /// Place at `start`, clear velocity and flags.
    pub fn reset(&mut self, start: (f32, f32)) {
        self.x = start.0;
        self.y = start.1;
        self.vx = 0.0;
        self.vy = 0.0;
        self.grounded = false;
        self.life = LifeState::Alive;
    }

    /// Alive → Dead. Returns false if already dead.
    pub fn die(&mut self) -> bool {
        if self.is_dead() {
            return false;
        }
        self.life = LifeState::Dead;
        self.grounded = false;
        true
    }

    /// Set velocity for this tick from intent. Returns true if a jump fired.
    ///
    /// Horizontal speed is assigned, not accumulated. Gravity accumulates.
    pub fn apply_intent(&mut self, intent: Intent, k: &Kinematics) -> bool {
        self.vx = if intent.left {
            -k.move_speed
        } else if intent.right {
            k.move_speed
        } else {
            0.0
        };

        let jumped = intent.jump && self.grounded;
        if jumped {
            self.vy = k.jump_velocity;
            self.grounded = false;
        }

        self.vy += k.gravity;
        jumped
    }

    /// Take position, velocity and grounding from a resolve result.
    pub fn apply_resolution(&mut self, res: &Resolution) {
        self.x = res.x;
        self.y = res.y;
        self.vx = res.vx;
        self.vy = res.vy;
        self.grounded = res.grounded;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor() -> Actor {
        Actor::new(30.0, 30.0).unwrap()
    }

    #[test]
    fn merged_intent_is_a_union() {
        let kb = Intent { left: true, ..Intent::default() };
        let pad = Intent { jump: true, ..Intent::default() };
        assert_eq!(kb.merge(pad), Intent { left: true, right: false, jump: true });
    }

    #[test]
    fn rejects_non_positive_size() {
        assert!(Actor::new(0.0, 30.0).is_err());
        assert!(Actor::new(30.0, -1.0).is_err());
        assert!(Actor::new(f32::NAN, 30.0).is_err());
        assert!(Actor::new(30.0, 30.0).is_ok());
    }

    #[test]
    fn reset_clears_state() {
        let mut a = actor();
        a.vx = 5.0;
        a.vy = -3.0;
        a.grounded = true;
        a.die();
        a.reset((40.0, 280.0));
        assert_eq!((a.x, a.y), (40.0, 280.0));
        assert_eq!((a.vx, a.vy), (0.0, 0.0));
        assert!(!a.grounded);
        assert!(!a.is_dead());
    }

    #[test]
    fn die_is_reentrant_noop() {
        let mut a = actor();
        assert!(a.die());
        assert!(!a.die());
        assert_eq!(a.life, LifeState::Dead);
    }

    #[test]
    fn horizontal_speed_is_not_accumulated() {
        let mut a = actor();
        let k = Kinematics::default();
        let right = Intent { right: true, ..Default::default() };
        a.apply_intent(right, &k);
        a.apply_intent(right, &k);
        assert_eq!(a.vx, 5.0);
        a.apply_intent(Intent::default(), &k);
        assert_eq!(a.vx, 0.0);
        let left = Intent { left: true, ..Default::default() };
        a.apply_intent(left, &k);
        assert_eq!(a.vx, -5.0);
    }

    #[test]
    fn left_wins_when_both_held() {
        let mut a = actor();
        let both = Intent { left: true, right: true, jump: false };
        a.apply_intent(both, &Kinematics::default());
        assert_eq!(a.vx, -5.0);
    }

    #[test]
    fn jump_requires_ground() {
        let mut a = actor();
        let k = Kinematics::default();
        let jump = Intent { jump: true, ..Default::default() };

        assert!(!a.apply_intent(jump, &k));
        assert!((a.vy - 0.6).abs() < 1e-6);

        a.vy = 0.0;
        a.grounded = true;
        assert!(a.apply_intent(jump, &k));
        assert!(!a.grounded);
        assert!((a.vy - (-12.0 + 0.6)).abs() < 1e-6);
    }
}
