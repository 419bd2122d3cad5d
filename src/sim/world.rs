/// WorldState: everything a running game owns.
///
/// ## Level instance
///
/// `level` is replaced wholesale on every load; no tile outlives its
/// level. `epoch` identifies the current instance and is bumped on every
/// (re)load so deferred events from an older instance can be recognized
/// and dropped.
///
/// ## Clock
///
/// `clock_ms` is simulation time, advanced by the caller-supplied frame
/// delta. `tick` counts steps. Neither resets between levels.

use crate::config::{GameConfig, GoalConfig, GridConfig, TimingConfig};
use crate::domain::entity::{Actor, ActorError, Kinematics};
use crate::domain::tile::TileParams;

use super::level::{Level, LevelDef};
use super::schedule::Scheduler;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Title,
    LevelSelect,
    Playing,
    /// Goal reached; waiting for the player to continue.
    Won,
    GameComplete,
}

pub struct WorldState {
    // ── Level instance ──
    pub level: Level,
    pub actor: Actor,
    pub epoch: u64,
    pub scheduler: Scheduler,

    // ── Rules ──
    pub kinematics: Kinematics,
    pub params: TileParams,
    pub grid: GridConfig,
    pub timing: TimingConfig,
    pub goal: GoalConfig,

    // ── Meta ──
    pub phase: Phase,
    pub paused: bool,
    pub tick: u64,
    pub clock_ms: u64,
    pub levels: Vec<LevelDef>,
    pub current_level: usize,
    /// Number of levels the player may pick from (at least 1).
    pub unlocked: usize,
    pub level_deaths: u32,

    // ── UI ──
    pub message: String,
    pub message_timer: u32,
    pub select_cursor: usize,
}

impl WorldState {
    pub fn new(config: &GameConfig, levels: Vec<LevelDef>) -> Result<Self, ActorError> {
        let actor = Actor::new(config.actor_width, config.actor_height)?;
        Ok(WorldState {
            level: Level::empty(&config.grid),
            actor,
            epoch: 0,
            scheduler: Scheduler::new(),
            kinematics: config.kinematics.clone(),
            params: config.tiles.clone(),
            grid: config.grid,
            timing: config.timing.clone(),
            goal: config.goal.clone(),
            phase: Phase::Title,
            paused: false,
            tick: 0,
            clock_ms: 0,
            levels,
            current_level: 0,
            unlocked: 1,
            level_deaths: 0,
            message: String::new(),
            message_timer: 0,
            select_cursor: 0,
        })
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }

    pub fn total_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn is_unlocked(&self, index: usize) -> bool {
        index < self.unlocked.min(self.levels.len())
    }
}
