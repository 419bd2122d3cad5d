/// Pure game rules: tiles, their per-tick dynamics, the actor, and
/// collision resolution. Nothing here knows about levels on disk,
/// timers, or the terminal.

pub mod dynamics;
pub mod entity;
pub mod physics;
pub mod tile;
