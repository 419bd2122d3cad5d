/// Stateful simulation: the level loader, the world, deferred events,
/// the per-tick step, and persisted statistics.

pub mod event;
pub mod level;
pub mod save;
pub mod schedule;
pub mod step;
pub mod world;
