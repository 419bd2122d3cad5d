/// The step function: advances the world by one tick.
///
/// Processing order:
///   1. Clock (tick counter + simulation milliseconds)
///   2. Deferred events due at the new clock (falling release, respawn)
///   3. Dynamic tiles
///   4. Actor integration + collision resolution, outcomes applied
///   5. Fall-out-of-bounds death
///   6. Goal evasion
///
/// Outcomes never perform UI work; they are reported as `GameEvent`s.

use crate::domain::dynamics;
use crate::domain::entity::Intent;
use crate::domain::physics::{self, Outcome};
use super::event::GameEvent;
use super::level::LevelError;
use super::schedule::Deferred;
use super::world::{Phase, WorldState};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, intent: Intent, dt_ms: u64) -> Vec<GameEvent> {
    if world.phase != Phase::Playing || world.paused { return vec![]; }

    let mut events: Vec<GameEvent> = Vec::new();
    world.tick += 1;
    world.clock_ms += dt_ms;

    if world.message_timer > 0 {
        world.message_timer -= 1;
        if world.message_timer == 0 { world.message.clear(); }
    }

    resolve_deferred(world, &mut events);
    dynamics::simulate(&mut world.level.tiles);
    resolve_actor(world, intent, &mut events);
    if world.phase == Phase::Playing {
        resolve_fall_out(world, &mut events);
        resolve_goal_evasion(world, &mut events);
    }

    events
}

// ══════════════════════════════════════════════════════════════
// Level transitions
// ══════════════════════════════════════════════════════════════

/// Load level `index` as a fresh instance. Past the last level the game
/// is complete.
pub fn load_level(world: &mut WorldState, index: usize) -> Result<(), LevelError> {
    let Some(def) = world.levels.get(index) else {
        world.phase = Phase::GameComplete;
        return Ok(());
    };
    let level = def.build(&world.grid, &world.params)?;

    world.epoch += 1;
    world.scheduler.cancel_all();
    world.level = level;
    world.current_level = index;
    world.actor.reset(world.level.start);
    world.phase = Phase::Playing;
    world.paused = false;
    world.level_deaths = 0;

    let name = world.level.name.clone();
    world.set_message(&name, 90);
    tracing::info!(level = index + 1, name = %name, epoch = world.epoch, "level loaded");
    Ok(())
}

pub fn restart_level(world: &mut WorldState) -> Result<(), LevelError> {
    load_level(world, world.current_level)
}

/// Continue after a win.
pub fn advance_level(world: &mut WorldState) -> Result<(), LevelError> {
    load_level(world, world.current_level + 1)
}

// ══════════════════════════════════════════════════════════════
// Deferred events
// ══════════════════════════════════════════════════════════════

fn resolve_deferred(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    for (epoch, action) in world.scheduler.drain_due(world.clock_ms) {
        if epoch != world.epoch {
            tracing::debug!(epoch, current = world.epoch, ?action, "dropped stale event");
            continue;
        }
        match action {
            Deferred::ActivateFalling { tile } => {
                if world.level.tiles.get_mut(tile).is_some_and(|t| t.release()) {
                    events.push(GameEvent::FallingReleased { tile });
                }
            }
            Deferred::Respawn => {
                if world.phase != Phase::Playing || !world.actor.is_dead() { continue; }
                world.actor.reset(world.level.start);
                events.push(GameEvent::Respawned);
                tracing::info!(deaths = world.level_deaths, "respawned");
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Actor
// ══════════════════════════════════════════════════════════════

fn resolve_actor(world: &mut WorldState, intent: Intent, events: &mut Vec<GameEvent>) {
    if world.actor.is_dead() { return; }

    if world.actor.apply_intent(intent, &world.kinematics) {
        events.push(GameEvent::Jumped);
    }

    let a = &world.actor;
    let res = physics::resolve(a.rect(), a.vx, a.vy, &world.level.tiles);
    world.actor.apply_resolution(&res);

    match res.outcome {
        Outcome::None => {}
        Outcome::Died => kill_actor(world, events),
        Outcome::ReachedGoal => win(world, events),
        Outcome::ActivatedFalling(tile) => arm_falling(world, tile, events),
    }
}

fn resolve_fall_out(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if !world.actor.is_dead() && world.actor.y > world.level.height_px() {
        kill_actor(world, events);
    }
}

/// Alive → Dead, then schedule the respawn. A second death while dead
/// is ignored.
fn kill_actor(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if !world.actor.die() { return; }
    world.level_deaths += 1;

    let (x, y) = world.actor.center();
    events.push(GameEvent::Died { x, y });
    tracing::debug!(tick = world.tick, x, y, "actor died");

    let due = world.clock_ms + world.timing.respawn_delay_ms;
    world.scheduler.schedule(due, world.epoch, Deferred::Respawn);
}

fn arm_falling(world: &mut WorldState, tile: usize, events: &mut Vec<GameEvent>) {
    let armed = world.level.tiles.get_mut(tile).is_some_and(|t| t.arm());
    if !armed { return; }
    let due = world.clock_ms + world.timing.falling_delay_ms;
    world.scheduler.schedule(due, world.epoch, Deferred::ActivateFalling { tile });
    events.push(GameEvent::FallingArmed { tile });
}

fn win(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    world.phase = Phase::Won;
    world.unlocked = world.unlocked.max(world.current_level + 2).min(world.levels.len());
    events.push(GameEvent::ReachedGoal);
    tracing::info!(
        level = world.current_level + 1,
        deaths = world.level_deaths,
        "level complete"
    );
}

// ══════════════════════════════════════════════════════════════
// Goal evasion
// ══════════════════════════════════════════════════════════════

/// The goal hops away once, the first time the actor comes close.
fn resolve_goal_evasion(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if !world.goal.evades || world.level.goal_latched || world.actor.is_dead() { return; }
    let Some(idx) = world.level.goal else { return };

    let width = world.level.width_px();
    let cell = world.level.grid.cell_size;
    let hop = world.goal.evade_step;
    let (ax, ay) = (world.actor.x, world.actor.y);

    let Some(goal) = world.level.tiles.get_mut(idx) else { return };
    let dist = ((ax - goal.x).powi(2) + (ay - goal.y).powi(2)).sqrt();
    if dist >= world.goal.evade_radius { return; }

    let from_x = goal.x;
    let mut to_x = if ax < goal.x { from_x + hop } else { from_x - hop };
    if to_x < 0.0 {
        to_x = hop;
    } else if to_x > width - cell {
        to_x = width - cell - hop;
    }
    goal.x = to_x;

    world.level.goal_latched = true;
    events.push(GameEvent::GoalEvaded { from_x, to_x });
    tracing::debug!(from_x, to_x, "goal evaded");
}
