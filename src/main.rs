/// Entry point and frame loop.
///
/// The loop polls input every frame, advances the simulation at the
/// configured tick rate with the real elapsed time, forwards the
/// resulting events to the collaborators, and redraws.

mod config;
mod domain;
mod sim;
mod ui;

use std::io;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crossterm::event::{
    KeyCode, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::style::Color;
use crossterm::{execute, terminal};
use tracing_subscriber::EnvFilter;

use config::GameConfig;
use sim::event::GameEvent;
use sim::level::{level_set, LevelError};
use sim::save::{self, Stats};
use sim::step;
use sim::world::{Phase, WorldState};
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::particles::ParticleSystem;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);
/// Longest frame delta fed to the simulation; a stalled terminal must not
/// fast-forward pending timers.
const MAX_DT_MS: u64 = 100;
const DEATH_PARTICLES: usize = 20;
const DEATH_COLOR: Color = Color::Rgb { r: 255, g: 80, b: 60 };

const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_PAUSE: &[KeyCode] = &[KeyCode::Char('p'), KeyCode::Char('P'), KeyCode::F(1)];
const KEYS_LEVELS: &[KeyCode] = &[KeyCode::Char('l'), KeyCode::Char('L')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q')];

fn main() {
    // The terminal is still in cooked mode here, so config problems go
    // to stderr; the file subscriber takes over afterwards.
    let stderr_log = tracing_subscriber::fmt().with_writer(io::stderr).finish();
    let config = tracing::subscriber::with_default(stderr_log, GameConfig::load);
    init_logging(&config.log_file);

    let levels = level_set(&config.levels_dir, &config.grid, &config.tiles);
    let mut world = match WorldState::new(&config, levels) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };
    let mut stats = save::load_stats();
    world.unlocked = stats.unlocked.clamp(1, world.total_levels().max(1));
    tracing::info!(levels = world.total_levels(), unlocked = world.unlocked, "starting");

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }
    let enhanced = enable_key_release();

    let sound = SoundEngine::new();
    let result = game_loop(&mut world, &mut stats, &mut renderer, sound.as_ref(), &config, enhanced);

    if enhanced {
        let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
    }
    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = save::save_stats(&stats) {
        tracing::warn!("{e}");
    }
    if let Err(e) = result {
        tracing::warn!("game loop aborted: {e}");
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Trapstep!");
    println!("Total deaths: {}", stats.total_deaths);
}

/// Route `tracing` output to `path`; `TRAPSTEP_LOG` overrides the
/// default `info` filter. If the file cannot be opened logging stays off.
fn init_logging(path: &Path) {
    let Ok(file) = std::fs::OpenOptions::new().create(true).append(true).open(path) else {
        return;
    };
    let filter = EnvFilter::try_from_env("TRAPSTEP_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

/// Ask the terminal for key release events so held keys end precisely.
fn enable_key_release() -> bool {
    matches!(terminal::supports_keyboard_enhancement(), Ok(true))
        && execute!(
            io::stdout(),
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )
        .is_ok()
}

fn game_loop(
    world: &mut WorldState,
    stats: &mut Stats,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
    enhanced: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    kb.honor_release = enhanced;
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let mut particles = ParticleSystem::new();
    let tick_rate = Duration::from_millis(config.timing.tick_rate_ms.max(1));
    let mut last_tick = Instant::now();

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() || kb.any_pressed(KEYS_QUIT) {
            break;
        }
        handle_meta(world, &kb, &gp, &mut particles);

        let elapsed = last_tick.elapsed();
        if elapsed >= tick_rate {
            last_tick = Instant::now();
            let dt_ms = (elapsed.as_millis() as u64).min(MAX_DT_MS);
            stats.add_frame_time(dt_ms);

            if world.phase == Phase::Playing && !world.paused {
                let intent = kb.intent().merge(gp.intent());
                let events = step::step(world, intent, dt_ms);
                process_events(world, stats, sound, &mut particles, &events);
            } else if world.message_timer > 0 {
                world.message_timer -= 1;
                if world.message_timer == 0 { world.message.clear(); }
            }
            particles.update();
        }

        renderer.render(world, &particles, stats)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn process_events(
    world: &mut WorldState,
    stats: &mut Stats,
    sound: Option<&SoundEngine>,
    particles: &mut ParticleSystem,
    events: &[GameEvent],
) {
    for event in events {
        match event {
            GameEvent::Jumped => {
                if let Some(s) = sound { s.play_jump(); }
            }
            GameEvent::Died { x, y } => {
                if let Some(s) = sound { s.play_death(); }
                particles.emit(*x, *y, DEATH_COLOR, DEATH_PARTICLES);
                stats.total_deaths += 1;
                persist(stats);
            }
            GameEvent::ReachedGoal => {
                if let Some(s) = sound { s.play_win(); }
                stats.unlocked = stats.unlocked.max(world.unlocked);
                persist(stats);
            }
            GameEvent::GoalEvaded { .. } => {
                if let Some(s) = sound { s.play_death(); }
                world.set_message("Oop! Almost had it!", 60);
            }
            GameEvent::Respawned
            | GameEvent::FallingArmed { .. }
            | GameEvent::FallingReleased { .. } => {}
        }
    }
}

fn persist(stats: &Stats) {
    if let Err(e) = save::save_stats(stats) {
        tracing::warn!("{e}");
    }
}

type LoadFn = fn(&mut WorldState) -> Result<(), LevelError>;

/// Load a level, reporting a broken descriptor on the message bar
/// instead of aborting.
fn enter_level(world: &mut WorldState, particles: &mut ParticleSystem, load: LoadFn) {
    particles.clear();
    if let Err(e) = load(world) {
        tracing::warn!("level failed to load: {e}");
        world.phase = Phase::Title;
        world.set_message(&e.to_string(), 180);
    }
}

fn return_to_title(world: &mut WorldState) {
    world.scheduler.cancel_all();
    world.paused = false;
    world.phase = Phase::Title;
}

fn open_level_select(world: &mut WorldState) {
    world.paused = false;
    world.select_cursor = world.current_level.min(world.total_levels().saturating_sub(1));
    world.phase = Phase::LevelSelect;
}

fn handle_meta(world: &mut WorldState, kb: &InputState, gp: &GamepadState, particles: &mut ParticleSystem) {
    let confirm = kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed();
    let esc = kb.was_pressed(KeyCode::Esc) || gp.cancel_pressed();

    match world.phase {
        Phase::Title => {
            if confirm {
                // Resume at the furthest level reached.
                world.current_level = world.unlocked.saturating_sub(1);
                enter_level(world, particles, step::restart_level);
            } else if kb.any_pressed(KEYS_LEVELS) {
                open_level_select(world);
            }
        }

        Phase::LevelSelect => {
            let total = world.total_levels();
            if kb.was_pressed(KeyCode::Up) || gp.up_pressed() {
                world.select_cursor = world.select_cursor.saturating_sub(1);
            } else if kb.was_pressed(KeyCode::Down) || gp.down_pressed() {
                if world.select_cursor + 1 < total {
                    world.select_cursor += 1;
                }
            } else if confirm {
                if world.is_unlocked(world.select_cursor) {
                    world.current_level = world.select_cursor;
                    enter_level(world, particles, step::restart_level);
                } else {
                    world.set_message("Locked: clear the previous level first", 60);
                }
            } else if esc {
                return_to_title(world);
            }
        }

        Phase::Playing => {
            if kb.any_pressed(KEYS_PAUSE) || gp.pause_pressed() {
                world.paused = !world.paused;
                return;
            }
            if kb.any_pressed(KEYS_RESTART) {
                enter_level(world, particles, step::restart_level);
            } else if esc {
                return_to_title(world);
            } else if world.paused && kb.any_pressed(KEYS_LEVELS) {
                open_level_select(world);
            }
        }

        Phase::Won => {
            if confirm {
                enter_level(world, particles, step::advance_level);
            } else if kb.any_pressed(KEYS_RESTART) {
                enter_level(world, particles, step::restart_level);
            } else if kb.any_pressed(KEYS_LEVELS) {
                open_level_select(world);
            } else if esc {
                return_to_title(world);
            }
        }

        Phase::GameComplete => {
            if confirm || esc {
                return_to_title(world);
            }
        }
    }
}
