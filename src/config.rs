/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to the reference constants if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

use crate::domain::entity::Kinematics;
use crate::domain::tile::TileParams;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub kinematics: Kinematics,
    pub actor_width: f32,
    pub actor_height: f32,
    pub tiles: TileParams,
    pub grid: GridConfig,
    pub timing: TimingConfig,
    pub goal: GoalConfig,
    pub gamepad: GamepadConfig,
    pub levels_dir: PathBuf,
    pub log_file: PathBuf,
}

/// Descriptor geometry. All levels must be exactly `rows` × `cols`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridConfig {
    pub rows: usize,
    pub cols: usize,
    pub cell_size: f32,
}

impl GridConfig {
    pub fn width_px(&self) -> f32 {
        self.cols as f32 * self.cell_size
    }

    pub fn height_px(&self) -> f32 {
        self.rows as f32 * self.cell_size
    }
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub tick_rate_ms: u64,
    pub falling_delay_ms: u64,
    pub respawn_delay_ms: u64,
}

/// Goal-evasion behaviour: the goal hops away once when approached.
#[derive(Clone, Debug)]
pub struct GoalConfig {
    pub evades: bool,
    pub evade_radius: f32,
    pub evade_step: f32,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub jump: Vec<String>,
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub pause: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    physics: TomlPhysics,
    #[serde(default)]
    tiles: TomlTiles,
    #[serde(default)]
    grid: TomlGrid,
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    goal: TomlGoal,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlPhysics {
    #[serde(default = "default_gravity")]
    gravity: f32,
    #[serde(default = "default_move_speed")]
    move_speed: f32,
    #[serde(default = "default_jump_velocity")]
    jump_velocity: f32,
    #[serde(default = "default_actor_size")]
    actor_width: f32,
    #[serde(default = "default_actor_size")]
    actor_height: f32,
}

#[derive(Deserialize, Debug)]
struct TomlTiles {
    #[serde(default = "default_platform_speed")]
    platform_speed: f32,
    #[serde(default = "default_platform_range")]
    platform_range: f32,
    #[serde(default = "default_spike_speed")]
    spike_speed: f32,
    #[serde(default = "default_spike_range")]
    spike_range: f32,
    #[serde(default = "default_disappear_interval")]
    disappear_interval: u32,
    #[serde(default = "default_falling_gravity")]
    falling_gravity: f32,
}

#[derive(Deserialize, Debug)]
struct TomlGrid {
    #[serde(default = "default_rows")]
    rows: usize,
    #[serde(default = "default_cols")]
    cols: usize,
    #[serde(default = "default_cell_size")]
    cell_size: f32,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_falling_delay")]
    falling_delay_ms: u64,
    #[serde(default = "default_respawn_delay")]
    respawn_delay_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGoal {
    #[serde(default = "default_true")]
    evades: bool,
    #[serde(default = "default_evade_radius")]
    evade_radius: f32,
    #[serde(default = "default_evade_step")]
    evade_step: f32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_pad_jump")]
    jump: Vec<String>,
    #[serde(default = "default_pad_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_pad_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_pad_pause")]
    pause: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default = "default_log_file")]
    log_file: String,
}

// ── Defaults ──

fn default_gravity() -> f32 { 0.6 }
fn default_move_speed() -> f32 { 5.0 }
fn default_jump_velocity() -> f32 { -12.0 }
fn default_actor_size() -> f32 { 30.0 }

fn default_platform_speed() -> f32 { 2.0 }
fn default_platform_range() -> f32 { 100.0 }
fn default_spike_speed() -> f32 { 2.0 }
fn default_spike_range() -> f32 { 80.0 }
fn default_disappear_interval() -> u32 { 100 } // ~1.6s at 60 ticks/s
fn default_falling_gravity() -> f32 { 0.5 }

fn default_rows() -> usize { 15 }
fn default_cols() -> usize { 20 }
fn default_cell_size() -> f32 { 40.0 }

fn default_tick_rate() -> u64 { 16 }
fn default_falling_delay() -> u64 { 200 }
fn default_respawn_delay() -> u64 { 500 }

fn default_true() -> bool { true }
fn default_evade_radius() -> f32 { 100.0 }
fn default_evade_step() -> f32 { 80.0 }

fn default_pad_jump() -> Vec<String> { vec!["A".into(), "B".into()] }
fn default_pad_confirm() -> Vec<String> { vec!["Start".into(), "A".into()] }
fn default_pad_cancel() -> Vec<String> { vec!["Select".into()] }
fn default_pad_pause() -> Vec<String> { vec!["Start".into()] }

fn default_levels_dir() -> String { "levels".into() }
fn default_log_file() -> String { "trapstep.log".into() }

impl Default for TomlPhysics {
    fn default() -> Self {
        TomlPhysics {
            gravity: default_gravity(),
            move_speed: default_move_speed(),
            jump_velocity: default_jump_velocity(),
            actor_width: default_actor_size(),
            actor_height: default_actor_size(),
        }
    }
}

impl Default for TomlTiles {
    fn default() -> Self {
        TomlTiles {
            platform_speed: default_platform_speed(),
            platform_range: default_platform_range(),
            spike_speed: default_spike_speed(),
            spike_range: default_spike_range(),
            disappear_interval: default_disappear_interval(),
            falling_gravity: default_falling_gravity(),
        }
    }
}

impl Default for TomlGrid {
    fn default() -> Self {
        TomlGrid { rows: default_rows(), cols: default_cols(), cell_size: default_cell_size() }
    }
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            tick_rate_ms: default_tick_rate(),
            falling_delay_ms: default_falling_delay(),
            respawn_delay_ms: default_respawn_delay(),
        }
    }
}

impl Default for TomlGoal {
    fn default() -> Self {
        TomlGoal {
            evades: default_true(),
            evade_radius: default_evade_radius(),
            evade_step: default_evade_step(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            jump: default_pad_jump(),
            confirm: default_pad_confirm(),
            cancel: default_pad_cancel(),
            pause: default_pad_pause(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            log_file: default_log_file(),
        }
    }
}

// ── Loading ──

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[])
    }
}

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: exe directory, CWD, XDG data home, system data dir.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        GameConfig::from_toml(toml_cfg, &search_dirs)
    }

    /// Parse a config from TOML text. Unknown keys are ignored.
    #[cfg(test)]
    fn parse(text: &str) -> Result<Self, toml::de::Error> {
        let cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(GameConfig::from_toml(cfg, &[]))
    }

    fn from_toml(t: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        GameConfig {
            kinematics: Kinematics {
                gravity: t.physics.gravity,
                move_speed: t.physics.move_speed,
                jump_velocity: t.physics.jump_velocity,
            },
            actor_width: t.physics.actor_width,
            actor_height: t.physics.actor_height,
            tiles: TileParams {
                platform_speed: t.tiles.platform_speed,
                platform_range: t.tiles.platform_range,
                spike_speed: t.tiles.spike_speed,
                spike_range: t.tiles.spike_range,
                disappear_interval: t.tiles.disappear_interval,
                falling_gravity: t.tiles.falling_gravity,
            },
            grid: GridConfig {
                rows: t.grid.rows,
                cols: t.grid.cols,
                cell_size: t.grid.cell_size,
            },
            timing: TimingConfig {
                tick_rate_ms: t.timing.tick_rate_ms,
                falling_delay_ms: t.timing.falling_delay_ms,
                respawn_delay_ms: t.timing.respawn_delay_ms,
            },
            goal: GoalConfig {
                evades: t.goal.evades,
                evade_radius: t.goal.evade_radius,
                evade_step: t.goal.evade_step,
            },
            gamepad: GamepadConfig {
                jump: t.gamepad.jump,
                confirm: t.gamepad.confirm,
                cancel: t.gamepad.cancel,
                pause: t.gamepad.pause,
            },
            levels_dir: resolve_dir(&t.general.levels_dir, search_dirs),
            log_file: PathBuf::from(t.general.log_file),
        }
    }
}

/// Absolute paths are kept; relative ones are searched in the candidate dirs.
fn resolve_dir(dir: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let path = PathBuf::from(dir);
    if path.is_absolute() {
        return path;
    }
    search_dirs.iter()
        .map(|d| d.join(dir))
        .find(|p| p.is_dir())
        .unwrap_or(path)
}

/// Candidate directories to search: exe dir + CWD + data dirs (deduplicated).
pub fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so an installed link still finds data next to the real binary.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/trapstep");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    let sys = PathBuf::from("/usr/share/trapstep");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                Ok(cfg) => {
                    tracing::info!(path = %path.display(), "loaded config");
                    return cfg;
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), "config.toml parse error, using defaults: {e}");
                    return TomlConfig::default();
                }
            },
            Err(e) => {
                tracing::warn!("could not read {}: {e}", path.display());
            }
        }
    }
    TomlConfig::default()
}
