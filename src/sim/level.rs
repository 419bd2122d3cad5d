/// Level loader.
///
/// ## Sources (priority order):
///   1. `levels/` directory (individual `.txt` files, ordered by filename)
///   2. Built-in embedded levels
///
/// The directory replaces the embedded set only if it yields at least
/// one valid level. Malformed files are logged and skipped.
///
/// ## Single-level format (`.txt`):
///   Optional line 1: `# Level Name`
///   Lines: exactly `rows` map rows of exactly `cols` characters each
///
/// ## Tile legend:
///   '#' = Wall            'G' = Goal             'S' = Spike
///   'F' = Fake wall       'I' = Invisible wall   'M' = Moving platform
///   '^' = Moving spike    'D' = Disappearing     'B' = Falling block
///   '@' = Start           anything else = Empty
///
/// Duplicate `@` or `G`: the last one in row-major scan order wins.

use std::fmt;
use std::path::Path;

use crate::config::GridConfig;
use crate::domain::tile::{Symbol, Tile, TileParams};

/// Start position used when a descriptor has no `@`.
pub const DEFAULT_START: (f32, f32) = (50.0, 50.0);

/// Raw level descriptor (owned strings, loaded from file or embedded).
#[derive(Clone, Debug, PartialEq)]
pub struct LevelDef {
    pub name: String,
    pub rows: Vec<String>,
}

impl LevelDef {
    pub fn build(&self, grid: &GridConfig, params: &TileParams) -> Result<Level, LevelError> {
        Level::load(&self.name, &self.rows, grid, params)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LevelError {
    RowCount { expected: usize, found: usize },
    RowWidth { row: usize, expected: usize, found: usize },
    Io { path: String, message: String },
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RowCount { expected, found } => {
                write!(f, "malformed level: expected {expected} rows, found {found}")
            }
            Self::RowWidth { row, expected, found } => {
                write!(f, "malformed level: row {row} has {found} columns, expected {expected}")
            }
            Self::Io { path, message } => write!(f, "cannot read level {path}: {message}"),
        }
    }
}

impl std::error::Error for LevelError {}

/// A loaded level instance. Tiles are in grid-declaration order, which
/// the collision resolver relies on.
#[derive(Clone, Debug, PartialEq)]
pub struct Level {
    pub name: String,
    pub tiles: Vec<Tile>,
    pub start: (f32, f32),
    /// Index into `tiles`.
    pub goal: Option<usize>,
    /// Set once the goal has evaded; it never moves again this instance.
    pub goal_latched: bool,
    pub grid: GridConfig,
}

impl Level {
    /// Materialize a descriptor. Total over well-shaped input: unknown
    /// symbols are Empty. Shape errors are reported, never truncated.
    pub fn load<S: AsRef<str>>(
        name: &str,
        rows: &[S],
        grid: &GridConfig,
        params: &TileParams,
    ) -> Result<Level, LevelError> {
        if rows.len() != grid.rows {
            return Err(LevelError::RowCount { expected: grid.rows, found: rows.len() });
        }
        for (r, row) in rows.iter().enumerate() {
            let found = row.as_ref().chars().count();
            if found != grid.cols {
                return Err(LevelError::RowWidth { row: r, expected: grid.cols, found });
            }
        }

        // Only the last `G` materializes, so a level never holds two goals.
        let last_goal = rows.iter().enumerate()
            .flat_map(|(r, row)| {
                row.as_ref().chars().enumerate()
                    .filter(|&(_, ch)| ch == 'G')
                    .map(move |(c, _)| (r, c))
            })
            .last();

        let mut tiles = Vec::new();
        let mut start = DEFAULT_START;
        let mut goal = None;

        for (r, row) in rows.iter().enumerate() {
            for (c, ch) in row.as_ref().chars().enumerate() {
                match Symbol::parse(ch, params) {
                    Symbol::Empty => {}
                    Symbol::Start => {
                        start = (c as f32 * grid.cell_size, r as f32 * grid.cell_size);
                    }
                    Symbol::Tile(kind) => {
                        if ch == 'G' {
                            if last_goal != Some((r, c)) {
                                continue;
                            }
                            goal = Some(tiles.len());
                        }
                        tiles.push(Tile::new(c, r, grid.cell_size, kind));
                    }
                }
            }
        }

        Ok(Level {
            name: name.to_string(),
            tiles,
            start,
            goal,
            goal_latched: false,
            grid: *grid,
        })
    }

    /// Placeholder before the first load: no tiles, default start.
    pub fn empty(grid: &GridConfig) -> Level {
        Level {
            name: String::new(),
            tiles: vec![],
            start: DEFAULT_START,
            goal: None,
            goal_latched: false,
            grid: *grid,
        }
    }

    pub fn width_px(&self) -> f32 {
        self.grid.width_px()
    }

    pub fn height_px(&self) -> f32 {
        self.grid.height_px()
    }

    #[cfg(test)]
    pub fn goal_tile(&self) -> Option<&Tile> {
        self.goal.and_then(|i| self.tiles.get(i))
    }
}

// ══════════════════════════════════════════════════════════════
// Level set
// ══════════════════════════════════════════════════════════════

/// The playable level list: `levels_dir` if it has valid levels, else
/// the embedded set.
pub fn level_set(levels_dir: &Path, grid: &GridConfig, params: &TileParams) -> Vec<LevelDef> {
    if levels_dir.is_dir() {
        let from_dir = load_from_directory(levels_dir, grid, params);
        if !from_dir.is_empty() {
            tracing::info!(dir = %levels_dir.display(), count = from_dir.len(), "using level directory");
            return from_dir;
        }
    }
    embedded_levels()
}

// ══════════════════════════════════════════════════════════════
// Single-level file parsing
// ══════════════════════════════════════════════════════════════

/// Split file text into a descriptor. Trailing blank lines are dropped;
/// nothing is padded. A leading `#` line is a name only when the file
/// holds exactly one line more than the grid, since wall rows start with
/// `#` too.
fn parse_level_file(content: &str, fallback_name: &str, grid: &GridConfig) -> LevelDef {
    let mut rows: Vec<String> = content.lines().map(|l| l.trim_end_matches('\r').to_string()).collect();
    while rows.last().is_some_and(|r| r.trim().is_empty()) {
        rows.pop();
    }

    let mut name = fallback_name.to_string();
    if rows.len() == grid.rows + 1 && rows[0].starts_with('#') {
        name = rows.remove(0)[1..].trim().to_string();
    }

    LevelDef { name, rows }
}

// ══════════════════════════════════════════════════════════════
// Directory loading (individual .txt files)
// ══════════════════════════════════════════════════════════════

/// Read every `*.txt` in `dir`, ordered by filename. Each descriptor is
/// validated against `grid`; failures are logged and skipped.
pub fn load_from_directory(dir: &Path, grid: &GridConfig, params: &TileParams) -> Vec<LevelDef> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), "cannot list level directory: {e}");
            return vec![];
        }
    };

    let mut paths: Vec<_> = entries.flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|e| e == "txt"))
        .collect();
    paths.sort();

    let mut results = vec![];
    for path in paths {
        match read_level_file(&path, grid).and_then(|def| def.build(grid, params).map(|_| def)) {
            Ok(def) => results.push(def),
            Err(e) => tracing::warn!(path = %path.display(), "skipping level: {e}"),
        }
    }
    results
}

fn read_level_file(path: &Path, grid: &GridConfig) -> Result<LevelDef, LevelError> {
    let content = std::fs::read_to_string(path).map_err(|e| LevelError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    Ok(parse_level_file(&content, &stem, grid))
}

// ══════════════════════════════════════════════════════════════
// Embedded levels
// ══════════════════════════════════════════════════════════════

pub fn embedded_levels() -> Vec<LevelDef> {
    vec![
        embedded("First Steps", &[
            "####################",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#...........###....#",
            "#@.......###......G#",
            "####################",
            "####################",
        ]),
        embedded("Mind The Gap", &[
            "####################",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#@.......#.......G.#",
            "#####..######..#####",
            "#####SS######SS#####",
        ]),
        embedded("Trust Issues", &[
            "####################",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#.........S........#",
            "#@..............G..#",
            "#######FF######FF###",
            "#######SS######SS###",
        ]),
        embedded("Ghost Walls", &[
            "####################",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..............G...#",
            "#...........III....#",
            "#@......III........#",
            "####III#############",
            "####SSS#############",
        ]),
        embedded("Conveyor", &[
            "####################",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#@................G#",
            "###....M.....M...###",
            "#..................#",
            "#SSSSSSSSSSSSSSSSSS#",
        ]),
        embedded("Piston Row", &[
            "####################",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#.....^.....^......#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#@................G#",
            "####################",
            "####################",
        ]),
        embedded("Blink", &[
            "####################",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#@................G#",
            "###DDDD####DDDD#####",
            "###SSSS####SSSS#####",
        ]),
        embedded("Crumble", &[
            "####################",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#@................G#",
            "###BBBBBBBBBBBBBB###",
            "#SSSSSSSSSSSSSSSSSS#",
        ]),
        embedded("Staircase", &[
            "####################",
            "#..................#",
            "#................G.#",
            "#..............BB###",
            "#..................#",
            "#..........DD......#",
            "#..................#",
            "#......M...........#",
            "#..................#",
            "#...FF.............#",
            "#...##.............#",
            "#..................#",
            "#@......^..........#",
            "#####SSSSSSSSSSSSSS#",
            "####################",
        ]),
        embedded("Gauntlet", &[
            "####################",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#...^.......^......#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#.........S.....I..#",
            "#..............I..G#",
            "#@.....M.......I...#",
            "####FF....DDBB######",
            "#SSSSSSSSSSSSSSSSSS#",
        ]),
    ]
}

fn embedded(name: &str, map: &[&str]) -> LevelDef {
    LevelDef {
        name: name.to_string(),
        rows: map.iter().map(|s| s.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tile::TileKind;

    fn grid() -> GridConfig {
        GridConfig { rows: 15, cols: 20, cell_size: 40.0 }
    }

    fn small() -> GridConfig {
        GridConfig { rows: 3, cols: 4, cell_size: 40.0 }
    }

    fn load(rows: &[&str]) -> Result<Level, LevelError> {
        Level::load("t", rows, &small(), &TileParams::default())
    }

    #[test]
    fn embedded_levels_all_load() {
        let defs = embedded_levels();
        assert_eq!(defs.len(), 10);
        for def in &defs {
            let level = def.build(&grid(), &TileParams::default())
                .unwrap_or_else(|e| panic!("{}: {e}", def.name));
            assert!(level.goal.is_some(), "{} has no goal", def.name);
            assert_ne!(level.start, DEFAULT_START, "{} has no start", def.name);
        }
    }

    #[test]
    fn loading_is_deterministic() {
        for def in embedded_levels() {
            let a = def.build(&grid(), &TileParams::default()).unwrap();
            let b = def.build(&grid(), &TileParams::default()).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn tiles_follow_row_major_order() {
        let level = load(&["#..S", "....", "F.I."]).unwrap();
        let cells: Vec<_> = level.tiles.iter().map(|t| (t.row, t.col)).collect();
        assert_eq!(cells, vec![(0, 0), (0, 3), (2, 0), (2, 2)]);
        assert_eq!(level.tiles[1].kind, TileKind::Spike);
        assert_eq!((level.tiles[1].x, level.tiles[1].y), (120.0, 0.0));
    }

    #[test]
    fn start_emits_no_tile_and_last_one_wins() {
        let level = load(&["@...", "...@", "####"]).unwrap();
        assert_eq!(level.start, (120.0, 40.0));
        assert_eq!(level.tiles.len(), 4);
    }

    #[test]
    fn missing_start_uses_default() {
        let level = load(&["....", "....", "####"]).unwrap();
        assert_eq!(level.start, DEFAULT_START);
        assert!(level.goal.is_none());
    }

    #[test]
    fn duplicate_goal_keeps_only_last() {
        let level = load(&["G...", "..G.", "####"]).unwrap();
        let goals: Vec<_> = level.tiles.iter().filter(|t| t.is_goal()).collect();
        assert_eq!(goals.len(), 1);
        let g = level.goal_tile().unwrap();
        assert_eq!((g.col, g.row), (2, 1));
    }

    #[test]
    fn unknown_symbols_are_empty() {
        let level = load(&["xyz.", "?! ~", "...."]).unwrap();
        assert!(level.tiles.is_empty());
    }

    #[test]
    fn wrong_row_count_is_rejected() {
        assert_eq!(
            load(&["....", "...."]),
            Err(LevelError::RowCount { expected: 3, found: 2 })
        );
    }

    #[test]
    fn wrong_row_width_is_rejected() {
        assert_eq!(
            load(&["....", ".....", "...."]),
            Err(LevelError::RowWidth { row: 1, expected: 4, found: 5 })
        );
        assert_eq!(
            load(&["....", "...", "...."]),
            Err(LevelError::RowWidth { row: 1, expected: 4, found: 3 })
        );
    }

    #[test]
    fn width_counts_characters_not_bytes() {
        assert!(load(&["é...", "....", "...."]).is_ok());
    }

    #[test]
    fn file_parsing_reads_optional_name() {
        let def = parse_level_file("# Spike Pit\n#..#\n#@G#\n####\n\n", "fallback", &small());
        assert_eq!(def.name, "Spike Pit");
        assert_eq!(def.rows, vec!["#..#", "#@G#", "####"]);

        let def = parse_level_file("#SG#\n#@.#\n####\n", "03-pit", &small());
        assert_eq!(def.name, "03-pit");
        assert_eq!(def.rows.len(), 3);
    }

    #[test]
    fn name_line_is_decided_by_row_count() {
        let def = parse_level_file("# LEVEL 3\n@..G\n....\n####\n", "f", &small());
        assert_eq!(def.name, "LEVEL 3");
        assert_eq!(def.rows, vec!["@..G", "....", "####"]);
        assert!(def.build(&small(), &TileParams::default()).is_ok());

        let def = parse_level_file("#xx#\n@..G\n####\n", "f", &small());
        assert_eq!(def.name, "f");
        assert_eq!(def.rows, vec!["#xx#", "@..G", "####"]);
        assert!(def.build(&small(), &TileParams::default()).is_ok());
    }

    #[test]
    fn directory_skips_malformed_and_sorts_by_filename() {
        let dir = std::env::temp_dir().join(format!("trapstep-levels-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("b.txt"), "# Second\n@..G\n....\n####\n").unwrap();
        std::fs::write(dir.join("a.txt"), "# First\n@..G\n....\n####\n").unwrap();
        std::fs::write(dir.join("c.txt"), "# Broken\n@..G\n####\n").unwrap();
        std::fs::write(dir.join("notes.md"), "ignored").unwrap();

        let defs = load_from_directory(&dir, &small(), &TileParams::default());
        let names: Vec<_> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second"]);

        let set = level_set(&dir, &small(), &TileParams::default());
        assert_eq!(set.len(), 2);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_directory_falls_back_to_embedded() {
        let dir = std::env::temp_dir().join("trapstep-no-such-dir");
        let set = level_set(&dir, &grid(), &TileParams::default());
        assert_eq!(set, embedded_levels());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn any_rows() -> impl Strategy<Value = Vec<String>> {
            let symbol = prop::sample::select(vec!['.', '#', '@', 'G', 'S', 'F', 'I', 'M', '^', 'D', 'B', 'x']);
            prop::collection::vec(
                prop::collection::vec(symbol, 4).prop_map(|cs| cs.into_iter().collect::<String>()),
                3,
            )
        }

        proptest! {
            #[test]
            fn load_is_deterministic_and_row_major(rows in any_rows()) {
                let a = Level::load("p", &rows, &small(), &TileParams::default()).unwrap();
                let b = Level::load("p", &rows, &small(), &TileParams::default()).unwrap();
                prop_assert_eq!(&a, &b);

                let order: Vec<_> = a.tiles.iter().map(|t| (t.row, t.col)).collect();
                let mut sorted = order.clone();
                sorted.sort();
                prop_assert_eq!(order, sorted);
                prop_assert!(a.tiles.iter().filter(|t| t.is_goal()).count() <= 1);
            }
        }
    }
}
