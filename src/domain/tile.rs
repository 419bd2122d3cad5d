/// Tile types and their per-kind state.
/// Solidity, lethality and visual state are queried via methods, not
/// stored as independent flags, so tile semantics are centralized here.

/// Stage of a falling block.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FallStage {
    /// Untouched. Landing on it arms it.
    Resting,
    /// Landed on; activation is scheduled but has not fired yet.
    Armed,
    /// Released. Falls every tick, forever.
    Triggered,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum TileKind {
    Wall,
    Goal,
    Spike,
    Fake,      // Looks like Wall, passable
    Invisible, // Solid, never drawn
    /// Horizontal oscillation around the anchor x.
    MovingPlatform { vx: f32, range: f32 },
    /// Vertical oscillation around the anchor y.
    MovingSpike { vy: f32, range: f32 },
    /// Toggles solidity every `interval + 1` ticks.
    Disappearing { timer: u32, interval: u32, solid: bool },
    Falling { stage: FallStage, vy: f32, gravity: f32 },
}

/// Parameters for the stateful kinds, applied by the loader.
#[derive(Clone, Debug)]
pub struct TileParams {
    pub platform_speed: f32,
    pub platform_range: f32,
    pub spike_speed: f32,
    pub spike_range: f32,
    pub disappear_interval: u32,
    pub falling_gravity: f32,
}

impl Default for TileParams {
    fn default() -> Self {
        TileParams {
            platform_speed: 2.0,
            platform_range: 100.0,
            spike_speed: 2.0,
            spike_range: 80.0,
            disappear_interval: 100,
            falling_gravity: 0.5,
        }
    }
}

/// What a single descriptor symbol produces.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Symbol {
    Empty,
    Start,
    Tile(TileKind),
}

impl Symbol {
    /// Map a descriptor character. Anything unknown is Empty.
    pub fn parse(ch: char, params: &TileParams) -> Symbol {
        match ch {
            '#' => Symbol::Tile(TileKind::Wall),
            '@' => Symbol::Start,
            'G' => Symbol::Tile(TileKind::Goal),
            'S' => Symbol::Tile(TileKind::Spike),
            'F' => Symbol::Tile(TileKind::Fake),
            'I' => Symbol::Tile(TileKind::Invisible),
            'M' => Symbol::Tile(TileKind::MovingPlatform {
                vx: params.platform_speed,
                range: params.platform_range,
            }),
            '^' => Symbol::Tile(TileKind::MovingSpike {
                vy: params.spike_speed,
                range: params.spike_range,
            }),
            'D' => Symbol::Tile(TileKind::Disappearing {
                timer: 0,
                interval: params.disappear_interval,
                solid: true,
            }),
            'B' => Symbol::Tile(TileKind::Falling {
                stage: FallStage::Resting,
                vy: 0.0,
                gravity: params.falling_gravity,
            }),
            _ => Symbol::Empty,
        }
    }
}

/// A materialized tile. `col`/`row` and the anchor never change;
/// `x`/`y` move only as the kind allows.
#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
    pub col: usize,
    pub row: usize,
    pub anchor_x: f32,
    pub anchor_y: f32,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub kind: TileKind,
}

impl Tile {
    pub fn new(col: usize, row: usize, size: f32, kind: TileKind) -> Self {
        let x = col as f32 * size;
        let y = row as f32 * size;
        Tile { col, row, anchor_x: x, anchor_y: y, x, y, size, kind }
    }

    /// Blocks movement?
    pub fn solid(&self) -> bool {
        match self.kind {
            TileKind::Wall
            | TileKind::Spike
            | TileKind::Invisible
            | TileKind::MovingPlatform { .. }
            | TileKind::MovingSpike { .. }
            | TileKind::Falling { .. } => true,
            TileKind::Disappearing { solid, .. } => solid,
            TileKind::Goal | TileKind::Fake => false,
        }
    }

    /// Kills the actor on contact?
    pub fn deadly(&self) -> bool {
        matches!(self.kind, TileKind::Spike | TileKind::MovingSpike { .. })
    }

    pub fn is_goal(&self) -> bool {
        matches!(self.kind, TileKind::Goal)
    }

    pub fn is_visible(&self) -> bool {
        !matches!(self.kind, TileKind::Invisible)
    }

    /// Presentation opacity, derived from the solid flag for
    /// disappearing blocks.
    pub fn opacity(&self) -> f32 {
        match self.kind {
            TileKind::Disappearing { solid: false, .. } => 0.2,
            TileKind::Invisible => 0.0,
            _ => 1.0,
        }
    }

    /// A falling block that has not been landed on yet.
    pub fn is_resting_falling(&self) -> bool {
        matches!(self.kind, TileKind::Falling { stage: FallStage::Resting, .. })
    }

    /// Rest → Armed. Returns false if the block was not resting.
    pub fn arm(&mut self) -> bool {
        if let TileKind::Falling { stage, .. } = &mut self.kind {
            if *stage == FallStage::Resting {
                *stage = FallStage::Armed;
                return true;
            }
        }
        false
    }

    /// Armed → Triggered. Happens at most once per tile.
    pub fn release(&mut self) -> bool {
        if let TileKind::Falling { stage, .. } = &mut self.kind {
            if *stage == FallStage::Armed {
                *stage = FallStage::Triggered;
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(ch: char) -> Tile {
        match Symbol::parse(ch, &TileParams::default()) {
            Symbol::Tile(kind) => Tile::new(0, 0, 40.0, kind),
            other => panic!("{ch:?} produced {other:?}"),
        }
    }

    #[test]
    fn symbol_table_flags() {
        // (symbol, solid, deadly)
        let table = [
            ('#', true, false),
            ('G', false, false),
            ('S', true, true),
            ('F', false, false),
            ('I', true, false),
            ('M', true, false),
            ('^', true, true),
            ('D', true, false),
            ('B', true, false),
        ];
        for (ch, solid, deadly) in table {
            let t = tile(ch);
            assert_eq!(t.solid(), solid, "solid for {ch:?}");
            assert_eq!(t.deadly(), deadly, "deadly for {ch:?}");
        }
    }

    #[test]
    fn unknown_and_start_symbols() {
        let p = TileParams::default();
        assert_eq!(Symbol::parse('@', &p), Symbol::Start);
        assert_eq!(Symbol::parse(' ', &p), Symbol::Empty);
        assert_eq!(Symbol::parse('.', &p), Symbol::Empty);
        assert_eq!(Symbol::parse('z', &p), Symbol::Empty);
    }

    #[test]
    fn pixel_rect_from_cell() {
        let t = Tile::new(3, 2, 40.0, TileKind::Wall);
        assert_eq!((t.x, t.y), (120.0, 80.0));
        assert_eq!((t.anchor_x, t.anchor_y), (120.0, 80.0));
    }

    #[test]
    fn invisible_is_solid_but_hidden() {
        let t = tile('I');
        assert!(t.solid());
        assert!(!t.is_visible());
        assert_eq!(t.opacity(), 0.0);
    }

    #[test]
    fn disappearing_opacity_tracks_solid() {
        let mut t = tile('D');
        assert_eq!(t.opacity(), 1.0);
        if let TileKind::Disappearing { solid, .. } = &mut t.kind {
            *solid = false;
        }
        assert!(!t.solid());
        assert!((t.opacity() - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn falling_stages_advance_once() {
        let mut t = tile('B');
        assert!(t.is_resting_falling());
        assert!(!t.release(), "cannot release before arming");
        assert!(t.arm());
        assert!(!t.arm());
        assert!(t.release());
        assert!(!t.release());
        assert!(matches!(t.kind, TileKind::Falling { stage: FallStage::Triggered, .. }));
    }
}
