/// Per-tick advance of tiles with time-varying state.
///
/// No tile reads another tile here, so update order does not matter.
/// Tiles without mutable state are left untouched.

use super::tile::{FallStage, Tile, TileKind};

/// Advance every tile by one tick.
pub fn simulate(tiles: &mut [Tile]) {
    for tile in tiles.iter_mut() {
        advance(tile);
    }
}

/// Advance a single tile by one tick.
pub fn advance(tile: &mut Tile) {
    match &mut tile.kind {
        TileKind::MovingPlatform { vx, range } => {
            tile.x += *vx;
            // Reflect once past the bound; overshoot is corrected next tick.
            if tile.x > tile.anchor_x + *range || tile.x < tile.anchor_x - *range {
                *vx = -*vx;
            }
        }
        TileKind::MovingSpike { vy, range } => {
            tile.y += *vy;
            if tile.y > tile.anchor_y + *range || tile.y < tile.anchor_y - *range {
                *vy = -*vy;
            }
        }
        TileKind::Disappearing { timer, interval, solid } => {
            *timer += 1;
            if *timer > *interval {
                *timer = 0;
                *solid = !*solid;
            }
        }
        TileKind::Falling { stage: FallStage::Triggered, vy, gravity } => {
            *vy += *gravity;
            tile.y += *vy;
        }
        TileKind::Falling { .. }
        | TileKind::Wall
        | TileKind::Goal
        | TileKind::Spike
        | TileKind::Fake
        | TileKind::Invisible => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tile::{Symbol, TileParams};

    fn make(ch: char, col: usize, row: usize) -> Tile {
        match Symbol::parse(ch, &TileParams::default()) {
            Symbol::Tile(kind) => Tile::new(col, row, 40.0, kind),
            _ => unreachable!(),
        }
    }

    #[test]
    fn static_tiles_never_move() {
        let mut tiles: Vec<Tile> = "#GSFI".chars().map(|c| make(c, 4, 4)).collect();
        let before = tiles.clone();
        for _ in 0..500 {
            simulate(&mut tiles);
        }
        assert_eq!(tiles, before);
    }

    #[test]
    fn platform_flips_exactly_when_bound_crossed() {
        let mut t = make('M', 5, 5);
        let start = t.x;
        // 2 px/tick, range 100: tick 51 puts it at +102, the first step past the bound.
        for i in 1..=50 {
            advance(&mut t);
            assert!(matches!(t.kind, TileKind::MovingPlatform { vx, .. } if vx > 0.0), "tick {i}");
        }
        assert_eq!(t.x, start + 100.0);
        advance(&mut t);
        assert_eq!(t.x, start + 102.0);
        assert!(matches!(t.kind, TileKind::MovingPlatform { vx, .. } if vx < 0.0));
        advance(&mut t);
        assert_eq!(t.x, start + 100.0);
    }

    #[test]
    fn moving_spike_oscillates_vertically() {
        let mut t = make('^', 5, 5);
        let (x0, y0) = (t.x, t.y);
        let mut min_y = y0;
        let mut max_y = y0;
        for _ in 0..400 {
            advance(&mut t);
            min_y = min_y.min(t.y);
            max_y = max_y.max(t.y);
            assert_eq!(t.x, x0);
        }
        assert!(max_y <= y0 + 80.0 + 2.0);
        assert!(min_y >= y0 - 80.0 - 2.0);
        assert!(max_y > y0 + 78.0 && min_y < y0 - 78.0, "should sweep the full range");
    }

    #[test]
    fn disappearing_follows_parity_rule() {
        let mut t = make('D', 0, 0);
        let interval = 100u32;
        for tick in 1..=1000u32 {
            advance(&mut t);
            let expected = (tick / (interval + 1)) % 2 == 0;
            assert_eq!(t.solid(), expected, "tick {tick}");
        }
    }

    #[test]
    fn falling_waits_until_triggered() {
        let mut t = make('B', 2, 2);
        let y0 = t.y;
        for _ in 0..10 {
            advance(&mut t);
        }
        assert_eq!(t.y, y0, "resting block must not move");
        t.arm();
        advance(&mut t);
        assert_eq!(t.y, y0, "armed block must not move");

        t.release();
        let mut vy = 0.0f32;
        let mut y = y0;
        for _ in 0..20 {
            advance(&mut t);
            vy += 0.5;
            y += vy;
            assert_eq!(t.y, y);
        }
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn platform_stays_within_one_step_of_range(
                speed in 0.5f32..8.0,
                range in 10.0f32..200.0,
                ticks in 1usize..2000,
            ) {
                let mut t = Tile::new(3, 3, 40.0, TileKind::MovingPlatform { vx: speed, range });
                for _ in 0..ticks {
                    advance(&mut t);
                    let off = (t.x - t.anchor_x).abs();
                    prop_assert!(off <= range + speed + 0.05, "offset {} exceeds {}", off, range + speed);
                }
            }
        }
    }
}
