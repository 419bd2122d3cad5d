/// Collision resolution between the actor and the tile set.
///
/// ## Algorithm
///
/// Axis-separated sweep, horizontal before vertical:
///
///   1. **Horizontal**: move x by vx, then walk solid tiles in
///      grid-declaration order. A deadly overlap ends resolution with
///      `Died` (no push-back). Otherwise the actor is pushed flush against
///      the tile's near edge and vx is zeroed.
///   2. **Vertical**: y moves by vy, then goal tiles are tested before
///      anything else, regardless of solidity; an overlap ends resolution
///      with `ReachedGoal`, so entering the goal and a hazard on the same
///      tick counts as a win. Then solid tiles are walked again.
///      Deadly → `Died`.
///      Falling onto a tile lands the actor on top (grounded, vy = 0) and
///      reports `ActivatedFalling` for an untouched falling block. Rising
///      into a tile places the actor under it (vy = 0).
///
/// Tile iteration order is part of the contract: the first qualifying
/// tile wins, so callers must pass tiles in loader order.
///
/// Overlap is strict: rectangles that only touch along an edge do not
/// collide.

use super::tile::Tile;

/// Axis-aligned rectangle, top-left origin, y grows downward.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rect { x, y, w, h }
    }

    /// Open-interval AABB overlap.
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && self.x + self.w > other.x
            && self.y < other.y + other.h
            && self.y + self.h > other.y
    }
}

impl Tile {
    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.size, self.size)
    }
}

/// Terminal result of one resolve call. Index refers to the tile slice.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    None,
    Died,
    ReachedGoal,
    ActivatedFalling(usize),
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Resolution {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub grounded: bool,
    pub outcome: Outcome,
}

/// Resolve one tick of actor movement against `tiles`.
///
/// `grounded` in the result reflects only this call's vertical pass.
pub fn resolve(actor: Rect, vx: f32, vy: f32, tiles: &[Tile]) -> Resolution {
    let mut res = Resolution {
        x: actor.x,
        y: actor.y,
        vx,
        vy,
        grounded: false,
        outcome: Outcome::None,
    };

    if resolve_horizontal(&mut res, actor.w, actor.h, tiles) {
        return res;
    }
    resolve_vertical(&mut res, actor.w, actor.h, tiles);
    res
}

/// Returns true when resolution must stop.
fn resolve_horizontal(res: &mut Resolution, w: f32, h: f32, tiles: &[Tile]) -> bool {
    res.x += res.vx;

    for tile in tiles.iter().filter(|t| t.solid()) {
        let body = Rect::new(res.x, res.y, w, h);
        let r = tile.rect();
        if !body.overlaps(&r) {
            continue;
        }
        if tile.deadly() {
            res.outcome = Outcome::Died;
            return true;
        }
        if res.vx > 0.0 {
            res.x = r.x - w;
        } else if res.vx < 0.0 {
            res.x = r.x + r.w;
        }
        res.vx = 0.0;
    }
    false
}

fn resolve_vertical(res: &mut Resolution, w: f32, h: f32, tiles: &[Tile]) {
    res.y += res.vy;
    res.grounded = false;

    let body = Rect::new(res.x, res.y, w, h);
    if tiles.iter().any(|t| t.is_goal() && body.overlaps(&t.rect())) {
        res.outcome = Outcome::ReachedGoal;
        return;
    }

    for (idx, tile) in tiles.iter().enumerate() {
        if !tile.solid() {
            continue;
        }
        let body = Rect::new(res.x, res.y, w, h);
        let r = tile.rect();
        if !body.overlaps(&r) {
            continue;
        }
        if tile.deadly() {
            res.outcome = Outcome::Died;
            res.grounded = false;
            return;
        }
        if res.vy > 0.0 {
            res.y = r.y - h;
            res.grounded = true;
            res.vy = 0.0;
            if tile.is_resting_falling() && res.outcome == Outcome::None {
                res.outcome = Outcome::ActivatedFalling(idx);
            }
        } else if res.vy < 0.0 {
            res.y = r.y + r.h;
            res.vy = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tile::{FallStage, TileKind};

    const CELL: f32 = 40.0;
    const ACTOR: f32 = 30.0;

    fn at(col: usize, row: usize, kind: TileKind) -> Tile {
        Tile::new(col, row, CELL, kind)
    }

    fn body(x: f32, y: f32) -> Rect {
        Rect::new(x, y, ACTOR, ACTOR)
    }

    fn falling() -> TileKind {
        TileKind::Falling { stage: FallStage::Resting, vy: 0.0, gravity: 0.5 }
    }

    // ── overlap ──

    #[test]
    fn touching_edges_do_not_overlap() {
        let a = Rect::new(0.0, 0.0, 40.0, 40.0);
        assert!(!a.overlaps(&Rect::new(40.0, 0.0, 40.0, 40.0)));
        assert!(!a.overlaps(&Rect::new(0.0, 40.0, 40.0, 40.0)));
        assert!(a.overlaps(&Rect::new(39.9, 39.9, 40.0, 40.0)));
    }

    // ── free movement ──

    #[test]
    fn empty_space_moves_freely() {
        let r = resolve(body(100.0, 100.0), 5.0, 3.0, &[]);
        assert_eq!((r.x, r.y, r.vx, r.vy), (105.0, 103.0, 5.0, 3.0));
        assert!(!r.grounded);
        assert_eq!(r.outcome, Outcome::None);
    }

    // ── vertical ──

    #[test]
    fn lands_on_wall_top_edge() {
        // Wall at row 5 (y = 200). Actor resting exactly on top, then gravity applied.
        let tiles = [at(2, 5, TileKind::Wall)];
        let r = resolve(body(85.0, 170.0), 0.0, 0.6, &tiles);
        assert_eq!(r.y, 170.0);
        assert_eq!(r.vy, 0.0);
        assert!(r.grounded);
        assert_eq!(r.outcome, Outcome::None);
    }

    #[test]
    fn bumps_head_on_ceiling() {
        let tiles = [at(2, 2, TileKind::Wall)]; // y 80..120
        let r = resolve(body(85.0, 125.0), 0.0, -12.0, &tiles);
        assert_eq!(r.y, 120.0);
        assert_eq!(r.vy, 0.0);
        assert!(!r.grounded);
    }

    #[test]
    fn landing_on_spike_dies_without_grounding() {
        let tiles = [at(2, 5, TileKind::Spike)];
        let r = resolve(body(85.0, 170.0), 0.0, 2.0, &tiles);
        assert_eq!(r.outcome, Outcome::Died);
        assert!(!r.grounded);
        assert_eq!(r.vy, 2.0);
    }

    #[test]
    fn fake_wall_is_passable() {
        let tiles = [at(2, 5, TileKind::Fake)];
        let r = resolve(body(85.0, 170.0), 0.0, 5.0, &tiles);
        assert_eq!(r.y, 175.0);
        assert!(!r.grounded);
    }

    #[test]
    fn invisible_wall_blocks() {
        let tiles = [at(2, 5, TileKind::Invisible)];
        let r = resolve(body(85.0, 170.0), 0.0, 5.0, &tiles);
        assert_eq!(r.y, 170.0);
        assert!(r.grounded);
    }

    #[test]
    fn landing_on_resting_falling_block_reports_activation() {
        let tiles = [at(0, 0, TileKind::Wall), at(2, 5, falling())];
        let r = resolve(body(85.0, 170.0), 0.0, 1.0, &tiles);
        assert!(r.grounded);
        assert_eq!(r.outcome, Outcome::ActivatedFalling(1));
    }

    #[test]
    fn armed_falling_block_does_not_report_again() {
        let mut t = at(2, 5, falling());
        t.arm();
        let r = resolve(body(85.0, 170.0), 0.0, 1.0, &[t]);
        assert!(r.grounded);
        assert_eq!(r.outcome, Outcome::None);
    }

    #[test]
    fn goal_wins_over_colocated_hazard() {
        // Goal and spike share the cell at y 120..160; the actor drops into both at once.
        let tiles = [at(3, 3, TileKind::Spike), at(3, 3, TileKind::Goal)];
        let r = resolve(body(125.0, 88.0), 0.0, 5.0, &tiles);
        assert_eq!(r.outcome, Outcome::ReachedGoal);
    }

    #[test]
    fn goal_wins_over_colocated_wall() {
        let tiles = [at(3, 3, TileKind::Wall), at(3, 3, TileKind::Goal)];
        let r = resolve(body(125.0, 88.0), 0.0, 5.0, &tiles);
        assert_eq!(r.outcome, Outcome::ReachedGoal);
        assert!(!r.grounded);
    }

    #[test]
    fn goal_reached_while_standing_inside() {
        let tiles = [at(3, 3, TileKind::Goal)];
        let r = resolve(body(125.0, 125.0), 0.0, 0.6, &tiles);
        assert_eq!(r.outcome, Outcome::ReachedGoal);
    }

    // ── horizontal ──

    #[test]
    fn walking_right_into_wall_pushes_back() {
        let tiles = [at(3, 2, TileKind::Wall)]; // x 120..160
        let r = resolve(body(88.0, 85.0), 5.0, 0.0, &tiles);
        assert_eq!(r.x, 90.0);
        assert_eq!(r.vx, 0.0);
    }

    #[test]
    fn walking_left_into_wall_pushes_back() {
        let tiles = [at(1, 2, TileKind::Wall)]; // x 40..80
        let r = resolve(body(82.0, 85.0), -5.0, 0.0, &tiles);
        assert_eq!(r.x, 80.0);
        assert_eq!(r.vx, 0.0);
    }

    #[test]
    fn walking_into_spike_dies_without_correction() {
        let tiles = [at(3, 2, TileKind::Spike)];
        let r = resolve(body(88.0, 85.0), 5.0, 1.0, &tiles);
        assert_eq!(r.outcome, Outcome::Died);
        assert_eq!(r.x, 93.0, "death pre-empts push-back");
        assert_eq!(r.y, 85.0, "vertical pass never runs");
    }

    #[test]
    fn first_tile_in_order_wins() {
        // Two spikes; the horizontal pass stops at the first one.
        let tiles = [at(3, 2, TileKind::Wall), at(3, 2, TileKind::Spike)];
        let r = resolve(body(88.0, 85.0), 5.0, 0.0, &tiles);
        // Wall pushes the actor out, so the spike no longer overlaps.
        assert_eq!(r.outcome, Outcome::None);
        assert_eq!(r.x, 90.0);

        let tiles = [at(3, 2, TileKind::Spike), at(3, 2, TileKind::Wall)];
        let r = resolve(body(88.0, 85.0), 5.0, 0.0, &tiles);
        assert_eq!(r.outcome, Outcome::Died);
    }

    #[test]
    fn walks_along_floor_without_snagging() {
        // A row of floor tiles directly under the actor.
        let tiles: Vec<Tile> = (0..5).map(|c| at(c, 5, TileKind::Wall)).collect();
        let mut x = 10.0;
        let mut y = 170.0;
        for _ in 0..20 {
            let r = resolve(body(x, y), 5.0, 0.6, &tiles);
            assert!(r.grounded);
            assert_eq!(r.vx, 5.0);
            x = r.x;
            y = r.y;
        }
        assert_eq!(x, 110.0);
        assert_eq!(y, 170.0);
    }
}
