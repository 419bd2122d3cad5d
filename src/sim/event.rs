/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound, particles, stats
/// and messages. The simulation never acts on them itself.

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    Jumped,
    /// Actor center at the moment of death.
    Died { x: f32, y: f32 },
    Respawned,
    ReachedGoal,
    /// Landed on a resting falling block; release is scheduled.
    FallingArmed { tile: usize },
    FallingReleased { tile: usize },
    GoalEvaded { from_x: f32, to_x: f32 },
}
