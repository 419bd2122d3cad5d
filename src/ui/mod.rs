/// Terminal front end and the collaborators the simulation reports to:
/// renderer, keyboard and gamepad input, sound, particles.

pub mod gamepad;
pub mod input;
pub mod particles;
pub mod renderer;
pub mod sound;
