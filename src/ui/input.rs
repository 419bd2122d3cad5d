/// Keyboard input tracker.
///
/// Terminals report key presses, not key state, so "held" is derived:
/// a key counts as held from its Press until a Release event (when the
/// terminal supports keyboard enhancement) or until `HOLD_TIMEOUT`
/// passes without a Press/Repeat.
///
/// Movement and jump read held state; menu actions read fresh presses.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::entity::Intent;

/// Without Release events, a key expires this long after its last repeat.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
pub const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
pub const KEYS_JUMP: &[KeyCode] = &[
    KeyCode::Up, KeyCode::Char(' '), KeyCode::Char('w'), KeyCode::Char('W'),
];

pub struct InputState {
    last_active: HashMap<KeyCode, Instant>,
    /// Keys that went from released to held during the last drain.
    fresh_presses: Vec<KeyCode>,
    pub raw_events: Vec<KeyEvent>,
    /// Honor Release events; only set once keyboard enhancement is on.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events. Call once per frame.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            let Ok(Event::Key(key)) = event::read() else { continue };
            self.record(key, Instant::now());
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn record(&mut self, key: KeyEvent, at: Instant) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {}
            _ => {
                if !self.is_held(key.code) {
                    self.fresh_presses.push(key.code);
                }
                self.last_active.insert(key.code, at);
            }
        }
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active.get(&code)
            .is_some_and(|t| t.elapsed() < HOLD_TIMEOUT)
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    /// Edge trigger: pressed during the last drain.
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && matches!(k.code, KeyCode::Char('c') | KeyCode::Char('C'))
        })
    }

    /// The held keys reduced to the actor's intent vector.
    pub fn intent(&self) -> Intent {
        Intent {
            left: self.any_held(KEYS_LEFT),
            right: self.any_held(KEYS_RIGHT),
            jump: self.any_held(KEYS_JUMP),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn release(code: KeyCode) -> KeyEvent {
        let mut k = KeyEvent::new(code, KeyModifiers::NONE);
        k.kind = KeyEventKind::Release;
        k
    }

    #[test]
    fn held_keys_map_to_intent() {
        let mut s = InputState::new();
        s.record(press(KeyCode::Char('a')), Instant::now());
        s.record(press(KeyCode::Char(' ')), Instant::now());
        assert_eq!(s.intent(), Intent { left: true, right: false, jump: true });
    }

    #[test]
    fn repeat_is_not_a_fresh_press() {
        let mut s = InputState::new();
        s.record(press(KeyCode::Enter), Instant::now());
        assert!(s.was_pressed(KeyCode::Enter));
        s.fresh_presses.clear();
        s.record(press(KeyCode::Enter), Instant::now());
        assert!(!s.was_pressed(KeyCode::Enter));
    }

    #[test]
    fn release_only_counts_with_enhancement() {
        let mut s = InputState::new();
        s.record(press(KeyCode::Right), Instant::now());
        s.record(release(KeyCode::Right), Instant::now());
        assert!(s.is_held(KeyCode::Right));

        s.honor_release = true;
        s.record(release(KeyCode::Right), Instant::now());
        assert!(!s.is_held(KeyCode::Right));
    }

    #[test]
    fn ctrl_c_is_detected() {
        let mut s = InputState::new();
        s.record(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), Instant::now());
        assert!(s.ctrl_c_pressed());
    }
}
