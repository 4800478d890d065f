use glam::Vec2;
use std::collections::HashSet;

/// A movement action a key can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    MoveForward,
    MoveBackward,
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    /// Multiplies movement speed while held.
    Sprint,
}

/// Keyboard/mouse state for one frame.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: HashSet<Action>,
    mouse_delta: Vec2,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, action: Action, pressed: bool) {
        if pressed {
            self.held.insert(action);
        } else {
            self.held.remove(&action);
        }
    }

    pub fn press(&mut self, action: Action) {
        self.set(action, true);
    }

    pub fn release(&mut self, action: Action) {
        self.set(action, false);
    }

    pub fn is_held(&self, action: Action) -> bool {
        self.held.contains(&action)
    }

    /// Release everything, e.g. when the window loses focus.
    pub fn clear(&mut self) {
        if !self.held.is_empty() {
            tracing::debug!("releasing {} held actions", self.held.len());
        }
        self.held.clear();
        self.mouse_delta = Vec2::ZERO;
    }

    /// Accumulate relative mouse motion until the next `take_mouse_delta`.
    pub fn add_mouse_delta(&mut self, dx: f32, dy: f32) {
        self.mouse_delta += Vec2::new(dx, dy);
    }

    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Return and reset the accumulated mouse motion.
    pub fn take_mouse_delta(&mut self) -> Vec2 {
        std::mem::take(&mut self.mouse_delta)
    }

    /// Signed axis from a pair of opposing actions: +1, -1 or 0.
    pub fn axis(&self, positive: Action, negative: Action) -> f32 {
        match (self.is_held(positive), self.is_held(negative)) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_and_release() {
        let mut input = InputState::new();
        input.press(Action::MoveForward);
        assert!(input.is_held(Action::MoveForward));
        input.release(Action::MoveForward);
        assert!(!input.is_held(Action::MoveForward));
    }

    #[test]
    fn opposing_actions_cancel() {
        let mut input = InputState::new();
        input.press(Action::MoveLeft);
        assert_eq!(input.axis(Action::MoveRight, Action::MoveLeft), -1.0);
        input.press(Action::MoveRight);
        assert_eq!(input.axis(Action::MoveRight, Action::MoveLeft), 0.0);
    }

    #[test]
    fn mouse_delta_accumulates_and_resets() {
        let mut input = InputState::new();
        input.add_mouse_delta(3.0, -1.0);
        input.add_mouse_delta(2.0, 4.0);
        assert_eq!(input.take_mouse_delta(), Vec2::new(5.0, 3.0));
        assert_eq!(input.mouse_delta(), Vec2::ZERO);
    }

    #[test]
    fn clear_releases_all() {
        let mut input = InputState::new();
        input.press(Action::Sprint);
        input.add_mouse_delta(1.0, 1.0);
        input.clear();
        assert!(!input.is_held(Action::Sprint));
        assert_eq!(input.mouse_delta(), Vec2::ZERO);
    }
}
