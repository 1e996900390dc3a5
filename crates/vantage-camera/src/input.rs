use std::collections::HashSet;

use glam::Vec2;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Keyboard and cursor state for one frame, fed from window events and read
/// by the per-frame update.
#[derive(Clone, Debug, Default)]
pub struct InputState {
    keys_down: HashSet<KeyCode>,
    /// Cursor over the viewport in NDC, `None` when it is elsewhere.
    pub cursor_ndc: Option<Vec2>,
}

impl InputState {
    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat: false,
                        ..
                    },
                ..
            } => match state {
                ElementState::Pressed => self.press(*code),
                ElementState::Released => self.release(*code),
            },
            WindowEvent::Focused(false) => self.keys_down.clear(),
            _ => {}
        }
    }

    pub fn press(&mut self, key: KeyCode) {
        self.keys_down.insert(key);
    }

    pub fn release(&mut self, key: KeyCode) {
        self.keys_down.remove(&key);
    }

    pub fn is_down(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }
}

/// Maps a position inside a screen rectangle to NDC (`y` up). Positions
/// outside the rectangle map to `None`.
pub fn cursor_to_ndc(pos: Vec2, rect_min: Vec2, rect_size: Vec2) -> Option<Vec2> {
    if rect_size.x <= 0.0 || rect_size.y <= 0.0 {
        return None;
    }
    let t = (pos - rect_min) / rect_size;
    if !(0.0..=1.0).contains(&t.x) || !(0.0..=1.0).contains(&t.y) {
        return None;
    }
    Some(Vec2::new(t.x * 2.0 - 1.0, 1.0 - t.y * 2.0))
}
