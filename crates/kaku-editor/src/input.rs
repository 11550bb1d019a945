//! Input abstraction layer.
//!
//! Normalizes mouse, touch, and pen events into a unified `InputEvent`
//! consumed by tools. Coordinates are in scene space.

/// A normalized input event from any pointing device.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer pressed. `primary` is false for a second finger or a
    /// non-primary mouse button.
    PointerDown { x: f64, y: f64, primary: bool },

    PointerMove { x: f64, y: f64 },

    PointerUp { x: f64, y: f64 },

    /// Keyboard key, by its DOM-style name (`"Escape"`, `"Delete"`, …).
    Key { key: String },
}

impl InputEvent {
    pub fn down(x: f64, y: f64) -> Self {
        Self::PointerDown {
            x,
            y,
            primary: true,
        }
    }

    pub fn secondary_down(x: f64, y: f64) -> Self {
        Self::PointerDown {
            x,
            y,
            primary: false,
        }
    }

    pub fn moved(x: f64, y: f64) -> Self {
        Self::PointerMove { x, y }
    }

    pub fn up(x: f64, y: f64) -> Self {
        Self::PointerUp { x, y }
    }

    pub fn key(key: &str) -> Self {
        Self::Key {
            key: key.to_string(),
        }
    }

    /// Extract position if this is a pointer event.
    pub fn position(&self) -> Option<(f64, f64)> {
        match self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y }
            | Self::PointerUp { x, y } => Some((*x, *y)),
            Self::Key { .. } => None,
        }
    }

    pub fn is_escape(&self) -> bool {
        matches!(self, Self::Key { key } if key == "Escape")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_and_keys() {
        assert_eq!(InputEvent::down(1.0, 2.0).position(), Some((1.0, 2.0)));
        assert_eq!(InputEvent::key("Escape").position(), None);
        assert!(InputEvent::key("Escape").is_escape());
        assert!(!InputEvent::key("Enter").is_escape());
    }
}
