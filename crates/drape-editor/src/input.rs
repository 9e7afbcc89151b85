//! Input abstraction layer.
//!
//! Normalizes the host's pointer and keyboard events into one `InputEvent`
//! enum consumed by `Studio::handle`. Coordinates are logical surface
//! units; the host divides out its canvas zoom before sending them.

use serde::Deserialize;

/// Modifier keys held during an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

/// A normalized input event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InputEvent {
    PointerDown {
        x: f32,
        y: f32,
        #[serde(default)]
        modifiers: Modifiers,
    },
    PointerMove {
        x: f32,
        y: f32,
    },
    PointerUp {
        x: f32,
        y: f32,
    },
    /// Enters text editing when it lands on a text element.
    DoubleClick {
        x: f32,
        y: f32,
    },
    Key {
        key: String,
        #[serde(default)]
        modifiers: Modifiers,
    },
}

impl InputEvent {
    /// Extract position if this is a pointer event.
    pub fn position(&self) -> Option<(f32, f32)> {
        match self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y }
            | Self::PointerUp { x, y }
            | Self::DoubleClick { x, y } => Some((*x, *y)),
            Self::Key { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_json_decodes() {
        let ev: InputEvent =
            serde_json::from_str(r#"{"type":"pointerDown","x":4,"y":5,"modifiers":{"shift":true}}"#)
                .unwrap();
        assert_eq!(
            ev,
            InputEvent::PointerDown {
                x: 4.0,
                y: 5.0,
                modifiers: Modifiers {
                    shift: true,
                    ..Modifiers::default()
                },
            }
        );
        assert_eq!(ev.position(), Some((4.0, 5.0)));
    }

    #[test]
    fn keys_have_no_position() {
        let ev: InputEvent = serde_json::from_str(r#"{"type":"key","key":"Delete"}"#).unwrap();
        assert_eq!(ev.position(), None);
    }
}
