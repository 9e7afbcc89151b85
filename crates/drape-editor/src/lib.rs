pub mod clipboard;
pub mod drag;
pub mod input;
pub mod selection;
pub mod shortcuts;
pub mod studio;

pub use clipboard::Clipboard;
pub use drag::DragSession;
pub use input::{InputEvent, Modifiers};
pub use selection::PropertyBridge;
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use studio::Studio;
