//! Keyboard geometry, keymap parsing and log event decoding

mod event;
pub mod keymap;
pub mod layout;

pub use event::{parse_line, KeyEventType, KeypressEvent};
pub use keymap::{extract_layers, parse_bindings, KeymapParser, Layer, LayoutConfig};
pub use layout::{KeyPosition, KeySlot, KeyboardLayout, LayoutEntry, Side};
