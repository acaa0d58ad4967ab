pub mod render;
pub mod terminal;

pub use render::{render, UiCommand};
pub use terminal::TerminalSurface;
