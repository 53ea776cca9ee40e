mod format;
mod render;

pub use format::OutputFormat;
pub use render::{ConsoleNotifier, render_text};
