pub mod banner;
pub mod render;
pub mod tui;

pub use render::TerminalRenderer;
pub use tui::TuiInputPort;

/// Prints the welcome banner and applies the prompt theme for all subsequent inquire prompts.
/// Call once at startup, before the menu loop.
pub fn init_ui() {
    banner::print_welcome();
    tui::apply_theme();
}
