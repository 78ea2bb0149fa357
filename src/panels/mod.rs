mod central_panel;
mod tools_panel;

pub use central_panel::{central_panel, clear_dialog};
pub use tools_panel::tools_panel;
