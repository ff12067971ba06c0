// Commands module - the native bridge exposed to the front end
// Each function is one call the UI can make; file dialogs live in the front end

pub mod common;
pub mod document;
pub mod file;
pub mod folder;
pub mod image;
pub mod settings;
