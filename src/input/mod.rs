//! Document loading: plain text, Markdown and PDF CVs, single files or
//! whole directories

pub mod file_detector;
pub mod manager;
pub mod text_extractor;

pub use manager::InputManager;
