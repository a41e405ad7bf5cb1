pub mod config;
pub mod describe;
pub mod editor;
pub mod filter_list;
pub mod scheduler;
pub mod service;

pub use config::FilterEditorConfig;
pub use editor::FilterEditor;
pub use filter_core;
