pub mod plugin;
pub use plugin::{Config, Plugin};

mod error;
pub use error::Error;

pub mod host;
pub use host::Services;

pub mod arena;
pub mod catalog;
pub mod dispatcher;
pub mod patcher;
pub mod sestring;

mod gui;
pub use gui::ConfigWindow;

pub mod log;
pub mod utils;

#[cfg(test)]
pub(crate) mod mock;
