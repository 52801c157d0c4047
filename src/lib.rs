#[macro_use] extern crate log;

rust_i18n::i18n!("assets/locales", fallback = "en");

pub mod core;

pub use crate::core::{host, Config, ConfigWindow, Error, Plugin, Services};
