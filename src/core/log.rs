use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;

use super::host::PluginLog;

// The `log` facade only takes one logger per process, while the host may load and unload
// the plugin several times. The logger stays installed and the sink is swapped instead.
static SINK: Lazy<RwLock<Option<Arc<dyn PluginLog>>>> = Lazy::new(|| RwLock::new(None));

struct HostLogger;
static LOGGER: HostLogger = HostLogger;

impl log::Log for HostLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let sink = SINK.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(sink) = sink.as_ref() {
            sink.write(record.level(), record.target(), &record.args().to_string());
        }
    }

    fn flush(&self) {}
}

pub fn init(debug_mode: bool, sink: Arc<dyn PluginLog>) {
    let filter_level = if debug_mode {
        log::LevelFilter::Debug
    }
    else {
        log::LevelFilter::Info
    };

    *SINK.write().unwrap_or_else(PoisonError::into_inner) = Some(sink);
    // Fails harmlessly when already installed
    _ = log::set_logger(&LOGGER);
    log::set_max_level(filter_level);
}

pub fn set_debug_mode(debug_mode: bool) {
    log::set_max_level(if debug_mode { log::LevelFilter::Debug } else { log::LevelFilter::Info });
}

/// Detaches `sink` if it is still the active one; a newer plugin instance keeps its own.
pub fn shutdown(sink: &Arc<dyn PluginLog>) {
    let mut current = SINK.write().unwrap_or_else(PoisonError::into_inner);
    let is_current = current.as_ref()
        .is_some_and(|s| Arc::as_ptr(s) as *const () == Arc::as_ptr(sink) as *const ());
    if is_current {
        *current = None;
    }
}
