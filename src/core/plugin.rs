use std::{fs, path::{Path, PathBuf}, sync::{atomic::{self, AtomicBool}, Arc, Mutex, MutexGuard, PoisonError}};

use arc_swap::ArcSwap;
use rust_i18n::t;
use serde::{Deserialize, Serialize};

use super::{
    catalog::{self, Catalog, Catalogs, GameLanguage, Slot, CHINESE_DATA_FILENAME},
    dispatcher,
    gui::ConfigWindow,
    host::{AddonArgs, AddonEvent, AddonHandler, Notification, NotificationKind, Services},
    patcher::{CastTextPatcher, PatchOutcome, PatchSettings},
    utils, Error
};

pub const CONFIG_FILENAME: &str = "castbar_translator.json";

pub const MIN_CAST_BAR_HEIGHT: i32 = 30;
pub const MAX_CAST_BAR_HEIGHT: i32 = 60;

fn default_serde_instance<'a, T: Deserialize<'a>>() -> Option<T> {
    let empty_data = std::iter::empty::<((), ())>();
    let empty_deserializer = serde::de::value::MapDeserializer::<_, serde::de::value::Error>::new(empty_data);
    T::deserialize(empty_deserializer).ok()
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Config {
    #[serde(default = "Config::default_version")]
    pub version: i32,
    /// First line; the language being learned.
    #[serde(default = "Config::default_top_language")]
    pub top_language: GameLanguage,
    /// Second line; the reference language.
    #[serde(default = "Config::default_bottom_language")]
    pub bottom_language: GameLanguage,
    #[serde(default = "Config::default_cast_bar_height")]
    pub cast_bar_height: i32,
    #[serde(default)]
    pub wrap_text: bool,
    #[serde(default)]
    pub debug_mode: bool
}

impl Config {
    pub const VERSION: i32 = 1;

    fn default_version() -> i32 { Self::VERSION }
    fn default_top_language() -> GameLanguage { GameLanguage::Japanese }
    fn default_bottom_language() -> GameLanguage { GameLanguage::English }
    fn default_cast_bar_height() -> i32 { 44 }

    pub fn clamped(mut self) -> Config {
        self.cast_bar_height = self.cast_bar_height.clamp(MIN_CAST_BAR_HEIGHT, MAX_CAST_BAR_HEIGHT);
        self
    }

    /// Deserializes field by field when the whole object fails, so one bad value only
    /// resets that field to its default.
    pub fn from_json_lenient(value: serde_json::Value) -> Result<Config, Error> {
        if let Ok(config) = Config::deserialize(&value) {
            return Ok(config);
        }

        let fields = match value {
            serde_json::Value::Object(fields) => fields,
            other => return Ok(serde_json::from_value(other)?)
        };

        let mut accepted = serde_json::Map::new();
        for (key, field) in fields {
            let mut candidate = accepted.clone();
            candidate.insert(key.clone(), field.clone());
            if Config::deserialize(&serde_json::Value::Object(candidate)).is_ok() {
                accepted.insert(key, field);
            }
            else {
                warn!("Ignoring invalid config value for '{}': {}", key, field);
            }
        }
        Ok(serde_json::from_value(serde_json::Value::Object(accepted))?)
    }

    pub fn language(&self, slot: Slot) -> GameLanguage {
        match slot {
            Slot::Top => self.top_language,
            Slot::Bottom => self.bottom_language
        }
    }

    fn patch_settings(&self) -> PatchSettings {
        PatchSettings {
            cast_bar_height: self.cast_bar_height.clamp(MIN_CAST_BAR_HEIGHT, MAX_CAST_BAR_HEIGHT) as u16,
            wrap_text: self.wrap_text
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        default_serde_instance().expect("default instance")
    }
}

pub struct Plugin {
    services: Services,
    pub config: ArcSwap<Config>,
    pub catalogs: ArcSwap<Catalogs>,

    patcher: Mutex<CastTextPatcher>,
    handler: Mutex<Option<AddonHandler>>,
    config_window: Mutex<Option<ConfigWindow>>,
    disposed: AtomicBool
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Plugin {
    /// Loads config and language data and starts listening to the cast bar addons.
    ///
    /// Failures along the way are logged and reported; the plugin always comes up, possibly
    /// without translations.
    pub fn new(services: Services) -> Arc<Plugin> {
        let config = match Self::load_config(&services.plugin_interface.config_dir()) {
            Ok(v) => v,
            Err(e) => {
                super::log::init(false, services.log.clone()); // early init to log error
                error!("Failed to load config, using defaults: {}", e);
                Config::default()
            }
        };

        super::log::init(config.debug_mode, services.log.clone());
        info!("Cast Bar Translator {}", env!("CASTBAR_DISPLAY_VERSION"));

        let plugin = Arc::new(Plugin {
            catalogs: ArcSwap::from_pointee(Catalogs::unavailable(config.top_language, config.bottom_language)),
            config: ArcSwap::from_pointee(config),
            patcher: Mutex::default(),
            handler: Mutex::default(),
            config_window: Mutex::default(),
            disposed: AtomicBool::new(false),
            services
        });

        plugin.reload_catalogs();
        plugin.register_listeners();

        info!("Cast Bar Translator loaded.");
        plugin
    }

    fn register_listeners(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        let handler: AddonHandler = Arc::new(move |event: AddonEvent, args: &AddonArgs| {
            if let Some(plugin) = weak.upgrade() {
                plugin.on_addon_event(event, args);
            }
        });

        if let Err(e) = dispatcher::register(&*self.services.addon_lifecycle, &handler) {
            warn!("Some cast bars will not be translated: {}", e);
        }
        *lock(&self.handler) = Some(handler);
    }

    /// Runs one frame of the patcher for the addon that fired. Returns `None` for addons
    /// that are not routed or after disposal.
    pub fn on_addon_event(&self, event: AddonEvent, args: &AddonArgs) -> Option<PatchOutcome> {
        if self.disposed.load(atomic::Ordering::Acquire) {
            return None;
        }

        let snapshot = dispatcher::snapshot(args, &*self.services.target_manager)?;
        let settings = self.config.load().patch_settings();
        let catalogs = self.catalogs.load();

        let outcome = lock(&self.patcher).process(&*self.services.addon_ui, &snapshot, &catalogs, &settings);
        trace!("{} {:?}: {:?}", args.addon_name, event, outcome);
        Some(outcome)
    }

    fn load_config(config_dir: &Path) -> Result<Config, Error> {
        let value: Option<serde_json::Value> = utils::read_json_file(config_dir.join(CONFIG_FILENAME))?;
        let config = match value {
            Some(value) => Config::from_json_lenient(value)?,
            None => Config::default()
        };
        Ok(config.clamped())
    }

    /// Persists `config`, then applies it. Changing a language reloads only that slot.
    pub fn save_and_reload_config(&self, config: Config) -> Result<(), Error> {
        let config = config.clamped();
        let config_dir = self.services.plugin_interface.config_dir();
        fs::create_dir_all(&config_dir)?;
        utils::write_json_file(&config, config_dir.join(CONFIG_FILENAME))?;

        let prev = self.config.swap(Arc::new(config.clone()));
        if prev.debug_mode != config.debug_mode {
            super::log::set_debug_mode(config.debug_mode);
        }
        for slot in [Slot::Top, Slot::Bottom] {
            if prev.language(slot) != config.language(slot) {
                self.reload_slot(slot);
            }
        }
        Ok(())
    }

    fn data_dir(&self) -> Option<PathBuf> {
        self.services.plugin_interface.assembly_dir()
    }

    fn load_catalog(&self, slot: Slot, language: GameLanguage) -> Arc<Catalog> {
        let data_dir = self.data_dir();
        match Catalog::load(language, &*self.services.data_manager, data_dir.as_deref()) {
            Ok(catalog) => Arc::new(catalog),
            Err(e) => {
                self.report_load_error(slot, language, &e);
                Arc::new(Catalog::unavailable(language))
            }
        }
    }

    fn report_load_error(&self, slot: Slot, language: GameLanguage, e: &Error) {
        match e {
            Error::DataFileNotFound(path) => {
                warn!("{} data file not found: {}", language, path.display());
                let filename = language.data_filename().unwrap_or(CHINESE_DATA_FILENAME);
                self.notify(NotificationKind::Warning, t!("notification.missing_file", file = filename).to_string());
            }
            Error::PluginDirUnknown => {
                warn!("Unable to determine plugin directory for {} data", language);
                self.notify(NotificationKind::Warning, t!("notification.missing_plugin_dir").to_string());
            }
            _ => {
                error!("Failed to load {} language {}: {}", slot, language, e);
                self.notify(NotificationKind::Error, t!("notification.load_failed", language = language, error = e).to_string());
            }
        }
    }

    /// Replaces both catalogs from the current config. Slots that fail to load come back
    /// empty rather than keeping stale entries from a previous language.
    pub fn reload_catalogs(&self) {
        let config = self.config.load();
        let catalogs = Catalogs {
            top: self.load_catalog(Slot::Top, config.top_language),
            bottom: self.load_catalog(Slot::Bottom, config.bottom_language)
        };
        self.catalogs.store(Arc::new(catalogs));
        info!("Loaded languages: {} (top) / {} (bottom)", config.top_language, config.bottom_language);
    }

    /// Reloads one slot, leaving the other one untouched.
    pub fn reload_slot(&self, slot: Slot) {
        let language = self.config.load().language(slot);
        let catalog = self.load_catalog(slot, language);
        self.catalogs.rcu(|current| current.with(slot, catalog.clone()));
        info!("Loaded {} language: {}", slot, language);
    }

    /// Reload from disk, as requested from the settings window.
    pub fn reload_data(&self, show_notification: bool) {
        self.reload_catalogs();
        if show_notification && self.is_file_data_loaded() {
            self.notify(NotificationKind::Success, t!("notification.reloaded").to_string());
        }
    }

    pub fn is_file_data_loaded(&self) -> bool {
        self.catalogs.load().has_file_data()
    }

    pub fn file_data_path(&self) -> PathBuf {
        let data_dir = self.data_dir();
        catalog::data_file_path(data_dir.as_deref(), GameLanguage::ChineseTraditional)
            .unwrap_or_else(|| PathBuf::from(CHINESE_DATA_FILENAME))
    }

    pub fn notify(&self, kind: NotificationKind, content: String) {
        self.services.notification_manager.add_notification(Notification {
            title: t!("plugin_name").to_string(),
            content,
            kind
        });
    }

    pub fn open_config_ui(&self) {
        let mut window = lock(&self.config_window);
        if window.is_none() {
            *window = Some(ConfigWindow::new());
        }
    }

    pub fn is_config_ui_open(&self) -> bool {
        lock(&self.config_window).is_some()
    }

    /// Draws plugin windows. Call from the host's UI pass.
    pub fn draw_ui(&self, ctx: &egui::Context) {
        let mut slot = lock(&self.config_window);
        if let Some(window) = slot.as_mut() {
            if !window.run(ctx, self) {
                *slot = None;
            }
        }
    }

    pub fn live_buffers(&self) -> usize {
        lock(&self.patcher).live_buffers()
    }

    /// Stops listening and frees every buffer handed to the host. Safe to call repeatedly,
    /// and after a partially failed start.
    pub fn dispose(&self) {
        if self.disposed.swap(true, atomic::Ordering::AcqRel) {
            return;
        }

        if let Some(handler) = lock(&self.handler).take() {
            dispatcher::unregister(&*self.services.addon_lifecycle, &handler);
        }
        *lock(&self.config_window) = None;

        let ui = &*self.services.addon_ui;
        let mut patcher = lock(&self.patcher);
        for route in &dispatcher::ROUTES {
            if let Some(addon) = ui.find_addon(route.addon_name) {
                patcher.detach(ui, addon, route.node_id);
            }
        }
        patcher.release_all();
        drop(patcher);

        info!("Cast Bar Translator unloaded.");
        super::log::shutdown(&self.services.log);
    }
}

impl Drop for Plugin {
    fn drop(&mut self) {
        self.dispose();
    }
}
