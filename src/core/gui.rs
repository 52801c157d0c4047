use rust_i18n::t;

use super::{
    catalog::{GameLanguage, Slot},
    host::NotificationKind,
    plugin::{Config, Plugin, MAX_CAST_BAR_HEIGHT, MIN_CAST_BAR_HEIGHT}
};

const WARNING_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 204, 0);
const NOTE_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 128, 0);
const LOADED_COLOR: egui::Color32 = egui::Color32::from_rgb(0, 255, 0);
const MISSING_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 0, 0);

// Fire, present in every language's table
const PREVIEW_ACTION_ID: u32 = 141;

/// Settings window. Every edit is saved right away.
pub struct ConfigWindow {
    id: egui::Id,
    // Unsaved edits while the height slider is held
    draft: Option<Config>
}

impl Default for ConfigWindow {
    fn default() -> Self {
        ConfigWindow {
            id: egui::Id::new("castbar_translator_config"),
            draft: None
        }
    }
}

impl ConfigWindow {
    pub fn new() -> ConfigWindow {
        ConfigWindow::default()
    }

    fn language_combo(ui: &mut egui::Ui, id: egui::Id, label: &str, value: &mut GameLanguage) {
        ui.label(label);
        egui::ComboBox::new(id, "")
        .selected_text(value.to_string())
        .width(200.0)
        .show_ui(ui, |ui| {
            for language in GameLanguage::ALL {
                ui.selectable_value(value, language, language.to_string());
            }
        });
    }

    /// Returns (reload requested, height slider being dragged).
    fn run_contents(&self, ui: &mut egui::Ui, config: &mut Config, plugin: &Plugin) -> (bool, bool) {
        let mut reload_requested = false;

        ui.label(egui::RichText::new(t!("config_window.language_settings").to_string()).strong());
        ui.separator();

        Self::language_combo(ui, self.id.with("top_language"), &t!("config_window.top_language"), &mut config.top_language);
        ui.add_space(4.0);
        Self::language_combo(ui, self.id.with("bottom_language"), &t!("config_window.bottom_language"), &mut config.bottom_language);

        if config.top_language == config.bottom_language {
            ui.add_space(4.0);
            ui.colored_label(WARNING_COLOR, t!("config_window.same_language").to_string());
        }

        if config.top_language.is_file_backed() || config.bottom_language.is_file_backed() {
            ui.add_space(4.0);
            ui.colored_label(NOTE_COLOR, t!("config_window.font_note").to_string());
            ui.separator();

            if plugin.is_file_data_loaded() {
                ui.colored_label(LOADED_COLOR, t!("config_window.data_loaded").to_string());
            }
            else {
                ui.colored_label(MISSING_COLOR, t!("config_window.data_missing").to_string());
            }
            ui.label(egui::RichText::new(plugin.file_data_path().display().to_string()).weak().small());

            if ui.button(t!("config_window.reload_data").to_string()).clicked() {
                reload_requested = true;
            }
        }

        ui.separator();
        let height_slider = ui.add(
            egui::Slider::new(&mut config.cast_bar_height, MIN_CAST_BAR_HEIGHT..=MAX_CAST_BAR_HEIGHT)
            .text(t!("config_window.cast_bar_height").to_string())
        );
        ui.label(egui::RichText::new(t!("config_window.cast_bar_height_hint").to_string()).weak());
        ui.checkbox(&mut config.wrap_text, t!("config_window.wrap_text").to_string());
        ui.checkbox(&mut config.debug_mode, t!("config_window.debug_mode").to_string());

        ui.separator();
        ui.label(t!("config_window.preview").to_string());
        let catalogs = plugin.catalogs.load();
        egui::Frame::group(ui.style())
        .show(ui, |ui| {
            ui.set_min_width(200.0);
            for slot in [Slot::Top, Slot::Bottom] {
                let catalog = catalogs.get(slot);
                let language = config.language(slot);
                let name = catalog.lookup(PREVIEW_ACTION_ID);
                if name.is_empty() || catalog.language() != language {
                    ui.label(language.to_string());
                }
                else {
                    ui.label(name.into_owned());
                }
            }
        });

        (reload_requested, height_slider.dragged())
    }

    /// Holds the edit while the slider is dragged; otherwise returns it if it needs saving.
    fn settle(&mut self, config: Config, saved: &Config, dragging: bool) -> Option<Config> {
        if dragging {
            self.draft = Some(config);
            None
        }
        else if config != *saved {
            Some(config)
        }
        else {
            None
        }
    }

    /// Returns false once the window has been closed.
    pub fn run(&mut self, ctx: &egui::Context, plugin: &Plugin) -> bool {
        let mut open = true;
        let mut reload_requested = false;
        let mut dragging = false;
        let prev_config = plugin.config.load_full();
        let mut config = self.draft.take().unwrap_or_else(|| (*prev_config).clone());

        egui::Window::new(t!("config_window.title").to_string())
        .id(self.id)
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            (reload_requested, dragging) = self.run_contents(ui, &mut config, plugin);
        });

        if let Some(config) = self.settle(config, &prev_config, dragging && open) {
            if let Err(e) = plugin.save_and_reload_config(config) {
                error!("Failed to save config: {}", e);
                plugin.notify(NotificationKind::Error, e.to_string());
            }
        }
        if reload_requested {
            plugin.reload_data(true);
        }

        open
    }
}
