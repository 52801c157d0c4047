use fnv::FnvHashMap;

use super::{
    arena::{ForeignString, StringArena},
    catalog::Catalogs,
    host::{AddonHandle, AddonUi, GameObject, TextEncoding, TextFlags, TextNode},
    sestring, Error
};

/// What one dispatched frame saw for one (addon, node) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastSnapshot {
    pub addon: AddonHandle,
    pub node_id: u32,
    pub caster: Option<GameObject>
}

impl CastSnapshot {
    /// Action id if the caster is a battle character that is casting right now.
    pub fn casting_action(&self) -> Option<u32> {
        match self.caster? {
            GameObject::BattleChara(chara) if chara.is_casting => Some(chara.cast_action_id),
            _ => None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchSettings {
    /// Minimum node height for two lines.
    pub cast_bar_height: u16,
    pub wrap_text: bool
}

type Encoder = fn(&str, &str, TextEncoding) -> Result<Vec<u8>, Error>;

// Installed in place of our buffers on detach; lives as long as the module.
static EMPTY_TEXT: [u8; 1] = [0];

/// The state that ended processing for a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    NotVisible,
    NodeUnavailable,
    NotCasting,
    MissingTranslation,
    SameName,
    /// Our buffer is still installed with the right text; only layout was checked.
    UpToDate,
    Written,
    WriteFailed
}

/// Rewrites cast bar text nodes into two-line, two-language text.
///
/// Holds the only references to the buffers it installs, one per node id. The host keeps
/// drawing from those addresses across frames, so a buffer lives until the next write to the
/// same node or until [`CastTextPatcher::release_all`].
pub struct CastTextPatcher {
    arena: StringArena,
    written: FnvHashMap<u32, String>,
    encode: Encoder
}

impl Default for CastTextPatcher {
    fn default() -> Self {
        CastTextPatcher {
            arena: StringArena::new(),
            written: FnvHashMap::default(),
            encode: sestring::encode_bilingual
        }
    }
}

impl CastTextPatcher {
    pub fn new() -> CastTextPatcher {
        CastTextPatcher::default()
    }

    pub fn process(&mut self, ui: &dyn AddonUi, snapshot: &CastSnapshot, catalogs: &Catalogs, settings: &PatchSettings) -> PatchOutcome {
        if !ui.is_visible(snapshot.addon) {
            return PatchOutcome::NotVisible;
        }

        let Some(node) = Self::get_text_node(ui, snapshot.addon, snapshot.node_id) else {
            return PatchOutcome::NodeUnavailable;
        };

        let Some(action_id) = snapshot.casting_action() else {
            return PatchOutcome::NotCasting;
        };

        let top = catalogs.top.lookup(action_id);
        let bottom = catalogs.bottom.lookup(action_id);
        if top.is_empty() || bottom.is_empty() {
            return PatchOutcome::MissingTranslation;
        }
        if top == bottom {
            return PatchOutcome::SameName;
        }

        let outcome = if self.is_up_to_date(ui, node, snapshot.node_id, &top, &bottom) {
            PatchOutcome::UpToDate
        }
        else {
            match self.write(ui, node, snapshot.node_id, &top, &bottom) {
                Ok(()) => PatchOutcome::Written,
                Err(e) => {
                    error!("Failed to write cast bar text for node {}: {}", snapshot.node_id, e);
                    return PatchOutcome::WriteFailed;
                }
            }
        };

        Self::fix_layout(ui, node, settings);
        outcome
    }

    fn get_text_node(ui: &dyn AddonUi, addon: AddonHandle, node_id: u32) -> Option<TextNode> {
        if ui.node_count(addon) <= node_id as usize {
            return None;
        }
        ui.get_node(addon, node_id)?.as_text()
    }

    // The host swaps its own string in whenever it refreshes the bar, so a matching cache
    // entry only counts while the node still points at our buffer.
    fn is_up_to_date(&self, ui: &dyn AddonUi, node: TextNode, node_id: u32, top: &str, bottom: &str) -> bool {
        let Some(written) = self.written.get(&node_id) else {
            return false;
        };
        sestring::is_bilingual_text(written, top, bottom) && self.arena.owns(node_id, ui.text_ptr(node))
    }

    fn write(&mut self, ui: &dyn AddonUi, node: TextNode, node_id: u32, top: &str, bottom: &str) -> Result<(), Error> {
        let bytes = (self.encode)(top, bottom, ui.text_encoding())?;
        let size = bytes.len();
        let string = ForeignString::new(bytes).ok_or(Error::AllocationFailed(size))?;

        self.arena.set(node_id, string, |ptr| {
            // SAFETY: the arena keeps the buffer alive until this node is given a new one
            // or the patcher is torn down.
            unsafe { ui.set_text_ptr(node, ptr) }
        });
        self.written.insert(node_id, sestring::bilingual_text(top, bottom));
        debug!("Cast bar node {} set to {:?}", node_id, self.written.get(&node_id));
        Ok(())
    }

    fn fix_layout(ui: &dyn AddonUi, node: TextNode, settings: &PatchSettings) {
        if ui.height(node) < settings.cast_bar_height {
            ui.set_height(node, settings.cast_bar_height);
        }
        if settings.wrap_text {
            ui.set_text_flags(node, TextFlags { multi_line: true, word_wrap: true });
        }
    }

    /// Text last written to `node_id`, if any.
    pub fn written_text(&self, node_id: u32) -> Option<&str> {
        self.written.get(&node_id).map(String::as_str)
    }

    pub fn live_buffers(&self) -> usize {
        self.arena.live_count()
    }

    /// Frees the buffer held for `node_id`. If the node still shows it, the node is first
    /// pointed at an empty string so the host is never left with a freed address.
    pub fn detach(&mut self, ui: &dyn AddonUi, addon: AddonHandle, node_id: u32) -> bool {
        if let Some(node) = Self::get_text_node(ui, addon, node_id) {
            if self.arena.owns(node_id, ui.text_ptr(node)) {
                // SAFETY: static storage
                unsafe { ui.set_text_ptr(node, EMPTY_TEXT.as_ptr()) }
            }
        }
        self.written.remove(&node_id);
        self.arena.release(node_id)
    }

    pub fn release_all(&mut self) {
        self.arena.release_all();
        self.written.clear();
    }
}

impl Drop for CastTextPatcher {
    fn drop(&mut self) {
        self.release_all();
    }
}
