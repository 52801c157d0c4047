//! Interfaces of the host runtime that the plugin consumes.
//!
//! Nothing in here is implemented by the plugin itself. The host hands out
//! implementations through [`Services`] when it loads us.

use std::{fmt::{self, Display}, path::PathBuf, sync::Arc};

use super::Error;

/// Address of a live UI container (addon). Only valid inside the callback that delivered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddonHandle(pub usize);

/// Address of a text node inside an addon. Same lifetime rules as [`AddonHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextNode(pub usize);

/// Closed set of node kinds the UI tree can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiNode {
    Res,
    Image,
    Text(TextNode),
    NineGrid,
    Counter,
    Collision,
    Component
}

impl UiNode {
    pub fn as_text(self) -> Option<TextNode> {
        match self {
            UiNode::Text(node) => Some(node),
            _ => None
        }
    }
}

/// How the host expects node text to be encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// UTF-8 with a literal `\n` line break.
    Plain,
    /// UTF-8 text payloads with the game's new-line macro between them.
    #[default]
    SeString
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextFlags {
    pub multi_line: bool,
    pub word_wrap: bool
}

pub trait AddonUi: Send + Sync {
    /// Looks up a live addon by name outside of an event callback.
    fn find_addon(&self, addon_name: &str) -> Option<AddonHandle>;
    fn is_visible(&self, addon: AddonHandle) -> bool;
    fn node_count(&self, addon: AddonHandle) -> usize;
    fn get_node(&self, addon: AddonHandle, node_id: u32) -> Option<UiNode>;

    fn text_ptr(&self, node: TextNode) -> *const u8;

    /// Points the node at a new NUL-terminated string.
    ///
    /// # Safety
    /// `text` must stay valid until the node is pointed somewhere else; the host keeps
    /// re-reading it on every draw.
    unsafe fn set_text_ptr(&self, node: TextNode, text: *const u8);

    fn height(&self, node: TextNode) -> u16;
    fn set_height(&self, node: TextNode, height: u16);
    fn set_text_flags(&self, node: TextNode, flags: TextFlags);

    fn text_encoding(&self) -> TextEncoding {
        TextEncoding::SeString
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BattleChara {
    pub is_casting: bool,
    pub cast_action_id: u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameObject {
    BattleChara(BattleChara),
    Other
}

pub trait TargetManager: Send + Sync {
    fn target(&self) -> Option<GameObject>;
    fn focus_target(&self) -> Option<GameObject>;
}

/// Languages the host ships static data for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientLanguage {
    Japanese,
    English,
    German,
    French
}

impl Display for ClientLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ClientLanguage::Japanese => "Japanese",
            ClientLanguage::English => "English",
            ClientLanguage::German => "German",
            ClientLanguage::French => "French"
        })
    }
}

/// One language's view of the host's action table.
pub trait ActionSheet: Send + Sync {
    /// `None` when the row does not exist.
    fn action_name(&self, action_id: u32) -> Option<String>;
}

pub trait DataManager: Send + Sync {
    fn action_sheet(&self, language: ClientLanguage) -> Option<Arc<dyn ActionSheet>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddonEvent {
    PreDraw,
    PostDraw
}

#[derive(Debug, Clone)]
pub struct AddonArgs {
    pub addon: AddonHandle,
    pub addon_name: String
}

pub type AddonHandler = Arc<dyn Fn(AddonEvent, &AddonArgs) + Send + Sync>;

pub trait AddonLifecycle: Send + Sync {
    fn register_listener(&self, event: AddonEvent, addon_name: &str, handler: AddonHandler) -> Result<(), Error>;

    /// Removes every registration made with this handler. Unknown handlers are ignored.
    fn unregister_listener(&self, handler: &AddonHandler);
}

pub trait PluginInterface: Send + Sync {
    /// Directory the host persists plugin configuration in.
    fn config_dir(&self) -> PathBuf;
    /// Directory the plugin binary was loaded from, if the host knows it.
    fn assembly_dir(&self) -> Option<PathBuf>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Info,
    Warning,
    Error
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub content: String,
    pub kind: NotificationKind
}

pub trait NotificationManager: Send + Sync {
    fn add_notification(&self, notification: Notification);
}

pub trait PluginLog: Send + Sync {
    fn write(&self, level: log::Level, target: &str, message: &str);
}

/// Everything the host injects on load.
#[derive(Clone)]
pub struct Services {
    pub plugin_interface: Arc<dyn PluginInterface>,
    pub data_manager: Arc<dyn DataManager>,
    pub target_manager: Arc<dyn TargetManager>,
    pub addon_lifecycle: Arc<dyn AddonLifecycle>,
    pub addon_ui: Arc<dyn AddonUi>,
    pub notification_manager: Arc<dyn NotificationManager>,
    pub log: Arc<dyn PluginLog>
}
