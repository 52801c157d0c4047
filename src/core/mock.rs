//! In-memory host used by the unit tests.

use std::{ffi::CStr, path::{Path, PathBuf}, sync::{Arc, Mutex, MutexGuard, PoisonError}};

use fnv::FnvHashMap;

use super::{host::*, Error};

struct MockAddon {
    visible: bool,
    node_count: usize,
    nodes: FnvHashMap<u32, UiNode>
}

#[derive(Default)]
pub struct MockTextNode {
    pub ptr: usize,
    pub height: u16,
    pub flags: TextFlags,
    pub writes: usize
}

#[derive(Default)]
struct State {
    addons: FnvHashMap<usize, MockAddon>,
    addon_names: FnvHashMap<String, AddonHandle>,
    text_nodes: FnvHashMap<usize, MockTextNode>,
    target: Option<GameObject>,
    focus_target: Option<GameObject>,
    sheets: FnvHashMap<ClientLanguage, Arc<MockSheet>>,
    listeners: Vec<(AddonEvent, String, AddonHandler)>,
    failing_addon: Option<String>,
    notifications: Vec<Notification>,
    logs: Vec<(log::Level, String)>
}

pub struct MockHost {
    state: Mutex<State>,
    encoding: Mutex<TextEncoding>,
    config_dir: PathBuf,
    assembly_dir: Option<PathBuf>
}

pub struct MockSheet(FnvHashMap<u32, String>);

impl ActionSheet for MockSheet {
    fn action_name(&self, action_id: u32) -> Option<String> {
        self.0.get(&action_id).cloned()
    }
}

impl MockHost {
    pub fn new() -> MockHost {
        MockHost {
            state: Mutex::default(),
            encoding: Mutex::new(TextEncoding::Plain),
            config_dir: PathBuf::new(),
            assembly_dir: None
        }
    }

    pub fn with_dirs(config_dir: &Path, assembly_dir: Option<&Path>) -> MockHost {
        MockHost {
            config_dir: config_dir.to_owned(),
            assembly_dir: assembly_dir.map(Path::to_owned),
            ..MockHost::new()
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn set_encoding(&self, encoding: TextEncoding) {
        *self.encoding.lock().unwrap() = encoding;
    }

    pub fn add_sheet(&self, language: ClientLanguage, rows: &[(u32, &str)]) {
        let rows = rows.iter().map(|(id, name)| (*id, name.to_string())).collect();
        self.state().sheets.insert(language, Arc::new(MockSheet(rows)));
    }

    /// Adds a visible addon with `node_count` nodes; `text_node_id` is a text node with the
    /// given height, everything else is a plain resource node.
    pub fn add_addon(&self, addon: AddonHandle, node_count: usize, text_node_id: u32, height: u16) -> TextNode {
        let text_node = TextNode(addon.0 * 1000 + text_node_id as usize);
        let mut nodes = FnvHashMap::default();
        for id in 0..node_count as u32 {
            nodes.insert(id, UiNode::Res);
        }
        nodes.insert(text_node_id, UiNode::Text(text_node));

        let mut state = self.state();
        state.addons.insert(addon.0, MockAddon { visible: true, node_count, nodes });
        state.text_nodes.insert(text_node.0, MockTextNode { height, ..Default::default() });
        text_node
    }

    pub fn set_addon_name(&self, addon_name: &str, addon: AddonHandle) {
        self.state().addon_names.insert(addon_name.to_owned(), addon);
    }

    pub fn set_node(&self, addon: AddonHandle, node_id: u32, node: UiNode) {
        if let Some(a) = self.state().addons.get_mut(&addon.0) {
            a.nodes.insert(node_id, node);
        }
    }

    pub fn set_visible(&self, addon: AddonHandle, visible: bool) {
        if let Some(a) = self.state().addons.get_mut(&addon.0) {
            a.visible = visible;
        }
    }

    pub fn set_target(&self, target: Option<GameObject>) {
        self.state().target = target;
    }

    pub fn set_focus_target(&self, target: Option<GameObject>) {
        self.state().focus_target = target;
    }

    pub fn fail_registration_for(&self, addon_name: &str) {
        self.state().failing_addon = Some(addon_name.to_owned());
    }

    /// Simulates the host refreshing the node with its own string.
    pub fn host_reset(&self, node: TextNode, height: u16) {
        if let Some(n) = self.state().text_nodes.get_mut(&node.0) {
            n.ptr = 0;
            n.height = height;
        }
    }

    pub fn node_height(&self, node: TextNode) -> u16 {
        self.state().text_nodes.get(&node.0).map(|n| n.height).unwrap_or_default()
    }

    pub fn node_flags(&self, node: TextNode) -> TextFlags {
        self.state().text_nodes.get(&node.0).map(|n| n.flags).unwrap_or_default()
    }

    pub fn node_writes(&self, node: TextNode) -> usize {
        self.state().text_nodes.get(&node.0).map(|n| n.writes).unwrap_or_default()
    }

    pub fn node_ptr(&self, node: TextNode) -> usize {
        self.state().text_nodes.get(&node.0).map(|n| n.ptr).unwrap_or_default()
    }

    /// Bytes currently installed in the node, terminator included.
    ///
    /// Only call while the installing side still owns the buffer.
    pub fn node_bytes(&self, node: TextNode) -> Option<Vec<u8>> {
        let ptr = self.node_ptr(node);
        if ptr == 0 {
            return None;
        }
        let text = unsafe { CStr::from_ptr(ptr as *const _) };
        Some(text.to_bytes_with_nul().to_vec())
    }

    pub fn listener_count(&self) -> usize {
        self.state().listeners.len()
    }

    pub fn listener_names(&self) -> Vec<String> {
        self.state().listeners.iter().map(|(_, name, _)| name.clone()).collect()
    }

    /// Delivers an event the way the host's lifecycle service would.
    pub fn fire(&self, event: AddonEvent, addon_name: &str, addon: AddonHandle) {
        let handlers: Vec<AddonHandler> = self.state().listeners.iter()
            .filter(|(e, name, _)| *e == event && name == addon_name)
            .map(|(_, _, handler)| handler.clone())
            .collect();

        let args = AddonArgs { addon, addon_name: addon_name.to_owned() };
        for handler in handlers {
            handler(event, &args);
        }
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.state().notifications.clone()
    }

    pub fn logs(&self) -> Vec<(log::Level, String)> {
        self.state().logs.clone()
    }
}

impl AddonUi for MockHost {
    fn find_addon(&self, addon_name: &str) -> Option<AddonHandle> {
        self.state().addon_names.get(addon_name).copied()
    }

    fn is_visible(&self, addon: AddonHandle) -> bool {
        self.state().addons.get(&addon.0).is_some_and(|a| a.visible)
    }

    fn node_count(&self, addon: AddonHandle) -> usize {
        self.state().addons.get(&addon.0).map(|a| a.node_count).unwrap_or_default()
    }

    fn get_node(&self, addon: AddonHandle, node_id: u32) -> Option<UiNode> {
        self.state().addons.get(&addon.0)?.nodes.get(&node_id).copied()
    }

    fn text_ptr(&self, node: TextNode) -> *const u8 {
        self.node_ptr(node) as *const u8
    }

    unsafe fn set_text_ptr(&self, node: TextNode, text: *const u8) {
        if let Some(n) = self.state().text_nodes.get_mut(&node.0) {
            n.ptr = text as usize;
            n.writes += 1;
        }
    }

    fn height(&self, node: TextNode) -> u16 {
        self.node_height(node)
    }

    fn set_height(&self, node: TextNode, height: u16) {
        if let Some(n) = self.state().text_nodes.get_mut(&node.0) {
            n.height = height;
        }
    }

    fn set_text_flags(&self, node: TextNode, flags: TextFlags) {
        if let Some(n) = self.state().text_nodes.get_mut(&node.0) {
            n.flags = flags;
        }
    }

    fn text_encoding(&self) -> TextEncoding {
        *self.encoding.lock().unwrap()
    }
}

impl TargetManager for MockHost {
    fn target(&self) -> Option<GameObject> {
        self.state().target
    }

    fn focus_target(&self) -> Option<GameObject> {
        self.state().focus_target
    }
}

impl DataManager for MockHost {
    fn action_sheet(&self, language: ClientLanguage) -> Option<Arc<dyn ActionSheet>> {
        self.state().sheets.get(&language).map(|s| s.clone() as Arc<dyn ActionSheet>)
    }
}

impl AddonLifecycle for MockHost {
    fn register_listener(&self, event: AddonEvent, addon_name: &str, handler: AddonHandler) -> Result<(), Error> {
        let mut state = self.state();
        if state.failing_addon.as_deref() == Some(addon_name) {
            return Err(Error::ListenerRegistration(addon_name.to_owned()));
        }
        state.listeners.push((event, addon_name.to_owned(), handler));
        Ok(())
    }

    fn unregister_listener(&self, handler: &AddonHandler) {
        self.state().listeners.retain(|(_, _, h)| !Arc::ptr_eq(h, handler));
    }
}

impl PluginInterface for MockHost {
    fn config_dir(&self) -> PathBuf {
        self.config_dir.clone()
    }

    fn assembly_dir(&self) -> Option<PathBuf> {
        self.assembly_dir.clone()
    }
}

impl NotificationManager for MockHost {
    fn add_notification(&self, notification: Notification) {
        self.state().notifications.push(notification);
    }
}

impl PluginLog for MockHost {
    fn write(&self, level: log::Level, _target: &str, message: &str) {
        self.state().logs.push((level, message.to_owned()));
    }
}

pub fn services(host: &Arc<MockHost>) -> Services {
    Services {
        plugin_interface: host.clone(),
        data_manager: host.clone(),
        target_manager: host.clone(),
        addon_lifecycle: host.clone(),
        addon_ui: host.clone(),
        notification_manager: host.clone(),
        log: host.clone()
    }
}

/// Serializes tests that install a log sink; the logger is process-wide.
pub fn lock_logger() -> MutexGuard<'static, ()> {
    static LOGGER_LOCK: Mutex<()> = Mutex::new(());
    LOGGER_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn casting(action_id: u32) -> Option<GameObject> {
    Some(GameObject::BattleChara(BattleChara { is_casting: true, cast_action_id: action_id }))
}
