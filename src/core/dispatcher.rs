use super::{
    host::{AddonArgs, AddonEvent, AddonHandler, AddonLifecycle, TargetManager},
    patcher::CastSnapshot,
    Error
};

pub const ADDON_TARGET_INFO: &str = "_TargetInfo";
pub const ADDON_TARGET_INFO_CAST_BAR: &str = "_TargetInfoCastBar";
pub const ADDON_FOCUS_TARGET_INFO: &str = "_FocusTargetInfo";

/// Cast bars are patched after the game has drawn them for the frame.
pub const HOOK_EVENT: AddonEvent = AddonEvent::PostDraw;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSource {
    Target,
    FocusTarget
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub addon_name: &'static str,
    pub node_id: u32,
    pub source: TargetSource
}

// Node ids of the cast text in each addon, as laid out by the current game version.
pub const ROUTES: [Route; 3] = [
    Route { addon_name: ADDON_TARGET_INFO, node_id: 12, source: TargetSource::Target },
    Route { addon_name: ADDON_TARGET_INFO_CAST_BAR, node_id: 4, source: TargetSource::Target },
    Route { addon_name: ADDON_FOCUS_TARGET_INFO, node_id: 5, source: TargetSource::FocusTarget }
];

pub fn route(addon_name: &str) -> Option<&'static Route> {
    ROUTES.iter().find(|r| r.addon_name == addon_name)
}

/// Registers `handler` for every routed addon.
///
/// Keeps going after a failure so that as many bars as possible work; the first error is
/// returned. [`unregister`] cleans up either way.
pub fn register(lifecycle: &dyn AddonLifecycle, handler: &AddonHandler) -> Result<(), Error> {
    let mut first_error = None;
    for route in &ROUTES {
        if let Err(e) = lifecycle.register_listener(HOOK_EVENT, route.addon_name, handler.clone()) {
            error!("{}", e);
            first_error.get_or_insert(e);
        }
        else {
            debug!("Listening to {}", route.addon_name);
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(())
    }
}

pub fn unregister(lifecycle: &dyn AddonLifecycle, handler: &AddonHandler) {
    lifecycle.unregister_listener(handler);
}

/// Resolves an event into the snapshot the patcher works on. Unknown addons yield `None`.
pub fn snapshot(args: &AddonArgs, targets: &dyn TargetManager) -> Option<CastSnapshot> {
    let route = route(&args.addon_name)?;
    let caster = match route.source {
        TargetSource::Target => targets.target(),
        TargetSource::FocusTarget => targets.focus_target()
    };

    Some(CastSnapshot {
        addon: args.addon,
        node_id: route.node_id,
        caster
    })
}
