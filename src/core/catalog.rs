use std::{borrow::Cow, fmt::{self, Display}, fs, path::{Path, PathBuf}, sync::Arc};

use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};

use super::{host::{ActionSheet, ClientLanguage, DataManager}, Error};

/// File-backed table for the language the host does not ship.
pub const CHINESE_DATA_FILENAME: &str = "actions_zhtw.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameLanguage {
    English,
    Japanese,
    German,
    French,
    ChineseTraditional
}

impl GameLanguage {
    pub const ALL: [GameLanguage; 5] = [
        GameLanguage::English,
        GameLanguage::Japanese,
        GameLanguage::German,
        GameLanguage::French,
        GameLanguage::ChineseTraditional
    ];

    /// `None` for languages that are not part of the host's data.
    pub fn client_language(self) -> Option<ClientLanguage> {
        match self {
            GameLanguage::English => Some(ClientLanguage::English),
            GameLanguage::Japanese => Some(ClientLanguage::Japanese),
            GameLanguage::German => Some(ClientLanguage::German),
            GameLanguage::French => Some(ClientLanguage::French),
            GameLanguage::ChineseTraditional => None
        }
    }

    pub fn data_filename(self) -> Option<&'static str> {
        match self {
            GameLanguage::ChineseTraditional => Some(CHINESE_DATA_FILENAME),
            _ => None
        }
    }

    pub fn is_file_backed(self) -> bool {
        self.data_filename().is_some()
    }
}

impl Display for GameLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GameLanguage::English => "English",
            GameLanguage::Japanese => "Japanese",
            GameLanguage::German => "German",
            GameLanguage::French => "French",
            GameLanguage::ChineseTraditional => "ChineseTraditional"
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Host,
    File,
    Unavailable
}

enum Source {
    Host(Arc<dyn ActionSheet>),
    File(FnvHashMap<u32, String>),
    Unavailable
}

/// Action id → display name for one language slot.
pub struct Catalog {
    language: GameLanguage,
    source: Source
}

impl Catalog {
    pub fn unavailable(language: GameLanguage) -> Catalog {
        Catalog {
            language,
            source: Source::Unavailable
        }
    }

    pub fn from_sheet(language: GameLanguage, sheet: Arc<dyn ActionSheet>) -> Catalog {
        Catalog {
            language,
            source: Source::Host(sheet)
        }
    }

    pub fn from_entries(language: GameLanguage, entries: FnvHashMap<u32, String>) -> Catalog {
        Catalog {
            language,
            source: Source::File(entries)
        }
    }

    /// Picks the backing source for `language` once. Host languages wrap the host sheet,
    /// the rest read their JSON table from `data_dir`.
    pub fn load(language: GameLanguage, data_manager: &dyn DataManager, data_dir: Option<&Path>) -> Result<Catalog, Error> {
        if let Some(client_language) = language.client_language() {
            let sheet = data_manager.action_sheet(client_language)
                .ok_or(Error::SheetUnavailable(client_language))?;
            return Ok(Self::from_sheet(language, sheet));
        }

        let Some(filename) = language.data_filename() else {
            return Ok(Self::unavailable(language));
        };
        let data_dir = data_dir.ok_or(Error::PluginDirUnknown)?;
        Self::from_file(language, &data_dir.join(filename))
    }

    pub fn from_file(language: GameLanguage, path: &Path) -> Result<Catalog, Error> {
        if fs::metadata(path).is_err() {
            return Err(Error::DataFileNotFound(path.to_owned()));
        }

        let json = fs::read_to_string(path)?;
        let entries = Self::parse_entries(&json)?;
        debug!("Loaded {} entries from '{}'", entries.len(), path.display());
        Ok(Self::from_entries(language, entries))
    }

    /// Parses `{"<decimal id>": "<name>", ...}`.
    pub fn parse_entries(json: &str) -> Result<FnvHashMap<u32, String>, Error> {
        Ok(serde_json::from_str(json.trim_start_matches('\u{feff}'))?)
    }

    /// Empty string means "no translation"; never fails.
    pub fn lookup(&self, action_id: u32) -> Cow<'_, str> {
        match &self.source {
            Source::Host(sheet) => sheet.action_name(action_id).map(Cow::Owned).unwrap_or_default(),
            Source::File(entries) => entries.get(&action_id).map(|s| Cow::Borrowed(s.as_str())).unwrap_or_default(),
            Source::Unavailable => Cow::Borrowed("")
        }
    }

    pub fn language(&self) -> GameLanguage {
        self.language
    }

    pub fn source_kind(&self) -> SourceKind {
        match self.source {
            Source::Host(_) => SourceKind::Host,
            Source::File(_) => SourceKind::File,
            Source::Unavailable => SourceKind::Unavailable
        }
    }

    pub fn is_available(&self) -> bool {
        self.source_kind() != SourceKind::Unavailable
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Top,
    Bottom
}

impl Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Slot::Top => "top",
            Slot::Bottom => "bottom"
        })
    }
}

/// The pair the patcher reads from. Replaced as a whole, never mutated.
#[derive(Clone)]
pub struct Catalogs {
    pub top: Arc<Catalog>,
    pub bottom: Arc<Catalog>
}

impl Catalogs {
    pub fn unavailable(top: GameLanguage, bottom: GameLanguage) -> Catalogs {
        Catalogs {
            top: Arc::new(Catalog::unavailable(top)),
            bottom: Arc::new(Catalog::unavailable(bottom))
        }
    }

    pub fn get(&self, slot: Slot) -> &Arc<Catalog> {
        match slot {
            Slot::Top => &self.top,
            Slot::Bottom => &self.bottom
        }
    }

    /// Copy of `self` with one slot swapped out.
    pub fn with(&self, slot: Slot, catalog: Arc<Catalog>) -> Catalogs {
        let mut catalogs = self.clone();
        match slot {
            Slot::Top => catalogs.top = catalog,
            Slot::Bottom => catalogs.bottom = catalog
        }
        catalogs
    }

    pub fn has_file_data(&self) -> bool {
        self.top.source_kind() == SourceKind::File || self.bottom.source_kind() == SourceKind::File
    }
}

pub fn data_file_path(data_dir: Option<&Path>, language: GameLanguage) -> Option<PathBuf> {
    let filename = language.data_filename()?;
    Some(match data_dir {
        Some(dir) => dir.join(filename),
        None => PathBuf::from(filename)
    })
}
