use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, str::FromStr};
use tracing::debug;

use crate::{
    aggregate::{AggregateOptions, Aggregated, Aggregator},
    document::ContentStore,
    error::ShelfError,
    folder::{find_node, folder_path, FolderProvider},
    ids::FolderId,
};

pub mod db;

/// A saved configuration describing how to render a set of folders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Library {
    pub id: i64,
    pub title: String,
    pub settings: LibrarySettings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of create and update requests.
#[derive(Debug, Clone, Deserialize)]
pub struct LibraryInput {
    pub title: String,
    #[serde(default)]
    pub settings: LibrarySettings,
}

impl LibraryInput {
    pub fn validate(mut self) -> Result<Self, ShelfError> {
        self.title = self.title.trim().to_string();
        if self.title.is_empty() {
            return Err(ShelfError::InvalidInput("library title is empty".to_string()));
        }
        if let Some(id) = self.settings.folders.iter().find(|id| **id <= 0) {
            return Err(ShelfError::InvalidInput(format!("invalid folder id {id}")));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Selected folders, rendered in this order
    pub folders: Vec<FolderId>,

    #[serde(flatten)]
    pub options: AggregateOptions,

    pub display: DisplayOptions,

    pub accordion: AccordionStates,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Grid,
    #[default]
    List,
    Table,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayOptions {
    pub layout: Layout,
    pub columns: u8,
    pub show_title: bool,
    pub show_size: bool,
    pub show_date: bool,
    pub show_thumbnail: bool,
    pub show_download: bool,
}

impl DisplayOptions {
    pub const MAX_COLUMNS: u8 = 6;

    pub fn clamped(mut self) -> Self {
        self.columns = self.columns.clamp(1, Self::MAX_COLUMNS);
        self
    }
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            layout: Layout::default(),
            columns: 3,
            show_title: true,
            show_size: true,
            show_date: false,
            show_thumbnail: true,
            show_download: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccordionState {
    Open,
    Closed,
}

impl FromStr for AccordionState {
    type Err = ShelfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" | "1" | "true" => Ok(Self::Open),
            "closed" | "close" | "0" | "false" => Ok(Self::Closed),
            other => Err(ShelfError::InvalidInput(format!(
                "unknown accordion state '{other}'"
            ))),
        }
    }
}

impl AccordionState {
    fn as_str(&self) -> &'static str {
        match self {
            AccordionState::Open => "open",
            AccordionState::Closed => "closed",
        }
    }
}

/// Per folder open/closed flags for accordion layouts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccordionStates {
    /// State of folders without an explicit entry
    pub default_open: bool,
    pub folders: BTreeMap<FolderId, AccordionState>,
}

impl AccordionStates {
    /// Read the `"12:open,13:closed"` token form. Malformed tokens are skipped.
    pub fn parse_tokens(input: &str, default_open: bool) -> Self {
        let mut folders = BTreeMap::new();

        for token in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let Some((id, state)) = token.split_once(':') else {
                debug!("Skipping accordion token '{token}'");
                continue;
            };

            let (Ok(id), Ok(state)) = (
                id.trim().parse::<FolderId>(),
                state.parse::<AccordionState>(),
            ) else {
                debug!("Skipping accordion token '{token}'");
                continue;
            };

            folders.insert(id, state);
        }

        Self {
            default_open,
            folders,
        }
    }

    pub fn to_tokens(&self) -> String {
        self.folders
            .iter()
            .map(|(id, state)| format!("{id}:{}", state.as_str()))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn state_of(&self, id: FolderId) -> AccordionState {
        match self.folders.get(&id) {
            Some(state) => *state,
            None if self.default_open => AccordionState::Open,
            None => AccordionState::Closed,
        }
    }

    pub fn set(&mut self, id: FolderId, state: AccordionState) {
        self.folders.insert(id, state);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderedLibrary {
    pub id: i64,
    pub title: String,
    pub display: DisplayOptions,
    pub sections: Vec<LibrarySection>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LibrarySection {
    pub folder_id: FolderId,
    pub folder_name: String,
    pub folder_path: String,
    pub accordion: AccordionState,
    pub content: Aggregated,
}

/// Resolve every selected folder of `library` with the library's own options.
pub async fn render_library<P, S>(
    aggregator: &Aggregator<'_, P, S>,
    library: Library,
) -> Result<RenderedLibrary, ShelfError>
where
    P: FolderProvider,
    S: ContentStore,
{
    let Library {
        id,
        title,
        settings,
        ..
    } = library;

    let LibrarySettings {
        folders,
        options,
        display,
        accordion,
    } = settings;

    let tree = aggregator.folder_tree().await?;
    let mut sections = Vec::with_capacity(folders.len());

    for folder_id in folders {
        let Some(node) = find_node(&tree, folder_id) else {
            debug!("Library {id}: folder {folder_id} no longer exists");
            continue;
        };

        let content = aggregator
            .documents_recursive_in(&tree, folder_id, &options)
            .await?;

        debug!(
            "Library {id}: folder {folder_id} resolved {} documents",
            content.document_count()
        );

        sections.push(LibrarySection {
            folder_id,
            folder_name: node.folder.name.clone(),
            folder_path: folder_path(&tree, folder_id),
            accordion: accordion.state_of(folder_id),
            content,
        });
    }

    Ok(RenderedLibrary {
        id,
        title,
        display: display.clamped(),
        sections,
    })
}
