use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetDefinition {
    pub field: String,
    pub name: String,
    #[serde(default)]
    pub hidden: bool,
}

impl FacetDefinition {
    pub fn new(field: impl Into<String>, name: impl Into<String>, hidden: bool) -> Self {
        Self {
            field: field.into(),
            name: name.into(),
            hidden,
        }
    }
}

/// Stored view configuration loaded from one of the reserved view collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewDefinition {
    pub name: String,
    #[serde(default)]
    pub facets: Vec<FacetDefinition>,
}

/// The two faceted-navigation modes. Each owns a URL root and a reserved
/// collection holding its view definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    Directory,
    Discovery,
}

impl ViewMode {
    pub const ALL: [ViewMode; 2] = [ViewMode::Directory, ViewMode::Discovery];

    pub fn collection_name(self) -> &'static str {
        match self {
            ViewMode::Directory => "directoryViews",
            ViewMode::Discovery => "discoveryViews",
        }
    }

    pub fn root(self) -> &'static str {
        match self {
            ViewMode::Directory => "/directory",
            ViewMode::Discovery => "/discovery",
        }
    }

    /// First mode whose root prefixes `path`.
    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| path.starts_with(mode.root()))
    }

    pub fn from_collection_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.collection_name() == name)
    }
}
