use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Query parameter key to its new value; `None` removes the parameter.
pub type ToggleTarget = BTreeMap<String, Option<String>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidebarItem {
    pub label: String,
    pub selected: bool,
    pub total: u64,
    pub toggle_target: ToggleTarget,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidebarSection {
    pub title: String,
    pub items: Vec<SidebarItem>,
    pub collapsible: bool,
    pub collapsed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SidebarMenu {
    pub sections: Vec<SidebarSection>,
    pub open: bool,
}
