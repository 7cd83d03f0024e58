use serde::{Deserialize, Serialize};

/// Top-level views of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum View {
    /// First-run setup and appliance status.
    Setup,
    /// Species seen by the analyzer.
    Script,
    Dashboard,
}

impl View {
    pub const ALL: [View; 3] = [View::Setup, View::Script, View::Dashboard];

    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|view| view.path() == path)
    }

    pub fn path(self) -> &'static str {
        match self {
            View::Setup => "/",
            View::Script => "/scriptView",
            View::Dashboard => "/dashboard",
        }
    }
}
