use std::path::PathBuf;

use crate::calendar::DateKey;
use crate::navigation::Navigator;
use crate::remote::RemoteBackend;
use crate::store::SqliteStore;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub store: Option<SqliteStore>,
    /// Set while the remote attendance service backs the screens.
    pub remote: Option<RemoteBackend>,
    pub nav: Navigator,
    pub academic_year: i32,
}

impl AppState {
    pub fn new(academic_year: i32) -> Self {
        AppState {
            workspace: None,
            store: None,
            remote: None,
            nav: Navigator::new(DateKey::today()),
            academic_year,
        }
    }

    pub fn backend_mode(&self) -> &'static str {
        if self.remote.is_some() {
            "remote"
        } else {
            "local"
        }
    }
}
