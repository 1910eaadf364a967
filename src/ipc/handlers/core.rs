use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{get_required_str, with_backend};
use crate::ipc::types::{AppState, Request};
use crate::remote::RemoteBackend;
use crate::render;
use crate::roster;
use crate::store::SqliteStore;
use serde_json::json;
use std::path::{Path, PathBuf};

fn handle_health(state: &mut AppState, _req: &Request) -> Result<serde_json::Value, HandlerErr> {
    Ok(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
        "backend": state.backend_mode(),
        "baseUrl": state.remote.as_ref().map(|r| r.base_url().to_string()),
        "academicYear": state.academic_year,
    }))
}

/// Opens (creating if needed) the workspace store and seeds missing keys.
pub fn open_workspace(state: &mut AppState, path: &Path) -> Result<Vec<&'static str>, HandlerErr> {
    let mut store = SqliteStore::open(path).map_err(|e| HandlerErr {
        code: "db_open_failed",
        message: format!("{e:?}"),
        details: Some(json!({ "path": path.to_string_lossy() })),
    })?;
    let seeded = roster::init_workspace(&mut store)?;
    log::info!(
        "workspace {} opened ({} keys seeded)",
        path.to_string_lossy(),
        seeded.len()
    );
    state.workspace = Some(path.to_path_buf());
    state.store = Some(store);
    Ok(seeded)
}

/// Replaces whatever screen was showing with a fresh overview.
pub fn reset_view(state: &mut AppState) {
    if with_backend(state, |nav, backend| nav.show_overview(backend, None)).is_err() {
        log::debug!("no backend available yet; overview left empty");
    }
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let path = PathBuf::from(get_required_str(&req.params, "path")?);
    let seeded = open_workspace(state, &path)?;
    if state.remote.is_none() {
        reset_view(state);
    }
    Ok(json!({
        "workspacePath": path.to_string_lossy(),
        "seededKeys": seeded,
    }))
}

fn handle_backend_select(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let mode = get_required_str(&req.params, "mode")?;
    match mode.as_str() {
        "local" => {
            state.remote = None;
        }
        "remote" => {
            let base_url = get_required_str(&req.params, "baseUrl")?;
            if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
                return Err(HandlerErr::bad_params("baseUrl must be an http(s) URL"));
            }
            state.remote = Some(RemoteBackend::new(&base_url)?);
        }
        other => {
            return Err(HandlerErr::bad_params(format!(
                "mode must be \"local\" or \"remote\", got {:?}",
                other
            )))
        }
    }
    log::info!("attendance backend set to {}", state.backend_mode());
    reset_view(state);
    Ok(json!({
        "backend": state.backend_mode(),
        "baseUrl": state.remote.as_ref().map(|r| r.base_url().to_string()),
        "screen": render::screen_json(&state.nav),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "health" => handle_health(state, req),
        "workspace.select" => handle_workspace_select(state, req),
        "backend.select" => handle_backend_select(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}

/// Applies the command-line workspace and backend before the first request.
/// Failures are logged; the daemon still starts.
pub fn bootstrap(state: &mut AppState, workspace: Option<&Path>, remote: Option<&str>) {
    if let Some(path) = workspace {
        if let Err(e) = open_workspace(state, path) {
            log::error!("could not open workspace {}: {}", path.to_string_lossy(), e.message);
        }
    }
    if let Some(base_url) = remote {
        match RemoteBackend::new(base_url) {
            Ok(remote) => state.remote = Some(remote),
            Err(e) => log::error!("could not set up remote backend {}: {}", base_url, e),
        }
    }
    reset_view(state);
}
