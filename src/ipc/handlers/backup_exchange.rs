use crate::backup;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::handlers::core::reset_view;
use crate::ipc::helpers::{get_required_str, store_mut, store_ref};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn handle_export_bundle(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let out_path = get_required_str(&req.params, "outPath")?.trim().to_string();
    if out_path.is_empty() {
        return Err(HandlerErr::bad_params("missing outPath"));
    }
    let store = store_ref(state)?;

    let export = backup::export_store_bundle(store, &PathBuf::from(&out_path)).map_err(|e| {
        HandlerErr {
            code: "io_failed",
            message: e.to_string(),
            details: Some(json!({ "path": out_path })),
        }
    })?;

    Ok(json!({
        "path": out_path,
        "bundleFormat": export.bundle_format,
        "entryCount": export.entry_count
    }))
}

fn handle_import_bundle(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let in_path = get_required_str(&req.params, "inPath")?.trim().to_string();
    let src = PathBuf::from(&in_path);
    if !src.is_file() {
        return Err(HandlerErr {
            code: "not_found",
            message: "bundle file not found".to_string(),
            details: Some(json!({ "path": in_path })),
        });
    }
    let store = store_mut(state)?;

    let import = backup::import_store_bundle(&src, store).map_err(|e| HandlerErr {
        code: "io_failed",
        message: format!("{e:#}"),
        details: Some(json!({ "path": in_path })),
    })?;

    if state.remote.is_none() {
        reset_view(state);
    }
    Ok(json!({
        "bundleFormatDetected": import.bundle_format_detected,
        "keysRestored": import.keys_restored,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "workspace.exportBundle" => handle_export_bundle(state, req),
        "workspace.importBundle" => handle_import_bundle(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
