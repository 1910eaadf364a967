use crate::backend::{AttendanceBackend, LocalBackend};
use crate::calendar::DateKey;
use crate::ipc::error::HandlerErr;
use crate::ipc::types::AppState;
use crate::model::ClassId;
use crate::navigation::Navigator;
use crate::store::SqliteStore;

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_optional_str(params: &serde_json::Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Class ids arrive as numbers from the attendance service and as strings
/// from older stores; both are accepted.
pub fn get_class_id(params: &serde_json::Value, key: &str) -> Result<ClassId, HandlerErr> {
    match params.get(key) {
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .map(ClassId::from)
            .ok_or_else(|| HandlerErr::bad_params(format!("{} must be an integer", key))),
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Ok(ClassId::new(s.trim())),
        _ => Err(HandlerErr::bad_params(format!("missing {}", key))),
    }
}

pub fn get_optional_date(params: &serde_json::Value, key: &str) -> Result<Option<DateKey>, HandlerErr> {
    let Some(raw) = get_optional_str(params, key) else {
        return Ok(None);
    };
    raw.parse::<DateKey>()
        .map(Some)
        .map_err(|e| HandlerErr::bad_params(format!("{}: {}", key, e)))
}

pub fn get_required_date(params: &serde_json::Value, key: &str) -> Result<DateKey, HandlerErr> {
    get_optional_date(params, key)?.ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn store_ref(state: &AppState) -> Result<&SqliteStore, HandlerErr> {
    state.store.as_ref().ok_or_else(HandlerErr::no_workspace)
}

pub fn store_mut(state: &mut AppState) -> Result<&mut SqliteStore, HandlerErr> {
    state.store.as_mut().ok_or_else(HandlerErr::no_workspace)
}

/// Runs `f` against the navigator and whichever backend is active. Local
/// mode needs an open workspace; remote mode does not.
pub fn with_backend<T>(
    state: &mut AppState,
    f: impl FnOnce(&mut Navigator, &mut dyn AttendanceBackend) -> T,
) -> Result<T, HandlerErr> {
    let AppState {
        store,
        remote,
        nav,
        academic_year,
        ..
    } = state;
    if let Some(remote) = remote.as_mut() {
        return Ok(f(nav, remote));
    }
    let Some(store) = store.as_mut() else {
        return Err(HandlerErr::no_workspace());
    };
    let mut backend = LocalBackend::new(store, *academic_year);
    Ok(f(nav, &mut backend))
}
