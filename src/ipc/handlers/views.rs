use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{get_class_id, get_optional_date, get_optional_str, get_required_str, with_backend};
use crate::ipc::types::{AppState, Request};
use crate::render;
use serde_json::json;

fn screen(state: &AppState) -> serde_json::Value {
    render::screen_json(&state.nav)
}

fn handle_view_current(state: &mut AppState, _req: &Request) -> Result<serde_json::Value, HandlerErr> {
    Ok(screen(state))
}

fn handle_view_overview(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let date = get_optional_date(&req.params, "date")?;
    with_backend(state, |nav, backend| nav.show_overview(backend, date))?;
    Ok(screen(state))
}

fn handle_view_select_class(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_class_id(&req.params, "classId")?;
    let date = get_optional_date(&req.params, "date")?;
    with_backend(state, |nav, backend| nav.select_class(backend, &class_id, date))??;
    Ok(screen(state))
}

fn handle_view_select_student(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(&req.params, "studentId")?;
    with_backend(state, |nav, backend| nav.select_student(backend, &student_id))??;
    Ok(screen(state))
}

fn handle_view_back(state: &mut AppState, _req: &Request) -> Result<serde_json::Value, HandlerErr> {
    with_backend(state, |nav, backend| nav.back(backend))?;
    Ok(screen(state))
}

/// A failed toggle reports the error and carries the unchanged screen.
fn handle_view_toggle(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_optional_str(&req.params, "studentId");
    let date = get_optional_date(&req.params, "date")?;
    let outcome = with_backend(state, |nav, backend| {
        nav.toggle(backend, student_id.as_deref(), date)
    })?;
    match outcome {
        Ok(status) => Ok(json!({
            "newStatus": status,
            "screen": screen(state),
        })),
        Err(e) => Err(HandlerErr::from(e).with_details(json!({ "screen": screen(state) }))),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "view.current" => handle_view_current(state, req),
        "view.overview" => handle_view_overview(state, req),
        "view.selectClass" => handle_view_select_class(state, req),
        "view.selectStudent" => handle_view_select_student(state, req),
        "view.back" => handle_view_back(state, req),
        "view.toggle" => handle_view_toggle(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
