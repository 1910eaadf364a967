use crate::attendance;
use crate::calendar;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{get_class_id, get_required_date, get_required_str, store_mut, store_ref};
use crate::ipc::types::{AppState, Request};
use crate::roster;
use serde_json::json;

fn handle_attendance_status(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_class_id(&req.params, "classId")?;
    let student_id = get_required_str(&req.params, "studentId")?;
    let date = get_required_date(&req.params, "date")?;
    let status = attendance::status_of(store_ref(state)?, &class_id, &student_id, &date)?;
    Ok(json!({
        "classId": class_id,
        "studentId": student_id,
        "date": date,
        "status": status,
    }))
}

/// Flips one stored triple. The student must be enrolled in the class.
fn handle_attendance_toggle(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_class_id(&req.params, "classId")?;
    let student_id = get_required_str(&req.params, "studentId")?;
    let date = get_required_date(&req.params, "date")?;
    let store = store_mut(state)?;

    roster::enrolled_student(&*store, &class_id, &student_id)?;
    let status = attendance::toggle_status(store, &class_id, &student_id, &date)?;
    Ok(json!({
        "classId": class_id,
        "studentId": student_id,
        "date": date,
        "status": status,
        "actionLabel": status.action_label(),
    }))
}

fn handle_attendance_school_days(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let year = match req.params.get("year") {
        None | Some(serde_json::Value::Null) => state.academic_year,
        Some(v) => v
            .as_i64()
            .and_then(|y| i32::try_from(y).ok())
            .ok_or_else(|| HandlerErr::bad_params("year must be an integer"))?,
    };
    let days = calendar::school_days(year);
    Ok(json!({ "year": year, "days": days }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "attendance.status" => handle_attendance_status(state, req),
        "attendance.toggle" => handle_attendance_toggle(state, req),
        "attendance.schoolDays" => handle_attendance_school_days(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
