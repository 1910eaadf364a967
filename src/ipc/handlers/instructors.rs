use crate::instructor_attendance;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{
    get_class_id, get_optional_date, get_optional_str, get_required_date, get_required_str,
    store_mut, store_ref,
};
use crate::ipc::types::{AppState, Request};
use crate::model::Instructor;
use crate::render::present_summary;
use crate::roster;
use serde_json::json;

fn instructor_from_params(params: &serde_json::Value, id: String) -> Instructor {
    Instructor {
        id,
        first_name: get_optional_str(params, "firstName").unwrap_or_default(),
        last_name: get_optional_str(params, "lastName").unwrap_or_default(),
        email: get_optional_str(params, "email").unwrap_or_default(),
        phone: get_optional_str(params, "phone").unwrap_or_default(),
        department: get_optional_str(params, "department"),
    }
}

fn handle_instructors_list(state: &mut AppState, _req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let store = store_ref(state)?;
    Ok(json!({ "instructors": roster::load_instructors(store)? }))
}

fn handle_instructors_generate_id(state: &mut AppState, _req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let id = roster::generate_instructor_id(store_ref(state)?)?;
    Ok(json!({ "instructorId": id }))
}

fn handle_instructors_create(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let store = store_mut(state)?;
    let id = match get_optional_str(&req.params, "id") {
        Some(id) => id,
        None => roster::generate_instructor_id(&*store)?,
    };
    let instructor = roster::create_instructor(store, instructor_from_params(&req.params, id))?;
    log::info!("created instructor {}", instructor.id);
    Ok(json!({ "instructor": instructor }))
}

fn handle_instructors_update(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let id = get_required_str(&req.params, "instructorId")?;
    let instructor =
        roster::update_instructor(store_mut(state)?, instructor_from_params(&req.params, id))?;
    Ok(json!({ "instructor": instructor }))
}

fn handle_instructors_delete(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let id = get_required_str(&req.params, "instructorId")?;
    let cascade = roster::delete_instructor(store_mut(state)?, &id)?;
    Ok(json!({
        "instructorId": id,
        "classesUnassigned": cascade.classes_unassigned,
    }))
}

/// Instructor overview: each assigned class and its status on one date.
fn handle_instructors_attendance(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let date = get_optional_date(&req.params, "date")?.unwrap_or_else(|| state.nav.date());
    let rows: Vec<serde_json::Value> = instructor_attendance::overview(store_ref(state)?, date)?
        .into_iter()
        .map(|r| {
            let mut v = json!(r);
            v["actionLabel"] = json!(r.status.action_label());
            v
        })
        .collect();
    Ok(json!({ "date": date, "classes": rows }))
}

fn handle_instructors_class_attendance(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_class_id(&req.params, "classId")?;
    let record =
        instructor_attendance::class_record(store_ref(state)?, &class_id, state.academic_year)?;
    let rows: Vec<serde_json::Value> = record
        .days
        .iter()
        .map(|d| {
            json!({
                "date": d.date,
                "status": d.status,
                "actionLabel": d.status.action_label(),
            })
        })
        .collect();
    Ok(json!({
        "classId": record.class_id,
        "classCode": record.class_code,
        "description": record.description,
        "instructor": record.instructor,
        "rows": rows,
        "presentCount": record.tally.present_count,
        "absentCount": record.tally.absent_count,
        "presentSummary": present_summary(record.tally.present_count, record.days.len()),
    }))
}

fn handle_instructors_detail(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let id = get_required_str(&req.params, "instructorId")?;
    let record =
        instructor_attendance::instructor_record(store_ref(state)?, &id, state.academic_year)?;
    let classes: Vec<serde_json::Value> = record
        .classes
        .iter()
        .map(|c| {
            let mut v = json!(c);
            v["attendanceSummary"] = json!(present_summary(c.present_count, c.total_days));
            v
        })
        .collect();
    Ok(json!({
        "instructorId": record.instructor_id,
        "name": record.name,
        "classes": classes,
    }))
}

fn handle_instructors_toggle_attendance(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_class_id(&req.params, "classId")?;
    let date = get_required_date(&req.params, "date")?;
    let academic_year = state.academic_year;
    let store = store_mut(state)?;
    let outcome = instructor_attendance::toggle_status(store, &class_id, &date)?;
    let record = instructor_attendance::class_record(&*store, &class_id, academic_year)?;
    Ok(json!({
        "classId": class_id,
        "instructor": outcome.instructor,
        "date": date,
        "status": outcome.status,
        "actionLabel": outcome.status.action_label(),
        "attendanceSummary": present_summary(record.tally.present_count, record.days.len()),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "instructors.list" => handle_instructors_list(state, req),
        "instructors.generateId" => handle_instructors_generate_id(state, req),
        "instructors.create" => handle_instructors_create(state, req),
        "instructors.update" => handle_instructors_update(state, req),
        "instructors.delete" => handle_instructors_delete(state, req),
        "instructors.attendance" => handle_instructors_attendance(state, req),
        "instructors.classAttendance" => handle_instructors_class_attendance(state, req),
        "instructors.detail" => handle_instructors_detail(state, req),
        "instructors.toggleAttendance" => handle_instructors_toggle_attendance(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
