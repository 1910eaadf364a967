use crate::calendar::DateKey;
use crate::error::RollcallError;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{get_class_id, get_optional_str, get_required_str, store_mut, store_ref};
use crate::ipc::types::{AppState, Request};
use crate::model::{Student, YearLevel};
use crate::roster;
use serde_json::json;

fn year_level_param(params: &serde_json::Value) -> Result<YearLevel, HandlerErr> {
    get_optional_str(params, "yearLevel")
        .as_deref()
        .and_then(YearLevel::parse)
        .ok_or_else(|| {
            RollcallError::Validation("Please fill in all required fields".to_string()).into()
        })
}

fn handle_students_list(state: &mut AppState, _req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let store = store_ref(state)?;
    Ok(json!({ "students": roster::load_students(store)? }))
}

fn handle_students_search(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let term = get_optional_str(&req.params, "term").unwrap_or_default();
    let students = roster::search_students(store_ref(state)?, &term)?;
    Ok(json!({ "term": term, "students": students }))
}

fn handle_students_generate_id(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    // Two-digit enrollment year prefix; defaults to the current year.
    let year = get_optional_str(&req.params, "year")
        .unwrap_or_else(|| DateKey::today().date().format("%y").to_string());
    if year.len() != 2 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return Err(HandlerErr::bad_params("year must be two digits"));
    }
    let id = roster::generate_student_id(store_ref(state)?, &year)?;
    Ok(json!({ "studentId": id }))
}

fn handle_students_create(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let year_level = year_level_param(&req.params)?;
    let store = store_mut(state)?;
    let id = match get_optional_str(&req.params, "id") {
        Some(id) => id,
        None => roster::generate_student_id(&*store, &DateKey::today().date().format("%y").to_string())?,
    };
    let student = Student {
        id,
        first_name: get_optional_str(&req.params, "firstName").unwrap_or_default(),
        last_name: get_optional_str(&req.params, "lastName").unwrap_or_default(),
        year_level,
        phone: get_optional_str(&req.params, "phone").unwrap_or_default(),
        enrolled_classes: Vec::new(),
    };
    let student = roster::create_student(store, student)?;
    log::info!("created student {}", student.id);
    Ok(json!({ "student": student }))
}

fn handle_students_update(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(&req.params, "studentId")?;
    let year_level = year_level_param(&req.params)?;
    let store = store_mut(state)?;
    let student = roster::update_student(
        store,
        &student_id,
        get_optional_str(&req.params, "firstName").unwrap_or_default(),
        get_optional_str(&req.params, "lastName").unwrap_or_default(),
        get_optional_str(&req.params, "phone").unwrap_or_default(),
        year_level,
    )?;
    Ok(json!({ "student": student }))
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(&req.params, "studentId")?;
    let cascade = roster::delete_student(store_mut(state)?, &student_id)?;
    Ok(json!({
        "studentId": student_id,
        "attendancePurged": cascade.attendance_purged,
        "picturesPurged": cascade.pictures_purged,
    }))
}

/// Remote mode hands enrollment to the attendance service; the local
/// roster is left alone.
fn handle_students_enroll(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(&req.params, "studentId")?;
    let class_id = get_class_id(&req.params, "classId")?;
    if let Some(remote) = state.remote.as_ref() {
        let message = remote.enroll(&class_id, &student_id)?;
        return Ok(json!({
            "studentId": student_id,
            "classId": class_id,
            "message": message,
        }));
    }
    let enrolled = roster::enroll(store_mut(state)?, &student_id, &class_id)?;
    Ok(json!({
        "studentId": student_id,
        "classId": class_id,
        "enrolledClasses": enrolled,
    }))
}

fn handle_students_unenroll(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(&req.params, "studentId")?;
    let class_id = get_class_id(&req.params, "classId")?;
    if let Some(remote) = state.remote.as_ref() {
        let message = remote.unenroll(&class_id, &student_id)?;
        return Ok(json!({
            "studentId": student_id,
            "classId": class_id,
            "message": message,
        }));
    }
    let enrolled = roster::unenroll(store_mut(state)?, &student_id, &class_id)?;
    Ok(json!({
        "studentId": student_id,
        "classId": class_id,
        "enrolledClasses": enrolled,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "students.list" => handle_students_list(state, req),
        "students.search" => handle_students_search(state, req),
        "students.generateId" => handle_students_generate_id(state, req),
        "students.create" => handle_students_create(state, req),
        "students.update" => handle_students_update(state, req),
        "students.delete" => handle_students_delete(state, req),
        "students.enroll" => handle_students_enroll(state, req),
        "students.unenroll" => handle_students_unenroll(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
