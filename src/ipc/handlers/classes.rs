use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{get_class_id, get_optional_str, store_mut, store_ref};
use crate::ipc::types::{AppState, Request};
use crate::model::{Class, ClassId, UNASSIGNED};
use crate::roster;
use serde_json::json;

fn text_param(params: &serde_json::Value, key: &str) -> String {
    get_optional_str(params, key).unwrap_or_default()
}

fn class_from_params(params: &serde_json::Value, id: ClassId) -> Class {
    Class {
        id,
        course_code: text_param(params, "courseCode"),
        class_code: text_param(params, "classCode"),
        description: text_param(params, "description"),
        room_number: text_param(params, "roomNumber"),
        schedule: text_param(params, "schedule"),
        instructor: get_optional_str(params, "instructor").unwrap_or_else(|| UNASSIGNED.to_string()),
    }
}

fn handle_courses_list(state: &mut AppState, _req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let courses = roster::load_courses(store_ref(state)?)?;
    Ok(json!({ "courses": courses }))
}

fn handle_classes_list(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let store = store_ref(state)?;
    // Instructor-scoped listing: only the classes assigned to that name.
    let instructor = get_optional_str(&req.params, "instructor");
    let students = roster::load_students(store)?;
    let classes: Vec<serde_json::Value> = roster::load_classes(store)?
        .into_iter()
        .filter(|c| instructor.as_deref().map_or(true, |name| c.instructor == name))
        .map(|c| {
            let enrolled = students.iter().filter(|s| s.is_enrolled(&c.id)).count();
            let mut v = json!(c);
            v["enrolledCount"] = json!(enrolled);
            v
        })
        .collect();
    Ok(json!({ "classes": classes }))
}

fn handle_classes_create(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let store = store_mut(state)?;
    let id = match req.params.get("id") {
        Some(v) if !v.is_null() => get_class_id(&req.params, "id")?,
        _ => roster::next_class_id(&roster::load_classes(&*store)?),
    };
    let class = roster::create_class(store, class_from_params(&req.params, id))?;
    log::info!("created class {} ({})", class.id, class.description);
    Ok(json!({ "class": class }))
}

fn handle_classes_update(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_class_id(&req.params, "classId")?;
    let store = store_mut(state)?;
    let class = roster::update_class(store, class_from_params(&req.params, class_id))?;
    Ok(json!({ "class": class }))
}

fn handle_classes_delete(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_class_id(&req.params, "classId")?;
    let store = store_mut(state)?;
    let cascade = roster::delete_class(store, &class_id)?;
    Ok(json!({
        "classId": class_id,
        "studentsUnenrolled": cascade.students_unenrolled,
        "attendancePurged": cascade.attendance_purged,
        "instructorAttendancePurged": cascade.instructor_attendance_purged,
    }))
}

fn handle_classes_students(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_class_id(&req.params, "classId")?;
    let store = store_ref(state)?;
    let class = roster::find_class(store, &class_id)?;
    let students = roster::enrolled_students(store, &class_id)?;
    Ok(json!({
        "classId": class.id,
        "description": class.description,
        "students": students,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "courses.list" => handle_courses_list(state, req),
        "classes.list" => handle_classes_list(state, req),
        "classes.create" => handle_classes_create(state, req),
        "classes.update" => handle_classes_update(state, req),
        "classes.delete" => handle_classes_delete(state, req),
        "classes.students" => handle_classes_students(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
