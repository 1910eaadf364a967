mod test_support;

use serde_json::json;
use test_support::{request_err, request_ok, spawn_sidecar, temp_dir};

fn enrolled(student: &serde_json::Value) -> Vec<serde_json::Value> {
    student["enrolledClasses"].as_array().cloned().unwrap_or_default()
}

#[test]
fn enroll_then_unenroll_updates_student_classes() {
    let workspace = temp_dir("rollcall-enrollment");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "classes.create",
        json!({ "id": 1, "description": "Capstone" }),
    );
    let created = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.create",
        json!({
            "id": "24-00001",
            "firstName": "Ana",
            "lastName": "Reyes",
            "yearLevel": "2nd Year",
            "phone": "09171234567"
        }),
    );
    assert!(enrolled(&created["student"]).is_empty());

    let first = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "students.enroll",
        json!({ "studentId": "24-00001", "classId": 1 }),
    );
    assert_eq!(first["enrolledClasses"], json!([1]));

    // Enrolling twice leaves a single entry.
    let second = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "students.enroll",
        json!({ "studentId": "24-00001", "classId": 1 }),
    );
    assert_eq!(second["enrolledClasses"], first["enrolledClasses"]);

    let roster = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "classes.students",
        json!({ "classId": 1 }),
    );
    assert_eq!(roster["students"].as_array().map(|a| a.len()), Some(1));

    let after = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "students.unenroll",
        json!({ "studentId": "24-00001", "classId": 1 }),
    );
    assert_eq!(after["enrolledClasses"], json!([]));

    let again = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "students.unenroll",
        json!({ "studentId": "24-00001", "classId": 1 }),
    );
    assert_eq!(again["enrolledClasses"], json!([]));

    let listed = request_ok(&mut stdin, &mut reader, "9", "students.list", json!({}));
    assert_eq!(enrolled(&listed["students"][0]), Vec::<serde_json::Value>::new());

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn enrolling_into_unknown_class_is_not_found() {
    let workspace = temp_dir("rollcall-enroll-unknown");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.create",
        json!({
            "id": "24-00001",
            "firstName": "Ana",
            "lastName": "Reyes",
            "yearLevel": "2nd Year",
            "phone": "09171234567"
        }),
    );
    let error = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "students.enroll",
        json!({ "studentId": "24-00001", "classId": 77 }),
    );
    assert_eq!(error["code"].as_str(), Some("not_found"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn invalid_phone_is_rejected_before_any_write() {
    let workspace = temp_dir("rollcall-invalid-phone");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let error = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "students.create",
        json!({
            "id": "24-00001",
            "firstName": "Ana",
            "lastName": "Reyes",
            "yearLevel": "2nd Year",
            "phone": "08123456789"
        }),
    );
    assert_eq!(error["code"].as_str(), Some("validation_failed"));
    assert!(error["message"]
        .as_str()
        .unwrap_or_default()
        .contains("starting with 09"));

    let listed = request_ok(&mut stdin, &mut reader, "3", "students.list", json!({}));
    assert_eq!(listed["students"], json!([]));

    let bad_id = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "students.create",
        json!({
            "id": "2400001",
            "firstName": "Ana",
            "lastName": "Reyes",
            "yearLevel": "2nd Year",
            "phone": "09171234567"
        }),
    );
    assert_eq!(bad_id["code"].as_str(), Some("validation_failed"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn generated_ids_continue_from_the_highest() {
    let workspace = temp_dir("rollcall-generate-id");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let first = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.generateId",
        json!({ "year": "24" }),
    );
    assert_eq!(first["studentId"].as_str(), Some("24-00001"));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.create",
        json!({
            "id": "24-00007",
            "firstName": "Ana",
            "lastName": "Reyes",
            "yearLevel": "4",
            "phone": "09171234567"
        }),
    );
    let next = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "students.generateId",
        json!({ "year": "24" }),
    );
    assert_eq!(next["studentId"].as_str(), Some("24-00008"));

    let search = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "students.search",
        json!({ "term": "reyes" }),
    );
    assert_eq!(search["students"].as_array().map(|a| a.len()), Some(1));
    assert_eq!(search["students"][0]["yearLevel"].as_str(), Some("4th Year"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn zero_padded_class_id_is_a_duplicate() {
    let workspace = temp_dir("rollcall-class-id-padding");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "classes.create",
        json!({ "id": 7, "description": "Capstone" }),
    );
    let dup = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "classes.create",
        json!({ "id": "007", "description": "Capstone again" }),
    );
    assert_eq!(dup["code"].as_str(), Some("validation_failed"));

    let listed = request_ok(&mut stdin, &mut reader, "4", "classes.list", json!({}));
    assert_eq!(listed["classes"].as_array().map(|a| a.len()), Some(1));
    assert_eq!(listed["classes"][0]["id"], json!(7));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
