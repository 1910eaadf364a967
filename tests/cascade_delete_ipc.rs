mod test_support;

use rusqlite::OptionalExtension;
use serde_json::json;
use std::path::Path;
use test_support::{request_err, request_ok, seed_class_with_two_students, spawn_sidecar, temp_dir};

fn read_store_key(workspace: &Path, key: &str) -> serde_json::Value {
    let conn = rusqlite::Connection::open(workspace.join("rollcall.sqlite3")).expect("open db");
    let raw: Option<String> = conn
        .query_row("SELECT value FROM kv_store WHERE key = ?", [key], |r| r.get(0))
        .optional()
        .expect("query kv_store");
    serde_json::from_str(&raw.expect("key present")).expect("stored json")
}

#[test]
fn deleting_a_student_purges_their_attendance_everywhere() {
    let workspace = temp_dir("rollcall-cascade-student");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    seed_class_with_two_students(&mut stdin, &mut reader);
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "classes.create",
        json!({ "id": 2, "description": "Systems Administration" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.enroll",
        json!({ "studentId": "24-00001", "classId": 2 }),
    );
    for (id, class_id) in [("4", 1), ("5", 2)] {
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            id,
            "attendance.toggle",
            json!({ "classId": class_id, "studentId": "24-00001", "date": "March 5 2025" }),
        );
    }
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "attendance.toggle",
        json!({ "classId": 1, "studentId": "24-00002", "date": "March 5 2025" }),
    );
    assert_eq!(
        read_store_key(&workspace, "studentAttendance")["1"]["24-00001"]["March 5 2025"],
        json!("Absent")
    );

    let deleted = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "students.delete",
        json!({ "studentId": "24-00001" }),
    );
    assert_eq!(deleted["attendancePurged"].as_bool(), Some(true));

    let book = read_store_key(&workspace, "studentAttendance");
    let serialized = book.to_string();
    assert!(!serialized.contains("24-00001"), "left behind: {}", serialized);
    assert_eq!(book["1"]["24-00002"]["March 5 2025"], json!("Absent"));

    let students = read_store_key(&workspace, "students");
    assert_eq!(students.as_array().map(|a| a.len()), Some(1));

    let again = request_err(
        &mut stdin,
        &mut reader,
        "8",
        "students.delete",
        json!({ "studentId": "24-00001" }),
    );
    assert_eq!(again["code"].as_str(), Some("not_found"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn deleting_a_class_unenrolls_students_and_drops_its_attendance() {
    let workspace = temp_dir("rollcall-cascade-class");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    seed_class_with_two_students(&mut stdin, &mut reader);
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "attendance.toggle",
        json!({ "classId": 1, "studentId": "24-00002", "date": "March 7 2025" }),
    );

    let deleted = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "classes.delete",
        json!({ "classId": 1 }),
    );
    assert_eq!(deleted["studentsUnenrolled"].as_u64(), Some(2));
    assert_eq!(deleted["attendancePurged"].as_bool(), Some(true));

    let students = request_ok(&mut stdin, &mut reader, "4", "students.list", json!({}));
    for s in students["students"].as_array().cloned().unwrap_or_default() {
        assert_eq!(s["enrolledClasses"], json!([]));
    }
    assert_eq!(read_store_key(&workspace, "studentAttendance"), json!({}));

    let classes = request_ok(&mut stdin, &mut reader, "5", "classes.list", json!({}));
    assert_eq!(classes["classes"], json!([]));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn instructor_rename_and_delete_follow_through_to_classes() {
    let workspace = temp_dir("rollcall-cascade-instructor");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let created = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "instructors.create",
        json!({
            "firstName": "Maria",
            "lastName": "Santos",
            "email": "maria@school.test",
            "phone": "09981234567"
        }),
    );
    let instructor_id = created["instructor"]["id"].as_str().expect("id").to_string();
    assert_eq!(instructor_id, "INS-001");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "classes.create",
        json!({ "description": "Capstone Project 1", "instructor": "Maria Santos" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "classes.create",
        json!({ "description": "Social and Professional Issues" }),
    );

    let scoped = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "classes.list",
        json!({ "instructor": "Maria Santos" }),
    );
    assert_eq!(scoped["classes"].as_array().map(|a| a.len()), Some(1));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "instructors.update",
        json!({
            "instructorId": instructor_id,
            "firstName": "Maria",
            "lastName": "Santos-Cruz",
            "email": "maria@school.test",
            "phone": "09981234567"
        }),
    );
    let renamed = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "classes.list",
        json!({ "instructor": "Maria Santos-Cruz" }),
    );
    assert_eq!(renamed["classes"].as_array().map(|a| a.len()), Some(1));

    let deleted = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "instructors.delete",
        json!({ "instructorId": instructor_id }),
    );
    assert_eq!(deleted["classesUnassigned"].as_u64(), Some(1));

    let unassigned = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "classes.list",
        json!({ "instructor": "Unassigned" }),
    );
    assert_eq!(unassigned["classes"].as_array().map(|a| a.len()), Some(2));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn toggling_a_stale_row_after_delete_writes_nothing() {
    let workspace = temp_dir("rollcall-cascade-stale-row");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    seed_class_with_two_students(&mut stdin, &mut reader);
    let opened = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "view.selectClass",
        json!({ "classId": 1, "date": "March 3 2025" }),
    );
    assert_eq!(opened["rows"].as_array().map(|a| a.len()), Some(2));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.delete",
        json!({ "studentId": "24-00001" }),
    );
    let stale = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "view.toggle",
        json!({ "studentId": "24-00001" }),
    );
    assert_eq!(stale["code"].as_str(), Some("not_found"));
    assert_eq!(stale["details"]["screen"]["view"].as_str(), Some("overview"));
    assert!(stale["details"]["screen"]["notice"].is_string());
    assert_eq!(read_store_key(&workspace, "studentAttendance"), json!({}));

    // Unenrolled students are just as stale.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "view.selectClass",
        json!({ "classId": 1 }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "students.unenroll",
        json!({ "studentId": "24-00002", "classId": 1 }),
    );
    let unenrolled = request_err(
        &mut stdin,
        &mut reader,
        "7",
        "view.toggle",
        json!({ "studentId": "24-00002" }),
    );
    assert_eq!(unenrolled["code"].as_str(), Some("not_found"));
    assert_eq!(read_store_key(&workspace, "studentAttendance"), json!({}));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
