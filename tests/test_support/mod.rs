#![allow(dead_code)]

use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

pub fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    spawn_sidecar_with(&[])
}

pub fn spawn_sidecar_with(args: &[&str]) -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_rollcalld");
    let mut child = Command::new(exe)
        .args(args)
        .env_remove("ROLLCALL_WORKSPACE")
        .env_remove("ROLLCALL_REMOTE")
        .env_remove("ROLLCALL_ACADEMIC_YEAR")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn rollcalld");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

pub fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

pub fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(true),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or(serde_json::Value::Null)
}

/// Returns the error code of a response that must have failed.
pub fn request_err(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(false),
        "{} unexpectedly succeeded: {}",
        method,
        value
    );
    value.get("error").cloned().unwrap_or(serde_json::Value::Null)
}

/// Workspace with one class (id 1, "Capstone Project 1") and two enrolled
/// students, 24-00001 Ana Reyes and 24-00002 Ben Cruz.
pub fn seed_class_with_two_students(stdin: &mut ChildStdin, reader: &mut BufReader<ChildStdout>) {
    let _ = request_ok(
        stdin,
        reader,
        "seed-class",
        "classes.create",
        json!({
            "id": 1,
            "courseCode": "ITP323",
            "classCode": "F78",
            "description": "Capstone Project 1",
            "schedule": "1:00-2:30 PM MWF"
        }),
    );
    for (sid, first, last) in [("24-00001", "Ana", "Reyes"), ("24-00002", "Ben", "Cruz")] {
        let _ = request_ok(
            stdin,
            reader,
            &format!("seed-{}", sid),
            "students.create",
            json!({
                "id": sid,
                "firstName": first,
                "lastName": last,
                "yearLevel": "3rd Year",
                "phone": "09171234567"
            }),
        );
        let _ = request_ok(
            stdin,
            reader,
            &format!("seed-enroll-{}", sid),
            "students.enroll",
            json!({ "studentId": sid, "classId": 1 }),
        );
    }
}
