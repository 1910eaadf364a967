//! Screen payloads for the shell: the navigator state plus the captions the
//! tables display ("3 out of 5", "Mark Absent").

use crate::backend::{ClassDay, ClassSummary, StudentHistory};
use crate::navigation::{Navigator, Screen};
use serde_json::json;

pub fn present_summary(present: usize, enrolled: usize) -> String {
    format!("{} out of {}", present, enrolled)
}

pub fn screen_json(nav: &Navigator) -> serde_json::Value {
    let mut out = match nav.screen() {
        Screen::Overview { classes } => overview_json(classes),
        Screen::ClassDetail(day) => class_day_json(day),
        Screen::StudentDetail {
            class_id,
            student_id,
            history,
        } => {
            let mut v = history_json(history);
            v["classId"] = json!(class_id);
            v["studentId"] = json!(student_id);
            v
        }
    };
    out["date"] = json!(nav.date());
    out["notice"] = json!(nav.notice());
    out
}

fn overview_json(classes: &[ClassSummary]) -> serde_json::Value {
    let rows: Vec<serde_json::Value> = classes
        .iter()
        .map(|c| {
            json!({
                "id": c.id,
                "classCode": c.class_code,
                "description": c.description,
                "enrolledCount": c.enrolled_count,
                "schedule": c.schedule,
                "date": c.date,
                "presentCount": c.present_count,
                "presentSummary": present_summary(c.present_count, c.enrolled_count),
            })
        })
        .collect();
    json!({
        "view": "overview",
        "classes": rows,
        "empty": classes.is_empty(),
    })
}

fn class_day_json(day: &ClassDay) -> serde_json::Value {
    let rows: Vec<serde_json::Value> = day
        .rows
        .iter()
        .map(|r| {
            json!({
                "studentId": r.student_id,
                "studentName": r.student_name,
                "status": r.status,
                "actionLabel": r.status.action_label(),
            })
        })
        .collect();
    json!({
        "view": "classDetail",
        "classId": day.class_id,
        "title": format!("Class: {}", day.description),
        "classCode": day.class_code,
        "attendanceDate": day.date,
        "rows": rows,
        "presentCount": day.present_count,
        "presentSummary": present_summary(day.present_count, day.rows.len()),
    })
}

fn history_json(history: &StudentHistory) -> serde_json::Value {
    let rows: Vec<serde_json::Value> = history
        .attendance
        .iter()
        .map(|r| {
            json!({
                "date": r.date,
                "status": r.status,
                "actionLabel": r.status.action_label(),
            })
        })
        .collect();
    json!({
        "view": "studentDetail",
        "title": format!("Student: {}", history.student_name),
        "subtitle": format!("Class: {} ({})", history.class_name, history.class_code),
        "rows": rows,
        "presentCount": history.tally.present_count,
        "absentCount": history.tally.absent_count,
    })
}
