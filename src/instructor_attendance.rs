//! Instructor attendance: `instructorName → classId → date → status`.
//!
//! Entries are keyed by the display name classes carry, so renames and
//! deletes in the roster move or drop them by that name. A class is tracked
//! under whoever is assigned to it; unmarked dates read as `Present`.

use crate::attendance::{AttendanceStatus, Tally};
use crate::calendar::{self, DateKey};
use crate::error::{Result, RollcallError};
use crate::model::{Class, ClassId, Instructor, UNASSIGNED};
use crate::roster;
use crate::store::{self, keys, KeyValueStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

type DayMap = BTreeMap<DateKey, AttendanceStatus>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstructorBook(BTreeMap<String, BTreeMap<ClassId, DayMap>>);

impl InstructorBook {
    pub fn status(&self, instructor: &str, class_id: &ClassId, date: &DateKey) -> AttendanceStatus {
        self.0
            .get(instructor)
            .and_then(|classes| classes.get(class_id))
            .and_then(|days| days.get(date))
            .copied()
            .unwrap_or_default()
    }

    pub fn toggle(&mut self, instructor: &str, class_id: &ClassId, date: &DateKey) -> AttendanceStatus {
        let slot = self
            .0
            .entry(instructor.to_string())
            .or_default()
            .entry(class_id.clone())
            .or_default()
            .entry(*date)
            .or_default();
        *slot = slot.flipped();
        *slot
    }

    fn recorded_dates(&self, instructor: &str, class_id: &ClassId) -> Vec<DateKey> {
        self.0
            .get(instructor)
            .and_then(|classes| classes.get(class_id))
            .map(|days| days.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Drops the class under every instructor.
    pub fn purge_class(&mut self, class_id: &ClassId) -> bool {
        let mut removed = false;
        for classes in self.0.values_mut() {
            removed |= classes.remove(class_id).is_some();
        }
        self.0.retain(|_, classes| !classes.is_empty());
        removed
    }

    /// School days of `academic_year` plus any other recorded date, oldest
    /// first, with their status.
    fn days(
        &self,
        instructor: &str,
        class_id: &ClassId,
        academic_year: i32,
    ) -> Vec<(DateKey, AttendanceStatus)> {
        let mut dates = calendar::school_days(academic_year);
        dates.extend(self.recorded_dates(instructor, class_id));
        dates.sort();
        dates.dedup();
        dates
            .into_iter()
            .map(|d| (d, self.status(instructor, class_id, &d)))
            .collect()
    }
}

pub fn load_book<S: KeyValueStore + ?Sized>(store: &S) -> Result<InstructorBook> {
    store::load(store, keys::INSTRUCTOR_ATTENDANCE)
}

pub fn save_book<S: KeyValueStore + ?Sized>(store: &mut S, book: &InstructorBook) -> Result<()> {
    store::persist(store, keys::INSTRUCTOR_ATTENDANCE, book)
}

/// The instructor record behind a class's display name.
fn assigned_instructor<S: KeyValueStore + ?Sized>(store: &S, class: &Class) -> Result<Instructor> {
    if class.instructor.trim().is_empty() || class.instructor == UNASSIGNED {
        return Err(RollcallError::not_found(
            "instructor assignment",
            class.id.to_string(),
        ));
    }
    roster::load_instructors(store)?
        .into_iter()
        .find(|i| i.full_name() == class.instructor)
        .ok_or_else(|| RollcallError::not_found("instructor", class.instructor.clone()))
}

/// One row of the instructor overview: an assigned class on one date.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeachingRow {
    pub class_id: ClassId,
    pub class_code: String,
    pub description: String,
    pub instructor: String,
    pub schedule: String,
    pub date: DateKey,
    pub status: AttendanceStatus,
}

pub fn overview<S: KeyValueStore + ?Sized>(store: &S, date: DateKey) -> Result<Vec<TeachingRow>> {
    let book = load_book(store)?;
    Ok(roster::load_classes(store)?
        .into_iter()
        .filter(|c| c.instructor != UNASSIGNED && !c.instructor.trim().is_empty())
        .map(|c| TeachingRow {
            status: book.status(&c.instructor, &c.id, &date),
            class_code: c.display_code(),
            class_id: c.id,
            description: c.description,
            instructor: c.instructor,
            schedule: c.schedule,
            date,
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeachingDay {
    pub date: DateKey,
    pub status: AttendanceStatus,
}

/// Class detail: the assigned instructor's status on every tracked date.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassTeaching {
    pub class_id: ClassId,
    pub class_code: String,
    pub description: String,
    pub instructor: String,
    #[serde(flatten)]
    pub tally: Tally,
    pub days: Vec<TeachingDay>,
}

pub fn class_record<S: KeyValueStore + ?Sized>(
    store: &S,
    class_id: &ClassId,
    academic_year: i32,
) -> Result<ClassTeaching> {
    let class = roster::find_class(store, class_id)?;
    let instructor = assigned_instructor(store, &class)?;
    let book = load_book(store)?;
    let days: Vec<TeachingDay> = book
        .days(&instructor.full_name(), class_id, academic_year)
        .into_iter()
        .map(|(date, status)| TeachingDay { date, status })
        .collect();
    Ok(ClassTeaching {
        class_code: class.display_code(),
        class_id: class.id,
        description: class.description,
        instructor: instructor.full_name(),
        tally: Tally::from_statuses(days.iter().map(|d| d.status)),
        days,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassLoad {
    pub class_id: ClassId,
    pub class_code: String,
    pub schedule: String,
    pub present_count: usize,
    pub total_days: usize,
}

/// Instructor detail: every class assigned to them with its present count.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructorRecord {
    pub instructor_id: String,
    pub name: String,
    pub classes: Vec<ClassLoad>,
}

pub fn instructor_record<S: KeyValueStore + ?Sized>(
    store: &S,
    instructor_id: &str,
    academic_year: i32,
) -> Result<InstructorRecord> {
    let instructor = roster::load_instructors(store)?
        .into_iter()
        .find(|i| i.id == instructor_id)
        .ok_or_else(|| RollcallError::not_found("instructor", instructor_id))?;
    let name = instructor.full_name();
    let book = load_book(store)?;
    let classes = roster::load_classes(store)?
        .into_iter()
        .filter(|c| c.instructor == name)
        .map(|c| {
            let days = book.days(&name, &c.id, academic_year);
            ClassLoad {
                present_count: days
                    .iter()
                    .filter(|(_, s)| *s == AttendanceStatus::Present)
                    .count(),
                total_days: days.len(),
                class_code: c.display_code(),
                class_id: c.id,
                schedule: c.schedule,
            }
        })
        .collect();
    Ok(InstructorRecord {
        instructor_id: instructor.id,
        name,
        classes,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToggleOutcome {
    pub instructor: String,
    pub status: AttendanceStatus,
}

/// Flips the assigned instructor's status for `class_id` on `date`. The class
/// must have an instructor that exists in the roster.
pub fn toggle_status<S: KeyValueStore + ?Sized>(
    store: &mut S,
    class_id: &ClassId,
    date: &DateKey,
) -> Result<ToggleOutcome> {
    let class = roster::find_class(&*store, class_id)?;
    let instructor = assigned_instructor(&*store, &class)?.full_name();
    let mut book = load_book(&*store)?;
    let status = book.toggle(&instructor, class_id, date);
    save_book(store, &book)?;
    log::info!(
        "instructor attendance {} / {} / {} -> {}",
        instructor,
        class_id,
        date,
        status.label()
    );
    Ok(ToggleOutcome { instructor, status })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn march_3() -> DateKey {
        "March 3 2025".parse().expect("date")
    }

    fn class(id: i64, instructor: &str) -> Class {
        Class {
            id: ClassId::from(id),
            course_code: "ITP326".to_string(),
            class_code: format!("F8{}", id),
            description: "Systems Administration".to_string(),
            room_number: String::new(),
            schedule: "2-3PM MW".to_string(),
            instructor: instructor.to_string(),
        }
    }

    fn seeded() -> MemoryStore {
        let mut store = MemoryStore::default();
        roster::init_workspace(&mut store).expect("init");
        roster::create_instructor(
            &mut store,
            Instructor {
                id: "INS-001".to_string(),
                first_name: "Kobe".to_string(),
                last_name: "Bryant".to_string(),
                email: String::new(),
                phone: "09123456780".to_string(),
                department: None,
            },
        )
        .expect("instructor");
        roster::create_class(&mut store, class(1, "Kobe Bryant")).expect("class 1");
        roster::create_class(&mut store, class(2, "Kobe Bryant")).expect("class 2");
        roster::create_class(&mut store, class(3, "")).expect("class 3");
        store
    }

    #[test]
    fn toggle_is_stored_under_the_assigned_name() {
        let mut store = seeded();
        let out = toggle_status(&mut store, &ClassId::from(1), &march_3()).expect("toggle");
        assert_eq!(out.instructor, "Kobe Bryant");
        assert_eq!(out.status, AttendanceStatus::Absent);
        let raw = store
            .get(keys::INSTRUCTOR_ATTENDANCE)
            .expect("get")
            .expect("saved");
        let v: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(v["Kobe Bryant"]["1"]["March 3 2025"], "Absent");
    }

    #[test]
    fn unassigned_class_cannot_be_marked() {
        let mut store = seeded();
        let err = toggle_status(&mut store, &ClassId::from(3), &march_3()).expect_err("unassigned");
        assert_eq!(err.code(), "not_found");
        assert_eq!(
            load_book(&store).expect("book"),
            InstructorBook::default()
        );
    }

    #[test]
    fn detail_counts_present_days_per_class() {
        let mut store = seeded();
        toggle_status(&mut store, &ClassId::from(2), &march_3()).expect("toggle");
        let record = instructor_record(&store, "INS-001", 2025).expect("record");
        assert_eq!(record.name, "Kobe Bryant");
        assert_eq!(record.classes.len(), 2);
        let total = calendar::school_days(2025).len();
        assert_eq!(record.classes[0].present_count, total);
        assert_eq!(record.classes[1].present_count, total - 1);
        assert_eq!(record.classes[1].total_days, total);
    }

    #[test]
    fn overview_skips_unassigned_classes() {
        let store = seeded();
        let rows = overview(&store, march_3()).expect("overview");
        let ids: Vec<ClassId> = rows.into_iter().map(|r| r.class_id).collect();
        assert_eq!(ids, vec![ClassId::from(1), ClassId::from(2)]);
    }

    #[test]
    fn purging_a_class_drops_it_for_every_instructor() {
        let mut book = InstructorBook::default();
        book.toggle("Kobe Bryant", &ClassId::from(1), &march_3());
        book.toggle("Stephen Curry", &ClassId::from(1), &march_3());
        book.toggle("Stephen Curry", &ClassId::from(2), &march_3());
        assert!(book.purge_class(&ClassId::from(1)));
        assert_eq!(
            book.status("Stephen Curry", &ClassId::from(2), &march_3()),
            AttendanceStatus::Absent
        );
        assert!(book.0.get("Kobe Bryant").is_none());
        assert!(!book.purge_class(&ClassId::from(1)));
    }
}
