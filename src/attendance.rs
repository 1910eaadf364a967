//! Attendance state: `classId → studentId → date → status`.
//!
//! A triple that was never toggled reads as `Present`. Entries appear on the
//! first toggle and disappear only when a student or class is deleted.

use crate::calendar::DateKey;
use crate::error::Result;
use crate::model::ClassId;
use crate::store::{self, keys, KeyValueStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AttendanceStatus {
    #[default]
    Present,
    Absent,
}

impl AttendanceStatus {
    pub fn flipped(self) -> Self {
        match self {
            AttendanceStatus::Present => AttendanceStatus::Absent,
            AttendanceStatus::Absent => AttendanceStatus::Present,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Absent => "Absent",
        }
    }

    /// Caption of the button that toggles away from this status.
    pub fn action_label(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Mark Absent",
            AttendanceStatus::Absent => "Mark Present",
        }
    }
}

type DayMap = BTreeMap<DateKey, AttendanceStatus>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttendanceBook(BTreeMap<ClassId, BTreeMap<String, DayMap>>);

impl AttendanceBook {
    pub fn status(&self, class_id: &ClassId, student_id: &str, date: &DateKey) -> AttendanceStatus {
        self.0
            .get(class_id)
            .and_then(|students| students.get(student_id))
            .and_then(|days| days.get(date))
            .copied()
            .unwrap_or_default()
    }

    pub fn toggle(&mut self, class_id: &ClassId, student_id: &str, date: &DateKey) -> AttendanceStatus {
        let slot = self
            .0
            .entry(class_id.clone())
            .or_default()
            .entry(student_id.to_string())
            .or_default()
            .entry(*date)
            .or_default();
        *slot = slot.flipped();
        *slot
    }

    /// Students counted as present on `date`; a missing entry counts.
    pub fn present_count<'a>(
        &self,
        class_id: &ClassId,
        student_ids: impl IntoIterator<Item = &'a str>,
        date: &DateKey,
    ) -> usize {
        student_ids
            .into_iter()
            .filter(|sid| self.status(class_id, sid, date) == AttendanceStatus::Present)
            .count()
    }

    /// Dates with an explicit entry for this pair.
    pub fn recorded_dates(&self, class_id: &ClassId, student_id: &str) -> Vec<DateKey> {
        self.0
            .get(class_id)
            .and_then(|students| students.get(student_id))
            .map(|days| days.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn purge_student(&mut self, student_id: &str) -> bool {
        let mut removed = false;
        for students in self.0.values_mut() {
            removed |= students.remove(student_id).is_some();
        }
        self.0.retain(|_, students| !students.is_empty());
        removed
    }

    pub fn purge_class(&mut self, class_id: &ClassId) -> bool {
        self.0.remove(class_id).is_some()
    }

    #[cfg(test)]
    pub fn references_student(&self, student_id: &str) -> bool {
        self.0.values().any(|students| students.contains_key(student_id))
    }
}

/// Present/absent counters on the student detail screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tally {
    pub present_count: usize,
    pub absent_count: usize,
}

impl Tally {
    pub fn from_statuses(statuses: impl IntoIterator<Item = AttendanceStatus>) -> Self {
        statuses.into_iter().fold(Tally::default(), |mut t, s| {
            match s {
                AttendanceStatus::Present => t.present_count += 1,
                AttendanceStatus::Absent => t.absent_count += 1,
            }
            t
        })
    }

    /// Moves one record into `new_status`; assumes it was the other status.
    pub fn apply_toggle(&mut self, new_status: AttendanceStatus) {
        match new_status {
            AttendanceStatus::Present => {
                self.present_count += 1;
                self.absent_count = self.absent_count.saturating_sub(1);
            }
            AttendanceStatus::Absent => {
                self.present_count = self.present_count.saturating_sub(1);
                self.absent_count += 1;
            }
        }
    }
}

pub fn load_book<S: KeyValueStore + ?Sized>(store: &S) -> Result<AttendanceBook> {
    store::load(store, keys::STUDENT_ATTENDANCE)
}

pub fn save_book<S: KeyValueStore + ?Sized>(store: &mut S, book: &AttendanceBook) -> Result<()> {
    store::persist(store, keys::STUDENT_ATTENDANCE, book)
}

pub fn status_of<S: KeyValueStore + ?Sized>(
    store: &S,
    class_id: &ClassId,
    student_id: &str,
    date: &DateKey,
) -> Result<AttendanceStatus> {
    Ok(load_book(store)?.status(class_id, student_id, date))
}

/// Read-modify-write flip of one triple. Nothing is reported back unless the
/// write landed.
pub fn toggle_status<S: KeyValueStore + ?Sized>(
    store: &mut S,
    class_id: &ClassId,
    student_id: &str,
    date: &DateKey,
) -> Result<AttendanceStatus> {
    let mut book = load_book(store)?;
    let new_status = book.toggle(class_id, student_id, date);
    save_book(store, &book)?;
    log::info!(
        "attendance {} / {} / {} -> {}",
        class_id,
        student_id,
        date,
        new_status.label()
    );
    Ok(new_status)
}
