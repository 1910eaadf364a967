//! Data sources behind the attendance screens.
//!
//! The local backend reads the workspace store; the remote backend speaks the
//! attendance service's HTTP contract. Both hand the navigator the same
//! screen records.

use crate::attendance::{self, AttendanceStatus, Tally};
use crate::calendar::{self, DateKey};
use crate::error::Result;
use crate::model::ClassId;
use crate::roster;
use crate::store::KeyValueStore;
use serde::{Deserialize, Deserializer, Serialize};

/// The attendance service sends `null` for unset text columns.
pub(crate) fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

/// One row of the class overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSummary {
    pub id: ClassId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub class_code: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    pub enrolled_count: usize,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub schedule: String,
    pub date: DateKey,
    pub present_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayRow {
    pub student_id: String,
    pub student_name: String,
    pub status: AttendanceStatus,
}

/// Class detail: every enrolled student's status on one date.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDay {
    pub class_id: ClassId,
    pub class_code: String,
    pub description: String,
    pub date: DateKey,
    pub rows: Vec<DayRow>,
    pub present_count: usize,
}

impl ClassDay {
    pub fn new(
        class_id: ClassId,
        class_code: String,
        description: String,
        date: DateKey,
        rows: Vec<DayRow>,
    ) -> Self {
        let mut day = ClassDay {
            class_id,
            class_code,
            description,
            date,
            rows,
            present_count: 0,
        };
        day.recount();
        day
    }

    /// Full recount over the enrolled rows.
    pub fn recount(&mut self) {
        self.present_count = self
            .rows
            .iter()
            .filter(|r| r.status == AttendanceStatus::Present)
            .count();
    }

    pub fn row(&self, student_id: &str) -> Option<&DayRow> {
        self.rows.iter().find(|r| r.student_id == student_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRow {
    pub date: DateKey,
    pub status: AttendanceStatus,
}

/// Student detail: one student's dated history in one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentHistory {
    pub student_name: String,
    pub class_name: String,
    pub class_code: String,
    #[serde(flatten)]
    pub tally: Tally,
    pub attendance: Vec<HistoryRow>,
}

pub trait AttendanceBackend {
    fn overview(&mut self, date: DateKey) -> Result<Vec<ClassSummary>>;

    fn class_day(&mut self, class_id: &ClassId, date: DateKey) -> Result<ClassDay>;

    fn student_history(&mut self, class_id: &ClassId, student_id: &str) -> Result<StudentHistory>;

    /// Flips the status of one triple. `shown` is the value the caller is
    /// looking at; backends that hold the state themselves ignore it.
    fn toggle(
        &mut self,
        class_id: &ClassId,
        student_id: &str,
        date: DateKey,
        shown: AttendanceStatus,
    ) -> Result<AttendanceStatus>;

    /// Whether a failed lookup should leave a visible notice.
    fn announces_failures(&self) -> bool;
}

pub struct LocalBackend<'a, S: KeyValueStore + ?Sized> {
    store: &'a mut S,
    academic_year: i32,
}

impl<'a, S: KeyValueStore + ?Sized> LocalBackend<'a, S> {
    pub fn new(store: &'a mut S, academic_year: i32) -> Self {
        LocalBackend {
            store,
            academic_year,
        }
    }
}

impl<S: KeyValueStore + ?Sized> AttendanceBackend for LocalBackend<'_, S> {
    fn overview(&mut self, date: DateKey) -> Result<Vec<ClassSummary>> {
        let classes = roster::load_classes(&*self.store)?;
        let students = roster::load_students(&*self.store)?;
        let book = attendance::load_book(&*self.store)?;
        Ok(classes
            .into_iter()
            .map(|cls| {
                let enrolled: Vec<&str> = students
                    .iter()
                    .filter(|s| s.is_enrolled(&cls.id))
                    .map(|s| s.id.as_str())
                    .collect();
                let present_count = book.present_count(&cls.id, enrolled.iter().copied(), &date);
                ClassSummary {
                    class_code: cls.display_code(),
                    enrolled_count: enrolled.len(),
                    present_count,
                    id: cls.id,
                    description: cls.description,
                    schedule: cls.schedule,
                    date,
                }
            })
            .collect())
    }

    fn class_day(&mut self, class_id: &ClassId, date: DateKey) -> Result<ClassDay> {
        let cls = roster::find_class(&*self.store, class_id)?;
        let book = attendance::load_book(&*self.store)?;
        let rows = roster::enrolled_students(&*self.store, class_id)?
            .into_iter()
            .map(|s| DayRow {
                status: book.status(class_id, &s.id, &date),
                student_name: s.full_name(),
                student_id: s.id,
            })
            .collect();
        Ok(ClassDay::new(
            cls.id.clone(),
            cls.display_code(),
            cls.description,
            date,
            rows,
        ))
    }

    fn student_history(&mut self, class_id: &ClassId, student_id: &str) -> Result<StudentHistory> {
        let student = roster::enrolled_student(&*self.store, class_id, student_id)?;
        let cls = roster::find_class(&*self.store, class_id)?;
        let book = attendance::load_book(&*self.store)?;

        let mut dates = calendar::school_days(self.academic_year);
        dates.extend(book.recorded_dates(class_id, student_id));
        dates.sort();
        dates.dedup();

        let attendance: Vec<HistoryRow> = dates
            .into_iter()
            .map(|date| HistoryRow {
                status: book.status(class_id, student_id, &date),
                date,
            })
            .collect();
        let tally = Tally::from_statuses(attendance.iter().map(|r| r.status));
        Ok(StudentHistory {
            student_name: student.full_name(),
            class_code: cls.display_code(),
            class_name: cls.description,
            tally,
            attendance,
        })
    }

    fn toggle(
        &mut self,
        class_id: &ClassId,
        student_id: &str,
        date: DateKey,
        _shown: AttendanceStatus,
    ) -> Result<AttendanceStatus> {
        // The screen may predate a delete or unenroll.
        roster::enrolled_student(&*self.store, class_id, student_id)?;
        attendance::toggle_status(&mut *self.store, class_id, student_id, &date)
    }

    fn announces_failures(&self) -> bool {
        false
    }
}
