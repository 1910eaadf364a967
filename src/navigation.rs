//! Overview → class detail → student detail, one screen at a time.
//!
//! `back` unwinds exactly one level. Entering the overview always reloads the
//! class list. A lookup that fails sends the navigator to the overview; the
//! remote backend also leaves a notice for the shell to show.

use crate::attendance::AttendanceStatus;
use crate::backend::{AttendanceBackend, ClassDay, ClassSummary, StudentHistory};
use crate::calendar::DateKey;
use crate::error::{Result, RollcallError};
use crate::model::ClassId;

#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Overview {
        classes: Vec<ClassSummary>,
    },
    ClassDetail(ClassDay),
    StudentDetail {
        class_id: ClassId,
        student_id: String,
        history: StudentHistory,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Overview,
    ClassDetail(ClassId),
    StudentDetail(ClassId, String),
}

pub struct Navigator {
    screen: Screen,
    date: DateKey,
    notice: Option<String>,
}

impl Navigator {
    pub fn new(date: DateKey) -> Self {
        Navigator {
            screen: Screen::Overview {
                classes: Vec::new(),
            },
            date,
            notice: None,
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn date(&self) -> DateKey {
        self.date
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn view(&self) -> View {
        match &self.screen {
            Screen::Overview { .. } => View::Overview,
            Screen::ClassDetail(day) => View::ClassDetail(day.class_id.clone()),
            Screen::StudentDetail {
                class_id,
                student_id,
                ..
            } => View::StudentDetail(class_id.clone(), student_id.clone()),
        }
    }

    /// Shows the overview, reloading it from `backend`.
    pub fn show_overview(&mut self, backend: &mut dyn AttendanceBackend, date: Option<DateKey>) {
        self.notice = None;
        if let Some(d) = date {
            self.date = d;
        }
        let classes = match backend.overview(self.date) {
            Ok(classes) => classes,
            Err(e) => {
                log::warn!("class overview failed: {}", e);
                self.notice = Some(format!("Failed to load class attendance data: {}", e));
                Vec::new()
            }
        };
        self.screen = Screen::Overview { classes };
    }

    pub fn select_class(
        &mut self,
        backend: &mut dyn AttendanceBackend,
        class_id: &ClassId,
        date: Option<DateKey>,
    ) -> Result<()> {
        if self.view() != View::Overview {
            return Err(RollcallError::InvalidView(
                "classes can only be opened from the overview".to_string(),
            ));
        }
        self.notice = None;
        if let Some(d) = date {
            self.date = d;
        }
        match backend.class_day(class_id, self.date) {
            Ok(day) => self.screen = Screen::ClassDetail(day),
            Err(e) => self.recover(backend, "Failed to load class attendance detail", e),
        }
        Ok(())
    }

    pub fn select_student(&mut self, backend: &mut dyn AttendanceBackend, student_id: &str) -> Result<()> {
        let Screen::ClassDetail(day) = &self.screen else {
            return Err(RollcallError::InvalidView(
                "students can only be opened from a class".to_string(),
            ));
        };
        self.notice = None;
        let class_id = day.class_id.clone();
        if day.row(student_id).is_none() {
            let e = RollcallError::not_found("enrollment", format!("{} in {}", student_id, class_id));
            self.recover(backend, "Failed to load student attendance detail", e);
            return Ok(());
        }
        match backend.student_history(&class_id, student_id) {
            Ok(history) => {
                self.screen = Screen::StudentDetail {
                    class_id,
                    student_id: student_id.to_string(),
                    history,
                }
            }
            Err(e) => self.recover(backend, "Failed to load student attendance detail", e),
        }
        Ok(())
    }

    /// Student detail returns to its class; class detail returns to the
    /// overview; the overview refreshes itself.
    pub fn back(&mut self, backend: &mut dyn AttendanceBackend) {
        self.notice = None;
        match self.view() {
            View::StudentDetail(class_id, _) => match backend.class_day(&class_id, self.date) {
                Ok(day) => self.screen = Screen::ClassDetail(day),
                Err(e) => self.recover(backend, "Failed to load class attendance detail", e),
            },
            View::ClassDetail(_) | View::Overview => self.show_overview(backend, None),
        }
    }

    /// Toggles the row for `student_id` (class detail) or `date` (student
    /// detail). The screen is only touched once the backend confirms, except
    /// that a record found missing sends the navigator to the overview.
    pub fn toggle(
        &mut self,
        backend: &mut dyn AttendanceBackend,
        student_id: Option<&str>,
        date: Option<DateKey>,
    ) -> Result<AttendanceStatus> {
        self.notice = None;
        let result = match &mut self.screen {
            Screen::Overview { .. } => {
                return Err(RollcallError::InvalidView(
                    "open a class before marking attendance".to_string(),
                ))
            }
            Screen::ClassDetail(day) => {
                let Some(student_id) = student_id else {
                    return Err(RollcallError::Validation("missing studentId".to_string()));
                };
                toggle_day_row(backend, day, student_id)
            }
            Screen::StudentDetail {
                class_id,
                student_id,
                history,
            } => {
                let Some(date) = date else {
                    return Err(RollcallError::Validation("missing date".to_string()));
                };
                toggle_history_row(backend, class_id, student_id, history, date)
            }
        };
        if let Err(e) = &result {
            log::warn!("attendance toggle failed: {}", e);
            // A row whose student or class is gone means the screen is stale.
            if matches!(e, RollcallError::NotFound { .. }) {
                self.show_overview(backend, None);
            }
            self.notice = Some(format!("Failed to update attendance: {}", e));
        }
        result
    }

    fn recover(&mut self, backend: &mut dyn AttendanceBackend, context: &str, e: RollcallError) {
        let silent = matches!(e, RollcallError::NotFound { .. }) && !backend.announces_failures();
        if silent {
            log::debug!("{}: {}", context, e);
        } else {
            log::warn!("{}: {}", context, e);
        }
        self.show_overview(backend, None);
        if !silent {
            self.notice = Some(format!("{}: {}", context, e));
        }
    }
}

fn toggle_day_row(
    backend: &mut dyn AttendanceBackend,
    day: &mut ClassDay,
    student_id: &str,
) -> Result<AttendanceStatus> {
    let Some(row) = day.rows.iter_mut().find(|r| r.student_id == student_id) else {
        return Err(RollcallError::not_found(
            "enrollment",
            format!("{} in {}", student_id, day.class_id),
        ));
    };
    let new_status = backend.toggle(&day.class_id, student_id, day.date, row.status)?;
    row.status = new_status;
    day.recount();
    Ok(new_status)
}

fn toggle_history_row(
    backend: &mut dyn AttendanceBackend,
    class_id: &ClassId,
    student_id: &str,
    history: &mut StudentHistory,
    date: DateKey,
) -> Result<AttendanceStatus> {
    let Some(row) = history.attendance.iter_mut().find(|r| r.date == date) else {
        return Err(RollcallError::Validation(format!(
            "no attendance row for {} on this screen",
            date
        )));
    };
    let new_status = backend.toggle(class_id, student_id, date, row.status)?;
    row.status = new_status;
    history.tally.apply_toggle(new_status);
    Ok(new_status)
}
