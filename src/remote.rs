//! Client for the attendance service's HTTP contract.
//!
//! Requests block the daemon until answered; no timeout is set, matching how
//! the web pages called the same endpoints.

use crate::attendance::AttendanceStatus;
use crate::backend::{null_as_empty, AttendanceBackend, ClassDay, ClassSummary, DayRow, StudentHistory};
use crate::calendar::DateKey;
use crate::error::{Result, RollcallError};
use crate::model::ClassId;
use reqwest::blocking::{Client, Response};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClassRecord {
    id: ClassId,
    #[serde(default, deserialize_with = "null_as_empty")]
    class_code: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ClassAttendance {
    date: DateKey,
    #[serde(default)]
    attendance: Vec<DayRow>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRequest<'a> {
    student_id: &'a str,
    class_id: &'a ClassId,
    date: String,
    status: AttendanceStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EnrollRequest<'a> {
    student_id: &'a str,
}

/// `{success, message?}` envelope returned by every mutating endpoint.
#[derive(Debug, Deserialize)]
struct Outcome {
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

impl Outcome {
    fn into_result(self, fallback: &str) -> Result<Option<String>> {
        if self.success {
            Ok(self.message)
        } else {
            Err(RollcallError::RemoteRejected(
                self.message.unwrap_or_else(|| fallback.to_string()),
            ))
        }
    }
}

pub struct RemoteBackend {
    base_url: String,
    client: Client,
}

impl RemoteBackend {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| RollcallError::RemoteUnreachable(e.to_string()))?;
        Ok(RemoteBackend {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&impl Serialize>,
    ) -> Result<Response> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(method.clone(), &url);
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        log::debug!("{} {}", method, url);
        let resp = req.send().map_err(|e| {
            log::warn!("{} {} failed: {}", method, url, e);
            RollcallError::RemoteUnreachable(e.to_string())
        })?;
        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RollcallError::not_found("record", path));
        }
        if !status.is_success() {
            log::warn!("{} {} returned {}", method, url, status);
            // Refusals come back as `{success: false, message}` on 4xx/5xx.
            if let Some(message) = rejection_message(resp) {
                return Err(RollcallError::RemoteRejected(message));
            }
            return Err(RollcallError::RemoteHttp {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }
        Ok(resp)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let resp = self.send(Method::GET, path, query, None::<&()>)?;
        decode(resp)
    }

    fn classes(&self) -> Result<Vec<ClassRecord>> {
        self.get_json("/classes/api/list", &[])
    }

    pub fn enroll(&self, class_id: &ClassId, student_id: &str) -> Result<Option<String>> {
        let path = format!("/classes/api/{}/enroll", class_id);
        let resp = self.send(
            Method::POST,
            &path,
            &[],
            Some(&EnrollRequest { student_id }),
        )?;
        decode::<Outcome>(resp)?.into_result("enrollment failed")
    }

    pub fn unenroll(&self, class_id: &ClassId, student_id: &str) -> Result<Option<String>> {
        let path = format!("/classes/api/{}/unenroll/{}", class_id, student_id);
        let resp = self.send(Method::DELETE, &path, &[], None::<&()>)?;
        decode::<Outcome>(resp)?.into_result("unenrollment failed")
    }
}

fn rejection_message(resp: Response) -> Option<String> {
    let outcome: Outcome = serde_json::from_slice(&resp.bytes().ok()?).ok()?;
    if outcome.success {
        return None;
    }
    outcome.message.filter(|m| !m.trim().is_empty())
}

fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let bytes = resp
        .bytes()
        .map_err(|e| RollcallError::RemoteUnreachable(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| RollcallError::RemoteBadResponse(e.to_string()))
}

impl AttendanceBackend for RemoteBackend {
    fn overview(&mut self, _date: DateKey) -> Result<Vec<ClassSummary>> {
        // The service always reports on its own current day.
        self.get_json("/attendance/api/classes", &[])
    }

    fn class_day(&mut self, class_id: &ClassId, date: DateKey) -> Result<ClassDay> {
        let cls = self
            .classes()?
            .into_iter()
            .find(|c| &c.id == class_id)
            .ok_or_else(|| RollcallError::not_found("class", class_id.to_string()))?;
        let path = format!("/attendance/api/class/{}/attendance", class_id);
        let day: ClassAttendance = self.get_json(&path, &[("date", date.iso())])?;
        Ok(ClassDay::new(
            cls.id,
            cls.class_code,
            cls.description,
            day.date,
            day.attendance,
        ))
    }

    fn student_history(&mut self, class_id: &ClassId, student_id: &str) -> Result<StudentHistory> {
        let path = format!("/attendance/api/student/{}/attendance", student_id);
        self.get_json(&path, &[("class_id", class_id.to_string())])
    }

    fn toggle(
        &mut self,
        class_id: &ClassId,
        student_id: &str,
        date: DateKey,
        shown: AttendanceStatus,
    ) -> Result<AttendanceStatus> {
        let new_status = shown.flipped();
        let body = UpdateRequest {
            student_id,
            class_id,
            date: date.to_string(),
            status: new_status,
        };
        let resp = self.send(Method::POST, "/attendance/api/update", &[], Some(&body))?;
        decode::<Outcome>(resp)?.into_result("attendance update failed")?;
        log::info!(
            "attendance {} / {} / {} -> {} (remote)",
            class_id,
            student_id,
            date,
            new_status.label()
        );
        Ok(new_status)
    }

    fn announces_failures(&self) -> bool {
        true
    }
}
