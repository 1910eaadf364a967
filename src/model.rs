use crate::error::{Result, RollcallError};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Placeholder instructor name for classes whose instructor was removed.
pub const UNASSIGNED: &str = "Unassigned";

/// Class identifier. Older workspaces store integers, newer ones may carry a
/// code; both compare by their text form. Numeric text is held in canonical
/// form (`"007"` is `7`) and written back as a JSON number.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassId(String);

impl ClassId {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let trimmed = raw.trim();
        match trimmed.parse::<i64>() {
            Ok(n) => ClassId::from(n),
            Err(_) => ClassId(trimmed.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        self.0.parse::<i64>().ok()
    }
}

impl From<i64> for ClassId {
    fn from(v: i64) -> Self {
        ClassId(v.to_string())
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for ClassId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.as_number() {
            Some(n) => serializer.serialize_i64(n),
            None => serializer.serialize_str(&self.0),
        }
    }
}

struct ClassIdVisitor;

impl<'de> Visitor<'de> for ClassIdVisitor {
    type Value = ClassId;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a class id (integer or string)")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<ClassId, E> {
        Ok(ClassId::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<ClassId, E> {
        Ok(ClassId(v.to_string()))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<ClassId, E> {
        if v.trim().is_empty() {
            return Err(E::custom("class id must not be empty"));
        }
        Ok(ClassId::new(v))
    }
}

impl<'de> Deserialize<'de> for ClassId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(ClassIdVisitor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum YearLevel {
    #[serde(rename = "1st Year")]
    First,
    #[serde(rename = "2nd Year")]
    Second,
    #[serde(rename = "3rd Year")]
    Third,
    #[serde(rename = "4th Year")]
    Fourth,
}

impl YearLevel {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "1st Year" | "1" => Some(YearLevel::First),
            "2nd Year" | "2" => Some(YearLevel::Second),
            "3rd Year" | "3" => Some(YearLevel::Third),
            "4th Year" | "4" => Some(YearLevel::Fourth),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            YearLevel::First => "1st Year",
            YearLevel::Second => "2nd Year",
            YearLevel::Third => "3rd Year",
            YearLevel::Fourth => "4th Year",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub year_level: YearLevel,
    pub phone: String,
    #[serde(default)]
    pub enrolled_classes: Vec<ClassId>,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_enrolled(&self, class_id: &ClassId) -> bool {
        self.enrolled_classes.contains(class_id)
    }

    pub fn validate(&self) -> Result<()> {
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err(RollcallError::Validation(
                "Please fill in all required fields".to_string(),
            ));
        }
        if !is_valid_phone(&self.phone) {
            return Err(RollcallError::Validation(
                "Please enter a valid phone number starting with 09 followed by 9 digits."
                    .to_string(),
            ));
        }
        if !is_valid_student_id(&self.id) {
            return Err(RollcallError::Validation(
                "Please enter a valid ID number in format XX-XXXXX.".to_string(),
            ));
        }
        Ok(())
    }

    /// Case-insensitive match used by the student search box.
    pub fn matches(&self, term: &str) -> bool {
        let t = term.trim().to_lowercase();
        if t.is_empty() {
            return true;
        }
        self.first_name.to_lowercase().contains(&t)
            || self.last_name.to_lowercase().contains(&t)
            || self.id.to_lowercase().contains(&t)
            || self.year_level.label().to_lowercase().contains(&t)
            || self.phone.contains(&t)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instructor {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

impl Instructor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn validate(&self) -> Result<()> {
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err(RollcallError::Validation(
                "Please fill in all required fields".to_string(),
            ));
        }
        if !is_valid_phone(&self.phone) {
            return Err(RollcallError::Validation(
                "Please enter a valid phone number starting with 09 followed by 9 digits."
                    .to_string(),
            ));
        }
        if !self.email.is_empty() && !self.email.contains('@') {
            return Err(RollcallError::Validation(
                "Please enter a valid email address.".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: ClassId,
    #[serde(default)]
    pub course_code: String,
    #[serde(default)]
    pub class_code: String,
    pub description: String,
    #[serde(default)]
    pub room_number: String,
    #[serde(default)]
    pub schedule: String,
    #[serde(default = "unassigned")]
    pub instructor: String,
}

fn unassigned() -> String {
    UNASSIGNED.to_string()
}

impl Class {
    /// Section code when set, otherwise the id, as the overview table shows it.
    pub fn display_code(&self) -> String {
        if self.class_code.trim().is_empty() {
            self.id.to_string()
        } else {
            self.class_code.clone()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.description.trim().is_empty() {
            return Err(RollcallError::Validation(
                "Please fill in all required fields".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub code: String,
    pub description: String,
}

pub fn default_courses() -> Vec<Course> {
    [
        ("ITC321", "Applications Development"),
        ("ITP323", "Capstone Project 1"),
        ("ITP324", "Information Assurance and Security 2"),
        ("ITP325", "Social and Professional Issues"),
        ("ITP326", "Systems Administration"),
    ]
    .into_iter()
    .map(|(code, description)| Course {
        code: code.to_string(),
        description: description.to_string(),
    })
    .collect()
}

/// `09` followed by exactly nine digits.
pub fn is_valid_phone(phone: &str) -> bool {
    phone.len() == 11 && phone.starts_with("09") && phone.bytes().all(|b| b.is_ascii_digit())
}

/// `YY-NNNNN`.
pub fn is_valid_student_id(id: &str) -> bool {
    let b = id.as_bytes();
    b.len() == 8
        && b[2] == b'-'
        && b[..2].iter().all(u8::is_ascii_digit)
        && b[3..].iter().all(u8::is_ascii_digit)
}

/// Next `YY-NNNNN` for the given two-digit year prefix.
pub fn next_student_id<'a>(existing: impl IntoIterator<Item = &'a str>, year: &str) -> String {
    let highest = existing
        .into_iter()
        .filter_map(|id| id.split_once('-'))
        .filter(|(prefix, _)| *prefix == year)
        .filter_map(|(_, n)| n.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("{}-{:05}", year, highest + 1)
}

/// Next `INS-NNN`, continuing from the highest existing number.
pub fn next_instructor_id<'a>(existing: impl IntoIterator<Item = &'a str>) -> String {
    let highest = existing
        .into_iter()
        .filter_map(|id| id.strip_prefix("INS-"))
        .filter_map(|n| n.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("INS-{:03}", highest + 1)
}
