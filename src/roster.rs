//! Students, classes, instructors and the referential sweeps between them.
//!
//! Cascades walk the store key by key. There is no transaction: a failure
//! midway leaves the keys already written in place.

use crate::attendance;
use crate::instructor_attendance;
use crate::error::{Result, RollcallError};
use crate::model::{self, Class, ClassId, Course, Instructor, Student, UNASSIGNED};
use crate::store::{self, keys, KeyValueStore};
use serde_json::{Map, Value};

type Blobs = Map<String, Value>;

/// Seeds empty collections and the course catalog on a fresh workspace.
pub fn init_workspace<S: KeyValueStore + ?Sized>(store: &mut S) -> Result<Vec<&'static str>> {
    let courses = serde_json::to_string(&model::default_courses()).map_err(|source| {
        RollcallError::Encode {
            key: keys::COURSES.to_string(),
            source,
        }
    })?;
    let mut seeded = Vec::new();
    for key in keys::ALL {
        let default = match key {
            keys::COURSES => courses.as_str(),
            keys::STUDENTS | keys::CLASSES | keys::INSTRUCTORS => "[]",
            _ => "{}",
        };
        if store.init(key, default)? {
            seeded.push(key);
        }
    }
    if !seeded.is_empty() {
        log::info!("seeded store keys: {}", seeded.join(", "));
    }
    Ok(seeded)
}

pub fn load_students<S: KeyValueStore + ?Sized>(store: &S) -> Result<Vec<Student>> {
    store::load(store, keys::STUDENTS)
}

pub fn load_classes<S: KeyValueStore + ?Sized>(store: &S) -> Result<Vec<Class>> {
    store::load(store, keys::CLASSES)
}

pub fn load_instructors<S: KeyValueStore + ?Sized>(store: &S) -> Result<Vec<Instructor>> {
    store::load(store, keys::INSTRUCTORS)
}

pub fn load_courses<S: KeyValueStore + ?Sized>(store: &S) -> Result<Vec<Course>> {
    store::load(store, keys::COURSES)
}

pub fn find_class<S: KeyValueStore + ?Sized>(store: &S, class_id: &ClassId) -> Result<Class> {
    load_classes(store)?
        .into_iter()
        .find(|c| &c.id == class_id)
        .ok_or_else(|| RollcallError::not_found("class", class_id.to_string()))
}

pub fn find_student<S: KeyValueStore + ?Sized>(store: &S, student_id: &str) -> Result<Student> {
    load_students(store)?
        .into_iter()
        .find(|s| s.id == student_id)
        .ok_or_else(|| RollcallError::not_found("student", student_id))
}

/// The student, provided both records exist and the student lists the class.
pub fn enrolled_student<S: KeyValueStore + ?Sized>(
    store: &S,
    class_id: &ClassId,
    student_id: &str,
) -> Result<Student> {
    find_class(store, class_id)?;
    let student = find_student(store, student_id)?;
    if !student.is_enrolled(class_id) {
        return Err(RollcallError::not_found(
            "enrollment",
            format!("{} in {}", student_id, class_id),
        ));
    }
    Ok(student)
}

pub fn enrolled_students<S: KeyValueStore + ?Sized>(
    store: &S,
    class_id: &ClassId,
) -> Result<Vec<Student>> {
    Ok(load_students(store)?
        .into_iter()
        .filter(|s| s.is_enrolled(class_id))
        .collect())
}

// ---- students ----

pub fn search_students<S: KeyValueStore + ?Sized>(store: &S, term: &str) -> Result<Vec<Student>> {
    Ok(load_students(store)?
        .into_iter()
        .filter(|s| s.matches(term))
        .collect())
}

pub fn generate_student_id<S: KeyValueStore + ?Sized>(store: &S, year: &str) -> Result<String> {
    let students = load_students(store)?;
    Ok(model::next_student_id(
        students.iter().map(|s| s.id.as_str()),
        year,
    ))
}

/// Validates before anything is written.
pub fn create_student<S: KeyValueStore + ?Sized>(store: &mut S, student: Student) -> Result<Student> {
    student.validate()?;
    let mut students = load_students(store)?;
    if students.iter().any(|s| s.id == student.id) {
        return Err(RollcallError::Validation(
            "This ID number is already in use.".to_string(),
        ));
    }
    students.push(student.clone());
    store::persist(store, keys::STUDENTS, &students)?;
    Ok(student)
}

/// Replaces the editable fields; id and enrollment are kept.
pub fn update_student<S: KeyValueStore + ?Sized>(
    store: &mut S,
    student_id: &str,
    first_name: String,
    last_name: String,
    phone: String,
    year_level: model::YearLevel,
) -> Result<Student> {
    let mut students = load_students(store)?;
    let Some(existing) = students.iter_mut().find(|s| s.id == student_id) else {
        return Err(RollcallError::not_found("student", student_id));
    };
    let updated = Student {
        first_name,
        last_name,
        phone,
        year_level,
        ..existing.clone()
    };
    updated.validate()?;
    *existing = updated.clone();
    store::persist(store, keys::STUDENTS, &students)?;
    Ok(updated)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentCascade {
    pub attendance_purged: bool,
    pub pictures_purged: bool,
}

pub fn delete_student<S: KeyValueStore + ?Sized>(
    store: &mut S,
    student_id: &str,
) -> Result<StudentCascade> {
    let mut students = load_students(store)?;
    let before = students.len();
    students.retain(|s| s.id != student_id);
    if students.len() == before {
        return Err(RollcallError::not_found("student", student_id));
    }

    let mut book = attendance::load_book(store)?;
    let attendance_purged = book.purge_student(student_id);
    if attendance_purged {
        attendance::save_book(store, &book)?;
    }
    let pictures_purged = remove_blob_entry(store, keys::STUDENT_PICTURES, student_id)?;
    store::persist(store, keys::STUDENTS, &students)?;

    log::info!(
        "deleted student {} (attendance purged: {}, pictures purged: {})",
        student_id,
        attendance_purged,
        pictures_purged
    );
    Ok(StudentCascade {
        attendance_purged,
        pictures_purged,
    })
}

// ---- enrollment ----

/// Adds `class_id` to the student's list; a second call changes nothing.
pub fn enroll<S: KeyValueStore + ?Sized>(
    store: &mut S,
    student_id: &str,
    class_id: &ClassId,
) -> Result<Vec<ClassId>> {
    find_class(store, class_id)?;
    let mut students = load_students(store)?;
    let Some(student) = students.iter_mut().find(|s| s.id == student_id) else {
        return Err(RollcallError::not_found("student", student_id));
    };
    if !student.is_enrolled(class_id) {
        student.enrolled_classes.push(class_id.clone());
        let enrolled = student.enrolled_classes.clone();
        store::persist(store, keys::STUDENTS, &students)?;
        return Ok(enrolled);
    }
    Ok(student.enrolled_classes.clone())
}

/// Removes `class_id` from the student's list; absent ids are a no-op.
pub fn unenroll<S: KeyValueStore + ?Sized>(
    store: &mut S,
    student_id: &str,
    class_id: &ClassId,
) -> Result<Vec<ClassId>> {
    let mut students = load_students(store)?;
    let Some(student) = students.iter_mut().find(|s| s.id == student_id) else {
        return Err(RollcallError::not_found("student", student_id));
    };
    if student.is_enrolled(class_id) {
        student.enrolled_classes.retain(|c| c != class_id);
        let enrolled = student.enrolled_classes.clone();
        store::persist(store, keys::STUDENTS, &students)?;
        return Ok(enrolled);
    }
    Ok(student.enrolled_classes.clone())
}

// ---- classes ----

/// Numeric ids continue from the highest numeric id in the collection.
pub fn next_class_id(classes: &[Class]) -> ClassId {
    let highest = classes
        .iter()
        .filter_map(|c| c.id.as_number())
        .max()
        .unwrap_or(0);
    ClassId::from(highest + 1)
}

pub fn create_class<S: KeyValueStore + ?Sized>(store: &mut S, mut class: Class) -> Result<Class> {
    class.validate()?;
    let mut classes = load_classes(store)?;
    if classes.iter().any(|c| c.id == class.id) {
        return Err(RollcallError::Validation(format!(
            "Class ID {} is already in use.",
            class.id
        )));
    }
    if class.instructor.trim().is_empty() {
        class.instructor = UNASSIGNED.to_string();
    }
    classes.push(class.clone());
    store::persist(store, keys::CLASSES, &classes)?;
    Ok(class)
}

pub fn update_class<S: KeyValueStore + ?Sized>(store: &mut S, class: Class) -> Result<Class> {
    class.validate()?;
    let mut classes = load_classes(store)?;
    let Some(existing) = classes.iter_mut().find(|c| c.id == class.id) else {
        return Err(RollcallError::not_found("class", class.id.to_string()));
    };
    *existing = class.clone();
    store::persist(store, keys::CLASSES, &classes)?;
    Ok(class)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassCascade {
    pub students_unenrolled: usize,
    pub attendance_purged: bool,
    pub instructor_attendance_purged: bool,
}

pub fn delete_class<S: KeyValueStore + ?Sized>(
    store: &mut S,
    class_id: &ClassId,
) -> Result<ClassCascade> {
    let mut classes = load_classes(store)?;
    let before = classes.len();
    classes.retain(|c| &c.id != class_id);
    if classes.len() == before {
        return Err(RollcallError::not_found("class", class_id.to_string()));
    }

    let mut students = load_students(store)?;
    let mut students_unenrolled = 0;
    for s in students.iter_mut().filter(|s| s.is_enrolled(class_id)) {
        s.enrolled_classes.retain(|c| c != class_id);
        students_unenrolled += 1;
    }
    if students_unenrolled > 0 {
        store::persist(store, keys::STUDENTS, &students)?;
    }

    let mut book = attendance::load_book(store)?;
    let attendance_purged = book.purge_class(class_id);
    if attendance_purged {
        attendance::save_book(store, &book)?;
    }
    let mut teaching = instructor_attendance::load_book(store)?;
    let instructor_attendance_purged = teaching.purge_class(class_id);
    if instructor_attendance_purged {
        instructor_attendance::save_book(store, &teaching)?;
    }
    store::persist(store, keys::CLASSES, &classes)?;

    log::info!(
        "deleted class {} ({} students unenrolled)",
        class_id,
        students_unenrolled
    );
    Ok(ClassCascade {
        students_unenrolled,
        attendance_purged,
        instructor_attendance_purged,
    })
}

// ---- instructors ----

pub fn generate_instructor_id<S: KeyValueStore + ?Sized>(store: &S) -> Result<String> {
    let instructors = load_instructors(store)?;
    Ok(model::next_instructor_id(
        instructors.iter().map(|i| i.id.as_str()),
    ))
}

pub fn create_instructor<S: KeyValueStore + ?Sized>(
    store: &mut S,
    instructor: Instructor,
) -> Result<Instructor> {
    instructor.validate()?;
    let mut instructors = load_instructors(store)?;
    if instructors.iter().any(|i| i.id == instructor.id) {
        return Err(RollcallError::Validation(
            "This ID number is already in use.".to_string(),
        ));
    }
    instructors.push(instructor.clone());
    store::persist(store, keys::INSTRUCTORS, &instructors)?;
    Ok(instructor)
}

/// Renames carry over to class records and instructor attendance keys.
pub fn update_instructor<S: KeyValueStore + ?Sized>(
    store: &mut S,
    instructor: Instructor,
) -> Result<Instructor> {
    instructor.validate()?;
    let mut instructors = load_instructors(store)?;
    let Some(existing) = instructors.iter_mut().find(|i| i.id == instructor.id) else {
        return Err(RollcallError::not_found("instructor", instructor.id.clone()));
    };
    let old_name = existing.full_name();
    *existing = instructor.clone();
    store::persist(store, keys::INSTRUCTORS, &instructors)?;

    let new_name = instructor.full_name();
    if old_name != new_name {
        relabel_classes(store, &old_name, &new_name)?;
        rename_blob_entry(store, keys::INSTRUCTOR_ATTENDANCE, &old_name, &new_name)?;
    }
    Ok(instructor)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstructorCascade {
    pub classes_unassigned: usize,
}

pub fn delete_instructor<S: KeyValueStore + ?Sized>(
    store: &mut S,
    instructor_id: &str,
) -> Result<InstructorCascade> {
    let mut instructors = load_instructors(store)?;
    let Some(pos) = instructors.iter().position(|i| i.id == instructor_id) else {
        return Err(RollcallError::not_found("instructor", instructor_id));
    };
    let name = instructors[pos].full_name();

    let classes_unassigned = relabel_classes(store, &name, UNASSIGNED)?;
    remove_blob_entry(store, keys::INSTRUCTOR_ATTENDANCE, &name)?;
    remove_blob_entry(store, keys::INSTRUCTOR_PICTURES, instructor_id)?;

    instructors.remove(pos);
    store::persist(store, keys::INSTRUCTORS, &instructors)?;
    log::info!(
        "deleted instructor {} ({} classes unassigned)",
        instructor_id,
        classes_unassigned
    );
    Ok(InstructorCascade { classes_unassigned })
}

fn relabel_classes<S: KeyValueStore + ?Sized>(store: &mut S, from: &str, to: &str) -> Result<usize> {
    let mut classes = load_classes(store)?;
    let mut changed = 0;
    for c in classes.iter_mut().filter(|c| c.instructor == from) {
        c.instructor = to.to_string();
        changed += 1;
    }
    if changed > 0 {
        store::persist(store, keys::CLASSES, &classes)?;
    }
    Ok(changed)
}

fn remove_blob_entry<S: KeyValueStore + ?Sized>(store: &mut S, key: &str, entry: &str) -> Result<bool> {
    let mut blobs: Blobs = store::load(store, key)?;
    if blobs.remove(entry).is_none() {
        return Ok(false);
    }
    store::persist(store, key, &blobs)?;
    Ok(true)
}

fn rename_blob_entry<S: KeyValueStore + ?Sized>(
    store: &mut S,
    key: &str,
    from: &str,
    to: &str,
) -> Result<bool> {
    let mut blobs: Blobs = store::load(store, key)?;
    let Some(v) = blobs.remove(from) else {
        return Ok(false);
    };
    blobs.insert(to.to_string(), v);
    store::persist(store, key, &blobs)?;
    Ok(true)
}
