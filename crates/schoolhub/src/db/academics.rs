//! Sections, classes, subjects and subject groups.

use super::types::{DbClass, DbSection, DbSubject, DbSubjectGroup, NamedRef, SubjectRef, SubjectType};
use super::{count_where, delete_by_id, row_exists};
use crate::error::{SchoolError, SchoolResult};
use crate::ids::new_id;
use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

// --- sections -------------------------------------------------------------

pub fn create_section(conn: &Connection, name: &str) -> SchoolResult<DbSection> {
    let id = new_id();
    conn.execute(
        "INSERT INTO sections (id, name, created_at) VALUES (?1, ?2, datetime('now'))",
        (&id, name),
    )?;
    require_section(conn, &id)
}

pub fn list_sections(conn: &Connection) -> SchoolResult<Vec<DbSection>> {
    let mut stmt = conn.prepare("SELECT id, name, created_at FROM sections ORDER BY name, id")?;
    let sections = stmt
        .query_map([], |row| {
            Ok(DbSection {
                id: row.get(0)?,
                name: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(sections)
}

pub fn get_section(conn: &Connection, id: &str) -> SchoolResult<Option<DbSection>> {
    let section = conn
        .query_row(
            "SELECT id, name, created_at FROM sections WHERE id = ?1",
            [id],
            |row| {
                Ok(DbSection {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    created_at: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(section)
}

fn require_section(conn: &Connection, id: &str) -> SchoolResult<DbSection> {
    get_section(conn, id)?.ok_or_else(|| SchoolError::not_found("Section not found"))
}

pub fn update_section(conn: &Connection, id: &str, name: &str) -> SchoolResult<DbSection> {
    let changed = conn.execute("UPDATE sections SET name = ?2 WHERE id = ?1", (id, name))?;
    if changed == 0 {
        return Err(SchoolError::not_found("Section not found"));
    }
    require_section(conn, id)
}

pub fn delete_section(conn: &Connection, id: &str) -> SchoolResult<()> {
    if !row_exists(conn, "sections", id)? {
        return Err(SchoolError::not_found("Section not found"));
    }
    let dependents = [
        ("class_sections", "a class"),
        ("subject_group_sections", "subject groups"),
        ("teacher_assignments", "teacher assignments"),
        ("students", "students"),
        ("timetable_entries", "timetable entries"),
    ];
    for (table, label) in dependents {
        if count_where(conn, table, "section_id", id)? > 0 {
            return Err(SchoolError::conflict(format!(
                "Section is still referenced by {label}"
            )));
        }
    }
    delete_by_id(conn, "sections", id)?;
    Ok(())
}

// --- classes --------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NewClass {
    pub name: String,
    pub section_ids: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ClassUpdate {
    pub name: Option<String>,
    pub section_ids: Option<Vec<String>>,
}

pub fn create_class(conn: &Connection, new: &NewClass) -> SchoolResult<DbClass> {
    ensure_sections_exist(conn, &new.section_ids)?;

    let id = new_id();
    conn.execute(
        "INSERT INTO classes (id, name, created_at) VALUES (?1, ?2, datetime('now'))",
        (&id, &new.name),
    )?;
    replace_class_sections(conn, &id, &new.section_ids)?;
    require_class(conn, &id)
}

fn ensure_sections_exist(conn: &Connection, section_ids: &[String]) -> SchoolResult<()> {
    for section_id in section_ids {
        if !row_exists(conn, "sections", section_id)? {
            return Err(SchoolError::not_found(format!(
                "Section not found: {section_id}"
            )));
        }
    }
    Ok(())
}

fn replace_class_sections(
    conn: &Connection,
    class_id: &str,
    section_ids: &[String],
) -> SchoolResult<()> {
    conn.execute("DELETE FROM class_sections WHERE class_id = ?1", [class_id])?;
    let mut stmt = conn.prepare(
        "INSERT INTO class_sections (class_id, section_id, position) VALUES (?1, ?2, ?3)",
    )?;
    for (position, section_id) in section_ids.iter().enumerate() {
        stmt.execute((class_id, section_id, position as i64))?;
    }
    Ok(())
}

/// Sections attached to a class, in their configured order
pub fn class_section_refs(conn: &Connection, class_id: &str) -> SchoolResult<Vec<NamedRef>> {
    let mut stmt = conn.prepare(
        "SELECT s.id, s.name
         FROM class_sections cs
         JOIN sections s ON s.id = cs.section_id
         WHERE cs.class_id = ?1
         ORDER BY cs.position",
    )?;
    let refs = stmt
        .query_map([class_id], |row| {
            Ok(NamedRef {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(refs)
}

pub fn class_has_section(conn: &Connection, class_id: &str, section_id: &str) -> SchoolResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM class_sections WHERE class_id = ?1 AND section_id = ?2",
            [class_id, section_id],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Fails with 404 for an unknown class and 400 when the section is not attached to it
pub fn ensure_class_section(conn: &Connection, class_id: &str, section_id: &str) -> SchoolResult<()> {
    if !row_exists(conn, "classes", class_id)? {
        return Err(SchoolError::not_found("Class not found"));
    }
    if !row_exists(conn, "sections", section_id)? {
        return Err(SchoolError::not_found("Section not found"));
    }
    if !class_has_section(conn, class_id, section_id)? {
        return Err(SchoolError::bad_request(
            "Section does not belong to this Class",
        ));
    }
    Ok(())
}

pub fn get_class(conn: &Connection, id: &str) -> SchoolResult<Option<DbClass>> {
    let row = conn
        .query_row(
            "SELECT id, name, created_at FROM classes WHERE id = ?1",
            [id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )
        .optional()?;

    match row {
        Some((id, name, created_at)) => {
            let sections = class_section_refs(conn, &id)?;
            Ok(Some(DbClass {
                id,
                name,
                sections,
                created_at,
            }))
        }
        None => Ok(None),
    }
}

fn require_class(conn: &Connection, id: &str) -> SchoolResult<DbClass> {
    get_class(conn, id)?.ok_or_else(|| SchoolError::not_found("Class not found"))
}

pub fn list_classes(conn: &Connection) -> SchoolResult<Vec<DbClass>> {
    let mut stmt = conn.prepare("SELECT id FROM classes ORDER BY name, id")?;
    let ids = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut classes = Vec::with_capacity(ids.len());
    for id in ids {
        classes.push(require_class(conn, &id)?);
    }
    Ok(classes)
}

pub fn update_class(conn: &Connection, id: &str, update: &ClassUpdate) -> SchoolResult<DbClass> {
    if !row_exists(conn, "classes", id)? {
        return Err(SchoolError::not_found("Class not found"));
    }
    if let Some(name) = &update.name {
        conn.execute("UPDATE classes SET name = ?2 WHERE id = ?1", (id, name))?;
    }
    if let Some(section_ids) = &update.section_ids {
        ensure_sections_exist(conn, section_ids)?;
        for current in class_section_refs(conn, id)? {
            if !section_ids.contains(&current.id) {
                ensure_section_detachable(conn, id, &current.id)?;
            }
        }
        replace_class_sections(conn, id, section_ids)?;
    }
    require_class(conn, id)
}

/// Fails with 409 while anything still uses the (class, section) pair
fn ensure_section_detachable(conn: &Connection, class_id: &str, section_id: &str) -> SchoolResult<()> {
    let dependents = [
        (
            "SELECT COUNT(*) FROM subject_group_sections sgs
             JOIN subject_groups sg ON sg.id = sgs.subject_group_id
             WHERE sg.class_id = ?1 AND sgs.section_id = ?2",
            "subject groups",
        ),
        (
            "SELECT COUNT(*) FROM teacher_assignments WHERE class_id = ?1 AND section_id = ?2",
            "teacher assignments",
        ),
        (
            "SELECT COUNT(*) FROM students WHERE class_id = ?1 AND section_id = ?2",
            "students",
        ),
        (
            "SELECT COUNT(*) FROM timetable_entries WHERE class_id = ?1 AND section_id = ?2",
            "timetable entries",
        ),
    ];
    for (sql, label) in dependents {
        let count: i64 = conn.query_row(sql, [class_id, section_id], |row| row.get(0))?;
        if count > 0 {
            debug!("Refusing to detach section {} from class {}", section_id, class_id);
            return Err(SchoolError::conflict(format!(
                "Section {section_id} is still used by {label} of this class"
            )));
        }
    }
    Ok(())
}

pub fn delete_class(conn: &Connection, id: &str) -> SchoolResult<()> {
    if !row_exists(conn, "classes", id)? {
        return Err(SchoolError::not_found("Class not found"));
    }
    let dependents = [
        ("students", "class_id", "students"),
        ("subject_groups", "class_id", "subject groups"),
        ("teacher_assignments", "class_id", "teacher assignments"),
        ("timetable_entries", "class_id", "timetable entries"),
        ("admission_applications", "applying_for_class_id", "admission applications"),
    ];
    for (table, column, label) in dependents {
        if count_where(conn, table, column, id)? > 0 {
            return Err(SchoolError::conflict(format!(
                "Class is still referenced by {label}"
            )));
        }
    }
    delete_by_id(conn, "classes", id)?;
    Ok(())
}

// --- subjects -------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NewSubject {
    pub name: String,
    pub code: Option<String>,
    pub subject_type: SubjectType,
}

#[derive(Debug, Clone, Default)]
pub struct SubjectUpdate {
    pub name: Option<String>,
    pub code: Option<String>,
    pub subject_type: Option<SubjectType>,
}

/// Three-letter code prefix taken from the subject name, padded with `X`.
pub fn subject_code_prefix(name: &str) -> String {
    let mut prefix: String = name
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .take(3)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    while prefix.len() < 3 {
        prefix.push('X');
    }
    prefix
}

/// Next code after the highest `<prefix><digits>` among `existing`.
pub fn next_subject_code<'a, I>(prefix: &str, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let highest = existing
        .into_iter()
        .filter_map(|code| code.strip_prefix(prefix))
        .filter(|suffix| !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit()))
        .filter_map(|suffix| suffix.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("{prefix}{:03}", highest + 1)
}

fn generate_subject_code(conn: &Connection, name: &str) -> SchoolResult<String> {
    let prefix = subject_code_prefix(name);
    let mut stmt = conn.prepare("SELECT code FROM subjects WHERE code LIKE ?1 || '%'")?;
    let codes = stmt
        .query_map([&prefix], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    let code = next_subject_code(&prefix, codes.iter().map(String::as_str));
    debug!("Generated subject code {} for {}", code, name);
    Ok(code)
}

fn ensure_code_free(conn: &Connection, code: &str, except_id: Option<&str>) -> SchoolResult<()> {
    let holder: Option<String> = conn
        .query_row("SELECT id FROM subjects WHERE code = ?1", [code], |row| row.get(0))
        .optional()?;
    match holder {
        Some(holder) if Some(holder.as_str()) != except_id => Err(SchoolError::conflict(format!(
            "Subject code {code} is already in use"
        ))),
        _ => Ok(()),
    }
}

pub fn create_subject(conn: &Connection, new: &NewSubject) -> SchoolResult<DbSubject> {
    let code = match &new.code {
        Some(code) => {
            ensure_code_free(conn, code, None)?;
            code.clone()
        }
        None => generate_subject_code(conn, &new.name)?,
    };

    let id = new_id();
    conn.execute(
        "INSERT INTO subjects (id, name, code, subject_type, created_at)
         VALUES (?1, ?2, ?3, ?4, datetime('now'))",
        (&id, &new.name, &code, new.subject_type),
    )?;
    require_subject(conn, &id)
}

fn map_subject(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbSubject> {
    Ok(DbSubject {
        id: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        subject_type: row.get(3)?,
        created_at: row.get(4)?,
    })
}

pub fn get_subject(conn: &Connection, id: &str) -> SchoolResult<Option<DbSubject>> {
    let subject = conn
        .query_row(
            "SELECT id, name, code, subject_type, created_at FROM subjects WHERE id = ?1",
            [id],
            map_subject,
        )
        .optional()?;
    Ok(subject)
}

fn require_subject(conn: &Connection, id: &str) -> SchoolResult<DbSubject> {
    get_subject(conn, id)?.ok_or_else(|| SchoolError::not_found("Subject not found"))
}

pub fn list_subjects(conn: &Connection) -> SchoolResult<Vec<DbSubject>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, code, subject_type, created_at FROM subjects ORDER BY code",
    )?;
    let subjects = stmt
        .query_map([], map_subject)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(subjects)
}

pub fn update_subject(conn: &Connection, id: &str, update: &SubjectUpdate) -> SchoolResult<DbSubject> {
    if !row_exists(conn, "subjects", id)? {
        return Err(SchoolError::not_found("Subject not found"));
    }
    if let Some(name) = &update.name {
        conn.execute("UPDATE subjects SET name = ?2 WHERE id = ?1", (id, name))?;
    }
    if let Some(code) = &update.code {
        ensure_code_free(conn, code, Some(id))?;
        conn.execute("UPDATE subjects SET code = ?2 WHERE id = ?1", (id, code))?;
    }
    if let Some(subject_type) = update.subject_type {
        conn.execute(
            "UPDATE subjects SET subject_type = ?2 WHERE id = ?1",
            (id, subject_type),
        )?;
    }
    require_subject(conn, id)
}

pub fn delete_subject(conn: &Connection, id: &str) -> SchoolResult<()> {
    if !row_exists(conn, "subjects", id)? {
        return Err(SchoolError::not_found("Subject not found"));
    }
    if count_where(conn, "subject_group_subjects", "subject_id", id)? > 0
        || count_where(conn, "timetable_entries", "subject_id", id)? > 0
    {
        return Err(SchoolError::conflict(
            "Subject is still used by a subject group or timetable",
        ));
    }
    delete_by_id(conn, "subjects", id)?;
    Ok(())
}

// --- subject groups -------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NewSubjectGroup {
    pub name: String,
    pub class_id: String,
    pub section_ids: Vec<String>,
    pub subject_ids: Vec<String>,
}

pub fn create_subject_group(conn: &Connection, new: &NewSubjectGroup) -> SchoolResult<DbSubjectGroup> {
    if !row_exists(conn, "classes", &new.class_id)? {
        return Err(SchoolError::not_found("Class not found"));
    }
    for section_id in &new.section_ids {
        if !class_has_section(conn, &new.class_id, section_id)? {
            return Err(SchoolError::bad_request(format!(
                "Section {section_id} does not belong to this Class"
            )));
        }
    }
    for subject_id in &new.subject_ids {
        if !row_exists(conn, "subjects", subject_id)? {
            return Err(SchoolError::not_found(format!(
                "Subject not found: {subject_id}"
            )));
        }
    }

    let id = new_id();
    conn.execute(
        "INSERT INTO subject_groups (id, name, class_id, created_at)
         VALUES (?1, ?2, ?3, datetime('now'))",
        (&id, &new.name, &new.class_id),
    )?;
    for section_id in &new.section_ids {
        conn.execute(
            "INSERT INTO subject_group_sections (subject_group_id, section_id) VALUES (?1, ?2)",
            (&id, section_id),
        )?;
    }
    for subject_id in &new.subject_ids {
        conn.execute(
            "INSERT INTO subject_group_subjects (subject_group_id, subject_id) VALUES (?1, ?2)",
            (&id, subject_id),
        )?;
    }

    get_subject_group(conn, &id)?
        .ok_or_else(|| SchoolError::Internal("subject group vanished after insert".to_string()))
}

/// Loads a subject group with its class, sections and subjects resolved
pub fn get_subject_group(conn: &Connection, id: &str) -> SchoolResult<Option<DbSubjectGroup>> {
    let head = conn
        .query_row(
            "SELECT g.id, g.name, c.id, c.name, g.created_at
             FROM subject_groups g
             JOIN classes c ON c.id = g.class_id
             WHERE g.id = ?1",
            [id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    NamedRef {
                        id: row.get(2)?,
                        name: row.get(3)?,
                    },
                    row.get::<_, String>(4)?,
                ))
            },
        )
        .optional()?;

    let Some((id, name, class, created_at)) = head else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT s.id, s.name
         FROM subject_group_sections gs
         JOIN sections s ON s.id = gs.section_id
         WHERE gs.subject_group_id = ?1
         ORDER BY s.name",
    )?;
    let sections = stmt
        .query_map([&id], |row| {
            Ok(NamedRef {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut stmt = conn.prepare(
        "SELECT s.id, s.name, s.code
         FROM subject_group_subjects gs
         JOIN subjects s ON s.id = gs.subject_id
         WHERE gs.subject_group_id = ?1
         ORDER BY s.code",
    )?;
    let subjects = stmt
        .query_map([&id], |row| {
            Ok(SubjectRef {
                id: row.get(0)?,
                name: row.get(1)?,
                code: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(Some(DbSubjectGroup {
        id,
        name,
        class,
        sections,
        subjects,
        created_at,
    }))
}

pub fn list_subject_groups(conn: &Connection, class_id: Option<&str>) -> SchoolResult<Vec<DbSubjectGroup>> {
    let mut stmt = conn.prepare(
        "SELECT id FROM subject_groups
         WHERE ?1 IS NULL OR class_id = ?1
         ORDER BY name, id",
    )?;
    let ids = stmt
        .query_map([class_id], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut groups = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(group) = get_subject_group(conn, &id)? {
            groups.push(group);
        }
    }
    Ok(groups)
}

pub fn delete_subject_group(conn: &Connection, id: &str) -> SchoolResult<()> {
    if !row_exists(conn, "subject_groups", id)? {
        return Err(SchoolError::not_found("Subject Group not found"));
    }
    if count_where(conn, "timetable_entries", "subject_group_id", id)? > 0 {
        return Err(SchoolError::conflict(
            "Subject Group is still used by timetable entries",
        ));
    }
    delete_by_id(conn, "subject_groups", id)?;
    Ok(())
}
