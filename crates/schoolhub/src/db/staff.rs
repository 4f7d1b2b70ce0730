//! Staff records and teacher assignments to class sections.

use super::academics::ensure_class_section;
use super::types::{DbStaff, DbTeacherAssignment, NamedRef, StaffRole};
use super::{count_where, delete_by_id, row_exists};
use crate::error::{SchoolError, SchoolResult};
use crate::ids::new_id;
use rusqlite::{Connection, OptionalExtension};

#[derive(Debug, Clone)]
pub struct NewStaff {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: StaffRole,
}

#[derive(Debug, Clone, Default)]
pub struct StaffUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<StaffRole>,
}

const STAFF_COLUMNS: &str = "id, first_name, last_name, email, phone, role, created_at";

fn map_staff(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbStaff> {
    Ok(DbStaff {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        role: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn ensure_email_free(conn: &Connection, email: &str, except_id: Option<&str>) -> SchoolResult<()> {
    let holder: Option<String> = conn
        .query_row(
            "SELECT id FROM staff WHERE email = ?1 COLLATE NOCASE",
            [email],
            |row| row.get(0),
        )
        .optional()?;
    match holder {
        Some(holder) if Some(holder.as_str()) != except_id => Err(SchoolError::conflict(
            "A staff member with this email already exists",
        )),
        _ => Ok(()),
    }
}

pub fn create_staff(conn: &Connection, new: &NewStaff) -> SchoolResult<DbStaff> {
    let email = new.email.to_lowercase();
    ensure_email_free(conn, &email, None)?;

    let id = new_id();
    conn.execute(
        "INSERT INTO staff (id, first_name, last_name, email, phone, role, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, datetime('now'))",
        (
            &id,
            &new.first_name,
            &new.last_name,
            &email,
            &new.phone,
            new.role,
        ),
    )?;
    require_staff(conn, &id)
}

pub fn get_staff(conn: &Connection, id: &str) -> SchoolResult<Option<DbStaff>> {
    let staff = conn
        .query_row(
            &format!("SELECT {STAFF_COLUMNS} FROM staff WHERE id = ?1"),
            [id],
            map_staff,
        )
        .optional()?;
    Ok(staff)
}

fn require_staff(conn: &Connection, id: &str) -> SchoolResult<DbStaff> {
    get_staff(conn, id)?.ok_or_else(|| SchoolError::not_found("Staff member not found"))
}

pub fn list_staff(conn: &Connection, role: Option<StaffRole>) -> SchoolResult<Vec<DbStaff>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {STAFF_COLUMNS} FROM staff
         WHERE ?1 IS NULL OR role = ?1
         ORDER BY last_name, first_name, id"
    ))?;
    let staff = stmt
        .query_map([role], map_staff)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(staff)
}

pub fn update_staff(conn: &Connection, id: &str, update: &StaffUpdate) -> SchoolResult<DbStaff> {
    let current = require_staff(conn, id)?;

    let email = match &update.email {
        Some(email) => {
            let email = email.to_lowercase();
            ensure_email_free(conn, &email, Some(id))?;
            email
        }
        None => current.email,
    };
    let role = update.role.unwrap_or(current.role);
    if role != StaffRole::Teacher && current.role == StaffRole::Teacher && is_assigned_teacher(conn, id)? {
        return Err(SchoolError::conflict(
            "Staff member is still assigned to teach a class",
        ));
    }

    conn.execute(
        "UPDATE staff SET first_name = ?2, last_name = ?3, email = ?4, phone = ?5, role = ?6
         WHERE id = ?1",
        (
            id,
            update.first_name.as_ref().unwrap_or(&current.first_name),
            update.last_name.as_ref().unwrap_or(&current.last_name),
            &email,
            update.phone.as_ref().or(current.phone.as_ref()),
            role,
        ),
    )?;
    require_staff(conn, id)
}

fn is_assigned_teacher(conn: &Connection, id: &str) -> SchoolResult<bool> {
    Ok(count_where(conn, "teacher_assignment_teachers", "teacher_id", id)? > 0
        || count_where(conn, "timetable_entries", "teacher_id", id)? > 0)
}

pub fn delete_staff(conn: &Connection, id: &str) -> SchoolResult<()> {
    if !row_exists(conn, "staff", id)? {
        return Err(SchoolError::not_found("Staff member not found"));
    }
    if is_assigned_teacher(conn, id)? {
        return Err(SchoolError::conflict(
            "Staff member is still assigned to teach a class",
        ));
    }
    delete_by_id(conn, "staff", id)?;
    Ok(())
}

/// Id and display name of a staff member
pub fn staff_ref(conn: &Connection, id: &str) -> SchoolResult<Option<NamedRef>> {
    let found = conn
        .query_row(
            "SELECT id, first_name || ' ' || last_name FROM staff WHERE id = ?1",
            [id],
            |row| {
                Ok(NamedRef {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(found)
}

// --- teacher assignments --------------------------------------------------

#[derive(Debug, Clone)]
pub struct NewTeacherAssignment {
    pub class_id: String,
    pub section_id: String,
    pub teacher_ids: Vec<String>,
    pub class_teacher_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct AssignmentUpdate {
    pub teacher_ids: Option<Vec<String>>,
    pub class_teacher_id: Option<String>,
}

fn ensure_teachers(conn: &Connection, teacher_ids: &[String], class_teacher_id: &str) -> SchoolResult<()> {
    for teacher_id in teacher_ids {
        match get_staff(conn, teacher_id)? {
            None => {
                return Err(SchoolError::not_found(format!(
                    "Teacher not found: {teacher_id}"
                )))
            }
            Some(staff) if staff.role != StaffRole::Teacher => {
                return Err(SchoolError::bad_request(format!(
                    "Staff member {} is not a teacher",
                    staff.full_name()
                )))
            }
            Some(_) => {}
        }
    }
    if !teacher_ids.iter().any(|t| t == class_teacher_id) {
        return Err(SchoolError::bad_request(
            "Class teacher must be one of the assigned teachers",
        ));
    }
    Ok(())
}

fn replace_assignment_teachers(conn: &Connection, assignment_id: &str, teacher_ids: &[String]) -> SchoolResult<()> {
    conn.execute(
        "DELETE FROM teacher_assignment_teachers WHERE assignment_id = ?1",
        [assignment_id],
    )?;
    let mut stmt = conn.prepare(
        "INSERT INTO teacher_assignment_teachers (assignment_id, teacher_id) VALUES (?1, ?2)",
    )?;
    for teacher_id in teacher_ids {
        stmt.execute((assignment_id, teacher_id))?;
    }
    Ok(())
}

pub fn create_assignment(conn: &Connection, new: &NewTeacherAssignment) -> SchoolResult<DbTeacherAssignment> {
    ensure_class_section(conn, &new.class_id, &new.section_id)?;
    ensure_teachers(conn, &new.teacher_ids, &new.class_teacher_id)?;
    if find_assignment_for(conn, &new.class_id, &new.section_id)?.is_some() {
        return Err(SchoolError::conflict(
            "Teachers are already assigned to this class & section",
        ));
    }

    let id = new_id();
    conn.execute(
        "INSERT INTO teacher_assignments (id, class_id, section_id, class_teacher_id, created_at)
         VALUES (?1, ?2, ?3, ?4, datetime('now'))",
        (&id, &new.class_id, &new.section_id, &new.class_teacher_id),
    )?;
    replace_assignment_teachers(conn, &id, &new.teacher_ids)?;
    require_assignment(conn, &id)
}

fn load_assignment(conn: &Connection, where_clause: &str, params: &[&str]) -> SchoolResult<Option<DbTeacherAssignment>> {
    let head = conn
        .query_row(
            &format!(
                "SELECT a.id, c.id, c.name, s.id, s.name, t.id, t.first_name || ' ' || t.last_name, a.created_at
                 FROM teacher_assignments a
                 JOIN classes c ON c.id = a.class_id
                 JOIN sections s ON s.id = a.section_id
                 JOIN staff t ON t.id = a.class_teacher_id
                 WHERE {where_clause}"
            ),
            rusqlite::params_from_iter(params),
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    NamedRef {
                        id: row.get(1)?,
                        name: row.get(2)?,
                    },
                    NamedRef {
                        id: row.get(3)?,
                        name: row.get(4)?,
                    },
                    NamedRef {
                        id: row.get(5)?,
                        name: row.get(6)?,
                    },
                    row.get::<_, String>(7)?,
                ))
            },
        )
        .optional()?;

    let Some((id, class, section, class_teacher, created_at)) = head else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT t.id, t.first_name || ' ' || t.last_name
         FROM teacher_assignment_teachers ta
         JOIN staff t ON t.id = ta.teacher_id
         WHERE ta.assignment_id = ?1
         ORDER BY t.last_name, t.first_name",
    )?;
    let teachers = stmt
        .query_map([&id], |row| {
            Ok(NamedRef {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(Some(DbTeacherAssignment {
        id,
        class,
        section,
        teachers,
        class_teacher,
        created_at,
    }))
}

pub fn get_assignment(conn: &Connection, id: &str) -> SchoolResult<Option<DbTeacherAssignment>> {
    load_assignment(conn, "a.id = ?1", &[id])
}

fn require_assignment(conn: &Connection, id: &str) -> SchoolResult<DbTeacherAssignment> {
    get_assignment(conn, id)?.ok_or_else(|| SchoolError::not_found("Teacher assignment not found"))
}

/// The assignment for a (class, section) pair, if teachers have been assigned
pub fn find_assignment_for(
    conn: &Connection,
    class_id: &str,
    section_id: &str,
) -> SchoolResult<Option<DbTeacherAssignment>> {
    load_assignment(
        conn,
        "a.class_id = ?1 AND a.section_id = ?2",
        &[class_id, section_id],
    )
}

pub fn list_assignments(conn: &Connection) -> SchoolResult<Vec<DbTeacherAssignment>> {
    let mut stmt = conn.prepare(
        "SELECT a.id FROM teacher_assignments a
         JOIN classes c ON c.id = a.class_id
         JOIN sections s ON s.id = a.section_id
         ORDER BY c.name, s.name",
    )?;
    let ids = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut assignments = Vec::with_capacity(ids.len());
    for id in ids {
        assignments.push(require_assignment(conn, &id)?);
    }
    Ok(assignments)
}

pub fn update_assignment(
    conn: &Connection,
    id: &str,
    update: &AssignmentUpdate,
) -> SchoolResult<DbTeacherAssignment> {
    let current = require_assignment(conn, id)?;

    let teacher_ids = update
        .teacher_ids
        .clone()
        .unwrap_or_else(|| current.teachers.iter().map(|t| t.id.clone()).collect());
    let class_teacher_id = update
        .class_teacher_id
        .clone()
        .unwrap_or(current.class_teacher.id);
    ensure_teachers(conn, &teacher_ids, &class_teacher_id)?;

    conn.execute(
        "UPDATE teacher_assignments SET class_teacher_id = ?2 WHERE id = ?1",
        (id, &class_teacher_id),
    )?;
    replace_assignment_teachers(conn, id, &teacher_ids)?;
    require_assignment(conn, id)
}

pub fn delete_assignment(conn: &Connection, id: &str) -> SchoolResult<()> {
    if !delete_by_id(conn, "teacher_assignments", id)? {
        return Err(SchoolError::not_found("Teacher assignment not found"));
    }
    Ok(())
}
