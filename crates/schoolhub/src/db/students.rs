//! Student records and daily attendance.

use super::academics::ensure_class_section;
use super::types::{AttendanceStatus, AttendanceSummary, DbAttendance, DbStudent, NamedRef};
use super::{delete_by_id, row_exists};
use crate::error::{SchoolError, SchoolResult};
use crate::ids::new_id;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};

#[derive(Debug, Clone)]
pub struct NewStudent {
    pub admission_no: String,
    pub first_name: String,
    pub last_name: String,
    pub class_id: String,
    pub section_id: String,
    pub roll_number: Option<String>,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct StudentUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub class_id: Option<String>,
    pub section_id: Option<String>,
    pub roll_number: Option<String>,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    pub class_id: Option<String>,
    pub section_id: Option<String>,
}

/// Login name for a student: `<first name>.<admission no>`, lowercased.
pub fn derive_username(first_name: &str, admission_no: &str) -> String {
    let first: String = first_name
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect();
    format!("{}.{}", first, admission_no.trim().to_lowercase())
}

const STUDENT_SELECT: &str = "
    SELECT st.id, st.admission_no, st.first_name, st.last_name,
           c.id, c.name, s.id, s.name,
           st.roll_number, st.guardian_name, st.guardian_phone, st.username, st.created_at
    FROM students st
    JOIN classes c ON c.id = st.class_id
    JOIN sections s ON s.id = st.section_id";

fn map_student(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbStudent> {
    Ok(DbStudent {
        id: row.get(0)?,
        admission_no: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        class: NamedRef {
            id: row.get(4)?,
            name: row.get(5)?,
        },
        section: NamedRef {
            id: row.get(6)?,
            name: row.get(7)?,
        },
        roll_number: row.get(8)?,
        guardian_name: row.get(9)?,
        guardian_phone: row.get(10)?,
        username: row.get(11)?,
        created_at: row.get(12)?,
    })
}

pub fn create_student(conn: &Connection, new: &NewStudent) -> SchoolResult<DbStudent> {
    ensure_class_section(conn, &new.class_id, &new.section_id)?;
    let taken = conn
        .query_row(
            "SELECT 1 FROM students WHERE admission_no = ?1",
            [&new.admission_no],
            |_| Ok(()),
        )
        .optional()?;
    if taken.is_some() {
        return Err(SchoolError::conflict(
            "A student with this admission number already exists",
        ));
    }

    let id = new_id();
    let username = derive_username(&new.first_name, &new.admission_no);
    conn.execute(
        "INSERT INTO students (
            id, admission_no, first_name, last_name, class_id, section_id,
            roll_number, guardian_name, guardian_phone, username, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, datetime('now'))",
        (
            &id,
            &new.admission_no,
            &new.first_name,
            &new.last_name,
            &new.class_id,
            &new.section_id,
            &new.roll_number,
            &new.guardian_name,
            &new.guardian_phone,
            &username,
        ),
    )?;
    require_student(conn, &id)
}

pub fn get_student(conn: &Connection, id: &str) -> SchoolResult<Option<DbStudent>> {
    let student = conn
        .query_row(
            &format!("{STUDENT_SELECT} WHERE st.id = ?1"),
            [id],
            map_student,
        )
        .optional()?;
    Ok(student)
}

fn require_student(conn: &Connection, id: &str) -> SchoolResult<DbStudent> {
    get_student(conn, id)?.ok_or_else(|| SchoolError::not_found("Student not found"))
}

pub fn list_students(conn: &Connection, filter: &StudentFilter) -> SchoolResult<Vec<DbStudent>> {
    let mut stmt = conn.prepare(&format!(
        "{STUDENT_SELECT}
         WHERE (?1 IS NULL OR st.class_id = ?1)
           AND (?2 IS NULL OR st.section_id = ?2)
         ORDER BY c.name, s.name, st.last_name, st.first_name"
    ))?;
    let students = stmt
        .query_map((&filter.class_id, &filter.section_id), map_student)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(students)
}

pub fn update_student(conn: &Connection, id: &str, update: &StudentUpdate) -> SchoolResult<DbStudent> {
    let current = require_student(conn, id)?;

    let class_id = update.class_id.clone().unwrap_or(current.class.id);
    let section_id = update.section_id.clone().unwrap_or(current.section.id);
    if update.class_id.is_some() || update.section_id.is_some() {
        ensure_class_section(conn, &class_id, &section_id)?;
    }
    let first_name = update.first_name.clone().unwrap_or(current.first_name);
    let username = derive_username(&first_name, &current.admission_no);

    conn.execute(
        "UPDATE students SET
            first_name = ?2, last_name = ?3, class_id = ?4, section_id = ?5,
            roll_number = ?6, guardian_name = ?7, guardian_phone = ?8, username = ?9
         WHERE id = ?1",
        (
            id,
            &first_name,
            update.last_name.as_ref().unwrap_or(&current.last_name),
            &class_id,
            &section_id,
            update.roll_number.as_ref().or(current.roll_number.as_ref()),
            update.guardian_name.as_ref().or(current.guardian_name.as_ref()),
            update.guardian_phone.as_ref().or(current.guardian_phone.as_ref()),
            &username,
        ),
    )?;
    require_student(conn, id)
}

pub fn delete_student(conn: &Connection, id: &str) -> SchoolResult<()> {
    if !delete_by_id(conn, "students", id)? {
        return Err(SchoolError::not_found("Student not found"));
    }
    Ok(())
}

// --- attendance -----------------------------------------------------------

#[derive(Debug, Clone)]
pub struct BulkAttendance {
    pub class_id: String,
    pub section_id: String,
    pub date: NaiveDate,
    pub records: Vec<(String, AttendanceStatus)>,
}

/// Marks attendance for a class section on one day, overwriting earlier marks for that day
pub fn mark_attendance(conn: &Connection, bulk: &BulkAttendance) -> SchoolResult<Vec<DbAttendance>> {
    ensure_class_section(conn, &bulk.class_id, &bulk.section_id)?;

    for (student_id, _) in &bulk.records {
        let enrolled = conn
            .query_row(
                "SELECT 1 FROM students WHERE id = ?1 AND class_id = ?2 AND section_id = ?3",
                [student_id, &bulk.class_id, &bulk.section_id],
                |_| Ok(()),
            )
            .optional()?;
        if enrolled.is_none() {
            return Err(SchoolError::bad_request(format!(
                "Student {student_id} is not enrolled in this class & section"
            )));
        }
    }

    let mut stmt = conn.prepare(
        "INSERT INTO attendance_records (id, student_id, class_id, section_id, date, status, marked_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, datetime('now'))
         ON CONFLICT(student_id, date) DO UPDATE SET
            status = excluded.status,
            class_id = excluded.class_id,
            section_id = excluded.section_id,
            marked_at = excluded.marked_at",
    )?;
    for (student_id, status) in &bulk.records {
        stmt.execute((
            new_id(),
            student_id,
            &bulk.class_id,
            &bulk.section_id,
            bulk.date,
            *status,
        ))?;
    }

    list_attendance(conn, &bulk.class_id, &bulk.section_id, bulk.date)
}

pub fn list_attendance(
    conn: &Connection,
    class_id: &str,
    section_id: &str,
    date: NaiveDate,
) -> SchoolResult<Vec<DbAttendance>> {
    let mut stmt = conn.prepare(
        "SELECT a.id, st.id, st.first_name || ' ' || st.last_name,
                a.class_id, a.section_id, a.date, a.status
         FROM attendance_records a
         JOIN students st ON st.id = a.student_id
         WHERE a.class_id = ?1 AND a.section_id = ?2 AND a.date = ?3
         ORDER BY st.last_name, st.first_name",
    )?;
    let records = stmt
        .query_map((class_id, section_id, date), |row| {
            Ok(DbAttendance {
                id: row.get(0)?,
                student: NamedRef {
                    id: row.get(1)?,
                    name: row.get(2)?,
                },
                class_id: row.get(3)?,
                section_id: row.get(4)?,
                date: row.get(5)?,
                status: row.get(6)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(records)
}

/// Tallies statuses; late arrivals count as attended
pub fn summarize_attendance<I>(student_id: &str, statuses: I) -> AttendanceSummary
where
    I: IntoIterator<Item = AttendanceStatus>,
{
    let mut summary = AttendanceSummary {
        student_id: student_id.to_string(),
        ..AttendanceSummary::default()
    };
    for status in statuses {
        summary.total_days += 1;
        match status {
            AttendanceStatus::Present => summary.present += 1,
            AttendanceStatus::Absent => summary.absent += 1,
            AttendanceStatus::Late => summary.late += 1,
            AttendanceStatus::Excused => summary.excused += 1,
        }
    }
    if summary.total_days > 0 {
        let attended = f64::from(summary.present + summary.late);
        let pct = attended / f64::from(summary.total_days) * 100.0;
        summary.attendance_percentage = (pct * 100.0).round() / 100.0;
    }
    summary
}

pub fn student_attendance_summary(conn: &Connection, student_id: &str) -> SchoolResult<AttendanceSummary> {
    if !row_exists(conn, "students", student_id)? {
        return Err(SchoolError::not_found("Student not found"));
    }
    let mut stmt = conn.prepare("SELECT status FROM attendance_records WHERE student_id = ?1")?;
    let statuses = stmt
        .query_map([student_id], |row| row.get::<_, AttendanceStatus>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(summarize_attendance(student_id, statuses))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::academics::{create_class, create_section, NewClass};
    use crate::db::SchoolDbManager;

    fn seeded() -> (SchoolDbManager, String, String) {
        let db = SchoolDbManager::in_memory().unwrap();
        let (class_id, section_id) = db
            .write(|c| {
                let section = create_section(c, "A")?;
                let class = create_class(
                    c,
                    &NewClass {
                        name: "Grade 3".to_string(),
                        section_ids: vec![section.id.clone()],
                    },
                )?;
                Ok((class.id, section.id))
            })
            .unwrap();
        (db, class_id, section_id)
    }

    fn student(admission_no: &str, first: &str, class_id: &str, section_id: &str) -> NewStudent {
        NewStudent {
            admission_no: admission_no.to_string(),
            first_name: first.to_string(),
            last_name: "Pupil".to_string(),
            class_id: class_id.to_string(),
            section_id: section_id.to_string(),
            roll_number: None,
            guardian_name: None,
            guardian_phone: None,
        }
    }

    #[test]
    fn test_derive_username() {
        assert_eq!(derive_username("Mary-Jane", "ADM-0042"), "maryjane.adm-0042");
        assert_eq!(derive_username("José", " A1 "), "josé.a1");
    }

    #[test]
    fn test_duplicate_admission_no_conflicts() {
        let (db, class_id, section_id) = seeded();
        let created = db
            .write(|c| create_student(c, &student("A1", "Ada", &class_id, &section_id)))
            .unwrap();
        assert_eq!(created.username, "ada.a1");

        let err = db
            .write(|c| create_student(c, &student("A1", "Bea", &class_id, &section_id)))
            .unwrap_err();
        assert!(matches!(err, SchoolError::Conflict(_)));
    }

    #[test]
    fn test_update_rederives_username() {
        let (db, class_id, section_id) = seeded();
        let created = db
            .write(|c| create_student(c, &student("A2", "Ada", &class_id, &section_id)))
            .unwrap();
        let update = StudentUpdate {
            first_name: Some("Adele".to_string()),
            ..StudentUpdate::default()
        };
        let updated = db
            .write(|c| update_student(c, &created.id, &update))
            .unwrap();
        assert_eq!(updated.username, "adele.a2");
        assert_eq!(updated.last_name, "Pupil");
    }

    #[test]
    fn test_remarking_overwrites() {
        let (db, class_id, section_id) = seeded();
        let s = db
            .write(|c| create_student(c, &student("A3", "Cy", &class_id, &section_id)))
            .unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 10, 12).unwrap();

        for status in [AttendanceStatus::Absent, AttendanceStatus::Late] {
            let bulk = BulkAttendance {
                class_id: class_id.clone(),
                section_id: section_id.clone(),
                date,
                records: vec![(s.id.clone(), status)],
            };
            db.write(|c| mark_attendance(c, &bulk)).unwrap();
        }

        let rows = db
            .read(|c| list_attendance(c, &class_id, &section_id, date))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, AttendanceStatus::Late);
        assert_eq!(rows[0].date, "2026-10-12");
    }

    #[test]
    fn test_bulk_rejects_unenrolled_student() {
        let (db, class_id, section_id) = seeded();
        let bulk = BulkAttendance {
            class_id,
            section_id,
            date: NaiveDate::from_ymd_opt(2026, 10, 12).unwrap(),
            records: vec![("ghost".to_string(), AttendanceStatus::Present)],
        };
        let err = db.write(|c| mark_attendance(c, &bulk)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Student ghost is not enrolled in this class & section"
        );
    }

    #[test]
    fn test_summary_counts_late_as_attended() {
        let summary = summarize_attendance(
            "s1",
            [
                AttendanceStatus::Present,
                AttendanceStatus::Late,
                AttendanceStatus::Absent,
            ],
        );
        assert_eq!(summary.total_days, 3);
        assert_eq!(summary.attendance_percentage, 66.67);

        let empty = summarize_attendance("s1", Vec::<AttendanceStatus>::new());
        assert_eq!(empty.attendance_percentage, 0.0);
    }
}
