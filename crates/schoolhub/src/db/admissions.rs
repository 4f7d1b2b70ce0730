//! Admission applications and their entrance exams.

use super::types::{ApplicationDetails, ApplicationStatus, DbAdmissionExam, DbApplication, NamedRef};
use super::{delete_by_id, row_exists};
use crate::error::{SchoolError, SchoolResult};
use crate::ids::{application_number, new_id};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

/// Maximum score an exam is marked out of when none is given
pub const DEFAULT_MAX_SCORE: f64 = 100.0;

#[derive(Debug, Clone)]
pub struct NewApplication {
    pub applicant_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub applying_for_class_id: String,
    pub guardian_name: String,
    pub guardian_phone: String,
}

#[derive(Debug, Clone)]
pub struct ExamRecord {
    pub exam_date: NaiveDate,
    pub score: Option<f64>,
    pub max_score: f64,
    pub remarks: Option<String>,
}

impl ExamRecord {
    pub fn check_score(&self) -> SchoolResult<()> {
        if self.max_score.is_nan() || self.max_score <= 0.0 {
            return Err(SchoolError::bad_request("maxScore must be greater than 0"));
        }
        match self.score {
            Some(score) if !(0.0..=self.max_score).contains(&score) => Err(SchoolError::bad_request(
                format!("score must be between 0 and {}", self.max_score),
            )),
            _ => Ok(()),
        }
    }
}

const APPLICATION_SELECT: &str = "
    SELECT a.id, a.application_no, a.applicant_name, a.date_of_birth,
           c.id, c.name, a.guardian_name, a.guardian_phone, a.status, a.created_at
    FROM admission_applications a
    JOIN classes c ON c.id = a.applying_for_class_id";

fn map_application(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbApplication> {
    Ok(DbApplication {
        id: row.get(0)?,
        application_no: row.get(1)?,
        applicant_name: row.get(2)?,
        date_of_birth: row.get(3)?,
        applying_for_class: NamedRef {
            id: row.get(4)?,
            name: row.get(5)?,
        },
        guardian_name: row.get(6)?,
        guardian_phone: row.get(7)?,
        status: row.get(8)?,
        created_at: row.get(9)?,
    })
}

pub fn create_application(
    conn: &Connection,
    new: &NewApplication,
    today: NaiveDate,
) -> SchoolResult<DbApplication> {
    if !row_exists(conn, "classes", &new.applying_for_class_id)? {
        return Err(SchoolError::not_found("Class not found"));
    }

    let id = new_id();
    let application_no = application_number(today);
    debug!("Filing admission application {}", application_no);
    conn.execute(
        "INSERT INTO admission_applications (
            id, application_no, applicant_name, date_of_birth, applying_for_class_id,
            guardian_name, guardian_phone, status, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, datetime('now'))",
        (
            &id,
            &application_no,
            &new.applicant_name,
            new.date_of_birth,
            &new.applying_for_class_id,
            &new.guardian_name,
            &new.guardian_phone,
            ApplicationStatus::Submitted,
        ),
    )?;
    require_application(conn, &id)
}

pub fn get_application(conn: &Connection, id: &str) -> SchoolResult<Option<DbApplication>> {
    let application = conn
        .query_row(
            &format!("{APPLICATION_SELECT} WHERE a.id = ?1"),
            [id],
            map_application,
        )
        .optional()?;
    Ok(application)
}

fn require_application(conn: &Connection, id: &str) -> SchoolResult<DbApplication> {
    get_application(conn, id)?.ok_or_else(|| SchoolError::not_found("Application not found"))
}

pub fn list_applications(
    conn: &Connection,
    status: Option<ApplicationStatus>,
) -> SchoolResult<Vec<DbApplication>> {
    let mut stmt = conn.prepare(&format!(
        "{APPLICATION_SELECT}
         WHERE ?1 IS NULL OR a.status = ?1
         ORDER BY a.created_at DESC, a.application_no DESC"
    ))?;
    let applications = stmt
        .query_map([status], map_application)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(applications)
}

pub fn set_application_status(
    conn: &Connection,
    id: &str,
    status: ApplicationStatus,
) -> SchoolResult<DbApplication> {
    let changed = conn.execute(
        "UPDATE admission_applications SET status = ?2 WHERE id = ?1",
        (id, status),
    )?;
    if changed == 0 {
        return Err(SchoolError::not_found("Application not found"));
    }
    require_application(conn, id)
}

/// Removes the application; its exam row goes with it
pub fn delete_application(conn: &Connection, id: &str) -> SchoolResult<()> {
    if !delete_by_id(conn, "admission_applications", id)? {
        return Err(SchoolError::not_found("Application not found"));
    }
    Ok(())
}

fn exam_for(conn: &Connection, application_id: &str) -> SchoolResult<Option<DbAdmissionExam>> {
    let exam = conn
        .query_row(
            "SELECT id, application_id, exam_date, score, max_score, remarks
             FROM admission_exams WHERE application_id = ?1",
            [application_id],
            |row| {
                Ok(DbAdmissionExam {
                    id: row.get(0)?,
                    application_id: row.get(1)?,
                    exam_date: row.get(2)?,
                    score: row.get(3)?,
                    max_score: row.get(4)?,
                    remarks: row.get(5)?,
                })
            },
        )
        .optional()?;
    Ok(exam)
}

/// Schedules or re-records the entrance exam for an application.
///
/// A freshly submitted application moves to `exam_scheduled`; later statuses are left alone.
pub fn record_exam(
    conn: &Connection,
    application_id: &str,
    exam: &ExamRecord,
) -> SchoolResult<ApplicationDetails> {
    exam.check_score()?;
    let application = require_application(conn, application_id)?;

    conn.execute(
        "INSERT INTO admission_exams (id, application_id, exam_date, score, max_score, remarks)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(application_id) DO UPDATE SET
            exam_date = excluded.exam_date,
            score = excluded.score,
            max_score = excluded.max_score,
            remarks = excluded.remarks",
        (
            new_id(),
            application_id,
            exam.exam_date,
            exam.score,
            exam.max_score,
            &exam.remarks,
        ),
    )?;

    if application.status == ApplicationStatus::Submitted {
        set_application_status(conn, application_id, ApplicationStatus::ExamScheduled)?;
    }
    application_details(conn, application_id)
}

pub fn application_details(conn: &Connection, id: &str) -> SchoolResult<ApplicationDetails> {
    let application = require_application(conn, id)?;
    let exam = exam_for(conn, id)?;
    Ok(ApplicationDetails { application, exam })
}
