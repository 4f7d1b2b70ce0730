//! Notices and complaints.

use super::delete_by_id;
use super::types::{ComplaintStatus, DbComplaint, DbNotice, NoticeAudience};
use crate::error::{SchoolError, SchoolResult};
use crate::ids::new_id;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};

// --- notices --------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NewNotice {
    pub title: String,
    pub body: String,
    pub audience: NoticeAudience,
    pub published_on: NaiveDate,
}

#[derive(Debug, Clone, Default)]
pub struct NoticeUpdate {
    pub title: Option<String>,
    pub body: Option<String>,
    pub audience: Option<NoticeAudience>,
    pub published_on: Option<NaiveDate>,
}

const NOTICE_COLUMNS: &str = "id, title, body, audience, published_on, created_at";

fn map_notice(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbNotice> {
    Ok(DbNotice {
        id: row.get(0)?,
        title: row.get(1)?,
        body: row.get(2)?,
        audience: row.get(3)?,
        published_on: row.get(4)?,
        created_at: row.get(5)?,
    })
}

pub fn create_notice(conn: &Connection, new: &NewNotice) -> SchoolResult<DbNotice> {
    let id = new_id();
    conn.execute(
        "INSERT INTO notices (id, title, body, audience, published_on, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, datetime('now'))",
        (&id, &new.title, &new.body, new.audience, new.published_on),
    )?;
    require_notice(conn, &id)
}

pub fn get_notice(conn: &Connection, id: &str) -> SchoolResult<Option<DbNotice>> {
    let notice = conn
        .query_row(
            &format!("SELECT {NOTICE_COLUMNS} FROM notices WHERE id = ?1"),
            [id],
            map_notice,
        )
        .optional()?;
    Ok(notice)
}

fn require_notice(conn: &Connection, id: &str) -> SchoolResult<DbNotice> {
    get_notice(conn, id)?.ok_or_else(|| SchoolError::not_found("Notice not found"))
}

/// Newest first. Filtering by an audience still includes notices addressed to everyone.
pub fn list_notices(conn: &Connection, audience: Option<NoticeAudience>) -> SchoolResult<Vec<DbNotice>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {NOTICE_COLUMNS} FROM notices
         WHERE ?1 IS NULL OR audience = ?1 OR audience = ?2
         ORDER BY published_on DESC, created_at DESC"
    ))?;
    let notices = stmt
        .query_map((audience, NoticeAudience::All), map_notice)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(notices)
}

pub fn update_notice(conn: &Connection, id: &str, update: &NoticeUpdate) -> SchoolResult<DbNotice> {
    let current = require_notice(conn, id)?;
    conn.execute(
        "UPDATE notices SET title = ?2, body = ?3, audience = ?4, published_on = ?5 WHERE id = ?1",
        (
            id,
            update.title.as_ref().unwrap_or(&current.title),
            update.body.as_ref().unwrap_or(&current.body),
            update.audience.unwrap_or(current.audience),
            update
                .published_on
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or(current.published_on),
        ),
    )?;
    require_notice(conn, id)
}

pub fn delete_notice(conn: &Connection, id: &str) -> SchoolResult<()> {
    if !delete_by_id(conn, "notices", id)? {
        return Err(SchoolError::not_found("Notice not found"));
    }
    Ok(())
}

// --- complaints -----------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NewComplaint {
    pub raised_by: String,
    pub subject: String,
    pub description: String,
}

const COMPLAINT_COLUMNS: &str = "id, raised_by, subject, description, status, created_at";

fn map_complaint(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbComplaint> {
    Ok(DbComplaint {
        id: row.get(0)?,
        raised_by: row.get(1)?,
        subject: row.get(2)?,
        description: row.get(3)?,
        status: row.get(4)?,
        created_at: row.get(5)?,
    })
}

pub fn create_complaint(conn: &Connection, new: &NewComplaint) -> SchoolResult<DbComplaint> {
    let id = new_id();
    conn.execute(
        "INSERT INTO complaints (id, raised_by, subject, description, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, datetime('now'))",
        (
            &id,
            &new.raised_by,
            &new.subject,
            &new.description,
            ComplaintStatus::Open,
        ),
    )?;
    require_complaint(conn, &id)
}

pub fn get_complaint(conn: &Connection, id: &str) -> SchoolResult<Option<DbComplaint>> {
    let complaint = conn
        .query_row(
            &format!("SELECT {COMPLAINT_COLUMNS} FROM complaints WHERE id = ?1"),
            [id],
            map_complaint,
        )
        .optional()?;
    Ok(complaint)
}

fn require_complaint(conn: &Connection, id: &str) -> SchoolResult<DbComplaint> {
    get_complaint(conn, id)?.ok_or_else(|| SchoolError::not_found("Complaint not found"))
}

pub fn list_complaints(conn: &Connection, status: Option<ComplaintStatus>) -> SchoolResult<Vec<DbComplaint>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COMPLAINT_COLUMNS} FROM complaints
         WHERE ?1 IS NULL OR status = ?1
         ORDER BY created_at DESC"
    ))?;
    let complaints = stmt
        .query_map([status], map_complaint)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(complaints)
}

pub fn set_complaint_status(conn: &Connection, id: &str, status: ComplaintStatus) -> SchoolResult<DbComplaint> {
    let changed = conn.execute("UPDATE complaints SET status = ?2 WHERE id = ?1", (id, status))?;
    if changed == 0 {
        return Err(SchoolError::not_found("Complaint not found"));
    }
    require_complaint(conn, id)
}

pub fn delete_complaint(conn: &Connection, id: &str) -> SchoolResult<()> {
    if !delete_by_id(conn, "complaints", id)? {
        return Err(SchoolError::not_found("Complaint not found"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SchoolDbManager;

    fn notice(title: &str, audience: NoticeAudience, day: u32) -> NewNotice {
        NewNotice {
            title: title.to_string(),
            body: "body".to_string(),
            audience,
            published_on: NaiveDate::from_ymd_opt(2026, 10, day).unwrap(),
        }
    }

    #[test]
    fn test_audience_filter_includes_all() {
        let db = SchoolDbManager::in_memory().unwrap();
        db.write(|c| {
            create_notice(c, &notice("holiday", NoticeAudience::All, 1))?;
            create_notice(c, &notice("staff meeting", NoticeAudience::Staff, 3))?;
            create_notice(c, &notice("sports day", NoticeAudience::Students, 2))?;
            Ok(())
        })
        .unwrap();

        let titles = |audience| {
            db.read(|c| list_notices(c, audience))
                .unwrap()
                .into_iter()
                .map(|n| n.title)
                .collect::<Vec<_>>()
        };
        assert_eq!(titles(Some(NoticeAudience::Students)), vec!["sports day", "holiday"]);
        assert_eq!(
            titles(None),
            vec!["staff meeting", "sports day", "holiday"]
        );
    }

    #[test]
    fn test_notice_update_keeps_unset_fields() {
        let db = SchoolDbManager::in_memory().unwrap();
        let created = db
            .write(|c| create_notice(c, &notice("exams", NoticeAudience::Parents, 5)))
            .unwrap();
        let update = NoticeUpdate {
            title: Some("final exams".to_string()),
            ..NoticeUpdate::default()
        };
        let updated = db.write(|c| update_notice(c, &created.id, &update)).unwrap();
        assert_eq!(updated.title, "final exams");
        assert_eq!(updated.audience, NoticeAudience::Parents);
        assert_eq!(updated.published_on, "2026-10-05");
    }

    #[test]
    fn test_complaint_lifecycle() {
        let db = SchoolDbManager::in_memory().unwrap();
        let complaint = db
            .write(|c| {
                create_complaint(
                    c,
                    &NewComplaint {
                        raised_by: "Parent of Ada".to_string(),
                        subject: "Bus".to_string(),
                        description: "Bus was late".to_string(),
                    },
                )
            })
            .unwrap();
        assert_eq!(complaint.status, ComplaintStatus::Open);

        db.write(|c| set_complaint_status(c, &complaint.id, ComplaintStatus::Resolved))
            .unwrap();
        let open = db
            .read(|c| list_complaints(c, Some(ComplaintStatus::Open)))
            .unwrap();
        assert!(open.is_empty());

        db.write(|c| delete_complaint(c, &complaint.id)).unwrap();
        let err = db.write(|c| delete_complaint(c, &complaint.id)).unwrap_err();
        assert!(matches!(err, SchoolError::NotFound(_)));
    }
}
