use super::count_where;
use super::types::{
    ApplicationStatus, AttendanceStatus, ComplaintStatus, DashboardSummary, StaffRole, TodayAttendance,
};
use crate::error::SchoolResult;
use chrono::NaiveDate;
use rusqlite::Connection;

fn count_all(conn: &Connection, table: &'static str) -> SchoolResult<i64> {
    let count = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
    Ok(count)
}

fn attendance_on(conn: &Connection, date: NaiveDate) -> SchoolResult<TodayAttendance> {
    let mut today = TodayAttendance {
        date: date.format("%Y-%m-%d").to_string(),
        ..TodayAttendance::default()
    };
    let mut stmt = conn.prepare(
        "SELECT status, COUNT(*) FROM attendance_records WHERE date = ?1 GROUP BY status",
    )?;
    let rows = stmt
        .query_map([date], |row| Ok((row.get::<_, AttendanceStatus>(0)?, row.get::<_, i64>(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    for (status, count) in rows {
        match status {
            AttendanceStatus::Present => today.present = count,
            AttendanceStatus::Absent => today.absent = count,
            AttendanceStatus::Late => today.late = count,
            AttendanceStatus::Excused => today.excused = count,
        }
    }
    Ok(today)
}

/// Headline counts for the admin dashboard, with attendance for `today`
pub fn summary(conn: &Connection, today: NaiveDate) -> SchoolResult<DashboardSummary> {
    let pending_applications = count_where(
        conn,
        "admission_applications",
        "status",
        ApplicationStatus::Submitted.as_str(),
    )? + count_where(
        conn,
        "admission_applications",
        "status",
        ApplicationStatus::ExamScheduled.as_str(),
    )?;

    Ok(DashboardSummary {
        students: count_all(conn, "students")?,
        staff: count_all(conn, "staff")?,
        teachers: count_where(conn, "staff", "role", StaffRole::Teacher.as_str())?,
        classes: count_all(conn, "classes")?,
        sections: count_all(conn, "sections")?,
        subjects: count_all(conn, "subjects")?,
        timetable_entries: count_all(conn, "timetable_entries")?,
        open_complaints: count_where(conn, "complaints", "status", ComplaintStatus::Open.as_str())?,
        pending_applications,
        attendance_today: attendance_on(conn, today)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::staff::{create_staff, NewStaff};
    use crate::db::SchoolDbManager;

    #[test]
    fn test_empty_store_summary() {
        let db = SchoolDbManager::in_memory().unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let summary = db.read(|c| summary(c, today)).unwrap();
        assert_eq!(summary.students, 0);
        assert_eq!(summary.attendance_today.date, "2026-10-18");
        assert_eq!(summary.attendance_today.present, 0);
    }

    #[test]
    fn test_teachers_are_counted_separately() {
        let db = SchoolDbManager::in_memory().unwrap();
        db.write(|c| {
            for (email, role) in [("t@school.test", StaffRole::Teacher), ("a@school.test", StaffRole::Admin)] {
                create_staff(
                    c,
                    &NewStaff {
                        first_name: "Sam".to_string(),
                        last_name: "Staff".to_string(),
                        email: email.to_string(),
                        phone: None,
                        role,
                    },
                )?;
            }
            Ok(())
        })
        .unwrap();

        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let summary = db.read(|c| summary(c, today)).unwrap();
        assert_eq!(summary.staff, 2);
        assert_eq!(summary.teachers, 1);
    }
}
