//! Timetable entry storage and the populated read model.

use super::types::{DbTimetableEntry, NamedRef, PopulatedTimetableEntry, SubjectRef, Weekday};
use super::delete_by_id;
use crate::error::SchoolResult;
use rusqlite::{Connection, OptionalExtension};

/// Optional filters for listing timetable entries
#[derive(Debug, Clone, Default)]
pub struct TimetableFilter {
    pub class_id: Option<String>,
    pub section_id: Option<String>,
    pub teacher_id: Option<String>,
    pub day: Option<Weekday>,
}

const ENTRY_COLUMNS: &str =
    "id, class_id, section_id, subject_group_id, day, subject_id, teacher_id, time_from, time_to, room_no";

fn map_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbTimetableEntry> {
    Ok(DbTimetableEntry {
        id: row.get(0)?,
        class_id: row.get(1)?,
        section_id: row.get(2)?,
        subject_group_id: row.get(3)?,
        day: row.get(4)?,
        subject_id: row.get(5)?,
        teacher_id: row.get(6)?,
        time_from: row.get(7)?,
        time_to: row.get(8)?,
        room_no: row.get(9)?,
    })
}

pub fn insert_entry(conn: &Connection, entry: &DbTimetableEntry) -> SchoolResult<()> {
    conn.execute(
        "INSERT INTO timetable_entries (
            id, class_id, section_id, subject_group_id, day, subject_id,
            teacher_id, time_from, time_to, room_no, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, datetime('now'))",
        (
            &entry.id,
            &entry.class_id,
            &entry.section_id,
            &entry.subject_group_id,
            entry.day,
            &entry.subject_id,
            &entry.teacher_id,
            &entry.time_from,
            &entry.time_to,
            &entry.room_no,
        ),
    )?;
    Ok(())
}

/// Entries already scheduled for a class/section on one day
pub fn entries_for_class_day(
    conn: &Connection,
    class_id: &str,
    section_id: &str,
    day: Weekday,
) -> SchoolResult<Vec<DbTimetableEntry>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS} FROM timetable_entries
         WHERE class_id = ?1 AND section_id = ?2 AND day = ?3"
    ))?;
    let entries = stmt
        .query_map((class_id, section_id, day), map_entry)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(entries)
}

/// Entries a teacher already has on one day, across every class
pub fn entries_for_teacher_day(
    conn: &Connection,
    teacher_id: &str,
    day: Weekday,
) -> SchoolResult<Vec<DbTimetableEntry>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS} FROM timetable_entries
         WHERE teacher_id = ?1 AND day = ?2"
    ))?;
    let entries = stmt
        .query_map((teacher_id, day), map_entry)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(entries)
}

const POPULATED_SELECT: &str = "
    SELECT e.id,
           c.id, c.name,
           s.id, s.name,
           g.id, g.name,
           sub.id, sub.name, sub.code,
           t.id, t.first_name || ' ' || t.last_name,
           e.day, e.time_from, e.time_to, e.room_no
    FROM timetable_entries e
    JOIN classes c ON c.id = e.class_id
    JOIN sections s ON s.id = e.section_id
    JOIN subject_groups g ON g.id = e.subject_group_id
    JOIN subjects sub ON sub.id = e.subject_id
    JOIN staff t ON t.id = e.teacher_id";

fn map_populated(row: &rusqlite::Row<'_>) -> rusqlite::Result<PopulatedTimetableEntry> {
    Ok(PopulatedTimetableEntry {
        id: row.get(0)?,
        class: NamedRef {
            id: row.get(1)?,
            name: row.get(2)?,
        },
        section: NamedRef {
            id: row.get(3)?,
            name: row.get(4)?,
        },
        subject_group: NamedRef {
            id: row.get(5)?,
            name: row.get(6)?,
        },
        subject: SubjectRef {
            id: row.get(7)?,
            name: row.get(8)?,
            code: row.get(9)?,
        },
        teacher: NamedRef {
            id: row.get(10)?,
            name: row.get(11)?,
        },
        day: row.get(12)?,
        time_from: row.get(13)?,
        time_to: row.get(14)?,
        room_no: row.get(15)?,
    })
}

pub fn get_populated(conn: &Connection, id: &str) -> SchoolResult<Option<PopulatedTimetableEntry>> {
    let entry = conn
        .query_row(
            &format!("{POPULATED_SELECT} WHERE e.id = ?1"),
            [id],
            map_populated,
        )
        .optional()?;
    Ok(entry)
}

/// Lists entries matching `filter`, in week order then by start time
pub fn list_populated(
    conn: &Connection,
    filter: &TimetableFilter,
) -> SchoolResult<Vec<PopulatedTimetableEntry>> {
    let mut stmt = conn.prepare(&format!(
        "{POPULATED_SELECT}
         WHERE (?1 IS NULL OR e.class_id = ?1)
           AND (?2 IS NULL OR e.section_id = ?2)
           AND (?3 IS NULL OR e.teacher_id = ?3)
           AND (?4 IS NULL OR e.day = ?4)"
    ))?;
    let mut entries = stmt
        .query_map(
            (
                &filter.class_id,
                &filter.section_id,
                &filter.teacher_id,
                filter.day,
            ),
            map_populated,
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    // "HH:MM" is stored zero-padded, so text order is time order
    entries.sort_by(|a, b| {
        (a.day.ordinal(), &a.time_from, &a.class.name, &a.section.name).cmp(&(
            b.day.ordinal(),
            &b.time_from,
            &b.class.name,
            &b.section.name,
        ))
    });
    Ok(entries)
}

pub fn delete_entry(conn: &Connection, id: &str) -> SchoolResult<bool> {
    delete_by_id(conn, "timetable_entries", id)
}
