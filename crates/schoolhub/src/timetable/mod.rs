//! Timetable entries: validated creation, listing and weekly schedule views.
//!
//! Creation rejects an entry that would double-book its class/section or its
//! teacher on the same day. The membership and clash checks and the insert all
//! run in one store transaction, so two racing requests cannot both pass.

mod time;

pub use time::{format_minutes, overlaps, parse_time_of_day, TimeParseError};

use crate::db::academics::ensure_class_section;
use crate::db::staff::{find_assignment_for, staff_ref};
use crate::db::timetable::{self as store, TimetableFilter};
use crate::db::{
    academics, DbTimetableEntry, PopulatedTimetableEntry, SchoolDbManager, Weekday,
};
use crate::error::{SchoolError, SchoolResult};
use crate::ids::new_id;
use crate::validation::{optional_text, FieldCheck};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Body of `POST /api/timetables`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTimetableEntry {
    pub class_id: Option<String>,
    pub section_id: Option<String>,
    pub subject_group_id: Option<String>,
    pub day: Option<String>,
    pub subject_id: Option<String>,
    pub teacher_id: Option<String>,
    pub time_from: Option<String>,
    pub time_to: Option<String>,
    pub room_no: Option<String>,
}

/// A request that passed the presence and time checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedEntry {
    pub class_id: String,
    pub section_id: String,
    pub subject_group_id: String,
    pub day: Weekday,
    pub subject_id: String,
    pub teacher_id: String,
    /// Minutes since midnight
    pub start: u16,
    pub end: u16,
    pub room_no: Option<String>,
}

impl CreateTimetableEntry {
    /// Field presence, weekday name, and time range checks. Touches no storage.
    pub fn validate(&self) -> SchoolResult<ValidatedEntry> {
        let mut check = FieldCheck::new();
        let class_id = check.text("classId", &self.class_id);
        let section_id = check.text("sectionId", &self.section_id);
        let subject_group_id = check.text("subjectGroupId", &self.subject_group_id);
        let day = check.text("day", &self.day);
        let subject_id = check.text("subjectId", &self.subject_id);
        let teacher_id = check.text("teacherId", &self.teacher_id);
        let time_from = check.text("timeFrom", &self.time_from);
        let time_to = check.text("timeTo", &self.time_to);
        check.finish()?;

        let day: Weekday = day
            .parse()
            .map_err(|bad: String| SchoolError::bad_request(format!("Invalid day: {bad}")))?;

        let start = parse_time_of_day(&time_from).map_err(|e| SchoolError::bad_request(e.to_string()))?;
        let end = parse_time_of_day(&time_to).map_err(|e| SchoolError::bad_request(e.to_string()))?;
        if start >= end {
            return Err(SchoolError::bad_request(
                "timeFrom must be earlier than timeTo",
            ));
        }

        Ok(ValidatedEntry {
            class_id,
            section_id,
            subject_group_id,
            day,
            subject_id,
            teacher_id,
            start,
            end,
            room_no: optional_text(&self.room_no),
        })
    }
}

/// Validates and stores a new timetable entry, returning it with names populated.
pub fn create_entry(
    db: &SchoolDbManager,
    request: &CreateTimetableEntry,
) -> SchoolResult<PopulatedTimetableEntry> {
    let entry = request.validate()?;
    let created = db.write(|conn| insert_checked(conn, &entry))?;
    info!(
        "Scheduled {} {}-{} for class {} section {} with teacher {}",
        created.day,
        created.time_from,
        created.time_to,
        created.class.name,
        created.section.name,
        created.teacher.name
    );
    Ok(created)
}

fn insert_checked(conn: &Connection, entry: &ValidatedEntry) -> SchoolResult<PopulatedTimetableEntry> {
    let group = academics::get_subject_group(conn, &entry.subject_group_id)?
        .ok_or_else(|| SchoolError::not_found("Subject Group not found"))?;
    if group.class.id != entry.class_id {
        return Err(SchoolError::bad_request(
            "Subject Group does not belong to this Class",
        ));
    }
    if !group.has_section(&entry.section_id) {
        return Err(SchoolError::bad_request(
            "Section does not belong to this Subject Group",
        ));
    }
    if !group.has_subject(&entry.subject_id) {
        return Err(SchoolError::bad_request(
            "Subject does not belong to this Subject Group",
        ));
    }

    let assignment = find_assignment_for(conn, &entry.class_id, &entry.section_id)?
        .ok_or_else(|| SchoolError::not_found("No teachers assigned to this class & section"))?;
    if !assignment.has_teacher(&entry.teacher_id) {
        return Err(SchoolError::bad_request(
            "Teacher is not assigned to this class & section",
        ));
    }

    let class_day = store::entries_for_class_day(conn, &entry.class_id, &entry.section_id, entry.day)?;
    if let Some(clash) = first_clash(&class_day, entry.start, entry.end)? {
        debug!("Class/section clash with entry {}", clash.id);
        return Err(SchoolError::conflict(
            "Time overlaps with another period for this class/section",
        ));
    }

    let teacher_day = store::entries_for_teacher_day(conn, &entry.teacher_id, entry.day)?;
    if let Some(clash) = first_clash(&teacher_day, entry.start, entry.end)? {
        debug!("Teacher clash with entry {}", clash.id);
        return Err(SchoolError::conflict(
            "Teacher has another class at this time",
        ));
    }

    let row = DbTimetableEntry {
        id: new_id(),
        class_id: entry.class_id.clone(),
        section_id: entry.section_id.clone(),
        subject_group_id: entry.subject_group_id.clone(),
        day: entry.day,
        subject_id: entry.subject_id.clone(),
        teacher_id: entry.teacher_id.clone(),
        time_from: format_minutes(entry.start),
        time_to: format_minutes(entry.end),
        room_no: entry.room_no.clone(),
    };
    store::insert_entry(conn, &row)?;

    store::get_populated(conn, &row.id)?
        .ok_or_else(|| SchoolError::Internal("timetable entry vanished after insert".to_string()))
}

/// The first stored entry whose interval overlaps `[start, end)`.
fn first_clash(
    existing: &[DbTimetableEntry],
    start: u16,
    end: u16,
) -> SchoolResult<Option<&DbTimetableEntry>> {
    for other in existing {
        let other_start = parse_time_of_day(&other.time_from)
            .map_err(|e| SchoolError::Internal(format!("stored entry {}: {e}", other.id)))?;
        let other_end = parse_time_of_day(&other.time_to)
            .map_err(|e| SchoolError::Internal(format!("stored entry {}: {e}", other.id)))?;
        if overlaps(start, end, other_start, other_end) {
            return Ok(Some(other));
        }
    }
    Ok(None)
}

pub fn list_entries(
    db: &SchoolDbManager,
    filter: &TimetableFilter,
) -> SchoolResult<Vec<PopulatedTimetableEntry>> {
    db.read(|conn| store::list_populated(conn, filter))
}

pub fn get_entry(db: &SchoolDbManager, id: &str) -> SchoolResult<PopulatedTimetableEntry> {
    db.read(|conn| store::get_populated(conn, id))?
        .ok_or_else(|| SchoolError::not_found("Timetable entry not found"))
}

/// Removes an entry. A second delete of the same id is a 404.
pub fn delete_entry(db: &SchoolDbManager, id: &str) -> SchoolResult<()> {
    if db.write(|conn| store::delete_entry(conn, id))? {
        Ok(())
    } else {
        Err(SchoolError::not_found("Timetable entry not found"))
    }
}

/// One weekday's periods, in start-time order
#[derive(Debug, Clone, Serialize)]
pub struct DaySchedule {
    pub day: Weekday,
    pub periods: Vec<PopulatedTimetableEntry>,
}

/// Groups entries already sorted in week order; days without periods are left out.
pub fn group_by_day(entries: Vec<PopulatedTimetableEntry>) -> Vec<DaySchedule> {
    let mut days: Vec<DaySchedule> = Vec::new();
    for entry in entries {
        match days.last_mut() {
            Some(current) if current.day == entry.day => current.periods.push(entry),
            _ => days.push(DaySchedule {
                day: entry.day,
                periods: vec![entry],
            }),
        }
    }
    days
}

/// Weekly schedule of one class/section
pub fn class_schedule(
    db: &SchoolDbManager,
    class_id: &str,
    section_id: &str,
) -> SchoolResult<Vec<DaySchedule>> {
    let entries = db.read(|conn| {
        ensure_class_section(conn, class_id, section_id)?;
        store::list_populated(
            conn,
            &TimetableFilter {
                class_id: Some(class_id.to_string()),
                section_id: Some(section_id.to_string()),
                ..TimetableFilter::default()
            },
        )
    })?;
    Ok(group_by_day(entries))
}

/// Weekly schedule of one teacher across all classes
pub fn teacher_schedule(db: &SchoolDbManager, teacher_id: &str) -> SchoolResult<Vec<DaySchedule>> {
    let entries = db.read(|conn| {
        if staff_ref(conn, teacher_id)?.is_none() {
            return Err(SchoolError::not_found("Teacher not found"));
        }
        store::list_populated(
            conn,
            &TimetableFilter {
                teacher_id: Some(teacher_id.to_string()),
                ..TimetableFilter::default()
            },
        )
    })?;
    Ok(group_by_day(entries))
}
