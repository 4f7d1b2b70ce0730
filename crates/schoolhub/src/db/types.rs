/// Database types for school records
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// Declares a closed set of values stored as TEXT, parsed case-insensitively.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| s.to_string())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|bad: String| FromSqlError::Other(format!("unknown {}: {}", stringify!($name), bad).into()))
            }
        }
    };
}

text_enum!(
    /// Day of the week a timetable period repeats on
    Weekday {
        Monday => "Monday",
        Tuesday => "Tuesday",
        Wednesday => "Wednesday",
        Thursday => "Thursday",
        Friday => "Friday",
        Saturday => "Saturday",
        Sunday => "Sunday",
    }
);

impl Weekday {
    /// Position in the week, Monday first.
    pub fn ordinal(&self) -> usize {
        Weekday::ALL.iter().position(|d| d == self).unwrap_or(0)
    }

    pub fn from_chrono(day: chrono::Weekday) -> Self {
        Weekday::ALL[day.num_days_from_monday() as usize]
    }
}

text_enum!(
    SubjectType {
        Theory => "theory",
        Practical => "practical",
    }
);

text_enum!(
    StaffRole {
        Teacher => "teacher",
        Admin => "admin",
        Accountant => "accountant",
        Librarian => "librarian",
        Other => "other",
    }
);

text_enum!(
    AttendanceStatus {
        Present => "present",
        Absent => "absent",
        Late => "late",
        Excused => "excused",
    }
);

text_enum!(
    NoticeAudience {
        All => "all",
        Staff => "staff",
        Students => "students",
        Parents => "parents",
    }
);

text_enum!(
    ComplaintStatus {
        Open => "open",
        InProgress => "in_progress",
        Resolved => "resolved",
    }
);

text_enum!(
    ApplicationStatus {
        Submitted => "submitted",
        ExamScheduled => "exam_scheduled",
        Accepted => "accepted",
        Rejected => "rejected",
    }
);

/// A referenced record reduced to what a listing needs to display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectRef {
    pub id: String,
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbSection {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbClass {
    pub id: String,
    pub name: String,
    /// Sections in their configured order
    pub sections: Vec<NamedRef>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbSubject {
    pub id: String,
    pub name: String,
    pub code: String,
    #[serde(rename = "type")]
    pub subject_type: SubjectType,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbSubjectGroup {
    pub id: String,
    pub name: String,
    pub class: NamedRef,
    pub sections: Vec<NamedRef>,
    pub subjects: Vec<SubjectRef>,
    pub created_at: String,
}

impl DbSubjectGroup {
    pub fn has_section(&self, section_id: &str) -> bool {
        self.sections.iter().any(|s| s.id == section_id)
    }

    pub fn has_subject(&self, subject_id: &str) -> bool {
        self.subjects.iter().any(|s| s.id == subject_id)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbStaff {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: StaffRole,
    pub created_at: String,
}

impl DbStaff {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbTeacherAssignment {
    pub id: String,
    pub class: NamedRef,
    pub section: NamedRef,
    pub teachers: Vec<NamedRef>,
    pub class_teacher: NamedRef,
    pub created_at: String,
}

impl DbTeacherAssignment {
    pub fn has_teacher(&self, teacher_id: &str) -> bool {
        self.teachers.iter().any(|t| t.id == teacher_id)
    }
}

/// A timetable row as stored: ids only
#[derive(Debug, Clone)]
pub struct DbTimetableEntry {
    pub id: String,
    pub class_id: String,
    pub section_id: String,
    pub subject_group_id: String,
    pub day: Weekday,
    pub subject_id: String,
    pub teacher_id: String,
    pub time_from: String,
    pub time_to: String,
    pub room_no: Option<String>,
}

/// A timetable row with the names of everything it references
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedTimetableEntry {
    pub id: String,
    pub class: NamedRef,
    pub section: NamedRef,
    pub subject_group: NamedRef,
    pub subject: SubjectRef,
    pub teacher: NamedRef,
    pub day: Weekday,
    pub time_from: String,
    pub time_to: String,
    pub room_no: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbStudent {
    pub id: String,
    pub admission_no: String,
    pub first_name: String,
    pub last_name: String,
    pub class: NamedRef,
    pub section: NamedRef,
    pub roll_number: Option<String>,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    pub username: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbAttendance {
    pub id: String,
    pub student: NamedRef,
    pub class_id: String,
    pub section_id: String,
    pub date: String,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub student_id: String,
    pub total_days: u32,
    pub present: u32,
    pub absent: u32,
    pub late: u32,
    pub excused: u32,
    /// (present + late) / total, as a percentage rounded to two decimals
    pub attendance_percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbNotice {
    pub id: String,
    pub title: String,
    pub body: String,
    pub audience: NoticeAudience,
    pub published_on: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbComplaint {
    pub id: String,
    pub raised_by: String,
    pub subject: String,
    pub description: String,
    pub status: ComplaintStatus,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbApplication {
    pub id: String,
    pub application_no: String,
    pub applicant_name: String,
    pub date_of_birth: Option<String>,
    pub applying_for_class: NamedRef,
    pub guardian_name: String,
    pub guardian_phone: String,
    pub status: ApplicationStatus,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbAdmissionExam {
    pub id: String,
    pub application_id: String,
    pub exam_date: String,
    pub score: Option<f64>,
    pub max_score: f64,
    pub remarks: Option<String>,
}

/// An application merged with its entrance exam, if one was scheduled
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDetails {
    #[serde(flatten)]
    pub application: DbApplication,
    pub exam: Option<DbAdmissionExam>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub students: i64,
    pub staff: i64,
    pub teachers: i64,
    pub classes: i64,
    pub sections: i64,
    pub subjects: i64,
    pub timetable_entries: i64,
    pub open_complaints: i64,
    pub pending_applications: i64,
    pub attendance_today: TodayAttendance,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayAttendance {
    pub date: String,
    pub present: i64,
    pub absent: i64,
    pub late: i64,
    pub excused: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekday_parse_is_case_insensitive() {
        assert_eq!("monday".parse::<Weekday>(), Ok(Weekday::Monday));
        assert_eq!(" FRIDAY ".parse::<Weekday>(), Ok(Weekday::Friday));
        assert!("Funday".parse::<Weekday>().is_err());
    }

    #[test]
    fn test_weekday_ordinal_and_chrono() {
        assert_eq!(Weekday::Monday.ordinal(), 0);
        assert_eq!(Weekday::Sunday.ordinal(), 6);
        assert_eq!(Weekday::from_chrono(chrono::Weekday::Wed), Weekday::Wednesday);
    }

    #[test]
    fn test_enum_serializes_as_stored_text() {
        let json = serde_json::to_string(&ComplaintStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        assert_eq!(ComplaintStatus::InProgress.as_str(), "in_progress");
    }
}
