//! Request field checks shared by every create/update operation.

use crate::error::{SchoolError, SchoolResult};
use chrono::NaiveDate;
use std::str::FromStr;

/// Collects required fields that are absent or blank, so one error can name all of them.
#[derive(Debug, Default)]
pub struct FieldCheck {
    missing: Vec<&'static str>,
}

impl FieldCheck {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the trimmed value, recording `name` as missing if it is absent or blank.
    pub fn text(&mut self, name: &'static str, value: &Option<String>) -> String {
        match optional_text(value) {
            Some(v) => v,
            None => {
                self.missing.push(name);
                String::new()
            }
        }
    }

    /// Returns the non-blank entries, recording `name` as missing if there are none.
    pub fn list(&mut self, name: &'static str, value: &Option<Vec<String>>) -> Vec<String> {
        let items = optional_list(value);
        if items.is_empty() {
            self.missing.push(name);
        }
        items
    }

    pub fn finish(self) -> SchoolResult<()> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(SchoolError::bad_request(format!(
                "Missing required fields: {}",
                self.missing.join(", ")
            )))
        }
    }
}

/// Trimmed value, with blank treated the same as absent.
pub fn optional_text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Trimmed, non-blank entries with duplicates removed (first occurrence kept).
pub fn optional_list(value: &Option<Vec<String>>) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    for raw in value.iter().flatten() {
        let item = raw.trim();
        if !item.is_empty() && !items.iter().any(|seen| seen == item) {
            items.push(item.to_string());
        }
    }
    items
}

/// Parses one of a closed set of values, e.g. a role or a status.
pub fn parse_choice<T>(field: &str, value: &str) -> SchoolResult<T>
where
    T: FromStr<Err = String>,
{
    value
        .parse()
        .map_err(|_| SchoolError::bad_request(format!("Invalid {field}: {value}")))
}

/// Parses an ISO `YYYY-MM-DD` date.
pub fn parse_date(field: &str, value: &str) -> SchoolResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| SchoolError::bad_request(format!("Invalid {field}: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::StaffRole;

    #[test]
    fn test_missing_fields_are_listed_in_order() {
        let mut check = FieldCheck::new();
        let a = check.text("classId", &Some("c1".to_string()));
        check.text("sectionId", &None);
        check.text("day", &Some("   ".to_string()));
        check.list("teacherIds", &Some(vec![" ".to_string()]));
        assert_eq!(a, "c1");

        let err = check.finish().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required fields: sectionId, day, teacherIds"
        );
    }

    #[test]
    fn test_list_dedups_and_trims() {
        let items = optional_list(&Some(vec![
            " t1".to_string(),
            "t2".to_string(),
            "t1".to_string(),
        ]));
        assert_eq!(items, vec!["t1", "t2"]);
    }

    #[test]
    fn test_parse_choice_and_date() {
        let role: StaffRole = parse_choice("role", "Teacher").unwrap();
        assert_eq!(role, StaffRole::Teacher);
        assert_eq!(
            parse_choice::<StaffRole>("role", "janitor").unwrap_err().to_string(),
            "Invalid role: janitor"
        );
        assert!(parse_date("date", "2026-10-18").is_ok());
        assert!(parse_date("date", "18/10/2026").is_err());
    }
}
