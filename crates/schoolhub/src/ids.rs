//! Identifier generation for stored records.

use chrono::NaiveDate;
use uuid::Uuid;

/// A fresh record id.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Admission application number, e.g. `APP-20261018-9f3a1c2b`.
///
/// The random suffix keeps numbers distinct for applications filed in the same instant.
pub fn application_number(today: NaiveDate) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("APP-{}-{}", today.format("%Y%m%d"), &suffix[..8])
}
