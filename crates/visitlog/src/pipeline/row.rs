//! Spreadsheet row layout (columns A through W).

use chrono::FixedOffset;

use crate::model::VisitRecord;
use crate::validation::FOLLOW_UP_FORMAT;

pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y, %H:%M:%S";

pub const COLUMN_COUNT: usize = 23;

/// The record as one sheet row. The timestamp is rendered in `offset`;
/// missing values become empty cells.
pub fn sheet_row(record: &VisitRecord, offset: FixedOffset) -> Vec<String> {
    let (latitude, longitude) = record
        .coordinates
        .map(|c| (c.latitude.to_string(), c.longitude.to_string()))
        .unwrap_or_default();
    let follow_up = record
        .follow_up
        .map(|at| at.with_timezone(&offset).format(FOLLOW_UP_FORMAT).to_string())
        .unwrap_or_default();

    vec![
        record
            .submitted_at
            .with_timezone(&offset)
            .format(TIMESTAMP_FORMAT)
            .to_string(),
        record.submission_id.clone(),
        latitude,
        longitude,
        record.address.as_text().to_string(),
        record.user_email.clone(),
        record.rm_email.clone(),
        record.zm_email.clone(),
        record.state.clone(),
        record.district.clone(),
        record.school.clone(),
        record.outcome.clone(),
        record.skus_text(),
        record.contact.kind.label().to_string(),
        record.contact.designation.clone(),
        record.contact.name.clone(),
        record.contact.phone.clone(),
        record.contact.email.clone(),
        record.co_visitor(0).to_string(),
        record.co_visitor(1).to_string(),
        record.remarks.clone(),
        record.photo_url.as_text().to_string(),
        follow_up,
    ]
}
