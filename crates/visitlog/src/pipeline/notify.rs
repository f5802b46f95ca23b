//! Confirmation mail and follow-up reminder content.

use chrono::{Duration, FixedOffset};

use crate::model::VisitRecord;
use crate::services::FollowUpReminder;

use super::row::TIMESTAMP_FORMAT;

pub const FOLLOW_UP_MINUTES: i64 = 30;

const TRACKER_TITLE: &str = "Live Visits Tracker AY 25-26";
const LABEL_STYLE: &str =
    "padding: 8px; border: 1px solid #dddddd; background-color: #f2f2f2; font-weight: bold;";
const VALUE_STYLE: &str = "padding: 8px; border: 1px solid #dddddd;";
const CALENDAR_NOTE: &str = "You will receive a separate calendar invitation for this follow-up. \
Please accept it to add the event to your calendar.";

pub(crate) fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationEmail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

impl ConfirmationEmail {
    pub fn render(record: &VisitRecord, offset: FixedOffset) -> Self {
        let mut rows = String::new();
        let mut row = |label: &str, value: &str| {
            rows.push_str(&format!(
                "<tr><td style=\"{}\">{}</td><td style=\"{}\">{}</td></tr>",
                LABEL_STYLE,
                label,
                VALUE_STYLE,
                escape_html(value)
            ));
        };

        row("Submission ID", &record.submission_id);
        row("Employee Email ID", &record.user_email);
        row("School Name", &record.school);
        row("Meeting SPOC", &record.contact.display());
        for (index, label) in ["Co-Visitor 1", "Co-Visitor 2"].into_iter().enumerate() {
            let co_visitor = record.co_visitor(index);
            if !co_visitor.is_empty() {
                row(label, co_visitor);
            }
        }
        if !record.remarks.is_empty() {
            row("Remarks", &record.remarks);
        }
        if let Some(at) = record.follow_up {
            let when = at.with_timezone(&offset).format(TIMESTAMP_FORMAT).to_string();
            row("Follow Up Date", &when);
            rows.push_str(&format!(
                "<tr><td colspan=\"2\" style=\"padding: 10px; text-align: center; \
                 font-style: italic; color: #555;\">{}</td></tr>",
                CALENDAR_NOTE
            ));
        }

        let html_body = format!(
            "<html><body><p>Hi,</p><p>Thank you for logging your visit. Here is a summary of \
             your submission:</p><table style=\"width: 100%; border-collapse: collapse; \
             font-family: Arial, sans-serif;\"><tr style=\"background-color: #4a86e8; color: \
             white;\"><th colspan=\"2\" style=\"padding: 12px;\">{}</th></tr>{}</table></body></html>",
            TRACKER_TITLE, rows
        );

        Self {
            to: record.user_email.clone(),
            subject: format!(
                "Visit Confirmation: {} - {}",
                record.school, record.submission_id
            ),
            html_body,
        }
    }
}

/// The reminder for a record's follow-up, if it has one.
pub fn follow_up_reminder(record: &VisitRecord, offset: FixedOffset) -> Option<FollowUpReminder> {
    let start = record.follow_up?;
    let logged_on = record.submitted_at.with_timezone(&offset).format("%d/%m/%Y");
    let description = format!(
        "Follow-up for visit logged on {}.\nSPOC: {}\nRemarks: {}\nSubmission ID: {}",
        logged_on,
        record.contact.display(),
        record.remarks,
        record.submission_id
    );

    Some(FollowUpReminder {
        title: format!("Follow-up: {}", record.school),
        description,
        start,
        end: start + Duration::minutes(FOLLOW_UP_MINUTES),
        attendee: record.user_email.clone(),
    })
}
