//! Follow-up reminders on Google Calendar v3.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde_json::{json, Value};

use crate::auth::TokenManager;
use crate::config::ApiEndpoints;

use super::error::Result;
use super::http::{ensure_success, join_segments, send_error};
use super::CalendarScheduler;

const SERVICE: &str = "calendar";

/// A calendar event reminding the requester to follow up on a visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowUpReminder {
    pub title: String,
    pub description: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub attendee: String,
}

impl FollowUpReminder {
    fn to_event(&self) -> Value {
        json!({
            "summary": self.title,
            "description": self.description,
            "start": { "dateTime": self.start.to_rfc3339() },
            "end": { "dateTime": self.end.to_rfc3339() },
            "attendees": [{ "email": self.attendee }],
        })
    }
}

pub struct GoogleCalendar {
    client: Client,
    api: String,
    tokens: TokenManager,
}

impl GoogleCalendar {
    pub fn new(client: Client, endpoints: &ApiEndpoints, tokens: TokenManager) -> Self {
        Self {
            client,
            api: endpoints.calendar.clone(),
            tokens,
        }
    }
}

#[async_trait]
impl CalendarScheduler for GoogleCalendar {
    async fn schedule(&self, calendar_id: &str, reminder: &FollowUpReminder) -> Result<()> {
        let token = self.tokens.get_valid_token().await?;
        let url = join_segments(SERVICE, &self.api, &["calendars", calendar_id, "events"])?;

        let response = self
            .client
            .post(url)
            .query(&[("sendUpdates", "all")])
            .bearer_auth(token.expose_secret())
            .json(&reminder.to_event())
            .send()
            .await
            .map_err(send_error(SERVICE))?;
        ensure_success(SERVICE, response).await?;
        log::info!("Scheduled follow-up '{}' on {}", reminder.title, calendar_id);
        Ok(())
    }
}
