//! Outreach task rendering and the task-sink collaborator.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::debug;
use serde_json::json;
use std::time::Duration;

use crate::contacts::Contact;
use crate::matcher::{MatchKind, MatchResult};
use crate::trips::Trip;

const TODOIST_TASKS_URL: &str = "https://api.todoist.com/api/v1/tasks";
const TASK_TIMEOUT: Duration = Duration::from_secs(20);

/// Destination for outreach reminders. One call creates one remote task;
/// failures propagate (already-created tasks are not rolled back).
#[async_trait]
pub trait TaskSink {
    async fn create_task(&self, title: &str, description: &str) -> Result<()>;
}

/// Task sink backed by the Todoist REST API.
pub struct TodoistSink {
    client: reqwest::Client,
    api_token: String,
}

impl TodoistSink {
    pub fn new(api_token: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(crate::geocode::USER_AGENT)
            .timeout(TASK_TIMEOUT)
            .build()?;
        Ok(Self { client, api_token })
    }
}

#[async_trait]
impl TaskSink for TodoistSink {
    async fn create_task(&self, title: &str, description: &str) -> Result<()> {
        debug!("Creating Todoist task: {}", title);
        let response = self
            .client
            .post(TODOIST_TASKS_URL)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .json(&json!({ "content": title, "description": description }))
            .send()
            .await
            .context("Failed to reach Todoist")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Todoist API error: status {}, response: {}", status, body));
        }
        Ok(())
    }
}

/// Title of the reminder for one contact on one trip.
pub fn build_title(contact: &Contact, trip: &Trip) -> String {
    format!("Reach out to {} re: {} trip", contact.name, trip.city)
}

/// Multi-line task description: city, date range in the run's timezone,
/// how the contact file was matched, and the contact's notes if any.
pub fn build_description(
    trip: &Trip,
    contact: &Contact,
    matched: &MatchResult<'_>,
    timezone: &str,
) -> String {
    let mut parts = vec![format!("Trip to {}", trip.city)];
    if trip.start_date.is_some() || trip.end_date.is_some() {
        let render = |date: Option<chrono::NaiveDate>| {
            date.map_or_else(|| "unknown".to_string(), |d| d.to_string())
        };
        parts.push(format!(
            "Dates ({}): {} → {}",
            timezone,
            render(trip.start_date),
            render(trip.end_date)
        ));
    }
    match (matched.kind, matched.distance_km) {
        (MatchKind::Exact, _) => parts.push("Match: exact city name".to_string()),
        (MatchKind::Radius, Some(distance)) => {
            parts.push(format!("Match: within {distance:.1} km"));
        }
        (MatchKind::Radius, None) => {}
    }
    if let Some(notes) = &contact.notes {
        parts.push(format!("Notes: {notes}"));
    }
    parts.join("\n")
}
