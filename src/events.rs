use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::board::{BoardError, Row, required};
use crate::space::SpaceLabel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Upcoming,
    Active,
    Completed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    #[default]
    Hackathon,
    Competition,
    Quiz,
    Workshop,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Hackathon => "hackathon",
            EventKind::Competition => "competition",
            EventKind::Quiz => "quiz",
            EventKind::Workshop => "workshop",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A hackathon, competition, quiz or workshop one or both users take part in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub user_space: SpaceLabel,
    pub title: String,
    pub organizer: String,
    pub platform: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub status: EventStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Event creation form data
#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub organizer: String,
    pub platform: String,
    #[serde(default, rename = "type")]
    pub kind: EventKind,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Partial event update
///
/// Empty optional text fields clear them. Moving either date re-derives the
/// status unless the patch sets one explicitly.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub organizer: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<EventKind>,
    #[serde(default)]
    pub status: Option<EventStatus>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// An event as listed, with its progress at the time of the request
#[derive(Debug, Clone, Serialize)]
pub struct EventView {
    #[serde(flatten)]
    pub event: Event,
    pub progress: u8,
}

/// Where `now` falls relative to an event's dates
pub fn status_at(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> EventStatus {
    if now < start {
        EventStatus::Upcoming
    } else if now > end {
        EventStatus::Completed
    } else {
        EventStatus::Active
    }
}

/// Percentage of the event's duration elapsed at `now`, rounded to 0..=100
///
/// # Arguments
/// * `start` - Event start
/// * `end` - Event end
/// * `now` - Reference time
///
/// # Returns
/// * `u8` - 0 before the start, 100 after the end
pub fn progress_at(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> u8 {
    if now < start {
        return 0;
    }
    if now > end {
        return 100;
    }

    let total = (end - start).num_milliseconds();
    if total <= 0 {
        return 100;
    }
    let elapsed = (now - start).num_milliseconds();
    let percent = (elapsed as f64 / total as f64 * 100.0).round();
    percent.clamp(0.0, 100.0) as u8
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_dates(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), BoardError> {
    if end < start {
        return Err(BoardError::Invalid(
            "End date must not be before start date".to_string(),
        ));
    }
    Ok(())
}

impl Event {
    pub(crate) fn create(
        space: SpaceLabel,
        new: NewEvent,
        now: DateTime<Utc>,
    ) -> Result<Self, BoardError> {
        let title = required(&new.title, "Title")?;
        let organizer = required(&new.organizer, "Organizer")?;
        let platform = required(&new.platform, "Platform")?;
        check_dates(new.start_date, new.end_date)?;

        Ok(Event {
            id: Uuid::new_v4(),
            user_space: space,
            title,
            organizer,
            platform,
            kind: new.kind,
            status: status_at(new.start_date, new.end_date, now),
            start_date: new.start_date,
            end_date: new.end_date,
            location: optional_text(new.location),
            description: optional_text(new.description),
            url: optional_text(new.url),
            created_at: now,
        })
    }

    /// Merge `patch` into this event, leaving it untouched on a validation error
    pub(crate) fn apply(&mut self, patch: EventPatch, now: DateTime<Utc>) -> Result<(), BoardError> {
        let title = patch.title.as_deref().map(|v| required(v, "Title")).transpose()?;
        let organizer = patch
            .organizer
            .as_deref()
            .map(|v| required(v, "Organizer"))
            .transpose()?;
        let platform = patch
            .platform
            .as_deref()
            .map(|v| required(v, "Platform"))
            .transpose()?;
        let start = patch.start_date.unwrap_or(self.start_date);
        let end = patch.end_date.unwrap_or(self.end_date);
        check_dates(start, end)?;

        let moved = start != self.start_date || end != self.end_date;
        self.start_date = start;
        self.end_date = end;
        self.status = match patch.status {
            Some(status) => status,
            None if moved => status_at(start, end, now),
            None => self.status,
        };

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(organizer) = organizer {
            self.organizer = organizer;
        }
        if let Some(platform) = platform {
            self.platform = platform;
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if patch.location.is_some() {
            self.location = optional_text(patch.location);
        }
        if patch.description.is_some() {
            self.description = optional_text(patch.description);
        }
        if patch.url.is_some() {
            self.url = optional_text(patch.url);
        }
        Ok(())
    }

    pub fn progress(&self, now: DateTime<Utc>) -> u8 {
        progress_at(self.start_date, self.end_date, now)
    }

    pub fn view(self, now: DateTime<Utc>) -> EventView {
        let progress = self.progress(now);
        EventView {
            event: self,
            progress,
        }
    }
}

impl Row for Event {
    fn id(&self) -> Uuid {
        self.id
    }

    fn user_space(&self) -> SpaceLabel {
        self.user_space
    }

    fn created(&self) -> DateTime<Utc> {
        self.created_at
    }
}
