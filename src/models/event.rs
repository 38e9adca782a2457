use std::{cmp::Ordering, fmt, str::FromStr, sync::LazyLock};

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::AppError,
    utils::{date::parse_date, optional_text, require_text, validate_optional_url},
};

static TIME_OF_DAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").expect("valid time regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Concert,
    Award,
    Broadcast,
    Festival,
    #[default]
    Other,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Concert => "concert",
            EventKind::Award => "award",
            EventKind::Broadcast => "broadcast",
            EventKind::Festival => "festival",
            EventKind::Other => "other",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "concert" => Ok(EventKind::Concert),
            "award" => Ok(EventKind::Award),
            "broadcast" => Ok(EventKind::Broadcast),
            "festival" => Ok(EventKind::Festival),
            "other" => Ok(EventKind::Other),
            other => Err(AppError::BadRequest(format!("Unknown event type '{}'", other))),
        }
    }
}

/// Represents the 'events' table in the database.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub date: DateTime<Utc>,
    pub time: Option<String>,
    pub place: Option<String>,
    pub poster_url: Option<String>,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub is_pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Public "upcoming" view: future events plus anything pinned.
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.is_pinned || self.date >= now
    }
}

/// Admin ordering: pinned first, then newest date first.
pub fn admin_order(a: &Event, b: &Event) -> Ordering {
    b.is_pinned.cmp(&a.is_pinned).then_with(|| b.date.cmp(&a.date))
}

/// Public ordering: pinned first, then soonest date first.
pub fn upcoming_order(a: &Event, b: &Event) -> Ordering {
    b.is_pinned.cmp(&a.is_pinned).then_with(|| a.date.cmp(&b.date))
}

/// Validated event fields, shared by create and update.
#[derive(Debug, Clone)]
pub struct EventInput {
    pub title: String,
    pub date: DateTime<Utc>,
    pub time: Option<String>,
    pub place: Option<String>,
    pub poster_url: Option<String>,
    pub kind: EventKind,
}

/// DTO for creating or replacing an event. Pinning has its own endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub date: String,
    pub time: Option<String>,
    pub place: Option<String>,
    pub poster_url: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl EventRequest {
    pub fn into_input(self) -> Result<EventInput, AppError> {
        let title = require_text(&self.title, "title", 200)?;
        let date = parse_date(&self.date, "date")?;

        let time = optional_text(self.time);
        if let Some(t) = &time {
            if !TIME_OF_DAY.is_match(t) {
                return Err(AppError::BadRequest("time must be formatted HH:MM".to_string()));
            }
        }

        let kind = match optional_text(self.kind) {
            Some(k) => k.parse()?,
            None => EventKind::default(),
        };

        Ok(EventInput {
            title,
            date,
            time,
            place: optional_text(self.place),
            poster_url: validate_optional_url(self.poster_url, "posterUrl")?,
            kind,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinRequest {
    pub is_pinned: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn event(days: i64, pinned: bool) -> Event {
        let now = Utc::now();
        Event {
            id: Uuid::new_v4(),
            title: format!("e{days}"),
            date: now + Duration::days(days),
            time: None,
            place: None,
            poster_url: None,
            kind: EventKind::Other,
            is_pinned: pinned,
            created_at: now,
            updated_at: now,
        }
    }

    fn request(kind: Option<&str>, time: Option<&str>) -> EventRequest {
        EventRequest {
            title: "Fan meeting".into(),
            date: "2025-06-01".into(),
            time: time.map(Into::into),
            place: Some("  ".into()),
            poster_url: None,
            kind: kind.map(Into::into),
        }
    }

    #[test]
    fn kind_defaults_to_other() {
        let input = request(None, None).into_input().unwrap();
        assert_eq!(input.kind, EventKind::Other);
        assert!(input.place.is_none());
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(matches!(
            request(Some("party"), None).into_input(),
            Err(AppError::BadRequest(_))
        ));
        assert_eq!(
            request(Some("award"), None).into_input().unwrap().kind,
            EventKind::Award
        );
    }

    #[test]
    fn time_must_be_hh_mm() {
        assert!(request(None, Some("19:30")).into_input().is_ok());
        assert!(request(None, Some("7pm")).into_input().is_err());
        assert!(request(None, Some("24:00")).into_input().is_err());
    }

    #[test]
    fn admin_order_puts_pinned_first_then_latest() {
        let mut events = vec![event(1, false), event(5, false), event(-3, true)];
        events.sort_by(admin_order);
        let titles: Vec<_> = events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["e-3", "e5", "e1"]);
    }

    #[test]
    fn upcoming_keeps_pinned_past_events() {
        let now = Utc::now();
        let mut events: Vec<_> = vec![event(-3, true), event(-1, false), event(5, false), event(1, false)]
            .into_iter()
            .filter(|e| e.is_upcoming(now))
            .collect();
        events.sort_by(upcoming_order);
        let titles: Vec<_> = events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["e-3", "e1", "e5"]);
    }

    #[test]
    fn kind_serializes_as_type() {
        let json = serde_json::to_value(event(0, false)).unwrap();
        assert_eq!(json["type"], "other");
        assert_eq!(json["isPinned"], false);
    }
}
