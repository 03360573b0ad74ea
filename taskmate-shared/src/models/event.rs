/// Calendar event model and database operations
///
/// Events are simple creator-scoped records: a date, an "HH:MM" time, a
/// duration, and a kind. They show up on the calendar alongside task due
/// dates but have no workflow of their own.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE event_type AS ENUM ('event', 'meeting', 'deadline', 'presentation', 'task');
/// CREATE TYPE event_priority AS ENUM ('Low', 'Medium', 'High');
///
/// CREATE TABLE events (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(200) NOT NULL,
///     description TEXT,
///     date DATE NOT NULL,
///     time VARCHAR(5) NOT NULL,
///     duration INTEGER NOT NULL DEFAULT 60,
///     event_type event_type NOT NULL DEFAULT 'event',
///     priority event_priority NOT NULL DEFAULT 'Medium',
///     location VARCHAR(255),
///     creator_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     project_id UUID REFERENCES projects(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const EVENT_COLUMNS: &str = "id, title, description, date, time, duration, event_type, \
     priority, location, creator_id, project_id, created_at, updated_at";

/// Kind of calendar entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Event,
    Meeting,
    Deadline,
    Presentation,
    Task,
}

impl EventType {
    /// Parses the wire label; None for unknown values
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "event" => Some(EventType::Event),
            "meeting" => Some(EventType::Meeting),
            "deadline" => Some(EventType::Deadline),
            "presentation" => Some(EventType::Presentation),
            "task" => Some(EventType::Task),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Event => "event",
            EventType::Meeting => "meeting",
            EventType::Deadline => "deadline",
            EventType::Presentation => "presentation",
            EventType::Task => "task",
        }
    }
}

/// Event priority (three levels, unlike tasks)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_priority")]
pub enum EventPriority {
    Low,
    Medium,
    High,
}

impl EventPriority {
    /// Parses the wire label; None for unknown values
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Low" => Some(EventPriority::Low),
            "Medium" => Some(EventPriority::Medium),
            "High" => Some(EventPriority::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventPriority::Low => "Low",
            EventPriority::Medium => "Medium",
            EventPriority::High => "High",
        }
    }
}

/// Checks a wall-clock "HH:MM" string (24h, minutes 00-59)
pub fn is_valid_time(time: &str) -> bool {
    let Some((hours, minutes)) = time.split_once(':') else {
        return false;
    };
    if hours.is_empty() || hours.len() > 2 || minutes.len() != 2 {
        return false;
    }
    if !hours.chars().all(|c| c.is_ascii_digit())
        || !minutes.chars().all(|c| c.is_ascii_digit())
    {
        return false;
    }
    let h: u32 = match hours.parse() {
        Ok(h) => h,
        Err(_) => return false,
    };
    let m: u32 = match minutes.parse() {
        Ok(m) => m,
        Err(_) => return false,
    };
    h < 24 && m < 60
}

/// Event row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    /// Wall-clock start, "HH:MM"
    pub time: String,
    /// Duration in minutes
    pub duration: i32,
    pub event_type: EventType,
    pub priority: EventPriority,
    pub location: Option<String>,
    pub creator_id: Uuid,
    pub project_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an event
#[derive(Debug, Clone)]
pub struct CreateEvent {
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub time: String,
    pub duration: i32,
    pub event_type: EventType,
    pub priority: EventPriority,
    pub location: Option<String>,
    pub creator_id: Uuid,
    pub project_id: Option<Uuid>,
}

/// Input for updating an event; None fields are skipped
#[derive(Debug, Clone, Default)]
pub struct UpdateEvent {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub duration: Option<i32>,
    pub event_type: Option<EventType>,
    pub priority: Option<EventPriority>,
    pub location: Option<Option<String>>,
    pub project_id: Option<Option<Uuid>>,
}

impl Event {
    /// Creates an event
    pub async fn create(pool: &PgPool, data: CreateEvent) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO events (title, description, date, time, duration, event_type, \
             priority, location, creator_id, project_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {EVENT_COLUMNS}"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(data.title)
            .bind(data.description)
            .bind(data.date)
            .bind(data.time)
            .bind(data.duration)
            .bind(data.event_type)
            .bind(data.priority)
            .bind(data.location)
            .bind(data.creator_id)
            .bind(data.project_id)
            .fetch_one(pool)
            .await
    }

    /// Finds an event by id, scoped to its creator
    pub async fn find_by_id_and_creator(
        pool: &PgPool,
        id: Uuid,
        creator_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query =
            format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 AND creator_id = $2");
        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .bind(creator_id)
            .fetch_optional(pool)
            .await
    }

    /// Lists the creator's events, optionally bounded to a date range
    pub async fn list_by_creator(
        pool: &PgPool,
        creator_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut query =
            format!("SELECT {EVENT_COLUMNS} FROM events WHERE creator_id = $1");
        let mut bind_count = 1;

        if from.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND date >= ${}", bind_count));
        }
        if to.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND date <= ${}", bind_count));
        }
        query.push_str(" ORDER BY date ASC, time ASC, id ASC");

        let mut q = sqlx::query_as::<_, Event>(&query).bind(creator_id);
        if let Some(from) = from {
            q = q.bind(from);
        }
        if let Some(to) = to {
            q = q.bind(to);
        }

        q.fetch_all(pool).await
    }

    /// Updates an event; only fields present in `data` are written
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateEvent,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE events SET updated_at = NOW()");
        let mut bind_count = 1;

        macro_rules! push_set {
            ($field:expr, $column:literal) => {
                if $field.is_some() {
                    bind_count += 1;
                    query.push_str(&format!(concat!(", ", $column, " = ${}"), bind_count));
                }
            };
        }

        push_set!(data.title, "title");
        push_set!(data.description, "description");
        push_set!(data.date, "date");
        push_set!(data.time, "time");
        push_set!(data.duration, "duration");
        push_set!(data.event_type, "event_type");
        push_set!(data.priority, "priority");
        push_set!(data.location, "location");
        push_set!(data.project_id, "project_id");

        query.push_str(&format!(" WHERE id = $1 RETURNING {EVENT_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Event>(&query).bind(id);
        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(date) = data.date {
            q = q.bind(date);
        }
        if let Some(time) = data.time {
            q = q.bind(time);
        }
        if let Some(duration) = data.duration {
            q = q.bind(duration);
        }
        if let Some(event_type) = data.event_type {
            q = q.bind(event_type);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }
        if let Some(location) = data.location {
            q = q.bind(location);
        }
        if let Some(project_id) = data.project_id {
            q = q.bind(project_id);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes an event, scoped to its creator
    pub async fn delete(pool: &PgPool, id: Uuid, creator_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1 AND creator_id = $2")
            .bind(id)
            .bind(creator_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_times() {
        for time in ["00:00", "9:30", "09:30", "23:59", "12:00"] {
            assert!(is_valid_time(time), "{time} should be valid");
        }
    }

    #[test]
    fn test_invalid_times() {
        for time in ["24:00", "12:60", "noon", "1200", "12:5", ":30", "12:", "-1:00", "111:00"] {
            assert!(!is_valid_time(time), "{time} should be invalid");
        }
    }

    #[test]
    fn test_event_type_parse_roundtrip() {
        for label in ["event", "meeting", "deadline", "presentation", "task"] {
            let ty = EventType::parse(label).unwrap();
            assert_eq!(ty.as_str(), label);
        }
        assert!(EventType::parse("party").is_none());
    }

    #[test]
    fn test_event_priority_excludes_urgent() {
        assert!(EventPriority::parse("High").is_some());
        assert!(EventPriority::parse("Urgent").is_none());
    }

    #[test]
    fn test_event_type_wire_is_lowercase() {
        assert_eq!(serde_json::to_string(&EventType::Meeting).unwrap(), "\"meeting\"");
    }
}
