//! # Database Layer
//!
//! Sqlite-backed persistence for reminders, events, and user activity.
//!
//! The connection lives behind a mutex inside a cloneable handle, so the
//! whole bot shares one serialized connection. Timestamps are stored as
//! `%Y-%m-%d %H:%M:%S` UTC strings, which also sort chronologically.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use log::info;
use sqlite::{Connection, State};
use std::sync::{Arc, Mutex};

use crate::features::reminders::{
    NewReminder, RecurrencePattern, Reminder, ReminderStatus, ReminderStore,
};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn encode_time(time: DateTime<Utc>) -> String {
    time.format(TIME_FORMAT).to_string()
}

fn decode_time(text: &str) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(text, TIME_FORMAT)
        .with_context(|| format!("invalid stored timestamp: {text}"))?;
    Ok(Utc.from_utc_datetime(&naive))
}

/// A stored guild event
#[derive(Debug, Clone)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub creator_id: u64,
    pub guild_id: u64,
    pub channel_id: u64,
    pub event_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// -1 means unlimited
    pub max_participants: i64,
    pub status: String,
}

/// A stored user row
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user_id: u64,
    pub username: String,
    pub display_name: Option<String>,
    pub message_count: i64,
}

/// Cloneable handle to the bot database
#[derive(Clone)]
pub struct Database {
    connection: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (creating if needed) the database at `path` and ensure the
    /// schema exists. `:memory:` is accepted for tests.
    pub async fn new(path: &str) -> Result<Self> {
        if path != ":memory:" {
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("failed to create {}", parent.display()))?;
                }
            }
        }

        let connection = sqlite::open(path).with_context(|| format!("failed to open {path}"))?;
        let database = Database {
            connection: Arc::new(Mutex::new(connection)),
        };
        database.init_schema()?;
        info!("Database ready at {path}");
        Ok(database)
    }

    fn init_schema(&self) -> Result<()> {
        let connection = self.connection.lock().unwrap();
        connection.execute(
            "CREATE TABLE IF NOT EXISTS users (
                user_id INTEGER PRIMARY KEY,
                username TEXT NOT NULL,
                display_name TEXT,
                join_date TEXT,
                last_seen TEXT,
                message_count INTEGER DEFAULT 0
            );
            CREATE TABLE IF NOT EXISTS reminders (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                guild_id INTEGER NOT NULL,
                channel_id INTEGER NOT NULL,
                message TEXT NOT NULL,
                remind_time TEXT NOT NULL,
                created_at TEXT NOT NULL,
                is_recurring INTEGER DEFAULT 0,
                recurring_pattern TEXT,
                status TEXT DEFAULT 'active'
            );
            CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT,
                creator_id INTEGER NOT NULL,
                guild_id INTEGER NOT NULL,
                channel_id INTEGER NOT NULL,
                event_date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                max_participants INTEGER DEFAULT -1,
                status TEXT DEFAULT 'active'
            );
            CREATE TABLE IF NOT EXISTS event_participants (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                event_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                joined_at TEXT NOT NULL,
                FOREIGN KEY (event_id) REFERENCES events (id),
                UNIQUE(event_id, user_id)
            );",
        )?;
        Ok(())
    }

    fn last_insert_id(connection: &Connection) -> Result<i64> {
        let mut statement = connection.prepare("SELECT last_insert_rowid()")?;
        if statement.next()? == State::Row {
            Ok(statement.read::<i64, _>(0)?)
        } else {
            Err(anyhow!("last_insert_rowid returned no row"))
        }
    }

    // ---- users ----

    /// Insert or refresh a user row
    pub async fn upsert_user(
        &self,
        user_id: u64,
        username: &str,
        display_name: Option<&str>,
    ) -> Result<()> {
        let connection = self.connection.lock().unwrap();
        let mut statement = connection.prepare(
            "INSERT INTO users (user_id, username, display_name, join_date, last_seen)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
                username = excluded.username,
                display_name = excluded.display_name,
                last_seen = excluded.last_seen",
        )?;
        let now = encode_time(Utc::now());
        statement.bind((1, user_id as i64))?;
        statement.bind((2, username))?;
        statement.bind((3, display_name))?;
        statement.bind((4, now.as_str()))?;
        statement.bind((5, now.as_str()))?;
        statement.next()?;
        Ok(())
    }

    /// Bump message count and last-seen time for a known user
    pub async fn bump_user_activity(&self, user_id: u64) -> Result<()> {
        let connection = self.connection.lock().unwrap();
        let mut statement = connection.prepare(
            "UPDATE users SET last_seen = ?, message_count = message_count + 1 WHERE user_id = ?",
        )?;
        statement.bind((1, encode_time(Utc::now()).as_str()))?;
        statement.bind((2, user_id as i64))?;
        statement.next()?;
        Ok(())
    }

    pub async fn get_user(&self, user_id: u64) -> Result<Option<UserRecord>> {
        let connection = self.connection.lock().unwrap();
        let mut statement = connection
            .prepare("SELECT user_id, username, display_name, message_count FROM users WHERE user_id = ?")?;
        statement.bind((1, user_id as i64))?;

        if statement.next()? == State::Row {
            Ok(Some(UserRecord {
                user_id: statement.read::<i64, _>("user_id")? as u64,
                username: statement.read::<String, _>("username")?,
                display_name: statement.read::<Option<String>, _>("display_name")?,
                message_count: statement.read::<i64, _>("message_count")?,
            }))
        } else {
            Ok(None)
        }
    }

    // ---- reminders ----

    pub async fn add_reminder(&self, reminder: NewReminder<'_>) -> Result<i64> {
        let connection = self.connection.lock().unwrap();
        let mut statement = connection.prepare(
            "INSERT INTO reminders
                (user_id, guild_id, channel_id, message, remind_time, created_at,
                 is_recurring, recurring_pattern)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )?;
        statement.bind((1, reminder.user_id as i64))?;
        statement.bind((2, reminder.guild_id as i64))?;
        statement.bind((3, reminder.channel_id as i64))?;
        statement.bind((4, reminder.message))?;
        statement.bind((5, encode_time(reminder.remind_time).as_str()))?;
        statement.bind((6, encode_time(Utc::now()).as_str()))?;
        statement.bind((7, i64::from(reminder.recurring_pattern.is_some())))?;
        statement.bind((8, reminder.recurring_pattern.map(|p| p.as_str())))?;
        statement.next()?;

        Self::last_insert_id(&connection)
    }

    pub async fn get_active_reminders(&self) -> Result<Vec<Reminder>> {
        let connection = self.connection.lock().unwrap();
        let mut statement = connection.prepare(
            "SELECT * FROM reminders WHERE status = 'active' ORDER BY remind_time ASC",
        )?;
        Self::collect_reminders(&mut statement)
    }

    pub async fn get_user_reminders(&self, user_id: u64) -> Result<Vec<Reminder>> {
        let connection = self.connection.lock().unwrap();
        let mut statement = connection.prepare(
            "SELECT * FROM reminders WHERE user_id = ? AND status = 'active'
             ORDER BY remind_time ASC",
        )?;
        statement.bind((1, user_id as i64))?;
        Self::collect_reminders(&mut statement)
    }

    pub async fn complete_reminder(&self, id: i64) -> Result<()> {
        let connection = self.connection.lock().unwrap();
        let mut statement =
            connection.prepare("UPDATE reminders SET status = 'completed' WHERE id = ?")?;
        statement.bind((1, id))?;
        statement.next()?;
        Ok(())
    }

    /// Delete an active reminder owned by `user_id`. Returns false when the
    /// row does not exist, is owned by someone else, or is already completed.
    pub async fn remove_reminder(&self, id: i64, user_id: u64) -> Result<bool> {
        let connection = self.connection.lock().unwrap();
        let mut statement = connection.prepare(
            "DELETE FROM reminders WHERE id = ? AND user_id = ? AND status = 'active'",
        )?;
        statement.bind((1, id))?;
        statement.bind((2, user_id as i64))?;
        statement.next()?;
        Ok(connection.change_count() > 0)
    }

    fn collect_reminders(statement: &mut sqlite::Statement<'_>) -> Result<Vec<Reminder>> {
        let mut reminders = Vec::new();
        while statement.next()? == State::Row {
            let pattern = statement
                .read::<Option<String>, _>("recurring_pattern")?
                .and_then(|tag| RecurrencePattern::parse(&tag));
            reminders.push(Reminder {
                id: statement.read::<i64, _>("id")?,
                user_id: statement.read::<i64, _>("user_id")? as u64,
                guild_id: statement.read::<i64, _>("guild_id")? as u64,
                channel_id: statement.read::<i64, _>("channel_id")? as u64,
                message: statement.read::<String, _>("message")?,
                remind_time: decode_time(&statement.read::<String, _>("remind_time")?)?,
                is_recurring: statement.read::<i64, _>("is_recurring")? != 0,
                recurring_pattern: pattern,
                status: ReminderStatus::parse(&statement.read::<String, _>("status")?),
            });
        }
        Ok(reminders)
    }

    // ---- events ----

    #[allow(clippy::too_many_arguments)]
    pub async fn create_event(
        &self,
        title: &str,
        description: Option<&str>,
        creator_id: u64,
        guild_id: u64,
        channel_id: u64,
        event_date: DateTime<Utc>,
        max_participants: i64,
    ) -> Result<i64> {
        let connection = self.connection.lock().unwrap();
        let mut statement = connection.prepare(
            "INSERT INTO events
                (title, description, creator_id, guild_id, channel_id, event_date,
                 created_at, max_participants)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )?;
        statement.bind((1, title))?;
        statement.bind((2, description))?;
        statement.bind((3, creator_id as i64))?;
        statement.bind((4, guild_id as i64))?;
        statement.bind((5, channel_id as i64))?;
        statement.bind((6, encode_time(event_date).as_str()))?;
        statement.bind((7, encode_time(Utc::now()).as_str()))?;
        statement.bind((8, max_participants))?;
        statement.next()?;

        Self::last_insert_id(&connection)
    }

    pub async fn get_event(&self, event_id: i64) -> Result<Option<Event>> {
        let connection = self.connection.lock().unwrap();
        let mut statement = connection.prepare("SELECT * FROM events WHERE id = ?")?;
        statement.bind((1, event_id))?;

        if statement.next()? == State::Row {
            Ok(Some(Self::read_event(&statement)?))
        } else {
            Ok(None)
        }
    }

    pub async fn get_guild_events(&self, guild_id: u64) -> Result<Vec<Event>> {
        let connection = self.connection.lock().unwrap();
        let mut statement = connection.prepare(
            "SELECT * FROM events WHERE guild_id = ? AND status = 'active'
             ORDER BY event_date ASC",
        )?;
        statement.bind((1, guild_id as i64))?;

        let mut events = Vec::new();
        while statement.next()? == State::Row {
            events.push(Self::read_event(&statement)?);
        }
        Ok(events)
    }

    /// Add a participant. Returns false when the user already joined.
    pub async fn join_event(&self, event_id: i64, user_id: u64) -> Result<bool> {
        let connection = self.connection.lock().unwrap();
        let mut statement = connection.prepare(
            "INSERT INTO event_participants (event_id, user_id, joined_at) VALUES (?, ?, ?)",
        )?;
        statement.bind((1, event_id))?;
        statement.bind((2, user_id as i64))?;
        statement.bind((3, encode_time(Utc::now()).as_str()))?;

        match statement.next() {
            Ok(_) => Ok(true),
            Err(e) if e.to_string().contains("UNIQUE") => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a participant. Returns false when the user was not joined.
    pub async fn leave_event(&self, event_id: i64, user_id: u64) -> Result<bool> {
        let connection = self.connection.lock().unwrap();
        let mut statement = connection
            .prepare("DELETE FROM event_participants WHERE event_id = ? AND user_id = ?")?;
        statement.bind((1, event_id))?;
        statement.bind((2, user_id as i64))?;
        statement.next()?;
        Ok(connection.change_count() > 0)
    }

    pub async fn get_event_participants(&self, event_id: i64) -> Result<Vec<u64>> {
        let connection = self.connection.lock().unwrap();
        let mut statement =
            connection.prepare("SELECT user_id FROM event_participants WHERE event_id = ?")?;
        statement.bind((1, event_id))?;

        let mut participants = Vec::new();
        while statement.next()? == State::Row {
            participants.push(statement.read::<i64, _>("user_id")? as u64);
        }
        Ok(participants)
    }

    fn read_event(statement: &sqlite::Statement<'_>) -> Result<Event> {
        Ok(Event {
            id: statement.read::<i64, _>("id")?,
            title: statement.read::<String, _>("title")?,
            description: statement.read::<Option<String>, _>("description")?,
            creator_id: statement.read::<i64, _>("creator_id")? as u64,
            guild_id: statement.read::<i64, _>("guild_id")? as u64,
            channel_id: statement.read::<i64, _>("channel_id")? as u64,
            event_date: decode_time(&statement.read::<String, _>("event_date")?)?,
            created_at: decode_time(&statement.read::<String, _>("created_at")?)?,
            max_participants: statement.read::<i64, _>("max_participants")?,
            status: statement.read::<String, _>("status")?,
        })
    }
}

#[async_trait]
impl ReminderStore for Database {
    async fn create_reminder(&self, reminder: NewReminder<'_>) -> Result<i64> {
        self.add_reminder(reminder).await
    }

    async fn active_reminders(&self) -> Result<Vec<Reminder>> {
        self.get_active_reminders().await
    }

    async fn user_reminders(&self, user_id: u64) -> Result<Vec<Reminder>> {
        self.get_user_reminders(user_id).await
    }

    async fn complete_reminder(&self, id: i64) -> Result<()> {
        Database::complete_reminder(self, id).await
    }

    async fn delete_reminder(&self, id: i64, user_id: u64) -> Result<bool> {
        self.remove_reminder(id, user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn memory_db() -> Database {
        Database::new(":memory:").await.unwrap()
    }

    fn new_reminder(message: &str, remind_time: DateTime<Utc>) -> NewReminder<'_> {
        NewReminder {
            user_id: 42,
            guild_id: 7,
            channel_id: 99,
            message,
            remind_time,
            recurring_pattern: None,
        }
    }

    #[tokio::test]
    async fn test_reminder_roundtrip() {
        let db = memory_db().await;
        let remind_time = Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 0).unwrap();

        let id = db.add_reminder(new_reminder("hydrate", remind_time)).await.unwrap();
        assert!(id > 0);

        let reminders = db.get_active_reminders().await.unwrap();
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].id, id);
        assert_eq!(reminders[0].message, "hydrate");
        assert_eq!(reminders[0].remind_time, remind_time);
        assert!(!reminders[0].is_recurring);
        assert_eq!(reminders[0].status, ReminderStatus::Active);
    }

    #[tokio::test]
    async fn test_recurring_pattern_roundtrip() {
        let db = memory_db().await;
        let remind_time = Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 0).unwrap();

        let mut reminder = new_reminder("standup", remind_time);
        reminder.recurring_pattern = Some(RecurrencePattern::Weekly);
        db.add_reminder(reminder).await.unwrap();

        let reminders = db.get_active_reminders().await.unwrap();
        assert!(reminders[0].is_recurring);
        assert_eq!(reminders[0].recurring_pattern, Some(RecurrencePattern::Weekly));
    }

    #[tokio::test]
    async fn test_active_reminders_ordered_by_time() {
        let db = memory_db().await;
        let base = Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap();

        db.add_reminder(new_reminder("later", base + Duration::hours(2))).await.unwrap();
        db.add_reminder(new_reminder("sooner", base)).await.unwrap();

        let reminders = db.get_active_reminders().await.unwrap();
        assert_eq!(reminders[0].message, "sooner");
        assert_eq!(reminders[1].message, "later");
    }

    #[tokio::test]
    async fn test_completed_reminder_disappears_from_active() {
        let db = memory_db().await;
        let remind_time = Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 0).unwrap();
        let id = db.add_reminder(new_reminder("done soon", remind_time)).await.unwrap();

        Database::complete_reminder(&db, id).await.unwrap();
        assert!(db.get_active_reminders().await.unwrap().is_empty());

        // completed reminders cannot be cancelled anymore
        assert!(!db.remove_reminder(id, 42).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_reminder_enforces_ownership() {
        let db = memory_db().await;
        let remind_time = Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 0).unwrap();
        let id = db.add_reminder(new_reminder("private", remind_time)).await.unwrap();

        assert!(!db.remove_reminder(id, 1234).await.unwrap());
        assert_eq!(db.get_user_reminders(42).await.unwrap().len(), 1);

        assert!(db.remove_reminder(id, 42).await.unwrap());
        assert!(db.get_user_reminders(42).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_event_roundtrip_and_participants() {
        let db = memory_db().await;
        let date = Utc.with_ymd_and_hms(2030, 6, 1, 19, 0, 0).unwrap();

        let id = db
            .create_event("Movie night", Some("bring snacks"), 42, 7, 99, date, 2)
            .await
            .unwrap();

        let event = db.get_event(id).await.unwrap().unwrap();
        assert_eq!(event.title, "Movie night");
        assert_eq!(event.event_date, date);
        assert_eq!(event.max_participants, 2);

        assert!(db.join_event(id, 1).await.unwrap());
        assert!(db.join_event(id, 2).await.unwrap());
        // duplicate join is refused
        assert!(!db.join_event(id, 1).await.unwrap());

        let participants = db.get_event_participants(id).await.unwrap();
        assert_eq!(participants.len(), 2);

        assert!(db.leave_event(id, 1).await.unwrap());
        assert!(!db.leave_event(id, 1).await.unwrap());
        assert_eq!(db.get_event_participants(id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_guild_events_ordered_and_scoped() {
        let db = memory_db().await;
        let base = Utc.with_ymd_and_hms(2030, 6, 1, 19, 0, 0).unwrap();

        db.create_event("second", None, 42, 7, 99, base + Duration::days(1), -1)
            .await
            .unwrap();
        db.create_event("first", None, 42, 7, 99, base, -1).await.unwrap();
        db.create_event("other guild", None, 42, 8, 99, base, -1).await.unwrap();

        let events = db.get_guild_events(7).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].title, "first");
        assert_eq!(events[1].title, "second");
    }

    #[tokio::test]
    async fn test_user_activity_tracking() {
        let db = memory_db().await;
        db.upsert_user(42, "tester", Some("Tester")).await.unwrap();
        db.bump_user_activity(42).await.unwrap();
        db.bump_user_activity(42).await.unwrap();

        let user = db.get_user(42).await.unwrap().unwrap();
        assert_eq!(user.username, "tester");
        assert_eq!(user.message_count, 2);
    }
}
