//! Reminder engine: time parsing, the due-reminder scanner, and recurrence
//! rescheduling.
//!
//! The engine is wired to two collaborators at construction time: a store
//! (reminder rows) and a notifier (delivery to a channel). Both are traits so
//! tests run against in-memory fakes.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDateTime, NaiveTime, TimeZone, Utc};
use log::{error, info};
use std::sync::Arc;
use tokio::sync::Notify;

/// How often the scanner wakes up to look for due reminders
pub const SCAN_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60);

/// Fixed-interval recurrence patterns.
///
/// Monthly is a fixed 30-day offset, not calendar-month arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurrencePattern {
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

impl RecurrencePattern {
    /// Parse a user-supplied recurrence tag (case-insensitive)
    pub fn parse(input: &str) -> Option<Self> {
        match input.to_lowercase().as_str() {
            "hourly" => Some(RecurrencePattern::Hourly),
            "daily" => Some(RecurrencePattern::Daily),
            "weekly" => Some(RecurrencePattern::Weekly),
            "monthly" => Some(RecurrencePattern::Monthly),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrencePattern::Hourly => "hourly",
            RecurrencePattern::Daily => "daily",
            RecurrencePattern::Weekly => "weekly",
            RecurrencePattern::Monthly => "monthly",
        }
    }

    /// Next occurrence measured from the fired instance's own remind time,
    /// not from the moment of delivery.
    pub fn next_occurrence(&self, from: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            RecurrencePattern::Hourly => from + Duration::hours(1),
            RecurrencePattern::Daily => from + Duration::days(1),
            RecurrencePattern::Weekly => from + Duration::weeks(1),
            RecurrencePattern::Monthly => from + Duration::days(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderStatus {
    Active,
    Completed,
}

impl ReminderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderStatus::Active => "active",
            ReminderStatus::Completed => "completed",
        }
    }

    pub fn parse(input: &str) -> Self {
        if input == "completed" {
            ReminderStatus::Completed
        } else {
            ReminderStatus::Active
        }
    }
}

/// A persisted reminder row
#[derive(Debug, Clone)]
pub struct Reminder {
    pub id: i64,
    pub user_id: u64,
    pub guild_id: u64,
    pub channel_id: u64,
    pub message: String,
    pub remind_time: DateTime<Utc>,
    pub is_recurring: bool,
    pub recurring_pattern: Option<RecurrencePattern>,
    pub status: ReminderStatus,
}

/// Fields for a reminder about to be persisted
#[derive(Debug, Clone)]
pub struct NewReminder<'a> {
    pub user_id: u64,
    pub guild_id: u64,
    pub channel_id: u64,
    pub message: &'a str,
    pub remind_time: DateTime<Utc>,
    pub recurring_pattern: Option<RecurrencePattern>,
}

/// Persistence collaborator for reminder rows
#[async_trait]
pub trait ReminderStore: Send + Sync {
    /// Persist a new active reminder, returning its assigned id
    async fn create_reminder(&self, reminder: NewReminder<'_>) -> Result<i64>;

    /// All active reminders ordered by remind_time ascending
    async fn active_reminders(&self) -> Result<Vec<Reminder>>;

    /// Active reminders owned by one user, ordered by remind_time ascending
    async fn user_reminders(&self, user_id: u64) -> Result<Vec<Reminder>>;

    /// Transition a reminder from active to completed
    async fn complete_reminder(&self, id: i64) -> Result<()>;

    /// Delete an active reminder owned by `user_id`. Returns false when the
    /// reminder does not exist, belongs to someone else, or is no longer
    /// active.
    async fn delete_reminder(&self, id: i64, user_id: u64) -> Result<bool>;
}

/// Delivery collaborator: push a fired reminder to its origin channel
#[async_trait]
pub trait ReminderNotifier: Send + Sync {
    async fn send_reminder(&self, reminder: &Reminder) -> Result<()>;
}

/// Parse user time input into an absolute UTC timestamp.
///
/// Accepted forms, tried in order (first match wins):
/// - relative offsets `<n>m`, `<n>h`, `<n>d`
/// - `YYYY-MM-DD HH:MM`, `DD/MM/YYYY HH:MM`, `DD-MM-YYYY HH:MM`
/// - bare `HH:MM`, meaning today at that time, or tomorrow if already past
///
/// `now` is passed in so callers and tests share one clock reading.
pub fn parse_time_input(input: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let input = input.trim();

    if let Some(unit) = input.chars().last() {
        if matches!(unit, 'm' | 'h' | 'd') {
            let number = &input[..input.len() - 1];
            if let Ok(value) = number.parse::<i64>() {
                let offset = match unit {
                    'm' => Duration::minutes(value),
                    'h' => Duration::hours(value),
                    _ => Duration::days(value),
                };
                return now.checked_add_signed(offset);
            }
        }
    }

    const ABSOLUTE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M", "%d/%m/%Y %H:%M", "%d-%m-%Y %H:%M"];
    for format in ABSOLUTE_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(input, format) {
            return Some(Utc.from_utc_datetime(&datetime));
        }
    }

    if let Ok(time) = NaiveTime::parse_from_str(input, "%H:%M") {
        let mut result = Utc.from_utc_datetime(&now.date_naive().and_time(time));
        if result <= now {
            result += Duration::days(1);
        }
        return Some(result);
    }

    None
}

/// Periodic scanner that delivers due reminders and reschedules recurring ones
pub struct ReminderEngine {
    store: Arc<dyn ReminderStore>,
    notifier: Arc<dyn ReminderNotifier>,
}

impl ReminderEngine {
    pub fn new(store: Arc<dyn ReminderStore>, notifier: Arc<dyn ReminderNotifier>) -> Self {
        ReminderEngine { store, notifier }
    }

    /// Run the scan loop forever. Waits for `ready` before the first tick so
    /// delivery never races the gateway connection.
    pub async fn run(self, ready: Arc<Notify>) {
        ready.notified().await;
        info!(
            "Reminder engine started, scanning every {}s",
            SCAN_INTERVAL.as_secs()
        );

        let mut interval = tokio::time::interval(SCAN_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            if let Err(e) = self.check_due_reminders(Utc::now()).await {
                error!("Reminder scan failed: {e}");
            }
        }
    }

    /// One scan tick: deliver every due reminder, isolating per-item failures.
    ///
    /// A reminder whose delivery or persistence step fails stays active and is
    /// retried on the next tick, so delivery is at-least-once.
    pub async fn check_due_reminders(&self, now: DateTime<Utc>) -> Result<()> {
        let reminders = self.store.active_reminders().await?;

        for reminder in reminders {
            if reminder.remind_time > now {
                continue;
            }
            if let Err(e) = self.fire(&reminder).await {
                error!(
                    "Failed to process reminder {} (user {}, guild {}): {e}",
                    reminder.id, reminder.user_id, reminder.guild_id
                );
            }
        }
        Ok(())
    }

    /// Deliver one due reminder and retire it.
    ///
    /// For recurring reminders the successor row is created before the fired
    /// row is completed, so a crash in between leaves both visible rather
    /// than losing the chain.
    async fn fire(&self, reminder: &Reminder) -> Result<()> {
        self.notifier.send_reminder(reminder).await?;

        if reminder.is_recurring {
            if let Some(pattern) = reminder.recurring_pattern {
                let successor = NewReminder {
                    user_id: reminder.user_id,
                    guild_id: reminder.guild_id,
                    channel_id: reminder.channel_id,
                    message: &reminder.message,
                    remind_time: pattern.next_occurrence(reminder.remind_time),
                    recurring_pattern: Some(pattern),
                };
                let successor_id = self.store.create_reminder(successor).await?;
                info!(
                    "Rescheduled recurring reminder {} as {} ({})",
                    reminder.id,
                    successor_id,
                    pattern.as_str()
                );
            }
        }

        self.store.complete_reminder(reminder.id).await?;
        info!(
            "Delivered reminder {} to channel {} for user {}",
            reminder.id, reminder.channel_id, reminder.user_id
        );
        Ok(())
    }
}
