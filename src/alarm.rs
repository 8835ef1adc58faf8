use std::{collections::BTreeSet, fmt, str::FromStr};

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::WakeyError;

/// a weekday tag for weekday-based recurrence
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Self::Mon,
            chrono::Weekday::Tue => Self::Tue,
            chrono::Weekday::Wed => Self::Wed,
            chrono::Weekday::Thu => Self::Thu,
            chrono::Weekday::Fri => Self::Fri,
            chrono::Weekday::Sat => Self::Sat,
            chrono::Weekday::Sun => Self::Sun,
        }
    }
}

impl FromStr for Weekday {
    type Err = WakeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mon" | "monday" => Ok(Self::Mon),
            "tue" | "tues" | "tuesday" => Ok(Self::Tue),
            "wed" | "wednesday" => Ok(Self::Wed),
            "thu" | "thurs" | "thursday" => Ok(Self::Thu),
            "fri" | "friday" => Ok(Self::Fri),
            "sat" | "saturday" => Ok(Self::Sat),
            "sun" | "sunday" => Ok(Self::Sun),
            other => Err(WakeyError::InvalidInputFormat(format!(
                "'{other}' is not a weekday"
            ))),
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Mon => "mon",
                Self::Tue => "tue",
                Self::Wed => "wed",
                Self::Thu => "thu",
                Self::Fri => "fri",
                Self::Sat => "sat",
                Self::Sun => "sun",
            }
        )
    }
}

/// how the user gets notified when an alarm fires.
/// there is a default kind (popup)
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotifyKind {
    #[default]
    Popup,
    Sound,
    Music,
    Calendar,
}

impl FromStr for NotifyKind {
    type Err = WakeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "popup" => Ok(Self::Popup),
            "sound" | "beep" => Ok(Self::Sound),
            "music" => Ok(Self::Music),
            "calendar" => Ok(Self::Calendar),
            other => Err(WakeyError::InvalidInputFormat(format!(
                "'{other}' is not one of popup, sound, music, calendar"
            ))),
        }
    }
}

impl fmt::Display for NotifyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Popup => "popup",
                Self::Sound => "sound",
                Self::Music => "music",
                Self::Calendar => "calendar",
            }
        )
    }
}

/// represents one scheduled wake event.
/// contains the instant the alarm should go off at,
/// its recurrence rule and its notification preference
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Alarm {
    #[serde(with = "toml_datetime_compat")]
    pub fire_at: NaiveDateTime,
    #[serde(default)]
    pub repeat_days: BTreeSet<Weekday>,
    #[serde(default)]
    pub repeat_dates: BTreeSet<NaiveDate>,
    pub message: Option<String>,
    #[serde(default)]
    pub notify_kind: NotifyKind,
    pub location: Option<String>,
    pub music_file: Option<String>,
    pub calendar_event: Option<String>,
    pub snoozed_until: Option<NaiveDateTime>,
    #[serde(default)]
    pub is_snoozed: bool,
    #[serde(default)]
    pub is_stopped: bool,
}

impl Alarm {
    #[must_use]
    pub fn new(fire_at: NaiveDateTime) -> Self {
        Self {
            fire_at,
            repeat_days: BTreeSet::new(),
            repeat_dates: BTreeSet::new(),
            message: None,
            notify_kind: NotifyKind::default(),
            location: None,
            music_file: None,
            calendar_event: None,
            snoozed_until: None,
            is_snoozed: false,
            is_stopped: false,
        }
    }

    /// an alarm with no recurrence fires once past `fire_at`
    #[must_use]
    pub fn is_one_shot(&self) -> bool {
        self.repeat_days.is_empty() && self.repeat_dates.is_empty()
    }

    /// the recurrence evaluator: is this alarm due at `now`?
    ///
    /// a stopped alarm is never due. a one-shot stays due on every
    /// check past `fire_at` until it is deleted or stopped, it is not
    /// marked fired (see the policy note in DESIGN.md). weekday and
    /// date recurrence match at date granularity, time of day does
    /// not matter once `fire_at` itself has passed
    #[must_use]
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        if self.is_stopped {
            return false;
        }
        if now < self.fire_at {
            return false;
        }
        if !self.repeat_days.is_empty() {
            return self.repeat_days.contains(&Weekday::from(now.weekday()));
        }
        if !self.repeat_dates.is_empty() {
            return self.repeat_dates.contains(&now.date());
        }
        true
    }

    /// defer the alarm, pushing `fire_at` forward.
    /// repeated snoozes are additive
    pub fn snooze(&mut self, minutes: i64) {
        self.fire_at += Duration::minutes(minutes);
        self.snoozed_until = Some(self.fire_at);
        self.is_snoozed = true;
    }

    /// suppress further firing, recurrence included
    pub fn stop(&mut self) {
        self.is_stopped = true;
    }

    /// one line for the numbered alarm listing
    #[must_use]
    pub fn describe(&self, time_format: &str) -> String {
        let mut line = format!(
            "{} [{}]",
            self.fire_at.format(time_format),
            self.notify_kind
        );
        if let Some(message) = &self.message {
            line.push_str(&format!(" {message}"));
        }
        if let Some(location) = &self.location {
            line.push_str(&format!(" @ {location}"));
        }
        if !self.repeat_days.is_empty() {
            let days: Vec<String> = self.repeat_days.iter().map(ToString::to_string).collect();
            line.push_str(&format!(" (repeats {})", days.join(", ")));
        }
        if !self.repeat_dates.is_empty() {
            let dates: Vec<String> = self.repeat_dates.iter().map(ToString::to_string).collect();
            line.push_str(&format!(" (on {})", dates.join(", ")));
        }
        if self.is_snoozed {
            line.push_str(" (snoozed)");
        }
        if self.is_stopped {
            line.push_str(" (stopped)");
        }
        line
    }
}
