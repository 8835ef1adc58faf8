use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::{
    alarm::{Alarm, NotifyKind, Weekday},
    error::{Result, WakeyError},
    notify::SpeechToText,
};

/// a fully parsed user request, ready to run against the store
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Set(Alarm),
    Display,
    Delete(usize),
    Snooze { number: usize, minutes: i64 },
    Stop(usize),
    Exit,
}

/// what the control loop should do after feeding a line to the menu
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// print this and keep feeding lines to the current interaction
    Prompt(String),
    /// a complete command, run it and show the menu again
    Run(Command),
    /// abandon the interaction, print this and show the menu again
    Back(String),
}

pub const MENU: &str = "\nAlarm Clock Menu:\n\
    1. Set Alarm\n\
    2. Display Alarms\n\
    3. Delete Alarm\n\
    4. Snooze Alarm\n\
    5. Stop/Voice Alarm\n\
    6. Exit\n\
    Enter your choice (1-6):";

const TIME_PROMPT: &str = "Enter the alarm time (HH:MM:SS or YYYY-MM-DD HH:MM:SS):";
const DAYS_PROMPT: &str = "Repeat on which weekdays? (e.g. mon,wed; blank for none):";
const DATES_PROMPT: &str = "Repeat on which dates? (YYYY-MM-DD, comma separated; blank for none):";
const MESSAGE_PROMPT: &str = "Message to show (blank for none):";
const LOCATION_PROMPT: &str = "Location (blank for none):";
const KIND_PROMPT: &str = "Notify with popup, sound, music or calendar? (blank for popup):";
const MUSIC_PROMPT: &str = "Path to the music file:";
const DELETE_PROMPT: &str = "Enter the alarm number to delete:";
const SNOOZE_PROMPT: &str = "Enter the alarm number to snooze:";
const MINUTES_PROMPT: &str = "Enter snooze duration in minutes:";
const STOP_PROMPT: &str =
    "Enter the alarm number to stop, or a phrase like 'stop 2' or 'snooze 2 for 5 minutes':";

/// which input the menu is waiting on.
/// the set-alarm wizard threads the half-built alarm through its states
#[derive(Debug, Clone, PartialEq, Default)]
enum State {
    #[default]
    AtMenu,
    AwaitTime,
    AwaitDays(Alarm),
    AwaitDates(Alarm),
    AwaitMessage(Alarm),
    AwaitLocation(Alarm),
    AwaitKind(Alarm),
    AwaitMusicFile(Alarm),
    AwaitDeleteNumber,
    AwaitSnoozeNumber,
    AwaitSnoozeMinutes(usize),
    AwaitStopOrPhrase,
}

/// line-driven front end over [`Command`].
/// feed it one input line at a time, it tells the caller what to print
/// and when a command is complete
#[derive(Debug, Default)]
pub struct Menu {
    state: State,
}

impl Menu {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn at_menu(&self) -> bool {
        self.state == State::AtMenu
    }

    pub fn feed(&mut self, line: &str, now: NaiveDateTime, speech: &dyn SpeechToText) -> Step {
        match std::mem::take(&mut self.state) {
            State::AtMenu => match line.trim() {
                "1" => self.prompt(State::AwaitTime, TIME_PROMPT),
                "2" => Step::Run(Command::Display),
                "3" => self.prompt(State::AwaitDeleteNumber, DELETE_PROMPT),
                "4" => self.prompt(State::AwaitSnoozeNumber, SNOOZE_PROMPT),
                "5" => self.prompt(State::AwaitStopOrPhrase, STOP_PROMPT),
                "6" => Step::Run(Command::Exit),
                _ => Step::Back("Invalid choice. Please try again.".to_string()),
            },
            State::AwaitTime => match parse_fire_at(line, now.date()) {
                Ok(fire_at) => self.prompt(State::AwaitDays(Alarm::new(fire_at)), DAYS_PROMPT),
                Err(e) => self.reprompt(State::AwaitTime, &e, TIME_PROMPT),
            },
            State::AwaitDays(mut alarm) => match parse_days(line) {
                Ok(days) => {
                    alarm.repeat_days = days;
                    self.prompt(State::AwaitDates(alarm), DATES_PROMPT)
                }
                Err(e) => self.reprompt(State::AwaitDays(alarm), &e, DAYS_PROMPT),
            },
            State::AwaitDates(mut alarm) => match parse_dates(line) {
                Ok(dates) => {
                    alarm.repeat_dates = dates;
                    self.prompt(State::AwaitMessage(alarm), MESSAGE_PROMPT)
                }
                Err(e) => self.reprompt(State::AwaitDates(alarm), &e, DATES_PROMPT),
            },
            State::AwaitMessage(mut alarm) => {
                alarm.message = non_blank(line);
                self.prompt(State::AwaitLocation(alarm), LOCATION_PROMPT)
            }
            State::AwaitLocation(mut alarm) => {
                alarm.location = non_blank(line);
                self.prompt(State::AwaitKind(alarm), KIND_PROMPT)
            }
            State::AwaitKind(mut alarm) => {
                let kind = if line.trim().is_empty() {
                    Ok(NotifyKind::default())
                } else {
                    line.parse()
                };
                match kind {
                    Ok(NotifyKind::Music) => {
                        alarm.notify_kind = NotifyKind::Music;
                        self.prompt(State::AwaitMusicFile(alarm), MUSIC_PROMPT)
                    }
                    Ok(kind) => {
                        alarm.notify_kind = kind;
                        Step::Run(Command::Set(alarm))
                    }
                    Err(e) => self.reprompt(State::AwaitKind(alarm), &e, KIND_PROMPT),
                }
            }
            State::AwaitMusicFile(mut alarm) => match non_blank(line) {
                Some(file) => {
                    alarm.music_file = Some(file);
                    Step::Run(Command::Set(alarm))
                }
                None => self.reprompt(
                    State::AwaitMusicFile(alarm),
                    &WakeyError::InvalidInputFormat("a music file path is required".to_string()),
                    MUSIC_PROMPT,
                ),
            },
            State::AwaitDeleteNumber => match parse_number(line) {
                Ok(number) => Step::Run(Command::Delete(number)),
                Err(e) => self.reprompt(State::AwaitDeleteNumber, &e, DELETE_PROMPT),
            },
            State::AwaitSnoozeNumber => match parse_number(line) {
                Ok(number) => self.prompt(State::AwaitSnoozeMinutes(number), MINUTES_PROMPT),
                Err(e) => self.reprompt(State::AwaitSnoozeNumber, &e, SNOOZE_PROMPT),
            },
            State::AwaitSnoozeMinutes(number) => match parse_minutes(line) {
                Ok(minutes) => Step::Run(Command::Snooze { number, minutes }),
                Err(e) => self.reprompt(State::AwaitSnoozeMinutes(number), &e, MINUTES_PROMPT),
            },
            State::AwaitStopOrPhrase => {
                if let Ok(number) = parse_number(line) {
                    return Step::Run(Command::Stop(number));
                }
                match speech.recognize(line) {
                    Ok(phrase) => interpret_phrase(&phrase).map_or_else(
                        || Step::Back("Sorry, I didn't catch that.".to_string()),
                        Step::Run,
                    ),
                    Err(_) => Step::Back("Sorry, I didn't catch that.".to_string()),
                }
            }
        }
    }

    fn prompt(&mut self, next: State, text: &str) -> Step {
        self.state = next;
        Step::Prompt(text.to_string())
    }

    fn reprompt(&mut self, back_to: State, error: &WakeyError, text: &str) -> Step {
        self.state = back_to;
        Step::Prompt(format!("{error}\n{text}"))
    }
}

fn non_blank(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}

/// parse a trigger instant, either a full date-and-time or a
/// time-of-day on `today`
pub fn parse_fire_at(input: &str, today: NaiveDate) -> Result<NaiveDateTime> {
    let input = input.trim();
    if let Ok(fire_at) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S") {
        return Ok(fire_at);
    }
    NaiveTime::parse_from_str(input, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(input, "%H:%M"))
        .map(|time| today.and_time(time))
        .map_err(|_| WakeyError::InvalidInputFormat(format!("'{input}' is not a time")))
}

pub fn parse_days(input: &str) -> Result<BTreeSet<Weekday>> {
    input
        .split([',', ' '])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::parse)
        .collect()
}

pub fn parse_dates(input: &str) -> Result<BTreeSet<NaiveDate>> {
    input
        .split([',', ' '])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            NaiveDate::parse_from_str(part, "%Y-%m-%d")
                .map_err(|_| WakeyError::InvalidInputFormat(format!("'{part}' is not a date")))
        })
        .collect()
}

fn parse_number(input: &str) -> Result<usize> {
    input.trim().parse().map_err(|_| {
        WakeyError::InvalidInputFormat(format!("'{}' is not a number", input.trim()))
    })
}

fn parse_minutes(input: &str) -> Result<i64> {
    let minutes: i64 = input.trim().parse().map_err(|_| {
        WakeyError::InvalidInputFormat(format!("'{}' is not a number", input.trim()))
    })?;
    if minutes < 1 {
        return Err(WakeyError::InvalidInputFormat(
            "snooze duration must be at least one minute".to_string(),
        ));
    }
    Ok(minutes)
}

/// turn a recognized phrase into a command.
/// understands "stop [alarm] N" and "snooze [alarm] N [for] M [minutes]"
#[must_use]
pub fn interpret_phrase(phrase: &str) -> Option<Command> {
    let words: Vec<&str> = phrase.split_whitespace().collect();
    let verb = words.first()?;
    let numbers: Vec<usize> = words.iter().filter_map(|word| word.parse().ok()).collect();
    match (*verb, numbers.as_slice()) {
        ("stop", [number]) => Some(Command::Stop(*number)),
        ("snooze", [number, minutes]) => Some(Command::Snooze {
            number: *number,
            minutes: *minutes as i64,
        }),
        _ => None,
    }
}
