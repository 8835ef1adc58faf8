#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(clippy::use_self, rust_2018_idioms)]
#![allow(clippy::multiple_crate_versions, clippy::module_name_repetitions)]

use std::{
    ops::ControlFlow,
    sync::mpsc::{Receiver, RecvTimeoutError},
    time::Duration,
};

use chrono::NaiveDateTime;

use crate::{
    alarm::{Alarm, NotifyKind},
    command::{Command, Menu, Step, MENU},
    config::Config,
    notify::{CalendarSource, Dispatcher, SpeechToText},
    store::AlarmStore,
};

pub mod alarm;
pub mod command;
pub mod config;
pub mod error;
pub mod notify;
pub mod store;

/// whether a notification is in flight this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    #[default]
    Idle,
    Dispatching,
}

/// the clock itself: owns the store, the menu front end and the
/// notification boundary, and runs the one-second polling loop
pub struct Clock {
    config: Config,
    store: AlarmStore,
    menu: Menu,
    dispatcher: Dispatcher,
    calendar: Box<dyn CalendarSource>,
    speech: Box<dyn SpeechToText>,
    state: LoopState,
}

impl Clock {
    #[must_use]
    pub fn new(
        config: Config,
        store: AlarmStore,
        dispatcher: Dispatcher,
        calendar: Box<dyn CalendarSource>,
        speech: Box<dyn SpeechToText>,
    ) -> Self {
        Self {
            config,
            store,
            menu: Menu::new(),
            dispatcher,
            calendar,
            speech,
            state: LoopState::Idle,
        }
    }

    /// the control loop. input lines arrive over the channel from the
    /// stdin reader thread, so user commands and ticks interleave on
    /// this one thread and the store never needs a lock.
    /// returns when the user exits or stdin closes
    pub fn run(&mut self, lines: &Receiver<String>) {
        println!("{MENU}");
        loop {
            match lines.recv_timeout(Duration::from_secs(1)) {
                Ok(line) => {
                    let now = chrono::Local::now().naive_local();
                    match self.menu.feed(&line, now, self.speech.as_ref()) {
                        Step::Prompt(text) => println!("{text}"),
                        Step::Run(command) => {
                            if self.execute(command).is_break() {
                                break;
                            }
                            println!("{MENU}");
                        }
                        Step::Back(text) => {
                            println!("{text}");
                            println!("{MENU}");
                        }
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    self.tick(chrono::Local::now().naive_local());
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        self.save();
    }

    /// one pass of the polling loop: at most one due alarm is
    /// dispatched per tick, the first in store order. after dispatch
    /// the loop is idle again, an alarm that is still due gets
    /// dispatched again on the next tick
    pub fn tick(&mut self, now: NaiveDateTime) {
        if self.state != LoopState::Idle {
            return;
        }
        if let Some(alarm) = self.store.first_due(now) {
            self.state = LoopState::Dispatching;
            self.dispatcher.dispatch(alarm);
            self.state = LoopState::Idle;
        }
    }

    fn execute(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::Set(mut alarm) => {
                if alarm.notify_kind == NotifyKind::Calendar {
                    self.capture_calendar_event(&mut alarm);
                }
                log::info!("alarm set for {}", alarm.fire_at);
                self.store.add(alarm);
                self.save();
                println!("Alarm set successfully!");
            }
            Command::Display => self.display_alarms(),
            Command::Delete(number) => match self.store.remove_at(number) {
                Ok(removed) => {
                    log::info!("deleted alarm for {}", removed.fire_at);
                    self.save();
                    println!("Alarm deleted successfully!");
                }
                Err(e) => println!("{e}"),
            },
            Command::Snooze { number, minutes } => match self.store.get_mut(number) {
                Ok(alarm) => {
                    alarm.snooze(minutes);
                    self.save();
                    println!("Alarm snoozed successfully!");
                }
                Err(e) => println!("{e}"),
            },
            Command::Stop(number) => match self.store.get_mut(number) {
                Ok(alarm) => {
                    alarm.stop();
                    self.save();
                    println!("Alarm stopped successfully!");
                }
                Err(e) => println!("{e}"),
            },
            Command::Exit => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    /// alarms that notify from the calendar capture the next event at
    /// set time, so firing never needs the calendar to be reachable
    fn capture_calendar_event(&self, alarm: &mut Alarm) {
        let from = alarm.fire_at;
        let to = from + chrono::Duration::hours(24);
        match self.calendar.next_event(from, to) {
            Ok(Some(event)) => {
                alarm.calendar_event = Some(event.describe(&self.config.time_format));
            }
            Ok(None) => println!("No calendar event in the day after the alarm."),
            Err(e) => {
                log::warn!("calendar lookup failed: {e}");
                println!("Couldn't read the calendar: {e}");
            }
        }
    }

    fn display_alarms(&self) {
        if self.store.is_empty() {
            println!("No alarms set.");
            return;
        }
        println!("Alarms:");
        for (i, alarm) in self.store.list().iter().enumerate() {
            println!("{}. {}", i + 1, alarm.describe(&self.config.time_format));
        }
    }

    fn save(&self) {
        if let Err(e) = self.store.snapshot() {
            log::warn!("couldn't save alarms: {e}");
            println!("Warning: couldn't save alarms: {e}");
        }
    }
}
