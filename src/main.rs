#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(clippy::use_self, rust_2018_idioms)]
#![allow(clippy::multiple_crate_versions)]

use std::{error::Error, io::BufRead, sync::mpsc, thread};

use clap::{Parser, Subcommand};
use wakey::{
    alarm::Alarm,
    command::{parse_days, parse_fire_at},
    config::Config,
    notify::{Dispatcher, FileCalendar, TypedSpeech},
    store::AlarmStore,
    Clock,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// write a default config file
    Init {
        #[clap(long, short)]
        force: bool,
    },
    /// add an alarm without entering the menu
    NewAlarm {
        /// HH:MM:SS (today) or "YYYY-MM-DD HH:MM:SS"
        time: String,
        #[clap(long, short)]
        message: Option<String>,
        /// weekdays to repeat on, e.g. "mon,wed"
        #[clap(long, short)]
        days: Option<String>,
        #[clap(long, short)]
        location: Option<String>,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    // initilize the logger
    simple_file_logger::init_logger!("wakey").expect("couldn't initialize logger");

    let args = Args::parse();
    match args.command {
        Some(Command::Init { force }) => {
            if force || !Config::is_config_present() {
                Config::new().save(&Config::config_path())?;
                println!("Wrote {}", Config::config_path().display());
            } else {
                println!("Config already present, use --force to overwrite.");
            }
            return Ok(());
        }
        Some(Command::NewAlarm {
            time,
            message,
            days,
            location,
        }) => {
            let now = chrono::Local::now().naive_local();
            let mut alarm = Alarm::new(parse_fire_at(&time, now.date())?);
            alarm.message = message;
            alarm.location = location;
            if let Some(days) = days {
                alarm.repeat_days = parse_days(&days)?;
            }
            let mut store = AlarmStore::open(Config::snapshot_path())?;
            store.add(alarm);
            store.snapshot()?;
            println!("Alarm set successfully!");
            return Ok(());
        }
        None => {}
    }

    let config = Config::load(&Config::config_path());
    let store = AlarmStore::open(Config::snapshot_path())?;
    let dispatcher = Dispatcher::with_defaults(&config);
    let calendar = FileCalendar::new(config.calendar_path());

    // feed stdin to the control loop line by line, the loop itself
    // only ever blocks for a second at a time
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let mut clock = Clock::new(
        config,
        store,
        dispatcher,
        Box::new(calendar),
        Box::new(TypedSpeech),
    );
    clock.run(&rx);
    Ok(())
}
