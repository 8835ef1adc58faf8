use std::{
    io::BufReader,
    path::{Path, PathBuf},
    time::Duration,
};

use chrono::NaiveDateTime;
use rodio::{source::SineWave, Source};
use serde::{Deserialize, Serialize};

use crate::{
    alarm::{Alarm, NotifyKind},
    config::Config,
    error::{Result, WakeyError},
};

/// OS modal dialog: title and message in, nothing out
pub trait ModalDialog {
    fn show(&self, title: &str, message: &str) -> Result<()>;
}

/// OS beep / sound-file player: frequency and duration or a file path in,
/// nothing out
pub trait SoundPlayer {
    fn beep(&self, frequency_hz: u32, duration_ms: u64) -> Result<()>;
    fn play_file(&self, path: &Path) -> Result<()>;
}

/// calendar read API: time range in, next event out
pub trait CalendarSource {
    fn next_event(&self, from: NaiveDateTime, to: NaiveDateTime)
        -> Result<Option<CalendarEvent>>;
}

/// speech-to-text engine: raw text in, recognized phrase out
pub trait SpeechToText {
    fn recognize(&self, raw: &str) -> Result<String>;
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CalendarEvent {
    #[serde(with = "toml_datetime_compat")]
    pub starts_at: NaiveDateTime,
    pub summary: String,
}

impl CalendarEvent {
    /// the string stored into an alarm's `calendar_event` field
    #[must_use]
    pub fn describe(&self, time_format: &str) -> String {
        format!("{} at {}", self.summary, self.starts_at.format(time_format))
    }
}

/// blocking modal dialog via the system dialog crate
#[derive(Debug, Default)]
pub struct RfdDialog;

impl ModalDialog for RfdDialog {
    fn show(&self, title: &str, message: &str) -> Result<()> {
        rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Info)
            .set_title(title)
            .set_description(message)
            .set_buttons(rfd::MessageButtons::Ok)
            .show();
        Ok(())
    }
}

/// tone and file playback through the default audio output
#[derive(Debug, Default)]
pub struct RodioPlayer;

impl SoundPlayer for RodioPlayer {
    fn beep(&self, frequency_hz: u32, duration_ms: u64) -> Result<()> {
        let stream = rodio::OutputStreamBuilder::open_default_stream()
            .map_err(|e| WakeyError::ResourceUnavailable(format!("no audio output: {e}")))?;
        let sink = rodio::Sink::connect_new(stream.mixer());
        sink.append(
            SineWave::new(frequency_hz as f32)
                .take_duration(Duration::from_millis(duration_ms))
                .amplify(0.20),
        );
        sink.sleep_until_end();
        Ok(())
    }

    fn play_file(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::open(path).map_err(|_| {
            WakeyError::ResourceUnavailable(format!("file not found: {}", path.display()))
        })?;
        let source = rodio::Decoder::new(BufReader::new(file)).map_err(|e| {
            WakeyError::ResourceUnavailable(format!("couldn't decode {}: {e}", path.display()))
        })?;
        let stream = rodio::OutputStreamBuilder::open_default_stream()
            .map_err(|e| WakeyError::ResourceUnavailable(format!("no audio output: {e}")))?;
        let sink = rodio::Sink::connect_new(stream.mixer());
        sink.append(source);
        sink.sleep_until_end();
        Ok(())
    }
}

/// calendar backed by a flat toml file of events.
/// a missing file means no events, not an error
#[derive(Debug)]
pub struct FileCalendar {
    path: PathBuf,
}

#[derive(Debug, Deserialize, Default)]
struct CalendarFile {
    #[serde(default)]
    events: Vec<CalendarEvent>,
}

impl FileCalendar {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl CalendarSource for FileCalendar {
    fn next_event(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Option<CalendarEvent>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)?;
        let calendar: CalendarFile = toml::from_str(&contents)?;
        Ok(calendar
            .events
            .into_iter()
            .filter(|event| event.starts_at >= from && event.starts_at < to)
            .min_by_key(|event| event.starts_at))
    }
}

/// treats typed text as if it had been spoken, normalized the way a
/// recognizer would return it
#[derive(Debug, Default)]
pub struct TypedSpeech;

impl SpeechToText for TypedSpeech {
    fn recognize(&self, raw: &str) -> Result<String> {
        let phrase = raw
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        if phrase.is_empty() {
            return Err(WakeyError::InvalidInputFormat(
                "heard nothing".to_string(),
            ));
        }
        Ok(phrase)
    }
}

/// picks and fires exactly one notification action per due alarm.
/// failures are reported, never fatal
pub struct Dispatcher {
    dialog: Box<dyn ModalDialog>,
    player: Box<dyn SoundPlayer>,
    beep_frequency_hz: u32,
    beep_duration_ms: u64,
}

impl Dispatcher {
    #[must_use]
    pub fn new(dialog: Box<dyn ModalDialog>, player: Box<dyn SoundPlayer>, config: &Config) -> Self {
        Self {
            dialog,
            player,
            beep_frequency_hz: config.beep_frequency_hz,
            beep_duration_ms: config.beep_duration_ms,
        }
    }

    #[must_use]
    pub fn with_defaults(config: &Config) -> Self {
        Self::new(Box::new(RfdDialog), Box::new(RodioPlayer), config)
    }

    pub fn dispatch(&self, alarm: &Alarm) {
        log::info!("alarm due, dispatching as {}", alarm.notify_kind);
        let outcome = match alarm.notify_kind {
            NotifyKind::Popup => {
                let message = alarm.message.as_deref().unwrap_or("Wake up!");
                self.dialog.show("Alarm", message)
            }
            NotifyKind::Sound => self
                .player
                .beep(self.beep_frequency_hz, self.beep_duration_ms),
            NotifyKind::Music => match &alarm.music_file {
                Some(file) if Path::new(file).exists() => self.player.play_file(Path::new(file)),
                Some(file) => Err(WakeyError::ResourceUnavailable(format!(
                    "file not found: {file}"
                ))),
                None => Err(WakeyError::ResourceUnavailable(
                    "no music file set for this alarm".to_string(),
                )),
            },
            NotifyKind::Calendar => {
                match &alarm.calendar_event {
                    Some(event) => println!("\nAlarm! Next event: {event}"),
                    None => println!("\nAlarm! No calendar event was captured."),
                }
                Ok(())
            }
        };
        if let Err(e) = outcome {
            log::warn!("notification failed: {e}");
            println!("Couldn't deliver the notification: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::{cell::RefCell, rc::Rc};

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[derive(Default, Clone)]
    struct RecordingDialog {
        shown: Rc<RefCell<Vec<(String, String)>>>,
    }

    impl ModalDialog for RecordingDialog {
        fn show(&self, title: &str, message: &str) -> Result<()> {
            self.shown
                .borrow_mut()
                .push((title.to_string(), message.to_string()));
            Ok(())
        }
    }

    #[derive(Default, Clone)]
    struct RecordingPlayer {
        beeps: Rc<RefCell<Vec<(u32, u64)>>>,
        files: Rc<RefCell<Vec<PathBuf>>>,
    }

    impl SoundPlayer for RecordingPlayer {
        fn beep(&self, frequency_hz: u32, duration_ms: u64) -> Result<()> {
            self.beeps.borrow_mut().push((frequency_hz, duration_ms));
            Ok(())
        }

        fn play_file(&self, path: &Path) -> Result<()> {
            self.files.borrow_mut().push(path.to_path_buf());
            Ok(())
        }
    }

    fn dispatcher(
        dialog: &RecordingDialog,
        player: &RecordingPlayer,
        config: &Config,
    ) -> Dispatcher {
        Dispatcher::new(Box::new(dialog.clone()), Box::new(player.clone()), config)
    }

    #[test]
    fn popup_shows_the_message_or_a_default() {
        let dialog = RecordingDialog::default();
        let player = RecordingPlayer::default();
        let dispatcher = dispatcher(&dialog, &player, &Config::default());

        let mut alarm = Alarm::new(at(1, 7));
        dispatcher.dispatch(&alarm);
        alarm.message = Some("stand up".to_string());
        dispatcher.dispatch(&alarm);

        let shown = dialog.shown.borrow();
        assert_eq!(shown[0], ("Alarm".to_string(), "Wake up!".to_string()));
        assert_eq!(shown[1], ("Alarm".to_string(), "stand up".to_string()));
        assert!(player.beeps.borrow().is_empty());
    }

    #[test]
    fn sound_beeps_with_the_configured_tone() {
        let dialog = RecordingDialog::default();
        let player = RecordingPlayer::default();
        let config = Config {
            beep_frequency_hz: 440,
            beep_duration_ms: 500,
            ..Config::default()
        };
        let dispatcher = dispatcher(&dialog, &player, &config);

        let mut alarm = Alarm::new(at(1, 7));
        alarm.notify_kind = NotifyKind::Sound;
        dispatcher.dispatch(&alarm);

        assert_eq!(player.beeps.borrow().as_slice(), &[(440, 500)]);
        assert!(dialog.shown.borrow().is_empty());
    }

    #[test]
    fn music_with_missing_file_takes_no_sound_action() {
        let dialog = RecordingDialog::default();
        let player = RecordingPlayer::default();
        let dispatcher = dispatcher(&dialog, &player, &Config::default());

        let mut alarm = Alarm::new(at(1, 7));
        alarm.notify_kind = NotifyKind::Music;
        alarm.music_file = Some("/definitely/not/here.mp3".to_string());
        dispatcher.dispatch(&alarm);

        assert!(player.files.borrow().is_empty());
        assert!(player.beeps.borrow().is_empty());
    }

    #[test]
    fn file_calendar_returns_the_next_event_in_range() {
        let dir = std::env::temp_dir().join("wakey-test-calendar");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("calendar.toml");
        std::fs::write(
            &path,
            "[[events]]\nstarts_at = 2024-01-02 09:00:00\nsummary = \"dentist\"\n\n\
             [[events]]\nstarts_at = 2024-01-01 09:00:00\nsummary = \"standup\"\n\n\
             [[events]]\nstarts_at = 2024-01-05 09:00:00\nsummary = \"too late\"\n",
        )
        .unwrap();

        let calendar = FileCalendar::new(path.clone());
        let event = calendar.next_event(at(1, 8), at(3, 8)).unwrap().unwrap();
        assert_eq!(event.summary, "standup");
        assert_eq!(event.starts_at, at(1, 9));

        // nothing in range
        assert!(calendar.next_event(at(6, 0), at(7, 0)).unwrap().is_none());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn file_calendar_with_no_file_has_no_events() {
        let calendar = FileCalendar::new(PathBuf::from("/definitely/not/here.toml"));
        assert!(calendar.next_event(at(1, 0), at(2, 0)).unwrap().is_none());
    }

    #[test]
    fn typed_speech_normalizes_the_phrase() {
        let speech = TypedSpeech;
        assert_eq!(
            speech.recognize("  STOP   Alarm 2 ").unwrap(),
            "stop alarm 2"
        );
        assert!(speech.recognize("   ").is_err());
    }
}
