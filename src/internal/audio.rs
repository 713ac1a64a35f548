//! Audio narration playback.
//!
//! Playback is delegated to an external player process. The [`AudioPlayer`]
//! holds at most one playback at a time: starting a new one always stops the
//! current one first.

use anyhow::{Context, Result};
use std::process::{Child, Command, Stdio};

/// Identifies what a playback belongs to, so a second press on the same item
/// stops it instead of restarting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackKey {
    ResultCard,
    Monument(String),
}

/// A running playback.
pub trait Playback: Send {
    fn stop(&mut self);
    fn is_finished(&mut self) -> bool;
}

/// Something that can start playing a URL.
pub trait AudioSink: Send {
    fn start(&self, url: &str) -> Result<Box<dyn Playback>>;
}

/// Plays through a command line player such as `ffplay` or `mpv`.
#[derive(Debug, Clone)]
pub struct CommandSink {
    program: String,
    args: Vec<String>,
}

impl CommandSink {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl AudioSink for CommandSink {
    fn start(&self, url: &str) -> Result<Box<dyn Playback>> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to launch audio player '{}'", self.program))?;
        tracing::debug!(pid = child.id(), program = %self.program, "Audio player started");
        Ok(Box::new(ChildPlayback { child }))
    }
}

struct ChildPlayback {
    child: Child,
}

impl Playback for ChildPlayback {
    fn stop(&mut self) {
        if let Err(e) = self.child.kill() {
            tracing::debug!("Audio player already exited: {}", e);
        }
        let _ = self.child.wait();
    }

    fn is_finished(&mut self) -> bool {
        !matches!(self.child.try_wait(), Ok(None))
    }
}

pub struct AudioPlayer {
    sink: Box<dyn AudioSink>,
    current: Option<(PlaybackKey, Box<dyn Playback>)>,
}

impl AudioPlayer {
    pub fn new(sink: Box<dyn AudioSink>) -> Self {
        Self {
            sink,
            current: None,
        }
    }

    pub fn is_playing(&self, key: &PlaybackKey) -> bool {
        matches!(&self.current, Some((k, _)) if k == key)
    }

    pub fn is_idle(&self) -> bool {
        self.current.is_none()
    }

    /// Stop `key` if it is playing, otherwise start it (stopping whatever else
    /// was playing). Returns whether `key` is now playing.
    pub fn toggle(&mut self, key: PlaybackKey, url: &str) -> Result<bool> {
        if self.is_playing(&key) {
            self.stop();
            return Ok(false);
        }
        self.stop();
        let playback = self.sink.start(url)?;
        tracing::info!(?key, url, "Audio playback started");
        self.current = Some((key, playback));
        Ok(true)
    }

    pub fn stop(&mut self) {
        if let Some((key, mut playback)) = self.current.take() {
            playback.stop();
            tracing::info!(?key, "Audio playback stopped");
        }
    }

    /// Drop a playback that ended on its own. Returns true if one did.
    pub fn poll(&mut self) -> bool {
        let finished = match &mut self.current {
            Some((_, playback)) => playback.is_finished(),
            None => false,
        };
        if finished {
            self.current = None;
        }
        finished
    }
}

impl Drop for AudioPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    struct Recorder {
        events: Arc<Mutex<Vec<String>>>,
        finished: Arc<AtomicBool>,
    }

    struct FakePlayback {
        url: String,
        recorder: Recorder,
    }

    impl Playback for FakePlayback {
        fn stop(&mut self) {
            self.recorder
                .events
                .lock()
                .unwrap()
                .push(format!("stop {}", self.url));
        }

        fn is_finished(&mut self) -> bool {
            self.recorder.finished.load(Ordering::SeqCst)
        }
    }

    impl AudioSink for Recorder {
        fn start(&self, url: &str) -> Result<Box<dyn Playback>> {
            self.events.lock().unwrap().push(format!("start {}", url));
            Ok(Box::new(FakePlayback {
                url: url.to_string(),
                recorder: self.clone(),
            }))
        }
    }

    struct BrokenSink;

    impl AudioSink for BrokenSink {
        fn start(&self, _url: &str) -> Result<Box<dyn Playback>> {
            anyhow::bail!("no player installed")
        }
    }

    fn monument(id: &str) -> PlaybackKey {
        PlaybackKey::Monument(id.to_string())
    }

    #[test]
    fn starting_b_stops_a_first() {
        let recorder = Recorder::default();
        let mut player = AudioPlayer::new(Box::new(recorder.clone()));

        assert!(player.toggle(monument("a"), "a.mp3").unwrap());
        assert!(player.toggle(monument("b"), "b.mp3").unwrap());

        assert!(player.is_playing(&monument("b")));
        assert!(!player.is_playing(&monument("a")));
        assert_eq!(
            *recorder.events.lock().unwrap(),
            vec!["start a.mp3", "stop a.mp3", "start b.mp3"]
        );
    }

    #[test]
    fn toggling_same_key_stops() {
        let recorder = Recorder::default();
        let mut player = AudioPlayer::new(Box::new(recorder.clone()));

        assert!(player.toggle(PlaybackKey::ResultCard, "n.mp3").unwrap());
        assert!(!player.toggle(PlaybackKey::ResultCard, "n.mp3").unwrap());
        assert!(player.is_idle());
        assert_eq!(
            *recorder.events.lock().unwrap(),
            vec!["start n.mp3", "stop n.mp3"]
        );
    }

    #[test]
    fn natural_end_returns_to_stopped() {
        let recorder = Recorder::default();
        let mut player = AudioPlayer::new(Box::new(recorder.clone()));
        player.toggle(PlaybackKey::ResultCard, "n.mp3").unwrap();

        assert!(!player.poll());
        recorder.finished.store(true, Ordering::SeqCst);
        assert!(player.poll());
        assert!(!player.is_playing(&PlaybackKey::ResultCard));
    }

    #[test]
    fn failed_start_leaves_player_idle() {
        let mut player = AudioPlayer::new(Box::new(BrokenSink));
        assert!(player.toggle(PlaybackKey::ResultCard, "n.mp3").is_err());
        assert!(player.is_idle());
    }

    #[test]
    fn drop_stops_playback() {
        let recorder = Recorder::default();
        {
            let mut player = AudioPlayer::new(Box::new(recorder.clone()));
            player.toggle(monument("a"), "a.mp3").unwrap();
        }
        assert_eq!(
            recorder.events.lock().unwrap().last().map(String::as_str),
            Some("stop a.mp3")
        );
    }
}
