//! Follows the game log and fires when the relic reward screen opens.
//!
//! The log is polled rather than watched: it lives inside a Proton prefix,
//! where inotify events are not always delivered. Lines can arrive in
//! pieces, so a trailing line without a newline is held back until the rest
//! of it is written.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use regex::RegexSet;

/// Reads lines appended to a file since the last call.
pub struct LogTail {
    path: PathBuf,
    position: u64,
    fragment: Vec<u8>,
}

impl LogTail {
    /// Starts at the current end of the file; existing content is skipped.
    pub fn open_at_end(path: &Path) -> Result<Self> {
        let position = std::fs::metadata(path)
            .with_context(|| format!("Cannot open log file {}", path.display()))?
            .len();
        Ok(Self {
            path: path.to_path_buf(),
            position,
            fragment: Vec::new(),
        })
    }

    /// Returns complete new lines, without line terminators.
    ///
    /// A file that got shorter was restarted by the game and is read again
    /// from the beginning.
    pub fn read_lines(&mut self) -> Result<Vec<String>> {
        let mut file = File::open(&self.path)
            .with_context(|| format!("Cannot open log file {}", self.path.display()))?;
        let len = file.metadata()?.len();

        if len < self.position {
            log::info!("{} was truncated, reading from the start", self.path.display());
            self.position = 0;
            self.fragment.clear();
        }
        if len == self.position {
            return Ok(Vec::new());
        }

        file.seek(SeekFrom::Start(self.position))?;
        let mut buf = Vec::with_capacity((len - self.position) as usize);
        file.take(len - self.position).read_to_end(&mut buf)?;
        self.position += buf.len() as u64;

        self.fragment.extend_from_slice(&buf);
        let mut lines = Vec::new();
        while let Some(end) = self.fragment.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.fragment.drain(..=end).collect();
            let text = String::from_utf8_lossy(&line);
            lines.push(text.trim_end_matches(['\r', '\n']).to_string());
        }
        Ok(lines)
    }
}

/// Recognises reward-screen log lines.
pub struct TriggerMatcher {
    set: RegexSet,
}

impl TriggerMatcher {
    /// Each pattern is a literal substring.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let set = RegexSet::new(patterns.iter().map(|p| regex::escape(p.as_ref())))
            .context("Invalid trigger pattern")?;
        Ok(Self { set })
    }

    pub fn is_trigger(&self, line: &str) -> bool {
        self.set.is_match(line.trim())
    }
}

/// Allows one event per period.
pub struct Cooldown {
    period: Duration,
    last: Option<Instant>,
}

impl Cooldown {
    pub fn new(period: Duration) -> Self {
        Self { period, last: None }
    }

    /// True (and restarts the period) when the last accepted event is at
    /// least `period` before `now`.
    pub fn try_fire(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last {
            if now.saturating_duration_since(last) < self.period {
                return false;
            }
        }
        self.last = Some(now);
        true
    }
}

/// Polls `tail` until `stop` is set, calling `on_trigger` for every trigger
/// line that is not suppressed by the cooldown.
pub fn watch(
    tail: &mut LogTail,
    triggers: &TriggerMatcher,
    cooldown: &mut Cooldown,
    poll_interval: Duration,
    stop: &AtomicBool,
    mut on_trigger: impl FnMut(),
) -> Result<()> {
    while !stop.load(Ordering::SeqCst) {
        let lines = match tail.read_lines() {
            Ok(lines) => lines,
            Err(e) => {
                log::warn!("{:#}", e);
                Vec::new()
            }
        };

        for line in lines {
            if !triggers.is_trigger(&line) {
                continue;
            }
            if cooldown.try_fire(Instant::now()) {
                log::info!("Reward screen detected");
                on_trigger();
            } else {
                log::debug!("Trigger ignored during cooldown: {}", line.trim());
            }
        }

        thread::sleep(poll_interval);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::OpenOptions;
    use std::io::Write;

    fn append(path: &Path, text: &str) {
        let mut file = OpenOptions::new().append(true).open(path).unwrap();
        file.write_all(text.as_bytes()).unwrap();
    }

    #[test]
    fn test_tail_skips_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("EE.log");
        std::fs::write(&path, "old line\n").unwrap();

        let mut tail = LogTail::open_at_end(&path).unwrap();
        assert!(tail.read_lines().unwrap().is_empty());

        append(&path, "new line\r\nsecond\n");
        assert_eq!(tail.read_lines().unwrap(), vec!["new line", "second"]);
    }

    #[test]
    fn test_tail_buffers_partial_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("EE.log");
        std::fs::write(&path, "").unwrap();
        let mut tail = LogTail::open_at_end(&path).unwrap();

        append(&path, "123.456 Script [Info]: ProjectionReward");
        assert!(tail.read_lines().unwrap().is_empty());

        append(&path, "Choice.lua: Relic rewards initialized\nnext");
        assert_eq!(
            tail.read_lines().unwrap(),
            vec!["123.456 Script [Info]: ProjectionRewardChoice.lua: Relic rewards initialized"]
        );

        append(&path, "\n");
        assert_eq!(tail.read_lines().unwrap(), vec!["next"]);
    }

    #[test]
    fn test_tail_restarts_after_truncation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("EE.log");
        std::fs::write(&path, "a long first session\n").unwrap();
        let mut tail = LogTail::open_at_end(&path).unwrap();

        std::fs::write(&path, "new\n").unwrap();
        assert_eq!(tail.read_lines().unwrap(), vec!["new"]);
    }

    #[test]
    fn test_tail_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(LogTail::open_at_end(&dir.path().join("EE.log")).is_err());
    }

    #[test]
    fn test_trigger_matcher() {
        let config = crate::config::AppConfig::default();
        let triggers = TriggerMatcher::new(&config.trigger_patterns).unwrap();

        assert!(triggers.is_trigger(
            "4477.123 Script [Info]: VoidProjections: OpenVoidProjectionRewardScreenRMI"
        ));
        assert!(triggers.is_trigger(
            "4477.200 Script [Info]: ProjectionRewardChoice.lua: Relic rewards initialized"
        ));
        assert!(triggers.is_trigger("VoidProjections: GetVoidProjectionRewards"));
        assert!(!triggers.is_trigger("4477.300 Sys [Info]: VoidProjections: something else"));
        assert!(!triggers.is_trigger(""));
    }

    #[test]
    fn test_trigger_patterns_are_literal() {
        let triggers = TriggerMatcher::new(&["a.lua (x)"]).unwrap();
        assert!(triggers.is_trigger("load a.lua (x) ok"));
        assert!(!triggers.is_trigger("load aXlua (x) ok"));
    }

    #[test]
    fn test_cooldown() {
        let start = Instant::now();
        let mut cooldown = Cooldown::new(Duration::from_secs(60));

        assert!(cooldown.try_fire(start));
        assert!(!cooldown.try_fire(start + Duration::from_secs(10)));
        assert!(!cooldown.try_fire(start + Duration::from_secs(59)));
        assert!(cooldown.try_fire(start + Duration::from_secs(60)));
        assert!(!cooldown.try_fire(start + Duration::from_secs(61)));
    }

    #[test]
    fn test_watch_fires_once_per_cooldown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("EE.log");
        std::fs::write(&path, "").unwrap();

        let mut tail = LogTail::open_at_end(&path).unwrap();
        let triggers = TriggerMatcher::new(&["GetVoidProjectionRewards"]).unwrap();
        let mut cooldown = Cooldown::new(Duration::from_secs(60));
        let stop = AtomicBool::new(false);

        append(&path, "GetVoidProjectionRewards\nnoise\nGetVoidProjectionRewards\n");

        let mut fired = 0;
        watch(&mut tail, &triggers, &mut cooldown, Duration::from_millis(1), &stop, || {
            fired += 1;
            stop.store(true, Ordering::SeqCst);
        })
        .unwrap();

        assert_eq!(fired, 1);
    }
}
