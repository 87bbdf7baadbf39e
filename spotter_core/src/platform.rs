//! Desktop implementations of the cue and wake lock backends.
//!
//! - Sound: the terminal bell, one bell per tone of the cue
//! - Speech: an external speech program (`spd-say`, `espeak-ng`, `espeak`,
//!   `say`) found on PATH, or the one configured under `[speech]`
//! - Vibration: not available on desktops
//! - Wake lock: a `systemd-inhibit` child process held for the session

use crate::config::{NotificationSettings, SpeechConfig};
use crate::notify::{Notifier, SoundCue, SoundOutput, SpeechOutput, Unsupported};
use crate::wake_lock::{NoWakeLock, ScreenWakeLock, WakeLockHandle, WakeLockProvider};
use crate::Result;
use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

const SPEECH_PROGRAMS: &[&str] = &["spd-say", "espeak-ng", "espeak", "say"];

/// Locate an executable on the current PATH
pub fn find_on_path(program: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    find_in(std::env::split_paths(&path), program)
}

fn find_in(dirs: impl IntoIterator<Item = PathBuf>, program: &str) -> Option<PathBuf> {
    dirs.into_iter()
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

/// Resolve a configured program: an existing path is used as-is,
/// anything else is looked up on PATH
fn resolve_program(program: &str) -> Option<PathBuf> {
    let as_path = Path::new(program);
    if as_path.components().count() > 1 {
        return as_path.is_file().then(|| as_path.to_path_buf());
    }
    find_on_path(program)
}

// ============================================================================
// Sound
// ============================================================================

/// Rings the terminal bell on stderr
#[derive(Clone, Copy, Debug, Default)]
pub struct TerminalBell;

impl SoundOutput for TerminalBell {
    fn play(&mut self, cue: SoundCue, volume: f32) -> Result<()> {
        if volume <= 0.0 {
            return Ok(());
        }
        let bells = "\x07".repeat(cue.tones().len());
        let mut stderr = std::io::stderr();
        stderr.write_all(bells.as_bytes())?;
        stderr.flush()?;
        Ok(())
    }
}

// ============================================================================
// Speech
// ============================================================================

/// Speaks through an external program, without waiting for it to finish
pub struct CommandSpeech {
    program: Option<PathBuf>,
    children: Vec<Child>,
}

impl CommandSpeech {
    /// Use the configured program, or the first known speech program on PATH
    pub fn detect(config: &SpeechConfig) -> Self {
        let program = match config.command.as_deref() {
            Some(command) => {
                let resolved = resolve_program(command);
                if resolved.is_none() {
                    tracing::warn!("Configured speech command {:?} not found", command);
                }
                resolved
            }
            None => SPEECH_PROGRAMS.iter().find_map(|p| find_on_path(p)),
        };

        if let Some(ref program) = program {
            tracing::debug!("Using speech program {:?}", program);
        }

        Self {
            program,
            children: Vec::new(),
        }
    }

    /// Collect speech processes that have exited
    fn reap(&mut self) {
        self.children
            .retain_mut(|child| matches!(child.try_wait(), Ok(None)));
    }
}

impl SpeechOutput for CommandSpeech {
    fn is_supported(&self) -> bool {
        self.program.is_some()
    }

    fn speak(&mut self, text: &str) -> Result<()> {
        self.reap();
        let Some(ref program) = self.program else {
            return Ok(());
        };

        let child = Command::new(program)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        self.children.push(child);
        Ok(())
    }
}

impl Drop for CommandSpeech {
    fn drop(&mut self) {
        self.reap();
    }
}

// ============================================================================
// Wake lock
// ============================================================================

/// Holds an idle/sleep inhibitor through `systemd-inhibit`
pub struct InhibitWakeLock {
    program: Option<PathBuf>,
}

impl InhibitWakeLock {
    pub fn detect() -> Self {
        Self {
            program: find_on_path("systemd-inhibit"),
        }
    }
}

impl WakeLockProvider for InhibitWakeLock {
    fn is_supported(&self) -> bool {
        self.program.is_some()
    }

    fn acquire(&mut self) -> Result<Box<dyn WakeLockHandle>> {
        let program = self
            .program
            .as_ref()
            .ok_or_else(|| crate::Error::Other("systemd-inhibit not available".into()))?;

        let child = Command::new(program)
            .args([
                OsStr::new("--what=idle:sleep"),
                OsStr::new("--who=spotter"),
                OsStr::new("--why=Guided workout in progress"),
                OsStr::new("--mode=block"),
                OsStr::new("sleep"),
                OsStr::new("infinity"),
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        Ok(Box::new(InhibitHandle { child }))
    }
}

struct InhibitHandle {
    child: Child,
}

impl WakeLockHandle for InhibitHandle {
    fn is_released(&mut self) -> bool {
        !matches!(self.child.try_wait(), Ok(None))
    }

    fn release(mut self: Box<Self>) -> Result<()> {
        if matches!(self.child.try_wait(), Ok(None)) {
            self.child.kill()?;
        }
        self.child.wait()?;
        Ok(())
    }
}

// ============================================================================
// Assembly
// ============================================================================

/// Notifier wired to the desktop backends
pub fn desktop_notifier(settings: NotificationSettings, speech: &SpeechConfig) -> Notifier {
    Notifier::new(
        settings,
        Box::new(TerminalBell),
        Box::new(Unsupported),
        Box::new(CommandSpeech::detect(speech)),
    )
}

/// Wake lock backed by `systemd-inhibit` when present
pub fn desktop_wake_lock() -> ScreenWakeLock {
    let provider = InhibitWakeLock::detect();
    if provider.is_supported() {
        ScreenWakeLock::new(Box::new(provider))
    } else {
        ScreenWakeLock::new(Box::new(NoWakeLock))
    }
}
