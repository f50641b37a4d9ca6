use anyhow::Result;
use std::time::{Duration, Instant};

pub const FOCUS_SECONDS: u32 = 25 * 60;
pub const BREAK_SECONDS: u32 = 5 * 60;

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    Focus,
    Break,
}

impl TimerMode {
    pub fn duration(self) -> u32 {
        match self {
            TimerMode::Focus => FOCUS_SECONDS,
            TimerMode::Break => BREAK_SECONDS,
        }
    }

    pub fn other(self) -> Self {
        match self {
            TimerMode::Focus => TimerMode::Break,
            TimerMode::Break => TimerMode::Focus,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimerMode::Focus => "Deep Work",
            TimerMode::Break => "Break Time",
        }
    }
}

/// The single pending one-second deadline. Dropping it cancels the tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTick {
    due_at: Instant,
}

impl ScheduledTick {
    fn after(now: Instant) -> Self {
        ScheduledTick { due_at: now + TICK }
    }

    fn is_due(&self, now: Instant) -> bool {
        now >= self.due_at
    }

    fn next(self) -> Self {
        ScheduledTick {
            due_at: self.due_at + TICK,
        }
    }
}

/// Side effect fired whenever the timer switches mode.
pub trait Notifier {
    fn notify(&self, mode: TimerMode) -> Result<()>;
}

/// Plays a stock desktop sound when a player is around, otherwise rings the
/// terminal bell.
pub struct SoundNotifier;

impl Notifier for SoundNotifier {
    fn notify(&self, _mode: TimerMode) -> Result<()> {
        const SOUNDS: [(&str, &str); 3] = [
            ("paplay", "/usr/share/sounds/freedesktop/stereo/complete.oga"),
            ("aplay", "/usr/share/sounds/sound-icons/guitar-11.wav"),
            ("aplay", "/usr/share/sounds/generic.wav"),
        ];

        if let Some((player, file)) = SOUNDS
            .iter()
            .find(|(_, file)| std::path::Path::new(file).exists())
        {
            let mut command = std::process::Command::new(player);
            command.arg(file);
            spawn_reaped(command)?;
            return Ok(());
        }

        use std::io::Write;
        let mut stdout = std::io::stdout();
        stdout.write_all(b"\x07")?;
        stdout.flush()?;
        Ok(())
    }
}

/// Starts a silent child and waits on it from a helper thread so it is
/// reaped without blocking the UI.
fn spawn_reaped(
    mut command: std::process::Command,
) -> Result<std::thread::JoinHandle<Option<std::process::ExitStatus>>> {
    let mut child = command
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()?;

    Ok(std::thread::spawn(move || match child.wait() {
        Ok(status) => Some(status),
        Err(e) => {
            log::debug!("sound player did not exit cleanly: {}", e);
            None
        }
    }))
}

pub struct Pomodoro {
    mode: TimerMode,
    remaining_seconds: u32,
    tick: Option<ScheduledTick>,
    notifier: Box<dyn Notifier>,
}

impl Pomodoro {
    pub fn new(notifier: Box<dyn Notifier>) -> Self {
        Pomodoro {
            mode: TimerMode::Focus,
            remaining_seconds: FOCUS_SECONDS,
            tick: None,
            notifier,
        }
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn is_running(&self) -> bool {
        self.tick.is_some()
    }

    pub fn start(&mut self, now: Instant) {
        if self.tick.is_none() {
            self.tick = Some(ScheduledTick::after(now));
            log::debug!("{:?} timer started at {}s", self.mode, self.remaining_seconds);
        }
    }

    pub fn pause(&mut self) {
        self.tick = None;
    }

    pub fn toggle(&mut self, now: Instant) {
        if self.is_running() {
            self.pause();
        } else {
            self.start(now);
        }
    }

    pub fn reset(&mut self) {
        self.tick = None;
        self.remaining_seconds = self.mode.duration();
    }

    pub fn switch_mode(&mut self) {
        self.tick = None;
        self.mode = self.mode.other();
        self.remaining_seconds = self.mode.duration();
        log::info!("pomodoro switched to {:?}", self.mode);

        if let Err(e) = self.notifier.notify(self.mode) {
            log::debug!("Notification failed: {:#}", e);
        }
    }

    /// Cancels any pending tick. Called when the timer owner goes away.
    pub fn teardown(&mut self) {
        self.tick = None;
    }

    /// Consumes one elapsed second. Returns the new mode when this second
    /// expired the countdown.
    pub fn advance(&mut self) -> Option<TimerMode> {
        if !self.is_running() {
            return None;
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.switch_mode();
            return Some(self.mode);
        }
        None
    }

    /// Runs every tick due at `now`. Expiry cancels the tick, so at most one
    /// switch happens per call.
    pub fn poll(&mut self, now: Instant) -> Option<TimerMode> {
        while let Some(tick) = self.tick {
            if !tick.is_due(now) {
                break;
            }
            self.tick = Some(tick.next());
            if let Some(mode) = self.advance() {
                return Some(mode);
            }
        }
        None
    }

    /// Fraction of the current mode still remaining, in 0.0..=1.0.
    pub fn progress(&self) -> f64 {
        f64::from(self.remaining_seconds) / f64::from(self.mode.duration())
    }

    pub fn format_clock(&self) -> String {
        format!(
            "{:02}:{:02}",
            self.remaining_seconds / 60,
            self.remaining_seconds % 60
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn sound_player_child_is_waited_on() {
        let handle = spawn_reaped(std::process::Command::new("true")).unwrap();
        let status = handle.join().unwrap();
        assert!(status.is_some_and(|s| s.success()));
    }

    struct Recording(Rc<RefCell<Vec<TimerMode>>>);

    impl Notifier for Recording {
        fn notify(&self, mode: TimerMode) -> Result<()> {
            self.0.borrow_mut().push(mode);
            Ok(())
        }
    }

    struct Failing;

    impl Notifier for Failing {
        fn notify(&self, _mode: TimerMode) -> Result<()> {
            anyhow::bail!("no audio device")
        }
    }

    fn recording_timer() -> (Pomodoro, Rc<RefCell<Vec<TimerMode>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        (Pomodoro::new(Box::new(Recording(log.clone()))), log)
    }

    #[test]
    fn fresh_timer_is_idle_focus() {
        let (timer, _) = recording_timer();
        assert_eq!(timer.mode(), TimerMode::Focus);
        assert_eq!(timer.remaining_seconds(), 1500);
        assert!(!timer.is_running());
        assert_eq!(timer.format_clock(), "25:00");
    }

    #[test]
    fn full_focus_session_switches_once_to_break() {
        let (mut timer, notified) = recording_timer();
        timer.start(Instant::now());

        let mut switches = 0;
        for _ in 0..1500 {
            if timer.advance().is_some() {
                switches += 1;
            }
        }

        assert_eq!(switches, 1);
        assert_eq!(timer.mode(), TimerMode::Break);
        assert_eq!(timer.remaining_seconds(), 300);
        assert!(!timer.is_running());
        assert_eq!(*notified.borrow(), vec![TimerMode::Break]);

        // Not running any more, so extra ticks change nothing
        assert_eq!(timer.advance(), None);
        assert_eq!(timer.remaining_seconds(), 300);
    }

    #[test]
    fn poll_far_in_the_future_expires_exactly_once() {
        let (mut timer, notified) = recording_timer();
        let start = Instant::now();
        timer.start(start);

        assert_eq!(timer.poll(start + Duration::from_secs(10_000)), Some(TimerMode::Break));
        assert_eq!(timer.remaining_seconds(), BREAK_SECONDS);
        assert!(!timer.is_running());
        assert_eq!(notified.borrow().len(), 1);
    }

    #[test]
    fn poll_counts_whole_seconds_only() {
        let (mut timer, _) = recording_timer();
        let start = Instant::now();
        timer.start(start);

        assert_eq!(timer.poll(start + Duration::from_millis(999)), None);
        assert_eq!(timer.remaining_seconds(), 1500);

        timer.poll(start + Duration::from_millis(3500));
        assert_eq!(timer.remaining_seconds(), 1497);
    }

    #[test]
    fn pause_keeps_remaining_time() {
        let (mut timer, _) = recording_timer();
        let start = Instant::now();
        timer.start(start);
        timer.poll(start + Duration::from_secs(5));
        timer.pause();

        assert!(!timer.is_running());
        timer.poll(start + Duration::from_secs(60));
        assert_eq!(timer.remaining_seconds(), 1495);
    }

    #[test]
    fn start_twice_keeps_single_schedule() {
        let (mut timer, _) = recording_timer();
        let start = Instant::now();
        timer.start(start);
        timer.start(start + Duration::from_millis(500));

        timer.poll(start + Duration::from_secs(2));
        assert_eq!(timer.remaining_seconds(), 1498);
    }

    #[test]
    fn reset_restores_full_duration_of_current_mode() {
        let (mut timer, _) = recording_timer();
        timer.switch_mode();
        timer.start(Instant::now());
        timer.advance();
        timer.advance();
        timer.reset();

        assert_eq!(timer.mode(), TimerMode::Break);
        assert_eq!(timer.remaining_seconds(), 300);
        assert!(!timer.is_running());
    }

    #[test]
    fn manual_switch_stops_and_notifies() {
        let (mut timer, notified) = recording_timer();
        timer.start(Instant::now());
        timer.switch_mode();
        timer.switch_mode();

        assert_eq!(timer.mode(), TimerMode::Focus);
        assert_eq!(timer.remaining_seconds(), 1500);
        assert!(!timer.is_running());
        assert_eq!(*notified.borrow(), vec![TimerMode::Break, TimerMode::Focus]);
    }

    #[test]
    fn failing_notifier_is_swallowed() {
        let mut timer = Pomodoro::new(Box::new(Failing));
        timer.switch_mode();
        assert_eq!(timer.mode(), TimerMode::Break);
    }

    #[test]
    fn teardown_cancels_pending_tick() {
        let (mut timer, _) = recording_timer();
        let start = Instant::now();
        timer.start(start);
        timer.teardown();

        assert_eq!(timer.poll(start + Duration::from_secs(30)), None);
        assert_eq!(timer.remaining_seconds(), 1500);
    }

    #[test]
    fn progress_and_clock_track_remaining() {
        let (mut timer, _) = recording_timer();
        timer.start(Instant::now());
        for _ in 0..750 {
            timer.advance();
        }
        assert!((timer.progress() - 0.5).abs() < f64::EPSILON);
        assert_eq!(timer.format_clock(), "12:30");
    }
}
