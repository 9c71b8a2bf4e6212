use std::fmt::Display;
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::config::Config;
use crate::display::{report_error, DisplaySink};
use crate::error::StreamError;
use crate::input::InputSource;
use crate::stream::{Connector, Lease};
use crate::view::ViewState;

/// Log a warning on the first failure and then every Nth; info otherwise.
const FAILURE_WARN_EVERY: u32 = 10;

/// Time source for the scheduler.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&mut self, duration: Duration);
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Connecting,
    Running,
    Retrying,
}

/// Outcome of one scheduler tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Connected,
    Ticked,
    Failed,
    Waited,
}

/// The supervisor's lifecycle. Any failure leads to `Retrying`; there is no
/// terminal phase.
pub fn transition(phase: Phase, signal: Signal) -> Phase {
    match (phase, signal) {
        (_, Signal::Failed) => Phase::Retrying,
        (Phase::Connecting, Signal::Connected) => Phase::Running,
        (Phase::Running, Signal::Ticked) => Phase::Running,
        (Phase::Retrying, Signal::Waited) => Phase::Connecting,
        (phase, _) => phase,
    }
}

/// What the driver should do after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Wait(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub url: String,
    pub retry_interval: Duration,
    pub poll_timeout: Duration,
}

impl From<&Config> for Settings {
    fn from(cfg: &Config) -> Self {
        Self {
            url: cfg.service_url.clone(),
            retry_interval: cfg.retry_interval,
            poll_timeout: cfg.poll_timeout,
        }
    }
}

/// Call `attempt` until it reports the link is up.
///
/// A link that stays down shows `Error: {what} unreachable`; an error shows its
/// own text. Either way the next attempt follows after `interval`. Returns the
/// number of failed attempts.
pub fn retry_until_up<C, S, E, F>(
    clock: &mut C,
    sink: &mut S,
    interval: Duration,
    what: &str,
    mut attempt: F,
) -> u32
where
    C: Clock + ?Sized,
    S: DisplaySink + ?Sized,
    E: Display,
    F: FnMut() -> Result<bool, E>,
{
    let mut failures: u32 = 0;
    loop {
        match attempt() {
            Ok(true) => return failures,
            Ok(false) => report_error(sink, format!("{} unreachable", what)),
            Err(e) => report_error(sink, &e),
        }
        failures = failures.saturating_add(1);
        warn!("{} down ({} attempts); retrying in {:?}", what, failures, interval);
        clock.sleep(interval);
    }
}

/// Connect, run the view, report and retry. Forever.
pub struct Supervisor<K: Connector> {
    connector: K,
    settings: Settings,
    phase: Phase,
    lease: Lease<K::Conn>,
    view: ViewState,
    retry_at: Option<Instant>,
    consecutive_failures: u32,
}

impl<K: Connector> Supervisor<K> {
    pub fn new(connector: K, settings: Settings) -> Self {
        Self {
            connector,
            settings,
            phase: Phase::Connecting,
            lease: Lease::empty(),
            view: ViewState::new(),
            retry_at: None,
            consecutive_failures: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn connector(&self) -> &K {
        &self.connector
    }

    pub fn is_connected(&self) -> bool {
        self.lease.is_held()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Run one scheduler tick.
    pub fn step<C, I, S>(&mut self, clock: &C, input: &mut I, sink: &mut S) -> Step
    where
        C: Clock + ?Sized,
        I: InputSource + ?Sized,
        S: DisplaySink + ?Sized,
    {
        let signal = match self.phase {
            Phase::Connecting => {
                info!("supervisor: connecting to {}", self.settings.url);
                match self.connector.connect(&self.settings.url) {
                    Ok(conn) => {
                        info!("supervisor: connected");
                        self.lease.acquire(conn);
                        self.view = ViewState::new();
                        self.consecutive_failures = 0;
                        Signal::Connected
                    }
                    Err(e) => self.fail(&e, clock.now(), sink),
                }
            }
            Phase::Running => {
                let result = match self.lease.get_mut() {
                    Some(conn) => self.view.tick(input, conn, sink, self.settings.poll_timeout),
                    None => Err(StreamError::ConnectionLost("no connection held".into())),
                };
                match result {
                    Ok(()) => Signal::Ticked,
                    Err(e) => self.fail(&e, clock.now(), sink),
                }
            }
            Phase::Retrying => {
                let now = clock.now();
                match self.retry_at {
                    Some(at) if now < at => return Step::Wait(at - now),
                    _ => {
                        self.retry_at = None;
                        Signal::Waited
                    }
                }
            }
        };

        self.phase = transition(self.phase, signal);
        Step::Continue
    }

    /// Drive [`Supervisor::step`] forever, sleeping whenever it asks to wait.
    pub fn run_forever<C, I, S>(&mut self, clock: &mut C, input: &mut I, sink: &mut S) -> !
    where
        C: Clock + ?Sized,
        I: InputSource + ?Sized,
        S: DisplaySink + ?Sized,
    {
        loop {
            if let Step::Wait(d) = self.step(&*clock, input, sink) {
                clock.sleep(d);
            }
        }
    }

    fn fail<E, S>(&mut self, error: &E, now: Instant, sink: &mut S) -> Signal
    where
        E: Display + ?Sized,
        S: DisplaySink + ?Sized,
    {
        report_error(sink, error);
        self.lease.release();
        self.retry_at = Some(now + self.settings.retry_interval);

        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        if self.consecutive_failures == 1
            || self.consecutive_failures % FAILURE_WARN_EVERY == 0
        {
            warn!(
                "supervisor: {} ({} consecutive); retrying in {:?}",
                error, self.consecutive_failures, self.settings.retry_interval
            );
        } else {
            info!(
                "supervisor: failed ({} consecutive)",
                self.consecutive_failures
            );
        }
        Signal::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::StreamConnection;
    use std::cell::Cell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    #[test]
    fn lifecycle_transitions() {
        use Phase::*;
        assert_eq!(transition(Connecting, Signal::Connected), Running);
        assert_eq!(transition(Connecting, Signal::Failed), Retrying);
        assert_eq!(transition(Running, Signal::Ticked), Running);
        assert_eq!(transition(Running, Signal::Failed), Retrying);
        assert_eq!(transition(Retrying, Signal::Waited), Connecting);
        assert_eq!(transition(Retrying, Signal::Failed), Retrying);
        assert_eq!(transition(Running, Signal::Waited), Running);
    }

    struct ManualClock {
        start: Instant,
        offset: Cell<Duration>,
    }

    impl ManualClock {
        fn new() -> Self {
            Self {
                start: Instant::now(),
                offset: Cell::new(Duration::ZERO),
            }
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.start + self.offset.get()
        }

        fn sleep(&mut self, duration: Duration) {
            self.offset.set(self.offset.get() + duration);
        }
    }

    struct Quiet {
        closed: Rc<Cell<u32>>,
        lose_after: Option<u32>,
    }

    impl StreamConnection for Quiet {
        fn receive(&mut self, _timeout: Duration) -> Result<String, StreamError> {
            match self.lose_after {
                Some(0) => Err(StreamError::ConnectionLost("reset by peer".into())),
                Some(ref mut n) => {
                    *n -= 1;
                    Err(StreamError::Timeout)
                }
                None => Err(StreamError::Timeout),
            }
        }

        fn close(&mut self) {
            self.closed.set(self.closed.get() + 1);
        }
    }

    struct Dialer {
        outcomes: VecDeque<Result<Option<u32>, StreamError>>,
        closed: Rc<Cell<u32>>,
        attempts: u32,
    }

    impl Connector for Dialer {
        type Conn = Quiet;

        fn connect(&mut self, _url: &str) -> Result<Quiet, StreamError> {
            self.attempts += 1;
            let lose_after = self.outcomes.pop_front().unwrap_or(Ok(None))?;
            Ok(Quiet {
                closed: self.closed.clone(),
                lose_after,
            })
        }
    }

    #[derive(Default)]
    struct Screen(Vec<Vec<String>>);

    impl DisplaySink for Screen {
        fn show_lines(&mut self, lines: &[String]) {
            self.0.push(lines.to_vec());
        }

        fn wrap_width(&self) -> usize {
            40
        }
    }

    struct Up;

    impl InputSource for Up {
        fn is_pressed(&mut self) -> bool {
            false
        }
    }

    fn settings() -> Settings {
        Settings {
            url: "ws://test/ws".into(),
            retry_interval: Duration::from_secs(1),
            poll_timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn connect_failure_waits_then_retries() {
        let closed = Rc::new(Cell::new(0));
        let dialer = Dialer {
            outcomes: VecDeque::from([Err(StreamError::Connect("refused".into()))]),
            closed: closed.clone(),
            attempts: 0,
        };
        let mut sup = Supervisor::new(dialer, settings());
        let mut clock = ManualClock::new();
        let mut screen = Screen::default();

        assert_eq!(sup.step(&clock, &mut Up, &mut screen), Step::Continue);
        assert_eq!(sup.phase(), Phase::Retrying);
        assert_eq!(screen.0, vec![vec!["Error: connect failed: refused"]]);

        assert_eq!(
            sup.step(&clock, &mut Up, &mut screen),
            Step::Wait(Duration::from_secs(1))
        );
        clock.sleep(Duration::from_millis(400));
        assert_eq!(
            sup.step(&clock, &mut Up, &mut screen),
            Step::Wait(Duration::from_millis(600))
        );
        clock.sleep(Duration::from_millis(600));
        assert_eq!(sup.step(&clock, &mut Up, &mut screen), Step::Continue);
        assert_eq!(sup.phase(), Phase::Connecting);

        sup.step(&clock, &mut Up, &mut screen);
        assert_eq!(sup.phase(), Phase::Running);
        assert_eq!(sup.connector().attempts, 2);
        assert_eq!(sup.consecutive_failures(), 0);
    }

    #[test]
    fn lost_connection_is_released_and_reported() {
        let closed = Rc::new(Cell::new(0));
        let dialer = Dialer {
            outcomes: VecDeque::from([Ok(Some(2))]),
            closed: closed.clone(),
            attempts: 0,
        };
        let mut sup = Supervisor::new(dialer, settings());
        let clock = ManualClock::new();
        let mut screen = Screen::default();

        sup.step(&clock, &mut Up, &mut screen);
        assert!(sup.is_connected());
        for _ in 0..2 {
            sup.step(&clock, &mut Up, &mut screen);
            assert_eq!(sup.phase(), Phase::Running);
        }
        sup.step(&clock, &mut Up, &mut screen);

        assert_eq!(sup.phase(), Phase::Retrying);
        assert!(!sup.is_connected());
        assert_eq!(closed.get(), 1);
        assert_eq!(
            screen.0,
            vec![vec!["Error: connection lost: reset by peer"]]
        );
    }

    #[test]
    fn link_setup_is_reported_and_retried_until_up() {
        let mut clock = ManualClock::new();
        let mut screen = Screen::default();
        let mut outcomes = VecDeque::from([
            Ok(false),
            Err("netif timeout".to_string()),
            Ok(false),
            Ok(true),
        ]);

        let failures = retry_until_up(
            &mut clock,
            &mut screen,
            Duration::from_secs(1),
            "WiFi 'hangar'",
            || outcomes.pop_front().unwrap_or(Ok(true)),
        );

        assert_eq!(failures, 3);
        assert!(outcomes.is_empty());
        assert_eq!(clock.offset.get(), Duration::from_secs(3));
        assert_eq!(
            screen.0,
            vec![
                vec!["Error: WiFi 'hangar' unreachable"],
                vec!["Error: netif timeout"],
                vec!["Error: WiFi 'hangar' unreachable"],
            ]
        );
    }

    #[test]
    fn failures_are_counted_until_a_connect_succeeds() {
        let closed = Rc::new(Cell::new(0));
        let refused = || Err(StreamError::Connect("refused".into()));
        let dialer = Dialer {
            outcomes: VecDeque::from([refused(), refused(), refused()]),
            closed,
            attempts: 0,
        };
        let mut sup = Supervisor::new(dialer, settings());
        let mut clock = ManualClock::new();
        let mut screen = Screen::default();

        while sup.phase() != Phase::Running {
            if let Step::Wait(d) = sup.step(&clock, &mut Up, &mut screen) {
                clock.sleep(d);
            }
            if sup.phase() == Phase::Retrying {
                assert!(sup.consecutive_failures() >= 1);
            }
        }
        assert_eq!(sup.connector().attempts, 4);
        assert_eq!(screen.0.len(), 3);
        assert_eq!(clock.offset.get(), Duration::from_secs(3));
    }
}
