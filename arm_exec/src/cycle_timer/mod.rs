//! # Cycle timer module
//!
//! Runs an action at a fixed rate against a monotonic clock.
//!
//! The timer keeps a deadline which starts at the clock's reading when the
//! timer is created and is advanced by exactly one period every tick, however
//! long the tick took. After each action the timer sleeps until one period
//! past the previous deadline. A tick which overruns skips its sleep, so
//! short ticks which follow it run without sleeping until the deadline has
//! been caught up and the long-run rate matches the target.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod clock;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, warn};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;
use util::time::frequency_to_period;

pub use clock::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Fixed rate cycle timer.
#[derive(Debug)]
pub struct CycleTimer<C: MonotonicClock = StdClock> {
    clock: C,

    period: Duration,

    /// Time the current tick was due to start, measured on `clock`.
    deadline: Duration,

    stats: CycleStats,
}

/// Statistics on the ticks run by a timer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub num_ticks: u64,
    pub num_overruns: u64,
    pub num_consec_overruns: u64,
    pub max_overrun: Duration,
}

/// Timing of a single completed tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickTiming {
    /// Time from the tick's deadline to the end of its action.
    pub busy: Duration,

    /// Time spent sleeping after the action.
    pub slept: Duration,

    /// How far the tick ran past the next deadline, if it did.
    pub overrun: Option<Duration>,
}

/// Summary of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of times the action was executed.
    pub num_ticks: u64,

    pub end: RunEnd,
}

/// Cooperative stop signal for a running timer.
///
/// Clones share the same flag, so the signal can be raised from any thread or
/// from inside the timer's own action. The flag is checked once at the start
/// of every tick.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Returned by a timer's action to say whether the run should go on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Continue,
    Finished,
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEnd {
    /// The action returned `Tick::Finished`.
    Finished,

    /// The stop flag was raised.
    Stopped,

    /// The tick limit was reached.
    TickLimit,
}

/// Errors which can occur in the timer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CycleError {
    #[error("Could not read the monotonic clock: {0}")]
    ClockFailure(#[from] ClockError),

    #[error("Cycle frequency must be positive, finite and at most 1 GHz, got {0} Hz")]
    InvalidFrequency(f64),

    #[error("Cycle period must be non-zero")]
    InvalidPeriod,
}

/// Errors which end a run early.
#[derive(Debug, thiserror::Error)]
pub enum RunError<E> {
    #[error("Cycle timer error: {0}")]
    Timer(#[from] CycleError),

    #[error("Cycle action failed on tick {tick}")]
    Action { tick: u64, error: E },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CycleTimer<StdClock> {
    /// Create a timer running at the given frequency.
    ///
    /// The period is truncated to whole nanoseconds.
    pub fn from_frequency(frequency_hz: f64) -> Result<Self, CycleError> {
        let period =
            frequency_to_period(frequency_hz).ok_or(CycleError::InvalidFrequency(frequency_hz))?;

        Self::from_period(period)
    }

    /// Create a timer with the given period.
    pub fn from_period(period: Duration) -> Result<Self, CycleError> {
        Self::with_clock(period, StdClock::new())
    }
}

impl<C: MonotonicClock> CycleTimer<C> {
    /// Create a timer with the given period driven by `clock`. The first
    /// deadline is the clock's current reading.
    pub fn with_clock(period: Duration, clock: C) -> Result<Self, CycleError> {
        if period == Duration::from_secs(0) {
            return Err(CycleError::InvalidPeriod);
        }

        let deadline = clock.now()?;

        Ok(Self {
            clock,
            period,
            deadline,
            stats: CycleStats::default(),
        })
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Move the deadline to now, discarding any lag from earlier ticks.
    ///
    /// Used between runs so that time spent outside the timer does not count
    /// as an overrun of the next run's first tick.
    pub fn restart(&mut self) -> Result<(), CycleError> {
        self.deadline = self.clock.now()?;
        self.stats.num_consec_overruns = 0;
        Ok(())
    }

    /// End the current tick: sleep until one period past the current
    /// deadline, or carry straight on if that time has already passed, then
    /// advance the deadline by one period.
    pub fn wait(&mut self) -> Result<TickTiming, CycleError> {
        let now = self.clock.now()?;
        let next_deadline = self.deadline + self.period;

        let busy = now.checked_sub(self.deadline).unwrap_or_default();
        let mut timing = TickTiming {
            busy,
            slept: Duration::from_secs(0),
            overrun: None,
        };

        match next_deadline.checked_sub(now) {
            Some(remaining) => {
                self.stats.num_consec_overruns = 0;
                self.clock.sleep(remaining);
                timing.slept = remaining;
            }
            None => {
                let overrun = now - next_deadline;

                warn!("Cycle overran by {:.06} s", overrun.as_secs_f64());

                self.stats.num_overruns += 1;
                self.stats.num_consec_overruns += 1;
                if overrun > self.stats.max_overrun {
                    self.stats.max_overrun = overrun;
                }
                timing.overrun = Some(overrun);
            }
        }

        self.deadline = next_deadline;
        self.stats.num_ticks += 1;

        Ok(timing)
    }

    /// Run `action` once per period until it finishes, `stop` is raised,
    /// `max_ticks` actions have run, or an error occurs.
    ///
    /// The action is given the index of the tick within this run, starting at
    /// zero. No sleep follows the tick on which the action finishes.
    pub fn run<F, E>(
        &mut self,
        stop: &StopFlag,
        max_ticks: Option<u64>,
        mut action: F,
    ) -> Result<RunSummary, RunError<E>>
    where
        F: FnMut(u64) -> Result<Tick, E>,
    {
        let mut tick = 0;

        let end = loop {
            if stop.is_stop_requested() {
                break RunEnd::Stopped;
            }
            if max_ticks.map_or(false, |m| tick >= m) {
                break RunEnd::TickLimit;
            }

            let result = action(tick).map_err(|error| RunError::Action { tick, error })?;
            tick += 1;

            if result == Tick::Finished {
                break RunEnd::Finished;
            }

            self.wait()?;
        };

        debug!(
            "Cycle run ended ({:?}) after {} ticks, {} overruns in total",
            end, tick, self.stats.num_overruns
        );

        Ok(RunSummary {
            num_ticks: tick,
            end,
        })
    }
}

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask any run checking this flag to stop at its next tick.
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Lower the flag so it can be reused for another run.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// Clock which only moves when told to, or when slept on.
    #[derive(Clone, Default)]
    struct FakeClock {
        now: Rc<Cell<Duration>>,
        sleeps: Rc<RefCell<Vec<Duration>>>,
        broken: Rc<Cell<bool>>,
    }

    impl FakeClock {
        fn advance(&self, d: Duration) {
            self.now.set(self.now.get() + d);
        }
    }

    impl MonotonicClock for FakeClock {
        fn now(&self) -> Result<Duration, ClockError> {
            if self.broken.get() {
                return Err(ClockError::Unavailable("broken".into()));
            }
            Ok(self.now.get())
        }

        fn sleep(&mut self, duration: Duration) {
            self.sleeps.borrow_mut().push(duration);
            self.advance(duration);
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_constructors() {
        assert_eq!(CycleTimer::from_frequency(200.0).unwrap().period(), ms(5));
        assert_eq!(CycleTimer::from_period(ms(20)).unwrap().period(), ms(20));

        assert_eq!(
            CycleTimer::from_frequency(0.0).unwrap_err(),
            CycleError::InvalidFrequency(0.0)
        );
        assert!(matches!(
            CycleTimer::from_frequency(f64::NAN),
            Err(CycleError::InvalidFrequency(_))
        ));
        assert_eq!(
            CycleTimer::from_period(Duration::from_secs(0)).unwrap_err(),
            CycleError::InvalidPeriod
        );
    }

    #[test]
    fn test_wait_sleeps_remainder() {
        let clock = FakeClock::default();
        let mut timer = CycleTimer::with_clock(ms(5), clock.clone()).unwrap();

        clock.advance(ms(2));
        let timing = timer.wait().unwrap();

        assert_eq!(timing.busy, ms(2));
        assert_eq!(timing.slept, ms(3));
        assert_eq!(timing.overrun, None);
        assert_eq!(clock.now.get(), ms(5));
    }

    #[test]
    fn test_overrun_is_recovered() {
        let clock = FakeClock::default();
        let mut timer = CycleTimer::with_clock(ms(5), clock.clone()).unwrap();

        // 7 ms tick overruns by 2 ms and does not sleep
        clock.advance(ms(7));
        let timing = timer.wait().unwrap();
        assert_eq!(timing.overrun, Some(ms(2)));
        assert_eq!(timing.slept, ms(0));
        assert_eq!(timer.stats().num_consec_overruns, 1);

        // The next deadline is still 10 ms, so a 1 ms tick only sleeps 2 ms
        clock.advance(ms(1));
        let timing = timer.wait().unwrap();
        assert_eq!(timing.slept, ms(2));
        assert_eq!(clock.now.get(), ms(10));

        let stats = timer.stats();
        assert_eq!(stats.num_ticks, 2);
        assert_eq!(stats.num_overruns, 1);
        assert_eq!(stats.num_consec_overruns, 0);
        assert_eq!(stats.max_overrun, ms(2));
    }

    #[test]
    fn test_no_drift() {
        let clock = FakeClock::default();
        let mut timer = CycleTimer::with_clock(Duration::from_nanos(3_333_333), clock.clone())
            .unwrap();

        for i in 0..300 {
            // Jittery action times
            clock.advance(Duration::from_micros(100 + (i % 7) * 150));
            timer.wait().unwrap();
        }

        assert_eq!(clock.now.get(), Duration::from_nanos(3_333_333 * 300));
        assert_eq!(timer.stats().num_overruns, 0);
    }

    #[test]
    fn test_run_until_finished() {
        let clock = FakeClock::default();
        let mut timer = CycleTimer::with_clock(ms(5), clock.clone()).unwrap();
        let mut seen = Vec::new();

        let summary = timer
            .run(&StopFlag::new(), None, |tick| -> Result<Tick, ()> {
                seen.push(tick);
                Ok(if tick == 9 { Tick::Finished } else { Tick::Continue })
            })
            .unwrap();

        assert_eq!(summary, RunSummary { num_ticks: 10, end: RunEnd::Finished });
        assert_eq!(seen, (0..10).collect::<Vec<_>>());

        // No sleep after the final tick
        assert_eq!(clock.sleeps.borrow().len(), 9);
        assert_eq!(clock.now.get(), ms(45));
    }

    #[test]
    fn test_run_stop_flag() {
        let clock = FakeClock::default();
        let mut timer = CycleTimer::with_clock(ms(5), clock).unwrap();
        let stop = StopFlag::new();
        let stop_in_action = stop.clone();

        let summary = timer
            .run(&stop, None, |tick| -> Result<Tick, ()> {
                if tick == 3 {
                    stop_in_action.request_stop();
                }
                Ok(Tick::Continue)
            })
            .unwrap();

        assert_eq!(summary, RunSummary { num_ticks: 4, end: RunEnd::Stopped });

        stop.reset();
        assert!(!stop.is_stop_requested());
    }

    #[test]
    fn test_run_tick_limit() {
        let clock = FakeClock::default();
        let mut timer = CycleTimer::with_clock(ms(5), clock).unwrap();

        let summary = timer
            .run(&StopFlag::new(), Some(7), |_| -> Result<Tick, ()> { Ok(Tick::Continue) })
            .unwrap();

        assert_eq!(summary, RunSummary { num_ticks: 7, end: RunEnd::TickLimit });
    }

    #[test]
    fn test_run_errors() {
        let clock = FakeClock::default();
        let mut timer = CycleTimer::with_clock(ms(5), clock.clone()).unwrap();

        let result = timer.run(&StopFlag::new(), None, |tick| {
            if tick == 2 {
                Err("bus fault")
            } else {
                Ok(Tick::Continue)
            }
        });
        assert!(matches!(result, Err(RunError::Action { tick: 2, error: "bus fault" })));

        clock.broken.set(true);
        let result = timer.run(&StopFlag::new(), None, |_| -> Result<Tick, ()> { Ok(Tick::Continue) });
        assert!(matches!(
            result,
            Err(RunError::Timer(CycleError::ClockFailure(ClockError::Unavailable(_))))
        ));
    }

    #[test]
    fn test_restart() {
        let clock = FakeClock::default();
        let mut timer = CycleTimer::with_clock(ms(5), clock.clone()).unwrap();

        // Time passes outside of a run
        clock.advance(ms(100));
        timer.restart().unwrap();

        let timing = timer.wait().unwrap();
        assert_eq!(timing.overrun, None);
        assert_eq!(timing.slept, ms(5));
    }
}
