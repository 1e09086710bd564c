//! Control loop: sample → map → command, once per tick.
//!
//! The loop has two states. In [`LoopState::Running`] it polls the input
//! source, turns the snapshot into relative moves and issues them. A stop
//! request, the end of scripted input or a disconnected device moves it to
//! [`LoopState::Stopping`], where no further input is sampled and every
//! actuator is torn down exactly once.

use crate::mapping::{self, TickPlan};
use servo_common::consts::STATS_LOG_INTERVAL_TICKS;
use servo_common::control::ControlConfig;
use servo_common::hal::transport::CommError;
use servo_common::input::{InputError, InputSnapshot, InputSource};
use servo_hal::actuator::{ActuatorController, MoveError};
use servo_hal::{ActuatorSet, TeardownReport};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

// ─── Loop Statistics ────────────────────────────────────────────────

/// Per-tick timing and command counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleStats {
    /// Ticks executed.
    pub tick_count: u64,
    /// Sum of tick durations [ns].
    pub sum_tick_ns: u64,
    /// Longest tick [ns].
    pub max_tick_ns: u64,
    /// Ticks that took longer than the tick interval.
    pub overruns: u64,
    /// Goal writes that reached the device.
    pub moves: u64,
    /// Goal writes that failed.
    pub write_failures: u64,
    /// Actuators skipped because the present position was unavailable.
    pub skipped_reads: u64,
    /// Ticks skipped because the input backend failed.
    pub input_errors: u64,
}

impl CycleStats {
    /// Record one tick's duration.
    #[inline]
    pub fn record(&mut self, duration: Duration, interval: Duration) {
        let ns = duration.as_nanos() as u64;
        self.tick_count += 1;
        self.sum_tick_ns += ns;
        if ns > self.max_tick_ns {
            self.max_tick_ns = ns;
        }
        if !interval.is_zero() && duration > interval {
            self.overruns += 1;
        }
    }

    /// Fold one tick's commands into the counters.
    pub fn count(&mut self, report: &TickReport) {
        self.moves += report.moves.len() as u64;
        self.write_failures += report.failed.len() as u64;
        self.skipped_reads += report.skipped.len() as u64;
    }

    /// Average tick duration [ns], 0 before the first tick.
    #[inline]
    pub fn avg_tick_ns(&self) -> u64 {
        if self.tick_count == 0 {
            0
        } else {
            self.sum_tick_ns / self.tick_count
        }
    }
}

// ─── Tick Results ───────────────────────────────────────────────────

/// A goal write that reached the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorMove {
    /// Actuator bus id.
    pub id: u8,
    /// Present position the move started from.
    pub from: i32,
    /// Goal written (clamped).
    pub goal: i32,
}

/// Everything one tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Relative moves decided from the input.
    pub plan: TickPlan,
    /// Goals written.
    pub moves: Vec<ActuatorMove>,
    /// Actuators left alone because their present position was unavailable.
    pub skipped: Vec<(u8, CommError)>,
    /// Actuators whose goal write failed.
    pub failed: Vec<(u8, CommError)>,
}

/// Why the loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Stop flag set (signal handler or [`StopHandle`]).
    Requested,
    /// Finite input source ran out.
    InputEnded,
    /// Input device went away.
    InputDisconnected(String),
    /// Configured tick limit reached.
    TickLimit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Requested => f.write_str("stop requested"),
            StopReason::InputEnded => f.write_str("input ended"),
            StopReason::InputDisconnected(what) => write!(f, "input disconnected ({what})"),
            StopReason::TickLimit => f.write_str("tick limit reached"),
        }
    }
}

/// Final result of [`ControlLoop::run`].
#[derive(Debug)]
pub struct LoopSummary {
    /// Why the loop left RUNNING.
    pub reason: StopReason,
    /// Statistics at exit.
    pub stats: CycleStats,
    /// Outcome of actuator teardown.
    pub teardown: TeardownReport,
}

// ─── Loop ───────────────────────────────────────────────────────────

/// Loop state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Sampling input and issuing commands.
    Running,
    /// No more sampling; teardown pending or done.
    Stopping,
}

/// Cloneable handle that asks the loop to stop at the next tick boundary.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    /// Create an unset handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the loop to stop.
    pub fn request_stop(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// True once a stop was requested.
    pub fn is_stop_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Shared flag, for signal handlers.
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }
}

/// The control loop. Owns the actuator set for its whole lifetime.
pub struct ControlLoop {
    actuators: ActuatorSet,
    coupled: Vec<Arc<ActuatorController>>,
    stepped: Option<Arc<ActuatorController>>,
    input: Box<dyn InputSource>,
    config: ControlConfig,
    state: LoopState,
    stop: StopHandle,
    stats: CycleStats,
    max_ticks: Option<u64>,
}

impl ControlLoop {
    /// Build a loop around an acquired actuator set.
    pub fn new(actuators: ActuatorSet, input: Box<dyn InputSource>, config: ControlConfig) -> Self {
        let coupled = actuators.coupled();
        let stepped = actuators.stepped();
        info!(
            "Control loop: {} coupled, stepped={}, input={}, interval={}us",
            coupled.len(),
            stepped.as_ref().map_or("none", |s| s.name()),
            input.name(),
            config.tick_interval_us
        );
        Self {
            actuators,
            coupled,
            stepped,
            input,
            config,
            state: LoopState::Running,
            stop: StopHandle::new(),
            stats: CycleStats::default(),
            max_ticks: None,
        }
    }

    /// Stop after `ticks` ticks.
    pub fn with_max_ticks(mut self, ticks: u64) -> Self {
        self.max_ticks = Some(ticks);
        self
    }

    /// Use an externally created stop handle (e.g. shared with a signal handler).
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    /// Handle that stops this loop.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Current state.
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Statistics so far.
    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    /// Poll the input once and apply it.
    ///
    /// A terminal input error moves the loop to STOPPING; a backend error
    /// only skips this tick. Both are returned to the caller.
    pub fn tick(&mut self) -> Result<TickReport, InputError> {
        if self.state == LoopState::Stopping {
            return Err(InputError::Exhausted);
        }
        match self.input.poll() {
            Ok(snapshot) => {
                let report = self.apply(&snapshot);
                self.stats.count(&report);
                Ok(report)
            }
            Err(e) => {
                if e.is_terminal() {
                    self.state = LoopState::Stopping;
                } else {
                    self.stats.input_errors += 1;
                }
                Err(e)
            }
        }
    }

    /// Apply one snapshot without touching the input source.
    pub fn apply(&self, snapshot: &InputSnapshot) -> TickReport {
        let plan = mapping::plan(snapshot, &self.config);
        let mut report = TickReport {
            plan,
            ..TickReport::default()
        };

        if let Some(delta) = plan.coupled {
            for actuator in &self.coupled {
                apply_move(actuator, delta, &mut report);
            }
        }
        if let (Some(delta), Some(actuator)) = (plan.stepped, &self.stepped) {
            apply_move(actuator, delta, &mut report);
        }
        report
    }

    /// Run until stopped, then tear down every actuator.
    pub fn run(mut self) -> LoopSummary {
        let interval = self.config.tick_interval();
        info!("Control loop running");

        let reason = loop {
            if self.stop.is_stop_requested() {
                break StopReason::Requested;
            }
            if self.max_ticks.is_some_and(|max| self.stats.tick_count >= max) {
                break StopReason::TickLimit;
            }

            let tick_start = Instant::now();
            match self.tick() {
                Ok(report) => log_report(&report),
                Err(InputError::Exhausted) => break StopReason::InputEnded,
                Err(InputError::Disconnected(what)) => break StopReason::InputDisconnected(what),
                Err(e) => {
                    if self.stats.input_errors <= 10 || self.stats.input_errors % 1000 == 0 {
                        warn!("Input error #{}: {}", self.stats.input_errors, e);
                    }
                }
            }

            let elapsed = tick_start.elapsed();
            self.stats.record(elapsed, interval);

            if self.stats.tick_count % STATS_LOG_INTERVAL_TICKS == 0 {
                debug!(
                    "Control loop: {} ticks, avg={}us, max={}us, overruns={}, write failures={}, skipped reads={}",
                    self.stats.tick_count,
                    self.stats.avg_tick_ns() / 1000,
                    self.stats.max_tick_ns / 1000,
                    self.stats.overruns,
                    self.stats.write_failures,
                    self.stats.skipped_reads
                );
            }

            if interval.is_zero() {
                std::thread::yield_now();
            } else if elapsed < interval {
                std::thread::sleep(interval - elapsed);
            }
        };

        self.state = LoopState::Stopping;
        info!("Control loop stopping: {}", reason);
        let teardown = self.actuators.shutdown();

        info!(
            "Control loop stopped after {} ticks (moves={}, write failures={}, skipped reads={}, overruns={})",
            self.stats.tick_count,
            self.stats.moves,
            self.stats.write_failures,
            self.stats.skipped_reads,
            self.stats.overruns
        );

        LoopSummary {
            reason,
            stats: self.stats,
            teardown,
        }
    }
}

fn apply_move(actuator: &ActuatorController, delta: i64, report: &mut TickReport) {
    match actuator.move_by(delta) {
        Ok(mv) => report.moves.push(ActuatorMove {
            id: actuator.id(),
            from: mv.from,
            goal: mv.goal,
        }),
        Err(MoveError::PresentUnavailable(e)) => report.skipped.push((actuator.id(), e)),
        Err(MoveError::WriteFailed { source, .. }) => report.failed.push((actuator.id(), source)),
    }
}

fn log_report(report: &TickReport) {
    for mv in &report.moves {
        debug!("id {}: {} -> {}", mv.id, mv.from, mv.goal);
    }
    for (id, e) in &report.skipped {
        debug!("id {}: skipped, present position unavailable ({})", id, e);
    }
    for (id, e) in &report.failed {
        warn!("id {}: goal write failed: {}", id, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{IdleInput, ScriptStep, ScriptedInput};
    use servo_common::hal::config::{ActuatorConfig, StartupConfig};
    use servo_hal::drivers::simulation::SimulatedBus;

    fn setup(bus: &Arc<SimulatedBus>) -> ActuatorSet {
        ActuatorSet::acquire(
            bus.clone(),
            &ActuatorConfig::default_set(),
            &StartupConfig::default(),
        )
        .expect("acquire")
    }

    fn fast_config() -> ControlConfig {
        ControlConfig {
            tick_interval_us: 0,
            ..ControlConfig::default()
        }
    }

    fn scripted(steps: Vec<ScriptStep>) -> Box<dyn InputSource> {
        Box::new(ScriptedInput::from_steps(steps))
    }

    /// Step whose coupled axis reads `a` after the default inversion.
    fn axis_step(a: f64) -> ScriptStep {
        ScriptStep {
            ticks: 1,
            axes: vec![-a],
            buttons: vec![],
        }
    }

    fn button_step(buttons: Vec<usize>) -> ScriptStep {
        ScriptStep {
            ticks: 1,
            axes: vec![],
            buttons,
        }
    }

    #[test]
    fn coupled_pair_gets_same_delta() {
        let bus = Arc::new(SimulatedBus::new());
        let set = setup(&bus);
        bus.set_present_position(1, 200_000);
        bus.set_present_position(2, -5_000);
        let ctl = ControlLoop::new(set, Box::new(IdleInput), fast_config());

        let report = ctl.apply(&InputSnapshot::neutral().with_axis(0, -0.5));
        assert_eq!(report.plan.coupled, Some(50));
        assert_eq!(
            report.moves,
            vec![
                ActuatorMove { id: 1, from: 200_000, goal: 200_050 },
                ActuatorMove { id: 2, from: -5_000, goal: -4_950 },
            ]
        );
        assert_eq!(bus.present_position(0), Some(0));
    }

    #[test]
    fn dead_zone_writes_nothing() {
        let bus = Arc::new(SimulatedBus::new());
        let set = setup(&bus);
        bus.clear_log();
        let ctl = ControlLoop::new(set, Box::new(IdleInput), fast_config());

        let report = ctl.apply(&InputSnapshot::neutral().with_axis(0, 0.1));
        assert!(report.moves.is_empty());
        assert!(bus.transactions().is_empty());
    }

    #[test]
    fn both_buttons_decrement() {
        let bus = Arc::new(SimulatedBus::new());
        let set = setup(&bus);
        bus.set_present_position(0, 1_000);
        let ctl = ControlLoop::new(set, Box::new(IdleInput), fast_config());

        let snap = InputSnapshot::neutral().with_button(4, true).with_button(5, true);
        let report = ctl.apply(&snap);
        assert_eq!(report.moves, vec![ActuatorMove { id: 0, from: 1_000, goal: 900 }]);
    }

    #[test]
    fn unavailable_present_skips_only_that_actuator() {
        let bus = Arc::new(SimulatedBus::new());
        let set = setup(&bus);
        bus.set_present_position(2, 10);
        bus.clear_log();
        bus.fail_next_reads(1, 1);
        let ctl = ControlLoop::new(set, Box::new(IdleInput), fast_config());

        let report = ctl.apply(&InputSnapshot::neutral().with_axis(0, -1.0));
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].0, 1);
        assert_eq!(report.moves, vec![ActuatorMove { id: 2, from: 10, goal: 110 }]);
        assert!(bus.goal_history(1).is_empty());
    }

    #[test]
    fn write_failure_is_reported_not_fatal() {
        let bus = Arc::new(SimulatedBus::new());
        let set = setup(&bus);
        bus.fail_next_writes(0, 1);
        let mut ctl = ControlLoop::new(set, scripted(vec![button_step(vec![5])]), fast_config());

        let report = ctl.tick().unwrap();
        assert_eq!(report.failed.len(), 1);
        assert_eq!(ctl.stats().write_failures, 1);
        assert_eq!(ctl.state(), LoopState::Running);
    }

    #[test]
    fn exhausted_input_stops_and_tears_down() {
        let bus = Arc::new(SimulatedBus::new());
        let set = setup(&bus);
        bus.set_present_position(0, 999_970);
        let ctl = ControlLoop::new(
            set,
            scripted(vec![button_step(vec![5]), axis_step(0.5)]),
            fast_config(),
        );

        let summary = ctl.run();
        assert_eq!(summary.reason, StopReason::InputEnded);
        assert_eq!(summary.stats.tick_count, 2);
        assert_eq!(summary.stats.moves, 3);
        assert!(summary.teardown.is_clean());
        assert_eq!(summary.teardown.released.len(), 3);
        assert_eq!(bus.goal_history(0), vec![1_000_000]);
        assert!(bus.attached_ids().is_empty());
        assert!(!bus.torque_enabled(1));
    }

    #[test]
    fn stop_request_skips_sampling() {
        let bus = Arc::new(SimulatedBus::new());
        let set = setup(&bus);
        let ctl = ControlLoop::new(set, Box::new(IdleInput), fast_config());
        ctl.stop_handle().request_stop();

        let summary = ctl.run();
        assert_eq!(summary.reason, StopReason::Requested);
        assert_eq!(summary.stats.tick_count, 0);
        assert!(bus.attached_ids().is_empty());
    }

    #[test]
    fn tick_limit() {
        let bus = Arc::new(SimulatedBus::new());
        let set = setup(&bus);
        let summary = ControlLoop::new(set, Box::new(IdleInput), fast_config())
            .with_max_ticks(25)
            .run();
        assert_eq!(summary.reason, StopReason::TickLimit);
        assert_eq!(summary.stats.tick_count, 25);
        assert_eq!(summary.stats.moves, 0);
    }

    #[test]
    fn no_sampling_after_stopping() {
        let bus = Arc::new(SimulatedBus::new());
        let set = setup(&bus);
        let mut ctl = ControlLoop::new(set, scripted(vec![]), fast_config());
        assert_eq!(ctl.tick(), Err(InputError::Exhausted));
        assert_eq!(ctl.state(), LoopState::Stopping);
        assert_eq!(ctl.tick(), Err(InputError::Exhausted));
    }

    #[test]
    fn stats_average_and_overruns() {
        let mut stats = CycleStats::default();
        let interval = Duration::from_micros(1000);
        stats.record(Duration::from_micros(500), interval);
        stats.record(Duration::from_micros(1500), interval);
        assert_eq!(stats.tick_count, 2);
        assert_eq!(stats.avg_tick_ns(), 1_000_000);
        assert_eq!(stats.max_tick_ns, 1_500_000);
        assert_eq!(stats.overruns, 1);

        stats.record(Duration::from_micros(5000), Duration::ZERO);
        assert_eq!(stats.overruns, 1);
    }
}
