//! Scoped acquisition and teardown of the actuator set.
//!
//! [`ActuatorSet`] is the owning context for every actuator on the bus. It
//! is built once at startup and handed to the control loop; teardown runs
//! exactly once, on explicit [`ActuatorSet::shutdown`] or on drop.

use crate::actuator::ActuatorController;
use servo_common::hal::config::{ActuatorConfig, ActuatorRole, StartupConfig, validate_actuators};
use servo_common::hal::transport::{HalError, RegisterTransport};
use std::sync::Arc;
use tracing::{error, info, warn};

/// One acquired actuator with its configuration.
#[derive(Debug)]
pub struct ManagedActuator {
    config: ActuatorConfig,
    controller: Arc<ActuatorController>,
}

impl ManagedActuator {
    /// Configuration the actuator was acquired with.
    pub fn config(&self) -> &ActuatorConfig {
        &self.config
    }

    /// Control role.
    pub fn role(&self) -> ActuatorRole {
        self.config.role
    }

    /// Shared controller handle.
    pub fn controller(&self) -> &Arc<ActuatorController> {
        &self.controller
    }
}

/// Outcome of a teardown pass.
#[derive(Debug, Default)]
pub struct TeardownReport {
    /// Names of actuators released cleanly, in teardown order.
    pub released: Vec<String>,
    /// Actuators whose teardown reported an error.
    pub failures: Vec<(String, HalError)>,
    /// Teardown had already run; nothing was touched.
    pub already_done: bool,
}

impl TeardownReport {
    /// True if no actuator reported a teardown error.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// All actuators on one bus, acquired as a batch.
pub struct ActuatorSet {
    transport: Arc<dyn RegisterTransport>,
    actuators: Vec<ManagedActuator>,
    shut_down: bool,
}

impl ActuatorSet {
    /// Attach and configure every actuator in `configs`, in order.
    ///
    /// Each actuator runs the fixed startup sequence right after attaching.
    /// Startup write failures are logged and do not abort acquisition.
    ///
    /// # Errors
    /// `HalError::ConfigError` for an invalid actuator list, or the
    /// `SetupFailed` of the first actuator that cannot attach. Actuators
    /// already acquired in this batch are torn down before returning.
    pub fn acquire(
        transport: Arc<dyn RegisterTransport>,
        configs: &[ActuatorConfig],
        startup: &StartupConfig,
    ) -> Result<Self, HalError> {
        validate_actuators(configs).map_err(|e| HalError::ConfigError(e.to_string()))?;

        let mut set = Self {
            transport,
            actuators: Vec::with_capacity(configs.len()),
            shut_down: false,
        };

        for config in configs {
            let controller = match ActuatorController::attach(config, Arc::clone(&set.transport)) {
                Ok(controller) => controller,
                Err(e) => {
                    error!("Failed to acquire actuator {} (id {}): {}", config.name, config.id, e);
                    let report = set.shutdown();
                    if !report.is_clean() {
                        warn!(
                            "{} actuator(s) failed teardown after partial acquisition",
                            report.failures.len()
                        );
                    }
                    return Err(e);
                }
            };
            controller.configure(startup);
            set.actuators.push(ManagedActuator {
                config: config.clone(),
                controller: Arc::new(controller),
            });
        }

        info!(
            "Acquired {} actuator(s) via {}",
            set.actuators.len(),
            set.transport.name()
        );
        Ok(set)
    }

    /// Acquire, run `f`, then tear down regardless of what `f` returned.
    pub fn scoped<T>(
        transport: Arc<dyn RegisterTransport>,
        configs: &[ActuatorConfig],
        startup: &StartupConfig,
        f: impl FnOnce(&ActuatorSet) -> T,
    ) -> Result<(T, TeardownReport), HalError> {
        let mut set = Self::acquire(transport, configs, startup)?;
        let value = f(&set);
        Ok((value, set.shutdown()))
    }

    /// Disable torque on and release every actuator, in reverse order.
    ///
    /// Total: one actuator's failure never prevents the others. Idempotent:
    /// later calls return a report with `already_done` set.
    pub fn shutdown(&mut self) -> TeardownReport {
        if self.shut_down {
            return TeardownReport {
                already_done: true,
                ..TeardownReport::default()
            };
        }
        self.shut_down = true;

        let mut report = TeardownReport::default();
        for actuator in self.actuators.iter().rev() {
            let name = actuator.config.name.clone();
            match actuator.controller.release() {
                Ok(()) => report.released.push(name),
                Err(e) => {
                    warn!("Teardown of actuator {} failed: {}", name, e);
                    report.failures.push((name, e));
                }
            }
        }

        if report.is_clean() {
            info!("Released {} actuator(s)", report.released.len());
        } else {
            warn!(
                "Released {} actuator(s), {} teardown failure(s)",
                report.released.len(),
                report.failures.len()
            );
        }
        report
    }

    /// True once teardown has run.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Shared transport.
    pub fn transport(&self) -> &Arc<dyn RegisterTransport> {
        &self.transport
    }

    /// Actuators following the continuous axis, in configuration order.
    pub fn coupled(&self) -> Vec<Arc<ActuatorController>> {
        self.with_role(ActuatorRole::Coupled)
    }

    /// The button-stepped actuator, if configured.
    pub fn stepped(&self) -> Option<Arc<ActuatorController>> {
        self.with_role(ActuatorRole::Stepped).into_iter().next()
    }

    /// Look up an actuator by name.
    pub fn get(&self, name: &str) -> Option<&ManagedActuator> {
        self.actuators.iter().find(|a| a.config.name == name)
    }

    /// Iterate in acquisition order.
    pub fn iter(&self) -> impl Iterator<Item = &ManagedActuator> {
        self.actuators.iter()
    }

    /// Number of acquired actuators.
    pub fn len(&self) -> usize {
        self.actuators.len()
    }

    /// True if no actuator was acquired.
    pub fn is_empty(&self) -> bool {
        self.actuators.is_empty()
    }

    fn with_role(&self, role: ActuatorRole) -> Vec<Arc<ActuatorController>> {
        self.actuators
            .iter()
            .filter(|a| a.config.role == role)
            .map(|a| Arc::clone(&a.controller))
            .collect()
    }
}

impl Drop for ActuatorSet {
    fn drop(&mut self) {
        if !self.shut_down {
            warn!("ActuatorSet dropped without shutdown, tearing down");
            self.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::simulation::SimulatedBus;

    fn acquire(bus: &Arc<SimulatedBus>) -> ActuatorSet {
        ActuatorSet::acquire(
            bus.clone(),
            &ActuatorConfig::default_set(),
            &StartupConfig::default(),
        )
        .expect("acquire")
    }

    #[test]
    fn acquire_configures_all() {
        let bus = Arc::new(SimulatedBus::new());
        let set = acquire(&bus);
        assert_eq!(set.len(), 3);
        assert_eq!(bus.attached_ids(), vec![0, 1, 2]);
        for id in [0, 1, 2] {
            assert!(bus.torque_enabled(id));
        }
        let names: Vec<_> = set.coupled().iter().map(|c| c.name().to_string()).collect();
        assert_eq!(names, vec!["left", "right"]);
        assert_eq!(set.stepped().map(|c| c.id()), Some(0));
        assert_eq!(set.get("right").map(|a| a.config().id), Some(2));
    }

    #[test]
    fn partial_failure_tears_down_acquired() {
        let bus = Arc::new(SimulatedBus::new());
        bus.reject_attach(0);
        let result = ActuatorSet::acquire(
            bus.clone(),
            &ActuatorConfig::default_set(),
            &StartupConfig::default(),
        );
        assert!(matches!(result, Err(HalError::SetupFailed(_))));
        assert!(bus.attached_ids().is_empty());
        assert!(!bus.torque_enabled(1));
        assert!(!bus.torque_enabled(2));
    }

    #[test]
    fn invalid_config_rejected_before_bus_access() {
        let bus = Arc::new(SimulatedBus::new());
        let configs = vec![
            ActuatorConfig::new("a", 1, ActuatorRole::Coupled),
            ActuatorConfig::new("b", 1, ActuatorRole::Coupled),
        ];
        let result = ActuatorSet::acquire(bus.clone(), &configs, &StartupConfig::default());
        assert!(matches!(result, Err(HalError::ConfigError(_))));
        assert!(bus.transactions().is_empty());
    }

    #[test]
    fn shutdown_is_idempotent() {
        let bus = Arc::new(SimulatedBus::new());
        let mut set = acquire(&bus);
        let first = set.shutdown();
        assert!(first.is_clean());
        assert_eq!(first.released, vec!["larger", "right", "left"]);
        assert!(bus.attached_ids().is_empty());

        let log_len = bus.transactions().len();
        let second = set.shutdown();
        assert!(second.already_done);
        assert!(second.released.is_empty());
        assert_eq!(bus.transactions().len(), log_len);
    }

    #[test]
    fn shutdown_is_total() {
        let bus = Arc::new(SimulatedBus::new());
        let mut set = acquire(&bus);
        bus.set_offline(2, true);
        let report = set.shutdown();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, "right");
        assert_eq!(report.released, vec!["larger", "left"]);
        assert!(!bus.torque_enabled(0));
        assert!(!bus.torque_enabled(1));
        assert!(bus.attached_ids().is_empty());
    }

    #[test]
    fn drop_tears_down() {
        let bus = Arc::new(SimulatedBus::new());
        {
            let _set = acquire(&bus);
            assert_eq!(bus.attached_ids().len(), 3);
        }
        assert!(bus.attached_ids().is_empty());
        assert!(!bus.torque_enabled(1));
    }

    #[test]
    fn scoped_runs_teardown() {
        let bus = Arc::new(SimulatedBus::new());
        let (count, report) = ActuatorSet::scoped(
            bus.clone(),
            &ActuatorConfig::default_set(),
            &StartupConfig::default(),
            |set| set.len(),
        )
        .unwrap();
        assert_eq!(count, 3);
        assert!(report.is_clean());
        assert!(bus.attached_ids().is_empty());
    }

    #[test]
    fn startup_write_failures_are_not_fatal() {
        let bus = Arc::new(SimulatedBus::new());
        bus.fail_next_writes(1, 2);
        let set = acquire(&bus);
        assert_eq!(set.len(), 3);
        assert!(bus.torque_enabled(1));
    }
}
