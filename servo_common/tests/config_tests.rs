//! Configuration loading integration tests.
//!
//! Loads the shipped sample configuration and exercises the validation
//! rules through whole files.

use servo_common::config::{ConfigError, LogLevel, ServoConfig, load_config};
use servo_common::control::ControlConfig;
use servo_common::hal::config::{ActuatorConfig, ActuatorRole, BusConfig, StartupConfig};
use servo_common::hal::registers::OperatingMode;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn sample_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("config")
        .join("servo.toml")
}

fn load_str(content: &str) -> Result<ServoConfig, ConfigError> {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(content.as_bytes()).expect("write");
    load_config(file.path())
}

#[test]
fn test_sample_config_is_reference_deployment() {
    let config = load_config(&sample_path()).expect("sample config");

    assert_eq!(config.shared.log_level, LogLevel::Info);
    assert_eq!(config.bus, BusConfig::default());
    assert_eq!(config.startup, StartupConfig::default());
    assert_eq!(config.startup.operating_mode, OperatingMode::ExtendedPosition);
    assert_eq!(config.actuators, ActuatorConfig::default_set());
    assert_eq!(config.control, ControlConfig::default());
    assert_eq!(config, ServoConfig::default());
}

#[test]
fn test_empty_file_uses_defaults() {
    let config = load_str("").expect("empty config");
    assert_eq!(config, ServoConfig::default());
}

#[test]
fn test_partial_override() {
    let config = load_str(
        r#"
[bus]
driver = "simulation"
device = "/dev/ttyACM0"

[[actuators]]
name = "pan"
id = 7
role = "stepped"

[control]
dead_zone = 0.25
invert_axis = false
"#,
    )
    .expect("config");

    assert_eq!(config.bus.driver, "simulation");
    assert_eq!(config.bus.device, "/dev/ttyACM0");
    assert_eq!(config.bus.baud_rate, 3_000_000);
    assert_eq!(
        config.actuators,
        vec![ActuatorConfig::new("pan", 7, ActuatorRole::Stepped)]
    );
    assert_eq!(config.control.dead_zone, 0.25);
    assert!(!config.control.invert_axis);
    assert_eq!(config.control.position_increment, 100);
}

#[test]
fn test_missing_file() {
    let result = load_config(std::path::Path::new("/nonexistent/servo.toml"));
    assert!(matches!(result, Err(ConfigError::FileNotFound)));
}

#[test]
fn test_unknown_operating_mode_is_parse_error() {
    let result = load_str("[startup]\noperating_mode = 9\n");
    assert!(matches!(result, Err(ConfigError::ParseError(_))));
}

#[test]
fn test_unknown_role_is_parse_error() {
    let result = load_str("[[actuators]]\nname = \"a\"\nid = 1\nrole = \"spinning\"\n");
    assert!(matches!(result, Err(ConfigError::ParseError(_))));
}

#[test]
fn test_validation_failures() {
    let cases = [
        "[bus]\nprotocol_version = 1.0\n",
        "[shared]\nservice_name = \"\"\n",
        "[control]\ndead_zone = 1.5\n",
        "[control]\nincrement_button = 4\n",
        "[control]\naxis = 8\n",
        "[[actuators]]\nname = \"a\"\nid = 1\nrole = \"coupled\"\n[[actuators]]\nname = \"b\"\nid = 1\nrole = \"coupled\"\n",
        "[[actuators]]\nname = \"a\"\nid = 253\nrole = \"passive\"\n",
        "actuators = []\n",
    ];
    for case in cases {
        assert!(
            matches!(load_str(case), Err(ConfigError::ValidationError(_))),
            "expected validation error for:\n{case}"
        );
    }
}
