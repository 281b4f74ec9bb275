//! Human-readable error descriptions and structured JSON error formatting.

use heading_core::error::{BuildError, DispatchError, KinematicsError, NavError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingDispatch => {
                "What happened: No command dispatcher was provided to the navigator.\nLikely causes: The robot link failed to initialize or was not wired into the builder.\nHow to fix: Ensure the link is created successfully and passed via with_dispatch(...).".to_string()
            }
            BuildError::MissingConfig => {
                "What happened: No settings provider was given to the navigator.\nLikely causes: The settings store was not wired into the builder.\nHow to fix: Pass the store via with_config(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid navigator configuration ({msg}).\nLikely causes: Out-of-range values in [navigator].\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(ke) = kinematics_error(err) {
        return match ke {
            KinematicsError::DivisionByZero(what) => format!(
                "What happened: Cannot compute a drive duration because the {what} is zero.\nLikely causes: wheelRpm was set to 0 in the settings file.\nHow to fix: Run `heading settings set wheelRpm 125` (or your motor's rating) and start again."
            ),
            KinematicsError::InvalidDistance(d) => format!(
                "What happened: Distance {d} m cannot be driven.\nLikely causes: A negative or non-finite distance was requested or measured.\nHow to fix: Pass a distance >= 0, or check the marker pose data."
            ),
        };
    }

    if let Some(ne) = err.downcast_ref::<NavError>() {
        return format!(
            "What happened: {ne}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
        );
    }

    if let Some(de) = err.downcast_ref::<DispatchError>() {
        return match de {
            DispatchError::InvalidTarget(msg) => format!(
                "What happened: The robot address could not be used ({msg}).\nLikely causes: robot.base_address is malformed.\nHow to fix: Set robot.base_address to something like \"http://192.168.4.1/\"."
            ),
            DispatchError::Transport(msg) => format!(
                "What happened: The robot did not answer ({msg}).\nLikely causes: Robot powered off, wrong network, or wrong address.\nHow to fix: Join the robot's network, check robot.base_address, or try --simulate."
            ),
            DispatchError::BadResponse(msg) => format!(
                "What happened: The robot replied with something unreadable ({msg}).\nLikely causes: Firmware mismatch or another service at that address.\nHow to fix: Verify the robot firmware and robot.base_address."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("reading config") || lower.contains("parsing config") {
        return format!(
            "What happened: The config file could not be loaded ({msg}).\nLikely causes: Wrong --config path or TOML syntax error.\nHow to fix: Check the path, or copy etc/heading.toml and edit it."
        );
    }

    if lower.contains("invalid configuration") {
        let cause = err.root_cause().to_string();
        return format!(
            "What happened: Configuration is invalid ({cause}).\nLikely causes: Missing [robot] section or out-of-range values.\nHow to fix: Edit the TOML config and try again."
        );
    }

    if lower.contains("settings file") {
        return format!(
            "What happened: The settings file was rejected ({msg}).\nLikely causes: Unknown key, read-only key, or out-of-range value.\nHow to fix: Fix or delete the file given by --settings; `heading settings list` shows valid keys."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

fn kinematics_error(err: &eyre::Report) -> Option<&KinematicsError> {
    if let Some(ke) = err.downcast_ref::<KinematicsError>() {
        return Some(ke);
    }
    match err.downcast_ref::<NavError>() {
        Some(NavError::Kinematics(ke)) => Some(ke),
        _ => None,
    }
}

/// Stable reason name for JSON output.
fn reason_name(err: &eyre::Report) -> &'static str {
    if kinematics_error(err).is_some() {
        return "Kinematics";
    }
    if let Some(ne) = err.downcast_ref::<NavError>() {
        return match ne {
            NavError::Kinematics(_) => "Kinematics",
            NavError::Config(_) => "Config",
            NavError::State(_) => "State",
            NavError::Vision(_) => "Vision",
        };
    }
    if let Some(de) = err.downcast_ref::<DispatchError>() {
        return match de {
            DispatchError::InvalidTarget(_) => "InvalidTarget",
            DispatchError::Transport(_) => "Transport",
            DispatchError::BadResponse(_) => "BadResponse",
        };
    }
    if err.downcast_ref::<BuildError>().is_some() {
        return "Build";
    }
    "Error"
}

/// Navigation faults exit 3, robot communication failures 4, everything else 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if kinematics_error(err).is_some() || err.downcast_ref::<NavError>().is_some() {
        return 3;
    }
    if err.downcast_ref::<DispatchError>().is_some() {
        return 4;
    }
    1
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({ "reason": reason_name(err), "message": humanize(err) }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rpm_fault_maps_to_exit_3() {
        let err = eyre::Report::new(NavError::Kinematics(KinematicsError::DivisionByZero(
            "wheel rpm",
        )));
        assert_eq!(exit_code_for_error(&err), 3);
        assert!(humanize(&err).contains("wheelRpm"));
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "Kinematics");
    }

    #[test]
    fn dispatch_failure_maps_to_exit_4() {
        let err = eyre::Report::new(DispatchError::Transport("connection refused".into()));
        assert_eq!(exit_code_for_error(&err), 4);
        assert!(humanize(&err).contains("--simulate"));
    }

    #[test]
    fn config_errors_use_generic_exit() {
        let err = eyre::eyre!("drive.wheel_rpm must be > 0").wrap_err("invalid configuration");
        assert_eq!(exit_code_for_error(&err), 1);
        assert!(humanize(&err).contains("wheel_rpm"));
    }
}
