//! One-shot operator commands: send, duration, settings, self-check.

use std::path::Path;

use heading_config::{Config, SettingKey, SettingsStore};
use heading_core::kinematics::breakdown;
use heading_core::{CommandKind, CommandOutcome, DriveConfig, RobotCommand, send_once};
use heading_traits::RobotLink;

use crate::cli::SettingsAction;

pub fn send_command(
    cfg: &Config,
    store: &SettingsStore,
    kind: CommandKind,
    left: Option<u8>,
    right: Option<u8>,
    simulate: bool,
    json: bool,
) -> eyre::Result<()> {
    let drive = DriveConfig::snapshot(store);
    let base = RobotCommand::manual(kind, &drive);
    let cmd = if kind == CommandKind::Stop {
        base
    } else {
        RobotCommand::new(
            kind,
            left.unwrap_or_else(|| base.left()),
            right.unwrap_or_else(|| base.right()),
        )
    };
    tracing::info!(command = %cmd, simulate, "manual command");

    let outcome = if simulate {
        send_once(&mut heading_link::SimulatedLink::from_env(), &cmd)
    } else {
        send_once(http_link(cfg)?.as_mut(), &cmd)
    };
    match outcome {
        CommandOutcome::Ok { body } => {
            if json {
                let obj = serde_json::json!({
                    "command": cmd.kind().wire_name(),
                    "left": cmd.left(),
                    "right": cmd.right(),
                    "reply": body,
                });
                println!("{obj}");
            } else {
                println!("{cmd}: {body}");
            }
            Ok(())
        }
        CommandOutcome::Failed(e) => Err(eyre::Report::new(e)),
    }
}

#[cfg(feature = "http")]
fn http_link(cfg: &Config) -> eyre::Result<Box<dyn RobotLink>> {
    let link = heading_link::HttpLink::new(
        &cfg.robot.base_address,
        cfg.robot.request_timeout_ms.map(std::time::Duration::from_millis),
    )
    .map_err(eyre::Report::new)?;
    Ok(Box::new(link))
}

#[cfg(not(feature = "http"))]
fn http_link(_cfg: &Config) -> eyre::Result<Box<dyn RobotLink>> {
    eyre::bail!("built without the http feature; use --simulate")
}

pub fn print_duration(store: &SettingsStore, distance_m: f64, json: bool) -> eyre::Result<()> {
    let drive = DriveConfig::snapshot(store);
    let b = breakdown(distance_m, &drive).map_err(eyre::Report::new)?;
    if json {
        let obj = serde_json::json!({
            "distance_cm": distance_m * 100.0,
            "wheel_rpm": drive.wheel_rpm,
            "wheel_diameter_mm": drive.wheel_diameter_mm,
            "circumference_mm": b.circumference_mm,
            "revolutions": b.revolutions,
            "seconds_per_revolution": b.seconds_per_revolution,
            "duration_ms": b.duration_ms,
        });
        println!("{obj}");
    } else {
        println!("Distance:        {:.1} cm", distance_m * 100.0);
        println!("Wheel RPM:       {}", drive.wheel_rpm);
        println!("Wheel diameter:  {:.1} mm", drive.wheel_diameter_mm);
        println!("Circumference:   {:.2} mm", b.circumference_mm);
        println!("Revolutions:     {:.3}", b.revolutions);
        println!("Sec/revolution:  {:.3} s", b.seconds_per_revolution);
        println!("Duration:        {} ms", b.duration_ms);
    }
    Ok(())
}

pub fn settings(
    store: &SettingsStore,
    path: &Path,
    action: &SettingsAction,
    json: bool,
) -> eyre::Result<()> {
    match action {
        SettingsAction::List => {
            let snap = store.snapshot();
            if json {
                let map: serde_json::Map<String, serde_json::Value> = snap
                    .iter()
                    .map(|(k, v)| (k.as_str().to_string(), serde_json::json!(v)))
                    .collect();
                println!("{}", serde_json::Value::Object(map));
            } else {
                for (k, v) in snap {
                    let ro = if k.is_read_only() { "  (read-only)" } else { "" };
                    println!("{k} = {v}{ro}");
                }
            }
        }
        SettingsAction::Get { key } => {
            let k = parse_key(key)?;
            let v = store.value(k);
            if json {
                println!("{}", serde_json::json!({ "key": k.as_str(), "value": v }));
            } else {
                println!("{v}");
            }
        }
        SettingsAction::Set { key, value } => {
            let k = parse_key(key)?;
            store.set_key(k, *value)?;
            store.save(path)?;
            tracing::info!(key = k.as_str(), value, path = %path.display(), "setting saved");
            if json {
                println!("{}", serde_json::json!({ "key": k.as_str(), "value": value }));
            } else {
                println!("{k} = {value}");
            }
        }
    }
    Ok(())
}

fn parse_key(key: &str) -> eyre::Result<SettingKey> {
    SettingKey::parse(key).ok_or_else(|| {
        let known: Vec<&str> = SettingKey::ALL.iter().map(|k| k.as_str()).collect();
        eyre::eyre!("unknown setting {key:?}; known settings: {}", known.join(", "))
    })
}

/// Everything is already loaded and validated by the time this runs.
pub fn self_check(cfg: &Config, store: &SettingsStore, json: bool) -> eyre::Result<()> {
    let base = heading_config::parse_base_address(&cfg.robot.base_address)?;
    let drive = DriveConfig::snapshot(store);
    // A zero rpm setting would fault the first approach.
    breakdown(0.0, &drive).map_err(eyre::Report::new)?;
    if json {
        println!("{}", serde_json::json!({ "status": "ok", "robot": base.as_str() }));
    } else {
        println!("OK");
    }
    Ok(())
}
