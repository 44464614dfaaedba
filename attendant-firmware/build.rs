//! Build script for attendant-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates robot.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

const ROUTINES: [&str; 4] = ["water", "medicine", "garbage", "cleaning"];
const JOINTS: usize = 6;
const MAX_SCHEDULE_ENTRIES: usize = 16;

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate robot.toml at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=robot.toml");

    let config_path = Path::new("robot.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: robot.toml not found!                                    ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds robot.toml as its default configuration.    ║\n\
            ║  Please create one in the attendant-firmware directory.          ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read robot.toml                                ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in robot.toml                        ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    validate_interlock(&config, &mut errors);
    validate_alert(&config, &mut errors);
    validate_wiper(&config, &mut errors);
    validate_home(&config, &mut errors);
    validate_schedule(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid values in robot.toml                             ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=robot.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Read an optional integer key from a table
fn int_in(table: &toml::Value, key: &str) -> Option<i64> {
    table.get(key).and_then(|v| v.as_integer())
}

fn validate_interlock(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(interlock) = config.get("interlock") else {
        return;
    };
    if let Some(threshold) = int_in(interlock, "threshold_cm") {
        if !(1..=400).contains(&threshold) {
            errors.push(format!("interlock.threshold_cm {} not in 1..=400", threshold));
        }
    }
}

fn validate_alert(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(alert) = config.get("alert") else {
        return;
    };
    if let Some(beeps) = int_in(alert, "beeps") {
        if !(0..=255).contains(&beeps) {
            errors.push(format!("alert.beeps {} not in 0..=255", beeps));
        }
    }
    if let Some(on_ms) = int_in(alert, "on_ms") {
        if !(1..=65535).contains(&on_ms) {
            errors.push(format!("alert.on_ms {} must be positive", on_ms));
        }
    }
}

fn validate_wiper(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(wiper) = config.get("wiper") else {
        return;
    };
    let min = int_in(wiper, "min_angle").unwrap_or(0);
    let max = int_in(wiper, "max_angle").unwrap_or(180);
    let park = int_in(wiper, "park_angle").unwrap_or(0);

    if int_in(wiper, "step_deg") == Some(0) {
        errors.push("wiper.step_deg must be positive".to_string());
    }
    if max > 180 {
        errors.push(format!("wiper.max_angle {} exceeds 180", max));
    }
    if !(min <= park && park <= max) {
        errors.push(format!(
            "wiper.park_angle {} not within {}..={}",
            park, min, max
        ));
    }
}

fn validate_home(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(angles) = config
        .get("home")
        .and_then(|h| h.get("angles"))
        .and_then(|a| a.as_array())
    else {
        return;
    };

    if angles.len() != JOINTS {
        errors.push(format!(
            "home.angles has {} values, expected {}",
            angles.len(),
            JOINTS
        ));
    }
    for (joint, angle) in angles.iter().enumerate() {
        match angle.as_integer() {
            Some(a) if (0..=180).contains(&a) => {}
            _ => errors.push(format!("home.angles[{}] must be 0..=180", joint)),
        }
    }
}

fn validate_schedule(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(entries) = config.get("schedule").and_then(|s| s.as_array()) else {
        return;
    };

    if entries.len() > MAX_SCHEDULE_ENTRIES {
        errors.push(format!(
            "{} schedule entries, at most {} allowed",
            entries.len(),
            MAX_SCHEDULE_ENTRIES
        ));
    }

    for (i, entry) in entries.iter().enumerate() {
        match int_in(entry, "hour") {
            Some(h) if (0..24).contains(&h) => {}
            _ => errors.push(format!("schedule[{}].hour must be 0..=23", i)),
        }
        match int_in(entry, "minute") {
            Some(m) if (0..60).contains(&m) => {}
            _ => errors.push(format!("schedule[{}].minute must be 0..=59", i)),
        }
        let mode = entry.get("mode").and_then(|m| m.as_str()).unwrap_or("");
        if !ROUTINES.iter().any(|r| r.eq_ignore_ascii_case(mode)) {
            errors.push(format!("schedule[{}].mode '{}' is not a routine", i, mode));
        }
    }
}
