use std::path::Path;

use deckstats_core::{SensorReading, SensorSource, default_sources, find_reading};

use super::Overrides;

pub fn run(config_path: Option<&Path>, hwmon_root: Option<&Path>, json: bool) {
    let config = super::effective_config_or_exit(config_path, Overrides::default());
    let mut sources = default_sources(hwmon_root);
    let mut readings = sources.poll();
    readings.sort_by(|a, b| a.name.cmp(&b.name));

    if json {
        match serde_json::to_string_pretty(&readings) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("Error serializing readings: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    if readings.is_empty() {
        println!("No sensors found.");
    } else {
        print_table(&readings);
    }

    println!();
    println!("Panels:");
    for panel in &config.panels {
        match find_reading(&readings, &panel.metric) {
            Some(r) => println!("  {:<8} {} ({:.1} {})", panel.label, r.name, r.value, r.unit),
            None => println!("  {:<8} no match for '{}'", panel.label, panel.metric),
        }
    }
}

fn print_table(readings: &[SensorReading]) {
    let width = readings
        .iter()
        .map(|r| r.name.len())
        .max()
        .unwrap_or(0)
        .max(6);
    println!("{:<width$}  {:>10}  Unit", "Sensor", "Value");
    println!("{}", "-".repeat(width + 18));
    for r in readings {
        println!("{:<width$}  {:>10.2}  {}", r.name, r.value, r.unit);
    }
}
