use std::fs;
use std::path::Path;
use std::process;

use super::config_ops::die;
use crate::script::{self, LogEntry, ReplayReport};

/// Replay a touch script and print what the keyboard did.
pub fn replay_cmd(script_file: &str, json: bool, settings_file: Option<&str>) {
    if let Some(file) = settings_file {
        let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
        die!(kbd_core::settings::init_custom(content), "Error: {}");
    }
    let script = die!(
        script::load_script(Path::new(script_file)),
        "Error loading {script_file}: {}"
    );
    let report = die!(script::replay(&script), "Error: {}");

    if json {
        let out = die!(serde_json::to_string_pretty(&report), "Error: {}");
        println!("{out}");
    } else {
        print_report(&report);
    }
}

fn print_report(report: &ReplayReport) {
    for entry in &report.log {
        let line = match entry {
            LogEntry::Action { action, .. } => format!("action   {}", to_json(action)),
            LogEntry::Feedback { feedback, .. } => format!("feedback {}", to_json(feedback)),
            LogEntry::OpenApp { scheme, .. } => format!("open     {scheme}"),
            LogEntry::DismissKeyboard { .. } => "dismiss".to_string(),
            LogEntry::Change { change, .. } => format!("change   {}", to_json(change)),
        };
        println!("[{:>5}ms] {line}", entry.at());
    }
    println!();
    let text = &report.text;
    if text.center.is_empty() {
        println!("text:      {:?}|{:?}", text.left, text.right);
    } else {
        println!("text:      {:?}[{:?}]{:?}", text.left, text.center, text.right);
    }
    if !report.composing.is_empty() {
        println!("composing: {:?}", report.composing);
    }
    println!("enter:     {}", to_json(&report.enter_key_state));
    println!(
        "shift={} caps={} closed={}",
        report.is_shifted, report.is_caps_locked, report.closed
    );
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!("<{e}>"))
}
