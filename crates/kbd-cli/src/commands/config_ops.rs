use std::fs;
use std::process;

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            process::exit(1);
        })
    };
}

pub(crate) use die;

pub fn settings_export() {
    print!("{}", kbd_core::settings::default_toml());
}

pub fn settings_validate(file: &str) {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    let s = die!(
        kbd_core::settings::parse_settings_toml(&content),
        "Error: {}"
    );
    println!(
        "OK: longpress.normal_ms={}, longpress.repeat_interval_ms={}, gesture.flick_sensitivity={}",
        s.longpress.normal_ms, s.longpress.repeat_interval_ms, s.gesture.flick_sensitivity
    );
}
