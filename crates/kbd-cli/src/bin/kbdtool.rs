use std::path::Path;

use clap::{Parser, Subcommand};

use kbd_cli::commands::{config_ops, replay_ops};
use kbd_cli::trace_init;

#[derive(Parser)]
#[command(name = "kbdtool", about = "Keyboard engine replay and settings tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a touch script against a headless keyboard
    Replay {
        /// Script TOML file (layout, field and timed steps)
        script: String,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
        /// Custom settings TOML file
        #[arg(long)]
        settings: Option<String>,
        /// Log engine events (requires --features trace)
        #[arg(long)]
        trace: bool,
        /// Write trace events as JSON lines into this directory instead of stderr
        #[arg(long, requires = "trace")]
        trace_dir: Option<String>,
    },
    /// Export default settings as TOML
    SettingsExport,
    /// Validate a custom settings TOML file
    SettingsValidate {
        /// Path to the TOML file
        file: String,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Replay {
            script,
            json,
            settings,
            trace,
            trace_dir,
        } => {
            let _guard = trace.then(|| trace_init::init_tracing(trace_dir.as_deref().map(Path::new)));
            replay_ops::replay_cmd(&script, json, settings.as_deref());
        }
        Command::SettingsExport => config_ops::settings_export(),
        Command::SettingsValidate { file } => config_ops::settings_validate(&file),
    }
}
