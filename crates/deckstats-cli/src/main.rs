//! CLI for deckstats: live sensor graphs on a stream deck.

mod commands;
mod hid;

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "deckstats")]
#[command(about = "deckstats: live sensor graphs on a 15-key stream deck")]
#[command(version = deckstats_core::VERSION)]
struct Cli {
    /// More log output (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll sensors and keep the deck's keys updated until Ctrl+C
    Run {
        /// JSON configuration file (defaults apply for missing fields)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the poll interval in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Override the startup brightness (0-100)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        brightness: Option<u8>,

        /// Log failed device writes and keep polling instead of exiting
        #[arg(long)]
        keep_going: bool,

        /// Do not spawn the key-press reader
        #[arg(long)]
        no_input: bool,

        /// Read hwmon sensors from this directory instead of /sys/class/hwmon
        #[arg(long)]
        hwmon_root: Option<PathBuf>,

        /// Open the deck with this serial number
        #[arg(long)]
        serial: Option<String>,
    },

    /// List current sensor readings and the panels they feed
    Sensors {
        /// JSON configuration file used to show panel matches
        #[arg(long)]
        config: Option<PathBuf>,

        /// Read hwmon sensors from this directory instead of /sys/class/hwmon
        #[arg(long)]
        hwmon_root: Option<PathBuf>,

        /// Print readings as JSON
        #[arg(long)]
        json: bool,
    },

    /// List attached decks
    Devices,

    /// Clear every key image
    Reset {
        /// Open the deck with this serial number
        #[arg(long)]
        serial: Option<String>,
    },

    /// Set display brightness
    Brightness {
        /// Brightness percentage
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        percent: u8,

        /// Open the deck with this serial number
        #[arg(long)]
        serial: Option<String>,
    },

    /// Print the effective configuration as JSON
    Config {
        /// JSON configuration file to merge over the defaults
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            config,
            interval_ms,
            brightness,
            keep_going,
            no_input,
            hwmon_root,
            serial,
        } => commands::run::run(commands::run::RunCommandConfig {
            config_path: config.as_deref(),
            interval_ms,
            brightness,
            keep_going,
            read_input: !no_input,
            hwmon_root: hwmon_root.as_deref(),
            serial: serial.as_deref(),
        }),
        Commands::Sensors {
            config,
            hwmon_root,
            json,
        } => commands::sensors::run(config.as_deref(), hwmon_root.as_deref(), json),
        Commands::Devices => commands::devices::run(),
        Commands::Reset { serial } => commands::reset::run(serial.as_deref()),
        Commands::Brightness { percent, serial } => {
            commands::brightness::run(percent, serial.as_deref())
        }
        Commands::Config { config } => commands::config::run(config.as_deref()),
    }
}
