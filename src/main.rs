use std::fs::{self, File};
use std::path::PathBuf;

use clap::Parser;
use parley::core::config::{self, ConfigError, ResolvedConfig};
use parley::tui::keymap::Keymap;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

#[derive(Parser)]
#[command(name = "parley", about = "Terminal chat client for LLM completion APIs")]
struct Args {
    /// Model to use (overrides config file and PARLEY_MODEL)
    #[arg(short, long)]
    model: Option<String>,

    /// Config file to read instead of ~/.parley/config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

/// Log file under ~/.parley, or the working directory if that is unusable.
fn open_log_file() -> Option<File> {
    let in_home = dirs::home_dir().map(|home| home.join(".parley"));
    if let Some(dir) = in_home
        && fs::create_dir_all(&dir).is_ok()
        && let Ok(file) = File::create(dir.join("parley.log"))
    {
        return Some(file);
    }
    File::create("parley.log").ok()
}

fn load(args: &Args) -> Result<(ResolvedConfig, Keymap), ConfigError> {
    let file_config = config::load_config(args.config.as_deref())?;
    let resolved = config::resolve(&file_config, args.model.as_deref())?;
    let keymap = Keymap::from_bindings(&resolved.keybindings)?;
    Ok((resolved, keymap))
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if let Some(log_file) = open_log_file() {
        let _ = WriteLogger::init(level, log_config, log_file);
    }

    let (resolved, keymap) = match load(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            log::error!("Startup failed: {}", e);
            eprintln!("parley: {e}");
            std::process::exit(1);
        }
    };

    log::info!(
        "Parley starting up: model={}, base_url={}",
        resolved.model_name,
        resolved.base_url
    );

    parley::tui::run(resolved, keymap)
}
