//! Alignsync - a text-alignment synchronizer for DOM-like documents.
//!
//! # Usage
//!
//! ```bash
//! alignsync page.html
//! alignsync --watch page.html
//! alignsync --check page.html
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use alignsync::app::App;
use alignsync::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    parse_flag_tokens, save_config_flags,
};

/// A mutation-driven text-alignment synchronizer for DOM-like documents
#[derive(Parser, Debug)]
#[command(name = "alignsync", version, about, long_about = None)]
struct Cli {
    /// Document file to synchronize
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Watch the file and re-synchronize on changes
    #[arg(short, long)]
    watch: bool,

    /// Emit the report as JSON
    #[arg(long)]
    json: bool,

    /// Report stale styles without synchronizing (exit 1 on drift)
    #[arg(long)]
    check: bool,

    /// Debounce window for change notifications, in milliseconds
    #[arg(long, value_name = "MS")]
    debounce_ms: Option<u64>,

    /// Delay before the late re-check pass, in milliseconds
    #[arg(long, value_name = "MS")]
    recheck_ms: Option<u64>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    if !cli.file.exists() {
        anyhow::bail!("File not found: {}", cli.file.display());
    }

    let mut app = App::new(cli.file)
        .with_watch(effective.watch)
        .with_json(effective.json)
        .with_check(effective.check);
    if let Some(ms) = effective.debounce_ms {
        app = app.with_debounce_ms(ms);
    }
    if let Some(ms) = effective.recheck_ms {
        app = app.with_recheck_ms(ms);
    }

    std::process::exit(app.run()?);
}
