use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{debug, warn};

use lazytree::config::{AppConfig, GeneralConfig, TreeConfig};
use lazytree::logging::{self, LogLevel};
use lazytree::{render, AppError, LocalFs, Tree, TreeLoader};

/// Browse a directory tree without scanning the whole disk.
#[derive(Parser, Debug)]
#[command(name = "lazytree", version, about)]
struct Cli {
    /// Directory to reveal (defaults to the configured path, then the current directory)
    path: Option<PathBuf>,

    /// Explicit config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Diagnostics verbosity
    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,

    /// List dot directories
    #[arg(long)]
    show_hidden: bool,

    /// Also print the files inside the revealed directory
    #[arg(long)]
    files: bool,
}

impl Cli {
    fn overrides(&self) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                default_path: None,
                log_level: self.log_level,
            },
            tree: TreeConfig {
                show_hidden: self.show_hidden.then_some(true),
                ..Default::default()
            },
        }
    }
}

fn main() -> lazytree::Result<()> {
    let cli = Cli::parse();
    let (config, skipped) = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides()));
    logging::init(config.log_level());
    for err in &skipped {
        warn!("Ignoring config file: {}", err);
    }
    debug!("Effective config: {config:?}");

    let target = match cli.path.clone().or_else(|| config.default_path()) {
        Some(path) => path,
        None => std::env::current_dir().map_err(|e| AppError::from_io(Path::new("."), e))?,
    };

    let loader = TreeLoader::new(LocalFs::from_config(&config));
    let mut tree = Tree::new();
    loader.load_roots(&mut tree);

    let node = loader
        .try_reveal_path(&mut tree, &target)
        .map_err(|e| AppError::InvalidPath(format!("{}: {}", target.display(), e)))?;
    loader.expand(&mut tree, node);

    for line in render::render_lines(&tree) {
        println!("{line}");
    }

    if cli.files {
        println!();
        for file in loader.files_in(&tree, node)? {
            println!(
                "{:<40} {:>10}  {}",
                file.name,
                file.formatted_size(),
                file.formatted_date()
            );
        }
    }

    Ok(())
}
