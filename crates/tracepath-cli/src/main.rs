//! Tracepath CLI - inspect and convert persisted analysis stores

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use log::debug;

use tracepath_ids::OfflineSession;
use tracepath_parts::Form;
use tracepath_storage::{
    FileHashList, FileMethodStore, MessageHandlerStore, PathStore, PersistentStore, StoreConfig,
    View,
};

#[derive(Parser)]
#[command(name = "tracepath")]
#[command(about = "Inspect file-path reconstruction stores", long_about = None)]
struct Cli {
    /// Log more (repeat for trace output)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Store configuration (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a path store
    Paths {
        /// Structured path store
        file: PathBuf,
        /// Rendering of the path expressions
        #[arg(short, long, value_enum, default_value_t = FormArg::Full)]
        form: FormArg,
    },
    /// Print a file-method store and its view sizes
    FileMethods {
        /// Structured or text file-method store
        file: PathBuf,
        /// Read the text format
        #[arg(long)]
        txt: bool,
    },
    /// Print the dependency hash list embedded in a text file-method dump
    Hashes {
        file: PathBuf,
    },
    /// Convert a text file-method dump to the structured form
    Convert {
        txt: PathBuf,
        json: PathBuf,
    },
    /// Print a message-handler store
    Handlers {
        file: PathBuf,
    },
    /// Report whether a persisted store is stale relative to its dependencies
    Check {
        file: PathBuf,
        deps: Vec<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormArg {
    Full,
    Simple,
    SuperSimple,
    Regex,
}

impl From<FormArg> for Form {
    fn from(arg: FormArg) -> Self {
        match arg {
            FormArg::Full => Form::Full,
            FormArg::Simple => Form::Simple,
            FormArg::SuperSimple => Form::SuperSimple,
            FormArg::Regex => Form::Regex,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => StoreConfig::load(path).unwrap_or_else(|e| {
            eprintln!("Error reading config {}: {}", path.display(), e);
            std::process::exit(1);
        }),
        None => StoreConfig::default(),
    };

    match cli.command {
        Commands::Paths { file, form } => cmd_paths(&file, form.into(), &config),
        Commands::FileMethods { file, txt } => cmd_file_methods(&file, txt, &config),
        Commands::Hashes { file } => cmd_hashes(&file),
        Commands::Convert { txt, json } => cmd_convert(&txt, &json, &config),
        Commands::Handlers { file } => cmd_handlers(&file, &config),
        Commands::Check { file, deps } => cmd_check(&file, &deps),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Print `err` and exit with status 1
fn fail(context: &str, err: impl std::fmt::Display) -> ! {
    eprintln!("{}: {}", context, err);
    std::process::exit(1);
}

fn cmd_paths(file: &Path, form: Form, config: &StoreConfig) {
    let store = PathStore::read_json(file).unwrap_or_else(|e| fail("Error reading path store", e));
    match store.to_text(&config.spacer, form) {
        Ok(text) => print!("{}", text),
        Err(e) => fail("Error rendering paths", e),
    }
    println!("{} entry point(s)", store.len());
}

fn cmd_file_methods(file: &Path, txt: bool, config: &StoreConfig) {
    let store = if txt {
        FileMethodStore::read_txt(file, &OfflineSession::new())
    } else {
        FileMethodStore::read_json(file)
    }
    .unwrap_or_else(|e| fail("Error reading file-method store", e));

    print!("{}", store.to_text(&config.spacer));
    println!();
    for view in View::ALL {
        println!("{:>15}: {}", view.name(), store.view(view).len());
    }
}

fn cmd_hashes(file: &Path) {
    match FileMethodStore::read_file_hash_list_txt(file) {
        Ok(Some(hashes)) => print!("{}", hashes),
        Ok(None) => println!("No dependency hashes in {}", file.display()),
        Err(e) => fail("Error reading header", e),
    }
}

fn cmd_convert(txt: &Path, json: &Path, config: &StoreConfig) {
    let store = FileMethodStore::read_txt(txt, &OfflineSession::new())
        .unwrap_or_else(|e| fail("Error reading text dump", e));
    if let Ok(Some(hashes)) = FileMethodStore::read_file_hash_list_txt(txt) {
        store.set_file_hashes(hashes);
    }
    if let Err(e) = store.write_json(json, config) {
        fail("Error writing store", e);
    }
    println!("✓ Converted {} file method(s) to {}", store.len(), json.display());
}

fn cmd_handlers(file: &Path, config: &StoreConfig) {
    let store = MessageHandlerStore::read_json(file)
        .unwrap_or_else(|e| fail("Error reading message-handler store", e));
    print!("{}", store.to_text(&config.spacer));
}

fn cmd_check(file: &Path, deps: &[PathBuf]) {
    let recorded = recorded_hashes(file).unwrap_or_else(|e| fail("Error reading store", e));
    let current = FileHashList::compute(deps).unwrap_or_else(|e| fail("Error hashing dependencies", e));
    debug!("recorded {} hash(es), computed {}", recorded.len(), current.len());

    if recorded == current {
        println!("✓ {} is current", file.display());
    } else {
        println!("✗ {} is stale", file.display());
        std::process::exit(1);
    }
}

/// Dependency hashes of any persisted store, structured or text
fn recorded_hashes(file: &Path) -> Result<FileHashList, String> {
    if file.extension().and_then(|e| e.to_str()) == Some("txt") {
        return FileMethodStore::read_file_hash_list_txt(file)
            .map(Option::unwrap_or_default)
            .map_err(|e| e.to_string());
    }
    let text = fs::read_to_string(file).map_err(|e| e.to_string())?;
    let value: serde_json::Value = serde_json::from_str(&text).map_err(|e| e.to_string())?;
    match value.get("file_hashes") {
        Some(hashes) => serde_json::from_value(hashes.clone()).map_err(|e| e.to_string()),
        None => Ok(FileHashList::default()),
    }
}
