use clap::Parser;
use console_state::{Command, Path, Store, StoreConfig, StoreError, StoreResult, Value};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Replay a JSON command script against a fresh store and print the result.
#[derive(Debug, Parser)]
#[command(name = "console-state")]
struct Args {
    /// JSON array of commands, e.g. `[{"op": "store", "path": ["app", "section"], "value": "clusters"}]`.
    #[arg(long, env = "CONSOLE_STATE_SCRIPT")]
    script: PathBuf,

    /// Store configuration (initial tree and reset allow-list).
    #[arg(long, env = "CONSOLE_STATE_CONFIG")]
    config: Option<PathBuf>,

    /// Dot-separated path to print instead of the whole tree.
    #[arg(long)]
    read: Option<String>,

    #[arg(long)]
    compact: bool,

    /// Log filter directive, used when `RUST_LOG` is unset.
    #[arg(long, env = "CONSOLE_STATE_LOG", default_value = "warn")]
    log: String,
}

fn init_logging(directive: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_script(path: &std::path::Path) -> StoreResult<Vec<Command>> {
    let raw = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&raw)?)
}

fn run(args: &Args) -> StoreResult<Value> {
    let config = match &args.config {
        Some(path) => StoreConfig::from_file(path)?,
        None => StoreConfig::default(),
    };
    let script = load_script(&args.script)?;
    tracing::info!(commands = script.len(), "replaying script");

    let store = Store::new(config);
    for command in script {
        store.dispatch(command.into());
    }

    Ok(match &args.read {
        Some(raw) => store.read(&Path::parse(raw)).unwrap_or(Value::Null),
        None => store.snapshot(),
    })
}

fn main() {
    let args = Args::parse();
    init_logging(&args.log);

    let value = match run(&args) {
        Ok(value) => value,
        Err(e) => {
            eprintln!("console-state: {e}");
            std::process::exit(2);
        }
    };

    let rendered = if args.compact {
        serde_json::to_string(&value)
    } else {
        serde_json::to_string_pretty(&value)
    };
    match rendered {
        Ok(out) => println!("{out}"),
        Err(e) => {
            eprintln!("console-state: failed to render output: {e}");
            std::process::exit(2);
        }
    }
}
