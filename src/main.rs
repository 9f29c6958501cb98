use clap::Parser;
use std::io::Read;
use std::path::PathBuf;

use permfs::config::{FsConfig, MutationScope};
use permfs::script::{run_script, ScriptOptions};
use permfs::users;
use permfs::InMemoryFs;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "permfs")]
#[command(about = "An in-memory file system with per-user access control")]
#[command(version)]
struct Cli {
    /// Users file (`name pattern permission` per line)
    #[arg(short = 'u', long = "users")]
    users: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Execute the script from command line argument
    #[arg(short = 'c')]
    script: Option<String>,

    /// Stop at the first failing command
    #[arg(short = 'e', long = "errexit")]
    errexit: bool,

    /// Only check the top entry of recursive rm/cp
    #[arg(long = "lenient")]
    lenient: bool,

    /// Authorize create/remove/move against the parent directory
    #[arg(long = "parent-scope")]
    parent_scope: bool,

    /// Output results as JSON (stdout, stderr, exitCode)
    #[arg(long = "json")]
    json: bool,

    /// Script file to execute
    #[arg()]
    script_file: Option<String>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match FsConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        None => FsConfig::default(),
    };

    let mut registry = match config.registry() {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(path) = &cli.users {
        match users::load_into(&mut registry, path) {
            Ok(()) => {}
            Err(e @ users::UsersError::Io { .. }) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
            Err(e) => {
                eprintln!("Error: {}: {}", path.display(), e);
                std::process::exit(1);
            }
        }
    }
    if registry.is_empty() {
        eprintln!("Error: No users configured. Use --users FILE or a [[user]] table in --config.");
        std::process::exit(1);
    }

    let mut options = config.options();
    if cli.lenient {
        options.strict_recursive = false;
    }
    if cli.parent_scope {
        options.mutation_scope = MutationScope::Parent;
    }

    // Determine script source: -c, file, or stdin
    let script = if let Some(s) = cli.script {
        s
    } else if let Some(ref file) = cli.script_file {
        match std::fs::read_to_string(file) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error: Cannot read script file: {}: {}", file, e);
                std::process::exit(1);
            }
        }
    } else {
        use std::io::IsTerminal;
        if std::io::stdin().is_terminal() {
            eprintln!("Error: No script provided. Use -c 'script', provide a script file, or pipe via stdin.");
            std::process::exit(1);
        }
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).unwrap_or_default();
        buf
    };

    let fs = InMemoryFs::with_options(registry, options);
    let result = run_script(&fs, &script, &ScriptOptions { stop_on_error: cli.errexit }).await;

    if cli.json {
        println!("{}", serde_json::json!({
            "stdout": result.stdout,
            "stderr": result.stderr,
            "exitCode": result.exit_code,
            "errors": result.errors,
        }));
    } else {
        if !result.stdout.is_empty() {
            print!("{}", result.stdout);
        }
        if !result.stderr.is_empty() {
            eprint!("{}", result.stderr);
        }
    }

    std::process::exit(result.exit_code);
}
