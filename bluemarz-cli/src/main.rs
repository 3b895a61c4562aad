use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod demo;
mod inspect;

use demo::run_demo;
use inspect::{run_inspect, run_schema};

#[derive(Parser, Debug)]
#[command(name = "bluemarz", version = "0.2.0")]
#[command(about = "Bluemarz CLI - inspect assignment specs and run the scripted demo")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Summarise an assignment spec file (JSON or YAML)
    Inspect {
        #[arg(long)]
        spec: PathBuf,
    },
    /// Print the function-calling schemas of a spec's tools
    Schema {
        #[arg(long)]
        spec: PathBuf,
    },
    /// Run the add-two-numbers scenario against the mock backend
    Demo {
        #[arg(long, default_value_t = 2)]
        a: i64,
        #[arg(long, default_value_t = 3)]
        b: i64,
    },
}

#[tokio::main]
async fn main() {
    // Initialize JSON logging once.
    let env_filter = tracing_subscriber::EnvFilter::from_default_env();
    let env_filter = match "info".parse() {
        Ok(directive) => env_filter.add_directive(directive),
        Err(_) => env_filter,
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .json()
        .try_init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Inspect { spec } => run_inspect(&spec),
        Commands::Schema { spec } => run_schema(&spec),
        Commands::Demo { a, b } => run_demo(a, b).await.map(|outcome| {
            for message in outcome.messages().into_iter().flatten() {
                println!("{}", message.text.as_deref().unwrap_or_default());
            }
        }),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, code = e.error_code(), "Command failed");
        std::process::exit(1);
    }
}
