//! Heist — pulls expense exports out of a logged-in Safari session.

use std::path::PathBuf;
use std::sync::Arc;

use heist_browser::{Bridge, SafariBridge};
use heist_core::HeistConfig;
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod routes;
mod state;
mod tools;

use state::AppState;

fn print_json(value: &Value) -> ! {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(_) => println!("{}", value),
    }
    std::process::exit(if value.get("error").is_some() { 1 } else { 0 });
}

/// Run a blocking tool off the async runtime and print its JSON result.
async fn run_tool<F>(f: F) -> anyhow::Result<()>
where
    F: FnOnce(&dyn Bridge, &HeistConfig) -> Value + Send + 'static,
{
    let config = HeistConfig::from_env()?;
    let value = tokio::task::spawn_blocking(move || {
        let bridge = SafariBridge::new();
        f(&bridge, &config)
    })
    .await?;
    print_json(&value)
}

fn parse_file(path: PathBuf) -> Value {
    let report_name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let parsed = std::fs::File::open(&path)
        .map_err(heist_core::Error::from)
        .and_then(|file| heist_ingest::parse_reader(file));

    let payload = parsed
        .and_then(|expenses| tools::ExportPayload::new(report_name, expenses))
        .and_then(|payload| Ok(serde_json::to_value(payload)?));
    match payload {
        Ok(value) => value,
        Err(e) => tools::error_json(&e),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    // Handle CLI subcommands
    if args.len() > 1 {
        match args[1].as_str() {
            "login" => {
                let timeout_seconds = match args.get(2) {
                    Some(raw) => Some(raw.parse::<u64>().map_err(|_| {
                        anyhow::anyhow!("Invalid timeout: {}", raw)
                    })?),
                    None => None,
                };
                let login_args = tools::LoginArgs { timeout_seconds };
                return run_tool(move |bridge, config| tools::login(bridge, config, &login_args)).await;
            }
            "export" => {
                let export_args = tools::ExportArgs {
                    report_id: args.get(2).cloned(),
                    ..Default::default()
                };
                return run_tool(move |bridge, config| tools::export(bridge, config, &export_args)).await;
            }
            "parse" => {
                let Some(path) = args.get(2) else {
                    eprintln!("Usage: heist parse <file.csv>");
                    std::process::exit(1);
                };
                print_json(&parse_file(PathBuf::from(path)));
            }
            "--help" | "-h" | "help" => {
                println!("Heist — Expensify exports through a logged-in Safari session");
                println!();
                println!("Usage: heist [command]");
                println!();
                println!("Commands:");
                println!("  (none)                 Start the tool server");
                println!("  login [timeout]        Wait for an interactive Expensify login");
                println!("  export [report-id]     Export a report and print parsed expenses");
                println!("  parse <file.csv>       Normalize a saved export");
                println!("  help                   Show this help message");
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'heist help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    // Normal server startup
    let config = HeistConfig::from_env()?;
    let port = config.port;
    info!("Config file: {}", config.config_path.display());
    info!("Watching downloads in {}", config.downloads_dir().display());

    let state = Arc::new(AppState::new(config, Arc::new(SafariBridge::new())));
    let app = routes::build_router(state);

    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Heist tool server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
