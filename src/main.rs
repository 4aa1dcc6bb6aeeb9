use clap::Parser;
use env_logger::Env;
use log::info;

use tripmatch::cli::Cli;

#[tokio::main]
async fn main() {
    // Pick up TODOIST_API_TOKEN and friends from a local .env if present.
    dotenvy::dotenv().ok();

    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            use chrono::Local;
            use std::io::Write;
            writeln!(
                buf,
                "{} [{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();

    let cli = Cli::parse();
    info!("Starting tripmatch run");

    if let Err(err) = tripmatch::run(&cli.config, cli.ignore_state).await {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
