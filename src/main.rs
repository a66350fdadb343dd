use clap::Parser;
use colored::*;

use subrecur::cli::Args;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    print_banner();

    if let Err(e) = subrecur::run(args).await {
        eprintln!("{} {}", "[!]".red(), e);
        std::process::exit(1);
    }
}

fn print_banner() {
    println!(
        "{}",
        r#"
   _____       __    ____
  / ___/__  __/ /_  / __ \___  _______  ______
  \__ \/ / / / __ \/ /_/ / _ \/ ___/ / / / ___/
 ___/ / /_/ / /_/ / _, _/  __/ /__/ /_/ / /
/____/\__,_/_.___/_/ |_|\___/\___/\__,_/_/
        Recursive Subdomain Enumerator
    "#
        .bold()
        .blue()
    );
}
