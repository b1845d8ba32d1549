use clap::Parser;
use std::process;

#[tokio::main]
async fn main() {
    tracing_log::LogTracer::init().expect("Failed to set up LogTracer");

    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
    let cli = lock_client::Cli::parse();

    let clerk = match lock_client::Clerk::with_config(&cli.primary, &cli.backup, cli.transport_config())
    {
        Ok(clerk) => clerk,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    };

    let outcome = match &cli.command {
        lock_client::Commands::Lock { name } => {
            tracing::info!("Locking {} as client {}", name, clerk.client_id());
            clerk.try_lock(name).await
        }
        lock_client::Commands::Unlock { name } => {
            tracing::info!("Unlocking {} as client {}", name, clerk.client_id());
            clerk.try_unlock(name).await
        }
    };

    let (message, code) = lock_client::cli::report(&cli.command, &outcome);
    println!("{}", message);
    process::exit(code);
}
