use std::process::ExitCode;
use std::sync::Arc;

use catalist_ops_scripts::cli::Cli;
use catalist_ops_scripts::prometheus_metrics::Metrics;
use catalist_ops_scripts::scripts::prelude::{RuntimeConfig, ScriptRuntime};
use catalist_ops_scripts::tracing as tracing_config;
use catalist_ops_shared::output::ScriptOutput;
use clap::Parser;

// cargo run --bin catalist -- --manifest deployed-ace_devnet.json withdraw-queue-info

fn print_output(output: &ScriptOutput, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", output.render_json()?);
    } else {
        print!("{}", output.render_plain());
    }
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(result) = cli.command.run_offline() {
        return print_output(&result?, cli.json);
    }

    let config = RuntimeConfig::load(&cli.overrides())?;
    tracing::debug!("Runtime config: {:?}", config);
    let metrics = Arc::new(Metrics::new("catalist_ops")?);
    let runtime = ScriptRuntime::init(config, metrics)?;

    let json = cli.json;
    let output = cli.command.run(&runtime).await?;
    print_output(&output, json)
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    tracing_config::setup_logger(
        tracing_config::LoggingConfig::default()
            .with_thread_names(true)
            .use_format(cli.log_format.clone()),
    );

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Command failed: {e:?}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
