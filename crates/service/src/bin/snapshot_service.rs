use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    match catalist_ops_service_lib::service_main().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Service stopped: {e:?}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
