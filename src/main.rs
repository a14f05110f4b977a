use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    bulk_restore::cli::main().await
}
