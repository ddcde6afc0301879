// src/main.rs

use scalepipe::errors::ScalepipeError;
use scalepipe::{cli, logging, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        match err.downcast_ref::<ScalepipeError>() {
            Some(ScalepipeError::Pipeline(p)) => {
                eprintln!("scalepipe [{}]: {}", p.code(), p.user_message());
            }
            _ => eprintln!("scalepipe error: {err:?}"),
        }
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await?;
    Ok(())
}
