pub mod commands;
pub mod config;
pub mod error;
mod logging;
pub mod models;
pub mod repl;
pub mod services;
pub mod utils;

use clap::Parser;
use std::process::ExitCode;

use config::AppConfig;
use error::AppResult;
use repl::{Actions, Repl};
use services::{DatasetService, GeminiClient, ResilientGenerator, Session, SystemClock};

pub fn run() -> ExitCode {
    let config = AppConfig::parse();
    logging::init(config.verbose);

    match start(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "eventbnb stopped");
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn start(config: AppConfig) -> AppResult<()> {
    config.validate()?;

    let dataset = DatasetService::from_csv_path(&config.csv_path)?;
    let generator = ResilientGenerator::new(GeminiClient::new(config.api_base.clone()), config.backoff_policy());
    let actions = Actions::new(
        Session::new(config.cooldown()),
        dataset,
        generator,
        SystemClock,
        config.model.clone(),
    )
    .with_api_key(config.api_key.clone());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let mut repl = Repl::new(actions)?;
        repl.run().await
    })
}
