#![forbid(unsafe_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

mod chat;
mod cli;
mod config;
mod db;
mod inference;
mod llm;
mod quiz;
mod scan;
mod utils;
mod web;

use chat::ChatAssistant;
use cli::Cli;
use config::Config;
use inference::{InferenceClient, RoboflowClient};
use llm::{CompletionProvider, GeminiProvider, GroqProvider};
use quiz::{QuizScript, RiskAssessor};
use scan::ScanService;
use web::metrics::Metrics;
use web::{WebServer, WebState};

fn load_quiz(config: &Config) -> Result<QuizScript> {
    match &config.quiz.path {
        Some(path) => QuizScript::load(path)
            .with_context(|| format!("failed to load quiz script from {}", path.display())),
        None => QuizScript::bundled().context("bundled quiz script is invalid"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.server.port = port;
        config.validate()?;
    }
    let config = Arc::new(config);

    utils::logging::init_tracing(&config.logging);
    Metrics::start_clock();
    info!("screening gateway starting up");

    let db_manager = db::DatabaseManager::new(&config.database).await?;
    db_manager.migrate().await?;
    info!("scan database ready at {}", db_manager.sqlite_path());

    // Missing credentials disable a feature; its endpoint then answers 503.
    let inference: Option<Arc<dyn InferenceClient>> = match RoboflowClient::new(&config.inference) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            warn!("scan inference disabled: {}", e);
            None
        }
    };

    let answer_mapper: Option<Arc<dyn CompletionProvider>> =
        match GroqProvider::new(&config.llm.groq) {
            Ok(provider) => Some(Arc::new(provider)),
            Err(e) => {
                warn!("risk assessment disabled: {}", e);
                None
            }
        };

    let gemini: Option<Arc<dyn CompletionProvider>> = match GeminiProvider::new(&config.llm.gemini)
    {
        Ok(provider) => Some(Arc::new(provider)),
        Err(e) => {
            warn!("chat and assessment insights disabled: {}", e);
            None
        }
    };

    let script = Arc::new(load_quiz(&config)?);
    info!(
        "loaded quiz \"{}\" with {} questions",
        script.title,
        script.questions.len()
    );

    let state = WebState {
        scans: Arc::new(ScanService::new(inference, db_manager.scan_store())),
        assessor: Arc::new(RiskAssessor::new(script, answer_mapper, gemini.clone())),
        chat: Arc::new(ChatAssistant::new(gemini)),
        max_body_bytes: config.server.max_body_bytes,
    };

    let web_server = WebServer::new(config.clone(), state);
    let web_handle = tokio::spawn(async move {
        if let Err(e) = web_server.start().await {
            error!("web server error: {}", e);
        }
    });

    tokio::select! {
        _ = web_handle => {},
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!("failed to listen for shutdown signal: {}", e);
            }
        },
    }

    info!("screening gateway shutting down");
    Ok(())
}
