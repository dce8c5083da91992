//! Wires the stack together and drives it from the terminal.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use pagepilot_actions::{Dispatcher, DispatcherConfig};
use pagepilot_agent::{
    AgentConfig, AgentController, HttpOracle, HttpOracleConfig, SessionState,
};
use pagepilot_audit::{InMemoryAudit, Retrying, RetryPolicy};
use pagepilot_core_types::SessionId;
use pagepilot_dom_cache::DomCache;
use pagepilot_driver::MockDriver;
use pagepilot_event_bus::{ProgressBus, ProgressEvent};

use crate::settings::Settings;

pub struct App {
    controller: AgentController,
    audit: Arc<InMemoryAudit>,
    progress: Arc<ProgressBus>,
}

impl App {
    pub fn build(settings: &Settings) -> Result<Self> {
        let api_key = std::env::var("PAGEPILOT_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .context("set PAGEPILOT_API_KEY (or OPENAI_API_KEY) to reach the reasoning model")?;

        let oracle = HttpOracle::new(HttpOracleConfig {
            base_url: settings.oracle_base_url.clone(),
            api_key,
            model: settings.oracle_model.clone(),
            timeout_secs: settings.oracle_timeout_secs,
        })?;

        let audit = Arc::new(InMemoryAudit::new());
        let recorder = Arc::new(Retrying::new(audit.clone(), RetryPolicy::default()));
        let progress = ProgressBus::new(128);
        let cache = Arc::new(DomCache::default());
        // Stand-in driver; a real browser backend plugs in behind the same port.
        let driver = Arc::new(MockDriver::new());

        let dispatcher = Arc::new(Dispatcher::new(
            driver,
            cache,
            recorder.clone(),
            progress.clone(),
            DispatcherConfig {
                max_elements_cap: settings.max_elements,
            },
        ));
        let controller = AgentController::new(
            Arc::new(oracle),
            dispatcher,
            recorder,
            progress.clone(),
            AgentConfig::default()
                .with_loop_limit(settings.loop_limit)
                .with_max_history(settings.max_history),
        );

        Ok(Self {
            controller,
            audit,
            progress,
        })
    }

    /// Mirror tool progress to the terminal while a turn is running.
    fn spawn_progress_printer(&self) -> tokio::task::JoinHandle<()> {
        let mut events = self.progress.subscribe();
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                match event {
                    ProgressEvent::ToolStarted { name } => {
                        println!("  -> {name} ...");
                    }
                    ProgressEvent::ToolFinished { name, success, .. } => {
                        let mark = if success { "ok" } else { "failed" };
                        println!("  -> {name}: {mark}");
                    }
                    _ => {}
                }
            }
        })
    }

    /// Interactive loop. `:stats` prints the dashboard, `:quit` leaves.
    pub async fn chat(&self) -> Result<()> {
        let _printer = self.spawn_progress_printer();
        let session_id = SessionId::new();
        info!(%session_id, "chat session started");
        let mut state = SessionState::new();
        let stdin = std::io::stdin();

        println!("PagePilot ready. Type a message, :stats, or :quit.");
        loop {
            print!("> ");
            std::io::stdout().flush()?;
            let mut line = String::new();
            if stdin.read_line(&mut line)? == 0 {
                break;
            }
            let line = line.trim();
            match line {
                "" => continue,
                ":quit" | ":q" => break,
                ":stats" => self.print_stats(),
                message => {
                    let reply = self.controller.handle_message(&mut state, message).await?;
                    println!("{reply}");
                }
            }
        }
        info!("chat session ended");
        Ok(())
    }

    /// One goal, then a summary.
    pub async fn run_once(&self, goal: &str) -> Result<()> {
        let _printer = self.spawn_progress_printer();
        let mut state = SessionState::new();
        let reply = self.controller.handle_message(&mut state, goal).await?;
        println!("{reply}");
        self.print_stats();
        Ok(())
    }

    fn print_stats(&self) {
        println!("runs: {}", self.audit.total_runs());
        println!("failed: {}", self.audit.failed_runs());
        println!("success rate: {:.1}%", self.audit.success_rate());
        println!("total runtime: {:.1} min", self.audit.total_runtime_minutes());
        for item in self.audit.recent_activity(10) {
            println!("  {} {} ({})", item.time, item.action, item.status);
        }
    }
}
