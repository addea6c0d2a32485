use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use console::style;
use tokio::sync::mpsc;
use agentflow::config::{self, Credentials, FlowConfig};
use agentflow::errors::FlowError;
use agentflow::llm::{CompletionRouter, ProviderKind, TracingTelemetry};
use agentflow::pipeline::design::load_design;
use agentflow::pipeline::engine::{EngineConfig, ExecutionEngine};
use agentflow::pipeline::events::PipelineEvent;
use agentflow::pipeline::state::{PipelineResult, PipelineStatus};
use agentflow::pipeline::topology::compile;
use agentflow::utils::formatting::{format_cost, format_duration};
use super::commands::{OutputFormat, RunArgs};
use super::progress::RunProgress;
use tracing::info;

pub async fn handle_run(args: RunArgs, quiet: bool) -> Result<(), FlowError> {
    let file_config = match &args.config {
        Some(path) => config::parse_config(&PathBuf::from(path)).await?,
        None => FlowConfig::default(),
    };

    let design = load_design(&PathBuf::from(&args.design)).await?;
    // Surface structural errors with their own exit code before any provider is touched.
    compile(&design)?;

    let mut credentials = Credentials::shared(&file_config);
    if let Some(name) = &args.provider {
        let kind = ProviderKind::from_alias(name)
            .ok_or_else(|| FlowError::Config(format!("Unknown provider: {}", name)))?;
        credentials = credentials.restrict_to(kind);
    }
    if credentials.is_empty() {
        return Err(FlowError::NoProvider(
            "set ANTHROPIC_API_KEY, OPENAI_API_KEY or GOOGLE_API_KEY, or add keys to the config file".into(),
        ));
    }

    let engine_config = build_engine_config(&args, &file_config);
    info!(
        design = %design.name,
        providers = ?credentials.entries().iter().map(|c| c.provider.as_str()).collect::<Vec<_>>(),
        max_steps = engine_config.max_steps,
        timeout_secs = engine_config.timeout.as_secs(),
        "Starting pipeline run"
    );

    let router = CompletionRouter::from_credentials(&credentials).with_telemetry(Arc::new(TracingTelemetry));

    let show_progress = !quiet && args.output == OutputFormat::Text;
    let (tx, mut rx) = mpsc::unbounded_channel::<PipelineEvent>();
    let progress_task = tokio::spawn(async move {
        let mut progress = show_progress.then(RunProgress::new);
        while let Some(event) = rx.recv().await {
            if let Some(p) = progress.as_mut() {
                p.handle_event(&event);
            }
        }
    });

    let engine = ExecutionEngine::new(Arc::new(router))
        .with_config(engine_config)
        .with_status_sink(Arc::new(tx));
    let result = engine.execute(&design).await;
    // Dropping the engine closes the event channel
    drop(engine);
    let _ = progress_task.await;

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => print_report(&result),
    }

    match result.status {
        PipelineStatus::Completed => Ok(()),
        PipelineStatus::Timeout => Err(FlowError::Timeout(result.error.unwrap_or_default())),
        _ => Err(FlowError::Internal(
            result.error.unwrap_or_else(|| "pipeline failed".into()),
        )),
    }
}

fn build_engine_config(args: &RunArgs, file_config: &FlowConfig) -> EngineConfig {
    let mut engine = EngineConfig::from(&file_config.engine);
    if let Some(max_steps) = args.max_steps {
        engine.max_steps = max_steps.max(1);
    }
    if let Some(timeout) = args.timeout {
        engine.timeout = Duration::from_secs(timeout.max(1));
    }
    engine
}

fn print_report(result: &PipelineResult) {
    let status = match result.status {
        PipelineStatus::Completed => style(result.status.as_str()).green().bold(),
        PipelineStatus::Timeout => style(result.status.as_str()).yellow().bold(),
        _ => style(result.status.as_str()).red().bold(),
    };
    println!();
    println!("{} {}", style(&result.design_name).white().bold(), status);
    println!(
        "  {} agents | {} tokens | {} | {}",
        result.agent_results.len(),
        result.total_tokens,
        format_cost(result.total_cost),
        format_duration(result.total_duration_ms),
    );
    println!("  finished {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    if let Some(error) = &result.error {
        println!("  {} {}", style("errors:").red(), error);
    }
    if !result.output.is_empty() {
        println!();
        println!("{}", result.output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> RunArgs {
        RunArgs {
            design: "d.yaml".into(),
            config: None,
            max_steps: None,
            timeout: None,
            provider: None,
            output: OutputFormat::Text,
        }
    }

    #[test]
    fn test_engine_config_defaults_from_file() {
        let config = build_engine_config(&args(), &FlowConfig::default());
        assert_eq!(config.max_steps, 50);
        assert_eq!(config.timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_cli_overrides_win() {
        let mut a = args();
        a.max_steps = Some(5);
        a.timeout = Some(0);
        let config = build_engine_config(&a, &FlowConfig::default());
        assert_eq!(config.max_steps, 5);
        assert_eq!(config.timeout, Duration::from_secs(1));
    }
}
