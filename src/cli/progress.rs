use std::time::{Duration, Instant};
use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use agentflow::pipeline::events::PipelineEvent;
use agentflow::pipeline::state::AgentStatus;
use agentflow::utils::formatting::{format_cost, format_duration};

/// Terminal progress for one run: a bar over the agents plus a status spinner.
pub struct RunProgress {
    multi: MultiProgress,
    agent_bar: Option<ProgressBar>,
    status_bar: ProgressBar,
    cost_usd: f64,
    start_time: Instant,
}

impl RunProgress {
    pub fn new() -> Self {
        let multi = MultiProgress::new();

        let status_bar = multi.add(ProgressBar::new_spinner());
        status_bar.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        status_bar.set_message("Compiling design...");
        status_bar.enable_steady_tick(Duration::from_millis(120));

        Self {
            multi,
            agent_bar: None,
            status_bar,
            cost_usd: 0.0,
            start_time: Instant::now(),
        }
    }

    pub fn handle_event(&mut self, event: &PipelineEvent) {
        match event {
            PipelineEvent::Started { agent_count, design_name, .. } => {
                let bar = self.multi.insert_before(&self.status_bar, ProgressBar::new(*agent_count as u64));
                bar.set_style(
                    ProgressStyle::default_bar()
                        .template("  {bar:30.cyan/dark_gray} {pos}/{len} agents | {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_bar())
                        .progress_chars("█▓░"),
                );
                bar.set_message(design_name.clone());
                self.agent_bar = Some(bar);
                self.println(&render_event(event));
                self.update_status();
            }
            PipelineEvent::AgentCompleted { cost_usd, .. } => {
                self.cost_usd += cost_usd;
                if let Some(bar) = &self.agent_bar {
                    bar.inc(1);
                }
                self.println(&render_event(event));
                self.update_status();
            }
            PipelineEvent::Completed { .. } => {
                if let Some(bar) = self.agent_bar.take() {
                    bar.finish_and_clear();
                }
                self.status_bar.finish_with_message(render_event(event));
            }
            PipelineEvent::Failed { .. } | PipelineEvent::TimedOut { .. } => {
                if let Some(bar) = self.agent_bar.take() {
                    bar.abandon_with_message("stopped");
                }
                self.status_bar.abandon_with_message(render_event(event));
            }
        }
    }

    fn update_status(&self) {
        self.status_bar.set_message(format!(
            "{} | {}",
            format_duration(self.start_time.elapsed().as_millis() as u64),
            format_cost(self.cost_usd),
        ));
    }

    pub fn println(&self, msg: &str) {
        let _ = self.multi.println(msg);
    }
}

/// Render an event as one styled line.
pub fn render_event(event: &PipelineEvent) -> String {
    match event {
        PipelineEvent::Started { run_id, design_name, agent_count } => format!(
            "{} Running {} ({} agents, run {})",
            style("▶").green().bold(),
            style(design_name).white().bold(),
            agent_count,
            style(run_id).cyan(),
        ),
        PipelineEvent::AgentCompleted { agent_name, status: AgentStatus::Success, duration_ms, cost_usd } => format!(
            "  {} {} ({} | {})",
            style("✓").green(),
            style(agent_name).green(),
            format_duration(*duration_ms),
            format_cost(*cost_usd),
        ),
        PipelineEvent::AgentCompleted { agent_name, duration_ms, .. } => format!(
            "  {} {} ({})",
            style("✗").red(),
            style(agent_name).red(),
            format_duration(*duration_ms),
        ),
        PipelineEvent::Completed { total_cost_usd, total_tokens, duration_ms } => format!(
            "Pipeline complete: {} tokens | {} | {}",
            total_tokens,
            format_cost(*total_cost_usd),
            format_duration(*duration_ms),
        ),
        PipelineEvent::Failed { error } => format!("{} {}", style("Pipeline failed:").red().bold(), error),
        PipelineEvent::TimedOut { timeout_secs } => format!(
            "{} after {}s",
            style("Pipeline timed out").yellow().bold(),
            timeout_secs,
        ),
    }
}
