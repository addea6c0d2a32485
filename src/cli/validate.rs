use std::path::PathBuf;
use console::style;
use agentflow::agents::guard;
use agentflow::errors::FlowError;
use agentflow::pipeline::design::load_design;
use agentflow::pipeline::topology::compile;
use super::commands::ValidateArgs;

pub async fn handle_validate(args: ValidateArgs) -> Result<(), FlowError> {
    let design = load_design(&PathBuf::from(&args.design)).await?;
    let graph = compile(&design)?;

    println!(
        "{} {} ({} agents, {})",
        style("✓").green(),
        style(&design.name).white().bold(),
        graph.len(),
        if graph.explicit { "explicit edges" } else { "sequential" },
    );
    for line in graph.summary() {
        println!("  {}", line);
    }

    if guard::scan_design(&design).is_some() {
        println!(
            "{} design text matches the prompt-injection catalogue; every agent will be rejected at run time",
            style("warning:").yellow().bold(),
        );
    }
    Ok(())
}
