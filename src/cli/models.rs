use console::style;
use agentflow::errors::FlowError;
use agentflow::llm::catalog::{ComplexityTier, MODEL_REGISTRY};
use agentflow::utils::formatting::format_price;
use super::commands::ModelsArgs;

pub async fn handle_models(args: ModelsArgs) -> Result<(), FlowError> {
    let only = match args.tier.as_deref() {
        None => None,
        Some("simple") => Some(ComplexityTier::Simple),
        Some("standard") => Some(ComplexityTier::Standard),
        Some("complex") => Some(ComplexityTier::Complex),
        Some(other) => return Err(FlowError::Config(format!("Unknown tier: {}", other))),
    };

    for entry in MODEL_REGISTRY.iter().filter(|t| only.map_or(true, |tier| tier == t.tier)) {
        println!("{}", style(entry.tier.as_str()).cyan().bold());
        for model in entry.models {
            println!(
                "  {:<28} {:<10} in {:>12}  out {:>12}  max {}",
                model.model_id,
                model.provider.as_str(),
                format_price(model.cost_per_1m_input),
                format_price(model.cost_per_1m_output),
                model.max_tokens,
            );
        }
    }
    Ok(())
}
