use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "agentflow", version, long_version = super::LONG_VERSION, about = "Compile and run declarative multi-agent LLM pipelines")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute a pipeline design
    Run(RunArgs),
    /// Compile a design and print its topology without calling any provider
    Validate(ValidateArgs),
    /// List the model registry by complexity tier
    Models(ModelsArgs),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Args, Clone)]
pub struct RunArgs {
    /// Design file (.json, .yaml or .yml)
    pub design: String,

    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Upper bound on executed steps
    #[arg(long)]
    pub max_steps: Option<u32>,

    /// Run timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Only use this provider: anthropic, openai, google
    #[arg(long)]
    pub provider: Option<String>,

    /// Result format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

#[derive(Args, Clone)]
pub struct ValidateArgs {
    /// Design file (.json, .yaml or .yml)
    pub design: String,
}

#[derive(Args, Clone)]
pub struct ModelsArgs {
    /// Only show one tier: simple, standard, complex
    #[arg(long)]
    pub tier: Option<String>,
}
