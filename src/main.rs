use anyhow::{Context, Result, bail};
use autoevaluator::logger::{self, DEFAULT_LOG_FILE, LogTarget};
use autoevaluator::{
    AwsCredentials, EvalMethod, EvalPair, ProviderConfig, ProviderKind, build_client, csv,
    evaluate_batch, evaluate_with, report, text_simplifier,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "autoevaluator",
    version,
    about = "Sentence-level precision/recall/F1 of a claim against a ground truth"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,

    /// bedrock, openai, anthropic, gemini or openrouter
    #[arg(long, global = true, default_value = "openai", env = "AUTOEVAL_PROVIDER")]
    provider: ProviderKind,
    /// Model name; defaults to the provider's default model
    #[arg(long, global = true)]
    model: Option<String>,
    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,
    #[arg(long, global = true, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    anthropic_api_key: Option<String>,
    #[arg(long, global = true, env = "GOOGLE_API_KEY", hide_env_values = true)]
    google_api_key: Option<String>,
    #[arg(long, global = true, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    openrouter_api_key: Option<String>,
    #[arg(long, global = true, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    aws_access_key_id: Option<String>,
    #[arg(long, global = true, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    aws_secret_access_key: Option<String>,
    #[arg(long, global = true, env = "AWS_SESSION_TOKEN", hide_env_values = true)]
    aws_session_token: Option<String>,
    #[arg(long, global = true, env = "AWS_REGION", default_value = "ap-southeast-1")]
    aws_region: String,
    /// Override the provider endpoint
    #[arg(long, global = true)]
    base_url: Option<String>,
    #[arg(long, global = true, default_value_t = 0.0)]
    temperature: f32,
    #[arg(long, global = true, default_value_t = 4096)]
    max_tokens: u32,
    #[arg(long, global = true, default_value_t = 120)]
    timeout_secs: u64,
    /// Append logs to this file instead of stderr (`--log-file=PATH`)
    #[arg(
        long,
        global = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = DEFAULT_LOG_FILE
    )]
    log_file: Option<PathBuf>,
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Method {
    /// Question generation and bidirectional verification per sentence
    Questions,
    /// One completion labels the sentences directly
    Direct,
}

impl From<Method> for EvalMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Questions => EvalMethod::Questions,
            Method::Direct => EvalMethod::Direct,
        }
    }
}

#[derive(Subcommand)]
enum Cmd {
    /// Score one claim against one ground truth
    Eval {
        #[arg(long)]
        claim: String,
        #[arg(long)]
        ground_truth: String,
        #[arg(long, value_enum, default_value = "questions")]
        method: Method,
    },
    /// Split a text into simplified sentences
    Simplify {
        #[arg(long)]
        text: String,
    },
    /// Score every row of a claim,ground_truth CSV file
    Batch {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "autoevaluator_report.jsonl")]
        output: PathBuf,
        #[arg(long, default_value_t = 4)]
        concurrency: usize,
        #[arg(long, value_enum, default_value = "questions")]
        method: Method,
    },
}

impl Cli {
    fn provider_config(&self) -> ProviderConfig {
        let api_key = match self.provider {
            ProviderKind::OpenAi => self.openai_api_key.clone(),
            ProviderKind::Anthropic => self.anthropic_api_key.clone(),
            ProviderKind::Gemini => self.google_api_key.clone(),
            ProviderKind::OpenRouter => self.openrouter_api_key.clone(),
            ProviderKind::Bedrock => None,
        };

        let mut config = ProviderConfig::new(self.provider)
            .with_region(self.aws_region.clone())
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
            .with_timeout(Duration::from_secs(self.timeout_secs));
        config.model = self.model.clone();
        config.api_key = api_key;
        config.base_url = self.base_url.clone();

        if let (Some(access_key_id), Some(secret_access_key)) =
            (&self.aws_access_key_id, &self.aws_secret_access_key)
        {
            config = config.with_aws_credentials(AwsCredentials {
                access_key_id: access_key_id.clone(),
                secret_access_key: secret_access_key.clone(),
                session_token: self.aws_session_token.clone(),
            });
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let target = match &cli.log_file {
        Some(path) => LogTarget::File(path.clone()),
        None => LogTarget::Stderr,
    };
    logger::init(target, cli.verbose).context("failed to initialise logging")?;

    let config = cli.provider_config();
    let client = build_client(&config)?;
    let model = config.model_or_default();

    match cli.cmd {
        Cmd::Eval {
            claim,
            ground_truth,
            method,
        } => {
            let pair = EvalPair::new(claim, ground_truth);
            let result = evaluate_with(method.into(), &pair, client.as_ref(), &model).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Cmd::Simplify { text } => {
            let sentences = text_simplifier(&text, &model, client.as_ref()).await?;
            println!("{}", serde_json::to_string_pretty(&sentences)?);
        }
        Cmd::Batch {
            input,
            output,
            concurrency,
            method,
        } => {
            let pairs = csv::load_pairs(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            if pairs.is_empty() {
                bail!("no claim,ground_truth rows found in {}", input.display());
            }

            let results =
                evaluate_batch(&pairs, method.into(), client.as_ref(), &model, concurrency).await;
            let summary = report::write_report(&output, &pairs, &results)
                .with_context(|| format!("failed to write {}", output.display()))?;

            println!("{}", summary);
            println!("report written to {}", output.display());
        }
    }

    Ok(())
}
