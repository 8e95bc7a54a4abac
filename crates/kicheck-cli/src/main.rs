mod display;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use kicheck_ai::prompt::{analysis_prompt, pdf_prompt};
use kicheck_core::{FormVariant, Settings, Submission, score};
use kicheck_server::AppState;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kicheck", version, about = "KI-Check scoring, narrative and report service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service.
    Serve(ServeArgs),
    /// Score a submission JSON file and print it as a card.
    Score {
        /// Path to the submission JSON.
        file: PathBuf,
        #[command(flatten)]
        form: FormArgs,
    },
    /// Print the prompt a submission would produce, without calling the model.
    Prompt {
        file: PathBuf,
        #[command(flatten)]
        form: FormArgs,
        /// Print the free-text PDF prompt instead of the JSON analysis prompt.
        #[arg(long)]
        pdf: bool,
    },
}

#[derive(Args)]
struct FormArgs {
    /// Built-in form variant.
    #[arg(long, env = "KICHECK_FORM", default_value = "ki-check")]
    form: String,
    /// Form variant declared as JSON; overrides --form.
    #[arg(long, env = "KICHECK_FORM_FILE")]
    form_file: Option<PathBuf>,
}

impl FormArgs {
    fn resolve(&self) -> anyhow::Result<FormVariant> {
        if let Some(path) = &self.form_file {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading form variant {}", path.display()))?;
            return FormVariant::from_json(&json)
                .with_context(|| format!("parsing form variant {}", path.display()));
        }
        match FormVariant::builtin(&self.form) {
            Some(form) => Ok(form),
            None => bail!(
                "unknown form variant '{}' (available: {})",
                self.form,
                FormVariant::BUILTIN.join(", ")
            ),
        }
    }
}

#[derive(Args)]
struct ServeArgs {
    #[arg(long, env = "KICHECK_BIND", default_value = "0.0.0.0:8000")]
    bind: SocketAddr,
    #[command(flatten)]
    form: FormArgs,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,
    #[arg(long, env = "OPENAI_BASE_URL", default_value = kicheck_core::settings::DEFAULT_OPENAI_BASE_URL)]
    openai_base_url: String,
    #[arg(long, env = "OPENAI_MODEL", default_value = kicheck_core::settings::DEFAULT_OPENAI_MODEL)]
    openai_model: String,
    #[arg(long, env = "OPENAI_MAX_TOKENS", default_value_t = 800)]
    max_tokens: u32,
    #[arg(long, env = "OPENAI_TEMPERATURE", default_value_t = 0.7)]
    temperature: f32,

    #[arg(long, env = "PDFMONKEY_API_KEY", hide_env_values = true)]
    pdfmonkey_api_key: Option<String>,
    #[arg(long, env = "PDFMONKEY_BASE_URL", default_value = kicheck_core::settings::DEFAULT_PDFMONKEY_BASE_URL)]
    pdfmonkey_base_url: String,
    #[arg(long, env = "PDFMONKEY_TEMPLATE_ID")]
    template_id: Option<String>,
    #[arg(long, env = "PDFMONKEY_PREVIEW_TEMPLATE_ID")]
    preview_template_id: Option<String>,

    #[arg(long, env = "MAKE_WEBHOOK_URL")]
    webhook_url: Option<String>,
    /// Timeout for a single webhook delivery, in seconds.
    #[arg(long, env = "MAKE_WEBHOOK_TIMEOUT", default_value_t = 5)]
    webhook_timeout: u64,
}

impl ServeArgs {
    fn settings(&self) -> Settings {
        Settings {
            openai_api_key: self.openai_api_key.clone(),
            openai_base_url: self.openai_base_url.clone(),
            openai_model: self.openai_model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            pdfmonkey_api_key: self.pdfmonkey_api_key.clone(),
            pdfmonkey_base_url: self.pdfmonkey_base_url.clone(),
            template_id: self.template_id.clone(),
            preview_template_id: self.preview_template_id.clone(),
            webhook_url: self.webhook_url.clone(),
            webhook_timeout: Duration::from_secs(self.webhook_timeout),
        }
    }
}

fn read_submission(path: &Path) -> anyhow::Result<Submission> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading submission {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("parsing submission {}", path.display()))?;
    Ok(Submission::from_value(value)?)
}

async fn run_serve(args: ServeArgs) -> anyhow::Result<()> {
    let form = args.form.resolve()?;
    let (state, webhook_task) = AppState::from_settings(args.settings(), form)
        .context("initialising collaborators")?;
    kicheck_server::serve(state, args.bind).await?;
    // Dropping the router closed the queue; let pending deliveries finish.
    if let Some(task) = webhook_task {
        let _ = tokio::time::timeout(Duration::from_secs(10), task).await;
    }
    Ok(())
}

fn run_score(file: &Path, form: &FormArgs) -> anyhow::Result<()> {
    let form = form.resolve()?;
    let submission = read_submission(file)?;
    let result = form.is_scored().then(|| score(&submission, &form.categories));
    display::print_score_card(&submission, &form, result.as_ref());
    Ok(())
}

fn run_prompt(file: &Path, form: &FormArgs, pdf: bool) -> anyhow::Result<()> {
    let form = form.resolve()?;
    let submission = read_submission(file)?;
    let result = form.is_scored().then(|| score(&submission, &form.categories));
    let prompt = if pdf {
        pdf_prompt(&submission, &form, result.as_ref())
    } else {
        analysis_prompt(&submission, &form, result.as_ref())
    };
    println!("{prompt}");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    tracing::info!("kicheck v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    match cli.command {
        Command::Serve(args) => run_serve(args).await,
        Command::Score { file, form } => run_score(&file, &form),
        Command::Prompt { file, form, pdf } => run_prompt(&file, &form, pdf),
    }
}
