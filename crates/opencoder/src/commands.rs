//! OpenCoder command implementations

use std::io::Write;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::warn;

use opencoder_agent::{GraphDriver, ModelHandle, ToolRegistry};
use opencoder_agent::tools::register_default_tools;
use opencoder_config::{self as config, Config};
use opencoder_memory::MemoryStore;
use opencoder_provider::{AnthropicProvider, OllamaProvider, OpenAiProvider, Provider};

/// Flags shared by the chat and task commands
pub struct RunOptions {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
}

fn build_provider(config: &Config, name: &str) -> Result<Arc<dyn Provider>> {
    let section = config
        .provider(name)
        .with_context(|| format!("unknown provider '{name}'"))?;

    let provider: Arc<dyn Provider> = match name {
        "openai" => Arc::new(OpenAiProvider::new(
            section.api_key.clone(),
            section.api_base.clone(),
            section.model.clone(),
        )),
        "anthropic" => Arc::new(AnthropicProvider::new(
            section.api_key.clone(),
            section.api_base.clone(),
            section.model.clone(),
        )),
        "ollama" => Arc::new(OllamaProvider::new(
            section.api_base.clone(),
            section.model.clone(),
        )),
        other => bail!("unknown provider '{other}'"),
    };
    Ok(provider)
}

/// Assemble a driver and the shared memory store from config and flags
async fn build_driver(options: &RunOptions) -> Result<(GraphDriver, MemoryStore)> {
    let mut config = Config::load().await.context("loading config")?;
    config.apply_env();

    let provider_name = options
        .provider
        .clone()
        .unwrap_or_else(|| config.defaults.provider.clone());
    let provider = build_provider(&config, &provider_name)?;

    if !provider.is_configured() {
        bail!(
            "provider '{}' has no api key; set it in {} or the environment",
            provider_name,
            config::config_path().display()
        );
    }

    let model = options
        .model
        .clone()
        .or_else(|| {
            config
                .provider(&provider_name)
                .and_then(|p| p.model.clone())
        })
        .unwrap_or_else(|| config.defaults.model.clone());
    let temperature = options.temperature.unwrap_or(config.defaults.temperature);

    let memory = MemoryStore::new();
    memory
        .load(&config::memory_path())
        .await
        .context("loading memory store")?;

    let workspace = std::env::current_dir().context("resolving working directory")?;
    let mut tools = ToolRegistry::new();
    register_default_tools(
        &mut tools,
        &workspace,
        memory.clone(),
        Arc::clone(&provider),
        model.clone(),
    );

    let handle = ModelHandle::new(provider, model, config.defaults.max_tokens, temperature);
    let driver = GraphDriver::new(handle, tools)
        .with_max_followup_rounds(config.defaults.max_followup_rounds);

    Ok((driver, memory))
}

/// Run one request and print the final answer
async fn run_once(driver: &GraphDriver, memory: &MemoryStore, input: &str) -> Result<()> {
    let ctx = driver.run(input).await.context("processing request")?;

    match ctx.final_answer() {
        Some(answer) => println!("{answer}"),
        None => println!("No response"),
    }

    // Remembered facts survive the session
    if let Err(e) = memory.save(&config::memory_path()).await {
        warn!("failed to save memory store: {e}");
    }
    Ok(())
}

/// Interactive session: one request per line until exit
pub async fn chat_command(options: RunOptions) -> Result<()> {
    let (driver, memory) = build_driver(&options).await?;

    println!("OpenCoder interactive session. Type 'exit' or 'quit' to leave.");
    println!(
        "Working directory: {}",
        std::env::current_dir()
            .map(|d| d.display().to_string())
            .unwrap_or_else(|_| "?".to_string())
    );

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let mut line = String::new();
        if stdin.read_line(&mut line).context("reading input")? == 0 {
            break; // EOF
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        if let Err(e) = run_once(&driver, &memory, line).await {
            eprintln!("Error: {e:#}");
        }
    }

    println!("Goodbye.");
    Ok(())
}

/// One-shot task
pub async fn task_command(prompt: String, options: RunOptions) -> Result<()> {
    let (driver, memory) = build_driver(&options).await?;
    run_once(&driver, &memory, &prompt).await
}

/// Write a default config file if none exists
pub async fn init_command() -> Result<()> {
    let path = config::config_path();
    if path.exists() {
        println!("Config already exists at {}", path.display());
        return Ok(());
    }

    Config::default().save().await.context("writing config")?;
    config::paths::ensure_dir(&config::workspace_path())
        .await
        .context("creating workspace")?;

    println!("Wrote default config to {}", path.display());
    println!("Add an api key there or export OPENAI_API_KEY / ANTHROPIC_API_KEY.");
    Ok(())
}

/// Show configured providers and settings
pub async fn status_command() -> Result<()> {
    let mut config = Config::load().await.context("loading config")?;
    config.apply_env();

    let memory = MemoryStore::new();
    memory.load(&config::memory_path()).await.ok();

    println!("OpenCoder status");
    println!("  Default provider: {}", config.defaults.provider);
    println!("  Default model:    {}", config.defaults.model);
    println!("  Language:         {}", config.defaults.language);
    println!("  Memory entries:   {}", memory.len().await);
    println!("Providers:");
    for name in ["openai", "anthropic", "ollama"] {
        let section = config.provider(name).expect("known provider");
        let configured = match name {
            "ollama" => "local".to_string(),
            _ if section.api_key.is_empty() => "[no key]".to_string(),
            _ => "[key set]".to_string(),
        };
        println!("  {name}: {configured}");
    }
    Ok(())
}
