//! Configuration management commands.

use anyhow::{bail, Result};

use super::{ConfigArgs, ConfigCommand};
use crate::config::generate_default_config;
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Init { city, force } => init_config(&city, force, ctx),
        ConfigCommand::Validate => validate_config(ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match ctx.config_path {
        Some(ref path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(defaults)"),
    }

    let config = &ctx.config;

    ctx.output.info("[backend]");
    ctx.output.kv("kind", &format!("{:?}", config.backend.kind).to_lowercase());
    ctx.output.kv("fixture_path", &config.backend.fixture_path);
    ctx.output
        .kv("fixture_latency_ms", &config.backend.fixture_latency_ms.to_string());
    if let Some(ref url) = config.backend.base_url {
        ctx.output.kv("base_url", url);
    }

    ctx.output.info("[search]");
    ctx.output
        .kv("search_timeout_ms", &config.search.search_timeout_ms.to_string());
    ctx.output
        .kv("facets_timeout_ms", &config.search.facets_timeout_ms.to_string());
    ctx.output
        .kv("cancel_superseded", &config.search.cancel_superseded.to_string());
    ctx.output.kv("default_sort", &config.search.default_sort);

    ctx.output.info("[defaults]");
    ctx.output
        .kv("city", config.defaults.city.as_deref().unwrap_or("(none)"));
    ctx.output.kv("currency", config.defaults.currency.code());

    ctx.output.info("[logging]");
    ctx.output.kv("level", &config.logging.level);

    if !config.environments.is_empty() {
        ctx.output.info("Environments:");
        let mut names: Vec<&String> = config.environments.keys().collect();
        names.sort();
        for env in names {
            ctx.output.list_item(env);
        }
    }

    Ok(())
}

fn init_config(city: &str, force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join("slicefinder.toml");

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(&config_path, generate_default_config(city))?;
    ctx.output.success(&format!("Created: {}", config_path.display()));

    Ok(())
}

fn validate_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Validating configuration");

    let (errors, warnings) = ctx.config.check();

    if errors.is_empty() && warnings.is_empty() {
        ctx.output.success("Configuration is valid");
        return Ok(());
    }

    for error in &errors {
        ctx.output.error(&format!("Error: {}", error));
    }

    for warning in &warnings {
        ctx.output.warn(&format!("Warning: {}", warning));
    }

    if !errors.is_empty() {
        bail!("Configuration has {} error(s)", errors.len());
    }

    ctx.output.success("Configuration is valid (with warnings)");

    Ok(())
}
