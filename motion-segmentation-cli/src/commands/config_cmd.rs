use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use super::CommandContext;
use crate::config::{self, ConfigSource};
use crate::output;

pub async fn show_config(ctx: &CommandContext) -> Result<()> {
    if ctx.json {
        return output::print_json(&ctx.config);
    }

    println!("Current Configuration ({})", ctx.source);
    println!("────────────────────────────────");
    println!();
    // Landmark indices are map keys, which TOML cannot serialise; JSON can
    println!("{}", serde_json::to_string_pretty(&ctx.config)?);

    Ok(())
}

pub async fn init_config(force: bool) -> Result<()> {
    let config_file = config::config_file()?;

    if config_file.exists() && !force {
        println!(
            "Configuration file already exists at: {}",
            config_file.display()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    config::write_default(&config_file)?;

    println!("✓ Configuration initialized at: {}", config_file.display());
    println!();
    println!("Check it after editing with: motion-seg config validate");

    Ok(())
}

pub async fn validate_config(path: Option<&Path>) -> Result<()> {
    let source = config::resolve(path, config::config_file().ok())?;
    let config = config::load_from(&source)?;

    let params = &config.segmentation_parameters;
    println!("{} {} is valid", "✓".green(), source);
    if source != ConfigSource::Builtin {
        println!("  channels:   {}", params.channels.join(", "));
        println!(
            "  window:     {} (stride {}, {:?})",
            params.sliding_window_scaler, params.stride, params.window_statistic
        );
        println!("  exercises:  {}", config.exercises.len());
    }
    Ok(())
}
