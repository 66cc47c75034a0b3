use super::{mask_string, Env};
use crate::output::{Output, OutputFormat};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use media_shelf_config::{Config, PathManager};
use owo_colors::OwoColorize;
use serde_json::json;
use std::path::Path;

pub fn run_config(cmd: crate::ConfigCommands, env: &Env, output: &Output) -> Result<()> {
    match cmd {
        crate::ConfigCommands::Show { full } => show_config(full, env, output),
        crate::ConfigCommands::Init { force } => init_config(force, env, output),
    }
}

fn show_config(full: bool, env: &Env, output: &Output) -> Result<()> {
    let config = &env.config;
    let firestore = config.gateway.firestore.as_ref();
    let api_key = firestore.map(|f| if full { f.api_key.clone() } else { mask_string(&f.api_key) });
    let backend = format!("{:?}", config.gateway.backend).to_lowercase();
    let policy = format!("{:?}", config.identity.match_policy).to_lowercase();

    match output.format() {
        OutputFormat::Human => {
            if !env.config_path.exists() {
                output.warn(format!(
                    "No configuration file at {}; showing defaults. Run 'shelf config init' to create one.",
                    env.config_path.display()
                ));
            }

            let mut table = Table::new();
            table.set_header(vec![
                Cell::new("Setting").fg(comfy_table::Color::Cyan).add_attribute(comfy_table::Attribute::Bold),
                Cell::new("Value").fg(comfy_table::Color::Cyan).add_attribute(comfy_table::Attribute::Bold),
            ]);
            table.add_row(vec![Cell::new("Config file"), Cell::new(env.config_path.display().to_string())]);
            table.add_row(vec![Cell::new("Backend"), Cell::new(&backend)]);
            let data_dir = config
                .gateway
                .data_dir
                .clone()
                .unwrap_or_else(|| env.paths.collections_dir());
            table.add_row(vec![Cell::new("Data directory"), Cell::new(data_dir.display().to_string())]);
            if let Some(f) = firestore {
                table.add_row(vec![Cell::new("Firestore project"), Cell::new(&f.project_id)]);
                table.add_row(vec![Cell::new("Firestore database"), Cell::new(&f.database)]);
                table.add_row(vec![Cell::new("API key"), Cell::new(api_key.clone().unwrap_or_default())]);
                table.add_row(vec![Cell::new("Timeout"), Cell::new(format!("{}s", f.timeout_secs))]);
            }
            table.add_row(vec![Cell::new("Favorites collection"), Cell::new(&config.collections.favorites)]);
            table.add_row(vec![
                Cell::new("Recently viewed collection"),
                Cell::new(&config.collections.recently_watched),
            ]);
            table.add_row(vec![Cell::new("Match policy"), Cell::new(&policy)]);
            table.add_row(vec![Cell::new("Log level"), Cell::new(&config.logging.level)]);
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
            println!("{}", table);

            if let Err(e) = config.validate() {
                println!("{} {}", "Invalid:".red().bold(), e);
            }
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({
                "type": "config",
                "path": env.config_path.display().to_string(),
                "exists": env.config_path.exists(),
                "valid": config.validate().is_ok(),
                "gateway": {
                    "backend": backend,
                    "data_dir": config.gateway.data_dir.as_ref().map(|p| p.display().to_string()),
                    "firestore": firestore.map(|f| json!({
                        "project_id": f.project_id,
                        "database": f.database,
                        "api_key": api_key,
                        "timeout_secs": f.timeout_secs,
                    })),
                },
                "collections": {
                    "favorites": config.collections.favorites,
                    "recently_watched": config.collections.recently_watched,
                },
                "identity": { "match_policy": policy },
                "logging": {
                    "level": config.logging.level,
                    "json": config.logging.json,
                    "file": config.logging.file.as_ref().map(|p| p.display().to_string()),
                },
            }));
        }
    }
    Ok(())
}

fn init_config(force: bool, env: &Env, output: &Output) -> Result<()> {
    if write_default_config(&env.paths, &env.config_path, force)? {
        output.success(format!("Wrote default configuration to {}", env.config_path.display()));
    } else {
        output.warn(format!(
            "Configuration already exists at {} (use --force to overwrite)",
            env.config_path.display()
        ));
    }
    Ok(())
}

/// Create the config, data and log directories and write a default config.
/// Returns false if a config exists and `force` is not set.
fn write_default_config(paths: &PathManager, config_path: &Path, force: bool) -> Result<bool> {
    paths
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create directories under {}: {}", paths.config_dir().display(), e))?;

    if config_path.exists() && !force {
        return Ok(false);
    }

    Config::default()
        .save_to_file(config_path)
        .map_err(|e| eyre!("Failed to write config to {}: {}", config_path.display(), e))?;
    Ok(true)
}
