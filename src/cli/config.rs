use crate::config::generate::generate_starter_config;
use std::fs;
use std::path::PathBuf;

pub fn init(stdout: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_content = generate_starter_config();

    if stdout {
        print!("{}", config_content);
        return Ok(());
    }

    let config_path = dirs::home_dir()
        .map(|home| home.join(".config/logtrain/config.yml"))
        .unwrap_or_else(|| PathBuf::from("/etc/logtrain/config.yml"));

    if config_path.exists() {
        return Err(format!(
            "config file already exists at {}; remove it first or use --stdout",
            config_path.display()
        )
        .into());
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(&config_path, config_content)?;

    println!("Config file written to {}", config_path.display());
    Ok(())
}

pub fn validate(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let result = match &config_path {
        Some(path) => {
            println!("Validating config file: {}", path.display());
            crate::config::load_config(path)
        }
        None => {
            println!("No config file found, validating environment variables");
            crate::config::load_config_from_env()
        }
    };

    match result {
        Ok(_) => {
            println!("✓ Config is valid");
            Ok(())
        }
        Err(e) => Err(format!("config validation failed:\n{}", e).into()),
    }
}
