// src/cli/init.rs — First-time setup

use std::path::Path;

use crate::infra::config::Config;
use crate::infra::paths;
use crate::memory::MemoryManager;

/// Write the default config, create the database, and report credentials.
pub async fn run_init(force: bool) -> anyhow::Result<()> {
    println!("ragnosis setup");
    println!();

    let config_path = paths::config_file_path();
    eprint!("  Writing {}... ", config_path.display());
    if write_default_config(&config_path, force)? {
        eprintln!("done");
    } else {
        eprintln!("exists (use --force to overwrite)");
    }

    let db_path = paths::db_path();
    eprint!("  Initializing database... ");
    MemoryManager::open(&db_path)?;
    eprintln!("{}", db_path.display());

    println!();
    for (env_var, purpose) in [
        ("TELEGRAM_BOT_TOKEN", "Telegram bot token"),
        ("GEMINI_API_KEY", "Gemini API key (or GOOGLE_API_KEY)"),
    ] {
        let found = std::env::var(env_var).is_ok()
            || (env_var == "GEMINI_API_KEY" && std::env::var("GOOGLE_API_KEY").is_ok());
        let mark = if found { "found" } else { "missing" };
        println!("  {purpose}: {mark}");
    }

    println!();
    println!("Setup complete!");
    println!();
    println!("Tips:");
    println!("  ragnosis serve        Run the Telegram bot");
    println!("  ragnosis chat         Try the dialogue in the terminal");
    println!("  ragnosis stats        Show usage analytics");

    Ok(())
}

/// Returns `false` when a config already exists and `force` is off.
fn write_default_config(path: &Path, force: bool) -> anyhow::Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, Config::default().to_toml_string()?)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_default_config_respects_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        assert!(write_default_config(&path, false).unwrap());
        let written = Config::load_from(&path).unwrap();
        assert_eq!(written.bot.name, "RAGnosis");

        std::fs::write(&path, "[bot]\nname = \"Mine\"\n").unwrap();
        assert!(!write_default_config(&path, false).unwrap());
        assert_eq!(Config::load_from(&path).unwrap().bot.name, "Mine");

        assert!(write_default_config(&path, true).unwrap());
        assert_eq!(Config::load_from(&path).unwrap().bot.name, "RAGnosis");
    }
}
