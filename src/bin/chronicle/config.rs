use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use chronicle::config::{read_config, Config};

use crate::CFG_FILE_NAME;

fn get_config_path() -> Option<PathBuf> {
    if let Some(exe_dir) = env::current_exe().ok().and_then(|p| p.parent().map(|d| d.to_path_buf())) {
        if exe_dir.join(CFG_FILE_NAME).exists() {
            return Some(exe_dir.join(CFG_FILE_NAME));
        }
    }

    if let Ok(cur_dir) = env::current_dir() {
        if cur_dir.join(CFG_FILE_NAME).exists() {
            return Some(cur_dir.join(CFG_FILE_NAME));
        }
    }

    let cfg_dir = dirs::config_dir()?;
    if cfg_dir.join(CFG_FILE_NAME).exists() {
        return Some(cfg_dir.join(CFG_FILE_NAME));
    }

    None
}

fn cache_path(parts: &[&str]) -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir().ok_or_else(|| anyhow!("Could not find user cache dir"))?;
    Ok(parts.iter().fold(cache_dir.join("Chronicle"), |path, part| path.join(part)))
}

pub(crate) fn open_config(cfg_path: Option<PathBuf>) -> Result<Config> {
    let config_path = match cfg_path.or_else(get_config_path) {
        Some(path) => path,
        None => return Err(anyhow!("Could not find Chronicle configuration")),
    };

    println!("Reading config from {}", config_path.display());
    let mut config = read_config(&config_path).with_context(|| format!("Invalid configuration {}", config_path.display()))?;

    if let Some(ref mut log) = config.log {
        if log.location.is_none() {
            log.location = Some(cache_path(&["log", "chronicle.log"])?);
        }
        if let Some(ref location) = log.location {
            println!("Log enabled. Files will be written in {}", location.display());
        }
    }

    if let Some(ref mut notify) = config.notify {
        if notify.outbox.is_none() {
            notify.outbox = Some(cache_path(&["outbox", "outbox.log"])?);
        }
        if let Some(ref outbox) = notify.outbox {
            println!("Notifications enabled. Outbox is {}", outbox.display());
        }
    }

    Ok(config)
}
