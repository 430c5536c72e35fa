use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

use crate::config::EngineConfig;
use crate::error::{ConfigError, SummaryError};
use crate::models::RideSummary;

/// JSON med sti til feltet som feilet: (sti, melding).
fn parse_json<T: DeserializeOwned>(contents: &str) -> Result<T, (String, String)> {
    let mut de = serde_json::Deserializer::from_str(contents);
    serde_path_to_error::deserialize(&mut de).map_err(|e| (e.path().to_string(), e.inner().to_string()))
}

fn write_pretty<T, E>(value: &T, path: &Path) -> Result<(), E>
where
    T: Serialize,
    E: From<std::io::Error> + From<serde_json::Error>,
{
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Leser motor-konfig fra disk (JSON).
/// Hvis filen ikke finnes, returneres standardverdiene.
pub fn load_config(path: impl AsRef<Path>) -> Result<EngineConfig, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        warn!("fant ikke konfig på {}, bruker standardverdier", path.display());
        return Ok(EngineConfig::default());
    }
    let contents = std::fs::read_to_string(path)?;
    let cfg: EngineConfig =
        parse_json(&contents).map_err(|(path, message)| ConfigError::Parse { path, message })?;
    cfg.validate()?;
    info!("konfig lastet fra {} (auto-stopp {} ms)", path.display(), cfg.auto_stop_delay_ms);
    Ok(cfg)
}

/// Lagrer konfig som JSON (pretty-print).
pub fn save_config(cfg: &EngineConfig, path: impl AsRef<Path>) -> Result<(), ConfigError> {
    let path = path.as_ref();
    write_pretty::<_, ConfigError>(cfg, path)?;
    info!("konfig lagret til {}", path.display());
    Ok(())
}

pub fn save_summary(summary: &RideSummary, path: impl AsRef<Path>) -> Result<(), SummaryError> {
    let path = path.as_ref();
    write_pretty::<_, SummaryError>(summary, path)?;
    info!("tur {} lagret til {}", summary.ride_id, path.display());
    Ok(())
}

pub fn load_summary(path: impl AsRef<Path>) -> Result<RideSummary, SummaryError> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    parse_json(&contents).map_err(|(path, message)| SummaryError::Parse { path, message })
}
