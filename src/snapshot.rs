use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::LeagueError;
use crate::model::LeagueData;

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotFile {
    version: u32,
    #[serde(default)]
    saved_at: Option<String>,
    #[serde(flatten)]
    data: LeagueData,
}

/// Decodes a JSON snapshot; any structural problem is reported as invalid input.
pub fn decode_snapshot(raw: &str) -> Result<LeagueData, LeagueError> {
    let file = serde_json::from_str::<SnapshotFile>(raw)
        .map_err(|err| LeagueError::InvalidInput(format!("snapshot: {err}")))?;
    if file.version != SNAPSHOT_VERSION {
        return Err(LeagueError::InvalidInput(format!(
            "snapshot version {} (expected {SNAPSHOT_VERSION})",
            file.version
        )));
    }
    Ok(file.data)
}

pub fn encode_snapshot(data: &LeagueData) -> Result<String> {
    let file = SnapshotFile {
        version: SNAPSHOT_VERSION,
        saved_at: Some(Utc::now().to_rfc3339()),
        data: data.clone(),
    };
    serde_json::to_string_pretty(&file).context("serialize snapshot")
}

pub fn read_snapshot(path: &Path) -> Result<LeagueData> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read snapshot {}", path.display()))?;
    let data = decode_snapshot(&raw).with_context(|| format!("decode {}", path.display()))?;
    info!("read snapshot {}", path.display());
    Ok(data)
}

pub fn write_snapshot(path: &Path, data: &LeagueData) -> Result<()> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let json = encode_snapshot(data)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).context("write snapshot")?;
    fs::rename(&tmp, path).context("swap snapshot")?;
    info!("wrote snapshot {}", path.display());
    Ok(())
}
