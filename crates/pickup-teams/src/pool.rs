// Player pool import from an attendance CSV export.
//
// Columns: id, name, position, rating, photo_url (optional). Extra columns
// are ignored.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::formation::player::{clamp_rating, DraftPlayer, Position};

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },
}

#[derive(Debug, Deserialize)]
struct RawPlayer {
    id: String,
    name: String,
    #[serde(alias = "pos")]
    position: String,
    #[serde(alias = "overall_rating")]
    rating: f64,
    #[serde(default)]
    photo_url: Option<String>,
}

/// Rows that fail to parse, have an unknown position, a non-finite rating,
/// a blank id or a repeated id are skipped with a warning.
fn load_pool_from_reader<R: Read>(rdr: R) -> Result<Vec<DraftPlayer>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    let mut seen = HashSet::new();
    let mut players = Vec::new();

    for result in reader.deserialize::<RawPlayer>() {
        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                warn!("skipping malformed player row: {}", e);
                continue;
            }
        };

        if raw.id.is_empty() {
            warn!("skipping player '{}': blank id", raw.name);
            continue;
        }
        let Some(position) = Position::from_str_pos(&raw.position) else {
            warn!("skipping player '{}': unknown position '{}'", raw.name, raw.position);
            continue;
        };
        if !raw.rating.is_finite() {
            warn!("skipping player '{}': non-finite rating", raw.name);
            continue;
        }
        if !seen.insert(raw.id.clone()) {
            warn!("duplicate player id '{}', keeping the first row", raw.id);
            continue;
        }

        let rating = clamp_rating(raw.rating);
        if rating != raw.rating {
            warn!(
                "player '{}': rating {} clamped to {}",
                raw.name, raw.rating, rating
            );
        }

        let mut player = DraftPlayer::new(&raw.id, &raw.name, position, rating);
        if let Some(url) = raw.photo_url.filter(|u| !u.is_empty()) {
            player = player.with_photo(&url);
        }
        players.push(player);
    }
    Ok(players)
}

/// Load the signed-up players from a CSV file.
pub fn load_pool(path: &Path) -> Result<Vec<DraftPlayer>, PoolError> {
    let file = std::fs::File::open(path).map_err(|e| PoolError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_pool_from_reader(file).map_err(|e| PoolError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}
