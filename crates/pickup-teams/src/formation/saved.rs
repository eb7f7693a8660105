// Saved formations: the persisted record, the storage contract, and the
// adapter that validates input before it reaches storage.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::color::TeamColor;
use super::error::{FormationError, StorageError};

/// Longest allowed formation name, in characters.
pub const MAX_NAME_LEN: usize = 30;

/// A named, reusable pair of rosters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedFormation {
    pub id: i64,
    pub name: String,
    pub team1_player_ids: Vec<String>,
    pub team2_player_ids: Vec<String>,
    pub team1_color: TeamColor,
    pub team2_color: TeamColor,
    /// Incremented on every load, never on save.
    pub times_used: u32,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A formation about to be saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFormation {
    pub name: String,
    pub team1_player_ids: Vec<String>,
    pub team2_player_ids: Vec<String>,
    pub team1_color: TeamColor,
    pub team2_color: TeamColor,
}

impl NewFormation {
    /// Rosters must be disjoint and free of repeats, colors must differ.
    pub fn validate(&self) -> Result<(), FormationError> {
        validate_name(&self.name)?;

        if self.team1_color == self.team2_color {
            return Err(FormationError::InvalidFormation {
                message: format!("both teams wear {}", self.team1_color),
            });
        }

        let mut seen = HashSet::new();
        for id in self.team1_player_ids.iter().chain(&self.team2_player_ids) {
            if !seen.insert(id.as_str()) {
                return Err(FormationError::InvalidFormation {
                    message: format!("player `{id}` appears more than once"),
                });
            }
        }
        Ok(())
    }
}

/// Key under which formation names must be unique. Folds case across all
/// of Unicode, so "Sábado" and "SÁBADO" clash.
pub fn name_key(name: &str) -> String {
    name.to_lowercase()
}

/// Trim and check a formation name: non-blank, at most 30 characters.
pub fn validate_name(name: &str) -> Result<String, FormationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(FormationError::InvalidName {
            message: "name must not be blank".to_string(),
        });
    }
    let len = trimmed.chars().count();
    if len > MAX_NAME_LEN {
        return Err(FormationError::InvalidName {
            message: format!("name is {len} characters, the limit is {MAX_NAME_LEN}"),
        });
    }
    Ok(trimmed.to_string())
}

/// Operations the core requires of the storage collaborator.
///
/// Names are unique case-insensitively; a clash is reported as
/// [`StorageError::DuplicateName`].
#[async_trait]
pub trait FormationStore: Send + Sync {
    async fn list(&self) -> Result<Vec<SavedFormation>, StorageError>;

    async fn save(
        &self,
        formation: &NewFormation,
        created_at: DateTime<Utc>,
    ) -> Result<SavedFormation, StorageError>;

    /// Fetch a formation, incrementing `times_used` and stamping
    /// `last_used_at` in the same operation.
    async fn load(&self, id: i64, used_at: DateTime<Utc>) -> Result<SavedFormation, StorageError>;

    async fn rename(&self, id: i64, name: &str) -> Result<SavedFormation, StorageError>;

    async fn delete(&self, id: i64) -> Result<(), StorageError>;
}

/// Validating front door to a [`FormationStore`].
pub struct FormationRepository<S> {
    store: S,
}

impl<S: FormationStore> FormationRepository<S> {
    pub fn new(store: S) -> Self {
        FormationRepository { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn list(&self) -> Result<Vec<SavedFormation>, FormationError> {
        Ok(self.store.list().await?)
    }

    pub async fn save(
        &self,
        name: &str,
        team1_player_ids: Vec<String>,
        team2_player_ids: Vec<String>,
        colors: (TeamColor, TeamColor),
    ) -> Result<SavedFormation, FormationError> {
        let formation = NewFormation {
            name: validate_name(name)?,
            team1_player_ids,
            team2_player_ids,
            team1_color: colors.0,
            team2_color: colors.1,
        };
        formation.validate()?;

        let saved = self.store.save(&formation, Utc::now()).await?;
        info!(
            "Saved formation '{}' (id {}, {} vs {} players)",
            saved.name,
            saved.id,
            saved.team1_player_ids.len(),
            saved.team2_player_ids.len()
        );
        Ok(saved)
    }

    pub async fn load(&self, id: i64) -> Result<SavedFormation, FormationError> {
        let formation = self.store.load(id, Utc::now()).await?;
        info!(
            "Loaded formation '{}' (used {} times)",
            formation.name, formation.times_used
        );
        Ok(formation)
    }

    pub async fn rename(&self, id: i64, name: &str) -> Result<SavedFormation, FormationError> {
        let name = validate_name(name)?;
        let formation = self.store.rename(id, &name).await?;
        info!("Renamed formation {} to '{}'", id, formation.name);
        Ok(formation)
    }

    pub async fn delete(&self, id: i64) -> Result<(), FormationError> {
        self.store.delete(id).await?;
        info!("Deleted formation {}", id);
        Ok(())
    }
}
