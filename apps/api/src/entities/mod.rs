// Entity directory: politicians, parties, promises and bills.
// Reads go through `fetcher` and come back as view models from `transform`;
// writes go through `writes` (direct) or the suggestion queue.

pub mod fetcher;
pub mod filters;
pub mod handlers;
pub mod input;
pub mod options;
pub mod rating;
pub mod tags;
pub mod transform;
pub mod views;
pub mod writes;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// The four entity kinds sharing the tag, vote and suggestion relations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Politician,
    Party,
    Promise,
    Bill,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Politician,
        EntityKind::Party,
        EntityKind::Promise,
        EntityKind::Bill,
    ];

    /// Discriminant stored in `entity_tags`, `votes` and `edit_suggestions`.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Politician => "politician",
            EntityKind::Party => "party",
            EntityKind::Promise => "promise",
            EntityKind::Bill => "bill",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Politician => "politicians",
            EntityKind::Party => "parties",
            EntityKind::Promise => "promises",
            EntityKind::Bill => "bills",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Politician => "Politician",
            EntityKind::Party => "Party",
            EntityKind::Promise => "Promise",
            EntityKind::Bill => "Bill",
        }
    }

    /// Politicians can only be created or edited directly by admins.
    pub fn admin_only_writes(&self) -> bool {
        matches!(self, EntityKind::Politician)
    }

    pub fn not_found(&self, id: impl fmt::Display) -> AppError {
        AppError::NotFound(format!("{} {id} not found", self.label()))
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = AppError;

    /// Accepts both the stored discriminant and the URL segment.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "politician" | "politicians" => Ok(EntityKind::Politician),
            "party" | "parties" => Ok(EntityKind::Party),
            "promise" | "promises" => Ok(EntityKind::Promise),
            "bill" | "bills" => Ok(EntityKind::Bill),
            other => Err(AppError::NotFound(format!("Unknown entity kind '{other}'"))),
        }
    }
}

/// Parses a string-typed entity id as exposed by the view models.
pub fn parse_entity_id(kind: EntityKind, raw: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| kind.not_found(raw))
}
