//! Records exchanged with the hosted backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewStrategy {
    pub owner_id: String,
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyUpdate {
    pub title: String,
    pub description: Option<String>,
}

/// `{ name }` projection of a joined lookup row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    pub name: String,
}

/// Projection of the strategy an asset belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyRef {
    pub id: String,
    pub title: String,
    pub owner_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub strategy_id: String,
    pub ticker: String,
    pub name: String,
    #[serde(default)]
    pub exchange: Option<String>,
    pub quantity: f64,
    #[serde(default)]
    pub target_id: Option<String>,
    #[serde(default)]
    pub action_id: Option<String>,
    #[serde(default, rename = "targets")]
    pub target: Option<NamedRef>,
    #[serde(default, rename = "actions")]
    pub action: Option<NamedRef>,
    #[serde(default, rename = "strategies")]
    pub strategy: Option<StrategyRef>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAsset {
    pub strategy_id: String,
    pub ticker: String,
    pub name: String,
    pub exchange: String,
    pub quantity: f64,
    pub target_id: String,
    pub action_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetUpdate {
    pub ticker: String,
    pub name: String,
    pub exchange: String,
    pub quantity: f64,
    pub target_id: String,
    pub action_id: Option<String>,
}

/// Admin-managed lookup tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupTable {
    Actions,
    Exchanges,
    Targets,
    Orders,
}

impl LookupTable {
    pub const ALL: [LookupTable; 4] = [
        LookupTable::Actions,
        LookupTable::Exchanges,
        LookupTable::Targets,
        LookupTable::Orders,
    ];

    pub fn table_name(self) -> &'static str {
        match self {
            LookupTable::Actions => "actions",
            LookupTable::Exchanges => "exchanges",
            LookupTable::Targets => "targets",
            LookupTable::Orders => "orders",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub strategy_id: String,
    pub file_name: String,
    pub file_path: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewAttachment {
    pub strategy_id: String,
    pub file_name: String,
    pub file_path: String,
    pub mime_type: Option<String>,
    pub file_size: u64,
}
