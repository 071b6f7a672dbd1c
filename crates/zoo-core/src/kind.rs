//! Entity kinds and their table configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use zoo_store::TableConfig;

/// Entity types managed by the admin backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Platform user
    User,
    /// Family grouping users
    Family,
    /// Zoo animal
    Animal,
    /// Personality prompt
    Personality,
    /// Guardrail prompt
    Guardrail,
    /// Live assistant bound to an animal
    Assistant,
    /// Chat conversation
    Conversation,
    /// Time-limited draft assistant
    Sandbox,
}

impl EntityKind {
    /// Every kind, in table order
    pub const ALL: [Self; 8] = [
        Self::User,
        Self::Family,
        Self::Animal,
        Self::Personality,
        Self::Guardrail,
        Self::Assistant,
        Self::Conversation,
        Self::Sandbox,
    ];

    /// Singular name (`user`)
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Family => "family",
            Self::Animal => "animal",
            Self::Personality => "personality",
            Self::Guardrail => "guardrail",
            Self::Assistant => "assistant",
            Self::Conversation => "conversation",
            Self::Sandbox => "sandbox",
        }
    }

    /// Collection path segment (`users`)
    #[must_use]
    pub fn collection(self) -> &'static str {
        match self {
            Self::User => "users",
            Self::Family => "families",
            Self::Animal => "animals",
            Self::Personality => "personalities",
            Self::Guardrail => "guardrails",
            Self::Assistant => "assistants",
            Self::Conversation => "conversations",
            Self::Sandbox => "sandboxes",
        }
    }

    /// Environment variable prefix (`USER`)
    #[must_use]
    pub fn env_prefix(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Family => "FAMILY",
            Self::Animal => "ANIMAL",
            Self::Personality => "PERSONALITY",
            Self::Guardrail => "GUARDRAIL",
            Self::Assistant => "ASSISTANT",
            Self::Conversation => "CONVERSATION",
            Self::Sandbox => "SANDBOX",
        }
    }

    /// Default primary key attribute (`userId`)
    #[must_use]
    pub fn default_primary_key(self) -> &'static str {
        match self {
            Self::User => "userId",
            Self::Family => "familyId",
            Self::Animal => "animalId",
            Self::Personality => "personalityId",
            Self::Guardrail => "guardrailId",
            Self::Assistant => "assistantId",
            Self::Conversation => "conversationId",
            Self::Sandbox => "sandboxId",
        }
    }

    /// Default physical table name (`quest-dev-user`)
    #[must_use]
    pub fn default_table_name(self) -> String {
        format!("quest-dev-{}", self.as_str())
    }

    /// Default table configuration
    #[must_use]
    pub fn default_table(self) -> TableConfig {
        TableConfig::new(self.default_table_name(), self.default_primary_key())
    }

    fn index(self) -> usize {
        match self {
            Self::User => 0,
            Self::Family => 1,
            Self::Animal => 2,
            Self::Personality => 3,
            Self::Guardrail => 4,
            Self::Assistant => 5,
            Self::Conversation => 6,
            Self::Sandbox => 7,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    /// Accepts the singular name or the collection segment, any case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == lowered || k.collection() == lowered)
            .ok_or_else(|| format!("unknown entity type: {s}"))
    }
}

/// Table configuration for every entity kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfigs {
    configs: BTreeMap<EntityKind, TableConfig>,
}

impl TableConfigs {
    /// Built-in defaults (`quest-dev-<entity>`, `<entity>Id`)
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            configs: EntityKind::ALL
                .into_iter()
                .map(|k| (k, k.default_table()))
                .collect(),
        }
    }

    /// Resolve from `<ENTITY>_DYNAMO_*` environment variables
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve using an arbitrary variable lookup
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            configs: EntityKind::ALL
                .into_iter()
                .map(|k| {
                    let config = TableConfig::from_lookup(
                        k.env_prefix(),
                        &k.default_table_name(),
                        k.default_primary_key(),
                        &lookup,
                    );
                    (k, config)
                })
                .collect(),
        }
    }

    /// Replace the configuration of one kind
    #[inline]
    #[must_use]
    pub fn with_table(mut self, kind: EntityKind, config: TableConfig) -> Self {
        self.configs.insert(kind, config);
        self
    }

    /// Configuration of one kind
    #[must_use]
    pub fn get(&self, kind: EntityKind) -> TableConfig {
        self.configs
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| kind.default_table())
    }

    /// Iterate `(kind, config)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (EntityKind, &TableConfig)> {
        self.configs.iter().map(|(k, c)| (*k, c))
    }
}

impl Default for TableConfigs {
    fn default() -> Self {
        Self::defaults()
    }
}

pub(crate) fn slot(kind: EntityKind) -> usize {
    kind.index()
}
