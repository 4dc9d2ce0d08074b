use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use crate::error::ReconError;
use crate::identifier::Scope;
use crate::product::ProductRules;
use crate::rarity::RarityTable;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReconConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// Provider order. Used both for the primary comparison pair and for
    /// per-field precedence when merging.
    pub providers: Vec<String>,
    #[serde(default)]
    pub scope: Scope,
    #[serde(default)]
    pub rarity: RarityTable,
    #[serde(default)]
    pub products: ProductRules,
    #[serde(default)]
    pub flag: FlagConfig,
    #[serde(default)]
    pub sources: BTreeMap<String, SourceConfig>,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_name() -> String {
    "card reconciliation".into()
}

// ---------------------------------------------------------------------------
// Flagging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct FlagConfig {
    /// Provider whose absence on a high-value card gets the card flagged.
    #[serde(default)]
    pub missing_provider: Option<String>,
    #[serde(default = "default_high_value")]
    pub high_value_rarities: BTreeSet<String>,
}

fn default_high_value() -> BTreeSet<String> {
    ["enchanted", "super_rare", "legendary"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for FlagConfig {
    fn default() -> Self {
        Self {
            missing_provider: None,
            high_value_rarities: default_high_value(),
        }
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Where a provider's export lives and how to read it.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub file: String,
    #[serde(default)]
    pub format: SourceFormat,
    /// JSON pointer to the collection inside a larger document, e.g. `/cards`.
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default)]
    pub fields: FieldMapping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    /// Object keyed by identifier.
    #[default]
    JsonMap,
    /// Array of objects, each carrying its identifier.
    JsonArray,
    Csv,
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::JsonMap => write!(f, "json_map"),
            Self::JsonArray => write!(f, "json_array"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

/// Source key for each logical field.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FieldMapping {
    pub identifier: String,
    pub name: String,
    pub title: String,
    pub rarity: String,
    pub set_code: String,
    pub market_price: String,
    pub low_price: String,
    pub currency: String,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            identifier: "identifier".into(),
            name: "name".into(),
            title: "title".into(),
            rarity: "rarity".into(),
            set_code: "set_code".into(),
            market_price: "market_price".into(),
            low_price: "low_price".into(),
            currency: "currency".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub dir: Option<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    /// Config with defaults for everything but the provider order.
    pub fn new<I, S>(providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: default_name(),
            providers: providers.into_iter().map(Into::into).collect(),
            scope: Scope::All,
            rarity: RarityTable::default(),
            products: ProductRules::default(),
            flag: FlagConfig::default(),
            sources: BTreeMap::new(),
            output: OutputConfig::default(),
        }
        .prepared()
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_flag_provider(mut self, provider: impl Into<String>) -> Self {
        self.flag.missing_provider = Some(provider.into());
        self
    }

    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        let config = config.prepared();
        config.validate()?;
        Ok(config)
    }

    /// Bring rarity tokens into canonical form so comparisons in the engine
    /// are plain set lookups.
    fn prepared(mut self) -> Self {
        self.rarity = self.rarity.prepared();
        let rarity = &self.rarity;
        self.flag.high_value_rarities = self
            .flag
            .high_value_rarities
            .iter()
            .filter_map(|r| rarity.normalize(Some(r)))
            .collect();
        self
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.providers.is_empty() {
            return Err(ReconError::ConfigValidation(
                "at least one provider is required".into(),
            ));
        }

        let mut seen = BTreeSet::new();
        for provider in &self.providers {
            if provider.trim().is_empty() {
                return Err(ReconError::ConfigValidation("provider names must not be blank".into()));
            }
            if !seen.insert(provider.as_str()) {
                return Err(ReconError::ConfigValidation(format!(
                    "provider '{provider}' listed more than once"
                )));
            }
        }

        if let Some(ref watched) = self.flag.missing_provider {
            if !seen.contains(watched.as_str()) {
                return Err(ReconError::ConfigValidation(format!(
                    "flag.missing_provider '{watched}' is not in providers"
                )));
            }
        }

        for (name, source) in &self.sources {
            if !seen.contains(name.as_str()) {
                return Err(ReconError::ConfigValidation(format!(
                    "source '{name}' is not in providers"
                )));
            }
            if source.file.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "source '{name}': file must not be empty"
                )));
            }
            if source.format == SourceFormat::Csv && source.root.is_some() {
                return Err(ReconError::ConfigValidation(format!(
                    "source '{name}': root only applies to JSON sources"
                )));
            }
        }

        for (raw, canonical) in &self.rarity.substitutions {
            if raw.is_empty() || canonical.is_empty() {
                return Err(ReconError::ConfigValidation(
                    "rarity substitutions must not contain blank tokens".into(),
                ));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
