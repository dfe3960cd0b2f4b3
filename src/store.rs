//! Scraper configuration store
//!
//! Four record kinds:
//! - `Scraper` - a named URL linked to one config
//! - `ScraperConfig` - trim input and group width
//! - `RowLabel` - ordered row labels of a config
//! - `ConfigTag` - selectors of a config, in insertion order
//!
//! [`MemoryStore`] keeps everything behind one `RwLock` and can persist to a
//! JSON snapshot file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::engine::ExtractionSpec;
use crate::error::{Entity, StoreError};

pub type Timestamp = DateTime<Utc>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scraper {
    pub scraper_id: u64,
    pub scraper_name: String,
    pub scraping_url: String,
    pub scraper_config_id: u64,
    pub created_on: Timestamp,
    pub last_scraped_on: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScraperConfig {
    pub scraper_config_id: u64,
    pub trim_input: Option<String>,
    pub group_row_count: Option<i64>,
    pub created_on: Timestamp,
    pub last_updated_on: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowLabel {
    pub row_label_id: u64,
    pub scraper_config_id: u64,
    pub row_order: i64,
    pub row_label: String,
    pub created_on: Timestamp,
    pub last_updated_on: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigTag {
    pub tag_id: u64,
    pub scraper_config_id: u64,
    pub tag: String,
    pub created_on: Timestamp,
    pub last_updated_on: Timestamp,
}

/// Replacement values for an existing scraper.
#[derive(Debug, Clone, Default)]
pub struct ScraperUpdate {
    pub scraper_name: String,
    pub scraping_url: String,
    /// Keeps the current config when `None`
    pub scraper_config_id: Option<u64>,
}

/// CRUD over scrapers and their extraction configs.
pub trait ConfigStore {
    fn list_scrapers(&self) -> Result<Vec<Scraper>, StoreError>;
    fn get_scraper(&self, scraper_id: u64) -> Result<Scraper, StoreError>;
    /// Creates an empty config and links the new scraper to it.
    fn create_scraper(&self, name: &str, url: &str) -> Result<Scraper, StoreError>;
    fn update_scraper(&self, scraper_id: u64, update: ScraperUpdate) -> Result<Scraper, StoreError>;
    fn delete_scraper(&self, scraper_id: u64) -> Result<(), StoreError>;

    fn list_configs(&self) -> Result<Vec<ScraperConfig>, StoreError>;
    fn get_config(&self, config_id: u64) -> Result<ScraperConfig, StoreError>;
    fn create_config(
        &self,
        trim_input: Option<String>,
        group_row_count: Option<i64>,
    ) -> Result<ScraperConfig, StoreError>;
    fn update_config(
        &self,
        config_id: u64,
        trim_input: Option<String>,
        group_row_count: Option<i64>,
    ) -> Result<ScraperConfig, StoreError>;
    /// Also removes the config's row labels and tags.
    fn delete_config(&self, config_id: u64) -> Result<(), StoreError>;

    /// Ordered by `row_order`.
    fn list_row_labels(&self, config_id: u64) -> Result<Vec<RowLabel>, StoreError>;
    fn get_row_label(&self, row_label_id: u64) -> Result<RowLabel, StoreError>;
    fn create_row_labels(
        &self,
        config_id: u64,
        row_orders: &[i64],
        row_labels: &[String],
    ) -> Result<Vec<RowLabel>, StoreError>;
    fn update_row_label(
        &self,
        row_label_id: u64,
        row_order: i64,
        row_label: &str,
    ) -> Result<RowLabel, StoreError>;
    fn delete_row_label(&self, row_label_id: u64) -> Result<(), StoreError>;
    /// Returns how many labels were removed.
    fn delete_row_labels(&self, config_id: u64) -> Result<usize, StoreError>;
    /// Swap all labels of a config in one write. Invalid input leaves the
    /// current labels in place.
    fn replace_row_labels(
        &self,
        config_id: u64,
        row_orders: &[i64],
        row_labels: &[String],
    ) -> Result<Vec<RowLabel>, StoreError>;

    /// In insertion order.
    fn list_tags(&self, config_id: u64) -> Result<Vec<ConfigTag>, StoreError>;
    fn get_tag(&self, tag_id: u64) -> Result<ConfigTag, StoreError>;
    fn create_tags(&self, config_id: u64, tags: &[String]) -> Result<Vec<ConfigTag>, StoreError>;
    fn update_tag(&self, tag_id: u64, tag: &str) -> Result<ConfigTag, StoreError>;
    fn delete_tag(&self, tag_id: u64) -> Result<(), StoreError>;
    /// Returns how many tags were removed.
    fn delete_tags(&self, config_id: u64) -> Result<usize, StoreError>;
    fn replace_tags(&self, config_id: u64, tags: &[String]) -> Result<Vec<ConfigTag>, StoreError>;

    /// Resolve a scraper into its extraction spec.
    fn load_spec(&self, scraper_id: u64) -> Result<(Scraper, ExtractionSpec), StoreError> {
        let scraper = self.get_scraper(scraper_id)?;
        let config = self.get_config(scraper.scraper_config_id)?;
        let labels = self.list_row_labels(config.scraper_config_id)?;
        let tags = self.list_tags(config.scraper_config_id)?;

        let spec = ExtractionSpec {
            trim: config.trim_input,
            selectors: tags.into_iter().map(|t| t.tag).collect(),
            labels: labels.into_iter().map(|l| l.row_label).collect(),
            group_width: config.group_row_count,
        };
        Ok((scraper, spec))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct NextIds {
    scraper: u64,
    config: u64,
    row_label: u64,
    tag: u64,
}

fn next_id(counter: &mut u64) -> u64 {
    *counter += 1;
    *counter
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Tables {
    next_ids: NextIds,
    scrapers: BTreeMap<u64, Scraper>,
    configs: BTreeMap<u64, ScraperConfig>,
    row_labels: BTreeMap<u64, RowLabel>,
    tags: BTreeMap<u64, ConfigTag>,
}

impl Tables {
    fn require_config(&self, config_id: u64) -> Result<(), StoreError> {
        if self.configs.contains_key(&config_id) {
            Ok(())
        } else {
            Err(StoreError::not_found(Entity::ScraperConfig, config_id))
        }
    }

    fn insert_config(&mut self, trim_input: Option<String>, group_row_count: Option<i64>) -> ScraperConfig {
        let config = ScraperConfig {
            scraper_config_id: next_id(&mut self.next_ids.config),
            trim_input,
            group_row_count,
            created_on: Utc::now(),
            last_updated_on: None,
        };
        self.configs.insert(config.scraper_config_id, config.clone());
        config
    }

    fn insert_row_labels(&mut self, config_id: u64, row_orders: &[i64], row_labels: &[String]) -> Vec<RowLabel> {
        let now = Utc::now();
        let mut created = Vec::with_capacity(row_labels.len());
        for (&row_order, label) in row_orders.iter().zip(row_labels) {
            let row = RowLabel {
                row_label_id: next_id(&mut self.next_ids.row_label),
                scraper_config_id: config_id,
                row_order,
                row_label: label.clone(),
                created_on: now,
                last_updated_on: now,
            };
            self.row_labels.insert(row.row_label_id, row.clone());
            created.push(row);
        }
        created
    }

    fn insert_tags(&mut self, config_id: u64, tags: &[String]) -> Vec<ConfigTag> {
        let now = Utc::now();
        let mut created = Vec::with_capacity(tags.len());
        for tag in tags {
            let row = ConfigTag {
                tag_id: next_id(&mut self.next_ids.tag),
                scraper_config_id: config_id,
                tag: tag.clone(),
                created_on: now,
                last_updated_on: now,
            };
            self.tags.insert(row.tag_id, row.clone());
            created.push(row);
        }
        created
    }

    fn remove_row_labels(&mut self, config_id: u64) -> usize {
        let before = self.row_labels.len();
        self.row_labels.retain(|_, l| l.scraper_config_id != config_id);
        before - self.row_labels.len()
    }

    fn remove_tags(&mut self, config_id: u64) -> usize {
        let before = self.tags.len();
        self.tags.retain(|_, tag| tag.scraper_config_id != config_id);
        before - self.tags.len()
    }
}

/// In-process store, optionally persisted to a JSON snapshot after every write.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    path: Option<PathBuf>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a snapshot-backed store. A missing file starts empty and is
    /// created on the first write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let tables = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            Tables::default()
        };
        debug!(path = %path.display(), "opened config store");
        Ok(Self {
            tables: RwLock::new(tables),
            path: Some(path),
        })
    }

    /// Write the snapshot (temp file + rename). No-op for unbacked stores.
    pub fn save(&self) -> Result<(), StoreError> {
        let tables = self.tables.read().map_err(|_| StoreError::Poisoned)?;
        self.persist(&tables)
    }

    fn persist(&self, tables: &Tables) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(tables)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&Tables) -> Result<T, StoreError>) -> Result<T, StoreError> {
        let tables = self.tables.read().map_err(|_| StoreError::Poisoned)?;
        f(&tables)
    }

    /// Applies `f` to a copy of the tables; the copy replaces the live
    /// tables only once it has been persisted.
    fn write<T>(&self, f: impl FnOnce(&mut Tables) -> Result<T, StoreError>) -> Result<T, StoreError> {
        let mut tables = self.tables.write().map_err(|_| StoreError::Poisoned)?;
        let mut staged = tables.clone();
        let out = f(&mut staged)?;
        self.persist(&staged)?;
        *tables = staged;
        Ok(out)
    }
}

fn validate_scraper(name: &str, url: &str) -> Result<(), StoreError> {
    if name.trim().is_empty() || url.trim().is_empty() {
        return Err(StoreError::Invalid(
            "scraper_name and scraping_url are required".to_string(),
        ));
    }
    url::Url::parse(url)
        .map_err(|e| StoreError::Invalid(format!("invalid scraping_url {url:?}: {e}")))?;
    Ok(())
}

fn validate_row_labels(row_orders: &[i64], row_labels: &[String]) -> Result<(), StoreError> {
    if row_orders.is_empty() || row_labels.is_empty() {
        return Err(StoreError::Invalid(
            "row_order and row_label are required".to_string(),
        ));
    }
    if row_orders.len() != row_labels.len() {
        return Err(StoreError::Invalid(
            "row_order and row_label must have the same length".to_string(),
        ));
    }
    Ok(())
}

fn validate_tags(tags: &[String]) -> Result<(), StoreError> {
    if tags.is_empty() {
        return Err(StoreError::Invalid("tag is required".to_string()));
    }
    Ok(())
}

impl ConfigStore for MemoryStore {
    fn list_scrapers(&self) -> Result<Vec<Scraper>, StoreError> {
        self.read(|t| Ok(t.scrapers.values().cloned().collect()))
    }

    fn get_scraper(&self, scraper_id: u64) -> Result<Scraper, StoreError> {
        self.read(|t| {
            t.scrapers
                .get(&scraper_id)
                .cloned()
                .ok_or_else(|| StoreError::not_found(Entity::Scraper, scraper_id))
        })
    }

    fn create_scraper(&self, name: &str, url: &str) -> Result<Scraper, StoreError> {
        validate_scraper(name, url)?;
        self.write(|t| {
            let config = t.insert_config(None, None);
            let scraper = Scraper {
                scraper_id: next_id(&mut t.next_ids.scraper),
                scraper_name: name.trim().to_string(),
                scraping_url: url.trim().to_string(),
                scraper_config_id: config.scraper_config_id,
                created_on: config.created_on,
                last_scraped_on: None,
            };
            t.scrapers.insert(scraper.scraper_id, scraper.clone());
            info!(
                scraper_id = scraper.scraper_id,
                scraper_config_id = scraper.scraper_config_id,
                "scraper created"
            );
            Ok(scraper)
        })
    }

    fn update_scraper(&self, scraper_id: u64, update: ScraperUpdate) -> Result<Scraper, StoreError> {
        validate_scraper(&update.scraper_name, &update.scraping_url)?;
        self.write(|t| {
            if let Some(config_id) = update.scraper_config_id {
                t.require_config(config_id)?;
            }
            let scraper = t
                .scrapers
                .get_mut(&scraper_id)
                .ok_or_else(|| StoreError::not_found(Entity::Scraper, scraper_id))?;
            scraper.scraper_name = update.scraper_name.trim().to_string();
            scraper.scraping_url = update.scraping_url.trim().to_string();
            if let Some(config_id) = update.scraper_config_id {
                scraper.scraper_config_id = config_id;
            }
            Ok(scraper.clone())
        })
    }

    fn delete_scraper(&self, scraper_id: u64) -> Result<(), StoreError> {
        self.write(|t| {
            t.scrapers
                .remove(&scraper_id)
                .map(|_| ())
                .ok_or_else(|| StoreError::not_found(Entity::Scraper, scraper_id))
        })
    }

    fn list_configs(&self) -> Result<Vec<ScraperConfig>, StoreError> {
        self.read(|t| Ok(t.configs.values().cloned().collect()))
    }

    fn get_config(&self, config_id: u64) -> Result<ScraperConfig, StoreError> {
        self.read(|t| {
            t.configs
                .get(&config_id)
                .cloned()
                .ok_or_else(|| StoreError::not_found(Entity::ScraperConfig, config_id))
        })
    }

    fn create_config(
        &self,
        trim_input: Option<String>,
        group_row_count: Option<i64>,
    ) -> Result<ScraperConfig, StoreError> {
        self.write(|t| Ok(t.insert_config(trim_input, group_row_count)))
    }

    fn update_config(
        &self,
        config_id: u64,
        trim_input: Option<String>,
        group_row_count: Option<i64>,
    ) -> Result<ScraperConfig, StoreError> {
        self.write(|t| {
            let config = t
                .configs
                .get_mut(&config_id)
                .ok_or_else(|| StoreError::not_found(Entity::ScraperConfig, config_id))?;
            config.trim_input = trim_input;
            config.group_row_count = group_row_count;
            config.last_updated_on = Some(Utc::now());
            Ok(config.clone())
        })
    }

    fn delete_config(&self, config_id: u64) -> Result<(), StoreError> {
        self.write(|t| {
            t.configs
                .remove(&config_id)
                .ok_or_else(|| StoreError::not_found(Entity::ScraperConfig, config_id))?;
            t.row_labels.retain(|_, l| l.scraper_config_id != config_id);
            t.tags.retain(|_, tag| tag.scraper_config_id != config_id);
            Ok(())
        })
    }

    fn list_row_labels(&self, config_id: u64) -> Result<Vec<RowLabel>, StoreError> {
        self.read(|t| {
            let mut labels: Vec<RowLabel> = t
                .row_labels
                .values()
                .filter(|l| l.scraper_config_id == config_id)
                .cloned()
                .collect();
            labels.sort_by_key(|l| (l.row_order, l.row_label_id));
            Ok(labels)
        })
    }

    fn get_row_label(&self, row_label_id: u64) -> Result<RowLabel, StoreError> {
        self.read(|t| {
            t.row_labels
                .get(&row_label_id)
                .cloned()
                .ok_or_else(|| StoreError::not_found(Entity::RowLabel, row_label_id))
        })
    }

    fn create_row_labels(
        &self,
        config_id: u64,
        row_orders: &[i64],
        row_labels: &[String],
    ) -> Result<Vec<RowLabel>, StoreError> {
        validate_row_labels(row_orders, row_labels)?;
        self.write(|t| {
            t.require_config(config_id)?;
            Ok(t.insert_row_labels(config_id, row_orders, row_labels))
        })
    }

    fn update_row_label(
        &self,
        row_label_id: u64,
        row_order: i64,
        row_label: &str,
    ) -> Result<RowLabel, StoreError> {
        self.write(|t| {
            let label = t
                .row_labels
                .get_mut(&row_label_id)
                .ok_or_else(|| StoreError::not_found(Entity::RowLabel, row_label_id))?;
            label.row_order = row_order;
            label.row_label = row_label.to_string();
            label.last_updated_on = Utc::now();
            Ok(label.clone())
        })
    }

    fn delete_row_label(&self, row_label_id: u64) -> Result<(), StoreError> {
        self.write(|t| {
            t.row_labels
                .remove(&row_label_id)
                .map(|_| ())
                .ok_or_else(|| StoreError::not_found(Entity::RowLabel, row_label_id))
        })
    }

    fn delete_row_labels(&self, config_id: u64) -> Result<usize, StoreError> {
        self.write(|t| Ok(t.remove_row_labels(config_id)))
    }

    fn replace_row_labels(
        &self,
        config_id: u64,
        row_orders: &[i64],
        row_labels: &[String],
    ) -> Result<Vec<RowLabel>, StoreError> {
        validate_row_labels(row_orders, row_labels)?;
        self.write(|t| {
            t.require_config(config_id)?;
            let removed = t.remove_row_labels(config_id);
            debug!(config_id, removed, "replacing row labels");
            Ok(t.insert_row_labels(config_id, row_orders, row_labels))
        })
    }

    fn list_tags(&self, config_id: u64) -> Result<Vec<ConfigTag>, StoreError> {
        self.read(|t| {
            Ok(t.tags
                .values()
                .filter(|tag| tag.scraper_config_id == config_id)
                .cloned()
                .collect())
        })
    }

    fn get_tag(&self, tag_id: u64) -> Result<ConfigTag, StoreError> {
        self.read(|t| {
            t.tags
                .get(&tag_id)
                .cloned()
                .ok_or_else(|| StoreError::not_found(Entity::Tag, tag_id))
        })
    }

    fn create_tags(&self, config_id: u64, tags: &[String]) -> Result<Vec<ConfigTag>, StoreError> {
        validate_tags(tags)?;
        self.write(|t| {
            t.require_config(config_id)?;
            Ok(t.insert_tags(config_id, tags))
        })
    }

    fn update_tag(&self, tag_id: u64, tag: &str) -> Result<ConfigTag, StoreError> {
        self.write(|t| {
            let row = t
                .tags
                .get_mut(&tag_id)
                .ok_or_else(|| StoreError::not_found(Entity::Tag, tag_id))?;
            row.tag = tag.to_string();
            row.last_updated_on = Utc::now();
            Ok(row.clone())
        })
    }

    fn delete_tag(&self, tag_id: u64) -> Result<(), StoreError> {
        self.write(|t| {
            t.tags
                .remove(&tag_id)
                .map(|_| ())
                .ok_or_else(|| StoreError::not_found(Entity::Tag, tag_id))
        })
    }

    fn delete_tags(&self, config_id: u64) -> Result<usize, StoreError> {
        self.write(|t| Ok(t.remove_tags(config_id)))
    }

    fn replace_tags(&self, config_id: u64, tags: &[String]) -> Result<Vec<ConfigTag>, StoreError> {
        validate_tags(tags)?;
        self.write(|t| {
            t.require_config(config_id)?;
            let removed = t.remove_tags(config_id);
            debug!(config_id, removed, "replacing tags");
            Ok(t.insert_tags(config_id, tags))
        })
    }
}
