use crate::adapters::memory::{upsert, InMemoryStore};
use crate::domain::model::{Address, Pharmacy, PharmacyId, SearchHit};
use crate::domain::ports::PharmacyStore;
use crate::domain::query::{Filter, Stage};
use crate::utils::error::{StoreError, StoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Json,
    Csv,
}

impl DatasetFormat {
    pub fn from_path(path: &Path) -> StoreResult<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("csv") => Ok(Self::Csv),
            _ => Err(StoreError::UnsupportedFormat {
                path: path.display().to_string(),
            }),
        }
    }
}

/// Flat CSV layout. Services are `;`-separated; blank flag cells read as
/// `false`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CsvRow {
    id: String,
    name: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    is_on_gard: Option<bool>,
    #[serde(default)]
    is_on_duty: Option<bool>,
    #[serde(default)]
    street: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    services: String,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl From<CsvRow> for Pharmacy {
    fn from(row: CsvRow) -> Self {
        Self {
            id: PharmacyId(row.id),
            name: row.name,
            latitude: row.latitude,
            longitude: row.longitude,
            is_on_gard: row.is_on_gard.unwrap_or(false),
            is_on_duty: row.is_on_duty.unwrap_or(false),
            address: Address {
                street: row.street,
                city: row.city,
            },
            services: row
                .services
                .split(';')
                .map(str::trim)
                .filter(|service| !service.is_empty())
                .map(str::to_string)
                .collect(),
            updated_at: row.updated_at,
        }
    }
}

impl From<&Pharmacy> for CsvRow {
    fn from(pharmacy: &Pharmacy) -> Self {
        Self {
            id: pharmacy.id.0.clone(),
            name: pharmacy.name.clone(),
            latitude: pharmacy.latitude,
            longitude: pharmacy.longitude,
            is_on_gard: Some(pharmacy.is_on_gard),
            is_on_duty: Some(pharmacy.is_on_duty),
            street: pharmacy.address.street.clone(),
            city: pharmacy.address.city.clone(),
            services: pharmacy.services.join(";"),
            updated_at: pharmacy.updated_at,
        }
    }
}

pub fn parse_dataset(data: &[u8], format: DatasetFormat) -> StoreResult<Vec<Pharmacy>> {
    match format {
        DatasetFormat::Json => Ok(serde_json::from_slice(data)?),
        DatasetFormat::Csv => {
            let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(data);
            reader
                .deserialize::<CsvRow>()
                .map(|row| row.map(Pharmacy::from).map_err(StoreError::from))
                .collect()
        }
    }
}

pub fn render_dataset(records: &[Pharmacy], format: DatasetFormat) -> StoreResult<Vec<u8>> {
    match format {
        DatasetFormat::Json => Ok(serde_json::to_vec_pretty(records)?),
        DatasetFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            for pharmacy in records {
                writer.serialize(CsvRow::from(pharmacy))?;
            }
            writer
                .into_inner()
                .map_err(|e| StoreError::IoError(e.into_error()))
        }
    }
}

/// A dataset file loaded into memory. Every save rewrites the whole file in
/// the format it was read from.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    format: DatasetFormat,
    inner: InMemoryStore,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let format = DatasetFormat::from_path(&path)?;

        tracing::debug!("Loading dataset from {}", path.display());
        let data = tokio::fs::read(&path).await?;
        let records = parse_dataset(&data, format)?;
        tracing::info!("Loaded {} pharmacies from {}", records.len(), path.display());

        Ok(Self {
            path,
            format,
            inner: InMemoryStore::new(records),
            write_lock: Mutex::new(()),
        })
    }

    async fn persist(&self, records: &[Pharmacy]) -> StoreResult<()> {
        let data = render_dataset(records, self.format)?;
        tokio::fs::write(&self.path, data).await?;
        tracing::debug!("Wrote {} pharmacies to {}", records.len(), self.path.display());
        Ok(())
    }
}

#[async_trait]
impl PharmacyStore for FileStore {
    async fn find(&self, filter: &Filter) -> StoreResult<Vec<Pharmacy>> {
        self.inner.find(filter).await
    }

    async fn find_by_id(&self, id: &PharmacyId) -> StoreResult<Option<Pharmacy>> {
        self.inner.find_by_id(id).await
    }

    async fn aggregate(&self, pipeline: &[Stage]) -> StoreResult<Vec<SearchHit>> {
        self.inner.aggregate(pipeline).await
    }

    async fn save(&self, pharmacy: &Pharmacy) -> StoreResult<Pharmacy> {
        // writers are serialized; memory only changes once the file is written
        let _guard = self.write_lock.lock().await;

        let mut stored = pharmacy.clone();
        stored.updated_at = Some(Utc::now());

        let mut records = self.inner.snapshot().await;
        upsert(&mut records, stored.clone());
        self.persist(&records).await?;

        self.inner.replace_all(records).await;
        Ok(stored)
    }
}
