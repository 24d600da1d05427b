use std::sync::Arc;

use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::entities::system_parameter::{self, Entity as SystemParameterEntity};
use crate::errors::ServiceError;

pub const PARAM_ENABLED: &str = "mrp_bridge.enabled";
pub const PARAM_ENDPOINT_URL: &str = "mrp_bridge.endpoint_url";
pub const PARAM_TIMEOUT_SECS: &str = "mrp_bridge.timeout_secs";

pub const DEFAULT_ENABLED: &str = "true";
pub const DEFAULT_ENDPOINT_URL: &str =
    "http://host.docker.internal:8080/api/work_operation.php";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Documented defaults, seeded the first time any bridge setting is read.
const BRIDGE_DEFAULTS: [(&str, &str); 3] = [
    (PARAM_ENABLED, DEFAULT_ENABLED),
    (PARAM_ENDPOINT_URL, DEFAULT_ENDPOINT_URL),
    (PARAM_TIMEOUT_SECS, "10"),
];

/// Effective bridge settings as exposed on the settings surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeSettings {
    pub endpoint_url: String,
    pub timeout_secs: u64,
    pub enabled: bool,
}

/// Partial update accepted by the settings endpoint; absent fields are left
/// untouched.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct BridgeSettingsUpdate {
    pub endpoint_url: Option<String>,
    #[validate(range(min = 1))]
    pub timeout_secs: Option<u64>,
    pub enabled: Option<bool>,
}

/// Key-value parameter store backing the bridge's runtime configuration.
#[derive(Clone)]
pub struct SettingsService {
    db: Arc<DatabaseConnection>,
}

impl SettingsService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Raw parameter read. `None` when the key has never been set.
    pub async fn get_param(&self, key: &str) -> Result<Option<String>, ServiceError> {
        let row = SystemParameterEntity::find_by_id(key)
            .one(&*self.db)
            .await
            .map_err(|e| ServiceError::db_error(e))?;
        Ok(row.map(|param| param.value))
    }

    /// Inserts or updates a parameter value.
    #[instrument(skip(self, value))]
    pub async fn set_param(&self, key: &str, value: &str) -> Result<(), ServiceError> {
        let existing = SystemParameterEntity::find_by_id(key)
            .one(&*self.db)
            .await
            .map_err(|e| ServiceError::db_error(e))?;

        match existing {
            Some(row) => {
                let mut active: system_parameter::ActiveModel = row.into();
                active.value = Set(value.to_string());
                active
                    .update(&*self.db)
                    .await
                    .map_err(|e| ServiceError::db_error(e))?;
            }
            None => {
                let active = system_parameter::ActiveModel {
                    key: Set(key.to_string()),
                    value: Set(value.to_string()),
                    ..Default::default()
                };
                active
                    .insert(&*self.db)
                    .await
                    .map_err(|e| ServiceError::db_error(e))?;
            }
        }

        Ok(())
    }

    /// Seeds any missing documented default. Never overwrites an existing
    /// value.
    pub async fn ensure_defaults(&self) -> Result<(), ServiceError> {
        for (key, default) in BRIDGE_DEFAULTS {
            if self.get_param(key).await?.is_none() {
                self.set_param(key, default).await?;
                info!("Seeded bridge parameter {} = {}", key, default);
            }
        }
        Ok(())
    }

    /// Effective endpoint URL. May be empty, which disables outbound posts.
    pub async fn endpoint_url(&self) -> Result<String, ServiceError> {
        self.ensure_defaults().await?;
        Ok(self
            .get_param(PARAM_ENDPOINT_URL)
            .await?
            .unwrap_or_else(|| DEFAULT_ENDPOINT_URL.to_string()))
    }

    /// Per-request transport timeout. Malformed values fall back to the
    /// default.
    pub async fn timeout_secs(&self) -> Result<u64, ServiceError> {
        self.ensure_defaults().await?;
        let raw = self
            .get_param(PARAM_TIMEOUT_SECS)
            .await?
            .unwrap_or_else(|| DEFAULT_TIMEOUT_SECS.to_string());
        match raw.trim().parse::<u64>() {
            Ok(secs) => Ok(secs),
            Err(_) => {
                warn!(
                    "Invalid {} value {:?}, using default {}",
                    PARAM_TIMEOUT_SECS, raw, DEFAULT_TIMEOUT_SECS
                );
                Ok(DEFAULT_TIMEOUT_SECS)
            }
        }
    }

    /// Master switch for the outbound bridge.
    pub async fn is_enabled(&self) -> Result<bool, ServiceError> {
        self.ensure_defaults().await?;
        let raw = self
            .get_param(PARAM_ENABLED)
            .await?
            .unwrap_or_else(|| DEFAULT_ENABLED.to_string());
        let normalized = raw.trim().to_ascii_lowercase();
        Ok(normalized == "true" || normalized == "1")
    }

    pub async fn current_settings(&self) -> Result<BridgeSettings, ServiceError> {
        Ok(BridgeSettings {
            endpoint_url: self.endpoint_url().await?,
            timeout_secs: self.timeout_secs().await?,
            enabled: self.is_enabled().await?,
        })
    }

    /// Applies a partial settings update and returns the resulting effective
    /// settings.
    #[instrument(skip(self, update))]
    pub async fn apply_update(
        &self,
        update: BridgeSettingsUpdate,
    ) -> Result<BridgeSettings, ServiceError> {
        if let Some(url) = update.endpoint_url {
            self.set_param(PARAM_ENDPOINT_URL, url.trim()).await?;
        }
        if let Some(secs) = update.timeout_secs {
            if secs == 0 {
                return Err(ServiceError::InvalidInput(
                    "Transport timeout must be at least 1 second".to_string(),
                ));
            }
            self.set_param(PARAM_TIMEOUT_SECS, &secs.to_string()).await?;
        }
        if let Some(enabled) = update.enabled {
            self.set_param(PARAM_ENABLED, if enabled { "true" } else { "false" })
                .await?;
        }
        self.current_settings().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrator::Migrator;
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    async fn test_service() -> (SettingsService, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("settings.db").display()
        );
        let db = Database::connect(&url).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        (SettingsService::new(Arc::new(db)), dir)
    }

    #[tokio::test]
    async fn seeds_defaults_on_first_read() {
        let (service, _dir) = test_service().await;

        assert_eq!(service.get_param(PARAM_ENABLED).await.unwrap(), None);
        assert!(service.is_enabled().await.unwrap());
        assert_eq!(
            service.get_param(PARAM_ENDPOINT_URL).await.unwrap().as_deref(),
            Some(DEFAULT_ENDPOINT_URL)
        );
        assert_eq!(
            service.get_param(PARAM_TIMEOUT_SECS).await.unwrap().as_deref(),
            Some("10")
        );
    }

    #[tokio::test]
    async fn never_overwrites_operator_values() {
        let (service, _dir) = test_service().await;

        service
            .set_param(PARAM_ENDPOINT_URL, "http://mes.local/api")
            .await
            .unwrap();
        service.ensure_defaults().await.unwrap();

        assert_eq!(service.endpoint_url().await.unwrap(), "http://mes.local/api");
    }

    #[tokio::test]
    async fn malformed_timeout_falls_back_to_default() {
        let (service, _dir) = test_service().await;

        service.set_param(PARAM_TIMEOUT_SECS, "banana").await.unwrap();

        assert_eq!(service.timeout_secs().await.unwrap(), DEFAULT_TIMEOUT_SECS);
    }

    #[tokio::test]
    async fn enabled_accepts_true_and_one() {
        let (service, _dir) = test_service().await;

        service.set_param(PARAM_ENABLED, "FALSE").await.unwrap();
        assert!(!service.is_enabled().await.unwrap());

        service.set_param(PARAM_ENABLED, "1").await.unwrap();
        assert!(service.is_enabled().await.unwrap());
    }

    #[tokio::test]
    async fn apply_update_round_trips() {
        let (service, _dir) = test_service().await;

        let updated = service
            .apply_update(BridgeSettingsUpdate {
                endpoint_url: Some("http://mes.local/ingest".to_string()),
                timeout_secs: Some(3),
                enabled: Some(false),
            })
            .await
            .unwrap();

        assert_eq!(
            updated,
            BridgeSettings {
                endpoint_url: "http://mes.local/ingest".to_string(),
                timeout_secs: 3,
                enabled: false,
            }
        );
        assert_eq!(updated, service.current_settings().await.unwrap());
    }

    #[tokio::test]
    async fn apply_update_rejects_zero_timeout() {
        let (service, _dir) = test_service().await;

        let result = service
            .apply_update(BridgeSettingsUpdate {
                timeout_secs: Some(0),
                ..Default::default()
            })
            .await;

        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
    }
}
