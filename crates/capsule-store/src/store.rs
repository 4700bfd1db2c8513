//! Single-document JSON persistence.
//!
//! Bots here keep one small configuration document, so the store is a
//! `config` table holding exactly one row with one JSON column. `setup`
//! reseeds the row from a caller-supplied origin value whenever the table
//! is missing, empty, or in an anomalous multi-row state.

use crate::error::CapsuleError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::info;

/// Handle to the persisted configuration document.
#[derive(Clone)]
pub struct Capsule {
    pool: SqlitePool,
}

impl Capsule {
    /// Open the database without touching the schema.
    pub async fn connect(url: &str) -> Result<Self, CapsuleError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        // One connection: writes to the single row are serialized, and
        // in-memory databases keep their contents for the pool's lifetime.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Open the database and make sure the document exists.
    ///
    /// `origin` is serialized into the document when the table has to be
    /// (re)seeded: on first run, when the row count is not exactly one, or
    /// when `reset` is requested.
    pub async fn setup<T: Serialize>(
        url: &str,
        origin: &T,
        reset: bool,
    ) -> Result<Self, CapsuleError> {
        let capsule = Self::connect(url).await?;
        capsule.initialize(origin, reset).await?;
        Ok(capsule)
    }

    async fn initialize<T: Serialize>(&self, origin: &T, reset: bool) -> Result<(), CapsuleError> {
        sqlx::query("CREATE TABLE IF NOT EXISTS config (json TEXT NOT NULL)")
            .execute(&self.pool)
            .await?;

        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM config")
            .fetch_one(&self.pool)
            .await?;

        if count != 1 || reset {
            sqlx::query("DELETE FROM config").execute(&self.pool).await?;
            sqlx::query("INSERT INTO config (json) VALUES ('{}')")
                .execute(&self.pool)
                .await?;
            self.save(origin).await?;
            info!("Seeded config document");
        }

        Ok(())
    }

    /// Overwrite the document.
    pub async fn save<T: Serialize>(&self, config: &T) -> Result<(), CapsuleError> {
        let json = serde_json::to_string(config)?;
        sqlx::query("UPDATE config SET json = ?1")
            .bind(json)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Read the document back.
    pub async fn load<T: DeserializeOwned>(&self) -> Result<T, CapsuleError> {
        let json = sqlx::query_scalar::<_, String>("SELECT json FROM config")
            .fetch_one(&self.pool)
            .await?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Load the document, let `action` mutate it, and save the result.
    pub async fn with<T, F>(&self, action: F) -> anyhow::Result<()>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut T) -> anyhow::Result<()>,
    {
        let mut config: T = self.load().await?;
        action(&mut config)?;
        self.save(&config).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct Date {
        day: String,
        hour: i64,
        min: i64,
    }

    fn sunday_noon() -> Date {
        Date {
            day: "Sunday".into(),
            hour: 12,
            min: 0,
        }
    }

    #[tokio::test]
    async fn setup_seeds_origin_document() {
        let capsule = Capsule::setup("sqlite::memory:", &sunday_noon(), false)
            .await
            .unwrap();

        let loaded: Date = capsule.load().await.unwrap();
        assert_eq!(loaded, sunday_noon());
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let capsule = Capsule::setup("sqlite::memory:", &sunday_noon(), false)
            .await
            .unwrap();

        let updated = Date {
            day: "Monday".into(),
            hour: 21,
            min: 30,
        };
        capsule.save(&updated).await.unwrap();

        let loaded: Date = capsule.load().await.unwrap();
        assert_eq!(loaded, updated);
    }

    #[tokio::test]
    async fn initialize_preserves_existing_document() {
        let capsule = Capsule::setup("sqlite::memory:", &sunday_noon(), false)
            .await
            .unwrap();

        let updated = Date {
            day: "Friday".into(),
            hour: 18,
            min: 0,
        };
        capsule.save(&updated).await.unwrap();

        // A second startup without reset leaves the stored value alone.
        capsule.initialize(&sunday_noon(), false).await.unwrap();
        let loaded: Date = capsule.load().await.unwrap();
        assert_eq!(loaded, updated);
    }

    #[tokio::test]
    async fn reset_reseeds_from_origin() {
        let capsule = Capsule::setup("sqlite::memory:", &sunday_noon(), false)
            .await
            .unwrap();

        let updated = Date {
            day: "Friday".into(),
            hour: 18,
            min: 0,
        };
        capsule.save(&updated).await.unwrap();

        capsule.initialize(&sunday_noon(), true).await.unwrap();
        let loaded: Date = capsule.load().await.unwrap();
        assert_eq!(loaded, sunday_noon());
    }

    #[tokio::test]
    async fn anomalous_row_count_is_reseeded() {
        let capsule = Capsule::setup("sqlite::memory:", &sunday_noon(), false)
            .await
            .unwrap();

        sqlx::query("INSERT INTO config (json) VALUES ('{}')")
            .execute(&capsule.pool)
            .await
            .unwrap();

        capsule.initialize(&sunday_noon(), false).await.unwrap();

        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM config")
            .fetch_one(&capsule.pool)
            .await
            .unwrap();
        assert_eq!(count, 1);

        let loaded: Date = capsule.load().await.unwrap();
        assert_eq!(loaded, sunday_noon());
    }

    #[tokio::test]
    async fn with_mutates_in_place() {
        let capsule = Capsule::setup("sqlite::memory:", &sunday_noon(), false)
            .await
            .unwrap();

        capsule
            .with(|date: &mut Date| {
                date.hour = 21;
                Ok(())
            })
            .await
            .unwrap();

        let loaded: Date = capsule.load().await.unwrap();
        assert_eq!(loaded.hour, 21);
        assert_eq!(loaded.day, "Sunday");
    }
}
