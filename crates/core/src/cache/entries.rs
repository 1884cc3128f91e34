//! Asset entry operations.
//!
//! Provides functions for storing and probing cached asset bodies keyed by
//! their canonical resource path.

use super::connection::CacheDb;
use crate::Error;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// One cached asset.
///
/// The path is the canonical resource path as requested from the origin;
/// versioned assets are keyed under their physical (version-qualified) path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetEntry {
    pub path: String,
    pub body: Vec<u8>,
    pub content_type: Option<String>,
    pub fetched_at: String,
}

impl CacheDb {
    /// Insert or replace a cached asset.
    ///
    /// Uses UPSERT semantics: a repopulation run overwrites the body for an
    /// existing path rather than accumulating rows.
    pub async fn put_asset(&self, entry: &AssetEntry) -> Result<(), Error> {
        let entry = entry.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO assets (path, body, content_type, fetched_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(path) DO UPDATE SET
                        body = excluded.body,
                        content_type = excluded.content_type,
                        fetched_at = excluded.fetched_at",
                    params![&entry.path, &entry.body, &entry.content_type, &entry.fetched_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get an asset by exact path.
    ///
    /// Returns None if the path isn't cached.
    pub async fn get_asset(&self, path: &str) -> Result<Option<AssetEntry>, Error> {
        let path = path.to_string();
        self.conn
            .call(move |conn| -> Result<Option<AssetEntry>, Error> {
                let result = conn.query_row(
                    "SELECT path, body, content_type, fetched_at FROM assets WHERE path = ?1",
                    params![path],
                    |row| {
                        Ok(AssetEntry {
                            path: row.get(0)?,
                            body: row.get(1)?,
                            content_type: row.get(2)?,
                            fetched_at: row.get(3)?,
                        })
                    },
                );

                match result {
                    Ok(entry) => Ok(Some(entry)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Check whether an exact path is cached, without reading the body.
    pub async fn contains_asset(&self, path: &str) -> Result<bool, Error> {
        let path = path.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let present: bool = conn
                    .query_row(
                        "SELECT EXISTS(SELECT 1 FROM assets WHERE path = ?1)",
                        params![path],
                        |row| row.get(0),
                    )
                    .map_err(Error::from)?;
                Ok(present)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of cached assets.
    pub async fn asset_count(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count: i64 = conn
                    .query_row("SELECT COUNT(*) FROM assets", [], |row| row.get(0))
                    .map_err(Error::from)?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
