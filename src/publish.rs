//! Publishing - promote rendered artifacts into the public directory
//!
//! Upstream renders two files per index into the staging directory:
//!
//! | Staged | Published |
//! |--------|-----------|
//! | `<key>_intraday.png` | `<key>_1d.png` (verbatim copy) |
//! | `<key>_stats.json` | `<key>_stats.json` (verbatim copy) |
//! | | `_cards_<key>.json` (derived metadata) |
//!
//! File names use the lowercased key. A publish is all-or-nothing: inputs are
//! checked and parsed first, every output is staged next to its destination,
//! and only then are the staged files renamed into place. A failed rename
//! restores the previous publication.

use crate::atomic_file::{self, StagedFile};
use crate::config::{validate_key, PublishConfig};
use crate::error::{Error, Result};
use crate::reading::now_in;
use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Basis used when the stats document does not name one
pub const DEFAULT_BASIS: &str = "prev_close";

/// Deterministic file names for one index key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactNames {
    pub staged_image: String,
    pub staged_stats: String,
    pub image: String,
    pub stats: String,
    pub card: String,
}

impl ArtifactNames {
    pub fn for_key(index_key: &str) -> Self {
        let stem = index_key.to_lowercase();
        Self {
            staged_image: format!("{}_intraday.png", stem),
            staged_stats: format!("{}_stats.json", stem),
            image: format!("{}_1d.png", stem),
            stats: format!("{}_stats.json", stem),
            card: format!("_cards_{}.json", stem),
        }
    }
}

/// Fields the publisher reads from the staged stats document
///
/// `pct_intraday` is required; the rest fall back to defaults. Unknown fields
/// are ignored here and survive in the verbatim copy.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatsDocument {
    pub pct_intraday: f64,

    #[serde(default = "default_basis")]
    pub basis: String,

    /// Opaque trading-session context
    #[serde(default = "empty_session")]
    pub session: serde_json::Value,

    #[serde(default)]
    pub updated_at: Option<String>,
}

fn default_basis() -> String {
    DEFAULT_BASIS.to_string()
}

fn empty_session() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl StatsDocument {
    pub fn parse(bytes: &[u8]) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Sidecar written as `_cards_<key>.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub index_key: String,
    pub label: String,
    pub pct_intraday: f64,
    pub basis: String,
    pub session: serde_json::Value,
    pub updated_at: String,
    pub image: String,
}

impl SnapshotMetadata {
    /// Merge fixed identifiers with the stats document. A missing
    /// `updated_at` becomes `now` in RFC 3339.
    pub fn derive(
        index_key: &str,
        label: &str,
        stats: StatsDocument,
        now: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            index_key: index_key.to_string(),
            label: label.to_string(),
            pct_intraday: stats.pct_intraday,
            basis: stats.basis,
            session: stats.session,
            updated_at: stats
                .updated_at
                .unwrap_or_else(|| now.to_rfc3339_opts(SecondsFormat::Micros, false)),
            image: ArtifactNames::for_key(index_key).image,
        }
    }
}

/// Copies staged chart/stats artifacts into the public directory
#[derive(Debug, Clone)]
pub struct SnapshotPublisher {
    staging_dir: PathBuf,
    public_dir: PathBuf,
    offset: FixedOffset,
}

impl SnapshotPublisher {
    pub fn new(config: &PublishConfig) -> Result<Self> {
        Ok(Self {
            staging_dir: config.staging_dir.clone(),
            public_dir: config.public_dir.clone(),
            offset: config.offset()?,
        })
    }

    /// Publish `index_key` (e.g. `R_BANK9`) under display `label` (e.g. `R-BANK9`)
    pub fn publish(&self, index_key: &str, label: &str) -> Result<SnapshotMetadata> {
        self.publish_at(index_key, label, now_in(self.offset))
    }

    /// Publish with an explicit fallback timestamp
    pub fn publish_at(
        &self,
        index_key: &str,
        label: &str,
        now: DateTime<FixedOffset>,
    ) -> Result<SnapshotMetadata> {
        validate_key(index_key)?;
        let names = ArtifactNames::for_key(index_key);

        let image_src = self.staging_dir.join(&names.staged_image);
        let stats_src = self.staging_dir.join(&names.staged_stats);

        let image = read_required(index_key, &image_src)?;
        let stats_bytes = read_required(index_key, &stats_src)?;

        let stats = StatsDocument::parse(&stats_bytes).map_err(|e| {
            warn!(index_key, path = %stats_src.display(), error = %e, "publish refused: invalid stats");
            Error::InvalidStats {
                path: stats_src.clone(),
                reason: e.to_string(),
            }
        })?;

        let meta = SnapshotMetadata::derive(index_key, label, stats, now);
        let card = serde_json::to_string_pretty(&meta)?;

        // Nothing below this point is visible until every file is staged
        let staged = vec![
            StagedFile::stage(self.public_dir.join(&names.image), &image)?,
            StagedFile::stage(self.public_dir.join(&names.stats), &stats_bytes)?,
            StagedFile::stage(self.public_dir.join(&names.card), card.as_bytes())?,
        ];
        atomic_file::commit_all(staged).map_err(|e| {
            warn!(index_key, error = %e, "publish rolled back");
            e
        })?;

        info!(
            index_key,
            dest = %self.public_dir.join(&names.image).display(),
            "published"
        );

        Ok(meta)
    }
}

fn read_required(index_key: &str, path: &Path) -> Result<Vec<u8>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(index_key, path = %path.display(), "publish refused: missing staged artifact");
            Err(Error::MissingArtifact {
                index_key: index_key.to_string(),
                path: path.to_path_buf(),
            })
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn jst_noon() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(9 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 6, 7, 12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_artifact_names() {
        let names = ArtifactNames::for_key("R_BANK9");
        assert_eq!(names.staged_image, "r_bank9_intraday.png");
        assert_eq!(names.staged_stats, "r_bank9_stats.json");
        assert_eq!(names.image, "r_bank9_1d.png");
        assert_eq!(names.stats, "r_bank9_stats.json");
        assert_eq!(names.card, "_cards_r_bank9.json");
    }

    #[test]
    fn test_stats_defaults() {
        let stats = StatsDocument::parse(br#"{ "pct_intraday": -0.4 }"#).unwrap();
        assert_eq!(stats.pct_intraday, -0.4);
        assert_eq!(stats.basis, "prev_close");
        assert_eq!(stats.session, serde_json::json!({}));
        assert_eq!(stats.updated_at, None);
    }

    #[test]
    fn test_stats_requires_pct() {
        assert!(StatsDocument::parse(br#"{ "basis": "open" }"#).is_err());
    }

    #[test]
    fn test_metadata_passes_session_through() {
        let stats = StatsDocument::parse(
            br#"{ "pct_intraday": 1.2, "basis": "open",
                  "session": { "start": "09:00", "end": "15:30", "tz": "JST" },
                  "updated_at": "2024-06-07T15:30:00+09:00" }"#,
        )
        .unwrap();

        let meta = SnapshotMetadata::derive("ASTRA4", "ASTRA4", stats, jst_noon());

        assert_eq!(meta.basis, "open");
        assert_eq!(meta.session["end"], "15:30");
        assert_eq!(meta.updated_at, "2024-06-07T15:30:00+09:00");
        assert_eq!(meta.image, "astra4_1d.png");
    }

    #[test]
    fn test_metadata_updated_at_fallback() {
        let stats = StatsDocument::parse(br#"{ "pct_intraday": 0.0 }"#).unwrap();
        let meta = SnapshotMetadata::derive("AIN10", "AIN-10", stats, jst_noon());
        assert_eq!(meta.updated_at, "2024-06-07T12:00:00.000000+09:00");
    }

    #[test]
    fn test_publish_copies_and_derives() {
        let staging = tempdir().unwrap();
        let public = tempdir().unwrap();
        std::fs::write(staging.path().join("r_bank9_intraday.png"), b"\x89PNG fake").unwrap();
        std::fs::write(
            staging.path().join("r_bank9_stats.json"),
            br#"{"pct_intraday": 1.2, "basis": "prev_close"}"#,
        )
        .unwrap();

        let publisher =
            SnapshotPublisher::new(&PublishConfig::new(staging.path(), public.path())).unwrap();
        let meta = publisher.publish_at("R_BANK9", "R-BANK9", jst_noon()).unwrap();

        assert_eq!(meta.index_key, "R_BANK9");
        assert_eq!(meta.label, "R-BANK9");
        assert_eq!(meta.pct_intraday, 1.2);
        assert_eq!(meta.image, "r_bank9_1d.png");

        let card: SnapshotMetadata = serde_json::from_slice(
            &std::fs::read(public.path().join("_cards_r_bank9.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(card, meta);
    }

    #[test]
    fn test_missing_image_is_fatal() {
        let staging = tempdir().unwrap();
        let public = tempdir().unwrap();
        std::fs::write(staging.path().join("astra4_stats.json"), br#"{"pct_intraday": 0.5}"#)
            .unwrap();

        let publisher =
            SnapshotPublisher::new(&PublishConfig::new(staging.path(), public.path())).unwrap();
        let err = publisher.publish("ASTRA4", "ASTRA4").unwrap_err();

        assert!(matches!(err, Error::MissingArtifact { .. }));
        assert_eq!(std::fs::read_dir(public.path()).unwrap().count(), 0);
    }
}
