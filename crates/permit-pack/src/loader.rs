//! Filesystem pack loader.
//!
//! Packs live under a base directory mirroring the key hierarchy:
//! `<base>/us/md/gaithersburg/{manifest.json, permit_types.json,
//! fees.yaml, inspections.yaml}`. Loading is a pure read of local,
//! versioned configuration — no network I/O.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use serde::de::DeserializeOwned;

use permit_core::AhjKey;

use crate::error::{PackError, PackResult};
use crate::fees::{flatten_fee_document, FeeDocument};
use crate::inspections::InspectionDocument;
use crate::model::{JurisdictionPack, PackManifest, PermitTypeDefinition};
use crate::validation::validate_pack;

/// Loads jurisdiction packs from a configuration directory.
///
/// The optional cache is read-mostly and keyed by [`AhjKey`]; the entry
/// API guarantees at most one load per key runs at a time, so concurrent
/// requests for the same jurisdiction never duplicate parsing work.
/// Cached packs go stale if the underlying files change; call
/// [`PackLoader::invalidate`] to force a reload within the process
/// lifetime.
pub struct PackLoader {
    base_dir: PathBuf,
    cache: Option<DashMap<AhjKey, Arc<JurisdictionPack>>>,
}

impl PackLoader {
    /// Create a loader that reads from disk on every call.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            cache: None,
        }
    }

    /// Create a loader with an in-process cache.
    pub fn with_cache(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            cache: Some(DashMap::new()),
        }
    }

    /// Load the pack for a jurisdiction key.
    ///
    /// # Errors
    ///
    /// [`PackError::NotFound`] when no configuration directory or
    /// manifest exists for the key; [`PackError::Corrupt`] when
    /// documents exist but fail parsing or pack validation.
    pub fn load(&self, key: &AhjKey) -> PackResult<Arc<JurisdictionPack>> {
        if let Some(cache) = &self.cache {
            // The vacant-entry insert holds the shard lock across the
            // load, which is what serializes concurrent loads per key.
            return match cache.entry(key.clone()) {
                dashmap::mapref::entry::Entry::Occupied(entry) => Ok(entry.get().clone()),
                dashmap::mapref::entry::Entry::Vacant(entry) => {
                    let pack = Arc::new(self.load_uncached(key)?);
                    entry.insert(pack.clone());
                    Ok(pack)
                }
            };
        }
        Ok(Arc::new(self.load_uncached(key)?))
    }

    /// Drop a cached pack so the next load rereads the documents.
    pub fn invalidate(&self, key: &AhjKey) {
        if let Some(cache) = &self.cache {
            cache.remove(key);
        }
    }

    /// Every key with a loadable manifest under the base directory.
    pub fn list_available(&self) -> Vec<AhjKey> {
        let mut keys = Vec::new();
        for entry in walkdir::WalkDir::new(&self.base_dir)
            .min_depth(3)
            .max_depth(3)
            .into_iter()
            .filter_map(Result::ok)
        {
            if !entry.file_type().is_dir() || !entry.path().join("manifest.json").is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.base_dir) else {
                continue;
            };
            let segments: Vec<String> = relative
                .components()
                .map(|component| component.as_os_str().to_string_lossy().into_owned())
                .collect();
            if let Ok(key) = AhjKey::new(segments.join("/")) {
                keys.push(key);
            }
        }
        keys.sort();
        keys
    }

    fn pack_dir(&self, key: &AhjKey) -> PathBuf {
        // Key segments are validated lowercase identifiers, so joining
        // them cannot escape the base directory.
        let (country, state, locality) = key.segments();
        self.base_dir.join(country).join(state).join(locality)
    }

    fn load_uncached(&self, key: &AhjKey) -> PackResult<JurisdictionPack> {
        let dir = self.pack_dir(key);
        let manifest_path = dir.join("manifest.json");
        if !manifest_path.is_file() {
            return Err(PackError::NotFound {
                key: key.to_string(),
            });
        }

        let manifest: PackManifest = read_json(key, &manifest_path)?;
        if manifest.id != *key {
            return Err(PackError::corrupt(
                key,
                format!("manifest.json: id '{}' does not match directory", manifest.id),
            ));
        }

        let permit_types_path = dir.join("permit_types.json");
        if !permit_types_path.is_file() {
            return Err(PackError::corrupt(key, "permit_types.json is missing"));
        }
        let permit_types: BTreeMap<String, PermitTypeDefinition> =
            read_json(key, &permit_types_path)?;

        let fees_path = dir.join("fees.yaml");
        let fees = if fees_path.is_file() {
            let document: FeeDocument = read_yaml(key, &fees_path)?;
            flatten_fee_document(key, document)?
        } else {
            tracing::debug!(key = %key, "no fee schedule document; fees empty");
            Vec::new()
        };

        let inspections_path = dir.join("inspections.yaml");
        let inspections = if inspections_path.is_file() {
            let document: InspectionDocument = read_yaml(key, &inspections_path)?;
            document.inspection_types
        } else {
            tracing::debug!(key = %key, "no inspection document; inspections empty");
            Vec::new()
        };

        let pack = JurisdictionPack {
            key: manifest.id,
            name: manifest.name,
            coverage: manifest.coverage,
            portal: manifest.portal,
            permit_types,
            fees,
            inspections,
        };

        let issues = validate_pack(&pack);
        if !issues.is_empty() {
            return Err(PackError::corrupt(key, issues.join("; ")));
        }

        tracing::debug!(
            key = %key,
            permit_types = pack.permit_types.len(),
            fees = pack.fees.len(),
            inspections = pack.inspections.len(),
            "loaded jurisdiction pack"
        );
        Ok(pack)
    }
}

fn read_json<T: DeserializeOwned>(key: &AhjKey, path: &Path) -> PackResult<T> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|err| {
        PackError::corrupt(key, format!("{}: {err}", file_name(path)))
    })
}

fn read_yaml<T: DeserializeOwned>(key: &AhjKey, path: &Path) -> PackResult<T> {
    let content = std::fs::read_to_string(path)?;
    serde_yaml::from_str(&content).map_err(|err| {
        PackError::corrupt(key, format!("{}: {err}", file_name(path)))
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    /// The Maryland packs bundled with this crate.
    fn bundled() -> PackLoader {
        PackLoader::new(concat!(env!("CARGO_MANIFEST_DIR"), "/jurisdictions"))
    }

    fn key(value: &str) -> AhjKey {
        AhjKey::new(value).unwrap()
    }

    #[test]
    fn loads_bundled_gaithersburg_pack() {
        let pack = bundled().load(&key("us/md/gaithersburg")).unwrap();
        assert_eq!(pack.name, "City of Gaithersburg");
        assert!(pack.permit_types.contains_key("residential_kitchen_remodel"));
        assert!(!pack.fees.is_empty());
        assert!(!pack.inspections.is_empty());
    }

    #[test]
    fn loads_all_bundled_jurisdictions() {
        let loader = bundled();
        let keys = loader.list_available();
        assert_eq!(
            keys,
            vec![
                key("us/md/gaithersburg"),
                key("us/md/montgomery_county"),
                key("us/md/rockville"),
            ]
        );
        for jurisdiction in &keys {
            loader.load(jurisdiction).unwrap();
        }
    }

    #[test]
    fn unknown_key_is_not_found() {
        let err = bundled().load(&key("us/md/takoma_park")).unwrap_err();
        assert!(matches!(err, PackError::NotFound { .. }));
    }

    #[test]
    fn cache_returns_same_pack() {
        let loader =
            PackLoader::with_cache(concat!(env!("CARGO_MANIFEST_DIR"), "/jurisdictions"));
        let first = loader.load(&key("us/md/rockville")).unwrap();
        let second = loader.load(&key("us/md/rockville")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn invalidate_forces_reload() {
        let loader =
            PackLoader::with_cache(concat!(env!("CARGO_MANIFEST_DIR"), "/jurisdictions"));
        let first = loader.load(&key("us/md/rockville")).unwrap();
        loader.invalidate(&key("us/md/rockville"));
        let second = loader.load(&key("us/md/rockville")).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);
    }

    fn write_pack(dir: &Path, manifest: &str, permit_types: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join("manifest.json"), manifest).unwrap();
        fs::write(dir.join("permit_types.json"), permit_types).unwrap();
    }

    const MINIMAL_MANIFEST: &str = r#"{
        "id": "us/md/testville",
        "name": "Testville",
        "coverage": {"state": "MD", "county": "Montgomery", "city": "Testville"},
        "portal": {"kind": "email"}
    }"#;

    const MINIMAL_TYPES: &str = r#"{
        "fence_installation": {
            "label": "Fence Installation",
            "submission": {"method": "email", "fee_schedule": "v2025"}
        }
    }"#;

    #[test]
    fn missing_fee_and_inspection_documents_yield_empty_lists() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("us/md/testville");
        write_pack(&dir, MINIMAL_MANIFEST, MINIMAL_TYPES);

        let pack = PackLoader::new(temp.path())
            .load(&key("us/md/testville"))
            .unwrap();
        assert!(pack.fees.is_empty());
        assert!(pack.inspections.is_empty());
    }

    #[test]
    fn malformed_manifest_is_corrupt() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("us/md/testville");
        write_pack(&dir, "{not json", MINIMAL_TYPES);

        let err = PackLoader::new(temp.path())
            .load(&key("us/md/testville"))
            .unwrap_err();
        assert!(matches!(err, PackError::Corrupt { .. }));
        assert!(err.to_string().contains("manifest.json"));
    }

    #[test]
    fn manifest_key_mismatch_is_corrupt() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("us/md/testville");
        let manifest = MINIMAL_MANIFEST.replace("us/md/testville", "us/md/elsewhere");
        write_pack(&dir, &manifest, MINIMAL_TYPES);

        let err = PackLoader::new(temp.path())
            .load(&key("us/md/testville"))
            .unwrap_err();
        assert!(matches!(err, PackError::Corrupt { .. }));
    }

    #[test]
    fn missing_permit_types_is_corrupt() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("us/md/testville");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("manifest.json"), MINIMAL_MANIFEST).unwrap();

        let err = PackLoader::new(temp.path())
            .load(&key("us/md/testville"))
            .unwrap_err();
        assert!(matches!(err, PackError::Corrupt { .. }));
    }

    #[test]
    fn malformed_fee_tier_is_corrupt_not_skipped() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("us/md/testville");
        write_pack(&dir, MINIMAL_MANIFEST, MINIMAL_TYPES);
        fs::write(
            dir.join("fees.yaml"),
            r#"
current: v2025
fee_schedules:
  v2025:
    valuation_tiers:
      - range: [10000, 500]
        rate: 0.02
"#,
        )
        .unwrap();

        let err = PackLoader::new(temp.path())
            .load(&key("us/md/testville"))
            .unwrap_err();
        match err {
            PackError::Corrupt { reason, .. } => assert!(reason.contains("inverted")),
            other => panic!("expected Corrupt, got {other:?}"),
        }
    }

    #[test]
    fn rate_above_one_is_corrupt() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("us/md/testville");
        write_pack(&dir, MINIMAL_MANIFEST, MINIMAL_TYPES);
        fs::write(
            dir.join("fees.yaml"),
            r#"
current: v2025
fee_schedules:
  v2025:
    valuation_tiers:
      - range: [0, null]
        rate: 1.02
"#,
        )
        .unwrap();

        let err = PackLoader::new(temp.path())
            .load(&key("us/md/testville"))
            .unwrap_err();
        assert!(matches!(err, PackError::Corrupt { .. }));
    }
}
