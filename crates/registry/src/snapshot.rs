use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use switchboard_types::Extension;

use crate::error::{RegistryError, Result};
use crate::registry::ExtensionRegistry;

/// Name of the storage region all registry state lives in. The region is the
/// unit of durability: a host upgrades the registry logic independently of
/// the data it manages by carrying this region across deployments.
pub const REGISTRY_REGION: &str = "switchboard.registry";

/// Version of the snapshot wire format.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Serializable view of all registry state.
///
/// Only the extension records are stored; the dispatch index is derived data
/// and is rebuilt on restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub format_version: u32,
    pub extensions: Vec<Extension>,
}

impl RegistrySnapshot {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Opaque durable keyed store the registry persists through.
///
/// Durability and crash recovery beyond what an implementation provides are
/// the storage layer's responsibility, not the registry's.
pub trait SnapshotStore {
    fn load(&self, region: &str) -> Result<Option<Vec<u8>>>;
    fn save(&mut self, region: &str, bytes: &[u8]) -> Result<()>;
}

/// In-memory store for tests and hosts that manage durability themselves.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    regions: HashMap<String, Vec<u8>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self, region: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.regions.get(region).cloned())
    }

    fn save(&mut self, region: &str, bytes: &[u8]) -> Result<()> {
        self.regions.insert(region.to_string(), bytes.to_vec());
        Ok(())
    }
}

/// File-backed store: one JSON file per region, with the previous contents
/// copied to a `.backup` sibling before each overwrite.
#[derive(Debug)]
pub struct FileSnapshotStore {
    root: PathBuf,
}

impl FileSnapshotStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.exists() {
            fs::create_dir_all(&root).map_err(|e| RegistryError::SnapshotIo {
                operation: "create store directory".to_string(),
                path: root.clone(),
                source: e,
            })?;
        }
        Ok(Self { root })
    }

    fn region_path(&self, region: &str) -> PathBuf {
        self.root.join(format!("{region}.json"))
    }

    fn backup_path(&self, region: &str) -> PathBuf {
        self.root.join(format!("{region}.json.backup"))
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self, region: &str) -> Result<Option<Vec<u8>>> {
        let path = self.region_path(region);
        if !path.exists() {
            info!("no existing snapshot for region '{}'", region);
            return Ok(None);
        }
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) => {
                let backup = self.backup_path(region);
                if backup.exists() {
                    warn!("failed to read snapshot for '{}', trying backup", region);
                    let bytes = fs::read(&backup).map_err(|e| RegistryError::SnapshotIo {
                        operation: "read snapshot backup".to_string(),
                        path: backup,
                        source: e,
                    })?;
                    return Ok(Some(bytes));
                }
                Err(RegistryError::SnapshotIo {
                    operation: "read snapshot".to_string(),
                    path,
                    source: e,
                })
            }
        }
    }

    fn save(&mut self, region: &str, bytes: &[u8]) -> Result<()> {
        let path = self.region_path(region);
        if path.exists() {
            let backup = self.backup_path(region);
            fs::copy(&path, &backup).map_err(|e| RegistryError::SnapshotIo {
                operation: "back up snapshot".to_string(),
                path: backup,
                source: e,
            })?;
        }
        fs::write(&path, bytes).map_err(|e| RegistryError::SnapshotIo {
            operation: "write snapshot".to_string(),
            path,
            source: e,
        })?;
        debug!("saved {} byte(s) to region '{}'", bytes.len(), region);
        Ok(())
    }
}

impl ExtensionRegistry {
    /// Snapshot all registry state. Extensions are sorted by name so the
    /// serialized form is deterministic.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let mut extensions: Vec<Extension> = self.extensions().cloned().collect();
        extensions.sort_by(|a, b| a.name().cmp(b.name()));
        RegistrySnapshot {
            format_version: SNAPSHOT_FORMAT_VERSION,
            extensions,
        }
    }

    /// Rebuild a registry from a snapshot, re-deriving the dispatch index.
    ///
    /// Snapshots that violate the registry's invariants (duplicate names or
    /// selector owners, inconsistent functions, null handles) are rejected
    /// as corrupted. The restored registry starts with the allow-all policy
    /// and no event sinks.
    pub fn restore(snapshot: RegistrySnapshot) -> Result<Self> {
        if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(RegistryError::CorruptedSnapshot(format!(
                "unsupported format version {}",
                snapshot.format_version
            )));
        }
        let mut registry = Self::new();
        for extension in snapshot.extensions {
            registry
                .add_extension(extension)
                .map_err(|e| RegistryError::CorruptedSnapshot(e.to_string()))?;
        }
        info!(
            "restored registry with {} extension(s)",
            registry.extensions().count()
        );
        Ok(registry)
    }

    /// Persist the current state into the registry region of a store.
    pub fn persist(&self, store: &mut dyn SnapshotStore) -> Result<()> {
        let bytes = self.snapshot().to_bytes()?;
        store.save(REGISTRY_REGION, &bytes)
    }

    /// Load registry state from a store's registry region. An empty region
    /// yields an empty registry.
    pub fn load(store: &dyn SnapshotStore) -> Result<Self> {
        match store.load(REGISTRY_REGION)? {
            Some(bytes) => Self::restore(RegistrySnapshot::from_bytes(&bytes)?),
            None => Ok(Self::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_types::{
        ExtensionFunction, ExtensionMetadata, ImplementationHandle, Selector,
    };
    use tempfile::TempDir;

    fn sample_registry() -> ExtensionRegistry {
        let mut registry = ExtensionRegistry::new();
        registry
            .add_extension(
                Extension::new(ExtensionMetadata::new(
                    "Core",
                    ImplementationHandle::new(0xa1),
                ))
                .with_function(ExtensionFunction::from_signature("foo()"))
                .with_function(ExtensionFunction::receive()),
            )
            .unwrap();
        registry
            .add_extension(
                Extension::new(ExtensionMetadata::new(
                    "Other",
                    ImplementationHandle::new(0xb2),
                ))
                .with_function(ExtensionFunction::from_signature("bar()")),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_snapshot_restore_round_trip() {
        let registry = sample_registry();
        let restored = ExtensionRegistry::restore(registry.snapshot()).unwrap();

        assert_eq!(restored.snapshot(), registry.snapshot());
        // Dispatch index is rebuilt, not stored.
        let resolved = restored
            .metadata_for_selector(Selector::derive("bar()"))
            .unwrap();
        assert_eq!(resolved.name, "Other");
        assert!(restored.metadata_for_selector(Selector::ZERO).is_some());
        assert!(restored.verify_integrity().is_empty());
    }

    #[test]
    fn test_restore_rejects_duplicate_selector_owner() {
        let snapshot = RegistrySnapshot {
            format_version: SNAPSHOT_FORMAT_VERSION,
            extensions: vec![
                Extension::new(ExtensionMetadata::new(
                    "Core",
                    ImplementationHandle::new(0xa1),
                ))
                .with_function(ExtensionFunction::from_signature("foo()")),
                Extension::new(ExtensionMetadata::new(
                    "Other",
                    ImplementationHandle::new(0xb2),
                ))
                .with_function(ExtensionFunction::from_signature("foo()")),
            ],
        };

        let err = ExtensionRegistry::restore(snapshot).unwrap_err();
        assert!(matches!(err, RegistryError::CorruptedSnapshot(_)));
    }

    #[test]
    fn test_restore_rejects_unknown_format_version() {
        let snapshot = RegistrySnapshot {
            format_version: SNAPSHOT_FORMAT_VERSION + 1,
            extensions: vec![],
        };
        let err = ExtensionRegistry::restore(snapshot).unwrap_err();
        assert!(matches!(err, RegistryError::CorruptedSnapshot(_)));
    }

    #[test]
    fn test_memory_store_round_trip() {
        let registry = sample_registry();
        let mut store = MemorySnapshotStore::new();
        registry.persist(&mut store).unwrap();

        let loaded = ExtensionRegistry::load(&store).unwrap();
        assert_eq!(loaded.snapshot(), registry.snapshot());
    }

    #[test]
    fn test_load_from_empty_store_gives_empty_registry() {
        let store = MemorySnapshotStore::new();
        let loaded = ExtensionRegistry::load(&store).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_file_store_round_trip() {
        let temp = TempDir::new().unwrap();
        let registry = sample_registry();

        let mut store = FileSnapshotStore::new(temp.path()).unwrap();
        registry.persist(&mut store).unwrap();

        let store = FileSnapshotStore::new(temp.path()).unwrap();
        let loaded = ExtensionRegistry::load(&store).unwrap();
        assert_eq!(loaded.snapshot(), registry.snapshot());
    }

    #[test]
    fn test_file_store_backs_up_previous_contents() {
        let temp = TempDir::new().unwrap();
        let mut store = FileSnapshotStore::new(temp.path()).unwrap();

        store.save(REGISTRY_REGION, b"first").unwrap();
        store.save(REGISTRY_REGION, b"second").unwrap();

        let backup = temp.path().join(format!("{REGISTRY_REGION}.json.backup"));
        assert_eq!(fs::read(&backup).unwrap(), b"first");
        assert_eq!(store.load(REGISTRY_REGION).unwrap().unwrap(), b"second");
    }

    #[test]
    fn test_snapshot_bytes_are_json() {
        let snapshot = sample_registry().snapshot();
        let bytes = snapshot.to_bytes().unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed["format_version"], 1);

        let back = RegistrySnapshot::from_bytes(&bytes).unwrap();
        assert_eq!(back, snapshot);
    }
}
