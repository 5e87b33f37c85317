// ============================================================
// Layer 6 — Artifact Store
// ============================================================
// Persists and restores the ArtifactBundle as one unit.
//
// On-disk layout:
//   models/
//     bundle/
//       churn_model.json       ← forest, stamped with run id
//       encoders.json          ← encoder registry, stamped
//       feature_columns.json   ← feature schema, stamped
//       train_config.json      ← config of the run, stamped
//       manifest.json          ← run id + SHA-256 of each file
//     metrics.csv              ← one row per run (infra::metrics)
//
// Saving is atomic at directory level:
//   1. write every file into  models/.bundle-<run id>.tmp/
//   2. write manifest.json last
//   3. move the live bundle aside to models/.bundle.old
//   4. rename the staging directory to models/bundle
//   5. delete models/.bundle.old
// A failure before step 4 leaves the previous bundle untouched.
// A crash between steps 3 and 4 leaves only models/.bundle.old;
// the next save or load renames it back before doing anything.
//
// Loading checks, in order, and refuses with a Config error on
// the first problem:
//   - bundle directory and manifest exist
//   - every listed file exists and matches its SHA-256
//   - every file carries the manifest's run id
//   - model width, schema and encoders agree (ArtifactBundle::new)
//
// Reference: sha2 crate documentation
//            Rust Book §9 (Error Handling)

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{
    collections::BTreeMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};
use uuid::Uuid;

use crate::application::train_use_case::TrainConfig;
use crate::data::{encoder::EncoderRegistry, schema::FeatureSchema};
use crate::domain::error::{ChurnError, ChurnResult};
use crate::ml::{bundle::ArtifactBundle, forest::RandomForest};

pub const BUNDLE_DIR:    &str = "bundle";
pub const MODEL_FILE:    &str = "churn_model.json";
pub const ENCODERS_FILE: &str = "encoders.json";
pub const SCHEMA_FILE:   &str = "feature_columns.json";
pub const CONFIG_FILE:   &str = "train_config.json";
pub const MANIFEST_FILE: &str = "manifest.json";

const FORMAT_VERSION: u32 = 1;

/// Every artifact file wraps its payload with the run that produced it.
#[derive(Serialize, Deserialize)]
struct Stamped<T> {
    run_id:  Uuid,
    payload: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: u32,
    pub run_id:         Uuid,
    pub created_unix:   u64,
    /// file name → lowercase hex SHA-256
    pub files:          BTreeMap<String, String>,
}

/// Reads and writes artifact bundles under one root directory.
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of the live bundle.
    pub fn bundle_dir(&self) -> PathBuf {
        self.root.join(BUNDLE_DIR)
    }

    fn staging_dir(&self, run_id: Uuid) -> PathBuf {
        self.root.join(format!(".bundle-{run_id}.tmp"))
    }

    fn retired_dir(&self) -> PathBuf {
        self.root.join(".bundle.old")
    }

    // ─── Save ────────────────────────────────────────────────────────────────

    /// Persist `bundle` (plus the config that produced it) atomically.
    pub fn save(&self, bundle: &ArtifactBundle, config: &TrainConfig) -> ChurnResult<PathBuf> {
        fs::create_dir_all(&self.root).map_err(|e| ChurnError::persist(&self.root, e))?;
        self.recover_interrupted_swap()?;

        let staging = self.staging_dir(bundle.run_id());
        if staging.is_dir() {
            fs::remove_dir_all(&staging).map_err(|e| ChurnError::persist(&staging, e))?;
        }
        fs::create_dir(&staging).map_err(|e| ChurnError::persist(&staging, e))?;

        match self.write_staging(&staging, bundle, config) {
            Ok(()) => {}
            Err(e) => {
                let _ = fs::remove_dir_all(&staging);
                return Err(e);
            }
        }

        self.swap_in(&staging)?;

        let dest = self.bundle_dir();
        tracing::info!("Saved artifact bundle {} to '{}'", bundle.run_id(), dest.display());
        Ok(dest)
    }

    fn write_staging(&self, staging: &Path, bundle: &ArtifactBundle, config: &TrainConfig) -> ChurnResult<()> {
        let run_id    = bundle.run_id();
        let mut files = BTreeMap::new();

        files.insert(MODEL_FILE.to_string(),    write_stamped(staging, MODEL_FILE, run_id, bundle.model())?);
        files.insert(ENCODERS_FILE.to_string(), write_stamped(staging, ENCODERS_FILE, run_id, bundle.encoders())?);
        files.insert(SCHEMA_FILE.to_string(),   write_stamped(staging, SCHEMA_FILE, run_id, bundle.schema())?);
        files.insert(CONFIG_FILE.to_string(),   write_stamped(staging, CONFIG_FILE, run_id, config)?);

        let manifest = Manifest {
            format_version: FORMAT_VERSION,
            run_id,
            created_unix: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
            files,
        };
        let path  = staging.join(MANIFEST_FILE);
        let bytes = serde_json::to_vec_pretty(&manifest).map_err(|e| ChurnError::persist(&path, e.into()))?;
        write_synced(&path, &bytes)
    }

    fn swap_in(&self, staging: &Path) -> ChurnResult<()> {
        let dest    = self.bundle_dir();
        let retired = self.retired_dir();

        if retired.exists() {
            fs::remove_dir_all(&retired).map_err(|e| ChurnError::persist(&retired, e))?;
        }
        if dest.exists() {
            fs::rename(&dest, &retired).map_err(|e| ChurnError::persist(&dest, e))?;
        }
        if let Err(e) = fs::rename(staging, &dest) {
            // put the previous bundle back before reporting
            if retired.exists() {
                let _ = fs::rename(&retired, &dest);
            }
            let _ = fs::remove_dir_all(staging);
            return Err(ChurnError::persist(&dest, e));
        }
        if retired.exists() {
            if let Err(e) = fs::remove_dir_all(&retired) {
                tracing::warn!("Could not remove retired bundle '{}': {}", retired.display(), e);
            }
        }
        Ok(())
    }

    /// Put `.bundle.old` back when a swap died after retiring the live bundle.
    fn recover_interrupted_swap(&self) -> ChurnResult<()> {
        let dest    = self.bundle_dir();
        let retired = self.retired_dir();
        if dest.exists() || !retired.is_dir() {
            return Ok(());
        }
        tracing::warn!(
            "No live bundle but '{}' exists; restoring it",
            retired.display()
        );
        fs::rename(&retired, &dest).map_err(|e| ChurnError::persist(&retired, e))
    }

    // ─── Load ────────────────────────────────────────────────────────────────

    /// Load and cross-check the live bundle.
    pub fn load(&self) -> ChurnResult<ArtifactBundle> {
        self.recover_interrupted_swap().map_err(|e| {
            ChurnError::config(format!("cannot restore the previous bundle: {e}"))
        })?;

        let dir = self.bundle_dir();
        if !dir.is_dir() {
            return Err(ChurnError::config(format!(
                "no artifact bundle at '{}'. Run 'train' first.",
                dir.display()
            )));
        }

        let manifest = self.load_manifest()?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(ChurnError::config(format!(
                "unsupported bundle format version {}",
                manifest.format_version
            )));
        }

        let model:    RandomForest    = read_stamped(&dir, MODEL_FILE, &manifest)?;
        let encoders: EncoderRegistry = read_stamped(&dir, ENCODERS_FILE, &manifest)?;
        let schema:   FeatureSchema   = read_stamped(&dir, SCHEMA_FILE, &manifest)?;

        let bundle = ArtifactBundle::new(manifest.run_id, model, encoders, schema)?;
        tracing::info!(
            "Loaded artifact bundle {} ({} features, {} encoders)",
            bundle.run_id(),
            bundle.schema().len(),
            bundle.encoders().len()
        );
        Ok(bundle)
    }

    pub fn load_manifest(&self) -> ChurnResult<Manifest> {
        let path  = self.bundle_dir().join(MANIFEST_FILE);
        let bytes = fs::read(&path).map_err(|e| {
            ChurnError::config(format!("cannot read manifest '{}': {e}", path.display()))
        })?;
        serde_json::from_slice(&bytes).map_err(|e| {
            ChurnError::config(format!("malformed manifest '{}': {e}", path.display()))
        })
    }

    /// Training config stored alongside the live bundle.
    pub fn load_train_config(&self) -> ChurnResult<TrainConfig> {
        let manifest = self.load_manifest()?;
        read_stamped(&self.bundle_dir(), CONFIG_FILE, &manifest)
    }
}

fn write_stamped<T: Serialize>(dir: &Path, name: &str, run_id: Uuid, payload: &T) -> ChurnResult<String> {
    let path  = dir.join(name);
    let bytes = serde_json::to_vec(&Stamped { run_id, payload })
        .map_err(|e| ChurnError::persist(&path, e.into()))?;
    write_synced(&path, &bytes)?;
    Ok(sha256_hex(&bytes))
}

fn write_synced(path: &Path, bytes: &[u8]) -> ChurnResult<()> {
    let mut file = fs::File::create(path).map_err(|e| ChurnError::persist(path, e))?;
    file.write_all(bytes).map_err(|e| ChurnError::persist(path, e))?;
    file.sync_all().map_err(|e| ChurnError::persist(path, e))
}

fn read_stamped<T: DeserializeOwned>(dir: &Path, name: &str, manifest: &Manifest) -> ChurnResult<T> {
    let path = dir.join(name);

    let expected = manifest.files.get(name).ok_or_else(|| {
        ChurnError::config(format!("manifest does not list artifact '{name}'"))
    })?;
    let bytes = fs::read(&path).map_err(|e| {
        ChurnError::config(format!("artifact '{}' is missing: {e}", path.display()))
    })?;
    if &sha256_hex(&bytes) != expected {
        return Err(ChurnError::config(format!(
            "artifact '{}' does not match the manifest checksum",
            path.display()
        )));
    }

    let stamped: Stamped<T> = serde_json::from_slice(&bytes).map_err(|e| {
        ChurnError::config(format!("artifact '{}' is malformed: {e}", path.display()))
    })?;
    if stamped.run_id != manifest.run_id {
        return Err(ChurnError::config(format!(
            "artifact '{}' comes from run {} but the bundle is run {}",
            path.display(),
            stamped.run_id,
            manifest.run_id
        )));
    }
    Ok(stamped.payload)
}

fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes).iter().map(|b| format!("{b:02x}")).collect()
}
