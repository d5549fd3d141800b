//! Durable file-backed record storage.
//!
//! Layout under the root:
//! - `records/<first two hex chars>/<fingerprint>.json`, one file per record
//! - `meta/MANIFEST.json`, the committed id set plus insertion order
//! - `meta/LOCK`, an exclusive file lock held across every mutation
//!
//! The manifest is the commit point: a record file that is not listed in it
//! does not exist as far as readers are concerned.

use std::{
    collections::{HashMap, VecDeque},
    fs::{self, File},
    io::{Read, Write},
    path::{Path, PathBuf},
    time::SystemTime,
};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use textprint_core::{model::AnalyzedRecord, traits::Storage};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum LocalError {
    #[error("io error: {0}")]
    Io(String),
    #[error("serde error: {0}")]
    Serde(String),
}

#[derive(Default, Serialize, Deserialize, Clone)]
struct Manifest {
    ids: HashMap<String, String>, // id -> relative path under root
    recent: VecDeque<String>,     // newest insert at front
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LocalConfig {
    /// fsync record files, the manifest and their directories on every write.
    pub fsync: bool,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self { fsync: true }
    }
}

struct CachedManifest {
    manifest: Manifest,
    mtime: Option<SystemTime>,
}

pub struct LocalStorage {
    root: PathBuf,
    config: LocalConfig,
    manifest: RwLock<Option<CachedManifest>>,
}

impl LocalStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, LocalError> {
        Self::with_config(root, LocalConfig::default())
    }

    pub fn with_config<P: AsRef<Path>>(root: P, config: LocalConfig) -> Result<Self, LocalError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("records")).map_err(|e| LocalError::Io(e.to_string()))?;
        fs::create_dir_all(root.join("meta")).map_err(|e| LocalError::Io(e.to_string()))?;
        Ok(Self {
            root,
            config,
            manifest: RwLock::new(None),
        })
    }

    fn manifest_path(&self) -> PathBuf {
        self.root.join("meta").join("MANIFEST.json")
    }

    fn lock_path(&self) -> PathBuf {
        self.root.join("meta").join("LOCK")
    }

    fn rel_path_for(id: &str) -> String {
        let shard = id.get(..2).unwrap_or("__");
        format!("records/{}/{}.json", shard, id)
    }

    fn abs(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    fn manifest_mtime(&self) -> Option<SystemTime> {
        fs::metadata(self.manifest_path())
            .and_then(|m| m.modified())
            .ok()
    }

    fn load_manifest(path: &Path) -> Result<Manifest, LocalError> {
        if !path.exists() {
            return Ok(Manifest::default());
        }
        let mut s = String::new();
        File::open(path)
            .map_err(|e| LocalError::Io(e.to_string()))?
            .read_to_string(&mut s)
            .map_err(|e| LocalError::Io(e.to_string()))?;
        serde_json::from_str(&s).map_err(|e| LocalError::Serde(e.to_string()))
    }

    fn save_manifest(&self, m: &Manifest) -> Result<(), LocalError> {
        let path = self.manifest_path();
        let tmp = self.root.join("meta").join(format!(
            ".tmp-manifest-{}-{}.json",
            std::process::id(),
            unique_suffix()
        ));
        let data = serde_json::to_vec_pretty(m).map_err(|e| LocalError::Serde(e.to_string()))?;
        write_atomic(&tmp, &path, &data, self.config.fsync)?;
        *self.manifest.write() = Some(CachedManifest {
            manifest: m.clone(),
            mtime: self.manifest_mtime(),
        });
        Ok(())
    }

    /// Cached manifest, reloaded when another process has rewritten it.
    fn manifest_snapshot(&self) -> Result<Manifest, LocalError> {
        let mtime = self.manifest_mtime();
        {
            let cached = self.manifest.read();
            if let Some(c) = cached.as_ref() {
                if c.mtime == mtime {
                    return Ok(c.manifest.clone());
                }
            }
        }
        let manifest = Self::load_manifest(&self.manifest_path())?;
        *self.manifest.write() = Some(CachedManifest {
            manifest: manifest.clone(),
            mtime,
        });
        Ok(manifest)
    }

    fn read_record(&self, rel: &str) -> Result<Option<AnalyzedRecord>, LocalError> {
        let path = self.abs(rel);
        let mut s = String::new();
        match File::open(&path) {
            Ok(mut f) => {
                f.read_to_string(&mut s)
                    .map_err(|e| LocalError::Io(e.to_string()))?;
                let record: AnalyzedRecord =
                    serde_json::from_str(&s).map_err(|e| LocalError::Serde(e.to_string()))?;
                Ok(Some(record))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LocalError::Io(e.to_string())),
        }
    }

    fn with_lock<T>(
        &self,
        f: impl FnOnce() -> Result<T, LocalError>,
    ) -> Result<T, LocalError> {
        let lockf = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.lock_path())
            .map_err(|e| LocalError::Io(e.to_string()))?;
        fs4::FileExt::lock_exclusive(&lockf).map_err(|e| LocalError::Io(e.to_string()))?;
        let res = f();
        let _ = fs4::FileExt::unlock(&lockf);
        res
    }
}

impl Storage for LocalStorage {
    type Error = LocalError;

    fn insert_if_absent(&self, record: &AnalyzedRecord) -> Result<bool, Self::Error> {
        self.with_lock(|| {
            // Re-read under the lock so writers in other processes are seen.
            let mut manifest = Self::load_manifest(&self.manifest_path())?;
            if manifest.ids.contains_key(&record.id) {
                debug!(fingerprint = %record.id, "local insert skipped: present");
                return Ok(false);
            }
            let rel = Self::rel_path_for(&record.id);
            let path = self.abs(&rel);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| LocalError::Io(e.to_string()))?;
            }
            let data =
                serde_json::to_vec_pretty(record).map_err(|e| LocalError::Serde(e.to_string()))?;
            let tmp = path
                .with_file_name(format!(".tmp-{}-{}.json", record.id, unique_suffix()));
            write_atomic(&tmp, &path, &data, self.config.fsync)?;

            manifest.ids.insert(record.id.clone(), rel.clone());
            manifest.recent.push_front(record.id.clone());
            self.save_manifest(&manifest)?;
            debug!(fingerprint = %record.id, rel_path = %rel, "local insert committed");
            Ok(true)
        })
    }

    fn get(&self, id: &str) -> Result<Option<AnalyzedRecord>, Self::Error> {
        let manifest = self.manifest_snapshot()?;
        let Some(rel) = manifest.ids.get(id) else {
            return Ok(None);
        };
        let record = self.read_record(rel)?;
        if record.is_none() {
            warn!(fingerprint = id, rel_path = %rel, "manifest entry without record file");
        }
        Ok(record)
    }

    fn delete(&self, id: &str) -> Result<bool, Self::Error> {
        self.with_lock(|| {
            let mut manifest = Self::load_manifest(&self.manifest_path())?;
            let Some(rel) = manifest.ids.remove(id) else {
                return Ok(false);
            };
            if let Some(pos) = manifest.recent.iter().position(|x| x == id) {
                manifest.recent.remove(pos);
            }
            self.save_manifest(&manifest)?;
            match fs::remove_file(self.abs(&rel)) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(LocalError::Io(e.to_string())),
            }
            debug!(fingerprint = id, "local delete committed");
            Ok(true)
        })
    }

    fn scan(
        &self,
        predicate: &dyn Fn(&AnalyzedRecord) -> bool,
    ) -> Result<Vec<AnalyzedRecord>, Self::Error> {
        let manifest = self.manifest_snapshot()?;
        let mut out = Vec::new();
        for id in &manifest.recent {
            let Some(rel) = manifest.ids.get(id) else {
                continue;
            };
            match self.read_record(rel)? {
                Some(record) if predicate(&record) => out.push(record),
                Some(_) => {}
                None => warn!(fingerprint = %id, "scan skipped missing record file"),
            }
        }
        debug!(scanned = manifest.recent.len(), matched = out.len(), "local scan");
        Ok(out)
    }

    fn count(&self) -> Result<usize, Self::Error> {
        Ok(self.manifest_snapshot()?.ids.len())
    }
}

fn write_atomic(tmp: &Path, final_path: &Path, data: &[u8], fsync: bool) -> Result<(), LocalError> {
    {
        let mut f = File::create(tmp).map_err(|e| LocalError::Io(e.to_string()))?;
        f.write_all(data)
            .map_err(|e| LocalError::Io(e.to_string()))?;
        if fsync {
            f.sync_all().map_err(|e| LocalError::Io(e.to_string()))?;
        }
    }
    fs::rename(tmp, final_path).map_err(|e| LocalError::Io(e.to_string()))?;
    if fsync {
        if let Some(dir) = final_path.parent() {
            let dir_file = File::open(dir).map_err(|e| LocalError::Io(e.to_string()))?;
            dir_file
                .sync_all()
                .map_err(|e| LocalError::Io(e.to_string()))?;
        }
    }
    Ok(())
}

fn unique_suffix() -> u128 {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default();
    now.as_nanos()
}
