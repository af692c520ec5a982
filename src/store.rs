// src/store.rs
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Durable set of event ids that have already been announced.
///
/// The store is the sole writer of its backing file (a JSON array of string
/// ids). Ids are never evicted: once an event is marked sent it stays sent
/// for the lifetime of the file. Growth is bounded in practice by the finite
/// number of events the source ever lists.
#[derive(Debug)]
pub struct SentStore {
    path: PathBuf,
    ids: HashSet<String>,
}

impl SentStore {
    /// Read persisted state. An absent file is a fresh empty store; an
    /// unreadable or corrupt file is logged and treated as empty for this
    /// cycle, and gets replaced wholesale by the next successful `save`.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let ids = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(list) => list.into_iter().collect(),
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "sent-event store is corrupt, starting from an empty set"
                    );
                    HashSet::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashSet::new(),
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "sent-event store unreadable, starting from an empty set"
                );
                HashSet::new()
            }
        };
        Self { path, ids }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// In-memory only; nothing is durable until `save` succeeds.
    /// Returns true when the id was not present before.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Atomically replace the backing file with the current set.
    ///
    /// The set is written to a sibling temp file, flushed to disk, then
    /// renamed over the target as the single indivisible step. A crash at
    /// any point leaves the previous file byte-identical; on error the temp
    /// file is removed, the target untouched, and the caller must not treat
    /// the in-memory state as durable.
    pub fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("creating {}", dir.display()))?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        let result = self.write_tmp(&tmp).and_then(|()| {
            fs::rename(&tmp, &self.path)
                .with_context(|| format!("replacing {}", self.path.display()))
        });
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result
    }

    fn write_tmp(&self, tmp: &Path) -> Result<()> {
        // Sorted output keeps saves deterministic; ordering carries no meaning.
        let mut ids: Vec<&String> = self.ids.iter().collect();
        ids.sort();
        let json = serde_json::to_string(&ids).context("serializing sent-event set")?;

        let mut f = fs::File::create(tmp)
            .with_context(|| format!("creating {}", tmp.display()))?;
        f.write_all(json.as_bytes())
            .with_context(|| format!("writing {}", tmp.display()))?;
        f.sync_all()
            .with_context(|| format!("flushing {}", tmp.display()))?;
        Ok(())
    }
}
