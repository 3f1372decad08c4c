//! Per-project mutual exclusion for pipeline invocations.
//!
//! Plan, apply and destroy touch the project's remote state, so at most one
//! of them may run per project at a time, across every process sharing the
//! ledger. Exclusion has two layers:
//!
//! - an in-process async mutex per project, so tasks of one pipeline queue
//!   up without polling the database;
//! - a lease row in the `project_locks` table, claimed by the mutex holder
//!   and polled for until free. Leases older than the stale bound are taken
//!   over, so a crashed process cannot block a project forever.
//!
//! The lease is released when the [`ProjectGuard`] is dropped.

use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use jiff::Timestamp;
use log::{debug, warn};
use tokio::{
    sync::{Mutex as AsyncMutex, OwnedMutexGuard},
    task,
};

use crate::{
    db::Database,
    error::{Result, StratusError},
};

/// Delay between attempts to claim a lease held elsewhere.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

static NEXT_HOLDER: AtomicU64 = AtomicU64::new(0);

/// Registry of per-project locks backed by the ledger database.
#[derive(Debug, Clone)]
pub struct ProjectLocks {
    db_path: PathBuf,
    stale_after: Duration,
    local: Arc<Mutex<HashMap<u64, Arc<AsyncMutex<()>>>>>,
}

/// Held for the duration of one pipeline invocation.
#[derive(Debug)]
pub struct ProjectGuard {
    project_id: u64,
    holder: String,
    db_path: PathBuf,
    _local: OwnedMutexGuard<()>,
}

impl ProjectGuard {
    pub fn project_id(&self) -> u64 {
        self.project_id
    }

    /// Lease token written to the `project_locks` row.
    pub fn holder(&self) -> &str {
        &self.holder
    }
}

impl Drop for ProjectGuard {
    fn drop(&mut self) {
        let released = Database::new(&self.db_path)
            .and_then(|mut db| db.release_project_lock(self.project_id, &self.holder));
        match released {
            Ok(true) => debug!("Released lock on project {}", self.project_id),
            Ok(false) => warn!(
                "Lock on project {} was taken over before release",
                self.project_id
            ),
            Err(e) => warn!("Failed to release lock on project {}: {e}", self.project_id),
        }
    }
}

impl ProjectLocks {
    /// Locks stored in the ledger at `db_path`. A lease older than
    /// `stale_after` is considered abandoned.
    pub fn new(db_path: impl Into<PathBuf>, stale_after: Duration) -> Self {
        Self {
            db_path: db_path.into(),
            stale_after,
            local: Arc::default(),
        }
    }

    /// Waits until the project's lock is free and takes it.
    pub async fn acquire(&self, project_id: u64) -> Result<ProjectGuard> {
        let local = self.local_lock(project_id).lock_owned().await;
        let holder = holder_token();

        let mut waited = false;
        while !self.claim(project_id, &holder).await? {
            if !waited {
                debug!("Project {project_id} is locked by another process, waiting");
                waited = true;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }

        Ok(self.guard(project_id, holder, local))
    }

    /// Takes the project's lock if nobody holds it.
    pub async fn try_acquire(&self, project_id: u64) -> Result<Option<ProjectGuard>> {
        let Ok(local) = self.local_lock(project_id).try_lock_owned() else {
            return Ok(None);
        };
        let holder = holder_token();
        if self.claim(project_id, &holder).await? {
            Ok(Some(self.guard(project_id, holder, local)))
        } else {
            Ok(None)
        }
    }

    /// Drops the in-process entry of a deleted project.
    pub fn forget(&self, project_id: u64) {
        self.local_map().remove(&project_id);
    }

    /// Number of projects with an in-process entry.
    pub fn tracked(&self) -> usize {
        self.local_map().len()
    }

    async fn claim(&self, project_id: u64, holder: &str) -> Result<bool> {
        let db_path = self.db_path.clone();
        let holder = holder.to_string();
        let stale_after = self.stale_after;
        task::spawn_blocking(move || {
            Database::new(&db_path)?.claim_project_lock(project_id, &holder, stale_after)
        })
        .await
        .map_err(StratusError::join)?
    }

    fn guard(&self, project_id: u64, holder: String, local: OwnedMutexGuard<()>) -> ProjectGuard {
        debug!("Locked project {project_id} as {holder}");
        ProjectGuard {
            project_id,
            holder,
            db_path: self.db_path.clone(),
            _local: local,
        }
    }

    fn local_lock(&self, project_id: u64) -> Arc<AsyncMutex<()>> {
        self.local_map()
            .entry(project_id)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    fn local_map(&self) -> std::sync::MutexGuard<'_, HashMap<u64, Arc<AsyncMutex<()>>>> {
        // Entries are plain handles, so a poisoned map is still consistent
        self.local
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Unique lease token: process id, start time and a per-process counter.
fn holder_token() -> String {
    format!(
        "{}:{}:{}",
        std::process::id(),
        Timestamp::now().as_millisecond(),
        NEXT_HOLDER.fetch_add(1, Ordering::Relaxed)
    )
}
