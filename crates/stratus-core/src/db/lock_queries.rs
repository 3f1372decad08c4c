//! Project lease rows shared by every process using the same ledger.

use std::time::Duration;

use jiff::Timestamp;
use rusqlite::{params, OptionalExtension, TransactionBehavior};

use crate::error::{DatabaseResultExt, Result};

const CLAIM_LOCK_SQL: &str = "INSERT INTO project_locks (project_id, holder, acquired_at_ms) VALUES (?1, ?2, ?3) \
     ON CONFLICT (project_id) DO UPDATE SET holder = excluded.holder, acquired_at_ms = excluded.acquired_at_ms \
     WHERE project_locks.acquired_at_ms < ?4";
const RELEASE_LOCK_SQL: &str = "DELETE FROM project_locks WHERE project_id = ?1 AND holder = ?2";
const SELECT_HOLDER_SQL: &str = "SELECT holder FROM project_locks WHERE project_id = ?1";

impl super::Database {
    /// Claims the project's lease for `holder`.
    ///
    /// Succeeds when no lease exists or the existing one is older than
    /// `stale_after`. Returns whether `holder` now owns the lease.
    pub fn claim_project_lock(
        &mut self,
        project_id: u64,
        holder: &str,
        stale_after: Duration,
    ) -> Result<bool> {
        let tx = self
            .connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .db_context("Failed to begin transaction")?;

        let now = Timestamp::now().as_millisecond();
        let stale_before = now.saturating_sub(i64::try_from(stale_after.as_millis()).unwrap_or(i64::MAX));
        let claimed = tx
            .execute(
                CLAIM_LOCK_SQL,
                params![project_id as i64, holder, now, stale_before],
            )
            .db_context("Failed to claim project lock")?;

        tx.commit().db_context("Failed to commit transaction")?;
        Ok(claimed > 0)
    }

    /// Releases the project's lease if `holder` still owns it. Returns
    /// whether a lease was removed.
    pub fn release_project_lock(&mut self, project_id: u64, holder: &str) -> Result<bool> {
        let removed = self
            .connection
            .execute(RELEASE_LOCK_SQL, params![project_id as i64, holder])
            .db_context("Failed to release project lock")?;
        Ok(removed > 0)
    }

    /// Current holder of the project's lease, if any.
    pub fn project_lock_holder(&self, project_id: u64) -> Result<Option<String>> {
        self.connection
            .query_row(SELECT_HOLDER_SQL, params![project_id as i64], |row| row.get(0))
            .optional()
            .db_context("Failed to query project lock")
    }
}
