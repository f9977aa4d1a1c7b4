//! The write-hook entry point: turns a lease-record write event into a
//! deduplicated job enqueue. Takes the acting user id as an explicit
//! argument rather than pulling it from thread-local request state.

use std::time::Duration;

use tracing::debug;

use lade_core::model::{LeaseId, WorkflowJob};
use lade_core::traits::DedupStore;

/// Fields the job runner itself writes back to a lease. A write whose
/// changed-field set is entirely a subset of this list was caused by the
/// task's own prior run, not new upstream data, and must not re-trigger it.
pub const TASK_MANAGED_FIELDS: &[&str] = &["runsheet_archive", "runsheet_link", "runsheet_report_found"];

/// How long a dedup key blocks a second enqueue for the same (task, lease).
pub const DEDUP_TTL: Duration = Duration::from_secs(120);

/// Called from the upstream write hook with the identity of the user whose
/// request caused the write, if any, and the set of fields that changed.
///
/// Returns `true` if a job was enqueued, `false` if the event was dropped
/// (no user context, an entirely task-managed change set, or a duplicate
/// within the dedup window).
pub async fn on_lease_write<D: DedupStore>(
    dedup: &D,
    sender: &async_channel::Sender<WorkflowJob>,
    task_name: &str,
    lease_id: &LeaseId,
    user_id: Option<&str>,
    changed_fields: &[String],
) -> bool {
    let Some(user_id) = user_id else {
        debug!(%lease_id, task = task_name, "write hook fired with no user context, dropping quietly");
        return false;
    };

    if !changed_fields.is_empty()
        && changed_fields.iter().all(|f| TASK_MANAGED_FIELDS.contains(&f.as_str()))
    {
        debug!(%lease_id, task = task_name, "change set is entirely task-managed fields, not re-triggering");
        return false;
    }

    let dedup_key = WorkflowJob::dedup_key_for(task_name, lease_id);
    if !dedup.try_acquire(&dedup_key, DEDUP_TTL).await {
        debug!(%lease_id, task = task_name, "duplicate enqueue collapsed within dedup window");
        return false;
    }

    let job = WorkflowJob {
        task_name: task_name.to_string(),
        lease_id: lease_id.clone(),
        user_id: user_id.to_string(),
        attempt: 1,
        enqueued_at: chrono::Utc::now(),
        dedup_key,
        not_before: chrono::Utc::now(),
    };

    sender.send(job).await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lade_persistence::dedup::InMemoryDedupStore;

    fn lease_id() -> LeaseId {
        LeaseId::new("NMSLO", "12345")
    }

    #[tokio::test]
    async fn no_user_id_drops_quietly() {
        let dedup = InMemoryDedupStore::new();
        let (tx, rx) = async_channel::unbounded();
        let enqueued = on_lease_write(&dedup, &tx, "full_discovery", &lease_id(), None, &[]).await;
        assert!(!enqueued);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn task_managed_field_only_change_does_not_enqueue() {
        let dedup = InMemoryDedupStore::new();
        let (tx, rx) = async_channel::unbounded();
        let fields = vec!["runsheet_archive".to_string(), "runsheet_link".to_string()];
        let enqueued =
            on_lease_write(&dedup, &tx, "full_discovery", &lease_id(), Some("user-1"), &fields).await;
        assert!(!enqueued);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn upstream_field_change_enqueues_with_expected_dedup_key() {
        let dedup = InMemoryDedupStore::new();
        let (tx, rx) = async_channel::unbounded();
        let fields = vec!["status".to_string()];
        let enqueued =
            on_lease_write(&dedup, &tx, "full_discovery", &lease_id(), Some("user-1"), &fields).await;
        assert!(enqueued);
        let job = rx.try_recv().unwrap();
        assert_eq!(job.dedup_key, "dedup:task:full_discovery:lease:NMSLO/12345");
        assert_eq!(job.attempt, 1);
    }

    #[tokio::test]
    async fn duplicate_enqueue_within_dedup_window_is_dropped() {
        let dedup = InMemoryDedupStore::new();
        let (tx, rx) = async_channel::unbounded();
        let fields = vec!["status".to_string()];
        assert!(on_lease_write(&dedup, &tx, "full_discovery", &lease_id(), Some("user-1"), &fields).await);
        assert!(!on_lease_write(&dedup, &tx, "full_discovery", &lease_id(), Some("user-1"), &fields).await);
        assert_eq!(rx.len(), 1);
    }

    #[tokio::test]
    async fn mixed_change_set_with_task_and_upstream_fields_still_enqueues() {
        let dedup = InMemoryDedupStore::new();
        let (tx, rx) = async_channel::unbounded();
        let fields = vec!["runsheet_archive".to_string(), "status".to_string()];
        let enqueued =
            on_lease_write(&dedup, &tx, "full_discovery", &lease_id(), Some("user-1"), &fields).await;
        assert!(enqueued);
        assert_eq!(rx.len(), 1);
    }
}
