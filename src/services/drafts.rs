// Post drafts and the editor's autosave indicator

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::infrastructure::database::ContentStore;
use crate::models::Draft;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AutosaveStatus {
    Dirty,
    Saved,
}

#[derive(Debug)]
struct TrackerState {
    generation: u64,
    status: AutosaveStatus,
}

/// Flips to `Saved` once `idle` passes without another `touch`.
#[derive(Debug, Clone)]
pub struct AutosaveTracker {
    idle: Duration,
    state: Arc<Mutex<TrackerState>>,
}

impl AutosaveTracker {
    pub fn new(idle: Duration) -> Self {
        Self {
            idle,
            state: Arc::new(Mutex::new(TrackerState {
                generation: 0,
                status: AutosaveStatus::Saved,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record an edit. Must be called from within a tokio runtime.
    pub fn touch(&self) {
        self.touch_then(|| {});
    }

    /// Like `touch`, running `on_saved` if this edit is the one that ends up saved.
    pub fn touch_then<F>(&self, on_saved: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let generation = {
            let mut state = self.lock();
            state.generation += 1;
            state.status = AutosaveStatus::Dirty;
            state.generation
        };

        let tracker = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(tracker.idle).await;
            let saved = {
                let mut state = tracker.lock();
                // A later touch owns the timer now.
                let current = state.generation == generation;
                if current {
                    state.status = AutosaveStatus::Saved;
                }
                current
            };
            if saved {
                on_saved();
            }
        });
    }

    fn same(&self, other: &AutosaveTracker) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    pub fn status(&self) -> AutosaveStatus {
        self.lock().status
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DraftInput {
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DraftView {
    #[serde(flatten)]
    pub draft: Draft,
    pub autosave: AutosaveStatus,
}

#[derive(Debug, Clone)]
struct TrackedDraft {
    owner_id: String,
    tracker: AutosaveTracker,
}

type TrackerMap = Arc<Mutex<HashMap<String, TrackedDraft>>>;

fn lock_trackers(trackers: &TrackerMap) -> MutexGuard<'_, HashMap<String, TrackedDraft>> {
    trackers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Drafts with unsaved edits are tracked; a draft leaves the map once it settles to `Saved`.
#[derive(Clone)]
pub struct DraftService {
    store: Arc<dyn ContentStore>,
    idle: Duration,
    trackers: TrackerMap,
}

impl DraftService {
    pub fn new(store: Arc<dyn ContentStore>, idle: Duration) -> Self {
        Self {
            store,
            idle,
            trackers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Mark the draft dirty and arm its idle timer. The map lock is held across the touch so
    /// eviction never races a fresh edit.
    fn touch(&self, owner_id: &str, draft_id: &str) -> AutosaveStatus {
        let mut trackers = lock_trackers(&self.trackers);
        let tracker = trackers
            .entry(draft_id.to_string())
            .or_insert_with(|| TrackedDraft {
                owner_id: owner_id.to_string(),
                tracker: AutosaveTracker::new(self.idle),
            })
            .tracker
            .clone();

        let map = Arc::clone(&self.trackers);
        let id = draft_id.to_string();
        let watched = tracker.clone();
        tracker.touch_then(move || {
            let mut trackers = lock_trackers(&map);
            let settled = trackers.get(&id).is_some_and(|tracked| {
                tracked.tracker.same(&watched) && tracked.tracker.status() == AutosaveStatus::Saved
            });
            if settled {
                trackers.remove(&id);
            }
        });
        tracker.status()
    }

    fn status(&self, draft_id: &str) -> AutosaveStatus {
        lock_trackers(&self.trackers)
            .get(draft_id)
            .map_or(AutosaveStatus::Saved, |tracked| tracked.tracker.status())
    }

    /// Drafts currently waiting out their idle timer.
    pub fn tracked(&self) -> usize {
        lock_trackers(&self.trackers).len()
    }

    /// Drop the autosave state of every draft owned by `user_id`.
    pub fn forget_owner(&self, user_id: &str) -> usize {
        let mut trackers = lock_trackers(&self.trackers);
        let before = trackers.len();
        trackers.retain(|_, tracked| tracked.owner_id != user_id);
        before - trackers.len()
    }

    /// Upsert the caller's draft. A new id is assigned when none is given.
    pub async fn save_draft(&self, user_id: &str, input: DraftInput) -> AppResult<DraftView> {
        let draft = Draft {
            id: input.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            user_id: user_id.to_string(),
            title: input.title,
            body: input.body,
            updated_at: Utc::now(),
        };
        self.store.upsert_draft(&draft).await?;

        let autosave = self.touch(user_id, &draft.id);
        debug!(draft_id = %draft.id, user_id, "Draft saved");

        Ok(DraftView { draft, autosave })
    }

    pub async fn get_draft(&self, user_id: &str, draft_id: &str) -> AppResult<DraftView> {
        let draft = self
            .store
            .get_draft(draft_id)
            .await?
            .filter(|draft| draft.user_id == user_id)
            .ok_or_else(|| AppError::NotFound(format!("Draft {} not found", draft_id)))?;

        Ok(DraftView {
            autosave: self.status(&draft.id),
            draft,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::sqlite_database::SqliteDatabase;

    #[tokio::test]
    async fn test_tracker_saves_after_idle_and_touch_resets() {
        let tracker = AutosaveTracker::new(Duration::from_millis(80));
        assert_eq!(tracker.status(), AutosaveStatus::Saved);

        tracker.touch();
        assert_eq!(tracker.status(), AutosaveStatus::Dirty);

        tokio::time::sleep(Duration::from_millis(50)).await;
        tracker.touch();
        tokio::time::sleep(Duration::from_millis(50)).await;
        // 100ms since the first touch but only 50ms since the second.
        assert_eq!(tracker.status(), AutosaveStatus::Dirty);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(tracker.status(), AutosaveStatus::Saved);
    }

    #[tokio::test]
    async fn test_drafts_are_private_to_their_owner() {
        let db = Arc::new(SqliteDatabase::new_in_memory().await.unwrap());
        let drafts = DraftService::new(db, Duration::from_millis(20));

        let saved = drafts
            .save_draft(
                "u1",
                DraftInput {
                    id: None,
                    title: "WIP".to_string(),
                    body: "# Heading".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(saved.autosave, AutosaveStatus::Dirty);

        let hijack = drafts
            .save_draft(
                "u2",
                DraftInput {
                    id: Some(saved.draft.id.clone()),
                    title: "mine now".to_string(),
                    body: String::new(),
                },
            )
            .await;
        assert!(matches!(hijack, Err(AppError::Forbidden(_))));
        assert!(matches!(
            drafts.get_draft("u2", &saved.draft.id).await,
            Err(AppError::NotFound(_))
        ));

        tokio::time::sleep(Duration::from_millis(60)).await;
        let view = drafts.get_draft("u1", &saved.draft.id).await.unwrap();
        assert_eq!(view.draft.title, "WIP");
        assert_eq!(view.autosave, AutosaveStatus::Saved);
    }

    #[tokio::test]
    async fn test_settled_drafts_leave_the_tracker_map() {
        let db = Arc::new(SqliteDatabase::new_in_memory().await.unwrap());
        let drafts = DraftService::new(db, Duration::from_millis(30));
        let input = |id: Option<String>| DraftInput {
            id,
            title: "WIP".to_string(),
            body: "text".to_string(),
        };

        let first = drafts.save_draft("u1", input(None)).await.unwrap();
        drafts.save_draft("u1", input(Some(first.draft.id.clone()))).await.unwrap();
        drafts.save_draft("u2", input(None)).await.unwrap();
        assert_eq!(drafts.tracked(), 2);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(drafts.tracked(), 0);
        let view = drafts.get_draft("u1", &first.draft.id).await.unwrap();
        assert_eq!(view.autosave, AutosaveStatus::Saved);
        assert_eq!(drafts.tracked(), 0);
    }

    #[tokio::test]
    async fn test_forget_owner_drops_only_their_drafts() {
        let db = Arc::new(SqliteDatabase::new_in_memory().await.unwrap());
        let drafts = DraftService::new(db, Duration::from_secs(60));
        let input = DraftInput {
            id: None,
            title: "WIP".to_string(),
            body: String::new(),
        };

        drafts.save_draft("u1", input.clone()).await.unwrap();
        drafts.save_draft("u1", input.clone()).await.unwrap();
        drafts.save_draft("u2", input).await.unwrap();

        assert_eq!(drafts.forget_owner("u1"), 2);
        assert_eq!(drafts.tracked(), 1);
        assert_eq!(drafts.forget_owner("u1"), 0);
    }
}
