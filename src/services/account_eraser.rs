// Account eraser - best-effort removal of a user's footprint across tables
//
// Each table is cleared by its own statement; a failure on one table is logged and
// recorded, and the sweep moves on. Only the account-record delete decides the outcome.

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::error::{AppError, AppResult};
use crate::infrastructure::auth::AuthService;
use crate::infrastructure::database::{ContentStore, UserTable};
use crate::services::drafts::DraftService;
use crate::services::preview_registry::PreviewRegistry;

/// Text the user must type to confirm deletion of their own account.
pub const DELETE_CONFIRMATION: &str = "DELETE";

#[derive(Debug, Clone, Serialize)]
pub struct TableOutcome {
    pub table: &'static str,
    pub deleted: u64,
    pub error: Option<String>,
}

impl TableOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErasureReport {
    pub user_id: String,
    pub tables: Vec<TableOutcome>,
    /// Whether a profile or credential row existed and was removed on this run.
    pub account_record_removed: bool,
    pub sessions_revoked: usize,
    pub previews_revoked: usize,
    /// Client-side delay before redirecting away from the deleted account.
    pub redirect_after_ms: u64,
}

impl ErasureReport {
    pub fn failed_tables(&self) -> Vec<&'static str> {
        self.tables
            .iter()
            .filter(|outcome| !outcome.is_ok())
            .map(|outcome| outcome.table)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.tables.iter().all(TableOutcome::is_ok)
    }
}

#[derive(Clone)]
pub struct AccountEraser {
    store: Arc<dyn ContentStore>,
    auth: AuthService,
    previews: PreviewRegistry,
    drafts: DraftService,
    redirect_after_ms: u64,
}

impl AccountEraser {
    pub fn new(
        store: Arc<dyn ContentStore>,
        auth: AuthService,
        previews: PreviewRegistry,
        drafts: DraftService,
        redirect_after_ms: u64,
    ) -> Self {
        Self {
            store,
            auth,
            previews,
            drafts,
            redirect_after_ms,
        }
    }

    /// Sweep every owned table, then the account record, then sign the user out.
    ///
    /// Safe to re-run after a partial failure: tables already emptied delete zero rows.
    /// Errors only when the account-record delete itself fails.
    #[instrument(skip(self))]
    pub async fn erase(&self, user_id: &str) -> AppResult<ErasureReport> {
        let mut tables = Vec::with_capacity(UserTable::ERASE_ORDER.len());

        for table in UserTable::ERASE_ORDER {
            let outcome = match self.store.delete_user_rows(table, user_id).await {
                Ok(deleted) => TableOutcome {
                    table: table.name(),
                    deleted,
                    error: None,
                },
                Err(e) => {
                    warn!(table = table.name(), user_id, error = %e, "Table delete failed, continuing");
                    TableOutcome {
                        table: table.name(),
                        deleted: 0,
                        error: Some(e.to_string()),
                    }
                }
            };
            tables.push(outcome);
        }

        let account_record_removed = self.store.delete_account_record(user_id).await?;

        let sessions_revoked = self.auth.sign_out_all(user_id).await;
        let previews_revoked = self.previews.revoke_owned_by(user_id);
        let drafts_untracked = self.drafts.forget_owner(user_id);

        let report = ErasureReport {
            user_id: user_id.to_string(),
            tables,
            account_record_removed,
            sessions_revoked,
            previews_revoked,
            redirect_after_ms: self.redirect_after_ms,
        };

        info!(
            user_id,
            account_record_removed,
            sessions_revoked,
            drafts_untracked,
            failed_tables = ?report.failed_tables(),
            "Account erasure finished"
        );
        Ok(report)
    }

    /// Self-service variant: validate, re-authenticate, then erase.
    pub async fn erase_with_password(
        &self,
        user_id: &str,
        password: &str,
        confirmation: &str,
    ) -> AppResult<ErasureReport> {
        if password.is_empty() {
            return Err(AppError::Validation("Password is required".to_string()));
        }
        if confirmation.trim() != DELETE_CONFIRMATION {
            return Err(AppError::Validation(format!(
                "Type {} to confirm account deletion",
                DELETE_CONFIRMATION
            )));
        }

        if !self.auth.verify_user_password(user_id, password).await? {
            warn!(user_id, "Re-authentication failed; nothing deleted");
            return Err(AppError::Unauthorized("Password is incorrect".to_string()));
        }

        self.erase(user_id).await
    }
}
