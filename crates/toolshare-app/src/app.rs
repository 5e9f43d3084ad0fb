use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::watch;
use toolshare_ledger::LedgerClient;
use toolshare_registry::{available_actions, Registry, RegistryError, Sealer, Transition};
use toolshare_types::{Actor, ToolId, ToolInput, ToolRecord};
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::signer::SignerProvider;
use crate::state::{filter_tools, AppState, ToolStats};
use crate::tracker::TransactionTracker;

const ADD_PENDING: &str = "Encrypting tool details with FHE...";
const ADD_SUCCESS: &str = "Tool added securely with FHE encryption!";
const ADD_FAILED: &str = "Submission failed";
const BORROW_PENDING: &str = "Processing encrypted borrowing request with FHE...";
const BORROW_SUCCESS: &str = "FHE borrowing completed successfully!";
const BORROW_FAILED: &str = "Borrowing failed";
const RETURN_PENDING: &str = "Processing encrypted return with FHE...";
const RETURN_SUCCESS: &str = "FHE return completed successfully!";
const RETURN_FAILED: &str = "Return failed";
const REJECTED: &str = "Transaction rejected by user";

/// Application facade.
///
/// Every mutating operation follows the same sequence: require a connected
/// account, mark the tracker pending, run the registry operation, settle the
/// tracker, then relist from the ledger whether the operation succeeded or
/// not.
pub struct ToolShare {
    registry: Registry,
    tracker: TransactionTracker,
    state: RwLock<AppState>,
    account: Mutex<Option<watch::Receiver<Option<Actor>>>>,
}

impl ToolShare {
    pub fn new(registry: Registry, tracker: TransactionTracker) -> Self {
        Self {
            registry,
            tracker,
            state: RwLock::new(AppState::default()),
            account: Mutex::new(None),
        }
    }

    /// Wire a registry and tracker from configuration.
    pub fn from_config(
        config: &AppConfig,
        ledger: Arc<dyn LedgerClient>,
        sealer: Arc<dyn Sealer>,
    ) -> Self {
        let registry = Registry::new(ledger, sealer)
            .with_key_space(config.keys.clone())
            .with_return_policy(config.return_policy);
        Self::new(registry, TransactionTracker::new(&config.tracker))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn tracker(&self) -> &TransactionTracker {
        &self.tracker
    }

    /// Connect a wallet and follow its account changes.
    pub async fn connect(&self, provider: &dyn SignerProvider) -> AppResult<Actor> {
        let rx = provider.subscribe();
        let actor = provider.connect().await?;
        info!(account = %actor, "wallet connected");
        if let Ok(mut slot) = self.account.lock() {
            *slot = Some(rx);
        }
        Ok(actor)
    }

    pub fn disconnect(&self) {
        if let Ok(mut slot) = self.account.lock() {
            *slot = None;
        }
        info!("wallet disconnected");
    }

    /// The currently connected account, following wallet switches.
    pub fn account(&self) -> Option<Actor> {
        let slot = self.account.lock().ok()?;
        slot.as_ref().and_then(|rx| rx.borrow().clone())
    }

    /// Current state snapshot.
    pub fn snapshot(&self) -> AppState {
        let mut state = self.state.read().map(|s| s.clone()).unwrap_or_default();
        state.account = self.account();
        state
    }

    pub fn search(&self, term: &str) -> Vec<ToolRecord> {
        let state = self.snapshot();
        filter_tools(&state.tools, term).into_iter().cloned().collect()
    }

    pub fn stats(&self) -> ToolStats {
        self.snapshot().stats()
    }

    /// What the connected account may do with `tool`.
    pub fn actions_for(&self, tool: &ToolRecord) -> Vec<Transition> {
        match self.account() {
            Some(actor) => available_actions(tool, &actor, self.registry.return_policy()),
            None => Vec::new(),
        }
    }

    /// Relist from the ledger and replace the cached tool list.
    ///
    /// On failure the previous list is kept.
    pub async fn refresh(&self) -> AppResult<Vec<ToolRecord>> {
        self.set_refreshing(true);
        let result = self.registry.list_tools().await;
        match &result {
            Ok(tools) => {
                if let Ok(mut state) = self.state.write() {
                    state.tools = tools.clone();
                }
            }
            Err(e) => error!(error = %e, "failed to load tools"),
        }
        self.set_refreshing(false);
        Ok(result?)
    }

    pub async fn add_tool(&self, input: &ToolInput) -> AppResult<ToolId> {
        let actor = self.require_account()?;
        self.tracker.begin(ADD_PENDING);
        let result = self.registry.create_tool(input, &actor).await;
        self.settle(&result, ADD_SUCCESS, ADD_FAILED).await;
        Ok(result?)
    }

    pub async fn borrow_tool(&self, id: &ToolId) -> AppResult<ToolRecord> {
        let actor = self.require_account()?;
        self.tracker.begin(BORROW_PENDING);
        let result = self.registry.borrow_tool(id, &actor).await;
        self.settle(&result, BORROW_SUCCESS, BORROW_FAILED).await;
        Ok(result?)
    }

    pub async fn return_tool(&self, id: &ToolId) -> AppResult<ToolRecord> {
        let actor = self.require_account()?;
        self.tracker.begin(RETURN_PENDING);
        let result = self.registry.return_tool(id, &actor).await;
        self.settle(&result, RETURN_SUCCESS, RETURN_FAILED).await;
        Ok(result?)
    }

    fn require_account(&self) -> AppResult<Actor> {
        self.account().ok_or(AppError::NotConnected)
    }

    fn set_refreshing(&self, refreshing: bool) {
        if let Ok(mut state) = self.state.write() {
            state.refreshing = refreshing;
        }
    }

    async fn settle<T>(&self, result: &Result<T, RegistryError>, success: &str, failure: &str) {
        match result {
            Ok(_) => self.tracker.succeed(success),
            Err(e) => {
                warn!(error = %e, "{failure}");
                let message = if e.is_rejection() {
                    REJECTED.to_string()
                } else {
                    format!("{failure}: {e}")
                };
                self.tracker.fail(message);
            }
        }
        // Reconcile with the ledger after every attempt, successful or not.
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "reconciling relist failed");
        }
    }
}

impl std::fmt::Debug for ToolShare {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolShare")
            .field("registry", &self.registry)
            .field("account", &self.account())
            .finish()
    }
}
