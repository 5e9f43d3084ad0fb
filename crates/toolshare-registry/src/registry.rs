use std::cmp::Reverse;
use std::sync::Arc;

use tokio::sync::Mutex;
use toolshare_ledger::{CommitReceipt, LedgerClient};
use toolshare_types::{Actor, ToolId, ToolInput, ToolRecord, ToolStatus};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::codec::{decode_tool, encode_tool};
use crate::error::{RegistryError, RegistryResult};
use crate::index::IndexManager;
use crate::keys::KeySpace;
use crate::lending::{self, ReturnPolicy};
use crate::seal::Sealer;

/// Entity-level view over the ledger.
///
/// Mutations issued through one `Registry` run one at a time behind an
/// async lock, which closes the index race between callers in this process.
/// Writers in other processes are not coordinated with.
pub struct Registry {
    ledger: Arc<dyn LedgerClient>,
    index: IndexManager,
    keys: KeySpace,
    sealer: Arc<dyn Sealer>,
    clock: Arc<dyn Clock>,
    policy: ReturnPolicy,
    write_lock: Mutex<()>,
}

impl Registry {
    /// Create a registry with the default key layout, system clock and
    /// owner-only returns.
    pub fn new(ledger: Arc<dyn LedgerClient>, sealer: Arc<dyn Sealer>) -> Self {
        let keys = KeySpace::default();
        Self {
            index: IndexManager::new(ledger.clone(), keys.index_key.clone()),
            ledger,
            keys,
            sealer,
            clock: Arc::new(SystemClock),
            policy: ReturnPolicy::default(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn with_key_space(mut self, keys: KeySpace) -> Self {
        self.index = IndexManager::new(self.ledger.clone(), keys.index_key.clone());
        self.keys = keys;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_return_policy(mut self, policy: ReturnPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn return_policy(&self) -> ReturnPolicy {
        self.policy
    }

    pub fn index(&self) -> &IndexManager {
        &self.index
    }

    /// All readable indexed tools, newest first.
    ///
    /// An unavailable ledger yields an empty list. Records that fail to load
    /// or decode are logged and skipped; ties on `timestamp` keep index order.
    pub async fn list_tools(&self) -> RegistryResult<Vec<ToolRecord>> {
        match self.ledger.is_available().await {
            Ok(true) => {}
            Ok(false) => {
                warn!("ledger reports unavailable; listing no tools");
                return Ok(Vec::new());
            }
            Err(e) => {
                warn!(error = %e, "availability probe failed; listing no tools");
                return Ok(Vec::new());
            }
        }

        let ids = self.index.list_keys().await?;
        let mut tools = Vec::with_capacity(ids.len());
        for id in &ids {
            let key = self.keys.record_key(id);
            let bytes = match self.ledger.get_data(&key).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(%key, error = %e, "failed to load tool; skipping");
                    continue;
                }
            };
            if bytes.is_empty() {
                warn!(%key, "indexed tool has no record; skipping");
                continue;
            }
            match decode_tool(id, &bytes) {
                Ok(tool) => tools.push(tool),
                Err(e) => warn!(%key, error = %e, "failed to decode tool; skipping"),
            }
        }

        tools.sort_by_key(|t| Reverse(t.timestamp));
        debug!(indexed = ids.len(), listed = tools.len(), "listed tools");
        Ok(tools)
    }

    /// Load a single tool.
    pub async fn get_tool(&self, id: &ToolId) -> RegistryResult<ToolRecord> {
        let key = self.keys.record_key(id);
        let bytes = self.ledger.get_data(&key).await?;
        if bytes.is_empty() {
            return Err(RegistryError::NotFound(id.clone()));
        }
        decode_tool(id, &bytes).map_err(|source| RegistryError::Decode { key, source })
    }

    /// Register a new tool owned by `owner` and return its id.
    ///
    /// The record is committed before its id is indexed.
    pub async fn create_tool(&self, input: &ToolInput, owner: &Actor) -> RegistryResult<ToolId> {
        if input.name.trim().is_empty() {
            return Err(RegistryError::Validation("tool name is required".into()));
        }
        if input.description.trim().is_empty() {
            return Err(RegistryError::Validation("tool description is required".into()));
        }

        self.ensure_available().await?;
        let payload = serde_json::to_value(input).map_err(crate::seal::SealError::from)?;
        let encrypted_data = self.sealer.seal(&payload).await?;

        let _guard = self.write_lock.lock().await;
        let now = self.clock.now_millis();
        let id = ToolId::generate(now);
        let record = ToolRecord {
            id: id.clone(),
            name: input.name.clone(),
            description: input.description.clone(),
            owner: owner.as_str().to_string(),
            status: ToolStatus::Available,
            encrypted_data,
            timestamp: now.div_euclid(1000),
        };

        let receipt = self.write_record(&record).await?;
        debug!(%id, %receipt, "tool record committed");
        self.index.append_key(&id).await?;
        info!(%id, owner = %owner, name = %record.name, "tool registered");
        Ok(id)
    }

    /// Mark `id` as borrowed by `actor`.
    pub async fn borrow_tool(&self, id: &ToolId, actor: &Actor) -> RegistryResult<ToolRecord> {
        self.ensure_available().await?;
        let _guard = self.write_lock.lock().await;
        let tool = self.get_tool(id).await?;
        let updated = lending::borrow(&tool, actor)?;
        self.write_record(&updated).await?;
        info!(%id, borrower = %actor, "tool borrowed");
        Ok(updated)
    }

    /// Mark `id` as returned, subject to the configured return policy.
    pub async fn return_tool(&self, id: &ToolId, actor: &Actor) -> RegistryResult<ToolRecord> {
        self.ensure_available().await?;
        let _guard = self.write_lock.lock().await;
        let tool = self.get_tool(id).await?;
        let updated = lending::return_tool(&tool, actor, self.policy)?;
        self.write_record(&updated).await?;
        info!(%id, actor = %actor, "tool returned");
        Ok(updated)
    }

    async fn ensure_available(&self) -> RegistryResult<()> {
        if self.ledger.is_available().await? {
            Ok(())
        } else {
            Err(RegistryError::Unavailable)
        }
    }

    /// Full overwrite of the record key; concurrent writers are not detected.
    async fn write_record(&self, record: &ToolRecord) -> RegistryResult<CommitReceipt> {
        let key = self.keys.record_key(&record.id);
        let bytes = encode_tool(record).map_err(|source| RegistryError::Encode {
            key: key.clone(),
            source,
        })?;
        self.ledger
            .set_data(&key, &bytes)
            .await
            .map_err(|source| RegistryError::WriteFailed { key, source })
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("keys", &self.keys)
            .field("policy", &self.policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::codec::decode_index;
    use crate::lending::TransitionError;
    use crate::seal::EnvelopeSealer;
    use async_trait::async_trait;
    use toolshare_ledger::{InMemoryLedger, LedgerError, LedgerResult};

    const START_MS: i64 = 1_700_000_000_000;

    struct Fixture {
        ledger: Arc<InMemoryLedger>,
        clock: Arc<ManualClock>,
        registry: Registry,
    }

    fn fixture() -> Fixture {
        let ledger = Arc::new(InMemoryLedger::new());
        let clock = Arc::new(ManualClock::new(START_MS));
        let registry = Registry::new(ledger.clone(), Arc::new(EnvelopeSealer))
            .with_clock(clock.clone());
        Fixture {
            ledger,
            clock,
            registry,
        }
    }

    fn actor(s: &str) -> Actor {
        Actor::new(s).unwrap()
    }

    /// Refuses writes to the index key only.
    struct IndexWriteFails(InMemoryLedger);

    #[async_trait]
    impl LedgerClient for IndexWriteFails {
        async fn is_available(&self) -> LedgerResult<bool> {
            self.0.is_available().await
        }

        async fn get_data(&self, key: &str) -> LedgerResult<Vec<u8>> {
            self.0.get_data(key).await
        }

        async fn set_data(&self, key: &str, value: &[u8]) -> LedgerResult<CommitReceipt> {
            if key == "tool_keys" {
                return Err(LedgerError::Backend("connection reset".into()));
            }
            self.0.set_data(key, value).await
        }
    }

    /// Fails reads of the keys passed to `fail_reads`.
    #[derive(Default)]
    struct ReadFails {
        inner: InMemoryLedger,
        failing: std::sync::Mutex<Vec<String>>,
    }

    impl ReadFails {
        fn fail_reads(&self, key: impl Into<String>) {
            self.failing.lock().unwrap().push(key.into());
        }
    }

    #[async_trait]
    impl LedgerClient for ReadFails {
        async fn is_available(&self) -> LedgerResult<bool> {
            self.inner.is_available().await
        }

        async fn get_data(&self, key: &str) -> LedgerResult<Vec<u8>> {
            if self.failing.lock().unwrap().iter().any(|k| k == key) {
                return Err(LedgerError::Backend("read timed out".into()));
            }
            self.inner.get_data(key).await
        }

        async fn set_data(&self, key: &str, value: &[u8]) -> LedgerResult<CommitReceipt> {
            self.inner.set_data(key, value).await
        }
    }

    #[tokio::test]
    async fn unreadable_record_is_skipped() {
        let ledger = Arc::new(ReadFails::default());
        let registry = Registry::new(ledger.clone(), Arc::new(EnvelopeSealer));
        let a = registry.create_tool(&ToolInput::new("Drill", "18V"), &actor("0xAAA")).await.unwrap();
        let b = registry.create_tool(&ToolInput::new("Saw", "hand"), &actor("0xAAA")).await.unwrap();

        ledger.fail_reads(format!("tool_{a}"));
        let tools = registry.list_tools().await.unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].id, b);
    }

    #[tokio::test]
    async fn failed_index_read_is_an_error() {
        let ledger = Arc::new(ReadFails::default());
        let registry = Registry::new(ledger.clone(), Arc::new(EnvelopeSealer));
        registry.create_tool(&ToolInput::new("Drill", "18V"), &actor("0xAAA")).await.unwrap();

        ledger.fail_reads("tool_keys");
        let err = registry.list_tools().await.unwrap_err();
        assert!(matches!(err, RegistryError::Ledger(LedgerError::Backend(_))));
    }

    #[tokio::test]
    async fn blank_index_entry_does_not_hide_tools() {
        let f = fixture();
        let a = f.registry.create_tool(&ToolInput::new("A", "a"), &actor("0xAAA")).await.unwrap();
        let b = f.registry.create_tool(&ToolInput::new("B", "b"), &actor("0xAAA")).await.unwrap();
        let raw = format!(r#"["{a}","","{b}"]"#);
        f.ledger.set_data("tool_keys", raw.as_bytes()).await.unwrap();

        assert_eq!(f.registry.list_tools().await.unwrap().len(), 2);
        f.registry.create_tool(&ToolInput::new("C", "c"), &actor("0xAAA")).await.unwrap();
        assert_eq!(f.registry.list_tools().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn mutations_on_unavailable_ledger_are_refused() {
        let f = fixture();
        let id = f.registry.create_tool(&ToolInput::new("Drill", "18V"), &actor("0xAAA")).await.unwrap();
        f.ledger.set_available(false);
        let writes = f.ledger.write_count();

        let err = f
            .registry
            .create_tool(&ToolInput::new("Saw", "hand"), &actor("0xAAA"))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Unavailable));
        let err = f.registry.borrow_tool(&id, &actor("0xBBB")).await.unwrap_err();
        assert!(matches!(err, RegistryError::Unavailable));
        let err = f.registry.return_tool(&id, &actor("0xAAA")).await.unwrap_err();
        assert!(matches!(err, RegistryError::Unavailable));
        assert_eq!(f.ledger.write_count(), writes);
    }

    #[tokio::test]
    async fn created_tools_list_newest_first() {
        let f = fixture();
        let mut ids = Vec::new();
        for name in ["Drill", "Saw", "Ladder"] {
            ids.push(
                f.registry
                    .create_tool(&ToolInput::new(name, "desc"), &actor("0xAAA"))
                    .await
                    .unwrap(),
            );
            f.clock.advance_secs(5);
        }

        let tools = f.registry.list_tools().await.unwrap();
        assert_eq!(tools.len(), 3);
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Ladder", "Saw", "Drill"]);
        assert!(tools.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
        assert_eq!(tools[2].id, ids[0]);
    }

    #[tokio::test]
    async fn equal_timestamps_keep_index_order() {
        let f = fixture();
        let a = f.registry.create_tool(&ToolInput::new("A", "a"), &actor("0xAAA")).await.unwrap();
        let b = f.registry.create_tool(&ToolInput::new("B", "b"), &actor("0xAAA")).await.unwrap();
        let tools = f.registry.list_tools().await.unwrap();
        assert_eq!(tools[0].id, a);
        assert_eq!(tools[1].id, b);
    }

    #[tokio::test]
    async fn new_tool_fields() {
        let f = fixture();
        let input = ToolInput::new("Drill", "18V").with_details("in the garage");
        let id = f.registry.create_tool(&input, &actor("0xAbC")).await.unwrap();
        assert!(id.as_str().starts_with("1700000000000-"));

        let tool = f.registry.get_tool(&id).await.unwrap();
        assert_eq!(tool.status, ToolStatus::Available);
        assert_eq!(tool.owner, "0xAbC");
        assert_eq!(tool.timestamp, 1_700_000_000);
        let opened = EnvelopeSealer.open(&tool.encrypted_data).await.unwrap();
        assert_eq!(opened["encryptedDetails"], "in the garage");
    }

    #[tokio::test]
    async fn create_writes_record_and_index() {
        let f = fixture();
        f.registry.create_tool(&ToolInput::new("Drill", "18V"), &actor("0xAAA")).await.unwrap();
        let keys = f.ledger.keys();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&"tool_keys".to_string()));
        let record_key = keys.iter().find(|k| *k != "tool_keys").unwrap();
        assert!(record_key.starts_with("tool_1700000000000-"));
    }

    #[tokio::test]
    async fn failed_index_write_leaves_unlisted_orphan() {
        let ledger = Arc::new(IndexWriteFails(InMemoryLedger::new()));
        let registry = Registry::new(ledger.clone(), Arc::new(EnvelopeSealer));
        let err = registry
            .create_tool(&ToolInput::new("Drill", "18V"), &actor("0xAAA"))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::WriteFailed { ref key, .. } if key == "tool_keys"));
        assert_eq!(ledger.0.len(), 1);
        assert!(registry.list_tools().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn validation_happens_before_any_write() {
        let f = fixture();
        for input in [ToolInput::new("", "desc"), ToolInput::new("Drill", "  ")] {
            let err = f.registry.create_tool(&input, &actor("0xAAA")).await.unwrap_err();
            assert!(matches!(err, RegistryError::Validation(_)));
        }
        assert_eq!(f.ledger.write_count(), 0);
    }

    #[tokio::test]
    async fn unavailable_ledger_lists_nothing() {
        let f = fixture();
        f.registry.create_tool(&ToolInput::new("Drill", "18V"), &actor("0xAAA")).await.unwrap();
        f.ledger.set_available(false);
        assert!(f.registry.list_tools().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_record_does_not_hide_others() {
        let f = fixture();
        let good = f.registry.create_tool(&ToolInput::new("Drill", "18V"), &actor("0xAAA")).await.unwrap();
        f.ledger.set_data("tool_broken", b"{\"name\":").await.unwrap();
        let mut ids = decode_index(&f.ledger.get_data("tool_keys").await.unwrap()).unwrap();
        ids.insert(0, ToolId::new("broken").unwrap());
        ids.push(ToolId::new("dangling").unwrap());
        f.ledger
            .set_data("tool_keys", &crate::codec::encode_index(&ids).unwrap())
            .await
            .unwrap();

        let tools = f.registry.list_tools().await.unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].id, good);
    }

    #[tokio::test]
    async fn get_tool_distinguishes_missing_from_corrupt() {
        let f = fixture();
        let missing = ToolId::new("nope").unwrap();
        assert!(matches!(
            f.registry.get_tool(&missing).await,
            Err(RegistryError::NotFound(ref id)) if *id == missing
        ));

        f.ledger.set_data("tool_bad", b"garbage").await.unwrap();
        let bad = ToolId::new("bad").unwrap();
        assert!(matches!(
            f.registry.get_tool(&bad).await,
            Err(RegistryError::Decode { .. })
        ));
    }

    #[tokio::test]
    async fn borrow_twice_is_refused() {
        let f = fixture();
        let id = f.registry.create_tool(&ToolInput::new("Drill", "18V"), &actor("0xAAA")).await.unwrap();
        let borrowed = f.registry.borrow_tool(&id, &actor("0xBBB")).await.unwrap();
        assert_eq!(borrowed.status, ToolStatus::Borrowed);

        let writes = f.ledger.write_count();
        let err = f.registry.borrow_tool(&id, &actor("0xCCC")).await.unwrap_err();
        assert!(matches!(
            err,
            RegistryError::IllegalTransition(TransitionError::NotAvailable(ToolStatus::Borrowed))
        ));
        assert_eq!(f.ledger.write_count(), writes);
    }

    #[tokio::test]
    async fn owner_borrow_is_refused_without_writing() {
        let f = fixture();
        let id = f.registry.create_tool(&ToolInput::new("Drill", "18V"), &actor("0xAAA")).await.unwrap();
        let writes = f.ledger.write_count();
        let err = f.registry.borrow_tool(&id, &actor("0xaaa")).await.unwrap_err();
        assert!(matches!(
            err,
            RegistryError::IllegalTransition(TransitionError::OwnerCannotBorrow)
        ));
        assert_eq!(f.ledger.write_count(), writes);
    }

    #[tokio::test]
    async fn borrow_keeps_immutable_fields() {
        let f = fixture();
        let id = f.registry.create_tool(&ToolInput::new("Drill", "18V"), &actor("0xAAA")).await.unwrap();
        let before = f.registry.get_tool(&id).await.unwrap();
        f.clock.advance_secs(60);
        f.registry.borrow_tool(&id, &actor("0xBBB")).await.unwrap();
        let after = f.registry.get_tool(&id).await.unwrap();
        assert_eq!(after, before.with_status(ToolStatus::Borrowed));
    }

    #[tokio::test]
    async fn return_respects_policy() {
        let f = fixture();
        let id = f.registry.create_tool(&ToolInput::new("Drill", "18V"), &actor("0xAAA")).await.unwrap();
        f.registry.borrow_tool(&id, &actor("0xBBB")).await.unwrap();

        let err = f.registry.return_tool(&id, &actor("0xBBB")).await.unwrap_err();
        assert!(matches!(err, RegistryError::IllegalTransition(TransitionError::NotOwner)));

        let back = f.registry.return_tool(&id, &actor("0xAAA")).await.unwrap();
        assert_eq!(back.status, ToolStatus::Available);

        let open = Registry::new(f.ledger.clone(), Arc::new(EnvelopeSealer))
            .with_return_policy(ReturnPolicy::AnyActor);
        open.borrow_tool(&id, &actor("0xBBB")).await.unwrap();
        let back = open.return_tool(&id, &actor("0xBBB")).await.unwrap();
        assert!(back.is_available());
    }

    #[tokio::test]
    async fn borrow_of_unknown_tool_is_not_found() {
        let f = fixture();
        let err = f
            .registry
            .borrow_tool(&ToolId::new("ghost").unwrap(), &actor("0xBBB"))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(_)));
    }

    #[tokio::test]
    async fn rejected_borrow_write_is_reported() {
        let f = fixture();
        let id = f.registry.create_tool(&ToolInput::new("Drill", "18V"), &actor("0xAAA")).await.unwrap();
        f.ledger.reject_writes("user rejected transaction");
        let err = f.registry.borrow_tool(&id, &actor("0xBBB")).await.unwrap_err();
        assert!(err.is_rejection());
        assert!(f.registry.get_tool(&id).await.unwrap().is_available());
    }

    #[tokio::test]
    async fn concurrent_creates_through_one_registry_all_survive() {
        let ledger = Arc::new(InMemoryLedger::new());
        let registry = Arc::new(Registry::new(ledger.clone(), Arc::new(EnvelopeSealer)));
        let mut set = tokio::task::JoinSet::new();
        for i in 0..8 {
            let registry = registry.clone();
            set.spawn(async move {
                let owner = Actor::new("0xAAA").unwrap();
                registry.create_tool(&ToolInput::new(format!("tool {i}"), "d"), &owner).await
            });
        }
        while let Some(res) = set.join_next().await {
            res.unwrap().unwrap();
        }
        assert_eq!(registry.index().list_keys().await.unwrap().len(), 8);
        assert_eq!(registry.list_tools().await.unwrap().len(), 8);
    }
}
