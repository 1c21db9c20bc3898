use std::{collections::BTreeMap, fmt::Debug, sync::Arc};

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{State, TransactionContext};

/// Storage for transaction contexts parked between the two phases, for example while the user
/// is being asked for their passcode.
#[async_trait]
pub trait ContextStore: Debug + Send + Sync {
    /// Park a context. Returns the handle to take it back with.
    async fn park(&self, ctx: TransactionContext) -> Result<Uuid>;

    /// State of a parked context.
    async fn state(&self, uuid: Uuid) -> Result<State>;

    /// Take a parked context out of the store.
    async fn take(&self, uuid: Uuid) -> Result<TransactionContext>;

    /// Cancel and drop a parked context.
    async fn remove(&self, uuid: Uuid) -> Result<()>;
}

/// A local in-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    store: Arc<Mutex<BTreeMap<Uuid, TransactionContext>>>,
}

#[async_trait]
impl ContextStore for MemoryStore {
    async fn park(&self, ctx: TransactionContext) -> Result<Uuid> {
        let uuid = Uuid::new_v4();
        self.store.lock().await.insert(uuid, ctx);
        Ok(uuid)
    }

    async fn state(&self, uuid: Uuid) -> Result<State> {
        if let Some(ctx) = self.store.lock().await.get(&uuid) {
            return Ok(ctx.state());
        }

        bail!("transaction context not found")
    }

    async fn take(&self, uuid: Uuid) -> Result<TransactionContext> {
        if let Some(ctx) = self.store.lock().await.remove(&uuid) {
            return Ok(ctx);
        }

        bail!("transaction context not found")
    }

    async fn remove(&self, uuid: Uuid) -> Result<()> {
        if let Some(mut ctx) = self.store.lock().await.remove(&uuid) {
            ctx.reset();
            return Ok(());
        }

        bail!("transaction context not found")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn park_and_take() {
        let store = MemoryStore::default();
        let mut ctx = TransactionContext::new();
        ctx.transition(State::Tokenized);
        ctx.tx_id = "tx-1".into();

        let uuid = store.park(ctx).await.unwrap();
        assert_eq!(store.state(uuid).await.unwrap(), State::Tokenized);

        let ctx = store.take(uuid).await.unwrap();
        assert_eq!(ctx.tx_id(), "tx-1");
        assert!(store.take(uuid).await.is_err());
    }

    #[tokio::test]
    async fn remove_cancels_pending_calls() {
        let store = MemoryStore::default();
        let ctx = TransactionContext::new();
        let token = ctx.cancellation_token().clone();

        let uuid = store.park(ctx).await.unwrap();
        store.remove(uuid).await.unwrap();

        assert!(token.is_cancelled());
        assert!(store.state(uuid).await.is_err());
    }
}
