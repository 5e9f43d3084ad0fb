use async_trait::async_trait;
use tokio::sync::watch;
use toolshare_types::{Actor, TypeError};
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    #[error("wallet account is not usable: {0}")]
    InvalidAccount(#[from] TypeError),
}

/// Wallet connection collaborator.
///
/// `connect` asks the wallet for its current account. `subscribe` reports
/// later account switches and disconnects (`None`).
#[async_trait]
pub trait SignerProvider: Send + Sync {
    async fn connect(&self) -> Result<Actor, SignerError>;

    fn subscribe(&self) -> watch::Receiver<Option<Actor>>;
}

/// Signer with a fixed, locally chosen account.
///
/// Used by the command-line client (`--as`) and tests. The account can be
/// switched or dropped to exercise account-change handling.
#[derive(Debug)]
pub struct StaticSigner {
    account: Actor,
    current: watch::Sender<Option<Actor>>,
}

impl StaticSigner {
    pub fn new(account: Actor) -> Self {
        let (current, _) = watch::channel(None);
        Self { account, current }
    }

    /// Signer for a raw address, as given on the command line.
    pub fn parse(address: &str) -> Result<Self, SignerError> {
        Ok(Self::new(Actor::new(address.trim())?))
    }

    pub fn switch_account(&self, account: Actor) {
        info!(account = %account, "account changed");
        self.current.send_replace(Some(account));
    }

    pub fn disconnect(&self) {
        self.current.send_replace(None);
    }
}

#[async_trait]
impl SignerProvider for StaticSigner {
    async fn connect(&self) -> Result<Actor, SignerError> {
        self.current.send_replace(Some(self.account.clone()));
        Ok(self.account.clone())
    }

    fn subscribe(&self) -> watch::Receiver<Option<Actor>> {
        self.current.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(s: &str) -> Actor {
        Actor::new(s).unwrap()
    }

    #[tokio::test]
    async fn connect_publishes_account() {
        let signer = StaticSigner::new(actor("0xAAA"));
        let rx = signer.subscribe();
        assert!(rx.borrow().is_none());
        assert_eq!(signer.connect().await.unwrap(), actor("0xAAA"));
        assert_eq!(*rx.borrow(), Some(actor("0xaaa")));
    }

    #[tokio::test]
    async fn parse_rejects_blank_addresses() {
        assert!(matches!(
            StaticSigner::parse("   "),
            Err(SignerError::InvalidAccount(TypeError::EmptyActor))
        ));
        let signer = StaticSigner::parse(" 0xAAA ").unwrap();
        assert_eq!(signer.connect().await.unwrap().as_str(), "0xAAA");
    }

    #[tokio::test]
    async fn switches_and_disconnects_are_observed() {
        let signer = StaticSigner::new(actor("0xAAA"));
        signer.connect().await.unwrap();
        let mut rx = signer.subscribe();

        signer.switch_account(actor("0xBBB"));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), Some(actor("0xBBB")));

        signer.disconnect();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_none());
    }
}
