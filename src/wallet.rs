//! Wallet session state
//!
//! Explicit, injected replacement for an ambient "manually disconnected"
//! storage flag: the session remembers who is connected and whether the
//! user chose to disconnect, which suppresses automatic reconnects.

use std::sync::{PoisonError, RwLock};

use serde::Serialize;
use tracing::{info, warn};

use crate::infra::{AuthodoxError, Result, WalletProvider};

/// A connected wallet account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedWallet {
    pub address: String,
    /// Chain id observed at connect time
    pub chain_id: u64,
}

#[derive(Debug, Default)]
struct SessionState {
    connected: Option<ConnectedWallet>,
    manually_disconnected: bool,
}

/// Snapshot of the session for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub is_connected: bool,
    pub wallet: Option<ConnectedWallet>,
    pub manually_disconnected: bool,
}

#[derive(Debug, Default)]
pub struct WalletSession {
    state: RwLock<SessionState>,
}

impl WalletSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a persisted manual-disconnect preference.
    pub fn with_manual_disconnect(manually_disconnected: bool) -> Self {
        Self {
            state: RwLock::new(SessionState {
                connected: None,
                manually_disconnected,
            }),
        }
    }

    /// Explicitly connect: request account access and record the network.
    /// Clears the manual-disconnect flag.
    pub async fn connect(&self, provider: &dyn WalletProvider) -> Result<ConnectedWallet> {
        let accounts = provider.request_accounts().await?;
        let address = accounts
            .into_iter()
            .next()
            .ok_or_else(|| AuthodoxError::InvalidInput("Wallet returned no accounts".to_string()))?;
        let chain_id = provider.chain_id().await?;

        let wallet = ConnectedWallet { address, chain_id };
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.connected = Some(wallet.clone());
            state.manually_disconnected = false;
        }

        info!(address = %wallet.address, chain_id, "Wallet connected");
        Ok(wallet)
    }

    /// Disconnect and remember that the user asked for it.
    pub fn disconnect(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.connected = None;
        state.manually_disconnected = true;
        info!("Wallet disconnected by user");
    }

    pub fn is_manually_disconnected(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .manually_disconnected
    }

    /// Reconnect without prompting if the provider already authorised an
    /// account, unless the user disconnected manually.
    pub async fn restore(&self, provider: &dyn WalletProvider) -> Result<Option<ConnectedWallet>> {
        if self.is_manually_disconnected() {
            info!("Skipping wallet auto-reconnect: manually disconnected");
            return Ok(None);
        }

        let accounts = provider.accounts().await?;
        let Some(address) = accounts.into_iter().next() else {
            return Ok(None);
        };
        let chain_id = provider.chain_id().await?;

        let wallet = ConnectedWallet { address, chain_id };
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .connected = Some(wallet.clone());

        info!(address = %wallet.address, chain_id, "Wallet session restored");
        Ok(Some(wallet))
    }

    /// React to the provider reporting a new account list.
    pub fn accounts_changed(&self, accounts: &[String]) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        match accounts.first() {
            Some(address) if !state.manually_disconnected => {
                if let Some(wallet) = state.connected.as_mut() {
                    wallet.address = address.clone();
                }
            }
            _ => {
                warn!("Wallet accounts cleared; disconnecting");
                state.connected = None;
                state.manually_disconnected = true;
            }
        }
    }

    pub fn current(&self) -> Option<ConnectedWallet> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .connected
            .clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        SessionSnapshot {
            is_connected: state.connected.is_some(),
            wallet: state.connected.clone(),
            manually_disconnected: state.manually_disconnected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::MockWalletProvider;

    fn provider(accounts: Vec<&'static str>, chain_id: u64) -> MockWalletProvider {
        let mut provider = MockWalletProvider::new();
        let requested: Vec<String> = accounts.iter().map(|s| s.to_string()).collect();
        let passive = requested.clone();
        provider
            .expect_request_accounts()
            .returning(move || Ok(requested.clone()));
        provider.expect_accounts().returning(move || Ok(passive.clone()));
        provider.expect_chain_id().returning(move || Ok(chain_id));
        provider
    }

    #[tokio::test]
    async fn test_connect_clears_manual_flag() {
        let session = WalletSession::with_manual_disconnect(true);
        let wallet = session.connect(&provider(vec!["0xA"], 80002)).await.unwrap();

        assert_eq!(wallet.address, "0xA");
        assert_eq!(wallet.chain_id, 80002);
        assert!(!session.is_manually_disconnected());
        assert_eq!(session.current(), Some(wallet));
    }

    #[tokio::test]
    async fn test_connect_without_accounts_fails() {
        let session = WalletSession::new();
        let err = session.connect(&provider(vec![], 80002)).await.unwrap_err();
        assert!(matches!(err, AuthodoxError::InvalidInput(_)));
        assert!(session.current().is_none());
    }

    #[tokio::test]
    async fn test_restore_respects_manual_disconnect() {
        let session = WalletSession::new();
        session.connect(&provider(vec!["0xA"], 80002)).await.unwrap();
        session.disconnect();
        assert!(session.current().is_none());
        assert!(session.is_manually_disconnected());

        let mut never = MockWalletProvider::new();
        never.expect_accounts().never();
        assert!(session.restore(&never).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_restore_uses_authorised_account() {
        let session = WalletSession::new();
        let restored = session.restore(&provider(vec!["0xB"], 1)).await.unwrap();
        assert_eq!(restored.map(|w| w.address), Some("0xB".to_string()));
        assert!(session.snapshot().is_connected);
    }

    #[tokio::test]
    async fn test_accounts_changed() {
        let session = WalletSession::new();
        session.connect(&provider(vec!["0xA"], 80002)).await.unwrap();

        session.accounts_changed(&["0xC".to_string()]);
        assert_eq!(session.current().map(|w| w.address), Some("0xC".to_string()));

        session.accounts_changed(&[]);
        assert!(session.current().is_none());
        assert!(session.is_manually_disconnected());
    }
}
