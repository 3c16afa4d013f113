//! Bank transaction sources
//!
//! [`TransactionSource`] is how the detector obtains a user's transaction
//! batch. [`PowensSource`] reads it from the Powens aggregator using the
//! credentials stored for the user.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::PowensConfig;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{Transaction, TransactionsResponse};

/// Longest aggregator error body kept in an error message
const MAX_ERROR_BODY: usize = 200;

/// Supplies one user's transaction batch
#[async_trait]
pub trait TransactionSource: Send + Sync {
    async fn fetch_transactions(&self, user_id: &str) -> Result<Vec<Transaction>>;
}

/// HTTP client for the Powens aggregator API
#[derive(Debug, Clone)]
pub struct PowensClient {
    http_client: Client,
    base_url: String,
    transaction_limit: u32,
}

impl PowensClient {
    pub fn new(config: &PowensConfig) -> Result<Self> {
        let http_client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            transaction_limit: config.transaction_limit,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Most recent transactions of an aggregator user
    pub async fn get_transactions(
        &self,
        powens_user_id: i64,
        access_token: &str,
    ) -> Result<Vec<Transaction>> {
        let response = self
            .http_client
            .get(format!("{}/users/{}/transactions", self.base_url, powens_user_id))
            .query(&[("limit", self.transaction_limit)])
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Aggregator {
                status: status.as_u16(),
                message: body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        let payload: TransactionsResponse = response.json().await?;
        debug!(
            powens_user_id,
            count = payload.transactions.len(),
            "Fetched transactions from Powens"
        );
        Ok(payload.transactions)
    }
}

/// Transaction source backed by the stored aggregator connection of each user
#[derive(Clone)]
pub struct PowensSource {
    client: PowensClient,
    db: Database,
}

impl PowensSource {
    pub fn new(client: PowensClient, db: Database) -> Self {
        Self { client, db }
    }
}

#[async_trait]
impl TransactionSource for PowensSource {
    async fn fetch_transactions(&self, user_id: &str) -> Result<Vec<Transaction>> {
        let connection = self
            .db
            .get_bank_connection(user_id)?
            .ok_or_else(|| Error::NotFound(format!("No bank connection for user {}", user_id)))?;

        self.client
            .get_transactions(connection.powens_user_id, &connection.access_token)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockPowensServer;

    fn client_for(server: &MockPowensServer) -> PowensClient {
        PowensClient::new(&PowensConfig {
            base_url: format!("{}/", server.url()),
            ..PowensConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_get_transactions_with_bearer_token() {
        let server = MockPowensServer::start().await;
        let client = client_for(&server);

        let txs = client
            .get_transactions(MockPowensServer::USER_ID, MockPowensServer::TOKEN)
            .await
            .unwrap();

        assert_eq!(txs.len(), 3);
        assert_eq!(txs[0].simplified_wording, "SPOTIFY PARIS");
        assert_eq!(server.last_limit(), Some(30));
    }

    #[tokio::test]
    async fn test_rejected_token_is_aggregator_error() {
        let server = MockPowensServer::start().await;
        let client = client_for(&server);

        let err = client
            .get_transactions(MockPowensServer::USER_ID, "expired")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Aggregator { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_source_uses_stored_connection() {
        let server = MockPowensServer::start().await;
        let db = Database::in_memory().unwrap();
        db.upsert_bank_connection("u1", MockPowensServer::USER_ID, MockPowensServer::TOKEN)
            .unwrap();
        let source = PowensSource::new(client_for(&server), db);

        assert_eq!(source.fetch_transactions("u1").await.unwrap().len(), 3);

        let missing = source.fetch_transactions("nobody").await.unwrap_err();
        assert!(matches!(missing, Error::NotFound(_)));
    }
}
