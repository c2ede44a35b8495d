use super::record::{Method, TransactionRecord};
use crate::error::Result;
use async_trait::async_trait;

/// Persistence for transaction records, keyed by `(token, method)`.
///
/// Saving never overwrites: a second record under the same key is appended
/// and becomes the one returned by [`RecordStore::find`].
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn save(&self, record: TransactionRecord) -> Result<()>;
    /// Latest record for the key, if any.
    async fn find(&self, token: &str, method: Method) -> Result<Option<TransactionRecord>>;
    /// Every record for a token, oldest first.
    async fn history(&self, token: &str) -> Result<Vec<TransactionRecord>>;
}

pub type RecordStoreBox = Box<dyn RecordStore>;

/// Raw HTTP reply from the gateway endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Outbound transport: one form-encoded POST per gateway call.
#[async_trait]
pub trait GatewayTransport: Send + Sync {
    async fn post(&self, url: &str, body: String) -> Result<HttpResponse>;
}

pub type GatewayTransportBox = Box<dyn GatewayTransport>;

/// Builds the absolute callback URLs the processor redirects back to.
pub trait CallbackUrlBuilder: Send + Sync {
    fn success_url(&self, basket_id: u64) -> String;
    fn fail_url(&self, basket_id: u64) -> String;
    fn update_url(&self, basket_id: u64) -> String;
}
