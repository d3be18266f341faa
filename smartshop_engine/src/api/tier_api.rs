use std::fmt::Debug;

use log::trace;

use crate::{
    db_types::Client,
    traits::{ShopDatabase, ShopError},
};

/// `TierApi` re-derives a client's loyalty tier from their persisted lifetime stats. Idempotent; calling it twice
/// in a row changes nothing the second time.
pub struct TierApi<B> {
    db: B,
}

impl<B> Debug for TierApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TierApi")
    }
}

impl<B> TierApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> TierApi<B>
where B: ShopDatabase
{
    pub async fn fetch_client(&self, client_id: i64) -> Result<Client, ShopError> {
        self.db.fetch_client(client_id).await
    }

    /// Recomputes and persists the client's tier from their aggregate stats. Returns the updated client record.
    pub async fn recalculate_tier(&self, client_id: i64) -> Result<Client, ShopError> {
        let client = self.db.recalculate_tier(client_id).await?;
        trace!("🔄️ Client #{client_id} is {} after recalculation", client.tier);
        Ok(client)
    }
}
