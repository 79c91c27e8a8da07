use chrono::{DateTime, Utc};

use crate::{ListQuery, Record, ResultEngine, Summary};

use super::Engine;

impl Engine {
    /// Records matching the already-validated list query.
    pub async fn list(&self, query: &ListQuery) -> ResultEngine<Vec<Record>> {
        self.store.list(query).await
    }

    /// Records whose name or notes contain `needle`.
    pub async fn search(&self, needle: &str) -> ResultEngine<Vec<Record>> {
        self.store.search(needle).await
    }

    pub async fn record(&self, id: i64) -> ResultEngine<Record> {
        self.store.get(id).await
    }

    pub async fn summary(&self) -> ResultEngine<Summary> {
        self.summary_at(Utc::now()).await
    }

    /// Summary with an explicit notion of "now", which picks the current month.
    pub async fn summary_at(&self, now: DateTime<Utc>) -> ResultEngine<Summary> {
        self.store.summary(now).await
    }
}
