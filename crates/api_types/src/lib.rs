use serde::{Deserialize, Serialize};

pub mod record {
    use std::collections::BTreeMap;

    use chrono::{DateTime, Utc};
    use serde_json::Value;

    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Record {
        pub id: i64,
        pub name: String,
        /// Minor units; negative values are outflows.
        pub amount: i64,
        pub date: DateTime<Utc>,
        pub notes: Option<String>,
        /// Receipt locator, empty when the record has none.
        pub attachment: String,
    }

    /// Query string of `GET /record/list`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ListParams {
        #[serde(rename = "type")]
        pub kind: Option<String>,
        pub order_by: Option<String>,
        pub limit: Option<String>,
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Summary {
        /// Records dated in the current month.
        pub number_of_records: u64,
        pub balance: i64,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct FieldChange {
        pub old: Value,
        pub new: Value,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RecordUpdated {
        pub message: String,
        pub updated: BTreeMap<String, FieldChange>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub warning: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RecordDeleted {
        pub message: String,
        pub deleted: Record,
    }
}

pub mod ping {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Pong {
        pub text: String,
        /// Caller address, from `X-Forwarded-For` when present.
        pub ip: Option<String>,
    }
}

pub mod error {
    use super::*;

    /// Body of every error response.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ErrorBody {
        pub error: bool,
        pub code: String,
        pub message: String,
        /// Debug rendering of the failure, omitted in production.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub detail: Option<String>,
    }
}
