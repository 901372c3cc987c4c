//! PutLogs request handed from the appender to a delivery client

use serde::{Deserialize, Serialize};

use crate::domain::record::BatchedRecord;

/// One dispatch group addressed to a project/logstore
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutLogsRequest {
    pub project: String,
    pub logstore: String,
    pub topic: Option<String>,
    pub logs: Vec<BatchedRecord>,
}

impl PutLogsRequest {
    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }
}
