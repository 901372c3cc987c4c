//! Protobuf messages of the PutLogs request body
//!
//! ```protobuf
//! message Log {
//!     required uint32 Time = 1;
//!     message Content {
//!         required string Key = 1;
//!         required string Value = 2;
//!     }
//!     repeated Content Contents = 2;
//! }
//!
//! message LogGroup {
//!     repeated Log Logs = 1;
//!     optional string Reserved = 2;
//!     optional string Topic = 3;
//!     optional string Source = 4;
//! }
//! ```

use prost::Message;
use sls_core::domain::record::BatchedRecord;
use sls_core::dto::put_logs::PutLogsRequest;

#[derive(Clone, PartialEq, Message)]
pub(crate) struct Log {
    /// UNIX time in seconds
    #[prost(uint32, required, tag = "1")]
    pub time: u32,
    #[prost(message, repeated, tag = "2")]
    pub contents: Vec<LogContent>,
}

#[derive(Clone, PartialEq, Message)]
pub(crate) struct LogContent {
    #[prost(string, required, tag = "1")]
    pub key: String,
    #[prost(string, required, tag = "2")]
    pub value: String,
}

#[derive(Clone, PartialEq, Message)]
pub(crate) struct LogGroup {
    #[prost(message, repeated, tag = "1")]
    pub logs: Vec<Log>,
    #[prost(string, optional, tag = "3")]
    pub topic: Option<String>,
    #[prost(string, optional, tag = "4")]
    pub source: Option<String>,
}

impl From<&BatchedRecord> for Log {
    fn from(record: &BatchedRecord) -> Self {
        Self {
            // Out-of-range times are clamped to what the wire field can carry
            time: record.time.clamp(0, u32::MAX as i64) as u32,
            contents: record
                .contents
                .iter()
                .map(|content| LogContent {
                    key: content.key.clone(),
                    value: content.value.clone(),
                })
                .collect(),
        }
    }
}

impl From<&PutLogsRequest> for LogGroup {
    fn from(request: &PutLogsRequest) -> Self {
        Self {
            logs: request.logs.iter().map(Log::from).collect(),
            topic: request.topic.clone(),
            source: None,
        }
    }
}
