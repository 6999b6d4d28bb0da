// Copyright (c) 2020-present, UMD Database Group.
//
// This program is free software: you can use, redistribute, and/or modify
// it under the terms of the GNU Affero General Public License, version 3
// or later ("AGPL"), as published by the Free Software Foundation.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or
// FITNESS FOR A PARTICULAR PURPOSE.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <http://www.gnu.org/licenses/>.

//! In-memory stand-ins for the queue and the table, used by tests to drive
//! the handlers without AWS.

use crate::aws::{MessageQueue, PurchaseTable};
use crate::error::{PurchaseError, Result};
use crate::record::PurchaseRecord;
use async_trait::async_trait;
use aws_lambda_events::event::apigw::ApiGatewayProxyRequest;
use aws_lambda_events::event::sqs::SqsEvent;
use http::{HeaderMap, Method};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// Builds an API Gateway proxy event with a plain text body.
pub fn proxy_request(method: Method, body: Option<&str>) -> ApiGatewayProxyRequest {
    ApiGatewayProxyRequest {
        resource: Some("/purchases".to_string()),
        path: Some("/purchases".to_string()),
        http_method: method,
        headers: HeaderMap::new(),
        multi_value_headers: HeaderMap::new(),
        query_string_parameters: Default::default(),
        multi_value_query_string_parameters: Default::default(),
        path_parameters: HashMap::new(),
        stage_variables: HashMap::new(),
        request_context: Default::default(),
        body: body.map(str::to_string),
        is_base64_encoded: Some(false),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// A message sent to a [`MemoryQueue`].
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    /// The id assigned by the queue.
    pub message_id: String,
    /// The message body.
    pub body:       String,
}

/// A queue that keeps every message in memory.
#[derive(Default)]
pub struct MemoryQueue {
    messages:    Mutex<Vec<SentMessage>>,
    unavailable: AtomicBool,
}

impl MemoryQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        MemoryQueue::default()
    }

    /// Makes every following `send_message` fail, as if the queue were
    /// unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Returns the messages sent so far, oldest first.
    pub fn messages(&self) -> Vec<SentMessage> {
        lock(&self.messages).clone()
    }

    /// Drains the queue into an SQS event, the way the event source mapping
    /// would deliver it to the consumer.
    pub fn drain_event(&self) -> Result<SqsEvent> {
        let records = lock(&self.messages)
            .drain(..)
            .map(|m| {
                serde_json::json!({
                    "messageId": m.message_id,
                    "receiptHandle": format!("handle-{}", m.message_id),
                    "body": m.body,
                    "md5OfBody": null,
                    "md5OfMessageAttributes": null,
                    "attributes": {},
                    "messageAttributes": {},
                    "eventSource": "aws:sqs",
                    "eventSourceARN": "arn:aws:sqs:us-east-1:123456789012:purchases",
                    "awsRegion": "us-east-1"
                })
            })
            .collect::<Vec<_>>();
        serde_json::from_value(serde_json::json!({ "Records": records })).map_err(PurchaseError::from)
    }
}

#[async_trait]
impl MessageQueue for MemoryQueue {
    async fn send_message(&self, body: String) -> Result<String> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PurchaseError::AWS(
                "HTTP dispatch error: connection refused (os error 111)".to_string(),
            ));
        }
        let message_id = Uuid::new_v4().to_string();
        lock(&self.messages).push(SentMessage {
            message_id: message_id.clone(),
            body,
        });
        Ok(message_id)
    }
}

/// A table that keeps every item in memory, keyed by the string form of
/// `ProductPurchaseKey`.
#[derive(Default)]
pub struct MemoryTable {
    items:       Mutex<HashMap<String, Map<String, Value>>>,
    puts:        Mutex<usize>,
    unavailable: AtomicBool,
}

impl MemoryTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        MemoryTable::default()
    }

    /// Makes every following `put_item` fail.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Returns the item stored under `key`.
    pub fn get(&self, key: &str) -> Option<Map<String, Value>> {
        lock(&self.items).get(key).cloned()
    }

    /// Returns every stored item.
    pub fn items(&self) -> Vec<Map<String, Value>> {
        lock(&self.items).values().cloned().collect()
    }

    /// Returns the number of stored items.
    pub fn len(&self) -> usize {
        lock(&self.items).len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of successful `put_item` calls.
    pub fn put_count(&self) -> usize {
        *lock(&self.puts)
    }
}

#[async_trait]
impl PurchaseTable for MemoryTable {
    async fn put_item(&self, record: &PurchaseRecord) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PurchaseError::AWS(
                "ProvisionedThroughputExceededException".to_string(),
            ));
        }
        let key = match record.key() {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => return Err(PurchaseError::Internal("record has no key".to_string())),
        };
        lock(&self.items).insert(key, record.fields().clone());
        *lock(&self.puts) += 1;
        Ok(())
    }
}
