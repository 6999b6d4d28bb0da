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

//! This crate contains the wrapped functions of the AWS SQS service used by
//! the producer.

use crate::configs::ProducerConfig;
use crate::error::{PurchaseError, Result};
use async_trait::async_trait;
use log::info;
use rusoto_sqs::{SendMessageRequest, Sqs, SqsClient};

/// A queue that accepts purchase requests.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Enqueues a single message and returns the id the queue assigned to it.
    ///
    /// # Arguments
    /// * `body` - The message body.
    async fn send_message(&self, body: String) -> Result<String>;
}

/// An SQS queue.
pub struct SqsQueue {
    client:    SqsClient,
    queue_url: String,
}

impl SqsQueue {
    /// Creates a queue handle from an existing client.
    pub fn new(client: SqsClient, queue_url: String) -> Self {
        SqsQueue { client, queue_url }
    }

    /// Creates the client for the configured region.
    pub fn from_config(conf: &ProducerConfig) -> Self {
        SqsQueue::new(SqsClient::new(conf.region.clone()), conf.queue_url.clone())
    }

    /// Returns the URL of the queue.
    pub fn queue_url(&self) -> &str {
        &self.queue_url
    }
}

#[async_trait]
impl MessageQueue for SqsQueue {
    async fn send_message(&self, body: String) -> Result<String> {
        let resp = self
            .client
            .send_message(SendMessageRequest {
                queue_url: self.queue_url.clone(),
                message_body: body,
                ..Default::default()
            })
            .await
            .map_err(|e| PurchaseError::AWS(e.to_string()))?;
        info!("SQS send_message resp: {:?}", resp);

        resp.message_id.ok_or_else(|| {
            PurchaseError::AWS(format!(
                "SQS did not return a message id for queue {}",
                self.queue_url
            ))
        })
    }
}
