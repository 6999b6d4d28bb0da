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

//! The consumer function: completes purchase records delivered by the queue
//! and writes them to the purchase table.

use crate::aws::PurchaseTable;
use crate::error::Result;
use crate::record::PurchaseRecord;
use aws_lambda_events::event::sqs::{SqsEvent, SqsMessage};
use chrono::Utc;
use log::{error, info, warn};
use serde_json::{json, Value};

/// Writes queue-delivered purchase records to a table.
pub struct Consumer<T: PurchaseTable> {
    table: T,
}

impl<T: PurchaseTable> Consumer<T> {
    /// Creates a consumer that writes to `table`.
    pub fn new(table: T) -> Self {
        Consumer { table }
    }

    /// Returns the table the consumer writes to.
    pub fn table(&self) -> &T {
        &self.table
    }

    /// The endpoint for SQS invocations.
    ///
    /// Records are handled one after another. A record with an empty body or
    /// a body that is not a JSON object is logged and skipped; it is not
    /// reported back to the queue and does not reach a dead-letter queue.
    /// Valid JSON that is not an object (`[1, 2]`, `"text"`) counts as a
    /// malformed body and is skipped too rather than failing the batch, since
    /// a redelivered copy would be rejected the same way.
    /// A failed write aborts the invocation so that the whole batch is
    /// redelivered by SQS.
    ///
    /// # Arguments
    /// * `event` - The batch of SQS records.
    ///
    /// # Returns
    /// `{"status": "ok"}` once every record was written or skipped.
    pub async fn handle(&self, event: SqsEvent) -> Result<Value> {
        info!("Event: {:?}", event);

        let total = event.records.len();
        let mut written = 0;
        for message in event.records {
            if self.process(&message).await? {
                written += 1;
            }
        }

        info!(
            "[OK] Wrote {} of {} records, skipped {}.",
            written,
            total,
            total - written
        );
        Ok(json!({ "status": "ok" }))
    }

    /// Processes a single record.
    ///
    /// # Returns
    /// `true` if the record was written, `false` if it was skipped.
    async fn process(&self, message: &SqsMessage) -> Result<bool> {
        let body = match message.body.as_deref() {
            Some(body) if !body.is_empty() => body,
            _ => {
                warn!("Record missing body: {:?}", message.message_id);
                return Ok(false);
            }
        };

        let mut record = match PurchaseRecord::from_message(body) {
            Ok(record) => record,
            Err(e) => {
                error!("Invalid JSON in body of {:?}: {}", message.message_id, e);
                return Ok(false);
            }
        };
        record.fill_defaults(Utc::now());

        info!("Putting item: {}", Value::Object(record.fields().clone()));
        self.table.put_item(&record).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PurchaseError;
    use crate::record::{PRODUCT_PURCHASE_KEY, TIME_OF_PURCHASE};
    use crate::test_util::MemoryTable;

    fn sqs_event(bodies: &[Option<&str>]) -> SqsEvent {
        let records = bodies
            .iter()
            .enumerate()
            .map(|(i, body)| {
                json!({
                    "messageId": format!("m-{}", i),
                    "receiptHandle": format!("r-{}", i),
                    "body": body,
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
        serde_json::from_value(json!({ "Records": records })).unwrap()
    }

    #[tokio::test]
    async fn missing_fields_are_generated() -> Result<()> {
        let consumer = Consumer::new(MemoryTable::new());
        let status = consumer
            .handle(sqs_event(&[Some(r#"{"CustomerId":"C1","ProductId":"P1"}"#)]))
            .await?;
        assert_eq!(json!({ "status": "ok" }), status);

        let items = consumer.table().items();
        assert_eq!(1, items.len());
        let item = &items[0];
        assert!(!item[PRODUCT_PURCHASE_KEY].as_str().unwrap().is_empty());
        assert!(!item[TIME_OF_PURCHASE].as_str().unwrap().is_empty());
        assert_eq!("C1", item["CustomerId"]);
        assert_eq!("P1", item["ProductId"]);
        Ok(())
    }

    #[tokio::test]
    async fn existing_fields_are_kept() -> Result<()> {
        let consumer = Consumer::new(MemoryTable::new());
        consumer
            .handle(sqs_event(&[Some(
                r#"{"CustomerId":"C1","ProductId":"P1","ProductPurchaseKey":"pk-7","TimeOfPurchase":"2022-01-02T03:04:05"}"#,
            )]))
            .await?;

        let item = consumer.table().get("pk-7").unwrap();
        assert_eq!("2022-01-02T03:04:05", item[TIME_OF_PURCHASE]);
        Ok(())
    }

    #[tokio::test]
    async fn timestamp_added_when_only_key_given() -> Result<()> {
        let consumer = Consumer::new(MemoryTable::new());
        consumer
            .handle(sqs_event(&[Some(
                r#"{"CustomerId":"C1","ProductId":"P1","ProductPurchaseKey":"pk-8"}"#,
            )]))
            .await?;

        let item = consumer.table().get("pk-8").unwrap();
        assert_eq!("pk-8", item[PRODUCT_PURCHASE_KEY]);
        let time = item[TIME_OF_PURCHASE].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(time).is_ok());
        Ok(())
    }

    #[tokio::test]
    async fn key_added_when_only_timestamp_given() -> Result<()> {
        let consumer = Consumer::new(MemoryTable::new());
        consumer
            .handle(sqs_event(&[Some(
                r#"{"CustomerId":"C1","ProductId":"P1","TimeOfPurchase":"2022-01-02T03:04:05"}"#,
            )]))
            .await?;

        let items = consumer.table().items();
        assert_eq!(1, items.len());
        assert!(!items[0][PRODUCT_PURCHASE_KEY].as_str().unwrap().is_empty());
        assert_eq!("2022-01-02T03:04:05", items[0][TIME_OF_PURCHASE]);
        Ok(())
    }

    #[tokio::test]
    async fn bad_records_are_skipped() -> Result<()> {
        let consumer = Consumer::new(MemoryTable::new());
        let status = consumer
            .handle(sqs_event(&[
                None,
                Some(""),
                Some("{oops"),
                Some("[1, 2, 3]"),
                Some(r#"{"CustomerId":"C3","ProductId":"P3"}"#),
            ]))
            .await?;
        assert_eq!(json!({ "status": "ok" }), status);
        assert_eq!(1, consumer.table().len());
        Ok(())
    }

    #[tokio::test]
    async fn same_key_overwrites_row() -> Result<()> {
        let consumer = Consumer::new(MemoryTable::new());
        let body = r#"{"CustomerId":"C1","ProductId":"P1","ProductPurchaseKey":"pk-1"}"#;
        consumer.handle(sqs_event(&[Some(body)])).await?;
        consumer
            .handle(sqs_event(&[Some(
                r#"{"CustomerId":"C1","ProductId":"P2","ProductPurchaseKey":"pk-1"}"#,
            )]))
            .await?;

        assert_eq!(1, consumer.table().len());
        assert_eq!(2, consumer.table().put_count());
        assert_eq!("P2", consumer.table().get("pk-1").unwrap()["ProductId"]);
        Ok(())
    }

    #[tokio::test]
    async fn empty_batch() -> Result<()> {
        let consumer = Consumer::new(MemoryTable::new());
        let status = consumer.handle(sqs_event(&[])).await?;
        assert_eq!(json!({ "status": "ok" }), status);
        assert!(consumer.table().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn write_failure_fails_the_batch() {
        let table = MemoryTable::new();
        table.set_unavailable(true);
        let consumer = Consumer::new(table);

        let result = consumer
            .handle(sqs_event(&[Some(r#"{"CustomerId":"C1","ProductId":"P1"}"#)]))
            .await;
        assert!(matches!(result, Err(PurchaseError::AWS(_))));
    }
}
