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

//! This crate contains the wrapped functions of the AWS DynamoDB service used
//! by the consumer.

use crate::configs::ConsumerConfig;
use crate::error::{PurchaseError, Result};
use crate::record::{PurchaseRecord, PRODUCT_PURCHASE_KEY};
use async_trait::async_trait;
use rusoto_dynamodb::{AttributeValue, DynamoDb, DynamoDbClient, PutItemInput};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A table that stores purchase records keyed by `ProductPurchaseKey`.
#[async_trait]
pub trait PurchaseTable: Send + Sync {
    /// Writes `record` as a full replacement of the item with the same key.
    ///
    /// # Arguments
    /// * `record` - The purchase record to store.
    async fn put_item(&self, record: &PurchaseRecord) -> Result<()>;
}

/// A DynamoDB table.
pub struct DynamoTable {
    client:     DynamoDbClient,
    table_name: String,
}

impl DynamoTable {
    /// Creates a table handle from an existing client.
    pub fn new(client: DynamoDbClient, table_name: String) -> Self {
        DynamoTable { client, table_name }
    }

    /// Creates the client for the configured region.
    pub fn from_config(conf: &ConsumerConfig) -> Self {
        DynamoTable::new(
            DynamoDbClient::new(conf.region.clone()),
            conf.table_name.clone(),
        )
    }

    /// Returns the name of the table.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

#[async_trait]
impl PurchaseTable for DynamoTable {
    async fn put_item(&self, record: &PurchaseRecord) -> Result<()> {
        if record.key().is_none() {
            return Err(PurchaseError::Internal(format!(
                "record has no {}",
                PRODUCT_PURCHASE_KEY
            )));
        }

        self.client
            .put_item(PutItemInput {
                table_name: self.table_name.clone(),
                item: to_item(record.fields()),
                ..Default::default()
            })
            .await
            .map_err(|e| PurchaseError::AWS(e.to_string()))
            .map(|_| ())
    }
}

/// Converts a JSON object into a DynamoDB item.
pub fn to_item(fields: &Map<String, Value>) -> HashMap<String, AttributeValue> {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), to_attribute_value(v)))
        .collect()
}

/// Converts a JSON value into a DynamoDB attribute value.
///
/// | JSON    | DynamoDB |
/// |---------|----------|
/// | string  | S        |
/// | number  | N        |
/// | boolean | BOOL     |
/// | null    | NULL     |
/// | array   | L        |
/// | object  | M        |
pub fn to_attribute_value(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue {
            null: Some(true),
            ..Default::default()
        },
        Value::Bool(b) => AttributeValue {
            bool: Some(*b),
            ..Default::default()
        },
        Value::Number(n) => AttributeValue {
            n: Some(n.to_string()),
            ..Default::default()
        },
        Value::String(s) => AttributeValue {
            s: Some(s.clone()),
            ..Default::default()
        },
        Value::Array(values) => AttributeValue {
            l: Some(values.iter().map(to_attribute_value).collect()),
            ..Default::default()
        },
        Value::Object(fields) => AttributeValue {
            m: Some(to_item(fields)),
            ..Default::default()
        },
    }
}
