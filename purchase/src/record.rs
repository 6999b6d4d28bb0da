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

//! Purchase requests accepted by the producer and purchase records written by
//! the consumer.
//!
//! Both are free-form JSON objects. Only the presence of a handful of keys is
//! checked; every other field is carried through untouched and in its
//! original order.

use crate::error::{PurchaseError, RequestError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

/// The customer that made the purchase.
pub const CUSTOMER_ID: &str = "CustomerId";
/// The purchased product.
pub const PRODUCT_ID: &str = "ProductId";
/// The partition key of the purchase table.
pub const PRODUCT_PURCHASE_KEY: &str = "ProductPurchaseKey";
/// The time of purchase, in UTC ISO-8601 form.
pub const TIME_OF_PURCHASE: &str = "TimeOfPurchase";

/// A validated purchase request.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseRequest {
    fields: Map<String, Value>,
}

impl PurchaseRequest {
    /// Parses an HTTP request body into a purchase request.
    ///
    /// A key is considered present even if its value is `null`. Invalid JSON
    /// and JSON that is not an object are reported as missing fields.
    pub fn parse(body: &str) -> std::result::Result<PurchaseRequest, RequestError> {
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(fields))
                if fields.contains_key(CUSTOMER_ID) && fields.contains_key(PRODUCT_ID) =>
            {
                Ok(PurchaseRequest { fields })
            }
            _ => Err(RequestError::MissingFields),
        }
    }

    /// Serializes the request into the body of a queue message.
    pub fn to_message_body(&self) -> Result<String> {
        serde_json::to_string(&self.fields).map_err(PurchaseError::from)
    }

    /// Returns the fields of the request.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// A purchase record as it is stored in the purchase table.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseRecord {
    fields: Map<String, Value>,
}

impl PurchaseRecord {
    /// Parses the body of a queue message into a purchase record.
    ///
    /// The required request fields are not validated again here; the producer
    /// is the only place that enforces them.
    pub fn from_message(body: &str) -> Result<PurchaseRecord> {
        match serde_json::from_str::<Value>(body)? {
            Value::Object(fields) => Ok(PurchaseRecord { fields }),
            other => Err(PurchaseError::Internal(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }

    /// Assigns `ProductPurchaseKey` and `TimeOfPurchase` when they are absent.
    /// Existing values are never overwritten.
    ///
    /// # Arguments
    /// * `now` - The time to record as `TimeOfPurchase`.
    pub fn fill_defaults(&mut self, now: DateTime<Utc>) {
        if !self.fields.contains_key(PRODUCT_PURCHASE_KEY) {
            self.fields.insert(
                PRODUCT_PURCHASE_KEY.to_string(),
                Value::String(Uuid::new_v4().to_string()),
            );
        }
        self.fields
            .entry(TIME_OF_PURCHASE)
            .or_insert_with(|| Value::String(now.to_rfc3339_opts(SecondsFormat::Micros, true)));
    }

    /// Returns the partition key of the record, if it has one.
    pub fn key(&self) -> Option<&Value> {
        self.fields.get(PRODUCT_PURCHASE_KEY)
    }

    /// Returns the fields of the record.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Consumes the record and returns its fields.
    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
