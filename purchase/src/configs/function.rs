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

//! Cold-start configuration of the producer and consumer functions.

use super::{
    ENV_QUEUE_URL, ENV_REGION, ENV_TABLE_NAME, PURCHASE_QUEUE_URL, PURCHASE_REGION,
    PURCHASE_TABLE_NAME,
};
use crate::error::{PurchaseError, Result};
use rusoto_core::Region;
use std::str::FromStr;

/// Configuration of the producer function.
#[derive(Debug, Clone, PartialEq)]
pub struct ProducerConfig {
    /// The AWS region of the queue.
    pub region:    Region,
    /// The URL of the SQS queue that receives purchase requests.
    pub queue_url: String,
}

/// Configuration of the consumer function.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumerConfig {
    /// The AWS region of the table.
    pub region:     Region,
    /// The name of the DynamoDB table that stores purchase records.
    pub table_name: String,
}

impl ProducerConfig {
    /// Reads the producer configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the producer configuration through `lookup`, falling back to the
    /// defaults in `config.toml`.
    ///
    /// # Arguments
    /// * `lookup` - Returns the value of an environment variable, if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(ProducerConfig {
            region:    region(&lookup)?,
            queue_url: setting(&lookup, ENV_QUEUE_URL, &PURCHASE_QUEUE_URL)?,
        })
    }
}

impl ConsumerConfig {
    /// Reads the consumer configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the consumer configuration through `lookup`, falling back to the
    /// defaults in `config.toml`.
    ///
    /// # Arguments
    /// * `lookup` - Returns the value of an environment variable, if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(ConsumerConfig {
            region:     region(&lookup)?,
            table_name: setting(&lookup, ENV_TABLE_NAME, &PURCHASE_TABLE_NAME)?,
        })
    }
}

fn region<F>(lookup: &F) -> Result<Region>
where
    F: Fn(&str) -> Option<String>,
{
    let name = setting(lookup, ENV_REGION, &PURCHASE_REGION)?;
    Region::from_str(&name)
        .map_err(|e| PurchaseError::Config(format!("{} is not a valid region: {}", name, e)))
}

/// Returns the environment value of `key`, or `default` when it is unset.
/// Empty values and unresolved `{PLACEHOLDER}` values are rejected.
fn setting<F>(lookup: &F, key: &str, default: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(key).unwrap_or_else(|| default.to_string());
    let value = value.trim();
    if value.is_empty() {
        return Err(PurchaseError::Config(format!("{} is empty", key)));
    }
    if value.starts_with('{') && value.ends_with('}') {
        return Err(PurchaseError::Config(format!(
            "{} is not set (found placeholder {})",
            key, value
        )));
    }
    Ok(value.to_string())
}
