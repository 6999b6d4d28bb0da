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

//! This module provides the configurations of the purchase functions.
//!
//! Defaults come from `config.toml`; the Lambda environment overrides them.
//! Both functions read their configuration once at cold start and never
//! reload it.

mod function;
pub use function::{ConsumerConfig, ProducerConfig};

mod purchase;
pub use self::purchase::PURCHASE_CONF;

use lazy_static::lazy_static;

lazy_static! {
    /// Default AWS region of the queue and the table.
    pub static ref PURCHASE_REGION: String = PURCHASE_CONF["aws"]["region"].to_string();
    /// Default SQS queue URL the producer writes to.
    pub static ref PURCHASE_QUEUE_URL: String = PURCHASE_CONF["sqs"]["queue_url"].to_string();
    /// Default DynamoDB table the consumer writes to.
    pub static ref PURCHASE_TABLE_NAME: String = PURCHASE_CONF["dynamodb"]["table_name"].to_string();
}

/// Environment variable holding the AWS region.
pub const ENV_REGION: &str = "AWS_REGION";
/// Environment variable holding the SQS queue URL.
pub const ENV_QUEUE_URL: &str = "QUEUE_URL";
/// Environment variable holding the DynamoDB table name.
pub const ENV_TABLE_NAME: &str = "TABLE_NAME";
