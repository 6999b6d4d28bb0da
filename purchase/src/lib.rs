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

#![warn(missing_docs, clippy::needless_borrow)]
// Clippy lints, some should be disabled incrementally
#![allow(clippy::new_without_default, clippy::upper_case_acronyms)]

//! `purchase` relays purchase events between managed AWS services.
//!
//! The producer accepts an API Gateway proxy event, validates the purchase
//! request and forwards it to an SQS queue. The consumer receives SQS batches,
//! completes each purchase record and writes it to a DynamoDB table.

pub mod aws;
pub mod configs;
pub mod consumer;
pub mod error;
pub mod gateway;
pub mod prelude;
pub mod producer;
pub mod record;
pub mod test_util;
