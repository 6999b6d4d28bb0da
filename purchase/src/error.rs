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

//! Purchase error types

use std::error;
use std::fmt::{Display, Formatter};
use std::result;

/// Result type for operations that could result in an [PurchaseError]
pub type Result<T> = result::Result<T, PurchaseError>;

/// Purchase error
#[derive(Debug)]
pub enum PurchaseError {
    /// Error returned when the function configuration is missing or invalid.
    /// Raised at cold start, before any event is handled.
    Config(String),
    /// Error returned when serde_json failed to serialize or deserialize data.
    SerdeJson(serde_json::Error),
    /// Error returned when accessing the AWS services fails.
    AWS(String),
    /// Error associated to Lambda runtime execution.
    LambdaError(Box<dyn std::error::Error + Send + Sync>),
    /// Error returned when an internal invariant does not hold.
    Internal(String),
}

impl PurchaseError {
    /// Returns a short description that is safe to hand back to an HTTP
    /// caller. The full error is only written to the function log.
    pub fn public_message(&self) -> &'static str {
        match *self {
            PurchaseError::Config(_) => "function is not configured",
            PurchaseError::SerdeJson(_) => "failed to serialize the purchase request",
            PurchaseError::AWS(_) => "message queue unavailable",
            PurchaseError::LambdaError(_) | PurchaseError::Internal(_) => "unexpected failure",
        }
    }
}

impl From<serde_json::Error> for PurchaseError {
    fn from(e: serde_json::Error) -> Self {
        PurchaseError::SerdeJson(e)
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for PurchaseError {
    fn from(e: Box<dyn std::error::Error + Send + Sync>) -> Self {
        PurchaseError::LambdaError(e)
    }
}

impl From<&str> for PurchaseError {
    fn from(e: &str) -> Self {
        PurchaseError::Internal(e.to_string())
    }
}

impl Display for PurchaseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            PurchaseError::Config(ref desc) => write!(f, "Configuration error: {}", desc),
            PurchaseError::SerdeJson(ref desc) => write!(f, "serde_json error: {:?}", desc),
            PurchaseError::AWS(ref desc) => write!(f, "AWS error: {}", desc),
            PurchaseError::LambdaError(ref desc) => write!(f, "Lambda error: {}", desc),
            PurchaseError::Internal(ref desc) => write!(f, "Internal error: {}", desc),
        }
    }
}

impl error::Error for PurchaseError {}

/// Rejection of a purchase request caused by the caller's input.
///
/// These are reported to the HTTP caller with a 4xx status and are never
/// retried by the producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestError {
    /// The HTTP method is neither PUT nor POST.
    MethodNotAllowed,
    /// The body is flagged as base64 but does not decode to UTF-8 text.
    InvalidEncoding,
    /// The body is missing or empty.
    MissingBody,
    /// The body is not a JSON object carrying `CustomerId` and `ProductId`.
    MissingFields,
}

impl RequestError {
    /// The HTTP status code reported to the caller.
    pub fn status_code(&self) -> i64 {
        match *self {
            RequestError::MethodNotAllowed => 405,
            _ => 400,
        }
    }

    /// The message placed in the `error` field of the response body.
    pub fn message(&self) -> &'static str {
        match *self {
            RequestError::MethodNotAllowed => "Method not allowed",
            RequestError::InvalidEncoding => "Request body is not valid base64",
            RequestError::MissingBody => "Request body is required",
            RequestError::MissingFields => "Missing required fields: CustomerId, ProductId",
        }
    }
}

impl Display for RequestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message(), self.status_code())
    }
}

impl error::Error for RequestError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_message_hides_details() {
        let err = PurchaseError::AWS("dispatch failure: connection refused to 10.0.0.1".to_string());
        assert_eq!("message queue unavailable", err.public_message());
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn request_error_status() {
        assert_eq!(405, RequestError::MethodNotAllowed.status_code());
        assert_eq!(400, RequestError::MissingBody.status_code());
        assert_eq!(400, RequestError::MissingFields.status_code());
        assert_eq!(400, RequestError::InvalidEncoding.status_code());
    }
}
