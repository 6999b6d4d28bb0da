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

//! Helpers over the API Gateway proxy integration event and response.
//!
//! The producer receives an `ApiGatewayProxyRequest` and always answers with
//! a JSON `ApiGatewayProxyResponse`.

use crate::error::RequestError;
use aws_lambda_events::encodings::Body;
use aws_lambda_events::event::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use http::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use http::Method;
use serde_json::{json, Value};

/// The content type of every producer response.
pub const APPLICATION_JSON: &str = "application/json";

/// Returns true if the request may carry a purchase.
pub fn is_write_method(request: &ApiGatewayProxyRequest) -> bool {
    request.http_method == Method::PUT || request.http_method == Method::POST
}

/// Returns the request body, decoding it from base64 when the event says it
/// is encoded.
pub fn decoded_body(request: &ApiGatewayProxyRequest) -> Result<Option<String>, RequestError> {
    match (&request.body, request.is_base64_encoded) {
        (Some(body), Some(true)) => {
            let bytes = base64::decode(body).map_err(|_| RequestError::InvalidEncoding)?;
            String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| RequestError::InvalidEncoding)
        }
        (body, _) => Ok(body.clone()),
    }
}

/// A JSON response with the given status code.
pub fn json_response(status_code: i64, body: &Value) -> ApiGatewayProxyResponse {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
    ApiGatewayProxyResponse {
        status_code,
        headers,
        multi_value_headers: HeaderMap::new(),
        body: Some(Body::Text(body.to_string())),
        is_base64_encoded: Some(false),
    }
}

/// A 200 response carrying `body`.
pub fn ok(body: &Value) -> ApiGatewayProxyResponse {
    json_response(200, body)
}

/// An error response of the form `{"error": message}`.
pub fn error(status_code: i64, message: &str) -> ApiGatewayProxyResponse {
    json_response(status_code, &json!({ "error": message }))
}

/// The response reported to the caller for a rejected request.
pub fn rejection(e: RequestError) -> ApiGatewayProxyResponse {
    error(e.status_code(), e.message())
}

/// Parses the body of a response back into JSON. An empty body is `null`.
pub fn body_json(response: &ApiGatewayProxyResponse) -> serde_json::Result<Value> {
    match &response.body {
        Some(Body::Text(text)) => serde_json::from_str(text),
        Some(Body::Binary(bytes)) => serde_json::from_slice(bytes),
        Some(Body::Empty) | None => Ok(Value::Null),
    }
}
