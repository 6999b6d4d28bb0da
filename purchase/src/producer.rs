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

//! The producer function: validates purchase requests arriving through API
//! Gateway and forwards them to the purchase queue.

use crate::aws::MessageQueue;
use crate::error::{PurchaseError, RequestError};
use crate::gateway;
use crate::record::PurchaseRequest;
use aws_lambda_events::event::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use log::{error, info};
use serde_json::json;

/// The outcome of a producer invocation that did not succeed.
#[derive(Debug)]
pub enum ProducerError {
    /// The request was rejected because of the caller's input.
    Rejected(RequestError),
    /// A downstream dependency failed.
    Downstream(PurchaseError),
}

impl ProducerError {
    /// The response reported to the caller. Downstream failures only expose
    /// their public category.
    pub fn into_response(self) -> ApiGatewayProxyResponse {
        match self {
            ProducerError::Rejected(e) => gateway::rejection(e),
            ProducerError::Downstream(e) => {
                gateway::error(500, &format!("Internal error: {}", e.public_message()))
            }
        }
    }
}

impl From<RequestError> for ProducerError {
    fn from(e: RequestError) -> Self {
        ProducerError::Rejected(e)
    }
}

impl From<PurchaseError> for ProducerError {
    fn from(e: PurchaseError) -> Self {
        ProducerError::Downstream(e)
    }
}

/// Forwards purchase requests to a message queue.
pub struct Producer<Q: MessageQueue> {
    queue: Q,
}

impl<Q: MessageQueue> Producer<Q> {
    /// Creates a producer that sends to `queue`.
    pub fn new(queue: Q) -> Self {
        Producer { queue }
    }

    /// Returns the queue the producer sends to.
    pub fn queue(&self) -> &Q {
        &self.queue
    }

    /// The endpoint for API Gateway invocations.
    ///
    /// Exactly one message is enqueued per valid request. Nothing is retried;
    /// a failed enqueue is reported to the caller, who has to retry.
    ///
    /// # Arguments
    /// * `request` - The API Gateway proxy event.
    ///
    /// # Returns
    /// The HTTP response for API Gateway. `{"messageId": ...}` on success.
    pub async fn handle(&self, request: ApiGatewayProxyRequest) -> ApiGatewayProxyResponse {
        info!("Event: {:?}", request);
        match self.enqueue(&request).await {
            Ok(message_id) => gateway::ok(&json!({ "messageId": message_id })),
            Err(ProducerError::Rejected(e)) => {
                info!("Rejected request: {}", e);
                ProducerError::Rejected(e).into_response()
            }
            Err(ProducerError::Downstream(e)) => {
                error!("Failed to enqueue message: {}", e);
                ProducerError::Downstream(e).into_response()
            }
        }
    }

    /// Validates the request and sends it to the queue.
    ///
    /// # Returns
    /// The id the queue assigned to the message.
    pub async fn enqueue(&self, request: &ApiGatewayProxyRequest) -> Result<String, ProducerError> {
        if !gateway::is_write_method(request) {
            return Err(RequestError::MethodNotAllowed.into());
        }

        let body = match gateway::decoded_body(request)? {
            Some(body) if !body.is_empty() => body,
            _ => return Err(RequestError::MissingBody.into()),
        };

        let purchase = PurchaseRequest::parse(&body)?;
        let message_id = self.queue.send_message(purchase.to_message_body()?).await?;
        Ok(message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::gateway::body_json;
    use crate::test_util::{proxy_request, MemoryQueue};
    use http::header::CONTENT_TYPE;
    use http::Method;
    use serde_json::Value;

    fn error_of(response: &ApiGatewayProxyResponse) -> Value {
        body_json(response).unwrap()["error"].clone()
    }

    #[tokio::test]
    async fn post_and_put_are_enqueued() -> Result<()> {
        let producer = Producer::new(MemoryQueue::new());
        for method in vec![Method::POST, Method::PUT] {
            let response = producer
                .handle(proxy_request(
                    method,
                    Some(r#"{"CustomerId":"C1","ProductId":"P1"}"#),
                ))
                .await;
            assert_eq!(200, response.status_code);
            assert_eq!(
                Some("application/json"),
                response.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
            );
            let message_id = body_json(&response)?["messageId"].clone();
            assert!(!message_id.as_str().unwrap().is_empty());
        }

        let messages = producer.queue().messages();
        assert_eq!(2, messages.len());
        assert_eq!(r#"{"CustomerId":"C1","ProductId":"P1"}"#, messages[0].body);
        Ok(())
    }

    #[tokio::test]
    async fn other_methods_are_not_allowed() {
        let producer = Producer::new(MemoryQueue::new());
        let methods = vec![
            Method::GET,
            Method::DELETE,
            Method::PATCH,
            Method::HEAD,
            Method::OPTIONS,
            Method::from_bytes(b"post").unwrap(),
        ];
        for method in methods {
            let response = producer
                .handle(proxy_request(
                    method,
                    Some(r#"{"CustomerId":"C1","ProductId":"P1"}"#),
                ))
                .await;
            assert_eq!(405, response.status_code);
            assert_eq!("Method not allowed", error_of(&response));
        }

        let response = producer.handle(proxy_request(Method::GET, None)).await;
        assert_eq!(405, response.status_code);
        assert!(producer.queue().messages().is_empty());
    }

    #[tokio::test]
    async fn body_is_required() {
        let producer = Producer::new(MemoryQueue::new());
        let response = producer.handle(proxy_request(Method::POST, Some(""))).await;
        assert_eq!(400, response.status_code);
        assert_eq!("Request body is required", error_of(&response));

        let response = producer.handle(proxy_request(Method::PUT, None)).await;
        assert_eq!(400, response.status_code);
        assert_eq!("Request body is required", error_of(&response));
    }

    #[tokio::test]
    async fn required_fields_are_checked() {
        let producer = Producer::new(MemoryQueue::new());
        for body in &[r#"{"CustomerId":"C1"}"#, r#"{"ProductId":"P1"}"#, "{not json"] {
            let response = producer
                .handle(proxy_request(Method::POST, Some(*body)))
                .await;
            assert_eq!(400, response.status_code);
            assert_eq!(
                "Missing required fields: CustomerId, ProductId",
                error_of(&response)
            );
        }
        assert!(producer.queue().messages().is_empty());
    }

    #[tokio::test]
    async fn base64_body_is_decoded() -> Result<()> {
        let producer = Producer::new(MemoryQueue::new());
        let encoded = base64::encode(r#"{"CustomerId":"C2","ProductId":"P9","Quantity":2}"#);
        let mut request = proxy_request(Method::POST, Some(&encoded));
        request.is_base64_encoded = Some(true);

        let response = producer.handle(request).await;
        assert_eq!(200, response.status_code);
        assert_eq!(
            r#"{"CustomerId":"C2","ProductId":"P9","Quantity":2}"#,
            producer.queue().messages()[0].body
        );

        let mut request = proxy_request(Method::POST, Some("***"));
        request.is_base64_encoded = Some(true);
        let response = producer.handle(request).await;
        assert_eq!(400, response.status_code);
        assert_eq!("Request body is not valid base64", error_of(&response));
        Ok(())
    }

    #[tokio::test]
    async fn large_integer_ids_are_enqueued_verbatim() {
        let producer = Producer::new(MemoryQueue::new());
        let body = r#"{"CustomerId":123456789012345678901234567890,"ProductId":18446744073709551617,"Price":19.990}"#;
        let response = producer
            .handle(proxy_request(Method::POST, Some(body)))
            .await;
        assert_eq!(200, response.status_code);
        assert_eq!(body, producer.queue().messages()[0].body);
    }

    #[tokio::test]
    async fn queue_failure_is_internal_error() {
        let queue = MemoryQueue::new();
        queue.set_unavailable(true);
        let producer = Producer::new(queue);

        let response = producer
            .handle(proxy_request(
                Method::POST,
                Some(r#"{"CustomerId":"C1","ProductId":"P1"}"#),
            ))
            .await;
        assert_eq!(500, response.status_code);
        assert_eq!(
            "Internal error: message queue unavailable",
            error_of(&response)
        );
        assert!(!body_json(&response)
            .unwrap()
            .to_string()
            .contains("connection refused"));
    }
}
