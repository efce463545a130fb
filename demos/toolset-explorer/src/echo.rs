//! Offline remote API that answers with a description of each request.

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use toolset_github::{ApiRequest, ApiResponse, RemoteApi, RemoteResult};

/// Echoes every request back as the response body.
pub struct EchoApi;

#[async_trait]
impl RemoteApi for EchoApi {
    async fn send(&self, request: ApiRequest) -> RemoteResult<ApiResponse> {
        let query: Map<String, Value> = request
            .query_pairs()
            .iter()
            .map(|(key, value)| (key.clone(), Value::String(value.clone())))
            .collect();
        let echoed = json!({
            "method": request.method().as_str(),
            "path": request.path(),
            "query": query,
            "accept": request.accept_header(),
            "body": request.body(),
        });
        Ok(ApiResponse::new(200, echoed.to_string()))
    }

    async fn graphql(&self, _query: &str, variables: Value) -> RemoteResult<Value> {
        Ok(json!({
            "repository": {
                "pullRequest": {
                    "reviews": { "nodes": [], "variables": variables }
                }
            }
        }))
    }
}
