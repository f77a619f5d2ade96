pub mod sms;
mod registry;

pub use registry::{json_schema_object, json_schema_string, parse_arguments, Tool, ToolRegistry};
pub use sms::{GenerateNumberTool, GetActiveNumbersTool, GetBalanceTool, GetSmsTool};

use std::sync::Arc;

/// The fixed catalog of SMS tools, in listing order
pub fn sms_catalog() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(GenerateNumberTool));
    registry.register(Arc::new(GetSmsTool));
    registry.register(Arc::new(GetBalanceTool));
    registry.register(Arc::new(GetActiveNumbersTool));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::McpError;
    use crate::protocol::{CallToolParams, CallToolResult};
    use mobilesms_core::{UpstreamClient, UpstreamConfig};
    use serde_json::json;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, api_key: &str) -> UpstreamClient {
        let config = UpstreamConfig::parse(&format!("{}/api.php", server.uri()), api_key).unwrap();
        UpstreamClient::new(config).unwrap()
    }

    fn call(name: &str, arguments: serde_json::Value) -> CallToolParams {
        CallToolParams {
            name: name.to_string(),
            arguments: Some(arguments),
        }
    }

    #[test]
    fn test_catalog_order() {
        let names: Vec<_> = sms_catalog()
            .list_schemas()
            .into_iter()
            .map(|s| s.name)
            .collect();

        assert_eq!(
            names,
            vec!["generate_number", "get_sms", "get_balance", "get_active_numbers"]
        );
    }

    #[tokio::test]
    async fn test_every_tool_returns_single_text_block() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"status\":\"ok\"}"))
            .mount(&server)
            .await;

        let client = client_for(&server, "k");
        let registry = sms_catalog();

        let calls = vec![
            call("generate_number", json!({"service": "discord", "country": "us"})),
            call("get_sms", json!({"number": "555", "service": "discord"})),
            call("get_balance", json!({})),
            call("get_active_numbers", json!({})),
        ];

        for params in calls {
            let result = registry.dispatch(&client, params).await.unwrap();
            assert_eq!(result, CallToolResult::text("{\n  \"status\": \"ok\"\n}"));
        }
    }

    #[tokio::test]
    async fn test_raw_text_passes_through() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("action", "number"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ERROR: insufficient funds"))
            .mount(&server)
            .await;

        let result = sms_catalog()
            .dispatch(
                &client_for(&server, "k"),
                call("generate_number", json!({"service": "discord", "country": "us"})),
            )
            .await
            .unwrap();

        assert_eq!(result, CallToolResult::text("ERROR: insufficient funds"));
    }

    #[tokio::test]
    async fn test_zipcode_reaches_upstream() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("action", "number"))
            .and(query_param("zip_pass", "1"))
            .and(query_param("zipcode", "10001"))
            .respond_with(ResponseTemplate::new(200).set_body_string("5551234567"))
            .expect(1)
            .mount(&server)
            .await;

        let result = sms_catalog()
            .dispatch(
                &client_for(&server, "k"),
                call(
                    "generate_number",
                    json!({"service": "discord", "country": "us", "zipcode": "10001"}),
                ),
            )
            .await
            .unwrap();

        assert_eq!(result, CallToolResult::text("5551234567"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_method_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = sms_catalog()
            .dispatch(&client_for(&server, "k"), call("delete_account", json!({})))
            .await
            .unwrap_err();

        assert_eq!(err, McpError::MethodNotFound("Unknown tool: delete_account".into()));
    }

    #[tokio::test]
    async fn test_missing_arguments_skip_upstream() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let params = CallToolParams {
            name: "get_sms".to_string(),
            arguments: None,
        };
        let err = sms_catalog()
            .dispatch(&client_for(&server, "k"), params)
            .await
            .unwrap_err();

        assert_eq!(err.code(), -32602);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_internal_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("down"))
            .mount(&server)
            .await;

        let err = sms_catalog()
            .dispatch(&client_for(&server, "k"), call("get_balance", json!({})))
            .await
            .unwrap_err();

        assert_eq!(err.code(), -32603);
        assert!(err.to_string().starts_with("Error executing tool get_balance:"));
    }

    #[tokio::test]
    async fn test_tool_error_never_carries_api_key() {
        let config =
            UpstreamConfig::parse("http://127.0.0.1:1/api.php", "SECRETKEY-0123456789").unwrap();
        let client = UpstreamClient::new(config).unwrap();

        let err = sms_catalog()
            .dispatch(&client, call("get_balance", json!({})))
            .await
            .unwrap_err();

        assert_eq!(err.code(), -32603);
        assert!(!err.to_string().contains("SECRETKEY-0123456789"));
    }
}
