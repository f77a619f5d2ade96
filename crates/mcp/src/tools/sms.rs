// SMS tools: each maps to one upstream `action`

use crate::error::McpResult;
use crate::protocol::ToolSchema;
use crate::tools::{json_schema_object, json_schema_string, parse_arguments, Tool};
use mobilesms_core::ActionParams;
use serde::Deserialize;
use serde_json::{json, Value};

/// Issue a new virtual number for a service in a country
pub struct GenerateNumberTool;

#[derive(Debug, Deserialize)]
struct GenerateNumberArgs {
    service: String,
    country: String,
    #[serde(default)]
    zipcode: Option<String>,
}

#[async_trait::async_trait]
impl Tool for GenerateNumberTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "generate_number".to_string(),
            description: "Generate a new SMS number for a specific service and country"
                .to_string(),
            input_schema: json_schema_object(
                json!({
                    "service": json_schema_string("The service name (e.g., discord, telegram, whatsapp)"),
                    "country": json_schema_string("The country code (e.g., us, uk, ca)"),
                    "zipcode": json_schema_string("Optional zipcode for US numbers")
                }),
                vec!["service", "country"],
            ),
        }
    }

    fn example(&self) -> Value {
        json!({"service": "discord", "country": "us", "zipcode": "10001"})
    }

    fn upstream_params(&self, arguments: Value) -> McpResult<ActionParams> {
        let args: GenerateNumberArgs = parse_arguments("generate_number", arguments)?;

        let mut params = ActionParams::new("number")
            .with("service", args.service)
            .with("country", args.country);

        // An empty zipcode counts as absent
        if let Some(zipcode) = args.zipcode.filter(|z| !z.is_empty()) {
            params = params.with("zip_pass", "1").with("zipcode", zipcode);
        }

        Ok(params)
    }
}

/// Read the SMS received on a number
pub struct GetSmsTool;

#[derive(Debug, Deserialize)]
struct GetSmsArgs {
    number: String,
    service: String,
}

#[async_trait::async_trait]
impl Tool for GetSmsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_sms".to_string(),
            description: "Retrieve SMS messages for a specific number and service".to_string(),
            input_schema: json_schema_object(
                json!({
                    "number": json_schema_string("The phone number to check for SMS messages"),
                    "service": json_schema_string("The service name associated with the number")
                }),
                vec!["number", "service"],
            ),
        }
    }

    fn example(&self) -> Value {
        json!({"number": "5551234567", "service": "discord"})
    }

    fn upstream_params(&self, arguments: Value) -> McpResult<ActionParams> {
        let args: GetSmsArgs = parse_arguments("get_sms", arguments)?;

        Ok(ActionParams::new("sms")
            .with("number", args.number)
            .with("service", args.service))
    }
}

/// Account balance
pub struct GetBalanceTool;

#[async_trait::async_trait]
impl Tool for GetBalanceTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_balance".to_string(),
            description: "Get the current account balance".to_string(),
            input_schema: json_schema_object(json!({}), vec![]),
        }
    }

    fn upstream_params(&self, _arguments: Value) -> McpResult<ActionParams> {
        Ok(ActionParams::new("balance"))
    }
}

/// Currently rented numbers, short listing
pub struct GetActiveNumbersTool;

#[async_trait::async_trait]
impl Tool for GetActiveNumbersTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_active_numbers".to_string(),
            description: "Get all currently active numbers (short version)".to_string(),
            input_schema: json_schema_object(json!({}), vec![]),
        }
    }

    fn upstream_params(&self, _arguments: Value) -> McpResult<ActionParams> {
        Ok(ActionParams::new("active_short"))
    }
}
