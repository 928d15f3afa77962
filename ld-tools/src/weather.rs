use crate::error::{Result, ToolError};
use crate::traits::{Tool, ToolSpec, optional_string};
use async_trait::async_trait;
use serde_json::{Value, json};

pub const LOOKUP_WEATHER: &str = "lookup_weather";

/// Mock weather lookup. Always reports the same conditions.
#[derive(Debug, Clone, Default)]
pub struct LookupWeatherTool;

impl LookupWeatherTool {
    pub const REPORT: &'static str = "Currently 18°C and partly cloudy";

    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for LookupWeatherTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: LOOKUP_WEATHER.to_string(),
            description: "Lookup the weather for a city or zip code.".to_string(),
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "city_name": {
                        "type": "string",
                        "description": "The city name"
                    },
                    "zip_code": {
                        "type": "string",
                        "description": "The zip code"
                    }
                },
                "additionalProperties": false
            }),
        }
    }

    #[tracing::instrument(level = "info", skip_all)]
    async fn execute(&self, arguments: Value) -> Result<Value> {
        let city = optional_string(&arguments, "city_name")?;
        let zip = optional_string(&arguments, "zip_code")?;
        let Some(location) = city.or(zip) else {
            return Err(ToolError::InvalidArguments(
                "one of city_name or zip_code is required".to_string(),
            ));
        };
        tracing::info!(%location, "looking up weather");
        Ok(Value::String(Self::REPORT.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::to_tool_definition;

    #[tokio::test]
    async fn reports_mock_weather_for_city() {
        let out = LookupWeatherTool::new()
            .execute(json!({"city_name": "Bogota"}))
            .await
            .expect("weather");
        assert_eq!(out, json!("Currently 18°C and partly cloudy"));
    }

    #[tokio::test]
    async fn zip_code_alone_is_enough() {
        let out = LookupWeatherTool::new()
            .execute(json!({"zip_code": "110111"}))
            .await
            .expect("weather");
        assert_eq!(out, json!(LookupWeatherTool::REPORT));
    }

    #[tokio::test]
    async fn missing_location_is_rejected() {
        let err = LookupWeatherTool::new()
            .execute(json!({}))
            .await
            .expect_err("no location");
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn non_string_location_is_rejected() {
        let err = LookupWeatherTool::new()
            .execute(json!({"city_name": 42}))
            .await
            .expect_err("bad type");
        assert!(err.to_string().contains("city_name"));
    }

    #[test]
    fn definition_uses_function_envelope() {
        let def = to_tool_definition(&LookupWeatherTool::new());
        let wire = serde_json::to_value(&def).expect("serialize");
        assert_eq!(wire["type"], "function");
        assert_eq!(wire["function"]["name"], LOOKUP_WEATHER);
        assert_eq!(wire["function"]["parameters"]["additionalProperties"], false);
    }
}
