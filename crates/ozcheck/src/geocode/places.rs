//! Address suggestions from the Google Places autocomplete API.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

/// Inputs this short never produce useful suggestions.
const MIN_INPUT_LEN: usize = 3;

const FIELD_MASK: &str = "suggestions.placePrediction.text,suggestions.placePrediction.placeId";

/// One suggested address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub place_id: String,
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
struct AutocompleteResponse {
    #[serde(default)]
    suggestions: Vec<Suggestion>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Suggestion {
    place_prediction: Option<PlacePrediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlacePrediction {
    place_id: String,
    text: PredictionText,
}

#[derive(Debug, Deserialize)]
struct PredictionText {
    text: String,
}

/// Autocomplete client restricted to U.S. street addresses.
#[derive(Clone)]
pub struct PlacesClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PlacesClient {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Suggestions for partial input. Failures are logged and yield no
    /// suggestions.
    pub async fn suggest(&self, input: &str) -> Vec<Prediction> {
        let input = input.trim();
        if input.chars().count() < MIN_INPUT_LEN {
            return Vec::new();
        }

        match self.fetch(input).await {
            Ok(predictions) => predictions,
            Err(e) => {
                warn!("Error fetching predictions: {}", e);
                Vec::new()
            }
        }
    }

    async fn fetch(&self, input: &str) -> Result<Vec<Prediction>, reqwest::Error> {
        let url = format!("{}/v1/places:autocomplete", self.base_url);
        debug!("POST {} ({})", url, input);

        let response: AutocompleteResponse = self
            .client
            .post(&url)
            .header("X-Goog-Api-Key", &self.api_key)
            .header("X-Goog-FieldMask", FIELD_MASK)
            .json(&json!({
                "input": input,
                "includedRegionCodes": ["us"],
                "includedPrimaryTypes": ["street_address", "premise"],
                "languageCode": "en",
            }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response
            .suggestions
            .into_iter()
            .filter_map(|s| s.place_prediction)
            .map(|p| Prediction {
                place_id: p.place_id,
                description: p.text.text,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::{
        http::{HeaderMap, StatusCode, Uri},
        response::IntoResponse,
        Json, Router,
    };
    use serde_json::Value;

    use crate::test_support::spawn;

    async fn autocomplete(uri: Uri, headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
        if uri.path() != "/v1/places:autocomplete" {
            return StatusCode::NOT_FOUND.into_response();
        }
        if headers.get("X-Goog-Api-Key").and_then(|v| v.to_str().ok()) != Some("secret") {
            return (StatusCode::FORBIDDEN, Json(json!({}))).into_response();
        }
        assert_eq!(body["includedRegionCodes"], json!(["us"]));
        assert_eq!(
            headers.get("X-Goog-FieldMask").and_then(|v| v.to_str().ok()),
            Some(FIELD_MASK)
        );
        Json(json!({
            "suggestions": [
                {"placePrediction": {"placeId": "abc", "text": {"text": "4202 E Fowler Ave, Tampa, FL, USA"}}},
                {"queryPrediction": {"text": {"text": "4202 e fowler"}}}
            ]
        }))
        .into_response()
    }

    async fn places(key: &str) -> PlacesClient {
        let app = Router::new().fallback(autocomplete);
        PlacesClient::new(Client::new(), spawn(app).await, key)
    }

    #[tokio::test]
    async fn returns_place_predictions_only() {
        let client = places("secret").await;
        let predictions = client.suggest("4202 E Fow").await;
        assert_eq!(
            predictions,
            vec![Prediction {
                place_id: "abc".to_string(),
                description: "4202 E Fowler Ave, Tampa, FL, USA".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn short_input_skips_request() {
        let client = PlacesClient::new(Client::new(), "http://127.0.0.1:9", "secret");
        assert!(client.suggest("42").await.is_empty());
        assert!(client.suggest("   ").await.is_empty());
    }

    #[tokio::test]
    async fn errors_yield_no_suggestions() {
        let client = places("wrong").await;
        assert!(client.suggest("4202 E Fow").await.is_empty());
    }
}
