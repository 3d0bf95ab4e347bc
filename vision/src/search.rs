use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::api::VisionError;

pub const DEFAULT_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";
pub const DEFAULT_USER_PROJECT: &str = "personalmuji";
pub const DEFAULT_PRODUCT_SET: &str =
    "projects/personalmuji/locations/us-west1/productSets/mujipoc241225";
pub const DEFAULT_CATEGORY: &str = "homegoods";
pub const DEFAULT_MAX_RESULTS: u32 = 5;

/// Fixed search parameters attached to every forwarded image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProductSearch {
    pub product_set: String,
    pub categories: Vec<String>,
    pub max_results: u32,
}

impl Default for ProductSearch {
    fn default() -> Self {
        ProductSearch {
            product_set: DEFAULT_PRODUCT_SET.to_string(),
            categories: vec![DEFAULT_CATEGORY.to_string()],
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

// Wire shapes for images:annotate. Only the fields we send are modelled.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotateRequest {
    pub requests: Vec<AnnotateImageRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateImageRequest {
    pub image: Image,
    pub features: Vec<Feature>,
    pub image_context: ImageContext,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: String,
    pub max_results: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageContext {
    pub product_search_params: ProductSearchParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSearchParams {
    pub product_set: String,
    pub product_categories: Vec<String>,
}

impl AnnotateRequest {
    /// A single PRODUCT_SEARCH request for one base64 image.
    pub fn product_search(image: &str, search: &ProductSearch) -> AnnotateRequest {
        AnnotateRequest {
            requests: vec![AnnotateImageRequest {
                image: Image {
                    content: image.to_string(),
                },
                features: vec![Feature {
                    kind: String::from("PRODUCT_SEARCH"),
                    max_results: search.max_results,
                }],
                image_context: ImageContext {
                    product_search_params: ProductSearchParams {
                        product_set: search.product_set.clone(),
                        product_categories: search.categories.clone(),
                    },
                },
            }],
        }
    }
}

/// Status and raw body of a Vision API call, untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait VisionClient {
    async fn annotate(
        &self,
        token: &str,
        request: &AnnotateRequest,
    ) -> Result<UpstreamResponse, VisionError>;
}

pub struct HttpVisionClient {
    client: reqwest::Client,
    endpoint: String,
    user_project: String,
}

impl HttpVisionClient {
    pub fn new(endpoint: impl Into<String>, user_project: impl Into<String>) -> HttpVisionClient {
        HttpVisionClient {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            user_project: user_project.into(),
        }
    }
}

impl Default for HttpVisionClient {
    fn default() -> Self {
        HttpVisionClient::new(DEFAULT_ENDPOINT, DEFAULT_USER_PROJECT)
    }
}

#[async_trait]
impl VisionClient for HttpVisionClient {
    #[instrument(skip_all)]
    async fn annotate(
        &self,
        token: &str,
        request: &AnnotateRequest,
    ) -> Result<UpstreamResponse, VisionError> {
        debug!(endpoint = %self.endpoint, "forwarding image to vision api");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token)
            .header("x-goog-user-project", &self.user_project)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!("failed to reach vision api: {}", e);
                VisionError::UpstreamTransport(e.to_string())
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| VisionError::UpstreamTransport(e.to_string()))?;

        debug!(status, len = body.len(), "vision api responded");
        Ok(UpstreamResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn builds_the_product_search_payload() {
        let request = AnnotateRequest::product_search("aGVsbG8=", &ProductSearch::default());

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "requests": [{
                    "image": { "content": "aGVsbG8=" },
                    "features": [{ "type": "PRODUCT_SEARCH", "maxResults": 5 }],
                    "imageContext": {
                        "productSearchParams": {
                            "productSet": "projects/personalmuji/locations/us-west1/productSets/mujipoc241225",
                            "productCategories": ["homegoods"]
                        }
                    }
                }]
            })
        );
    }

    #[test]
    fn custom_search_parameters_flow_through() {
        let search = ProductSearch {
            product_set: String::from("projects/p/locations/l/productSets/s"),
            categories: vec![String::from("apparel"), String::from("toys")],
            max_results: 10,
        };
        let request = AnnotateRequest::product_search("eA==", &search);
        let inner = &request.requests[0];

        assert_eq!(inner.features[0].max_results, 10);
        assert_eq!(
            inner.image_context.product_search_params.product_categories,
            vec!["apparel", "toys"]
        );
    }

    #[test]
    fn only_2xx_is_success() {
        let ok = UpstreamResponse {
            status: 204,
            body: String::new(),
        };
        let denied = UpstreamResponse {
            status: 403,
            body: String::new(),
        };

        assert!(ok.is_success());
        assert!(!denied.is_success());
    }
}
