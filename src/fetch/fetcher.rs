use std::time::Duration;

use log::{debug, error};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};

use crate::constants::{
    ANALYTICS_PATH, FEATURE_FLAGS_PATH, PKG_VERSION, SDK_UA_HEADER, USER_AGENT,
};
use crate::errors::ErrorKind::*;
use crate::errors::{ClientError, ErrorKind};
use crate::fetch::fetcher::FetchResponse::{Failed, Fetched};
use crate::model::flag::{catalogue_from_response, FlagCatalogue};

#[derive(Debug, PartialEq)]
pub enum FetchResponse {
    Fetched(FlagCatalogue),
    Failed(ClientError),
}

pub struct Fetcher {
    base_url: String,
    http_client: reqwest::Client,
}

impl Fetcher {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let sdk_header = HeaderValue::from_str(&format!("FeaturIT-Rust/{PKG_VERSION}"))
            .map_err(|err| ClientError::new(HttpClientInitFailure, err.to_string()))?;
        headers.insert(SDK_UA_HEADER, sdk_header);

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|err| {
                ClientError::new(
                    HttpClientInitFailure,
                    format!("Initializing the HTTP client failed. {err}"),
                )
            })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            http_client,
        })
    }

    pub async fn fetch(&self) -> FetchResponse {
        let url = format!("{}/{FEATURE_FLAGS_PATH}", self.base_url);
        let result = self.http_client.get(url).send().await;

        match result {
            Ok(response) => match response.status().as_u16() {
                200 => match response.text().await {
                    Ok(body) => match catalogue_from_response(body.as_str()) {
                        Ok(catalogue) => {
                            debug!("Fetch was successful: {} flags received", catalogue.len());
                            Fetched(catalogue)
                        }
                        Err(parse_error) => {
                            invalid_content(format!("Fetching feature flags was successful but the HTTP response content was invalid. {parse_error}"))
                        }
                    },
                    Err(body_error) => invalid_content(format!("Fetching feature flags was successful but the HTTP response content was invalid. {body_error}")),
                },
                code @ (401 | 403 | 404) => {
                    let msg = format!("Your API key seems to be wrong or it was not accepted for this tenant. Status code: {code}");
                    error!(event_id = InvalidApiKey.as_u16(); "{}", msg);
                    Failed(ClientError::new(InvalidApiKey, msg))
                }
                code => {
                    let msg = format!("Unexpected HTTP response was received while trying to fetch feature flags. Status code: {code}");
                    error!(event_id = UnexpectedHttpResponse.as_u16(); "{}", msg);
                    Failed(ClientError::new(UnexpectedHttpResponse, msg))
                }
            },
            Err(err) => {
                let (kind, msg) = classify(&err, "fetch feature flags");
                error!(event_id = kind.as_u16(); "{}", msg);
                Failed(ClientError::new(kind, msg))
            }
        }
    }

    /// Posts a serialized analytics bucket.
    pub async fn send_analytics(&self, body: String) -> Result<(), ClientError> {
        let url = format!("{}/{ANALYTICS_PATH}", self.base_url);
        let result = self
            .http_client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!("Analytics were sent");
                Ok(())
            }
            Ok(response) => Err(ClientError::new(
                AnalyticsFlushFailure,
                format!(
                    "Unexpected HTTP response was received while trying to send analytics. Status code: {}",
                    response.status().as_u16()
                ),
            )),
            Err(err) => {
                let (_, msg) = classify(&err, "send analytics");
                Err(ClientError::new(AnalyticsFlushFailure, msg))
            }
        }
    }
}

fn invalid_content(msg: String) -> FetchResponse {
    error!(event_id = InvalidHttpResponseContent.as_u16(); "{}", msg);
    Failed(ClientError::new(InvalidHttpResponseContent, msg))
}

fn classify(err: &reqwest::Error, action: &str) -> (ErrorKind, String) {
    if err.is_timeout() {
        (
            HttpRequestTimeout,
            format!("Request timed out while trying to {action}."),
        )
    } else {
        (
            HttpRequestFailure,
            format!("Unexpected error occurred while trying to {action}. It is most likely due to a local network issue. {err}"),
        )
    }
}
