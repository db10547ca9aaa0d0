//! Player identity verification against the external account API.
//!
//! Captains must prove their `name#tag` resolves to a real account before they
//! can register a team. The lookup retries on rate limiting with a doubling delay.

use crate::models::Account;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const NAME_LEN: std::ops::RangeInclusive<usize> = 3..=16;
const TAG_LEN: std::ops::RangeInclusive<usize> = 3..=5;

/// Identity lookup failures. Display text is shown to users as-is.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum IdentityError {
    #[error("Riot ID must look like name#tag (name 3-16 letters, digits or spaces; tag 3-5 letters or digits)")]
    Malformed,
    #[error("Player verification is not configured on this server")]
    NotConfigured,
    #[error("No account found for {0}")]
    NotFound(String),
    #[error("Player verification is busy, try again in a minute")]
    RateLimited,
    #[error("Player verification failed: {0}")]
    Upstream(String),
}

/// Split and validate a `name#tag` identity string.
pub fn parse_riot_id(input: &str) -> Result<(&str, &str), IdentityError> {
    let (name, tag) = input.trim().split_once('#').ok_or(IdentityError::Malformed)?;
    let name_ok = NAME_LEN.contains(&name.chars().count())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == ' ');
    let tag_ok = TAG_LEN.contains(&tag.chars().count()) && tag.chars().all(|c| c.is_ascii_alphanumeric());
    if !name_ok || !tag_ok {
        return Err(IdentityError::Malformed);
    }
    Ok((name, tag))
}

/// Resolves an identity string to an account.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, riot_id: &str) -> Result<Account, IdentityError>;
}

/// Settings for the HTTP verifier.
#[derive(Clone, Debug)]
pub struct IdentityConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Extra attempts after a 429.
    pub max_retries: u32,
    /// Delay before the first retry; doubled on each further retry.
    pub backoff: Duration,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.henrikdev.xyz".to_string(),
            api_key: None,
            max_retries: 3,
            backoff: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    data: AccountData,
}

#[derive(Debug, Deserialize)]
struct AccountData {
    puuid: String,
    name: String,
    tag: String,
    region: String,
}

/// Verifier backed by the public account-lookup HTTP API.
pub struct HttpIdentityVerifier {
    config: IdentityConfig,
    client: reqwest::Client,
}

impl HttpIdentityVerifier {
    pub fn new(config: IdentityConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        self.config.backoff.saturating_mul(1 << attempt.min(16))
    }
}

#[async_trait]
impl IdentityVerifier for HttpIdentityVerifier {
    async fn verify(&self, riot_id: &str) -> Result<Account, IdentityError> {
        let (name, tag) = parse_riot_id(riot_id)?;
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(IdentityError::NotConfigured)?;
        let url = format!(
            "{}/valorant/v1/account/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            name,
            tag
        );

        let mut attempt = 0;
        loop {
            let response = self
                .client
                .get(&url)
                .header(reqwest::header::AUTHORIZATION, api_key)
                .send()
                .await
                .map_err(|e| IdentityError::Upstream(e.to_string()))?;

            match response.status() {
                status if status.is_success() => {
                    let body: AccountResponse = response
                        .json()
                        .await
                        .map_err(|e| IdentityError::Upstream(format!("bad response: {e}")))?;
                    return Ok(Account {
                        id: body.data.puuid,
                        name: body.data.name,
                        tag: body.data.tag,
                        region: body.data.region,
                    });
                }
                StatusCode::NOT_FOUND => {
                    return Err(IdentityError::NotFound(format!("{name}#{tag}")));
                }
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    log::warn!("Identity API rejected the configured key ({})", response.status());
                    return Err(IdentityError::Upstream("API key rejected".to_string()));
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    if attempt >= self.config.max_retries {
                        log::warn!("Identity API still rate limited after {} retries", attempt);
                        return Err(IdentityError::RateLimited);
                    }
                    let delay = self.delay_for(attempt);
                    log::debug!("Identity API rate limited, retrying in {:?}", delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                status => {
                    return Err(IdentityError::Upstream(format!("unexpected status {status}")));
                }
            }
        }
    }
}
