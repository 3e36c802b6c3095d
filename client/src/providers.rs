//! Ordered public-IP provider chain.
//!
//! Providers are tried strictly one at a time; the next one is only
//! contacted after the previous failed, answered garbage, or timed out.
//! The gate's own `/api/ip` endpoint sits last as the fallback of record.

use crate::error::ClientError;
use std::net::Ipv4Addr;
use std::time::Duration;
use tracing::{debug, warn};

/// How a provider encodes the address in its response body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderFormat {
    /// JSON object; the address lives under the named field.
    JsonField(&'static str),
    /// Bare text body, possibly with trailing whitespace.
    Text,
}

#[derive(Clone, Debug)]
pub struct IpProvider {
    pub name: &'static str,
    pub url: String,
    pub format: ProviderFormat,
}

/// The default chain: two public resolvers, then the gate itself.
pub fn default_providers(gate_base_url: &str) -> Vec<IpProvider> {
    vec![
        IpProvider {
            name: "ipify",
            url: "https://api.ipify.org?format=json".to_string(),
            format: ProviderFormat::JsonField("ip"),
        },
        IpProvider {
            name: "icanhazip",
            url: "https://ipv4.icanhazip.com".to_string(),
            format: ProviderFormat::Text,
        },
        IpProvider {
            name: "gate",
            url: format!("{}/api/ip", gate_base_url.trim_end_matches('/')),
            format: ProviderFormat::JsonField("ip"),
        },
    ]
}

/// Extract an IPv4 address from a provider response body.
fn parse_body(format: ProviderFormat, body: &str) -> Option<Ipv4Addr> {
    let candidate = match format {
        ProviderFormat::Text => body.trim().to_string(),
        ProviderFormat::JsonField(field) => serde_json::from_str::<serde_json::Value>(body)
            .ok()?
            .get(field)?
            .as_str()?
            .to_string(),
    };
    candidate.parse().ok()
}

async fn try_provider(
    http: &reqwest::Client,
    provider: &IpProvider,
) -> Result<Ipv4Addr, ClientError> {
    let body = http
        .get(&provider.url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    parse_body(provider.format, &body)
        .ok_or_else(|| ClientError::MalformedResponse(format!("{}: {body:.64}", provider.name)))
}

/// Walk the chain until one provider yields a valid IPv4 address.
pub async fn resolve_ip(
    http: &reqwest::Client,
    providers: &[IpProvider],
    timeout: Duration,
) -> Result<Ipv4Addr, ClientError> {
    for provider in providers {
        match tokio::time::timeout(timeout, try_provider(http, provider)).await {
            Ok(Ok(ip)) => {
                debug!(provider = provider.name, %ip, "resolved public IP");
                return Ok(ip);
            }
            Ok(Err(err)) => {
                warn!(provider = provider.name, %err, "IP provider failed");
            }
            Err(_) => {
                warn!(provider = provider.name, "IP provider timed out");
            }
        }
    }
    Err(ClientError::IpResolutionFailed)
}
