//! OAuth2 refresh-token grant with a cached access token.

use std::time::{Duration, Instant};

use {
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    tracing::debug,
};

use crate::{Error, Result, error::Context};

#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub refresh_token: Secret<String>,
    pub token_url: String,
}

#[derive(Clone)]
pub struct CachedAccessToken {
    pub token: Secret<String>,
    pub expires_at: Instant,
}

impl CachedAccessToken {
    fn is_valid(&self) -> bool {
        let refresh_skew = Duration::from_secs(60);
        self.expires_at > Instant::now() + refresh_skew
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

/// Return a valid access token, refreshing it when the cached one is missing
/// or about to expire.
pub async fn get_access_token(
    client: &reqwest::Client,
    credentials: &OAuthCredentials,
    cache: &tokio::sync::Mutex<Option<CachedAccessToken>>,
) -> Result<Secret<String>> {
    {
        let guard = cache.lock().await;
        if let Some(token) = guard.as_ref()
            && token.is_valid()
        {
            return Ok(token.token.clone());
        }
    }

    debug!("refreshing drive access token");
    let form = [
        ("grant_type", "refresh_token"),
        ("client_id", credentials.client_id.as_str()),
        ("client_secret", credentials.client_secret.expose_secret()),
        ("refresh_token", credentials.refresh_token.expose_secret()),
    ];

    let resp = client
        .post(&credentials.token_url)
        .form(&form)
        .send()
        .await
        .map_err(|e| Error::external("token request failed", e))?;
    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Token { status, body });
    }

    let body = resp.json::<TokenResponse>().await.context("invalid token response")?;
    let ttl = body.expires_in.unwrap_or(3600).max(120);
    let cached = CachedAccessToken {
        token: Secret::new(body.access_token),
        expires_at: Instant::now() + Duration::from_secs(ttl),
    };
    let token = cached.token.clone();

    let mut guard = cache.lock().await;
    *guard = Some(cached);
    Ok(token)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, mockito::Matcher};

    fn credentials(server: &mockito::Server) -> OAuthCredentials {
        OAuthCredentials {
            client_id: "client".into(),
            client_secret: Secret::new("secret".into()),
            refresh_token: Secret::new("refresh".into()),
            token_url: format!("{}/token", server.url()),
        }
    }

    #[tokio::test]
    async fn caches_token_until_expiry() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
                Matcher::UrlEncoded("refresh_token".into(), "refresh".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"access_token":"ya29.token","expires_in":3599,"token_type":"Bearer"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let creds = credentials(&server);
        let cache = tokio::sync::Mutex::new(None);
        let first = get_access_token(&client, &creds, &cache).await.unwrap();
        let second = get_access_token(&client, &creds, &cache).await.unwrap();

        mock.assert_async().await;
        assert_eq!(first.expose_secret(), "ya29.token");
        assert_eq!(second.expose_secret(), "ya29.token");
    }

    #[tokio::test]
    async fn expired_token_is_refreshed() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .with_status(200)
            .with_body(r#"{"access_token":"fresh"}"#)
            .create_async()
            .await;

        let cache = tokio::sync::Mutex::new(Some(CachedAccessToken {
            token: Secret::new("stale".into()),
            expires_at: Instant::now(),
        }));
        let token = get_access_token(&reqwest::Client::new(), &credentials(&server), &cache)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(token.expose_secret(), "fresh");
    }

    #[tokio::test]
    async fn rejected_refresh_is_a_token_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant"}"#)
            .create_async()
            .await;

        let cache = tokio::sync::Mutex::new(None);
        let err = get_access_token(&reqwest::Client::new(), &credentials(&server), &cache)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Token { status: 400, .. }));
    }
}
