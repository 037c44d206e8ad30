use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::header::SET_COOKIE;
use reqwest::{Response, Url};
use tracing::{debug, warn};

use super::{Page, PageFetcher};
use crate::error::PortalError;

/// Cookie-carrying HTTP session against the portal.
pub struct HttpSession {
    client: reqwest::Client,
    jar: Arc<Jar>,
    base: Url,
}

impl HttpSession {
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url).with_context(|| format!("Invalid base URL '{}'", base_url))?;
        let jar = Arc::new(Jar::default());
        let client = reqwest::Client::builder()
            .user_agent("eamis/0.1 (NKU-EAMIS query tool)")
            .cookie_provider(jar.clone())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, jar, base })
    }

    async fn into_page(url: &str, response: Response) -> Result<Page> {
        let status = response.status();
        if !status.is_success() {
            return Err(PortalError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            }
            .into());
        }

        let set_cookies: Vec<String> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::to_string)
            .collect();
        let body = response.text().await.context("Failed to read response body")?;

        debug!(
            url = %url,
            bytes = body.len(),
            cookies = set_cookies.len(),
            "Received page"
        );
        Ok(Page { body, set_cookies })
    }
}

#[async_trait]
impl PageFetcher for HttpSession {
    async fn get(&self, url: &str) -> Result<Page> {
        debug!(url = %url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;
        Self::into_page(url, response).await
    }

    async fn post(&self, url: &str, form: &[(&str, &str)]) -> Result<Page> {
        debug!(url = %url, fields = form.len(), "POST");
        let response = self
            .client
            .post(url)
            .form(form)
            .send()
            .await
            .with_context(|| format!("Failed to post to {}", url))?;
        Self::into_page(url, response).await
    }

    fn set_cookie(&self, name: &str, value: &str) {
        match self.base.join("/") {
            Ok(url) => self
                .jar
                .add_cookie_str(&format!("{}={}; Path=/", name, value), &url),
            Err(e) => warn!(error = %e, cookie = %name, "Could not set cookie"),
        }
    }
}
