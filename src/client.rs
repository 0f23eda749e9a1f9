use crate::campus::Campus;
use crate::config::Config;
use crate::error::Result;

/// One exchanged response, as seen by the translation layer. Non-2xx
/// statuses are not an error at this level; the caller decides what a
/// status means for its request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub reason: String,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Credentialed client for one campus's calendar and accounts services.
pub struct CampusClient {
    campus: Campus,
    base_url: String,
    username: String,
    password: String,
    client: reqwest::Client,
}

impl CampusClient {
    pub fn new(
        campus: Campus,
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> CampusClient {
        CampusClient {
            campus,
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> CampusClient {
        self.base_url = base_url;
        self
    }

    pub fn campus(&self) -> Campus {
        self.campus
    }

    /// GET an accounts-service resource; the response body is XML.
    pub async fn get(&self, path: &str) -> Result<HttpResponse> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .header("Accept", "application/xml")
            .send()
            .await?;

        let response = into_http_response(response).await?;
        self.log_response(path, &response);
        Ok(response)
    }

    /// POST to a calendars-service method; request and response are JSON.
    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<HttpResponse> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.username, Some(&self.password))
            .json(body)
            .send()
            .await?;

        let response = into_http_response(response).await?;
        self.log_response(path, &response);
        Ok(response)
    }

    fn log_response(&self, path: &str, response: &HttpResponse) {
        if response.is_success() {
            tracing::info!(
                "{} {} ==status==> {}",
                self.campus.display_name(),
                path,
                response.status
            );
        } else {
            tracing::error!(
                "{} {} ==error==> {} {}",
                self.campus.display_name(),
                path,
                response.status,
                response.reason
            );
        }
    }
}

/// Unauthenticated client for published `.ics` feeds.
pub struct FeedClient {
    base_url: String,
    client: reqwest::Client,
}

impl FeedClient {
    pub fn new(base_url: impl Into<String>) -> FeedClient {
        FeedClient {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> FeedClient {
        self.base_url = base_url;
        self
    }

    pub async fn get(&self, path: &str) -> Result<HttpResponse> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.get(&url).send().await?;
        let response = into_http_response(response).await?;

        if response.is_success() {
            tracing::info!("feed {} ==status==> {}", path, response.status);
        } else {
            tracing::error!(
                "feed {} ==error==> {} {}",
                path,
                response.status,
                response.reason
            );
        }
        Ok(response)
    }
}

async fn into_http_response(response: reqwest::Response) -> Result<HttpResponse> {
    let status = response.status();
    let reason = status.canonical_reason().unwrap_or("").to_string();
    let body = response.text().await?;
    Ok(HttpResponse {
        status: status.as_u16(),
        reason,
        body,
    })
}

/// The campus-to-client lookup table: three credentialed service identities
/// plus the unauthenticated feed identity.
pub struct ServiceClients {
    sea: CampusClient,
    bot: CampusClient,
    tac: CampusClient,
    feed: FeedClient,
}

impl ServiceClients {
    pub fn new(
        sea: CampusClient,
        bot: CampusClient,
        tac: CampusClient,
        feed: FeedClient,
    ) -> ServiceClients {
        ServiceClients {
            sea,
            bot,
            tac,
            feed,
        }
    }

    pub fn from_config(config: &Config) -> ServiceClients {
        let build = |campus: Campus| {
            let c = config.campus(campus);
            CampusClient::new(
                campus,
                c.base_url.clone(),
                c.username.clone(),
                c.password.clone(),
            )
        };
        ServiceClients {
            sea: build(Campus::Sea),
            bot: build(Campus::Bot),
            tac: build(Campus::Tac),
            feed: FeedClient::new(config.feed.base_url.clone()),
        }
    }

    pub fn campus(&self, campus: Campus) -> &CampusClient {
        match campus {
            Campus::Sea => &self.sea,
            Campus::Bot => &self.bot,
            Campus::Tac => &self.tac,
        }
    }

    pub fn feed(&self) -> &FeedClient {
        &self.feed
    }
}
