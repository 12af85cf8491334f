use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::connection::{Connection, ConnectionSource};
use crate::error::{HookError, Result};

/// Proxy URL keyed by the scheme of the target (`https`, `http` or `all`).
pub type Proxies = BTreeMap<String, String>;
pub type Headers = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostRequest {
    /// Path appended to the connection's base URL, or a full URL when no connection is used.
    pub endpoint: String,
    pub body: String,
    pub headers: Headers,
    pub proxies: Proxies,
    /// Turn non-2xx responses into [`HookError::HttpStatus`].
    pub check_response: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn post(&self, request: PostRequest) -> Result<HttpResponse>;
}

/// Join a base URL and an endpoint with exactly one `/` between them when both are present.
pub fn url_from_endpoint(base_url: &str, endpoint: &str) -> String {
    if !base_url.is_empty()
        && !base_url.ends_with('/')
        && !endpoint.is_empty()
        && !endpoint.starts_with('/')
    {
        format!("{base_url}/{endpoint}")
    } else {
        format!("{base_url}{endpoint}")
    }
}

/// reqwest-backed client that resolves its base URL and credentials from a named connection.
///
/// The connection is looked up on every request, so a missing connection
/// surfaces at send time.
pub struct HttpHook {
    http_conn_id: Option<String>,
    connections: Arc<dyn ConnectionSource>,
}

impl HttpHook {
    pub fn new(http_conn_id: Option<String>, connections: Arc<dyn ConnectionSource>) -> Self {
        Self {
            http_conn_id,
            connections,
        }
    }

    fn connection(&self) -> Result<Option<Connection>> {
        match self.http_conn_id.as_deref() {
            Some(id) if !id.is_empty() => self.connections.lookup(id).map(Some),
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl HttpClient for HttpHook {
    async fn post(&self, request: PostRequest) -> Result<HttpResponse> {
        let conn = self.connection()?;
        let base_url = conn.as_ref().map(Connection::base_url).unwrap_or_default();
        let url = url_from_endpoint(&base_url, &request.endpoint);
        // The endpoint is usually the webhook secret; keep it out of errors and logs.
        let target = redact(&url);

        let client = build_client(&request.proxies, &target)?;

        let mut req = client.post(&url).body(request.body);
        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        if let Some(conn) = &conn {
            if let Some(login) = conn.login.as_deref().filter(|l| !l.is_empty()) {
                req = req.basic_auth(login, conn.password.as_deref());
            }
        }

        debug!(host = %target, proxied = !request.proxies.is_empty(), "Posting webhook request");

        let response = req.send().await.map_err(|e| HookError::Transport {
            url: target.clone(),
            source: e.without_url(),
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| HookError::Transport {
            url: target.clone(),
            source: e.without_url(),
        })?;

        debug!(host = %target, status = status.as_u16(), "Webhook responded");

        if request.check_response && !status.is_success() {
            return Err(HookError::HttpStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
                body,
            });
        }

        Ok(HttpResponse {
            status: status.as_u16(),
            body,
        })
    }
}

fn build_client(proxies: &Proxies, target: &str) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    for (scheme, proxy_url) in proxies {
        let proxy = match scheme.as_str() {
            "https" => reqwest::Proxy::https(proxy_url.as_str()),
            "http" => reqwest::Proxy::http(proxy_url.as_str()),
            "all" => reqwest::Proxy::all(proxy_url.as_str()),
            other => {
                return Err(HookError::InvalidProxy {
                    url: proxy_url.clone(),
                    reason: format!("unsupported proxy scheme '{other}'"),
                    source: None,
                })
            }
        }
        .map_err(|e| HookError::InvalidProxy {
            url: proxy_url.clone(),
            reason: e.to_string(),
            source: Some(e),
        })?;
        builder = builder.proxy(proxy);
    }
    builder.build().map_err(|source| HookError::Transport {
        url: target.to_string(),
        source,
    })
}

fn redact(url: &str) -> String {
    match reqwest::Url::parse(url) {
        Ok(parsed) => format!(
            "{}://{}",
            parsed.scheme(),
            parsed.host_str().unwrap_or_default()
        ),
        Err(_) => "<webhook endpoint>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use std::collections::HashMap;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn hook_for(host: Option<&str>, login: Option<&str>) -> HttpHook {
        let mut connections = HashMap::new();
        connections.insert(
            "slack_default".to_string(),
            Connection {
                host: host.map(str::to_string),
                login: login.map(str::to_string),
                password: Some("pw".into()),
                ..Default::default()
            },
        );
        HttpHook::new(Some("slack_default".into()), Arc::new(connections))
    }

    fn json_post(endpoint: &str, body: &str) -> PostRequest {
        let mut headers = Headers::new();
        headers.insert("Content-type".into(), "application/json".into());
        PostRequest {
            endpoint: endpoint.into(),
            body: body.into(),
            headers,
            proxies: Proxies::new(),
            check_response: true,
        }
    }

    #[test]
    fn endpoint_joining() {
        assert_eq!(url_from_endpoint("https://h", "T/B/X"), "https://h/T/B/X");
        assert_eq!(url_from_endpoint("https://h/", "T/B/X"), "https://h/T/B/X");
        assert_eq!(url_from_endpoint("https://h", "/T/B/X"), "https://h/T/B/X");
        assert_eq!(url_from_endpoint("https://h", ""), "https://h");
        assert_eq!(
            url_from_endpoint("", "https://hooks.slack.com/services/T/B/X"),
            "https://hooks.slack.com/services/T/B/X"
        );
    }

    #[test]
    fn redaction_drops_path() {
        assert_eq!(
            redact("https://hooks.slack.com/services/T/B/X"),
            "https://hooks.slack.com"
        );
        assert_eq!(redact("T/B/X"), "<webhook endpoint>");
    }

    #[tokio::test]
    async fn posts_to_connection_base_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/services/T000/B000/XXX"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({"text": "hi"})))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let hook = hook_for(Some(format!("{}/services", server.uri()).as_str()), None);
        let response = hook
            .post(json_post("T000/B000/XXX", r#"{"text":"hi"}"#))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, "ok");
    }

    #[tokio::test]
    async fn login_enables_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(header("authorization", "Basic dXNlcjpwdw=="))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let hook = hook_for(Some(server.uri().as_str()), Some("user"));
        hook.post(json_post("hook", "{}")).await.unwrap();
    }

    #[tokio::test]
    async fn without_connection_endpoint_is_the_full_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/services/T/B/X"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let hook = HttpHook::new(None, Arc::new(HashMap::<String, Connection>::new()));
        let endpoint = format!("{}/services/T/B/X", server.uri());
        hook.post(json_post(&endpoint, "{}")).await.unwrap();
    }

    #[tokio::test]
    async fn non_success_status_is_checked() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no_service"))
            .mount(&server)
            .await;

        let hook = hook_for(Some(server.uri().as_str()), None);
        let err = hook.post(json_post("T/B/X", "{}")).await.unwrap_err();
        assert_matches!(
            &err,
            HookError::HttpStatus { status: 404, body, .. } if body == "no_service"
        );
        assert_eq!(err.to_string(), "404:Not Found");

        let mut unchecked = json_post("T/B/X", "{}");
        unchecked.check_response = false;
        let response = hook.post(unchecked).await.unwrap();
        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn https_proxy_is_not_used_for_plain_http() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let hook = hook_for(Some(server.uri().as_str()), None);
        let mut request = json_post("T/B/X", "{}");
        request
            .proxies
            .insert("https".into(), "http://127.0.0.1:9".into());
        hook.post(request).await.unwrap();
    }

    #[tokio::test]
    async fn unknown_proxy_scheme_is_rejected() {
        let hook = hook_for(Some("http://127.0.0.1:9"), None);
        let mut request = json_post("T/B/X", "{}");
        request.proxies.insert("socks".into(), "http://p:8080".into());
        let err = hook.post(request).await.unwrap_err();
        assert_matches!(
            &err,
            HookError::InvalidProxy { url, reason, source: None }
                if url == "http://p:8080" && reason.contains("socks")
        );
        assert_eq!(
            err.to_string(),
            "invalid proxy 'http://p:8080': unsupported proxy scheme 'socks'"
        );
    }

    #[tokio::test]
    async fn connection_refused_is_a_transport_error() {
        let hook = hook_for(Some("http://127.0.0.1:9"), None);
        let err = hook.post(json_post("T/B/X", "{}")).await.unwrap_err();
        assert_matches!(&err, HookError::Transport { url, .. } if url == "http://127.0.0.1");
        assert!(!err.to_string().contains("T/B/X"));
    }

    #[tokio::test]
    async fn missing_connection_propagates() {
        let hook = HttpHook::new(
            Some("nope".into()),
            Arc::new(HashMap::<String, Connection>::new()),
        );
        assert_matches!(
            hook.post(json_post("T/B/X", "{}")).await,
            Err(HookError::NotFound(name)) if name == "nope"
        );
    }
}
