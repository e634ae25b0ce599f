/// DigitalOcean API client
use async_trait::async_trait;
use reqwest::{header, Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use super::api::DigitalOceanApi;
use super::models::*;
use super::token::TokenSource;
use crate::error::{Error, Result};

const DIGITALOCEAN_API_BASE: &str = "https://api.digitalocean.com/v2/";

/// Authenticated client for the DigitalOcean REST API
#[derive(Clone)]
pub struct DigitalOceanClient {
    client: Client,
    base_url: Url,
}

impl DigitalOceanClient {
    /// Create a new client against the public API endpoint
    pub fn new(token_source: &TokenSource) -> Result<Self> {
        Self::with_base_url(token_source, Url::parse(DIGITALOCEAN_API_BASE)?)
    }

    /// Create a new client against a custom API endpoint
    pub fn with_base_url(token_source: &TokenSource, mut base_url: Url) -> Result<Self> {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, token_source.token().authorization()?);
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// Make a GET request to the API
    async fn get<T: DeserializeOwned>(&self, endpoint: &'static str, url: Url) -> Result<T> {
        debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        Self::handle_response(response, endpoint).await
    }

    /// Make a POST request to the API
    async fn post<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        path: &str,
        body: &B,
    ) -> Result<R> {
        let url = self.url(path)?;
        debug!("POST {}", url);

        let response = self.client.post(url).json(body).send().await?;
        Self::handle_response(response, endpoint).await
    }

    /// Make a DELETE request to the API
    async fn delete(&self, endpoint: &'static str, path: &str) -> Result<()> {
        let url = self.url(path)?;
        debug!("DELETE {}", url);

        let response = self.client.delete(url).send().await?;
        Self::check(response, endpoint).await?;
        Ok(())
    }

    async fn handle_response<T: DeserializeOwned>(
        response: Response,
        endpoint: &'static str,
    ) -> Result<T> {
        let response = Self::check(response, endpoint).await?;
        Ok(response.json::<T>().await?)
    }

    /// Turn non-2xx responses into [`Error::Api`]
    async fn check(response: Response, endpoint: &'static str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response.text().await.unwrap_or_default();
        let (id, message) = match serde_json::from_str::<ErrorResponse>(&error_text) {
            Ok(error_response) => (error_response.id, error_response.message),
            Err(_) => (
                status.canonical_reason().unwrap_or("error").to_string(),
                error_text,
            ),
        };

        Err(Error::Api {
            endpoint,
            status,
            id,
            message,
        })
    }
}

#[async_trait]
impl DigitalOceanApi for DigitalOceanClient {
    async fn get_account(&self) -> Result<Account> {
        let response: AccountResponse = self.get("get account", self.url("account")?).await?;
        Ok(response.account)
    }

    async fn list_droplets(&self, options: ListOptions) -> Result<Vec<Droplet>> {
        let mut url = self.url("droplets")?;
        url.query_pairs_mut()
            .append_pair("page", &options.page.to_string())
            .append_pair("per_page", &options.per_page.to_string());

        let response: DropletListResponse = self.get("list droplets", url).await?;

        if let Some(meta) = &response.meta {
            if meta.total > response.droplets.len() as u64 {
                warn!(
                    "Listing returned {} of {} droplets; droplets beyond page {} are not visible",
                    response.droplets.len(),
                    meta.total,
                    options.page
                );
            }
        }

        Ok(response.droplets)
    }

    async fn get_volume(&self, volume_id: &str) -> Result<Volume> {
        let url = self.url(&format!("volumes/{}", volume_id))?;
        let response: VolumeResponse = self.get("get volume", url).await?;
        Ok(response.volume)
    }

    async fn create_volume(&self, request: &VolumeCreateRequest) -> Result<Volume> {
        let response: VolumeResponse = self.post("create volume", "volumes", request).await?;
        Ok(response.volume)
    }

    async fn delete_volume(&self, volume_id: &str) -> Result<()> {
        self.delete("delete volume", &format!("volumes/{}", volume_id))
            .await
    }

    async fn attach_volume(&self, volume_id: &str, droplet_id: u64) -> Result<Action> {
        let request = VolumeActionRequest {
            action_type: "attach".to_string(),
            droplet_id: Some(droplet_id),
        };

        let response: ActionResponse = self
            .post(
                "attach volume",
                &format!("volumes/{}/actions", volume_id),
                &request,
            )
            .await?;
        Ok(response.action)
    }

    async fn detach_volume(&self, volume_id: &str) -> Result<Action> {
        let request = VolumeActionRequest {
            action_type: "detach".to_string(),
            droplet_id: None,
        };

        let response: ActionResponse = self
            .post(
                "detach volume",
                &format!("volumes/{}/actions", volume_id),
                &request,
            )
            .await?;
        Ok(response.action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> DigitalOceanClient {
        let base_url = Url::parse(&format!("{}/v2", server.uri())).unwrap();
        DigitalOceanClient::with_base_url(&TokenSource::new("test-token"), base_url).unwrap()
    }

    fn action_body(action_type: &str) -> serde_json::Value {
        json!({"action": {"id": 72531856, "status": "in-progress", "type": action_type, "started_at": "2016-03-02T17:00:49Z", "completed_at": null, "resource_id": null, "resource_type": "backend", "region_slug": "nyc1"}})
    }

    #[test]
    fn test_client_creation() {
        let result = DigitalOceanClient::new(&TokenSource::new("test-token"));
        assert!(result.is_ok());
    }

    #[test]
    fn test_client_rejects_invalid_token() {
        let result = DigitalOceanClient::new(&TokenSource::new("bad\r\ntoken"));
        assert!(matches!(result, Err(Error::InvalidToken)));
    }

    #[tokio::test]
    async fn test_get_account_sends_bearer_token() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/account"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "account": {"droplet_limit": 25, "email": "sammy@digitalocean.com", "uuid": "b6fr89", "email_verified": true, "status": "active", "status_message": ""}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let account = client_for(&server).get_account().await.unwrap();
        assert_eq!(account.email, "sammy@digitalocean.com");
    }

    #[tokio::test]
    async fn test_list_droplets_requests_single_page() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/droplets"))
            .and(query_param("page", "1"))
            .and(query_param("per_page", "200"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "droplets": [
                    {"id": 1, "name": "web-1", "size_slug": "s-1vcpu-1gb", "networks": {"v4": [{"ip_address": "10.0.0.5", "type": "private"}]}},
                    {"id": 2, "name": "web-2", "size_slug": "s-1vcpu-1gb"}
                ],
                "links": {},
                "meta": {"total": 2}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let droplets = client_for(&server)
            .list_droplets(ListOptions {
                page: 1,
                per_page: 200,
            })
            .await
            .unwrap();

        assert_eq!(droplets.len(), 2);
        assert_eq!(droplets[0].private_ipv4(), Some("10.0.0.5"));
    }

    #[tokio::test]
    async fn test_api_error_body_is_surfaced() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/account"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "id": "unauthorized",
                "message": "Unable to authenticate you."
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).get_account().await.unwrap_err();
        match err {
            Error::Api {
                endpoint,
                status,
                id,
                message,
            } => {
                assert_eq!(endpoint, "get account");
                assert_eq!(status, reqwest::StatusCode::UNAUTHORIZED);
                assert_eq!(id, "unauthorized");
                assert_eq!(message, "Unable to authenticate you.");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_volume_is_not_found() {
        let server = MockServer::start().await;

        let err = client_for(&server).get_volume("missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_create_volume() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/volumes"))
            .and(body_json(json!({
                "region": "nyc1",
                "name": "pvc-1",
                "description": "data",
                "size_gigabytes": 10
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "volume": {"id": "506f78a4", "name": "pvc-1", "description": "data", "size_gigabytes": 10, "region": {"slug": "nyc1", "name": "New York 1"}, "droplet_ids": [], "created_at": "2016-03-02T17:00:49Z"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let volume = client_for(&server)
            .create_volume(&VolumeCreateRequest {
                region: "nyc1".to_string(),
                name: "pvc-1".to_string(),
                description: "data".to_string(),
                size_gigabytes: 10,
            })
            .await
            .unwrap();
        assert_eq!(volume.id, "506f78a4");
    }

    #[tokio::test]
    async fn test_delete_volume() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/v2/volumes/506f78a4"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).delete_volume("506f78a4").await.unwrap();
    }

    #[tokio::test]
    async fn test_volume_actions() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/volumes/506f78a4/actions"))
            .and(body_json(json!({"type": "attach", "droplet_id": 42})))
            .respond_with(ResponseTemplate::new(202).set_body_json(action_body("attach_volume")))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v2/volumes/506f78a4/actions"))
            .and(body_json(json!({"type": "detach"})))
            .respond_with(ResponseTemplate::new(202).set_body_json(action_body("detach_volume")))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);

        let attached = client.attach_volume("506f78a4", 42).await.unwrap();
        assert_eq!(attached.id, 72531856);
        assert_eq!(attached.action_type, "attach_volume");

        let detached = client.detach_volume("506f78a4").await.unwrap();
        assert_eq!(detached.action_type, "detach_volume");
    }

    #[tokio::test]
    async fn test_repeated_call_sees_scripted_failure() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/volumes/506f78a4"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "id": "server_error",
                "message": "Server was unable to give you a response."
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v2/volumes/506f78a4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "volume": {"id": "506f78a4", "name": "pvc-1", "description": "", "size_gigabytes": 10, "region": {"slug": "nyc1", "name": "New York 1"}, "droplet_ids": [42]}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);

        let err = client.get_volume("506f78a4").await.unwrap_err();
        assert!(!err.is_not_found());

        let volume = client.get_volume("506f78a4").await.unwrap();
        assert!(volume.is_attached_to(42));

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
    }
}
