use reqwest::StatusCode;
use resources::{
    models::ObjectList,
    objects::{
        deployment::Deployment,
        service::Service,
        simple_app::{SimpleApp, API_GROUP, API_VERSION, PLURAL},
    },
};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Error, Result};

/// Typed client for the control-plane REST API, scoped to one namespace.
/// All calls are synchronous from the engine's perspective: the cycle
/// blocks on each request, and there is no per-call timeout.
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    namespace: String,
}

impl Client {
    pub fn new(base_url: String, namespace: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            namespace,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Fail unless the SimpleApp group/version is served.
    pub async fn check_api_group(&self) -> Result<()> {
        let path = format!("/apis/{}/{}", API_GROUP, API_VERSION);
        let response = self.http.get(self.url(&path)).send().await?;
        Self::expect_success(path, response).await?;
        Ok(())
    }

    pub async fn list_simple_apps(&self) -> Result<Vec<SimpleApp>> {
        self.list(self.simple_apps_path(), None).await
    }

    /// Persist a normalized specification so later cycles list the
    /// cleaned form.
    pub async fn put_simple_app(&self, app: &SimpleApp) -> Result<()> {
        let path = format!("{}/{}", self.simple_apps_path(), app.metadata.name);
        self.put(path, app).await
    }

    pub async fn get_deployment(&self, name: &str) -> Result<Option<Deployment>> {
        self.get(format!("{}/{}", self.deployments_path(), name)).await
    }

    pub async fn create_deployment(&self, deployment: &Deployment) -> Result<()> {
        self.post(self.deployments_path(), deployment).await
    }

    pub async fn update_deployment(&self, deployment: &Deployment) -> Result<()> {
        let path = format!("{}/{}", self.deployments_path(), deployment.metadata.name);
        self.put(path, deployment).await
    }

    pub async fn delete_deployment(&self, name: &str) -> Result<()> {
        self.delete(format!("{}/{}", self.deployments_path(), name)).await
    }

    /// Deployments in the namespace carrying `selector`.
    pub async fn list_deployments(&self, selector: &str) -> Result<Vec<Deployment>> {
        self.list(self.deployments_path(), Some(selector)).await
    }

    pub async fn get_service(&self, name: &str) -> Result<Option<Service>> {
        self.get(format!("{}/{}", self.services_path(), name)).await
    }

    pub async fn create_service(&self, service: &Service) -> Result<()> {
        self.post(self.services_path(), service).await
    }

    pub async fn update_service(&self, service: &Service) -> Result<()> {
        let path = format!("{}/{}", self.services_path(), service.metadata.name);
        self.put(path, service).await
    }

    pub async fn delete_service(&self, name: &str) -> Result<()> {
        self.delete(format!("{}/{}", self.services_path(), name)).await
    }

    /// Services in the namespace carrying `selector`.
    pub async fn list_services(&self, selector: &str) -> Result<Vec<Service>> {
        self.list(self.services_path(), Some(selector)).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn simple_apps_path(&self) -> String {
        format!(
            "/apis/{}/{}/namespaces/{}/{}",
            API_GROUP, API_VERSION, self.namespace, PLURAL
        )
    }

    fn deployments_path(&self) -> String {
        format!("/apis/apps/v1/namespaces/{}/deployments", self.namespace)
    }

    fn services_path(&self) -> String {
        format!("/api/v1/namespaces/{}/services", self.namespace)
    }

    async fn list<T: DeserializeOwned>(
        &self,
        path: String,
        selector: Option<&str>,
    ) -> Result<Vec<T>> {
        let mut request = self.http.get(self.url(&path));
        if let Some(selector) = selector {
            request = request.query(&[("labelSelector", selector)]);
        }
        let response = Self::expect_success(path, request.send().await?).await?;
        Ok(response.json::<ObjectList<T>>().await?.items)
    }

    /// `Ok(None)` when the object does not exist; callers take the
    /// create path from there.
    async fn get<T: DeserializeOwned>(&self, path: String) -> Result<Option<T>> {
        let response = self.http.get(self.url(&path)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::expect_success(path, response).await?;
        Ok(Some(response.json::<T>().await?))
    }

    async fn post<T: Serialize>(&self, path: String, body: &T) -> Result<()> {
        let response = self.http.post(self.url(&path)).json(body).send().await?;
        Self::expect_success(path, response).await?;
        Ok(())
    }

    async fn put<T: Serialize>(&self, path: String, body: &T) -> Result<()> {
        let response = self.http.put(self.url(&path)).json(body).send().await?;
        Self::expect_success(path, response).await?;
        Ok(())
    }

    async fn delete(&self, path: String) -> Result<()> {
        let response = self.http.delete(self.url(&path)).send().await?;
        Self::expect_success(path, response).await?;
        Ok(())
    }

    async fn expect_success(
        path: String,
        response: reqwest::Response,
    ) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(Error::ApiStatus {
            status,
            path,
            message,
        })
    }
}
