//! Azure Cosmos DB (SQL API) adapter over the REST interface.

use crate::config::credentials::Credentials;
use crate::config::settings::HttpSettings;
use crate::domain::model::Record;
use crate::domain::ports::{Collection, Connector, Database, DocumentStore};
use crate::utils::error::{CadetError, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use sha2::Sha256;
use std::time::Duration;
use url::Url;

type HmacSha256 = Hmac<Sha256>;

const UPSERT_HEADER: &str = "x-ms-documentdb-is-upsert";
const PARTITION_KEY_HEADER: &str = "x-ms-documentdb-partitionkey";

/// Production connector; holds the HTTP settings applied to every client it builds.
#[derive(Debug, Clone, Default)]
pub struct CosmosConnector {
    settings: HttpSettings,
}

impl CosmosConnector {
    pub fn new(settings: HttpSettings) -> Self {
        Self { settings }
    }
}

impl Connector for CosmosConnector {
    type Store = CosmosClient;

    fn connect(&self, credentials: &Credentials) -> Result<Self::Store> {
        CosmosClient::new(credentials, &self.settings)
    }
}

#[derive(Clone)]
pub struct CosmosClient {
    http: reqwest::Client,
    endpoint: Url,
    key: Vec<u8>,
    api_version: String,
}

impl CosmosClient {
    pub fn new(credentials: &Credentials, settings: &HttpSettings) -> Result<Self> {
        let key = STANDARD
            .decode(credentials.key.trim())
            .map_err(|e| CadetError::AuthError {
                message: format!("the account key is not valid base64 ({})", e),
            })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            endpoint: credentials.endpoint.clone(),
            key,
            api_version: settings.api_version.clone(),
        })
    }

    pub fn from_uri_and_key(uri: &str, key: &str, settings: &HttpSettings) -> Result<Self> {
        Self::new(&Credentials::from_uri_and_key(uri, key)?, settings)
    }

    pub fn from_connection_string(connection_string: &str, settings: &HttpSettings) -> Result<Self> {
        Self::new(&Credentials::from_connection_string(connection_string)?, settings)
    }

    /// Master-key authorization token for one request.
    fn authorization(&self, verb: &Method, resource_type: &str, resource_link: &str, date: &str) -> Result<String> {
        let payload = format!(
            "{}\n{}\n{}\n{}\n\n",
            verb.as_str().to_lowercase(),
            resource_type.to_lowercase(),
            resource_link,
            date.to_lowercase()
        );

        let mut mac = HmacSha256::new_from_slice(&self.key).map_err(|e| CadetError::AuthError {
            message: e.to_string(),
        })?;
        mac.update(payload.as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());

        let token = format!("type=master&ver=1.0&sig={}", signature);
        Ok(url::form_urlencoded::byte_serialize(token.as_bytes()).collect())
    }

    /// Builds a signed request. `resource_link` is the path of the resource the
    /// signature covers; `path` is the URL path relative to the endpoint.
    fn request(&self, method: Method, resource_type: &str, resource_link: &str, path: &str) -> Result<RequestBuilder> {
        let url = self.endpoint.join(path).map_err(|e| {
            CadetError::config(format!("cannot build request URL for '{}': {}", path, e))
        })?;
        let date = chrono::Utc::now()
            .format("%a, %d %b %Y %H:%M:%S GMT")
            .to_string();
        let authorization = self.authorization(&method, resource_type, resource_link, &date)?;

        tracing::debug!("{} {}", method, url);
        Ok(self
            .http
            .request(method, url)
            .header("authorization", authorization)
            .header("x-ms-date", date)
            .header("x-ms-version", &self.api_version)
            .header("accept", "application/json"))
    }

    /// Maps a failed lookup onto the connection error kinds.
    async fn check_lookup(response: Response, resource: String) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = error_message(response).await;
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Err(CadetError::AuthError { message })
        } else {
            Err(CadetError::ConnectionError {
                resource,
                message: format!("{} ({})", message, status),
            })
        }
    }
}

#[async_trait]
impl DocumentStore for CosmosClient {
    type Database = CosmosDatabase;

    async fn database(&self, name: &str) -> Result<Self::Database> {
        let link = format!("dbs/{}", name);
        let response = self.request(Method::GET, "dbs", &link, &link)?.send().await?;
        Self::check_lookup(response, format!("database '{}'", name)).await?;

        Ok(CosmosDatabase {
            client: self.clone(),
            name: name.to_string(),
        })
    }
}

pub struct CosmosDatabase {
    client: CosmosClient,
    name: String,
}

#[derive(Debug, Deserialize)]
struct CollectionProperties {
    #[serde(rename = "partitionKey")]
    partition_key: Option<PartitionKeyDefinition>,
}

#[derive(Debug, Deserialize)]
struct PartitionKeyDefinition {
    #[serde(default)]
    paths: Vec<String>,
}

#[async_trait]
impl Database for CosmosDatabase {
    type Collection = CosmosCollection;

    async fn collection(&self, name: &str) -> Result<Self::Collection> {
        let link = format!("dbs/{}/colls/{}", self.name, name);
        let response = self
            .client
            .request(Method::GET, "colls", &link, &link)?
            .send()
            .await?;
        let response = CosmosClient::check_lookup(
            response,
            format!("collection '{}' in database '{}'", name, self.name),
        )
        .await?;

        let properties: CollectionProperties = response.json().await?;
        let partition_key_paths = properties
            .partition_key
            .map(|pk| pk.paths)
            .unwrap_or_default();
        tracing::debug!("Partition key paths: {:?}", partition_key_paths);

        Ok(CosmosCollection {
            client: self.client.clone(),
            link,
            partition_key_paths,
        })
    }
}

pub struct CosmosCollection {
    client: CosmosClient,
    link: String,
    partition_key_paths: Vec<String>,
}

#[async_trait]
impl Collection for CosmosCollection {
    async fn upsert(&self, record: &Record) -> Result<()> {
        let path = format!("{}/docs", self.link);
        let mut request = self
            .client
            .request(Method::POST, "docs", &self.link, &path)?
            .header(UPSERT_HEADER, "True")
            .json(record);

        if !self.partition_key_paths.is_empty() {
            let header = partition_key_header(record, &self.partition_key_paths);
            request = request.header(PARTITION_KEY_HEADER, header);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        Err(CadetError::RequestError {
            status: status.as_u16(),
            message: error_message(response).await,
        })
    }
}

/// JSON array with one value per partition key path (hierarchical keys have
/// several). A path the record has no value for contributes `{}`.
fn partition_key_header(record: &Record, paths: &[String]) -> String {
    let values = paths
        .iter()
        .map(|path| {
            partition_key_value(record, path)
                .cloned()
                .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()))
        })
        .collect();
    serde_json::Value::Array(values).to_string()
}

fn partition_key_value<'a>(record: &'a Record, path: &str) -> Option<&'a serde_json::Value> {
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    segments
        .next()
        .and_then(|first| record.get(first))
        .and_then(|root| segments.try_fold(root, |value, segment| value.get(segment)))
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    message: String,
}

async fn error_message(response: Response) -> String {
    let text = response.text().await.unwrap_or_default();
    serde_json::from_str::<ServiceError>(&text)
        .map(|e| e.message)
        .unwrap_or(text)
}
