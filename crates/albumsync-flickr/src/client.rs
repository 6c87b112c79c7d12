//! Flickr implementation of [`PhotoService`]

use crate::{
    error::{FlickrError, Result, CODE_FILETYPE_NOT_RECOGNISED, CODE_PHOTOSET_NOT_FOUND},
    oauth::OAuthCredentials,
    types::{
        check_stat, parse_upload_response, CreatePhotosetResponse, LoginResponse,
        PhotosetListResponse, PhotosetPhotosResponse, SizesResponse, UploadResponse,
    },
};
use albumsync_config::{Credentials, NetworkSettings};
use albumsync_types::{
    AlbumId, PhotoService, RemoteEntry, RetryConfig, TimeoutConfig, UploadOutcome, UploadRequest,
};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

/// Endpoints, timeouts and retry policy of a [`FlickrService`]
#[derive(Debug, Clone)]
pub struct FlickrConfig {
    /// REST endpoint
    pub api_url: String,
    /// Upload endpoint
    pub upload_url: String,
    /// Connect and request timeouts
    pub timeouts: TimeoutConfig,
    /// Retry policy for transient failures
    pub retry: RetryConfig,
}

impl FlickrConfig {
    /// Build from the network section of the configuration
    pub fn from_settings(network: &NetworkSettings) -> albumsync_types::Result<Self> {
        Ok(Self {
            api_url: network.api_base_url.clone(),
            upload_url: network.upload_url.clone(),
            timeouts: network.timeouts(),
            retry: network.retry()?,
        })
    }
}

impl Default for FlickrConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.flickr.com/services/rest".to_string(),
            upload_url: "https://up.flickr.com/services/upload/".to_string(),
            timeouts: TimeoutConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

/// Photo service backed by the Flickr REST and upload APIs.
///
/// Every request is signed with a pre-issued OAuth access token that must
/// carry the `delete` permission. Albums are Flickr photosets.
pub struct FlickrService {
    http: Client,
    config: FlickrConfig,
    oauth: OAuthCredentials,
    user_id: OnceCell<String>,
}

impl std::fmt::Debug for FlickrService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlickrService")
            .field("config", &self.config)
            .field("oauth", &self.oauth)
            .finish_non_exhaustive()
    }
}

impl FlickrService {
    /// Create a service
    pub fn new(oauth: OAuthCredentials, config: FlickrConfig) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(config.timeouts.connect_timeout)
            .timeout(config.timeouts.request_timeout)
            .user_agent(concat!("albumsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FlickrError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config,
            oauth,
            user_id: OnceCell::new(),
        })
    }

    /// Create a service from configured credentials and network settings
    pub fn from_settings(
        credentials: &Credentials,
        network: &NetworkSettings,
    ) -> albumsync_types::Result<Self> {
        credentials.validate()?;
        if !credentials.has_token() {
            return Err(FlickrError::Credentials(
                "no OAuth access token configured, set credentials.oauth_token and \
                 credentials.oauth_token_secret"
                    .to_string(),
            )
            .into());
        }

        let oauth = OAuthCredentials::new(
            &credentials.api_key,
            &credentials.api_secret,
            &credentials.oauth_token,
            &credentials.oauth_token_secret,
        );
        Ok(Self::new(oauth, FlickrConfig::from_settings(network)?)?)
    }

    /// NSID of the authenticated user, looked up once
    pub async fn user_id(&self) -> Result<&str> {
        let id = self
            .user_id
            .get_or_try_init(|| async {
                let login: LoginResponse =
                    self.call("flickr.test.login", Method::GET, &[]).await?;
                info!(
                    "Authenticated as {} ({})",
                    login.user.username.content, login.user.id
                );
                Ok::<_, FlickrError>(login.user.id)
            })
            .await?;
        Ok(id.as_str())
    }

    /// Send a request, retrying transient failures with exponential backoff.
    ///
    /// `build` is invoked once per attempt so that every attempt is signed
    /// with a fresh nonce.
    async fn send_with_retry<F>(&self, what: &str, build: F) -> Result<Response>
    where
        F: Fn() -> Result<RequestBuilder> + Send + Sync,
    {
        let retry = &self.config.retry;
        let mut attempt = 0;

        loop {
            let error = match build()?.send().await {
                Ok(response) if response.status().is_success() => {
                    debug!("{} succeeded: status={}", what, response.status());
                    return Ok(response);
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    let message = response.text().await.unwrap_or_default();
                    FlickrError::Http { status, message }
                }
                Err(e) => FlickrError::from(e),
            };

            if !error.is_transient() || attempt >= retry.max_retries {
                warn!("{} failed after {} attempt(s): {}", what, attempt + 1, error);
                return Err(error);
            }

            let delay = retry.delay_for_attempt(attempt);
            attempt += 1;
            warn!(
                "{} failed (attempt {}/{}): {}, retrying in {:?}",
                what,
                attempt,
                retry.max_retries + 1,
                error,
                delay
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Invoke a REST method and decode its JSON response
    #[instrument(skip_all, fields(method = %method))]
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        http_method: Method,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let mut base: Vec<(String, String)> = vec![
            ("method".to_string(), method.to_string()),
            ("format".to_string(), "json".to_string()),
            ("nojsoncallback".to_string(), "1".to_string()),
        ];
        base.extend(params.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())));

        let url = &self.config.api_url;
        let response = self
            .send_with_retry(method, || {
                let mut signed = base.clone();
                self.oauth.authorize(http_method.as_str(), url, &mut signed)?;
                Ok(if http_method == Method::GET {
                    self.http.get(url).query(&signed)
                } else {
                    self.http.request(http_method.clone(), url).form(&signed)
                })
            })
            .await?;

        let value: Value = response.json().await?;
        check_stat(&value)?;
        Ok(serde_json::from_value(value)?)
    }

    async fn post_photo(&self, request: &UploadRequest) -> Result<UploadResponse> {
        let fields: Vec<(String, String)> = vec![
            ("title".to_string(), request.title.clone()),
            ("tags".to_string(), request.tags.join(" ")),
            ("is_public".to_string(), "1".to_string()),
            ("is_friend".to_string(), "0".to_string()),
            ("is_family".to_string(), "0".to_string()),
        ];

        let url = &self.config.upload_url;
        let response = self
            .send_with_retry("upload", || {
                // The photo part is not covered by the signature.
                let mut signed = fields.clone();
                self.oauth.authorize("POST", url, &mut signed)?;
                let form = signed
                    .into_iter()
                    .fold(Form::new(), |form, (k, v)| form.text(k, v))
                    .part(
                        "photo",
                        Part::bytes(request.content.clone()).file_name(request.title.clone()),
                    );
                Ok(self.http.post(url).multipart(form))
            })
            .await?;

        parse_upload_response(&response.text().await?)
    }

    async fn add_to_album(
        &self,
        album_name: &str,
        album_id: Option<&str>,
        photo_id: &str,
    ) -> Result<AlbumId> {
        if let Some(album_id) = album_id {
            let added: Result<Value> = self
                .call(
                    "flickr.photosets.addPhoto",
                    Method::POST,
                    &[("photoset_id", album_id), ("photo_id", photo_id)],
                )
                .await;
            match added {
                Ok(_) => return Ok(album_id.to_string()),
                Err(e) if e.has_code(CODE_PHOTOSET_NOT_FOUND) => {
                    debug!("Album ID {} doesn't exist, creating it", album_id);
                }
                Err(e) => return Err(e),
            }
        }

        let created: CreatePhotosetResponse = self
            .call(
                "flickr.photosets.create",
                Method::POST,
                &[("title", album_name), ("primary_photo_id", photo_id)],
            )
            .await?;
        info!(
            "Created album \"{}\" with ID {}",
            album_name, created.photoset.id
        );
        Ok(created.photoset.id)
    }
}

#[async_trait]
impl PhotoService for FlickrService {
    #[instrument(skip(self))]
    async fn find_album(&self, name: &str) -> albumsync_types::Result<Option<AlbumId>> {
        let user_id = self.user_id().await?;
        let mut page = 1;
        let mut pages = 1;

        while page <= pages {
            let page_param = page.to_string();
            let response: PhotosetListResponse = self
                .call(
                    "flickr.photosets.getList",
                    Method::GET,
                    &[("user_id", user_id), ("page", page_param.as_str())],
                )
                .await?;
            pages = response.photosets.pages;
            page += 1;

            if let Some(album) = response
                .photosets
                .photoset
                .into_iter()
                .find(|album| album.title.content == name)
            {
                return Ok(Some(album.id));
            }
        }

        debug!("No album with name {}. It can be created later.", name);
        Ok(None)
    }

    #[instrument(skip(self))]
    async fn list_album(&self, album_id: &str) -> albumsync_types::Result<Vec<RemoteEntry>> {
        let user_id = self.user_id().await?;
        let mut entries = Vec::new();
        let mut page = 1;
        let mut pages = 1;

        while page <= pages {
            let page_param = page.to_string();
            let response: PhotosetPhotosResponse = self
                .call(
                    "flickr.photosets.getPhotos",
                    Method::GET,
                    &[
                        ("photoset_id", album_id),
                        ("user_id", user_id),
                        ("page", page_param.as_str()),
                        ("extras", "tags"),
                    ],
                )
                .await?;
            pages = response.photoset.pages;
            page += 1;

            debug!(
                "Album {} page {}/{}: {} photo(s)",
                album_id,
                page - 1,
                pages,
                response.photoset.photo.len()
            );
            entries.extend(
                response
                    .photoset
                    .photo
                    .iter()
                    .map(|photo| RemoteEntry::new(&photo.title, &photo.id, photo.tag_list())),
            );
        }

        Ok(entries)
    }

    #[instrument(skip(self, request), fields(title = %request.title))]
    async fn upload(&self, request: UploadRequest) -> albumsync_types::Result<UploadOutcome> {
        let photo_id = match self.post_photo(&request).await? {
            UploadResponse::Ok { photo_id } => photo_id,
            UploadResponse::Failed {
                code: CODE_FILETYPE_NOT_RECOGNISED,
                message,
            } => {
                info!(
                    "File {} is not an accepted file type, skipping",
                    request.title
                );
                return Ok(UploadOutcome::Rejected { reason: message });
            }
            UploadResponse::Failed { code, message } => {
                return Err(FlickrError::Api { code, message }.into());
            }
        };
        debug!("Uploaded photo ID: {}", photo_id);

        let album_id = self
            .add_to_album(&request.album_name, request.album_id.as_deref(), &photo_id)
            .await?;
        Ok(UploadOutcome::Uploaded { photo_id, album_id })
    }

    #[instrument(skip(self))]
    async fn download(&self, photo_id: &str) -> albumsync_types::Result<Vec<u8>> {
        let sizes: SizesResponse = self
            .call(
                "flickr.photos.getSizes",
                Method::GET,
                &[("photo_id", photo_id)],
            )
            .await?;
        let Some(source) = sizes.sizes.original_source() else {
            return Err(FlickrError::NotRetrievable {
                photo_id: photo_id.to_string(),
            }
            .into());
        };

        debug!("Fetching original of {} from {}", photo_id, source);
        let response = self
            .send_with_retry("download", || Ok(self.http.get(source)))
            .await?;
        let bytes = response.bytes().await.map_err(FlickrError::from)?;
        Ok(bytes.to_vec())
    }

    #[instrument(skip(self))]
    async fn delete(&self, photo_id: &str) -> albumsync_types::Result<()> {
        let _: Value = self
            .call("flickr.photos.delete", Method::POST, &[("photo_id", photo_id)])
            .await?;
        Ok(())
    }
}
