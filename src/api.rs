// Fairspace API client: a small blocking HTTP client that talks to the
// REST, WebDAV, SPARQL and view endpoints of one Fairspace instance, using
// a Keycloak access token that is fetched lazily and refreshed on expiry.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use oxrdf::Graph;
use reqwest::blocking::{multipart, Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Url};
use serde_json::Value;
use tracing::{debug, error, info};

use crate::auth::{self, Token};
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::rdf;
use crate::model::{
    Count, CountRequest, MetadataFormat, NewWorkspace, Page, SparqlResults, ViewRequest, Workspace,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

/// Content of one file in a multipart upload.
#[derive(Debug, Clone)]
pub enum FileContent {
    Empty,
    Bytes(Vec<u8>),
    /// Streamed from a local file.
    Path(PathBuf),
}

/// Client for one Fairspace instance. Holds a single HTTP session
/// (connection pool and cookie jar) and the current access token.
pub struct FairspaceApi {
    client: Client,
    config: ApiConfig,
    token: Option<Token>,
}

impl FairspaceApi {
    pub fn new(config: ApiConfig) -> Result<Self> {
        Ok(FairspaceApi {
            client: build_client()?,
            config,
            token: None,
        })
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Start a new HTTP session. The access token survives; cookies and
    /// pooled connections do not.
    pub fn init_session(&mut self) -> Result<()> {
        self.client = build_client()?;
        Ok(())
    }

    /// Unconditionally fetch a new access token.
    pub fn fetch_token(&mut self) -> Result<String> {
        let token = auth::fetch_token(&self.client, &self.config)?;
        let value = token.value().to_string();
        self.token = Some(token);
        Ok(value)
    }

    /// Return the cached token, fetching a new one when none is held or it
    /// expires within [`auth::TOKEN_EXPIRATION_BUFFER`].
    pub fn get_token(&mut self) -> Result<String> {
        match &self.token {
            Some(token) if token.is_usable_at(Instant::now()) => Ok(token.value().to_string()),
            _ => self.fetch_token(),
        }
    }

    /// Authorization header for the current token.
    fn auth_headers(&mut self) -> Result<HeaderMap> {
        let token = self.get_token()?;
        let mut headers = HeaderMap::new();
        let val = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| Error::Config(format!("invalid access token: {e}")))?;
        headers.insert(AUTHORIZATION, val);
        Ok(headers)
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/{}", self.config.url, path)
    }

    /// Same segment encoding as the file IRIs in uploaded metadata.
    fn webdav_url(&self, path: &str) -> Result<Url> {
        rdf::webdav_dir_url(&self.config.webdav_root(), path)
    }

    /// Return the workspace with `code`, creating it when absent.
    pub fn find_or_create_workspace(&mut self, code: &str) -> Result<Workspace> {
        let headers = self.auth_headers()?;
        let res = self
            .client
            .get(self.api_url("workspaces/"))
            .headers(headers.clone())
            .send()?;
        let workspaces: Vec<Workspace> = ensure_success(res, "fetching workspaces")?.json()?;
        if let Some(ws) = workspaces.into_iter().find(|ws| ws.code == code) {
            return Ok(ws);
        }

        info!("Creating new workspace ...");
        let res = self
            .client
            .put(self.api_url("workspaces/"))
            .headers(headers)
            .json(&NewWorkspace { code, title: code })
            .send()?;
        let ws: Workspace = ensure_success(res, "creating workspace")?.json()?;
        info!("Workspace created.");
        Ok(ws)
    }

    /// Whether a WebDAV path exists (`PROPFIND` with `Depth: 0`).
    pub fn exists(&mut self, path: &str) -> Result<bool> {
        let mut headers = self.auth_headers()?;
        headers.insert("Depth", HeaderValue::from_static("0"));
        let res = self
            .client
            .request(webdav_method("PROPFIND")?, self.webdav_url(path)?)
            .headers(headers)
            .send()?;
        Ok(res.status().is_success())
    }

    /// Create a WebDAV directory unless it already exists. A top-level
    /// directory (a collection) is owned by `workspace` when one is given.
    pub fn ensure_dir(&mut self, path: &str, workspace: Option<&Workspace>) -> Result<()> {
        if self.exists(path)? {
            return Ok(());
        }
        let mut headers = self.auth_headers()?;
        if let Some(ws) = workspace {
            let owner = HeaderValue::from_str(&ws.iri)
                .map_err(|e| Error::Config(format!("invalid workspace iri '{}': {e}", ws.iri)))?;
            headers.insert("Owner", owner);
        }
        let res = self
            .client
            .request(webdav_method("MKCOL")?, self.webdav_url(path)?)
            .headers(headers)
            .send()?;
        ensure_success(res, format!("creating directory '{path}'"))?;
        Ok(())
    }

    /// Upload files into a WebDAV directory in one multipart request.
    pub fn upload_files(&mut self, path: &str, files: Vec<(String, FileContent)>) -> Result<()> {
        let start = Instant::now();
        let count = files.len();
        let mut form = multipart::Form::new().text("action", "upload_files");
        for (name, content) in files {
            let part = match content {
                FileContent::Empty => multipart::Part::bytes(Vec::new()),
                FileContent::Bytes(bytes) => multipart::Part::bytes(bytes),
                FileContent::Path(local) => multipart::Part::file(&local)?,
            };
            form = form.part(name.clone(), part.file_name(name));
        }
        let headers = self.auth_headers()?;
        let res = self
            .client
            .post(self.webdav_url(path)?)
            .headers(headers)
            .multipart(form)
            .send()?;
        ensure_success(res, format!("uploading files into '{path}'"))?;
        debug!(count, elapsed_ms = start.elapsed().as_millis() as u64, "files uploaded");
        Ok(())
    }

    /// Upload local files, keyed by their name on the server.
    pub fn upload_files_by_path<I, S, P>(&mut self, path: &str, files: I) -> Result<()>
    where
        I: IntoIterator<Item = (S, P)>,
        S: Into<String>,
        P: Into<PathBuf>,
    {
        let files = files
            .into_iter()
            .map(|(name, local)| (name.into(), FileContent::Path(local.into())))
            .collect();
        self.upload_files(path, files)
    }

    /// Upload zero-byte files with the given names.
    pub fn upload_empty_files<I, S>(&mut self, path: &str, filenames: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let files = filenames
            .into_iter()
            .map(|name| (name.into(), FileContent::Empty))
            .collect();
        self.upload_files(path, files)
    }

    /// Add metadata in the given serialization (`PUT /api/metadata/`).
    pub fn upload_metadata(&mut self, format: MetadataFormat, data: &str) -> Result<()> {
        let start = Instant::now();
        let mut headers = self.auth_headers()?;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(format.content_type()));
        let res = self
            .client
            .put(self.api_url("metadata/"))
            .headers(headers)
            .body(data.to_string())
            .send()?;
        ensure_success(res, "uploading metadata")?;
        debug!(%format, bytes = data.len(), elapsed_ms = start.elapsed().as_millis() as u64, "metadata uploaded");
        Ok(())
    }

    /// Add a JSON-LD document.
    pub fn upload_jsonld(&mut self, document: &Value) -> Result<()> {
        let data = serde_json::to_string(document)?;
        self.upload_metadata(MetadataFormat::JsonLd, &data)
    }

    /// Upload a local metadata file. JSON-LD is parsed first, so a
    /// malformed document fails before anything is sent.
    pub fn upload_metadata_file(&mut self, format: MetadataFormat, path: &Path) -> Result<()> {
        let data = fs::read_to_string(path)?;
        match format {
            MetadataFormat::Turtle => self.upload_metadata(format, &data),
            MetadataFormat::JsonLd => {
                let document: Value = serde_json::from_str(&data)?;
                self.upload_jsonld(&document)
            }
        }
    }

    /// Serialize a graph as Turtle and add it.
    pub fn upload_metadata_graph(&mut self, graph: &Graph) -> Result<()> {
        self.upload_metadata(MetadataFormat::Turtle, &graph.to_string())
    }

    pub fn query_sparql(&mut self, query: &str) -> Result<SparqlResults> {
        let start = Instant::now();
        let mut headers = self.auth_headers()?;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/sparql-query"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let res = self
            .client
            .post(self.api_url("rdf/query"))
            .headers(headers)
            .body(query.to_string())
            .send()?;
        let results: SparqlResults = ensure_success(res, "querying metadata")?.json()?;
        debug!(
            rows = results.bindings().len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "sparql query done"
        );
        Ok(results)
    }

    /// The view configuration, returned as the server sends it.
    pub fn retrieve_view_config(&mut self) -> Result<Value> {
        let mut headers = self.auth_headers()?;
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let res = self
            .client
            .get(self.api_url("views/"))
            .headers(headers)
            .send()?;
        Ok(ensure_success(res, "retrieving view config")?.json()?)
    }

    pub fn retrieve_view_page(&mut self, request: &ViewRequest<'_>) -> Result<Page> {
        let mut headers = self.auth_headers()?;
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let res = self
            .client
            .post(self.api_url("views/"))
            .headers(headers)
            .json(request)
            .send()?;
        let body: Value = ensure_success(res, format!("retrieving {} view page", request.view))?.json()?;
        debug!(view = request.view, "{body}");
        Ok(serde_json::from_value(body)?)
    }

    pub fn count(&mut self, view: &str, filters: Option<&Value>) -> Result<Count> {
        let mut headers = self.auth_headers()?;
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let res = self
            .client
            .post(self.api_url("views/count"))
            .headers(headers)
            .json(&CountRequest { view, filters })
            .send()?;
        Ok(ensure_success(res, format!("retrieving count for {view} view"))?.json()?)
    }

    /// Ask the server to rebuild its view index.
    pub fn reindex(&mut self) -> Result<()> {
        let mut headers = self.auth_headers()?;
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let res = self
            .client
            .post(self.api_url("maintenance/reindex"))
            .headers(headers)
            .send()?;
        ensure_success(res, "reindexing")?;
        Ok(())
    }
}

fn build_client() -> Result<Client> {
    Ok(Client::builder()
        .cookie_store(true)
        .timeout(REQUEST_TIMEOUT)
        .build()?)
}

fn webdav_method(name: &'static str) -> Result<Method> {
    Method::from_bytes(name.as_bytes()).map_err(|e| Error::Config(format!("invalid method {name}: {e}")))
}

/// Pass through a successful response; log and convert anything else.
pub(crate) fn ensure_success(res: Response, action: impl Into<String>) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let action = action.into();
    let reason = status.canonical_reason().unwrap_or("").to_string();
    error!("Error {action}!");
    error!("{} {}", status.as_u16(), reason);
    Err(Error::Status {
        action,
        status,
        reason,
    })
}
