//! Remote Gateway client for the document platform REST API.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};
use url::Url;

use super::error::PlatformError;
use super::gateway::DocumentGateway;
use super::replace::{self, SectionOps};
use super::session::Session;
use super::transport::{check, Transport};
use crate::models::{value_text, Cabinet, CabinetField, Dialog, Document, SearchFilter, SearchResult};

/// Documents requested per search.
pub const SEARCH_COUNT: usize = 1000;

#[derive(Debug, Deserialize)]
struct CabinetList {
    #[serde(rename = "FileCabinet", default)]
    cabinets: Vec<Cabinet>,
}

#[derive(Debug, Deserialize)]
struct CabinetDetail {
    #[serde(rename = "Fields", default)]
    fields: Vec<CabinetField>,
}

#[derive(Debug, Deserialize)]
struct DialogList {
    #[serde(rename = "Dialog", default)]
    dialogs: Vec<Dialog>,
}

#[derive(Debug, Deserialize)]
struct DocumentList {
    #[serde(rename = "Items", default)]
    items: Vec<Document>,
    #[serde(rename = "Count", default)]
    count: Value,
}

impl From<DocumentList> for SearchResult {
    fn from(list: DocumentList) -> Self {
        SearchResult {
            total: parse_count(&list.count),
            items: list.items,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SelectList {
    #[serde(rename = "Value", default)]
    values: Vec<Value>,
}

/// Total count, sent either as a number or as `{ "Value": n }`.
pub fn parse_count(count: &Value) -> u64 {
    match count {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f as u64)).unwrap_or(0),
        Value::Object(map) => map.get("Value").map(parse_count).unwrap_or(0),
        _ => 0,
    }
}

/// The dialog used for filtered searches: the first `Search` dialog, else the first.
pub fn pick_search_dialog(dialogs: &[Dialog]) -> Option<&Dialog> {
    dialogs.iter().find(|d| d.is_search()).or_else(|| dialogs.first())
}

/// AND-ed equality conditions for a dialog expression query.
pub fn dialog_expression(filters: &[SearchFilter]) -> Value {
    let conditions: Vec<Value> = filters
        .iter()
        .map(|f| json!({ "DBName": f.field_name, "Value": [f.value] }))
        .collect();
    json!({
        "Condition": conditions,
        "Operation": "And",
        "CalculateTotalCount": true,
    })
}

fn content_type_for(file_name: &str) -> &'static str {
    if file_name.to_lowercase().ends_with(".pdf") {
        "application/pdf"
    } else {
        "application/octet-stream"
    }
}

fn seg(id: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(id)
}

/// Authenticated client for one session.
#[derive(Clone)]
pub struct PlatformClient {
    session: Session,
    transport: Transport,
}

impl PlatformClient {
    pub fn new(session: Session, transport: Transport) -> Self {
        Self { session, transport }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.session.platform_root(), path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header(AUTHORIZATION, format!("Bearer {}", self.session.token))
            .header(ACCEPT, "application/json")
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, PlatformError> {
        Ok(self.authorize(self.transport.request(method, &self.url(path), "")?))
    }

    async fn json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, PlatformError> {
        let resp = check(builder.send().await?).await?;
        resp.json()
            .await
            .map_err(|e| PlatformError::Decode(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, PlatformError> {
        debug!("GET {}", path);
        self.json(self.request(Method::GET, path)?).await
    }

    /// All file cabinets visible to the user.
    pub async fn list_cabinets(&self) -> Result<Vec<Cabinet>, PlatformError> {
        let list: CabinetList = self.get("/FileCabinets").await?;
        Ok(list.cabinets)
    }

    /// A cabinet's field schema.
    pub async fn cabinet_fields(&self, cabinet_id: &str) -> Result<Vec<CabinetField>, PlatformError> {
        let detail: CabinetDetail = self
            .get(&format!("/FileCabinets/{}", seg(cabinet_id)))
            .await?;
        Ok(detail.fields)
    }

    pub async fn dialogs(&self, cabinet_id: &str) -> Result<Vec<Dialog>, PlatformError> {
        let list: DialogList = self
            .get(&format!("/FileCabinets/{}/Dialogs", seg(cabinet_id)))
            .await?;
        Ok(list.dialogs)
    }

    async fn search_dialog(&self, cabinet_id: &str) -> Result<Dialog, PlatformError> {
        let dialogs = self.dialogs(cabinet_id).await?;
        pick_search_dialog(&dialogs)
            .cloned()
            .ok_or_else(|| PlatformError::NoSearchDialog(cabinet_id.to_string()))
    }

    /// Unfiltered listing window starting at `start`.
    pub async fn list_documents(
        &self,
        cabinet_id: &str,
        start: usize,
        count: usize,
    ) -> Result<SearchResult, PlatformError> {
        let list: DocumentList = self
            .get(&format!(
                "/FileCabinets/{}/Documents?count={}&start={}&calculateTotalCount=true",
                seg(cabinet_id),
                count,
                start
            ))
            .await?;
        Ok(list.into())
    }

    /// Search a cabinet. Without filters every document is listed.
    pub async fn search(
        &self,
        cabinet_id: &str,
        filters: &[SearchFilter],
    ) -> Result<SearchResult, PlatformError> {
        if filters.is_empty() {
            let result = self.list_documents(cabinet_id, 0, SEARCH_COUNT).await?;
            info!("Listed {} of {} documents", result.items.len(), result.total);
            return Ok(result);
        }

        let dialog = self.search_dialog(cabinet_id).await?;
        let path = format!(
            "/FileCabinets/{}/Query/DialogExpression?dialogId={}&count={}",
            seg(cabinet_id),
            seg(&dialog.id),
            SEARCH_COUNT
        );
        debug!("POST {} with {} conditions", path, filters.len());
        let list: DocumentList = self
            .json(self.request(Method::POST, &path)?.json(&dialog_expression(filters)))
            .await?;
        let result: SearchResult = list.into();
        info!("Found {} of {} documents", result.items.len(), result.total);
        Ok(result)
    }

    /// Total documents in a cabinet, without fetching them.
    pub async fn document_count(&self, cabinet_id: &str) -> Result<u64, PlatformError> {
        Ok(self.list_documents(cabinet_id, 0, 1).await?.total)
    }

    /// Distinct values of a field.
    pub async fn select_list(&self, cabinet_id: &str, field: &str) -> Result<Vec<String>, PlatformError> {
        let dialog = self.search_dialog(cabinet_id).await?;
        let path = format!(
            "/FileCabinets/{}/Query/SelectListExpression?dialogId={}&fieldName={}",
            seg(cabinet_id),
            seg(&dialog.id),
            seg(field)
        );
        let list: SelectList = self
            .json(self.request(Method::POST, &path)?.json(&json!({})))
            .await?;
        Ok(list
            .values
            .iter()
            .map(value_text)
            .filter(|v| !v.is_empty())
            .collect())
    }

    pub async fn document(&self, cabinet_id: &str, document_id: &str) -> Result<Document, PlatformError> {
        self.get(&format!(
            "/FileCabinets/{}/Documents/{}",
            seg(cabinet_id),
            seg(document_id)
        ))
        .await
    }

    /// Viewer URL for a document.
    pub fn view_url(&self, cabinet_id: &str, document_id: &str) -> String {
        self.session.view_url(cabinet_id, document_id)
    }

    /// Resolve a link that may be relative to the platform host.
    fn absolute(&self, href: &str) -> Result<String, PlatformError> {
        if href.starts_with("http://") || href.starts_with("https://") {
            return Ok(href.to_string());
        }
        let base = Url::parse(&self.session.base_url)
            .map_err(|e| PlatformError::InvalidUrl(format!("{}: {}", self.session.base_url, e)))?;
        let joined = if href.starts_with('/') {
            base.join(href)
        } else {
            Url::parse(&format!("{}/", self.session.platform_root())).and_then(|root| root.join(href))
        };
        joined
            .map(|u| u.to_string())
            .map_err(|e| PlatformError::InvalidUrl(format!("{}: {}", href, e)))
    }
}

#[async_trait]
impl SectionOps for PlatformClient {
    async fn fetch_document(&self, cabinet_id: &str, document_id: &str) -> Result<Document, PlatformError> {
        self.document(cabinet_id, document_id).await
    }

    async fn put_content(&self, href: &str, bytes: Vec<u8>, file_name: &str) -> Result<(), PlatformError> {
        let url = self.absolute(href)?;
        let builder = self
            .authorize(self.transport.transfer(Method::PUT, &url)?)
            .header(CONTENT_TYPE, content_type_for(file_name))
            .body(bytes);
        check(builder.send().await?).await?;
        Ok(())
    }

    async fn append_section(
        &self,
        cabinet_id: &str,
        document_id: &str,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<(), PlatformError> {
        let url = self.url(&format!(
            "/FileCabinets/{}/Sections?DocId={}",
            seg(cabinet_id),
            seg(document_id)
        ));
        let builder = self
            .authorize(self.transport.transfer(Method::POST, &url)?)
            .header(CONTENT_TYPE, content_type_for(file_name))
            .header(
                CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", file_name.replace('"', "")),
            )
            .body(bytes);
        check(builder.send().await?).await?;
        Ok(())
    }

    async fn delete_section(&self, cabinet_id: &str, section_id: &str) -> Result<(), PlatformError> {
        let path = format!("/FileCabinets/{}/Sections/{}", seg(cabinet_id), seg(section_id));
        check(self.request(Method::DELETE, &path)?.send().await?).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentGateway for PlatformClient {
    async fn replace_content(
        &self,
        cabinet_id: &str,
        document_id: &str,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<(), PlatformError> {
        let outcome = replace::replace_content(self, cabinet_id, document_id, bytes, file_name).await?;
        debug!("Replaced content of {}: {:?}", document_id, outcome);
        Ok(())
    }

    async fn update_field(
        &self,
        cabinet_id: &str,
        document_id: &str,
        field: &str,
        value: &str,
    ) -> Result<(), PlatformError> {
        let path = format!(
            "/FileCabinets/{}/Documents/{}/Fields",
            seg(cabinet_id),
            seg(document_id)
        );
        let body = json!({
            "Field": [{ "FieldName": field, "Item": value, "ItemElementName": "String" }]
        });
        check(self.request(Method::PUT, &path)?.json(&body).send().await?).await?;
        Ok(())
    }

    async fn download(&self, cabinet_id: &str, document_id: &str) -> Result<Vec<u8>, PlatformError> {
        let url = self.url(&format!(
            "/FileCabinets/{}/Documents/{}/FileDownload",
            seg(cabinet_id),
            seg(document_id)
        ));
        let builder = self
            .authorize(self.transport.transfer(Method::GET, &url)?)
            .header(ACCEPT, "*/*");
        let resp = check(builder.send().await?).await?;
        Ok(resp.bytes().await?.to_vec())
    }
}
