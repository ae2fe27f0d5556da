//! Request and response shapes of the Fairspace REST API.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// A workspace as listed by `/api/workspaces/`. Only `code` and `iri` are
/// used; everything else the server sends is kept in `extra`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Workspace {
    pub code: String,
    pub iri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Serialize, Debug)]
pub(crate) struct NewWorkspace<'a> {
    pub code: &'a str,
    pub title: &'a str,
}

/// One page of view results.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    #[serde(default)]
    pub total_pages: Option<u64>,
    #[serde(default)]
    pub total_elements: Option<u64>,
    #[serde(default)]
    pub rows: Vec<Value>,
    #[serde(default)]
    pub has_next: bool,
    #[serde(default)]
    pub timeout: bool,
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Count {
    pub total_elements: u64,
    #[serde(default)]
    pub timeout: bool,
}

/// Body of `POST /api/views/`.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ViewRequest<'a> {
    pub view: &'a str,
    pub page: u64,
    pub size: u64,
    pub include_counts: bool,
    pub include_joined_views: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<&'a Value>,
}

impl<'a> ViewRequest<'a> {
    /// First page of 20 rows, no counts, no joined views.
    pub fn new(view: &'a str) -> Self {
        ViewRequest {
            view,
            page: 1,
            size: 20,
            include_counts: false,
            include_joined_views: false,
            filters: None,
        }
    }
}

#[derive(Serialize, Debug)]
pub(crate) struct CountRequest<'a> {
    pub view: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<&'a Value>,
}

/// SPARQL 1.1 JSON results.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct SparqlResults {
    #[serde(default)]
    pub head: SparqlHead,
    #[serde(default)]
    pub results: SparqlBindings,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct SparqlHead {
    #[serde(default)]
    pub vars: Vec<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct SparqlBindings {
    #[serde(default)]
    pub bindings: Vec<HashMap<String, SparqlTerm>>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct SparqlTerm {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    #[serde(rename = "xml:lang", default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl SparqlResults {
    pub fn bindings(&self) -> &[HashMap<String, SparqlTerm>] {
        &self.results.bindings
    }

    /// Value of `var` in every row that binds it.
    pub fn column<'a>(&'a self, var: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.results
            .bindings
            .iter()
            .filter_map(move |row| row.get(var).map(|t| t.value.as_str()))
    }
}

/// Serialization accepted by `PUT /api/metadata/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataFormat {
    Turtle,
    JsonLd,
}

impl MetadataFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            MetadataFormat::Turtle => "text/turtle",
            MetadataFormat::JsonLd => "application/ld+json",
        }
    }
}

impl FromStr for MetadataFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "turtle" => Ok(MetadataFormat::Turtle),
            "ld+json" => Ok(MetadataFormat::JsonLd),
            other => Err(Error::Format(other.to_string())),
        }
    }
}

impl fmt::Display for MetadataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataFormat::Turtle => f.write_str("turtle"),
            MetadataFormat::JsonLd => f.write_str("ld+json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn page_parses_with_and_without_totals() {
        let page: Page = serde_json::from_value(json!({
            "totalPages": 3,
            "totalElements": 42,
            "rows": [{"Sample": "s1"}],
            "hasNext": true,
            "timeout": false,
            "page": 1,
            "size": 20
        }))
        .unwrap();
        assert_eq!(page.total_elements, Some(42));
        assert!(page.has_next);

        let bare: Page = serde_json::from_value(json!({"rows": [], "hasNext": false})).unwrap();
        assert_eq!(bare.total_elements, None);
        assert_eq!(bare.page, None);
    }

    #[test]
    fn view_request_omits_absent_filters() {
        let body = serde_json::to_value(ViewRequest::new("Sample")).unwrap();
        assert_eq!(
            body,
            json!({
                "view": "Sample",
                "page": 1,
                "size": 20,
                "includeCounts": false,
                "includeJoinedViews": false
            })
        );

        let filters = json!([{"field": "Sample_nature", "values": ["x"]}]);
        let req = ViewRequest {
            filters: Some(&filters),
            ..ViewRequest::new("Sample")
        };
        let body = serde_json::to_value(req).unwrap();
        assert_eq!(body["filters"], filters);
    }

    #[test]
    fn workspace_keeps_unknown_fields() {
        let ws: Workspace = serde_json::from_value(json!({
            "code": "test",
            "iri": "http://localhost:8080/api/workspaces/test",
            "status": "Active"
        }))
        .unwrap();
        assert_eq!(ws.code, "test");
        assert_eq!(ws.extra["status"], "Active");
    }

    #[test]
    fn sparql_column_reads_bound_values() {
        let results: SparqlResults = serde_json::from_value(json!({
            "head": {"vars": ["id", "label"]},
            "results": {"bindings": [
                {"id": {"type": "uri", "value": "http://a"}, "label": {"type": "literal", "value": "A"}},
                {"label": {"type": "literal", "value": "B", "xml:lang": "en"}}
            ]}
        }))
        .unwrap();
        let ids: Vec<&str> = results.column("id").collect();
        assert_eq!(ids, vec!["http://a"]);
        assert_eq!(results.bindings()[1]["label"].lang.as_deref(), Some("en"));
    }

    #[test]
    fn metadata_format_parsing() {
        assert_eq!("turtle".parse::<MetadataFormat>().unwrap(), MetadataFormat::Turtle);
        assert_eq!(
            "ld+json".parse::<MetadataFormat>().unwrap().content_type(),
            "application/ld+json"
        );
        assert!(matches!("rdf/xml".parse::<MetadataFormat>(), Err(Error::Format(_))));
    }
}
