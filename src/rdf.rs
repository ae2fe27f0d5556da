//! Vocabulary used by the generated metadata, plus small graph helpers.

use oxrdf::vocab::rdfs;
use oxrdf::{Graph, Literal, NamedNode};
use reqwest::Url;

use crate::error::{Error, Result};

/// An IRI prefix; terms are formed by appending a local name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Namespace(&'static str);

impl Namespace {
    pub const fn new(base: &'static str) -> Self {
        Namespace(base)
    }

    pub fn base(&self) -> &'static str {
        self.0
    }

    /// Local names are ids and property names generated here, so they are
    /// always valid IRI characters.
    pub fn term(&self, local: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("{}{}", self.0, local))
    }
}

pub const CURIE: Namespace = Namespace::new("https://institut-curie.org/ontology#");
pub const FS: Namespace = Namespace::new("https://fairspace.nl/ontology#");
pub const ANALYSIS: Namespace = Namespace::new("https://institut-curie.org/analysis#");
pub const SUBJECT: Namespace = Namespace::new("http://example.com/subjects#");
pub const EVENT: Namespace = Namespace::new("http://example.com/events#");
pub const SAMPLE: Namespace = Namespace::new("http://example.com/samples#");
pub const DCAT: Namespace = Namespace::new("http://www.w3.org/ns/dcat#");

pub const HOMO_SAPIENS: &str = "https://bioportal.bioontology.org/ontologies/NCBITAXON/9606";

/// Parse an IRI that came from outside (server responses, configuration).
pub fn iri(value: &str) -> Result<NamedNode> {
    Ok(NamedNode::new(value)?)
}

/// `PREFIX-<first 5 chars of id>`, lengthened one character at a time
/// while the label is already used in `graph` and the id has characters left.
pub fn unique_label(prefix: &str, id: &str, graph: &Graph) -> String {
    let id_len = id.chars().count();
    let mut n = 5.min(id_len);
    loop {
        let label = format!("{prefix}-{}", id.chars().take(n).collect::<String>());
        let literal = Literal::new_simple_literal(label.as_str());
        let taken = graph
            .subjects_for_predicate_object(rdfs::LABEL, literal.as_ref())
            .next()
            .is_some();
        if !taken || n >= id_len {
            return label;
        }
        n += 1;
    }
}

/// URL of a WebDAV resource: `root` followed by the percent-encoded
/// segments of `path`. Empty segments are dropped.
pub fn webdav_url(root: &str, path: &str) -> Result<Url> {
    encode_path(root, path, false)
}

/// Directory form of [`webdav_url`], with a trailing slash.
pub fn webdav_dir_url(root: &str, path: &str) -> Result<Url> {
    encode_path(root, path, true)
}

pub fn webdav_iri(root: &str, path: &str) -> Result<NamedNode> {
    iri(webdav_url(root, path)?.as_str())
}

fn encode_path(root: &str, path: &str, directory: bool) -> Result<Url> {
    let mut url = Url::parse(root).map_err(|e| Error::Rdf(format!("invalid webdav root '{root}': {e}")))?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| Error::Rdf(format!("webdav root '{root}' cannot be a base")))?;
        segments
            .pop_if_empty()
            .extend(path.split('/').filter(|s| !s.is_empty()));
        if directory {
            segments.push("");
        }
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::Triple;

    #[test]
    fn namespace_terms() {
        assert_eq!(
            CURIE.term("BiologicalSample").as_str(),
            "https://institut-curie.org/ontology#BiologicalSample"
        );
        assert_eq!(SAMPLE.base(), "http://example.com/samples#");
    }

    #[test]
    fn unique_label_extends_on_collision() {
        let mut graph = Graph::new();
        let first = unique_label("SUBJECT", "abcdef12", &graph);
        assert_eq!(first, "SUBJECT-abcde");
        graph.insert(&Triple::new(
            SUBJECT.term("abcdef12"),
            rdfs::LABEL,
            Literal::new_simple_literal(first),
        ));

        assert_eq!(unique_label("SUBJECT", "abcdeXYZ", &graph), "SUBJECT-abcdeX");
        assert_eq!(unique_label("SAMPLE", "abcdeXYZ", &graph), "SAMPLE-abcde");
    }

    #[test]
    fn unique_label_stops_at_full_id() {
        let mut graph = Graph::new();
        graph.insert(&Triple::new(
            SUBJECT.term("a"),
            rdfs::LABEL,
            Literal::new_simple_literal("TPE-abc"),
        ));
        assert_eq!(unique_label("TPE", "abc", &graph), "TPE-abc");
    }

    #[test]
    fn webdav_iri_encodes_segments() {
        let node = webdav_iri(
            "http://localhost:8080/api/webdav/",
            "collection 2020-11-16_10_30-0/dir_0/coffee_1.jpg",
        )
        .unwrap();
        assert_eq!(
            node.as_str(),
            "http://localhost:8080/api/webdav/collection%202020-11-16_10_30-0/dir_0/coffee_1.jpg"
        );
    }

    #[test]
    fn reserved_characters_stay_inside_segments() {
        let root = "http://localhost:8080/api/webdav/";
        let dir = webdav_dir_url(root, "odd #1?/a%b").unwrap();
        assert_eq!(dir.as_str(), "http://localhost:8080/api/webdav/odd%20%231%3F/a%25b/");
        assert_eq!(dir.fragment(), None);
        assert_eq!(dir.query(), None);
        let file = webdav_iri(root, "odd #1?/a%b").unwrap();
        assert_eq!(format!("{}/", file.as_str()), dir.as_str());
    }

    #[test]
    fn iri_rejects_garbage() {
        assert!(iri("not an iri").is_err());
    }
}
