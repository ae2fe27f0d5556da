//! Named SPARQL queries for timing the metadata endpoint by hand.

use std::io::Write;
use std::time::Instant;

use anyhow::{Context, Result};

use crate::api::FairspaceApi;

const PREFIXES: &str = r#"PREFIX rdfs:     <http://www.w3.org/2000/01/rdf-schema#>
PREFIX dcat:     <http://www.w3.org/ns/dcat#>
PREFIX fs:       <https://fairspace.nl/ontology#>
PREFIX curie:    <https://institut-curie.org/ontology#>
PREFIX analysis: <https://institut-curie.org/analysis#>
PREFIX ncit:     <http://ncicb.nci.nih.gov/xml/owl/EVS/Thesaurus.owl#>
PREFIX gender:   <http://hl7.org/fhir/administrative-gender#>
"#;

const LIMIT: usize = 500;

#[derive(Debug, Clone)]
pub struct NamedQuery {
    pub name: String,
    pub query: String,
    /// Print the bindings instead of their number.
    pub aggregate: bool,
    pub skip: bool,
}

impl NamedQuery {
    fn new(name: impl Into<String>, query: String, aggregate: bool) -> Self {
        NamedQuery {
            name: name.into(),
            query,
            aggregate,
            skip: false,
        }
    }
}

/// `First 500 <what>` listing and `Count <what>` query over one pattern.
fn list_and_count(what: &str, var: &str, pattern: &str) -> [NamedQuery; 2] {
    let list = format!(
        "{PREFIXES}\nSELECT DISTINCT ?{var}\nWHERE {{\n{pattern}\n}}\nLIMIT {LIMIT}\n"
    );
    let count = format!(
        "{PREFIXES}\nSELECT (COUNT(DISTINCT ?{var}) AS ?count)\nWHERE {{\n{pattern}\n}}\n"
    );
    [
        NamedQuery::new(format!("First {LIMIT} {what}"), list, false),
        NamedQuery::new(format!("Count {what}"), count, true),
    ]
}

fn not_deleted(var: &str) -> String {
    format!("  FILTER NOT EXISTS {{ ?{var} fs:dateDeleted ?anyDateDeleted }}")
}

/// The query catalogue. Path-prefix queries look below `collection_iri`.
pub fn catalogue(collection_iri: &str) -> Vec<NamedQuery> {
    let sample_alive = not_deleted("sample");
    let location_alive = not_deleted("location");
    let mut queries = Vec::new();

    queries.extend(list_and_count(
        "samples",
        "sample",
        &format!("  ?sample a curie:BiologicalSample .\n{sample_alive}"),
    ));
    queries.extend(list_and_count(
        "samples by nature, gender and event type",
        "sample",
        &format!(
            "  ?sample a curie:BiologicalSample .
  ?sample curie:isOfNature ncit:C812 .
  ?sample curie:subject ?subject .
  ?subject curie:isOfGender gender:male .
  ?sample curie:diagnosis ?event .
  ?event curie:eventType ncit:C3262 .
{sample_alive}"
        ),
    ));
    queries.extend(list_and_count(
        "samples by nature",
        "sample",
        &format!("  ?sample a curie:BiologicalSample .\n  ?sample curie:isOfNature ncit:C812 .\n{sample_alive}"),
    ));
    queries.extend(list_and_count(
        "samples by nature and cellularity",
        "sample",
        &format!(
            "  ?sample a curie:BiologicalSample .
  ?sample curie:isOfNature ncit:C812 .
  ?sample curie:tumorCellularity ?cellularity .
  FILTER (?cellularity > 20 && ?cellularity < 90)
{sample_alive}"
        ),
    ));
    queries.extend(list_and_count(
        "samples by nature, event type and analysis type",
        "sample",
        &format!(
            "  ?sample a curie:BiologicalSample .
  ?sample curie:isOfNature ncit:C812 .
  ?sample curie:diagnosis ?event .
  ?event curie:eventType ncit:C3262 .
  ?location curie:sample ?sample .
  ?location curie:analysisType analysis:O6-12 .
{sample_alive}
{location_alive}"
        ),
    ));
    queries.extend(list_and_count(
        "files",
        "location",
        &format!("  ?location a fs:File .\n{location_alive}"),
    ));
    queries.extend(list_and_count(
        "files with path prefix (STRSTARTS)",
        "location",
        &format!(
            "  ?location a fs:File .
  FILTER ( STRSTARTS(STR(?location), '{collection_iri}') )
{location_alive}"
        ),
    ));
    queries.extend(list_and_count(
        "files with path prefix (belongsTo)",
        "location",
        &format!(
            "  ?location a fs:File .
  ?location fs:belongsTo* <{collection_iri}> .
{location_alive}"
        ),
    ));
    queries.extend(list_and_count(
        "files filtered by sample nature, analysis type",
        "location",
        &format!(
            "  ?location a fs:File .
  ?location curie:sample ?sample .
  ?sample curie:isOfNature ncit:C812 .
  ?location curie:analysisType analysis:O6-12 .
{location_alive}"
        ),
    ));
    queries.extend(list_and_count(
        "files filtered by keyword",
        "location",
        &format!("  ?location a fs:File .\n  ?location dcat:keyword 'philosophy' .\n{location_alive}"),
    ));

    queries.push(NamedQuery::new(
        "Count files linked to samples",
        format!(
            "{PREFIXES}
SELECT (COUNT(DISTINCT ?location) AS ?count)
WHERE {{
  ?sample a curie:BiologicalSample .
  ?location curie:sample ?sample .
  ?sample curie:tumorCellularity ?tumorCellularity .
  ?location a fs:File .
  FILTER (?tumorCellularity = 60)
{location_alive}
}}
"
        ),
        true,
    ));
    queries.push(NamedQuery::new(
        "Sample topographies",
        format!(
            "{PREFIXES}
SELECT ?topography ?label
WHERE {{
  ?topography a curie:Topography .
  ?topography rdfs:label ?label
}}
"
        ),
        false,
    ));
    queries
}

/// Run each query on a fresh session and print its timing and result.
pub fn run_queries(api: &mut FairspaceApi, queries: &[NamedQuery], out: &mut impl Write) -> Result<()> {
    for q in queries {
        writeln!(out, "{}", q.name)?;
        if q.skip {
            writeln!(out, "(Skipped)\n")?;
            continue;
        }
        api.init_session()?;
        let start = Instant::now();
        let results = api
            .query_sparql(&q.query)
            .with_context(|| format!("Query '{}' failed", q.name))?;
        writeln!(out, "{}ms", start.elapsed().as_millis())?;
        if q.aggregate {
            writeln!(out, "{}", serde_json::to_string(results.bindings())?)?;
        } else {
            writeln!(out, "{}", results.bindings().len())?;
        }
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLLECTION: &str = "http://localhost:8080/api/webdav/collection%202020-11-16-2";

    #[test]
    fn catalogue_pairs_listings_with_counts() {
        let queries = catalogue(COLLECTION);
        assert_eq!(queries.len(), 22);
        assert_eq!(queries[0].name, "First 500 samples");
        assert!(!queries[0].aggregate);
        assert_eq!(queries[1].name, "Count samples");
        assert!(queries[1].aggregate);
        assert!(queries.iter().all(|q| !q.skip));
    }

    #[test]
    fn listings_are_limited_and_counts_are_not() {
        for q in catalogue(COLLECTION) {
            if q.name.starts_with("First") {
                assert!(q.query.contains("LIMIT 500"), "{}", q.name);
                assert!(q.query.contains("SELECT DISTINCT"), "{}", q.name);
            }
            if q.name.starts_with("Count") {
                assert!(!q.query.contains("LIMIT"), "{}", q.name);
                assert!(q.query.contains("COUNT(DISTINCT"), "{}", q.name);
            }
        }
    }

    #[test]
    fn path_prefix_queries_use_collection() {
        let queries = catalogue(COLLECTION);
        let strstarts = queries
            .iter()
            .find(|q| q.name == "First 500 files with path prefix (STRSTARTS)")
            .unwrap();
        assert!(strstarts.query.contains(&format!("STRSTARTS(STR(?location), '{COLLECTION}')")));
        let belongs = queries
            .iter()
            .find(|q| q.name == "Count files with path prefix (belongsTo)")
            .unwrap();
        assert!(belongs.query.contains(&format!("fs:belongsTo* <{COLLECTION}>")));
    }

    #[test]
    fn every_query_filters_deleted_nodes_except_taxonomy() {
        for q in catalogue(COLLECTION) {
            if q.name == "Sample topographies" {
                continue;
            }
            assert!(q.query.contains("fs:dateDeleted"), "{}", q.name);
        }
    }
}
