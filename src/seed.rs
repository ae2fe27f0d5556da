//! Seed a Fairspace instance with synthetic test data.
//!
//! Taxonomies are uploaded first and read back, so the generated
//! subjects, events, samples and files only point at terms the server knows.

use std::collections::BTreeMap;
use std::thread;
use std::time::Duration;

use chrono::Local;
use indicatif::ProgressBar;
use oxrdf::vocab::rdfs;
use oxrdf::{Graph, Literal, NamedNode, TripleRef};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::api::FairspaceApi;
use crate::config::TestDataConfig;
use crate::error::Result;
use crate::generator::{random_subset, Generator, Taxonomies};
use crate::model::MetadataFormat;
use crate::rdf::{iri, webdav_iri, FS};
use crate::ui::thousands;

/// Controlled vocabularies, uploaded before anything refers to them.
pub const TAXONOMIES_TTL: &str = include_str!("../data/taxonomies.ttl");

const TOPOGRAPHY_SUBSET: usize = 10;
const MORPHOLOGY_SUBSET: usize = 10;

/// SPARQL listing every `curie:<class>` instance with its label.
pub fn taxonomy_query(class: &str) -> String {
    format!(
        r#"
PREFIX rdfs:  <http://www.w3.org/2000/01/rdf-schema#>
PREFIX curie: <https://institut-curie.org/ontology#>

SELECT ?id ?label
WHERE {{
  ?id a curie:{class} .
  ?id rdfs:label ?label
}}
"#
    )
}

/// `collection <date>_<hour>_<minute>`; collection `m` is `<prefix>-<m>`.
pub fn collection_name_prefix() -> String {
    format!("collection {}", Local::now().format("%Y-%m-%d_%H_%M"))
}

pub fn file_names(count: usize) -> Vec<String> {
    (0..count).map(|k| format!("coffee_{k}.jpg")).collect()
}

/// Whether to pause before directory `dir_index`: every `every`-th
/// directory starting with the first. `every == 0` never pauses.
pub fn should_pause(dir_index: usize, every: usize) -> bool {
    every != 0 && dir_index % every == 0
}

pub struct TestData {
    api: FairspaceApi,
    config: TestDataConfig,
    rng: StdRng,
    progress: ProgressBar,
}

impl TestData {
    pub fn new(api: FairspaceApi, config: TestDataConfig) -> Self {
        TestData {
            api,
            config,
            rng: StdRng::from_entropy(),
            progress: ProgressBar::hidden(),
        }
    }

    /// Make the generated data reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Report directory uploads on `progress`.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Number of directories the collection step uploads into.
    pub fn directory_count(&self) -> u64 {
        (self.config.collection_count * self.config.dirs_per_collection) as u64
    }

    pub fn run(&mut self) -> Result<()> {
        self.update_taxonomies()?;
        self.update_collection_type_labels()?;
        let taxonomies = self.fetch_taxonomy_data()?;
        let mut generator = Generator::with_seed(taxonomies, self.rng.gen());
        self.generate_and_upload_subjects(&mut generator)?;
        self.generate_and_upload_events(&mut generator)?;
        self.generate_and_upload_samples(&mut generator)?;
        self.generate_and_upload_collections(&mut generator)?;
        self.progress.finish_with_message("done");
        Ok(())
    }

    pub fn update_taxonomies(&mut self) -> Result<()> {
        self.log("Updating taxonomies ...");
        self.api.upload_metadata(MetadataFormat::Turtle, TAXONOMIES_TTL)
    }

    pub fn update_collection_type_labels(&mut self) -> Result<()> {
        let mut graph = Graph::new();
        for collection_type in ["File", "Directory", "Collection"] {
            let node = FS.term(collection_type);
            let label = Literal::new_simple_literal(collection_type);
            graph.insert(TripleRef::new(node.as_ref(), rdfs::LABEL, label.as_ref()));
        }
        self.log("Updating collection type labels ...");
        self.api.upload_metadata_graph(&graph)
    }

    /// Instances of `curie:<class>`, id to label, ordered by id.
    pub fn query_taxonomy(&mut self, class: &str) -> Result<BTreeMap<String, String>> {
        let results = self.api.query_sparql(&taxonomy_query(class))?;
        Ok(results
            .bindings()
            .iter()
            .filter_map(|row| Some((row.get("id")?.value.clone(), row.get("label")?.value.clone())))
            .collect())
    }

    fn taxonomy_ids(&mut self, class: &str) -> Result<Vec<NamedNode>> {
        self.query_taxonomy(class)?.keys().map(|id| iri(id)).collect()
    }

    pub fn fetch_taxonomy_data(&mut self) -> Result<Taxonomies> {
        self.log("Fetching topographies ...");
        let topographies = self.taxonomy_ids("Topography")?;
        self.log(format!("Selecting a subset of {TOPOGRAPHY_SUBSET} topographies ..."));
        let topographies = random_subset(&mut self.rng, &topographies, TOPOGRAPHY_SUBSET);

        self.log("Fetching morphologies ...");
        let morphologies = self.taxonomy_ids("Morphology")?;
        self.log(format!("Selecting a subset of {MORPHOLOGY_SUBSET} morphologies ..."));
        let morphologies = random_subset(&mut self.rng, &morphologies, MORPHOLOGY_SUBSET);

        self.log("Fetching lateralities ...");
        let lateralities = self.taxonomy_ids("Laterality")?;
        self.log("Fetching event types ...");
        let event_types = self.taxonomy_ids("EventType")?;
        self.log("Fetching sample natures ...");
        let natures = self.taxonomy_ids("SampleNature")?;
        self.log("Fetching analysis types ...");
        let analysis_types = self.taxonomy_ids("AnalysisType")?;
        self.log("Fetching genders ...");
        let genders = self.taxonomy_ids("Gender")?;
        self.log("Fetching availability values ...");
        let availabilities = self.taxonomy_ids("AvailabilityForResearch")?;
        self.log("Fetching consent answers ...");
        let consent_answers = self.taxonomy_ids("ConsentAnswer")?;

        Ok(Taxonomies {
            topographies,
            morphologies,
            lateralities,
            event_types,
            natures,
            analysis_types,
            genders,
            availabilities,
            consent_answers,
        })
    }

    pub fn generate_and_upload_subjects<R: Rng>(&mut self, generator: &mut Generator<R>) -> Result<()> {
        let graph = generator.subjects(self.config.subject_count)?;
        self.log(format!("Adding {} subjects ...", thousands(generator.subject_ids().len())));
        self.api.upload_metadata_graph(&graph)
    }

    pub fn generate_and_upload_events<R: Rng>(&mut self, generator: &mut Generator<R>) -> Result<()> {
        let graph = generator.events(self.config.event_count)?;
        self.log(format!("Adding {} tumor pathology events ...", thousands(generator.event_ids().len())));
        self.api.upload_metadata_graph(&graph)
    }

    pub fn generate_and_upload_samples<R: Rng>(&mut self, generator: &mut Generator<R>) -> Result<()> {
        let graph = generator.samples(self.config.sample_count)?;
        self.log(format!("Adding {} samples ...", thousands(generator.sample_ids().len())));
        self.api.upload_metadata_graph(&graph)
    }

    pub fn generate_and_upload_collections<R: Rng>(&mut self, generator: &mut Generator<R>) -> Result<()> {
        self.log("Preparing workspace and collection for uploading ...");
        let workspace = self.api.find_or_create_workspace(&self.config.workspace_code)?;
        let prefix = collection_name_prefix();
        let root = self.api.config().webdav_root();
        let names = file_names(self.config.files_per_dir);
        self.progress.set_length(self.directory_count());

        for m in 0..self.config.collection_count {
            let collection = format!("{prefix}-{m}");
            self.api.ensure_dir(&collection, Some(&workspace))?;

            for n in 0..self.config.dirs_per_collection {
                self.pause_before(n);
                let path = format!("{collection}/dir_{n}");
                self.api.ensure_dir(&path, None)?;
                self.progress.set_message(path.clone());

                self.log(format!("Adding {} files into {path} ...", thousands(names.len())));
                if self.config.empty_files {
                    self.api.upload_empty_files(&path, names.iter().cloned())?;
                } else {
                    let local = self.config.test_file.clone();
                    self.api
                        .upload_files_by_path(&path, names.iter().map(|name| (name.clone(), local.clone())))?;
                }

                let files = names
                    .iter()
                    .map(|name| webdav_iri(&root, &format!("{path}/{name}")))
                    .collect::<Result<Vec<_>>>()?;
                let graph = generator.annotate_files(&files)?;
                self.log(format!("Adding metadata for {} files to {path} ...", names.len()));
                self.api.upload_metadata_graph(&graph)?;
                self.progress.inc(1);
            }
        }
        Ok(())
    }

    /// Log above the progress bar rather than through it.
    fn log(&self, message: impl AsRef<str>) {
        self.progress.suspend(|| info!("{}", message.as_ref()));
    }

    fn pause_before(&self, dir_index: usize) {
        if self.config.pause_seconds == 0 || !should_pause(dir_index, self.config.pause_every_dirs) {
            return;
        }
        thread::sleep(Duration::from_secs(self.config.pause_seconds));
    }
}
