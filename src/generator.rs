//! Synthetic subject / event / sample / file metadata.
//!
//! The generator keeps every id it hands out so later graphs link only to
//! nodes that were generated earlier:
//!
//! 1. subjects: gender drawn 4:4:1 (male : female : undifferentiated), half
//!    of them with consent answers
//! 2. tumor pathology events: each about one subject, with one topography
//! 3. samples: a third linked to an event (and so to its subject and
//!    topography), a third to a subject only, a third to nothing
//! 4. files: keywords, an occasional analysis type, and links to
//!    event-linked samples or to random subjects
//!
//! Whenever a file or sample mentions a sample, event and subject together,
//! the three agree with each other.

use std::collections::HashMap;

use oxrdf::vocab::{rdf, rdfs};
use oxrdf::{Graph, Literal, NamedNode, NamedNodeRef, TermRef, TripleRef};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, StandardNormal};
use uuid::Builder;

use crate::error::{Error, Result};
use crate::rdf::{iri, unique_label, CURIE, DCAT, EVENT, HOMO_SAPIENS, SAMPLE, SUBJECT};

/// Keywords attached to files.
pub const WORDS: &[&str] = &[
    "beverage",
    "test",
    "linked data",
    "fairspace",
    "philosophy",
    "music",
    "literature",
    "institute",
    "science",
    "analysis",
    "software",
    "java",
    "database",
    "new",
    "windows",
    "lab",
];

const KEYWORD_MEAN: f64 = 1.3;
const SUBJECT_MEAN: f64 = 0.9;

/// Controlled vocabulary terms the generated nodes point at.
#[derive(Debug, Clone, Default)]
pub struct Taxonomies {
    pub topographies: Vec<NamedNode>,
    pub morphologies: Vec<NamedNode>,
    pub lateralities: Vec<NamedNode>,
    pub event_types: Vec<NamedNode>,
    pub natures: Vec<NamedNode>,
    pub analysis_types: Vec<NamedNode>,
    /// Sorted; exactly three entries (male, female, undifferentiated).
    pub genders: Vec<NamedNode>,
    pub availabilities: Vec<NamedNode>,
    pub consent_answers: Vec<NamedNode>,
}

/// Up to `count` distinct items, in random order.
pub fn random_subset<R: Rng + ?Sized, T: Clone>(rng: &mut R, items: &[T], count: usize) -> Vec<T> {
    items.choose_multiple(rng, count).cloned().collect()
}

pub struct Generator<R: Rng = StdRng> {
    rng: R,
    taxonomies: Taxonomies,
    subject_ids: Vec<String>,
    event_ids: Vec<String>,
    event_subject: HashMap<String, String>,
    event_topography: HashMap<String, NamedNode>,
    sample_ids: Vec<String>,
    sample_subject: HashMap<String, String>,
    sample_event: HashMap<String, String>,
    /// Samples with an event, in generation order.
    event_samples: Vec<String>,
}

impl Generator<StdRng> {
    /// Reproducible generator, ids included.
    pub fn with_seed(taxonomies: Taxonomies, seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), taxonomies)
    }
}

impl<R: Rng> Generator<R> {
    pub fn with_rng(rng: R, taxonomies: Taxonomies) -> Self {
        Generator {
            rng,
            taxonomies,
            subject_ids: Vec::new(),
            event_ids: Vec::new(),
            event_subject: HashMap::new(),
            event_topography: HashMap::new(),
            sample_ids: Vec::new(),
            sample_subject: HashMap::new(),
            sample_event: HashMap::new(),
            event_samples: Vec::new(),
        }
    }

    pub fn subject_ids(&self) -> &[String] {
        &self.subject_ids
    }

    pub fn event_ids(&self) -> &[String] {
        &self.event_ids
    }

    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    pub fn event_subject(&self, event_id: &str) -> Option<&str> {
        self.event_subject.get(event_id).map(String::as_str)
    }

    pub fn event_topography(&self, event_id: &str) -> Option<&NamedNode> {
        self.event_topography.get(event_id)
    }

    pub fn sample_subject(&self, sample_id: &str) -> Option<&str> {
        self.sample_subject.get(sample_id).map(String::as_str)
    }

    pub fn sample_event(&self, sample_id: &str) -> Option<&str> {
        self.sample_event.get(sample_id).map(String::as_str)
    }

    fn new_ids(&mut self, count: usize) -> Vec<String> {
        (0..count)
            .map(|_| Builder::from_random_bytes(self.rng.gen()).into_uuid().to_string())
            .collect()
    }

    /// male : female : undifferentiated = 4 : 4 : 1
    pub fn select_gender(&mut self) -> Result<NamedNode> {
        let genders = &self.taxonomies.genders;
        if genders.len() != 3 {
            return Err(Error::Generate(format!(
                "expected 3 genders, found {}",
                genders.len()
            )));
        }
        let dice = self.rng.gen_range(1..=9);
        let index = match dice {
            1..=4 => 0,
            5..=8 => 1,
            _ => 2,
        };
        Ok(genders[index].clone())
    }

    /// Age or cellularity: `trunc(N(0,1) * 15) + 50`, clamped to `[0, max]`.
    fn normal_value(&mut self, max: i64) -> i64 {
        let z: f64 = StandardNormal.sample(&mut self.rng);
        ((z * 15.0) as i64 + 50).clamp(0, max)
    }

    /// `trunc(x)` for `x ~ Exp(mean)`, at most `limit`.
    fn exponential_count(&mut self, mean: f64, limit: usize) -> Result<usize> {
        let exp = Exp::new(1.0 / mean).map_err(|e| Error::Generate(format!("exponential({mean}): {e}")))?;
        let x: f64 = exp.sample(&mut self.rng);
        Ok((x as usize).min(limit))
    }

    pub fn subjects(&mut self, count: usize) -> Result<Graph> {
        let ids = self.new_ids(count);
        let homo_sapiens = iri(HOMO_SAPIENS)?;
        let class = CURIE.term("Subject");
        let mut graph = Graph::new();
        for id in &ids {
            let subject = SUBJECT.term(id);
            add(&mut graph, subject.as_ref(), rdf::TYPE, class.as_ref());
            let label = Literal::new_simple_literal(unique_label("SUBJECT", id, &graph));
            add(&mut graph, subject.as_ref(), rdfs::LABEL, label.as_ref());
            let gender = self.select_gender()?;
            add(&mut graph, subject.as_ref(), CURIE.term("isOfGender").as_ref(), gender.as_ref());
            add(&mut graph, subject.as_ref(), CURIE.term("isOfSpecies").as_ref(), homo_sapiens.as_ref());
            if self.rng.gen_range(1..=2) == 1 {
                let t = &self.taxonomies;
                let availability = pick(&mut self.rng, &t.availabilities, "availability values")?;
                add(&mut graph, subject.as_ref(), CURIE.term("availableForResearch").as_ref(), availability.as_ref());
                for property in ["reuseClinicalWithGeneticData", "sampleStorageAndReuse", "geneticAnalysis"] {
                    let answer = pick(&mut self.rng, &t.consent_answers, "consent answers")?;
                    add(&mut graph, subject.as_ref(), CURIE.term(property).as_ref(), answer.as_ref());
                }
            }
        }
        self.subject_ids = ids;
        Ok(graph)
    }

    /// Tumor pathology events about the subjects generated so far.
    pub fn events(&mut self, count: usize) -> Result<Graph> {
        let ids = self.new_ids(count);
        let class = CURIE.term("TumorPathologyEvent");
        let mut graph = Graph::new();
        for id in &ids {
            let subject_id = pick(&mut self.rng, &self.subject_ids, "subjects")?;
            let t = &self.taxonomies;
            let topography = pick(&mut self.rng, &t.topographies, "topographies")?;
            let morphology = pick(&mut self.rng, &t.morphologies, "morphologies")?;
            let laterality = pick(&mut self.rng, &t.lateralities, "lateralities")?;
            let event_type = pick(&mut self.rng, &t.event_types, "event types")?;

            let event = EVENT.term(id);
            add(&mut graph, event.as_ref(), rdf::TYPE, class.as_ref());
            let label = Literal::new_simple_literal(unique_label("TPE", id, &graph));
            add(&mut graph, event.as_ref(), rdfs::LABEL, label.as_ref());
            add(&mut graph, event.as_ref(), CURIE.term("eventSubject").as_ref(), SUBJECT.term(&subject_id).as_ref());
            add(&mut graph, event.as_ref(), CURIE.term("topography").as_ref(), topography.as_ref());
            add(&mut graph, event.as_ref(), CURIE.term("tumorMorphology").as_ref(), morphology.as_ref());
            add(&mut graph, event.as_ref(), CURIE.term("tumorLaterality").as_ref(), laterality.as_ref());
            add(&mut graph, event.as_ref(), CURIE.term("eventType").as_ref(), event_type.as_ref());
            let age = Literal::from(self.normal_value(120));
            add(&mut graph, event.as_ref(), CURIE.term("ageAtDiagnosis").as_ref(), age.as_ref());

            self.event_subject.insert(id.clone(), subject_id);
            self.event_topography.insert(id.clone(), topography);
        }
        self.event_ids = ids;
        Ok(graph)
    }

    pub fn samples(&mut self, count: usize) -> Result<Graph> {
        let ids = self.new_ids(count);
        let class = CURIE.term("BiologicalSample");
        let mut graph = Graph::new();
        for id in &ids {
            let sample = SAMPLE.term(id);
            add(&mut graph, sample.as_ref(), rdf::TYPE, class.as_ref());
            let label = Literal::new_simple_literal(unique_label("SAMPLE", id, &graph));
            add(&mut graph, sample.as_ref(), rdfs::LABEL, label.as_ref());
            let nature = pick(&mut self.rng, &self.taxonomies.natures, "sample natures")?;
            add(&mut graph, sample.as_ref(), CURIE.term("isOfNature").as_ref(), nature.as_ref());
            let cellularity = Literal::from(self.normal_value(100));
            add(&mut graph, sample.as_ref(), CURIE.term("tumorCellularity").as_ref(), cellularity.as_ref());
            self.add_sample_links(&mut graph, id)?;
        }
        self.sample_ids = ids;
        Ok(graph)
    }

    /// Diagnosis, subject and topography of one sample.
    fn add_sample_links(&mut self, graph: &mut Graph, sample_id: &str) -> Result<()> {
        let sample = SAMPLE.term(sample_id);
        let dice = self.rng.gen_range(1..=6);

        if dice <= 2 && !self.event_ids.is_empty() {
            let event_id = pick(&mut self.rng, &self.event_ids, "events")?;
            let subject_id = self.subject_of_event(&event_id)?;
            let topography = self
                .event_topography
                .get(&event_id)
                .cloned()
                .ok_or_else(|| Error::Generate(format!("event {event_id} has no topography")))?;
            add(graph, sample.as_ref(), CURIE.term("subject").as_ref(), SUBJECT.term(&subject_id).as_ref());
            add(graph, sample.as_ref(), CURIE.term("diagnosis").as_ref(), EVENT.term(&event_id).as_ref());
            add(graph, sample.as_ref(), CURIE.term("topography").as_ref(), topography.as_ref());
            self.sample_event.insert(sample_id.to_string(), event_id);
            self.sample_subject.insert(sample_id.to_string(), subject_id);
            self.event_samples.push(sample_id.to_string());
            return Ok(());
        }

        if dice <= 4 && !self.subject_ids.is_empty() {
            let subject_id = pick(&mut self.rng, &self.subject_ids, "subjects")?;
            add(graph, sample.as_ref(), CURIE.term("subject").as_ref(), SUBJECT.term(&subject_id).as_ref());
            self.sample_subject.insert(sample_id.to_string(), subject_id);
        }
        let topography = pick(&mut self.rng, &self.taxonomies.topographies, "topographies")?;
        add(graph, sample.as_ref(), CURIE.term("topography").as_ref(), topography.as_ref());
        Ok(())
    }

    fn subject_of_event(&self, event_id: &str) -> Result<String> {
        self.event_subject
            .get(event_id)
            .cloned()
            .ok_or_else(|| Error::Generate(format!("event {event_id} has no subject")))
    }

    /// Distinct keywords, count drawn from an exponential distribution.
    pub fn select_keywords(&mut self) -> Result<Vec<&'static str>> {
        let count = self.exponential_count(KEYWORD_MEAN, WORDS.len() - 1)?;
        Ok(random_subset(&mut self.rng, WORDS, count))
    }

    /// One analysis type for one file in six, none otherwise.
    pub fn select_analysis_types(&mut self) -> Vec<NamedNode> {
        let count = usize::from(self.rng.gen_range(1..=6) == 1);
        random_subset(&mut self.rng, &self.taxonomies.analysis_types, count)
    }

    pub fn select_subjects(&mut self) -> Result<Vec<NamedNode>> {
        let limit = self.subject_ids.len().saturating_sub(1);
        let count = self.exponential_count(SUBJECT_MEAN, limit)?;
        Ok(random_subset(&mut self.rng, &self.subject_ids, count)
            .iter()
            .map(|id| SUBJECT.term(id))
            .collect())
    }

    /// Link a file to a random event-linked sample and to that sample's
    /// event and subject. Does nothing when no sample has an event.
    fn link_sample_to_file(&mut self, graph: &mut Graph, file: &NamedNode) -> Result<()> {
        if self.event_samples.is_empty() {
            return Ok(());
        }
        let sample_id = pick(&mut self.rng, &self.event_samples, "event-linked samples")?;
        let event_id = self
            .sample_event
            .get(&sample_id)
            .cloned()
            .ok_or_else(|| Error::Generate(format!("sample {sample_id} has no event")))?;
        let subject_id = self.subject_of_event(&event_id)?;
        add(graph, file.as_ref(), CURIE.term("sample").as_ref(), SAMPLE.term(&sample_id).as_ref());
        add(graph, file.as_ref(), CURIE.term("aboutEvent").as_ref(), EVENT.term(&event_id).as_ref());
        add(graph, file.as_ref(), CURIE.term("aboutSubject").as_ref(), SUBJECT.term(&subject_id).as_ref());
        Ok(())
    }

    fn add_file_links(&mut self, graph: &mut Graph, file: &NamedNode) -> Result<()> {
        match self.rng.gen_range(1..=6) {
            1 => self.link_sample_to_file(graph, file),
            2 => {
                for subject in self.select_subjects()? {
                    add(graph, file.as_ref(), CURIE.term("aboutSubject").as_ref(), subject.as_ref());
                }
                Ok(())
            }
            3 => {
                self.link_sample_to_file(graph, file)?;
                self.link_sample_to_file(graph, file)
            }
            _ => Ok(()),
        }
    }

    /// Metadata for uploaded files, identified by their WebDAV IRIs.
    pub fn annotate_files(&mut self, files: &[NamedNode]) -> Result<Graph> {
        let analysis_type = CURIE.term("analysisType");
        let keyword = DCAT.term("keyword");
        let mut graph = Graph::new();
        for file in files {
            for analysis in self.select_analysis_types() {
                add(&mut graph, file.as_ref(), analysis_type.as_ref(), analysis.as_ref());
            }
            for word in self.select_keywords()? {
                let literal = Literal::new_simple_literal(word);
                add(&mut graph, file.as_ref(), keyword.as_ref(), literal.as_ref());
            }
            self.add_file_links(&mut graph, file)?;
        }
        Ok(graph)
    }
}

fn add<'a>(
    graph: &mut Graph,
    subject: NamedNodeRef<'a>,
    predicate: NamedNodeRef<'a>,
    object: impl Into<TermRef<'a>>,
) {
    graph.insert(TripleRef::new(subject, predicate, object));
}

fn pick<R: Rng + ?Sized, T: Clone>(rng: &mut R, items: &[T], what: &str) -> Result<T> {
    items
        .choose(rng)
        .cloned()
        .ok_or_else(|| Error::Generate(format!("no {what} to choose from")))
}
