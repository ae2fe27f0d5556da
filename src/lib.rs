// Library root
// -----------
// Client and test data tooling for a Fairspace instance. The binary
// (`main.rs`) wires these modules into the command line.
//
// Module responsibilities:
// - `api`, `auth`: HTTP calls to Fairspace and the Keycloak token that
//   authorizes them.
// - `config`, `logger`, `error`: settings from the environment, tracing
//   setup and the library error type.
// - `model`, `rdf`: request/response shapes and RDF vocabulary.
// - `generator`, `seed`: synthetic metadata and the upload flow that
//   seeds an instance with it.
// - `queries`, `views`, `ui`: manual inspection commands and their
//   terminal output.
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod generator;
pub mod logger;
pub mod model;
pub mod queries;
pub mod rdf;
pub mod seed;
pub mod ui;
pub mod views;

pub use api::{FairspaceApi, FileContent};
pub use config::{ApiConfig, ApiOverrides, TestDataConfig};
pub use error::{Error, Result};
