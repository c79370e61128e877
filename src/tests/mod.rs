pub mod support;

mod config_tests;
mod orchestrator_tests;
mod summarizer_tests;
