//! Integration tests for the Quill generation engine

mod config_loading;
mod http_backend;
mod package_generation;
mod test_utils;
