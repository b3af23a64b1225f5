mod common;
mod loader_tests;
mod setup_tests;
