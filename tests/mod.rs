mod common;
mod config_tests;
mod retry_tests;
