//! Scenario tests for the beach-profile binary.
//!
//! These run whole submissions through the service against a temporary
//! directory-backed bucket, and check argument parsing for the CLI.
