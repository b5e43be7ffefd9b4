// src/checker/mod.rs
// =============================================================================
// This module contains the URL liveness check.
//
// Submodules:
// - http: Makes one HTTP request per URL and turns the result into a Verdict
//
// This file (mod.rs) is the module root - it re-exports the public API so the
// rest of the crate can write `checker::UrlValidator`.
// =============================================================================

mod http;

pub use http::{NetworkErrorKind, UrlValidator, Verdict, MAX_REDIRECTS};
