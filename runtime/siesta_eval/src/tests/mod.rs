//! Engine test suite.

#![allow(clippy::unwrap_used, reason = "tests unwrap for brevity")]

mod helpers;

mod closure_tests;
