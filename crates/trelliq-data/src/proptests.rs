//! Property-based tests for the extraction and aggregation invariants.
