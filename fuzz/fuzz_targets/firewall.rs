//! Fuzz target for the query firewall.
//!
//! Feeds arbitrary SQL and policies to `QueryFirewall::validate` and checks
//! that the verdict never depends on anything but the query and policy.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_firewall
//! ```

#![no_main]

use arbitrary::Arbitrary;
use hostdb_firewall::{FirewallPolicy, QueryFirewall, StatementKind};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    query: String,
    max_query_length: u16,
    allow_multi_statement: bool,
}

fuzz_target!(|input: FuzzInput| {
    let policy = FirewallPolicy::default()
        .max_query_length(usize::from(input.max_query_length))
        .allow_multi_statement(input.allow_multi_statement);
    let firewall = QueryFirewall::new(policy);

    let first = firewall.validate(&input.query, "fuzz");
    if first.is_ok() {
        assert!(input.query.chars().count() <= usize::from(input.max_query_length));
    }

    // Validation is a pure function of the query and the policy.
    let second = firewall.validate(&input.query, "fuzz");
    assert_eq!(first.ok(), second.ok());
    let _ = StatementKind::classify(&input.query);
});
