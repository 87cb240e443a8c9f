//! Fuzz target for administrative DDL rendering.
//!
//! Identifiers either quote cleanly or are refused, and escaped literals
//! never let a quote terminate the string early.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_ddl
//! ```

#![no_main]

use arbitrary::Arbitrary;
use hostdb_mysql::ddl::{escape_literal, quote_identifier, redact};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct FuzzDdl {
    identifier: String,
    literal: String,
}

fuzz_target!(|input: FuzzDdl| {
    if let Ok(quoted) = quote_identifier(&input.identifier) {
        assert_eq!(quoted.matches('`').count(), 2);
    }

    let escaped = escape_literal(&input.literal);
    let mut chars = escaped.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => assert_eq!(chars.next(), Some('\\')),
            '\'' => assert_eq!(chars.next(), Some('\'')),
            _ => {}
        }
    }

    let statement = format!("ALTER USER 'u'@'%' IDENTIFIED BY '{}'", escaped);
    assert_eq!(redact(&statement), "ALTER USER 'u'@'%' IDENTIFIED BY '***'");
});
