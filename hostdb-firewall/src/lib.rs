//! Query firewall for tenant-submitted SQL.
//!
//! The firewall is a blocklist, not a parser. It checks raw SQL text against a
//! fixed policy and either returns the text to execute (possibly with a `LIMIT`
//! appended) or the first reason the query was refused.
//!
//! Checks run in a fixed order:
//!
//! 1. length bound
//! 2. comment stripping and the empty-query check
//! 3. hex literals
//! 4. the deny table ([`rules::DENY_RULES`])
//! 5. `UPDATE`/`DELETE` need a `WHERE` and a bounded `LIMIT`
//! 6. `SELECT` gets a bounded `LIMIT`
//! 7. multi-statement text, only when the policy disallows it
//!
//! Tenant isolation itself comes from the engine: a tenant's engine user only
//! holds privileges on its own schema. The firewall narrows what a console
//! user can send, it does not make cross-tenant access impossible on its own.
//!
//! # Example
//!
//! ```rust
//! use hostdb_firewall::{FirewallPolicy, QueryFirewall, ValidationKind};
//!
//! let firewall = QueryFirewall::new(FirewallPolicy::default());
//!
//! let sql = firewall.validate("SELECT * FROM t", "ab12cd_shop").unwrap();
//! assert_eq!(sql, "SELECT * FROM t LIMIT 1000");
//!
//! let err = firewall.validate("DROP DATABASE x", "ab12cd_shop").unwrap_err();
//! assert_eq!(err.kind, ValidationKind::ForbiddenCommand);
//! ```

pub mod error;
pub mod firewall;
pub mod policy;
pub mod rules;
pub mod statement;

pub use error::{ValidationError, ValidationKind};
pub use firewall::{QueryFirewall, strip_comments};
pub use policy::FirewallPolicy;
pub use rules::{DenyRule, RuleCategory};
pub use statement::StatementKind;
