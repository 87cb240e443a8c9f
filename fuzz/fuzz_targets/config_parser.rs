//! Fuzz target for the `hostdb.toml` parser.
//!
//! The parser should never panic, only return errors.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_config_parser
//! ```

#![no_main]

use hostdb_core::HostDbConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(config) = HostDbConfig::from_str(input) {
            let _ = config.admin_mysql_config();
            let _ = config.tenant_pool_config();
            let _ = config.store_config();
            let _ = config.with_environment("production");
        }
    }
});
