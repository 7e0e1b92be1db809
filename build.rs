//! Build script for the native portal target.

use std::env;

const FORWARDED_VARS: [&str; 2] = ["HCMS_API_BASE_URL", "HCMS_SITE_KEY"];

fn main() {
    // Load .env values before option_env! reads them
    let _ = dotenvy::dotenv();

    for name in FORWARDED_VARS {
        if let Ok(val) = env::var(name) {
            println!("cargo:rustc-env={}={}", name, val);
        }
        println!("cargo:rerun-if-env-changed={}", name);
    }

    #[cfg(feature = "shell")]
    tauri_build::build();
}
