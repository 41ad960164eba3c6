//! Build script for the storefront crate.
//!
//! Hashes the stylesheet so templates can reference it with an immutable,
//! content-addressed URL.

use std::env;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

fn main() {
    hash_css();
}

/// Hash main.css and copy it to `static/css/derived/main.{hash}.css`.
///
/// Sets `CSS_HASH` for use with `env!("CSS_HASH")`. An empty hash makes the
/// templates fall back to the unhashed file.
fn hash_css() {
    let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") else {
        println!("cargo:rustc-env=CSS_HASH=");
        return;
    };
    let css_path = Path::new(&manifest_dir).join("static/css/main.css");

    println!("cargo:rerun-if-changed={}", css_path.display());

    let content = match fs::read(&css_path) {
        Ok(content) => content,
        Err(e) => {
            println!("cargo:warning=Could not read main.css: {e}");
            println!("cargo:rustc-env=CSS_HASH=");
            return;
        }
    };

    let hash = format!("{:x}", Sha256::digest(&content));
    let short_hash = hash.get(..8).unwrap_or_default();

    let derived_dir = Path::new(&manifest_dir).join("static/css/derived");
    let derived_path = derived_dir.join(format!("main.{short_hash}.css"));
    let copied = fs::create_dir_all(&derived_dir).and_then(|()| fs::copy(&css_path, &derived_path));

    match copied {
        Ok(_) => println!("cargo:rustc-env=CSS_HASH={short_hash}"),
        Err(e) => {
            println!("cargo:warning=Could not write hashed CSS: {e}");
            println!("cargo:rustc-env=CSS_HASH=");
        }
    }
}
