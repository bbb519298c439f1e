//! Print or write the OpenAPI document
//!
//! `generate_openapi [OUTPUT]` writes to OUTPUT when given, stdout otherwise.

use repolens_web::openapi::get_openapi_json;
use std::fs;
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let json_content = get_openapi_json()?;

    match std::env::args().nth(1) {
        Some(output) => {
            let path = Path::new(&output);
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            fs::write(path, json_content)?;
            eprintln!("✅ Generated: {}", path.display());
        }
        None => println!("{}", json_content),
    }

    Ok(())
}
