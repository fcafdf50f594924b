//! Command-line front end for the extraction pipeline.
//!
//! Usage:
//!   product-extractor <url> <screenshot.png>                  Extract, print JSON with photo data URL
//!   product-extractor <url> <screenshot.png> --photo out.png  Extract, write photo to file
//!   product-extractor --detect <url>                          Print the matching profile
//!   product-extractor --profiles                              List profiles in detection order

use product_extractor_lib::config::{self, ExtractorConfig};
use product_extractor_lib::ocr::TesseractEngine;
use product_extractor_lib::capture;
use product_extractor_lib::{extract, ProfileRegistry};
use std::path::{Path, PathBuf};

fn usage() -> ! {
    eprintln!("Usage:");
    eprintln!("  product-extractor <url> <screenshot.png> [--photo <out.png>]");
    eprintln!("  product-extractor --detect <url>");
    eprintln!("  product-extractor --profiles");
    std::process::exit(2);
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        usage();
    }

    if let Ok(cwd) = std::env::current_dir() {
        config::load_env_files(&cwd);
    }
    let config = ExtractorConfig::from_env();
    let registry = match config.registry() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let result = match args[0].as_str() {
        "--profiles" => {
            list_profiles(&registry);
            Ok(())
        }
        "--detect" => {
            let url = args.get(1).unwrap_or_else(|| usage());
            detect(&registry, url)
        }
        url => {
            let screenshot = args.get(1).unwrap_or_else(|| usage());
            let photo_out = match args.iter().position(|a| a == "--photo") {
                Some(i) => Some(PathBuf::from(args.get(i + 1).unwrap_or_else(|| usage()))),
                None => None,
            };
            run(&config, &registry, url, Path::new(screenshot), photo_out.as_deref()).await
        }
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn list_profiles(registry: &ProfileRegistry) {
    for profile in registry.profiles() {
        println!("{}\t{}", profile.name, profile.host_pattern);
    }
}

fn detect(registry: &ProfileRegistry, url: &str) -> Result<(), String> {
    let profile = registry.resolve(url).map_err(|e| e.to_string())?;
    println!("{}", profile.name);
    Ok(())
}

async fn run(
    config: &ExtractorConfig,
    registry: &ProfileRegistry,
    url: &str,
    screenshot: &Path,
    photo_out: Option<&Path>,
) -> Result<(), String> {
    // Unsupported sites fail before the screenshot is even read.
    let profile = registry.resolve(url).map_err(|e| e.to_string())?;
    let image = capture::load_screenshot(screenshot)
        .await
        .map_err(|e| e.to_string())?;

    let engine = TesseractEngine::new(config.ocr.clone());
    let result = extract(&engine, &image, profile)
        .await
        .map_err(|e| e.to_string())?;

    if let Some(path) = photo_out {
        let png = result
            .photo_png_bytes()
            .map_err(|e| format!("Photo encode failed: {}", e))?;
        tokio::fs::write(path, png)
            .await
            .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
        log::info!("[PIPELINE] Photo written to {}", path.display());
    }

    let report = result
        .report(photo_out.is_none())
        .map_err(|e| format!("Photo encode failed: {}", e))?;
    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| format!("Failed to serialize report: {}", e))?;
    println!("{}", json);
    Ok(())
}
