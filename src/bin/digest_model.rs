//! Model digest utility for diabetes-risk classifier artifacts.
//!
//! Validates an exported logistic model and binds it by SHA-256 in the
//! `manifest.json` next to it. Other bindings already in the manifest are
//! kept. The application refuses to start if a manifest is present and the
//! model no longer matches it.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin digest_model -- <model_dir | model.json>
//! ```

use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};

use diabetes_risk::adapters::logistic::{
    bind_in_manifest, sha256_hex, ExportedLogisticModel, MANIFEST_FILE, MODEL_FILE,
};
use diabetes_risk::adapters::LogisticModel;

fn usage() -> String {
    "Usage: digest_model <model_dir | model.json>".to_string()
}

fn parse_args() -> Result<PathBuf> {
    let mut args = env::args().skip(1);
    let mut target: Option<PathBuf> = None;

    for arg in args.by_ref() {
        match arg.as_str() {
            "-h" | "--help" => bail!(usage()),
            _ if target.is_none() => target = Some(PathBuf::from(arg)),
            _ => bail!(usage()),
        }
    }

    target.ok_or_else(|| anyhow!(usage()))
}

fn main() -> Result<()> {
    let target = parse_args()?;

    let (model_dir, model_path) = if target.is_file() {
        let dir = target
            .parent()
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("Model path has no parent directory"))?;
        (dir, target)
    } else {
        (target.clone(), target.join(MODEL_FILE))
    };

    let file_name = model_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("Model path {model_path:?} has no usable file name"))?
        .to_string();

    let bytes =
        fs::read(&model_path).with_context(|| format!("Failed to read {model_path:?}"))?;

    // Refuse to bind an artifact the application would reject anyway
    let exported: ExportedLogisticModel = serde_json::from_slice(&bytes)
        .with_context(|| format!("{model_path:?} is not an exported logistic model"))?;
    let model = LogisticModel::from_exported(exported)
        .with_context(|| format!("{model_path:?} failed validation"))?;

    let manifest_path = bind_in_manifest(&model_dir, &file_name, &bytes).with_context(|| {
        format!("Failed to update {:?}", model_dir.join(MANIFEST_FILE))
    })?;

    println!("Validated {file_name} ({} features)", model.feature_count());
    println!("Updated manifest: {manifest_path:?}");
    println!("SHA-256 {}", sha256_hex(&bytes));

    Ok(())
}
