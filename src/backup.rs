use crate::store::{self, keys, KeyValueStore};
use crate::{attendance, instructor_attendance, roster};
use anyhow::{anyhow, Context};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const MANIFEST_ENTRY: &str = "manifest.json";
pub const BUNDLE_FORMAT_V1: &str = "rollcall-workspace-v1";

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub entry_count: usize,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub bundle_format_detected: String,
    pub keys_restored: Vec<String>,
}

fn entry_name(key: &str) -> String {
    format!("store/{}.json", key)
}

fn checksum(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Writes every store key that has a value into a zip bundle.
pub fn export_store_bundle<S: KeyValueStore + ?Sized>(
    store: &S,
    out_path: &Path,
) -> anyhow::Result<ExportSummary> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }

    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut checksums = BTreeMap::new();
    for key in keys::ALL {
        let Some(value) = store.get(key)? else {
            continue;
        };
        zip.start_file(entry_name(key), opts)
            .with_context(|| format!("failed to start entry for {}", key))?;
        zip.write_all(value.as_bytes())
            .with_context(|| format!("failed to write entry for {}", key))?;
        checksums.insert(key.to_string(), checksum(value.as_bytes()));
    }

    let exported_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let manifest = json!({
        "format": BUNDLE_FORMAT_V1,
        "version": 1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportedAt": exported_at,
        "sha256": checksums,
    });
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    zip.finish().context("failed to finalize zip bundle")?;

    log::info!(
        "exported {} store keys to {}",
        checksums.len(),
        out_path.to_string_lossy()
    );
    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        entry_count: checksums.len() + 1,
    })
}

/// Restores a bundle into `store`. Every checksum is verified and every entry
/// decoded into its record type before the first key is written.
pub fn import_store_bundle<S: KeyValueStore + ?Sized>(
    in_path: &Path,
    store: &mut S,
) -> anyhow::Result<ImportSummary> {
    if !is_zip_file(in_path)? {
        return Err(anyhow!(
            "not a workspace bundle: {}",
            in_path.to_string_lossy()
        ));
    }

    let in_file = File::open(in_path)
        .with_context(|| format!("failed to open bundle {}", in_path.to_string_lossy()))?;
    let mut archive = ZipArchive::new(in_file).context("invalid zip archive")?;

    let mut manifest_text = String::new();
    archive
        .by_name(MANIFEST_ENTRY)
        .context("bundle missing manifest.json")?
        .read_to_string(&mut manifest_text)
        .context("failed to read manifest.json")?;
    let manifest: serde_json::Value =
        serde_json::from_str(&manifest_text).context("manifest.json is invalid JSON")?;
    let format = manifest
        .get("format")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if format != BUNDLE_FORMAT_V1 {
        return Err(anyhow!("unsupported bundle format: {}", format));
    }
    let Some(expected) = manifest.get("sha256").and_then(|v| v.as_object()) else {
        return Err(anyhow!("manifest.json has no checksums"));
    };

    let mut staged: Vec<(String, String)> = Vec::new();
    for (key, sum) in expected {
        if !keys::ALL.contains(&key.as_str()) {
            return Err(anyhow!("bundle carries unknown store key: {}", key));
        }
        let mut text = String::new();
        archive
            .by_name(&entry_name(key))
            .with_context(|| format!("bundle missing {}", entry_name(key)))?
            .read_to_string(&mut text)
            .with_context(|| format!("failed to read {}", entry_name(key)))?;
        if Some(checksum(text.as_bytes()).as_str()) != sum.as_str() {
            return Err(anyhow!("checksum mismatch for {}", key));
        }
        staged.push((key.clone(), text));
    }

    let mut scratch = StagedStore::default();
    for (key, text) in &staged {
        scratch.save(key, text)?;
    }
    verify_shapes(&scratch)?;

    let mut keys_restored = Vec::new();
    for (key, text) in staged {
        store.save(&key, &text)?;
        keys_restored.push(key);
    }
    log::info!(
        "imported {} store keys from {}",
        keys_restored.len(),
        in_path.to_string_lossy()
    );
    Ok(ImportSummary {
        bundle_format_detected: BUNDLE_FORMAT_V1.to_string(),
        keys_restored,
    })
}

/// Holds staged entries so they can be decoded before the real store is touched.
#[derive(Default)]
struct StagedStore(BTreeMap<String, String>);

impl KeyValueStore for StagedStore {
    fn get(&self, key: &str) -> crate::error::Result<Option<String>> {
        Ok(self.0.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> crate::error::Result<()> {
        self.0.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

fn verify_shapes(staged: &StagedStore) -> anyhow::Result<()> {
    roster::load_students(staged)?;
    roster::load_classes(staged)?;
    roster::load_courses(staged)?;
    roster::load_instructors(staged)?;
    attendance::load_book(staged)?;
    instructor_attendance::load_book(staged)?;
    for key in [keys::STUDENT_PICTURES, keys::INSTRUCTOR_PICTURES] {
        store::load::<serde_json::Map<String, serde_json::Value>, _>(staged, key)?;
    }
    Ok(())
}

fn is_zip_file(path: &Path) -> anyhow::Result<bool> {
    let mut f = File::open(path)
        .with_context(|| format!("failed to open input file {}", path.to_string_lossy()))?;
    let mut sig = [0u8; 4];
    let read = f.read(&mut sig).context("failed to read file signature")?;
    if read < 4 {
        return Ok(false);
    }
    Ok(sig == [0x50, 0x4B, 0x03, 0x04])
}
