use std::path::Path;

use anyhow::{bail, Result};
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::models::PackageMetadata;

/// Parse the `<metadata>` block of a `.nuspec` file.
pub fn parse_nuspec_file(path: &Path) -> Result<PackageMetadata> {
    let content = std::fs::read_to_string(path)?;
    parse_nuspec(&content)
}

pub fn parse_nuspec(content: &str) -> Result<PackageMetadata> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut meta = PackageMetadata::default();
    let mut in_metadata = false;
    let mut current: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let tag = String::from_utf8_lossy(e.name().local_name().as_ref()).into_owned();
                if tag == "metadata" {
                    in_metadata = true;
                } else if in_metadata {
                    current = Some(tag);
                }
            }
            Event::Text(ref e) => {
                if let Some(tag) = current.as_deref() {
                    let value = e.unescape()?.trim().to_string();
                    match tag {
                        "id" => meta.id = value,
                        "version" => meta.version = value,
                        "authors" => meta.authors = value,
                        "license" => meta.license = Some(value),
                        "licenseUrl" => meta.license_url = Some(value),
                        "projectUrl" => meta.project_url = Some(value),
                        _ => {}
                    }
                }
            }
            Event::End(ref e) => {
                if e.name().local_name().as_ref() == b"metadata" {
                    in_metadata = false;
                }
                current = None;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if meta.id.is_empty() || meta.version.is_empty() {
        bail!("nuspec has no package id or version");
    }
    Ok(meta)
}
