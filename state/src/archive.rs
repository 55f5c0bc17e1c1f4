//! Snapshot resolution: archive or directory input to a directory
//!
//! Archives are recognised by content, never by extension. A zip or tar
//! family archive is fully extracted into a temporary directory owned by the
//! run; a directory input is used in place and never removed.

use flate2::read::GzDecoder;
use nodestate_core::{NsError, NsResult, PathParts};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::lifecycle::{TempKind, TempResources};

const BLOCK: usize = 512;
const USTAR_OFFSET: usize = 257;
const CHECKSUM_FIELD: std::ops::Range<usize> = 148..156;

/// Recognised archive layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar,
    TarGz,
}

/// A snapshot input resolved to a directory
#[derive(Debug, Clone)]
pub struct ResolvedSnapshot {
    /// Path as given by the operator
    pub original: PathBuf,
    /// Directory holding the snapshot's content
    pub root: PathBuf,
    /// Node name, the stem of the original path
    pub node_name: String,
    /// Whether `root` is a temporary extraction owned by the run
    pub temporary: bool,
}

/// Check that `path` can be resolved at all. Returns a message suitable for
/// collecting into a [`NsError::Validation`].
pub fn validate_input(label: &str, path: &Path) -> Option<String> {
    match std::fs::metadata(path) {
        Err(_) => Some(format!("{}: {} does not exist", label, path.display())),
        Ok(meta) if meta.is_file() || meta.is_dir() => None,
        Ok(_) => Some(format!(
            "{}: {} is neither a file nor a directory",
            label,
            path.display()
        )),
    }
}

/// Probe the first bytes of `path` for a supported archive signature
pub fn sniff_format(path: &Path) -> NsResult<Option<ArchiveFormat>> {
    let mut header = Vec::with_capacity(BLOCK);
    File::open(path)?.take(BLOCK as u64).read_to_end(&mut header)?;

    if is_zip_signature(&header) {
        return Ok(Some(ArchiveFormat::Zip));
    }

    if header.starts_with(&[0x1f, 0x8b]) {
        let mut inner = Vec::with_capacity(BLOCK);
        let decoder = GzDecoder::new(File::open(path)?);
        // A truncated or corrupt stream simply isn't a tar
        if decoder.take(BLOCK as u64).read_to_end(&mut inner).is_ok() && is_tar_header(&inner) {
            return Ok(Some(ArchiveFormat::TarGz));
        }
        return Ok(None);
    }

    if is_tar_header(&header) {
        return Ok(Some(ArchiveFormat::Tar));
    }

    Ok(None)
}

fn is_zip_signature(header: &[u8]) -> bool {
    [b"PK\x03\x04", b"PK\x05\x06", b"PK\x07\x08"]
        .iter()
        .any(|magic| header.starts_with(*magic))
}

/// POSIX `ustar` magic, or a pre-POSIX header whose checksum validates
fn is_tar_header(block: &[u8]) -> bool {
    if block.len() < BLOCK {
        return false;
    }
    if &block[USTAR_OFFSET..USTAR_OFFSET + 5] == b"ustar" {
        return true;
    }
    if block.iter().all(|b| *b == 0) {
        return false;
    }

    let field = &block[CHECKSUM_FIELD];
    let digits: String = field
        .iter()
        .skip_while(|b| **b == b' ')
        .take_while(|b| **b != 0 && **b != b' ')
        .map(|b| *b as char)
        .collect();
    let Ok(expected) = u32::from_str_radix(&digits, 8) else {
        return false;
    };

    let actual: u32 = block[..BLOCK]
        .iter()
        .enumerate()
        .map(|(i, b)| if CHECKSUM_FIELD.contains(&i) { b' ' as u32 } else { *b as u32 })
        .sum();
    actual == expected
}

/// Resolves snapshot inputs into directories
pub struct ArchiveResolver;

impl ArchiveResolver {
    /// Resolve `path`. Archives are extracted into a directory registered in
    /// `temps`; directories are returned unchanged.
    pub fn resolve(path: &Path, temps: &mut TempResources) -> NsResult<ResolvedSnapshot> {
        let node_name = PathParts::of(path).stem;
        let meta = std::fs::metadata(path)
            .map_err(|_| NsError::validation(format!("{} does not exist", path.display())))?;

        if meta.is_dir() {
            debug!(path = %path.display(), "Using snapshot directory in place");
            return Ok(ResolvedSnapshot {
                original: path.to_path_buf(),
                root: path.to_path_buf(),
                node_name,
                temporary: false,
            });
        }

        if !meta.is_file() {
            return Err(NsError::validation(format!(
                "{} is neither a file nor a directory",
                path.display()
            )));
        }

        let format = sniff_format(path)?
            .ok_or_else(|| NsError::archive(path, "not a recognised tar or zip archive"))?;

        let root = temps.create(TempKind::Extraction, "nodestate-extract-")?;
        info!(path = %path.display(), format = ?format, dest = %root.display(), "Extracting snapshot");
        extract(path, format, &root)?;

        Ok(ResolvedSnapshot {
            original: path.to_path_buf(),
            root,
            node_name,
            temporary: true,
        })
    }
}

/// Extract the archive at `path` into `dest`
pub fn extract(path: &Path, format: ArchiveFormat, dest: &Path) -> NsResult<()> {
    let file = File::open(path)?;
    match format {
        ArchiveFormat::Zip => {
            let mut archive =
                zip::ZipArchive::new(file).map_err(|e| NsError::archive(path, e.to_string()))?;
            archive
                .extract(dest)
                .map_err(|e| NsError::archive(path, e.to_string()))
        }
        ArchiveFormat::Tar => tar::Archive::new(file)
            .unpack(dest)
            .map_err(|e| NsError::archive(path, e.to_string())),
        ArchiveFormat::TarGz => tar::Archive::new(GzDecoder::new(file))
            .unpack(dest)
            .map_err(|e| NsError::archive(path, e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_tar<W: Write>(writer: W) -> W {
        let mut builder = tar::Builder::new(writer);
        let content = b"hello node";
        let mut header = tar::Header::new_gnu();
        header.set_path("data/Node1/notes.txt").unwrap();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append(&header, &content[..]).unwrap();
        builder.into_inner().unwrap()
    }

    #[test]
    fn test_directory_is_used_in_place() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("Node1");
        std::fs::create_dir(&dir).unwrap();

        let mut temps = TempResources::new();
        let resolved = ArchiveResolver::resolve(&dir, &mut temps).unwrap();
        assert_eq!(resolved.root, dir);
        assert_eq!(resolved.node_name, "Node1");
        assert!(!resolved.temporary);
        assert!(temps.is_empty());
    }

    #[test]
    fn test_zip_is_extracted() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Node1.zip");
        let mut zip = zip::ZipWriter::new(File::create(&path).unwrap());
        zip.start_file("data/Node1/notes.txt", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"hello node").unwrap();
        zip.finish().unwrap();

        assert_eq!(sniff_format(&path).unwrap(), Some(ArchiveFormat::Zip));

        let mut temps = TempResources::new();
        let resolved = ArchiveResolver::resolve(&path, &mut temps).unwrap();
        assert!(resolved.temporary);
        assert_eq!(resolved.node_name, "Node1");
        assert_eq!(temps.len(), 1);
        let content = std::fs::read(resolved.root.join("data/Node1/notes.txt")).unwrap();
        assert_eq!(content, b"hello node");

        temps.release(true).unwrap();
        assert!(!resolved.root.exists());
    }

    #[test]
    fn test_tar_gz_is_extracted() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Node2.tar.gz");
        let encoder = write_tar(GzEncoder::new(File::create(&path).unwrap(), Compression::default()));
        encoder.finish().unwrap();

        assert_eq!(sniff_format(&path).unwrap(), Some(ArchiveFormat::TarGz));

        let mut temps = TempResources::new();
        let resolved = ArchiveResolver::resolve(&path, &mut temps).unwrap();
        assert_eq!(resolved.node_name, "Node2");
        let content = std::fs::read(resolved.root.join("data/Node1/notes.txt")).unwrap();
        assert_eq!(content, b"hello node");
    }

    #[test]
    fn test_plain_tar_detected_regardless_of_extension() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("capture.bin");
        let file = write_tar(File::create(&path).unwrap());
        drop(file);

        assert_eq!(sniff_format(&path).unwrap(), Some(ArchiveFormat::Tar));
    }

    #[test]
    fn test_unrecognised_file_is_archive_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Node1.zip");
        std::fs::write(&path, b"definitely not an archive").unwrap();

        let mut temps = TempResources::new();
        let err = ArchiveResolver::resolve(&path, &mut temps).unwrap_err();
        assert!(matches!(err, NsError::Archive { .. }));
        assert!(temps.is_empty());
    }

    #[test]
    fn test_validate_missing_path() {
        let msg = validate_input("state1", Path::new("/no/such/snapshot")).unwrap();
        assert!(msg.starts_with("state1:"));
        assert!(msg.contains("does not exist"));
    }
}
