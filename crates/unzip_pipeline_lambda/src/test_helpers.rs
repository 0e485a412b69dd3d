//! Test helpers shared by unit and integration tests.

use flate2::write::GzEncoder;
use flate2::Compression;

/// Builds a `.tar.gz` archive in memory from `(path, contents)` pairs.
///
/// Names are written into the header verbatim, so absolute and `..` paths
/// end up in the archive exactly as given.
///
/// # Panics
///
/// Panics if a name exceeds the 100-byte header field or if the in-memory
/// tar or gzip writer fails.
pub fn build_tar_gz(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (path, contents) in entries {
        let mut header = tar::Header::new_gnu();
        let name = &mut header.as_gnu_mut().expect("gnu header").name;
        assert!(path.len() < name.len(), "entry name too long: {path}");
        name[..path.len()].copy_from_slice(path.as_bytes());
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_cksum();
        builder
            .append(&header, *contents)
            .expect("entry should append");
    }
    builder
        .into_inner()
        .expect("tar should finish")
        .finish()
        .expect("gzip should finish")
}
