//! `.tar.gz` archives of package directories

use std::fs::File;
use std::io;
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;

/// Archives `dir` into `output`, with every entry under `prefix/`
pub fn create_archive(output: &Path, dir: &Path, prefix: &str) -> io::Result<()> {
    let file = File::create(output)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.follow_symlinks(false);
    builder.append_dir_all(prefix, dir)?;

    // Finish both layers so the gzip trailer is written
    let encoder = builder.into_inner()?;
    encoder.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn archive_contains_prefixed_entries() {
        let dir = TempDir::new().unwrap();
        let package = dir.path().join("pkg");
        fs::create_dir_all(package.join("classpath")).unwrap();
        fs::write(package.join("classpath").join("a.jar"), b"jar").unwrap();

        let output = dir.path().join("pkg.tar.gz");
        create_archive(&output, &package, "my-plugin-java").unwrap();

        let mut archive = tar::Archive::new(GzDecoder::new(File::open(&output).unwrap()));
        let names: Vec<String> = archive
            .entries()
            .unwrap()
            .map(|entry| entry.unwrap().path().unwrap().to_string_lossy().into_owned())
            .collect();

        assert!(names.iter().any(|n| n == "my-plugin-java/classpath/a.jar"));
    }
}
