use std::fs::OpenOptions;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::Path;

use rand::Rng;

use crate::error::Result;

const CHUNK_SIZE: usize = 1 << 20;

/// Writes `size` random bytes to `path` unless the file already exists.
///
/// Returns `false` when an existing file was left untouched.
pub fn materialize(path: &Path, size: u64) -> Result<bool> {
    if path.is_file() {
        log::debug!("Keeping existing input file '{}'", path.display());
        return Ok(false);
    }

    let file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(e.into()),
    };

    let mut writer = BufWriter::new(file);
    let mut rng = rand::rng();
    let mut buffer = vec![0u8; CHUNK_SIZE.min(size as usize)];
    let mut remaining = size;

    while remaining > 0 {
        let chunk = remaining.min(buffer.len() as u64) as usize;
        rng.fill(&mut buffer[..chunk]);
        writer.write_all(&buffer[..chunk])?;
        remaining -= chunk as u64;
    }
    writer.flush()?;

    log::debug!("Created file: {}", path.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_materialize_writes_requested_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t_input.txt");

        assert!(materialize(&path, 3 * CHUNK_SIZE as u64 + 17).unwrap());
        assert_eq!(fs::metadata(&path).unwrap().len(), 3 * CHUNK_SIZE as u64 + 17);
    }

    #[test]
    fn test_materialize_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t_input.txt");

        assert!(materialize(&path, 64).unwrap());
        let first = fs::read(&path).unwrap();

        assert!(!materialize(&path, 128).unwrap());
        assert_eq!(fs::read(&path).unwrap(), first);
    }

    #[test]
    fn test_zero_byte_file_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t_input.txt");

        assert!(materialize(&path, 0).unwrap());
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
    }
}
