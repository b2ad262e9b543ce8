use std::fs;
use std::path::Path;

use crate::error::Result;

/// Names the executor treats as benchmark data: `*output.txt` and `*input*.txt`.
pub fn is_generated_data_file(name: &str) -> bool {
    if name.ends_with("output.txt") {
        return true;
    }
    name.strip_suffix(".txt").is_some_and(|stem| stem.contains("input"))
}

/// Deletes generated data files directly inside `work_dir` and the scratch root below it.
///
/// Returns the number of data files removed. Other files, like the run log, are kept.
pub fn cleanup_data_files(work_dir: &Path, scratch_dir: &str) -> Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(work_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if entry.file_name().to_str().is_some_and(is_generated_data_file) {
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }

    let scratch_root = work_dir.join(scratch_dir);
    if scratch_root.is_dir() {
        fs::remove_dir_all(&scratch_root)?;
    }

    log::debug!("Removed {} data files from '{}'", removed, work_dir.display());
    Ok(removed)
}
