use std::{fs, io};
use std::path::PathBuf;

use spdlog::debug;

pub struct PostList {
    pub root_dir: PathBuf,
    pub extension: String,
}

impl PostList {
    /// Post files in the root directory, sorted by file name. Since names are
    /// timestamps this is also chronological order.
    ///
    /// Fails only when the directory itself cannot be listed.
    pub fn retrieve_files(&self) -> io::Result<Vec<PathBuf>> {
        let mut posts = vec![];
        let entries = fs::read_dir(self.root_dir.as_path())?;
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry in {}: {}", self.root_dir.display(), e);
                    continue;
                }
            };
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some(self.extension.as_str()) {
                posts.push(path);
            }
        }
        posts.sort();
        Ok(posts)
    }
}
