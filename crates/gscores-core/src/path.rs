//! Filesystem path helpers shared by the binaries.

use std::path::{Path, PathBuf};

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn leaves_plain_paths_alone() {
    assert_eq!(expand_tilde(Path::new("data/gscores.db")), PathBuf::from("data/gscores.db"));
    assert_eq!(expand_tilde(Path::new("/tmp/~/x")), PathBuf::from("/tmp/~/x"));
  }
}
