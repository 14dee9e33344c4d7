use crate::ports::{PackageInfo, PackageInspector};
use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, FilterEntry, IntoIter, WalkDir};

/// Lazily walk `root` and yield every directory that inspects as a package.
///
/// Directories whose name starts with `.` are pruned with their whole subtree.
/// Directories that fail inspection are skipped. The order is the filesystem's
/// pre-order and must not be relied upon.
pub fn scan<'a>(root: &Utf8Path, inspector: &'a dyn PackageInspector) -> TreeScan<'a> {
    debug!(root = %root, "scanning tree for packages");
    TreeScan {
        walker: WalkDir::new(root)
            .into_iter()
            .filter_entry(is_visible as fn(&DirEntry) -> bool),
        inspector,
    }
}

pub struct TreeScan<'a> {
    walker: FilterEntry<IntoIter, fn(&DirEntry) -> bool>,
    inspector: &'a dyn PackageInspector,
}

impl Iterator for TreeScan<'_> {
    type Item = PackageInfo;

    fn next(&mut self) -> Option<PackageInfo> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }
            let Ok(dir) = Utf8PathBuf::from_path_buf(entry.into_path()) else {
                debug!("skipping non-utf8 directory");
                continue;
            };
            match self.inspector.inspect(&dir) {
                Ok(pkg) => return Some(pkg),
                Err(e) => {
                    debug!(dir = %dir, "not a package: {}", e);
                }
            }
        }
    }
}

/// The walk root itself is never pruned, even when it is `.`.
fn is_visible(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return true;
    }
    !entry.file_name().to_string_lossy().starts_with('.')
}
