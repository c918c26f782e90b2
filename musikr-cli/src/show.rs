use clap::Values;
use std::path::Path;

use crate::args::{self, OpError};
use crate::walk;

/// Prints every tag field musikr can find in `paths`, optionally filtered
/// to `tags` (names like `"album"`, `"title"`). Directories are walked
/// recursively.
pub fn show<'a>(paths: Values<'a>, tags: Option<Values<'a>>) -> Result<(), OpError> {
    let entries = match tags {
        Some(tag_iter) => {
            let mut entries = Vec::new();
            for tag in tag_iter {
                entries.push(args::entry_from_arg(tag)?);
            }
            Some(entries)
        }
        None => None,
    };

    for path in paths {
        let files = match walk::collect_files(path) {
            Ok(files) => files,
            Err(err) => {
                eprintln!("musikr: {}: {}", path, err);
                continue;
            }
        };

        for file in files {
            show_file(&file, &entries);
        }
    }

    Ok(())
}

fn show_file(path: &Path, entries: &Option<Vec<musikr::MetaEntry>>) {
    let all = musikr::read_all(path);

    if all.is_empty() {
        return;
    }

    print_header!("{}:", path.display());

    for (kind, entry, value) in all {
        if let Some(wanted) = entries {
            if !wanted.contains(&entry) {
                continue;
            }
        }

        println!("  {} [{}]: {}", args::arg_from_entry(entry), kind, value);
    }
}
