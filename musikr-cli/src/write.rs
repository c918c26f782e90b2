use clap::Values;

use crate::args::{self, OpError};
use crate::walk;

/// Writes `content` into the `tag` field of every file reachable from
/// `paths`, across every tag format present in each file.
pub fn write<'a>(paths: Values<'a>, tag: &str, content: &str) -> Result<(), OpError> {
    let entry = args::entry_from_arg(tag)?;

    for path in paths {
        let files = match walk::collect_files(path) {
            Ok(files) => files,
            Err(err) => {
                errorln!("{}: {}", path, err);
                continue;
            }
        };

        for file in files {
            let status = musikr::write(&file, entry, content);

            if status.is_ok() {
                print_entry!("{}: {} set\n", file.display(), tag);
            } else {
                errorln!("{}: {}", file.display(), status);
            }
        }
    }

    Ok(())
}
