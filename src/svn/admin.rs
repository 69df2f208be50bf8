//! Repository creation, run once per repository outside the read path.

use crate::error::{Result, SvnError};
use crate::svn::executor::{CommandRunner, SvnCommand};
use crate::svn::repository::RepositoryLocation;
use std::path::Path;
use tracing::info;

/// Folders of the conventional layout, in creation order
pub const STANDARD_LAYOUT: &[&str] = &["trunk", "tags", "branches"];

const LAYOUT_MESSAGE: &str = "Trunk Tag Branches";

/// Create a new repository at `base`
///
/// Refuses to touch an existing path. With `standard_layout` the
/// `trunk`/`tags`/`branches` folders are committed in a single revision.
pub fn create_repository<R: CommandRunner>(
    runner: &R,
    base: &Path,
    standard_layout: bool,
) -> Result<RepositoryLocation> {
    let location = RepositoryLocation::from_path(base)?;

    if base.exists() {
        return Err(SvnError::RepositoryExists(base.to_path_buf()));
    }

    let create = SvnCommand::svnadmin("create").arg(base.to_string_lossy());
    runner.run(&create)?.into_result(&create)?;
    info!(location = %location, "created repository");

    if standard_layout {
        let mut mkdir = SvnCommand::svn("mkdir");
        for folder in STANDARD_LAYOUT {
            mkdir = mkdir.arg(location.url(folder));
        }
        let mkdir = mkdir.arg("-m").arg(LAYOUT_MESSAGE);
        runner.run(&mkdir)?.into_result(&mkdir)?;
        info!(location = %location, "created standard layout");
    }

    Ok(location)
}
