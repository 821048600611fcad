//! High-level filesystem operations.

use tracing::info;

use crate::library::Library;
use crate::mount::MountConfig;
use crate::vfs::BabylonFilesystem;
use crate::FsError;

/// Mounts a library and serves requests until it is unmounted.
pub fn mount(config: MountConfig) -> Result<(), FsError> {
    let mount_point = config.mount_point.clone();

    // Ensure mount point exists
    if !mount_point.exists() {
        std::fs::create_dir_all(&mount_point)
            .map_err(|e| FsError::Mount(format!("Failed to create mount point: {}", e)))?;
    }

    let library = Library::new(config.seed.clone(), config.cycle);
    let options = config.options();

    info!(
        mount_point = %mount_point.display(),
        seed = %config.seed,
        cycle = %config.cycle,
        "Mounting library"
    );

    let fs = BabylonFilesystem::new(library, config);
    fuser::mount2(fs, &mount_point, &options)
        .map_err(|e| FsError::Mount(format!("FUSE mount failed: {}", e)))?;

    info!(mount_point = %mount_point.display(), "Library unmounted");
    Ok(())
}
