//! Locating real Archive II volumes for tests.
//!
//! Real volumes are several megabytes and are not checked in. Tests that
//! need one look in a few well-known places and skip when nothing is found.

use std::path::PathBuf;

/// Environment variable naming an extra directory to search.
pub const TEST_DATA_ENV: &str = "TEST_DATA_DIR";

/// Workspace root, two levels above this crate's manifest.
pub fn workspace_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .ancestors()
        .nth(2)
        .map(PathBuf::from)
        .unwrap_or(manifest_dir)
}

/// `crates/{crate_name}/testdata` under the workspace root.
pub fn crate_testdata_dir(crate_name: &str) -> PathBuf {
    workspace_root().join("crates").join(crate_name).join("testdata")
}

/// Find a test file by name.
///
/// Searched in order:
/// 1. `$TEST_DATA_DIR`
/// 2. `crates/nexrad-decoder/testdata/`
/// 3. `testdata/` at the workspace root
pub fn find_test_file(name: &str) -> Option<PathBuf> {
    let env_dir = std::env::var(TEST_DATA_ENV).ok().map(PathBuf::from);

    env_dir
        .into_iter()
        .chain([crate_testdata_dir("nexrad-decoder"), workspace_root().join("testdata")])
        .map(|dir| dir.join(name))
        .find(|path| path.is_file())
}

/// Temporary directory removed on drop.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("radar_test_")
        .tempdir()
        .expect("Failed to create temporary test directory")
}
