//! End-to-end packaging runs against a throwaway git repository.

#![cfg(unix)]

mod common;

use common::{Fixture, VERSION, git_available, zip_names};
use prestashop_release::{
    cli::OutputManager,
    release::{ArtifactKind, ErrorKind, Packager, STAGING_DIR_NAME, Stage},
};

fn quiet() -> OutputManager {
    OutputManager::with_writer(false, true, std::io::sink())
}

macro_rules! require_git {
    () => {
        if !git_available() {
            eprintln!("git not installed, skipping");
            return;
        }
    };
}

#[tokio::test]
async fn zip_release_ships_the_cleaned_tree() {
    require_git!();
    let fixture = Fixture::new();
    let job = fixture.job().use_installer(false).build().unwrap();
    assert_eq!(job.version().as_str(), VERSION);

    let artifact = Packager::new(job, quiet()).package().await.unwrap();

    assert_eq!(artifact.kind, ArtifactKind::Zip);
    assert_eq!(artifact.path, fixture.destination().join("prestashop_8.1.0.zip"));
    assert_eq!(artifact.manifest, fixture.destination().join("prestashop_8.1.0.xml"));
    assert!(artifact.checksum.as_deref().is_some_and(|c| c.len() == 64));
    assert!(artifact.size > 0);

    let names = zip_names(&artifact.path);
    for shipped in [
        "admin/index.php",
        "install/install_version.php",
        "app/AppKernel.php",
        "LICENSES",
        "img/tmp/CACHEDIR.TAG",
        "var/cache/CACHEDIR.TAG",
        "vendor/acme/lib/Lib.php",
    ] {
        assert!(names.iter().any(|n| n == shipped), "{shipped} missing from {names:?}");
    }
    for dropped in ["README.md", "composer.json", ".gitignore", "admin-dev/", "tests/", "node_modules", "uncommitted.php"] {
        assert!(!names.iter().any(|n| n.contains(dropped)), "{dropped} shipped in {names:?}");
    }

    let manifest = std::fs::read_to_string(&artifact.manifest).unwrap();
    assert!(manifest.contains("<ps_root_dir version=\"8.1.0\">"));
    assert!(manifest.contains("\t\t<dir name=\"admin\">\n\t\t\t<md5file name=\"index.php\">"));
    assert!(!manifest.contains("KernelTest.php"));
    assert!(!manifest.contains("README.md"));
    assert!(!manifest.contains(".gitignore"));
    assert!(!manifest.contains("node_modules"));
    assert_eq!(artifact.manifest_entries, manifest.matches("<md5file ").count());

    assert!(!fixture.temp.path().join(STAGING_DIR_NAME).exists());
    assert!(fixture.source.path().join("var/logs/composer-install.log").exists());
    assert!(fixture.source.path().join("var/logs/build-assets.log").exists());
}

#[tokio::test]
async fn directory_release_keeps_tests_when_asked() {
    require_git!();
    let fixture = Fixture::new();
    let mut tools = fixture.tools();
    tools.exclusions.folders.push("vendor/acme".into());
    let job = fixture
        .job()
        .use_zip(false)
        .keep_tests(true)
        .tools(tools)
        .build()
        .unwrap();
    assert!(!job.use_installer());

    let artifact = Packager::new(job, quiet()).package().await.unwrap();

    let release = fixture.destination().join(STAGING_DIR_NAME);
    assert_eq!(artifact.kind, ArtifactKind::Directory);
    assert_eq!(artifact.path, release);
    assert!(artifact.checksum.is_none());
    assert!(release.join("tests/Unit/KernelTest.php").is_file());
    assert!(!release.join("README.md").exists());
    assert!(!release.join("vendor/acme").exists());
    assert!(release.join("vendor").is_dir());

    let kernel = std::fs::read(release.join("app/AppKernel.php")).unwrap();
    let kernel_text = String::from_utf8_lossy(&kernel);
    assert!(kernel_text.contains("const VERSION = '8.1.0';"));
    assert!(kernel_text.contains("const MINOR_VERSION = 1;"));

    let manifest = std::fs::read_to_string(&artifact.manifest).unwrap();
    assert!(manifest.contains("<md5file name=\"KernelTest.php\">"));
    assert!(!manifest.contains("Lib.php"));
    assert!(manifest.contains(&format!(
        "<md5file name=\"AppKernel.php\">{:x}</md5file>",
        md5::compute(&kernel)
    )));

    let licences = std::fs::read_to_string(release.join("LICENSES")).unwrap();
    assert_eq!(licences, "ACME licence\r\n\r\n");
}

#[tokio::test]
async fn installer_bundle_wraps_the_payload() {
    require_git!();
    let fixture = Fixture::new();
    let job = fixture.job().build().unwrap();

    let artifact = Packager::new(job, quiet()).package().await.unwrap();

    assert_eq!(artifact.kind, ArtifactKind::InstallerBundle);
    let mut names = zip_names(&artifact.path);
    names.sort();
    assert_eq!(names, ["index.php", "prestashop.zip", "readme_en.txt"]);

    let unpacker = fixture
        .source
        .path()
        .join("tools/build/Library/InstallUnpacker/index.php");
    assert!(!unpacker.exists());
}

#[tokio::test]
async fn failing_asset_build_aborts_and_cleans_up() {
    require_git!();
    let fixture = Fixture::new();
    let mut tools = fixture.tools();
    tools.tools.make = "false".into();
    let job = fixture.job().tools(tools).build().unwrap();

    let err = Packager::new(job, quiet()).package().await.unwrap_err();

    assert_eq!(err.stage(), Some(Stage::BuildAssets));
    assert_eq!(err.kind(), ErrorKind::ExternalCommand);
    assert!(err.to_string().contains("build-assets.log"));
    assert!(!fixture.temp.path().join(STAGING_DIR_NAME).exists());
    assert!(!fixture.destination().join("prestashop_8.1.0.zip").exists());
    assert!(!fixture.destination().join("prestashop_8.1.0.xml").exists());
}

#[tokio::test]
async fn missing_tool_fails_before_staging() {
    require_git!();
    let fixture = Fixture::new();
    let mut tools = fixture.tools();
    tools.tools.composer = "composer-that-does-not-exist".into();
    let job = fixture.job().tools(tools).build().unwrap();

    let err = Packager::new(job, quiet()).package().await.unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Init));
    assert!(err.to_string().contains("composer-that-does-not-exist"));
    assert!(!fixture.temp.path().join(STAGING_DIR_NAME).exists());
}

#[tokio::test]
async fn failed_unpacker_compile_leaves_no_entry_point() {
    require_git!();
    let fixture = Fixture::new();
    let unpacker = fixture.source.path().join("tools/build/Library/InstallUnpacker");
    std::fs::write(
        unpacker.join("compile.php"),
        "echo \"<?php // partial\" > index.php\nexit 7\n",
    )
    .unwrap();
    let job = fixture.job().build().unwrap();

    let err = Packager::new(job, quiet()).package().await.unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Archive));
    assert_eq!(err.kind(), ErrorKind::ExternalCommand);
    assert!(!unpacker.join("index.php").exists());
    assert!(!fixture.destination().join("prestashop_8.1.0.zip").exists());
}

#[tokio::test]
async fn reused_destination_is_not_merged_into() {
    require_git!();
    let fixture = Fixture::new();
    let stale = fixture.destination().join(STAGING_DIR_NAME);
    std::fs::create_dir_all(&stale).unwrap();
    std::fs::write(stale.join("stale.php"), "<?php\n").unwrap();
    let job = fixture.job().use_zip(false).build().unwrap();

    let err = Packager::new(job, quiet()).package().await.unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Move));
    assert_eq!(err.kind(), ErrorKind::Filesystem);
    assert!(err.to_string().contains("refusing to overwrite"), "{err}");
    assert!(stale.join("stale.php").exists());
    assert!(!stale.join("admin").exists());
    assert!(!fixture.destination().join("prestashop_8.1.0.xml").exists());
    assert!(!fixture.temp.path().join(STAGING_DIR_NAME).exists());
}
