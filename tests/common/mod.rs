//! Shared fixtures: a minimal committed shop tree with no-op build tools.

#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    process::Command,
};

use prestashop_release::release::{ReleaseJobBuilder, ToolConfig};

pub const VERSION: &str = "8.1.0";

pub const KERNEL: &str = "<?php
class AppKernel extends Kernel
{
    const VERSION = '8.0.0';
    const MAJOR_VERSION_STRING = '8';
    const MAJOR_VERSION = 8;
    const MINOR_VERSION = 0;
    const RELEASE_VERSION = 0;
}
";

pub fn git_available() -> bool {
    which::which("git").is_ok()
}

fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_AUTHOR_NAME", "release")
        .env("GIT_AUTHOR_EMAIL", "release@example.com")
        .env("GIT_COMMITTER_NAME", "release")
        .env("GIT_COMMITTER_EMAIL", "release@example.com")
        .status()
        .unwrap();
    assert!(status.success(), "git {args:?}");
}

pub fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// A throwaway shop tree, committed, plus a temp root and a destination.
pub struct Fixture {
    pub source: tempfile::TempDir,
    pub temp: tempfile::TempDir,
    pub out: tempfile::TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let source = tempfile::tempdir().unwrap();
        let root = source.path();

        write(root, "src/Core/Version.php", &format!("<?php\nconst VERSION = '{VERSION}';\n"));
        write(root, "config/defines.inc.php", "<?php\ndefine('_PS_MODE_DEV_', true);\n");
        write(root, "app/AppKernel.php", KERNEL);
        write(root, "install-dev/install_version.php", "<?php\ndefine('_PS_INSTALL_VERSION_', '8.0.0');\n");
        write(root, "install-dev/index.php", "<?php\n");
        write(root, "admin-dev/index.php", "<?php\n");
        write(root, "img/tmp/index.php", "<?php\n");
        write(root, "var/cache/index.php", "<?php\n");
        write(root, "vendor/acme/lib/LICENSE", "ACME licence");
        write(root, "vendor/acme/lib/Lib.php", "<?php\n");
        write(root, "js/node_modules/left-pad/index.js", "module.exports = 1;");
        write(root, "tests/Unit/KernelTest.php", "<?php\n");
        write(root, "README.md", "# shop");
        write(root, "composer.json", "{}");
        write(root, ".gitignore", "/var/logs/*.log\n");
        write(root, "tools/build/doc/readme_en.txt", "Install me");
        write(
            root,
            "tools/build/Library/InstallUnpacker/compile.php",
            "echo \"<?php // unpacker $1\" > index.php\n",
        );

        git(root, &["init", "-q"]);
        git(root, &["add", "-A"]);
        git(root, &["commit", "-q", "-m", "initial"]);

        // Uncommitted changes never reach the release.
        write(root, "admin-dev/uncommitted.php", "<?php\n");

        Self {
            source,
            temp: tempfile::tempdir().unwrap(),
            out: tempfile::tempdir().unwrap(),
        }
    }

    pub fn destination(&self) -> PathBuf {
        self.out.path().join("release")
    }

    pub fn tools(&self) -> ToolConfig {
        let mut tools = ToolConfig::default();
        tools.tools.composer = "true".into();
        tools.tools.make = "true".into();
        // compile.php is a shell script in the fixture
        tools.tools.php = "sh".into();
        tools.limits.command_timeout_secs = 120;
        tools
    }

    pub fn job(&self) -> ReleaseJobBuilder {
        ReleaseJobBuilder::new()
            .source_path(self.source.path())
            .temp_root(self.temp.path())
            .destination_path(self.destination())
            .tools(self.tools())
    }
}

pub fn zip_names(path: &Path) -> Vec<String> {
    let archive = zip::ZipArchive::new(std::fs::File::open(path).unwrap()).unwrap();
    archive.file_names().map(String::from).collect()
}
