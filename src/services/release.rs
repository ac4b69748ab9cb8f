//! Backrest release download and unpacking
//!
//! Queries the release API for the latest release, picks the Linux archive
//! for the host architecture, unpacks it into the install directory and runs
//! the bundled `install.sh`.

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::Path;
use std::time::Duration;

use flate2::read::GzDecoder;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::info;

use crate::config::InstallPaths;
use crate::error::{SetupError, SetupResult};
use crate::exec::{CommandRunner, CommandSpec};
use crate::models::Architecture;

/// OS label in release asset names
const OS_LABEL: &str = "Linux";

/// Installer script shipped inside the release archive
pub const INSTALL_SCRIPT: &str = "install.sh";

/// Latest-release metadata
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// One downloadable file of a release
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

impl Release {
    /// Pick the Linux tarball for `arch`
    pub fn select_asset(&self, arch: Architecture) -> SetupResult<&ReleaseAsset> {
        self.assets
            .iter()
            .find(|asset| {
                asset.name.contains(OS_LABEL)
                    && asset.name.contains(arch.asset_tag())
                    && asset.name.ends_with(".tar.gz")
            })
            .ok_or_else(|| {
                SetupError::Release(format!(
                    "No {} {} archive in release {}",
                    OS_LABEL, arch, self.tag_name
                ))
            })
    }
}

/// Where releases come from
pub trait ReleaseSource {
    /// Fetch metadata for the latest release
    fn latest(&self) -> SetupResult<Release>;

    /// Download `asset` to `dest`
    fn download(&self, asset: &ReleaseAsset, dest: &Path) -> SetupResult<()>;
}

/// Release source backed by the GitHub releases API
pub struct GitHubReleases {
    client: Client,
    api_url: String,
}

impl GitHubReleases {
    pub fn new(api_url: impl Into<String>) -> SetupResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("backrest-setup/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(300))
            .build()?;
        Ok(Self {
            client,
            api_url: api_url.into(),
        })
    }
}

impl ReleaseSource for GitHubReleases {
    fn latest(&self) -> SetupResult<Release> {
        let release = self
            .client
            .get(&self.api_url)
            .header("Accept", "application/vnd.github+json")
            .send()?
            .error_for_status()?
            .json::<Release>()?;
        Ok(release)
    }

    fn download(&self, asset: &ReleaseAsset, dest: &Path) -> SetupResult<()> {
        let mut response = self
            .client
            .get(&asset.browser_download_url)
            .send()?
            .error_for_status()?;

        let mut file = File::create(dest)
            .map_err(|e| SetupError::io(format!("Failed to create {}", dest.display()), e))?;
        io::copy(&mut response, &mut file)
            .map_err(|e| SetupError::io(format!("Failed to download {}", asset.name), e))?;
        Ok(())
    }
}

/// Unpack a gzip tarball into `dest`, creating it if needed
pub fn unpack_archive(archive: &Path, dest: &Path) -> SetupResult<()> {
    fs::create_dir_all(dest)
        .map_err(|e| SetupError::io(format!("Failed to create {}", dest.display()), e))?;

    let file = File::open(archive)
        .map_err(|e| SetupError::io(format!("Failed to open {}", archive.display()), e))?;
    let mut tarball = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
    tarball
        .unpack(dest)
        .map_err(|e| SetupError::Release(format!("Failed to unpack {}: {}", archive.display(), e)))?;
    Ok(())
}

/// Download, unpack and install the latest release for `arch`
///
/// Returns the installed release tag.
pub fn install_release<R: CommandRunner, S: ReleaseSource + ?Sized>(
    runner: &mut R,
    source: &S,
    paths: &InstallPaths,
    arch: Architecture,
) -> SetupResult<String> {
    let release = source.latest()?;
    let asset = release.select_asset(arch)?;
    info!(release = %release.tag_name, asset = %asset.name, "downloading release");

    let install_dir = paths.install_dir();
    fs::create_dir_all(&install_dir)
        .map_err(|e| SetupError::io(format!("Failed to create {}", install_dir.display()), e))?;

    let archive = install_dir.join(&asset.name);
    source.download(asset, &archive)?;
    unpack_archive(&archive, &install_dir)?;
    fs::remove_file(&archive)
        .map_err(|e| SetupError::io(format!("Failed to remove {}", archive.display()), e))?;

    let script = install_dir.join(INSTALL_SCRIPT);
    if !script.exists() {
        return Err(SetupError::Release(format!(
            "{} not found in {}",
            INSTALL_SCRIPT, asset.name
        )));
    }

    info!(dir = %install_dir.display(), "running bundled installer");
    runner.run_checked(
        &CommandSpec::new("sh")
            .arg(script.to_string_lossy())
            .current_dir(&install_dir),
    )?;

    Ok(release.tag_name)
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::exec::recording::RecordingRunner;
    use tempfile::TempDir;

    fn release_with(names: &[&str]) -> Release {
        Release {
            tag_name: "v1.2.3".into(),
            assets: names
                .iter()
                .map(|n| ReleaseAsset {
                    name: n.to_string(),
                    browser_download_url: format!("https://example.invalid/{}", n),
                })
                .collect(),
        }
    }

    #[test]
    fn test_select_asset_matches_arch_and_os() {
        let release = release_with(&[
            "backrest_Darwin_arm64.tar.gz",
            "backrest_Linux_arm64.tar.gz",
            "backrest_Linux_armv7.tar.gz",
            "backrest_Linux_x86_64.tar.gz",
            "checksums.txt",
        ]);

        let asset = release.select_asset(Architecture::Arm64).unwrap();
        assert_eq!(asset.name, "backrest_Linux_arm64.tar.gz");

        let asset = release.select_asset(Architecture::Armv7).unwrap();
        assert_eq!(asset.name, "backrest_Linux_armv7.tar.gz");
    }

    #[test]
    fn test_select_asset_missing() {
        let release = release_with(&["backrest_Windows_x86_64.zip"]);
        let err = release.select_asset(Architecture::X86_64).unwrap_err();
        assert!(matches!(err, SetupError::Release(_)));
    }

    #[test]
    fn test_release_json() {
        let json = r#"{
            "tag_name": "v1.4.0",
            "name": "v1.4.0",
            "assets": [
                {"name": "backrest_Linux_x86_64.tar.gz", "size": 1,
                 "browser_download_url": "https://github.com/x/backrest_Linux_x86_64.tar.gz"}
            ]
        }"#;
        let release: Release = serde_json::from_str(json).unwrap();
        assert_eq!(release.tag_name, "v1.4.0");
        assert_eq!(release.assets.len(), 1);
    }

    #[test]
    fn test_unpack_archive() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("a.tar.gz");
        fs::write(&archive, tarball(&[("backrest", "bin"), ("install.sh", "echo hi")])).unwrap();

        let dest = temp.path().join("opt/backrest");
        unpack_archive(&archive, &dest).unwrap();

        assert_eq!(fs::read_to_string(dest.join("install.sh")).unwrap(), "echo hi");
        assert!(dest.join("backrest").exists());
    }

    #[test]
    fn test_unpack_garbage_fails() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("a.tar.gz");
        fs::write(&archive, b"not a tarball").unwrap();

        assert!(unpack_archive(&archive, &temp.path().join("out")).is_err());
    }

    #[test]
    fn test_install_release_runs_bundled_installer() {
        let temp = TempDir::new().unwrap();
        let paths = InstallPaths::with_roots(temp.path().join("home"), temp.path().join("root"));
        let mut runner = RecordingRunner::new();

        let tag = install_release(&mut runner, &FakeReleases::standard(), &paths, Architecture::X86_64)
            .unwrap();

        assert_eq!(tag, "v1.0.0");
        assert!(paths.backrest_binary().exists());
        assert!(!paths.install_dir().join("backrest_Linux_x86_64.tar.gz").exists());
        assert_eq!(runner.commands.len(), 1);
        assert_eq!(
            runner.commands[0].get_current_dir(),
            Some(paths.install_dir().as_path())
        );
    }

    #[test]
    fn test_install_release_without_script() {
        let temp = TempDir::new().unwrap();
        let paths = InstallPaths::with_roots(temp.path().join("home"), temp.path().join("root"));
        let mut source = FakeReleases::standard();
        source.archive = tarball(&[("backrest", "bin")]);
        let mut runner = RecordingRunner::new();

        let err = install_release(&mut runner, &source, &paths, Architecture::Arm64).unwrap_err();
        assert!(matches!(err, SetupError::Release(_)));
        assert!(runner.commands.is_empty());
    }
}
