//! Download-once cache for the pdfium shared library.
//!
//! pdfium ships as a prebuilt archive per platform on the
//! `bblanchon/pdfium-binaries` releases page. When the library is neither
//! configured nor installed, [`ensure_pdfium_library`] fetches the archive
//! for the running platform, unpacks the one library file it needs into a
//! per-release cache directory, and returns its path. Later runs find the
//! file and skip the network.
//!
//! Cache location, in order:
//! - `$PDFTEXT_PDFIUM_CACHE/pdfium-{release}/`
//! - the platform cache dir (`~/.cache`, `~/Library/Caches`, `%LOCALAPPDATA%`)
//!   joined with `edgequake-pdftext/pdfium-{release}/`

use crate::error::PdfTextError;
use flate2::read::GzDecoder;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tar::Archive;
use tracing::{debug, info};

/// pdfium-binaries release tag (`chromium/<n>`).
pub const PDFIUM_RELEASE: &str = "7690";

/// Where release assets are published.
pub const RELEASE_BASE_URL: &str =
    "https://github.com/bblanchon/pdfium-binaries/releases/download";

/// Environment variable overriding the cache root.
pub const CACHE_DIR_ENV: &str = "PDFTEXT_PDFIUM_CACHE";

/// Archives are ~30 MB; allow slow links.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// The release asset for one platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformAsset {
    /// Asset file name in the release, e.g. `pdfium-linux-x64.tgz`.
    pub archive: &'static str,
    /// Path of the library inside the archive.
    pub member: &'static str,
    /// File name written to the cache.
    pub file_name: &'static str,
}

impl PlatformAsset {
    /// Asset for an `std::env::consts::{OS, ARCH}` pair.
    pub fn for_target(os: &str, arch: &str) -> Option<Self> {
        let (archive, member, file_name) = match (os, arch) {
            ("linux", "x86_64") => ("pdfium-linux-x64.tgz", "lib/libpdfium.so", "libpdfium.so"),
            ("linux", "aarch64") => ("pdfium-linux-arm64.tgz", "lib/libpdfium.so", "libpdfium.so"),
            ("macos", "x86_64") => ("pdfium-mac-x64.tgz", "lib/libpdfium.dylib", "libpdfium.dylib"),
            ("macos", "aarch64") => {
                ("pdfium-mac-arm64.tgz", "lib/libpdfium.dylib", "libpdfium.dylib")
            }
            ("windows", "x86_64") => ("pdfium-win-x64.tgz", "bin/pdfium.dll", "pdfium.dll"),
            ("windows", "aarch64") => ("pdfium-win-arm64.tgz", "bin/pdfium.dll", "pdfium.dll"),
            ("windows", "x86") => ("pdfium-win-x86.tgz", "bin/pdfium.dll", "pdfium.dll"),
            _ => return None,
        };
        Some(Self {
            archive,
            member,
            file_name,
        })
    }

    /// Asset for the platform this binary was built for.
    pub fn current() -> Result<Self, PdfTextError> {
        let (os, arch) = (std::env::consts::OS, std::env::consts::ARCH);
        Self::for_target(os, arch).ok_or_else(|| {
            PdfTextError::PdfiumProvisionFailed(format!("no prebuilt pdfium for {os}/{arch}"))
        })
    }

    pub fn download_url(&self, base_url: &str) -> String {
        format!(
            "{}/chromium%2F{}/{}",
            base_url.trim_end_matches('/'),
            PDFIUM_RELEASE,
            self.archive
        )
    }
}

/// Per-release cache directory, honouring [`CACHE_DIR_ENV`].
pub fn cache_dir() -> PathBuf {
    cache_dir_under(std::env::var_os(CACHE_DIR_ENV).map(PathBuf::from))
}

fn cache_dir_under(root: Option<PathBuf>) -> PathBuf {
    let release = format!("pdfium-{PDFIUM_RELEASE}");
    match root {
        Some(root) => root.join(release),
        None => dirs::cache_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
            .unwrap_or_else(std::env::temp_dir)
            .join("edgequake-pdftext")
            .join(release),
    }
}

/// Path of the cached library, if a previous run downloaded it.
pub fn cached_pdfium_library() -> Option<PathBuf> {
    let asset = PlatformAsset::current().ok()?;
    let path = cache_dir().join(asset.file_name);
    path.is_file().then_some(path)
}

/// Return the cached library, downloading it first if needed.
pub async fn ensure_pdfium_library() -> Result<PathBuf, PdfTextError> {
    LibraryInstaller::new(cache_dir(), PlatformAsset::current()?)?
        .install()
        .await
}

/// Downloads one [`PlatformAsset`] into one cache directory.
#[derive(Debug, Clone)]
pub struct LibraryInstaller {
    client: reqwest::Client,
    base_url: String,
    dir: PathBuf,
    asset: PlatformAsset,
}

impl LibraryInstaller {
    pub fn new(dir: impl Into<PathBuf>, asset: PlatformAsset) -> Result<Self, PdfTextError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("edgequake-pdftext/", env!("CARGO_PKG_VERSION")))
            .timeout(DOWNLOAD_TIMEOUT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| PdfTextError::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: RELEASE_BASE_URL.to_string(),
            dir: dir.into(),
            asset,
        })
    }

    /// Fetch from a mirror instead of GitHub.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn library_path(&self) -> PathBuf {
        self.dir.join(self.asset.file_name)
    }

    /// Return the library path, downloading and unpacking on a cache miss.
    pub async fn install(&self) -> Result<PathBuf, PdfTextError> {
        let target = self.library_path();
        if target.is_file() {
            debug!("pdfium found in cache: {}", target.display());
            return Ok(target);
        }

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            PdfTextError::PdfiumProvisionFailed(format!(
                "cannot create {}: {e}",
                self.dir.display()
            ))
        })?;

        let url = self.asset.download_url(&self.base_url);
        info!("Downloading pdfium {} from {}", PDFIUM_RELEASE, url);
        let archive = self.download(&url).await?;
        debug!("Downloaded {} bytes", archive.len());

        let member = self.asset.member;
        let dest = target.clone();
        tokio::task::spawn_blocking(move || unpack_member(&archive, member, &dest))
            .await
            .map_err(|e| PdfTextError::Internal(format!("Unpack task panicked: {e}")))??;

        info!("pdfium cached at {}", target.display());
        Ok(target)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, PdfTextError> {
        let failed = |e: reqwest::Error| PdfTextError::PdfiumProvisionFailed(format!("GET {url}: {e}"));

        let response = self.client.get(url).send().await.map_err(failed)?;
        let status = response.status();
        if !status.is_success() {
            return Err(PdfTextError::PdfiumProvisionFailed(format!(
                "HTTP {} for {url}",
                status.as_u16()
            )));
        }
        Ok(response.bytes().await.map_err(failed)?.to_vec())
    }
}

/// Write `member` of a gzipped tarball to `dest`.
///
/// The file is unpacked beside `dest` and renamed into place, so an
/// interrupted run never leaves a truncated library behind.
fn unpack_member(archive: &[u8], member: &str, dest: &Path) -> Result<(), PdfTextError> {
    let unpack_err = |e: std::io::Error| PdfTextError::PdfiumProvisionFailed(format!("unpack: {e}"));

    let mut entries = Archive::new(GzDecoder::new(archive));
    for entry in entries.entries().map_err(unpack_err)? {
        let mut entry = entry.map_err(unpack_err)?;
        if entry.path().map_err(unpack_err)?.as_os_str() != member {
            continue;
        }

        let mut partial = dest.as_os_str().to_owned();
        partial.push(".partial");
        let partial = PathBuf::from(partial);

        entry.unpack(&partial).map_err(unpack_err)?;
        return std::fs::rename(&partial, dest).map_err(unpack_err);
    }

    Err(PdfTextError::PdfiumProvisionFailed(format!(
        "'{member}' not found in archive"
    )))
}
