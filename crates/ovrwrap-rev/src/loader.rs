//! Locating and loading the runtime library.

use std::path::{Path, PathBuf};

use libloading::Library;
use ovrwrap_common::{Error, Result};
use tracing::{debug, info};

use crate::sys::*;

/// Major version of the runtime library this binding loads.
pub const LIBRARY_MAJOR_VERSION: u32 = 1;

/// File name of the runtime library on this platform.
pub fn library_file_name() -> String {
    if cfg!(target_os = "windows") {
        format!("LibOVRRevive_{LIBRARY_MAJOR_VERSION}.dll")
    } else if cfg!(target_os = "macos") {
        format!("LibOVRRT.framework/Versions/{LIBRARY_MAJOR_VERSION}/LibOVRRT")
    } else {
        let bits = if cfg!(target_pointer_width = "64") {
            "64"
        } else {
            "32"
        };
        format!("libOVRRT{bits}.so.{LIBRARY_MAJOR_VERSION}")
    }
}

/// Paths to try, most specific first.
///
/// An explicit runtime directory wins, then the directory of the host
/// executable, then the working directory. The bare file name comes last so
/// the platform loader's own search path gets a turn.
pub fn candidate_paths(
    runtime_dir: Option<&Path>,
    exe_dir: Option<&Path>,
    cwd: Option<&Path>,
) -> Vec<PathBuf> {
    let name = library_file_name();
    let mut paths = Vec::new();
    for dir in [runtime_dir, exe_dir, cwd].into_iter().flatten() {
        let path = dir.join(&name);
        if !paths.contains(&path) {
            paths.push(path);
        }
    }
    paths.push(PathBuf::from(name));
    paths
}

fn default_candidates(runtime_dir: Option<&Path>) -> Vec<PathBuf> {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    let cwd = std::env::current_dir().ok();
    candidate_paths(runtime_dir, exe_dir.as_deref(), cwd.as_deref())
}

/// Entry points resolved from the runtime library.
#[derive(Clone, Copy)]
pub struct RevFunctions {
    pub initialize: InitializeFn,
    pub shutdown: ShutdownFn,
    pub get_last_error_info: GetLastErrorInfoFn,
    pub create: CreateFn,
    pub destroy: DestroyFn,
    pub get_hmd_desc: GetHmdDescFn,
    pub create_texture_swap_chain_dx: CreateTextureSwapChainDxFn,
    pub get_texture_swap_chain_length: GetTextureSwapChainLengthFn,
    pub get_texture_swap_chain_current_index: GetTextureSwapChainCurrentIndexFn,
    pub get_texture_swap_chain_desc: GetTextureSwapChainDescFn,
    pub get_texture_swap_chain_buffer_dx: GetTextureSwapChainBufferDxFn,
    pub commit_texture_swap_chain: CommitTextureSwapChainFn,
    pub destroy_texture_swap_chain: DestroyTextureSwapChainFn,
    pub create_mirror_texture_dx: CreateMirrorTextureDxFn,
    pub get_mirror_texture_buffer_dx: GetMirrorTextureBufferDxFn,
    pub destroy_mirror_texture: DestroyMirrorTextureFn,
    pub get_fov_texture_size: GetFovTextureSizeFn,
    pub get_render_desc: GetRenderDescFn,
    pub submit_frame: SubmitFrameFn,
    pub get_predicted_display_time: GetPredictedDisplayTimeFn,
    pub get_time_in_seconds: GetTimeInSecondsFn,
}

/// # Safety
/// `T` must be the exact signature of the export called `name`.
unsafe fn symbol<T: Copy>(library: &Library, name: &str) -> Result<T> {
    let mut bytes = Vec::with_capacity(name.len() + 1);
    bytes.extend_from_slice(name.as_bytes());
    bytes.push(0);

    let symbol = library
        .get::<T>(&bytes)
        .map_err(|err| Error::missing_symbol(format!("{name}: {err}")))?;
    Ok(*symbol)
}

impl RevFunctions {
    /// # Safety
    /// `library` must be a LibREV runtime whose exports match `sys`.
    unsafe fn resolve(library: &Library) -> Result<Self> {
        Ok(Self {
            initialize: symbol(library, "ovr_Initialize")?,
            shutdown: symbol(library, "ovr_Shutdown")?,
            get_last_error_info: symbol(library, "ovr_GetLastErrorInfo")?,
            create: symbol(library, "ovr_Create")?,
            destroy: symbol(library, "ovr_Destroy")?,
            get_hmd_desc: symbol(library, "ovr_GetHmdDesc")?,
            create_texture_swap_chain_dx: symbol(library, "ovr_CreateTextureSwapChainDX")?,
            get_texture_swap_chain_length: symbol(library, "ovr_GetTextureSwapChainLength")?,
            get_texture_swap_chain_current_index: symbol(
                library,
                "ovr_GetTextureSwapChainCurrentIndex",
            )?,
            get_texture_swap_chain_desc: symbol(library, "ovr_GetTextureSwapChainDesc")?,
            get_texture_swap_chain_buffer_dx: symbol(library, "ovr_GetTextureSwapChainBufferDX")?,
            commit_texture_swap_chain: symbol(library, "ovr_CommitTextureSwapChain")?,
            destroy_texture_swap_chain: symbol(library, "ovr_DestroyTextureSwapChain")?,
            create_mirror_texture_dx: symbol(library, "ovr_CreateMirrorTextureDX")?,
            get_mirror_texture_buffer_dx: symbol(library, "ovr_GetMirrorTextureBufferDX")?,
            destroy_mirror_texture: symbol(library, "ovr_DestroyMirrorTexture")?,
            get_fov_texture_size: symbol(library, "ovr_GetFovTextureSize")?,
            get_render_desc: symbol(library, "ovr_GetRenderDesc")?,
            submit_frame: symbol(library, "ovr_SubmitFrame")?,
            get_predicted_display_time: symbol(library, "ovr_GetPredictedDisplayTime")?,
            get_time_in_seconds: symbol(library, "ovr_GetTimeInSeconds")?,
        })
    }
}

/// A loaded runtime library and its resolved entry points.
///
/// The library stays mapped for as long as this value lives; the function
/// table is only valid while it does.
pub struct RevLibrary {
    functions: RevFunctions,
    path: PathBuf,
    _library: Library,
}

impl RevLibrary {
    /// Load the runtime, trying [`candidate_paths`] in order.
    pub fn load(runtime_dir: Option<&Path>) -> Result<Self> {
        let candidates = default_candidates(runtime_dir);
        let mut failures = Vec::new();

        for path in candidates {
            // SAFETY: loading runs the library's initializers; the runtime is
            // a plain C library without load-time side effects we depend on.
            let library = match unsafe { Library::new(&path) } {
                Ok(library) => library,
                Err(err) => {
                    debug!(path = %path.display(), "runtime library not loadable: {err}");
                    failures.push(format!("{}: {err}", path.display()));
                    continue;
                }
            };

            // SAFETY: the signatures in `sys` mirror the runtime's headers.
            let functions = unsafe { RevFunctions::resolve(&library) }?;
            info!(path = %path.display(), "loaded runtime library");
            return Ok(Self {
                functions,
                path,
                _library: library,
            });
        }

        Err(Error::library_not_found(failures.join("; ")))
    }

    pub fn functions(&self) -> &RevFunctions {
        &self.functions
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for RevLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevLibrary")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
