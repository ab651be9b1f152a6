use std::env;
use std::path::PathBuf;

// Build-time help for Windows, where ffmpeg-sys-next discovery regularly
// fails without FFMPEG_DIR. On other platforms pkg-config handles it and
// this script does nothing.
fn main() {
    println!("cargo:rerun-if-env-changed=FFMPEG_DIR");
    println!("cargo:rerun-if-env-changed=VCPKG_ROOT");
    println!("cargo:rerun-if-env-changed=VCPKGRS_DYNAMIC");
    println!("cargo:rerun-if-env-changed=VCPKGRS_TRIPLET");
    println!("cargo:rerun-if-env-changed=LIBCLANG_PATH");

    if env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("windows") {
        return;
    }
    if env::var_os("FFMPEG_DIR").is_some() {
        // Explicit configuration wins; nothing to guess.
        return;
    }

    match vcpkg_ffmpeg_dir() {
        Some(dir) if dir.exists() => {
            println!(
                "cargo:warning=Found a vcpkg FFmpeg install at {}. Set FFMPEG_DIR={} so ffmpeg-sys-next picks it up explicitly.",
                dir.display(),
                dir.display(),
            );
            if env::var_os("VCPKGRS_DYNAMIC").is_none() {
                println!(
                    "cargo:warning=For vcpkg dynamic FFmpeg builds, also set VCPKGRS_DYNAMIC=1."
                );
            }
        }
        Some(dir) => {
            println!(
                "cargo:warning=VCPKG_ROOT is set but {} does not exist; install FFmpeg with `vcpkg install ffmpeg`.",
                dir.display(),
            );
        }
        None => {
            println!(
                "cargo:warning=FFMPEG_DIR is not set. On Windows, install FFmpeg (for example via vcpkg) and set FFMPEG_DIR before building framesift."
            );
        }
    }

    if env::var_os("LIBCLANG_PATH").is_none() {
        println!(
            "cargo:warning=LIBCLANG_PATH is not set; ffmpeg-sys-next needs libclang for bindgen on Windows."
        );
    }
}

fn vcpkg_ffmpeg_dir() -> Option<PathBuf> {
    let root = env::var("VCPKG_ROOT").ok()?;
    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    Some(PathBuf::from(root).join("installed").join(triplet))
}
