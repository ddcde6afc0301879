#![allow(dead_code)]

//! On-disk fixtures: input images and fake tool scripts.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ImageFormat, Rgb, RgbImage};
use scalepipe::config::{Tool, ToolsConfig};
use scalepipe::pipeline::files;

/// A `width`×`height` image with a filled disc in the middle.
pub fn disc_image(width: u32, height: u32) -> RgbImage {
    let (cx, cy) = (width as f64 / 2.0, height as f64 / 2.0);
    let r = width.min(height) as f64 / 3.0;
    RgbImage::from_fn(width, height, |x, y| {
        let (dx, dy) = (x as f64 - cx, y as f64 - cy);
        if dx * dx + dy * dy <= r * r {
            Rgb([20, 20, 20])
        } else {
            Rgb([235, 235, 235])
        }
    })
}

/// PNG-encoded disc image.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    disc_image(width, height)
        .write_to(&mut buf, ImageFormat::Png)
        .expect("encoding PNG fixture");
    buf.into_inner()
}

/// Write `input_0.png` (a disc) into `work_dir`.
pub fn write_input(work_dir: &Path, width: u32, height: u32) -> PathBuf {
    let path = work_dir.join(files::INPUT);
    fs::write(&path, png_bytes(width, height)).expect("writing input fixture");
    path
}

/// Write a uniform (blank) `input_0.png` into `work_dir`.
pub fn write_blank_input(work_dir: &Path, width: u32, height: u32) -> PathBuf {
    let path = work_dir.join(files::INPUT);
    RgbImage::from_pixel(width, height, Rgb([255, 255, 255]))
        .save_with_format(&path, ImageFormat::Png)
        .expect("writing blank input fixture");
    path
}

/// Write an executable `sh` script named `name` into `bin_dir`.
#[cfg(unix)]
pub fn install_script(bin_dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = bin_dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("writing script");
    let mut perms = fs::metadata(&path).expect("script metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("chmod script");
    path
}

/// Shell stand-ins for the five tools, deterministic in their inputs.
///
/// - convert/background copy their first argument to their second;
/// - the extractor echoes its arguments as a single "contour";
/// - the estimator emits one noise line per contour, the vector figure, and
///   the library search path it saw on stderr;
/// - the renderer copies the backdrop to its second argument.
#[cfg(unix)]
pub fn install_fake_tools(bin_dir: &Path) -> ToolsConfig {
    install_script(bin_dir, "convert.sh", r#"cp "$1" "$2""#);
    install_script(
        bin_dir,
        "pgm2freeman",
        r#"cat > /dev/null
echo "pgm2freeman $*" >&2
echo "contour $*""#,
    );
    install_script(bin_dir, "transformBG.sh", r#"cp "$1" "$2""#);
    install_script(
        bin_dir,
        "applyMS.sh",
        r##"while read -r line; do echo "noise 1 $line"; done
echo "#FIG 3.2" > noiseLevel.fig
echo "lib=$LD_LIBRARY_PATH" >&2"##,
    );
    install_script(
        bin_dir,
        "convertFig.sh",
        r#"cp input_0BG.png "$2"
echo "rendered $1" >&2"#,
    );

    let mut tools = ToolsConfig::default();
    tools.bin_dir = Some(bin_dir.to_path_buf());
    tools
}

/// Replace one tool's program with an absolute script path.
pub fn override_tool(tools: &mut ToolsConfig, tool: Tool, program: &Path) {
    tools.tool_mut(tool).program = program.to_string_lossy().into_owned();
}

/// Whether `pid` is still a live (non-zombie) process.
#[cfg(unix)]
pub fn process_alive(pid: i32) -> bool {
    if let Ok(stat) = fs::read_to_string(format!("/proc/{pid}/stat")) {
        // Field 3 (state) follows the parenthesised command name.
        return match stat.rsplit_once(')') {
            Some((_, rest)) => !matches!(rest.trim_start().chars().next(), Some('Z' | 'X')),
            None => true,
        };
    }
    if Path::new("/proc/self").exists() {
        return false;
    }
    // SAFETY: signal 0 only checks for existence.
    unsafe { libc::kill(pid, 0) == 0 }
}

/// Poll until `pid` is gone or `within` elapses; returns whether it is gone.
#[cfg(unix)]
pub fn wait_until_gone(pid: i32, within: std::time::Duration) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < within {
        if !process_alive(pid) {
            return true;
        }
        std::thread::sleep(std::time::Duration::from_millis(25));
    }
    !process_alive(pid)
}

/// Read a pid written by a script (`echo $$ > name`).
pub fn read_pid(path: &Path) -> i32 {
    fs::read_to_string(path)
        .expect("reading pid file")
        .trim()
        .parse()
        .expect("pid file holds a number")
}
