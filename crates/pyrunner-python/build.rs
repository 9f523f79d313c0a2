use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-env-changed=PYO3_PYTHON");

    let target = env::var("TARGET").unwrap_or_default();
    if !(target.contains("linux") || target.contains("apple-darwin")) {
        return;
    }

    // The unit tests embed the interpreter, so they need to find libpython at run time
    if let Some(libdir) = python_libdir() {
        println!("cargo:rustc-link-arg=-Wl,-rpath,{libdir}");
    }
}

fn python_libdir() -> Option<String> {
    let python = env::var("PYO3_PYTHON").unwrap_or_else(|_| "python3".to_string());
    let output = Command::new(python)
        .args([
            "-c",
            "import sysconfig; print(sysconfig.get_config_var('LIBDIR') or '')",
        ])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let libdir = String::from_utf8(output.stdout).ok()?.trim().to_string();
    (!libdir.is_empty()).then_some(libdir)
}
