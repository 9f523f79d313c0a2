fn main() {
    println!("cargo:rerun-if-env-changed=PYO3_PYTHON");

    let Ok(target) = std::env::var("TARGET") else {
        return;
    };

    if target.contains("apple-darwin") {
        // Interpreter shipped next to the binary
        add_rpath("@executable_path/../lib");

        add_rpath("/opt/homebrew/lib");
        add_rpath("/usr/local/lib");
        add_rpath("/Library/Frameworks/Python.framework/Versions/Current/lib");
    } else if target.contains("linux") {
        add_rpath("$ORIGIN/../lib");
        add_rpath("/usr/local/lib");
    } else {
        return;
    }

    // libpython of the interpreter pyo3 builds against, for local runs and tests
    if let Some(libdir) = find_python_libdir() {
        add_rpath(&libdir);
    }
}

fn add_rpath(path: &str) {
    println!("cargo:rustc-link-arg=-Wl,-rpath,{path}");
}

/// Ask the build interpreter where libpython lives.
fn find_python_libdir() -> Option<String> {
    let python = std::env::var("PYO3_PYTHON").unwrap_or_else(|_| "python3".to_string());
    let output = std::process::Command::new(&python)
        .args([
            "-c",
            "import sysconfig; print(sysconfig.get_config_var('LIBDIR') or '')",
        ])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let libdir = String::from_utf8(output.stdout).ok()?;
    let libdir = libdir.trim();
    if libdir.is_empty() {
        return None;
    }
    Some(libdir.to_string())
}
