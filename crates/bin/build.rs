use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=../client/Cargo.toml");
    println!("cargo:rerun-if-changed=../client/src");
    println!("cargo:rerun-if-changed=../client/web/index.html");

    // Skip with FLOORVIEW_SKIP_WASM=1 (CI, server-only builds).
    println!("cargo:rerun-if-env-changed=FLOORVIEW_SKIP_WASM");
    if std::env::var_os("FLOORVIEW_SKIP_WASM").is_some() {
        return;
    }

    println!("cargo:warning=Building WASM client...");

    // Separate target dir to avoid the outer build's file lock
    let status = Command::new("wasm-pack")
        .args(["build", "--target", "web", "--out-dir", "./web/pkg", "--target-dir", "../../target/wasm"])
        .current_dir("../client")
        .status();

    match status {
        Ok(status) if status.success() => {
            println!("cargo:warning=WASM client built successfully - assets will be embedded");
        }
        Ok(status) => {
            println!("cargo:warning=WASM client build failed ({status}); serving without the viewer bundle");
        }
        Err(e) => {
            println!("cargo:warning=wasm-pack not available ({e}); serving without the viewer bundle");
        }
    }
}
