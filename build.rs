use std::{env, fs, path::Path};

fn main() {
    println!("cargo:rerun-if-changed=config.json");

    // OUT_DIR = target/debug/build/<crate>/out
    let out_dir = env::var("OUT_DIR").expect("Cannot read OUT_DIR");

    // Move up 3 directories to reach target/debug or target/release
    let exe_dir = Path::new(&out_dir)
        .ancestors()
        .nth(3)
        .expect("Cannot find executable directory");

    let src = Path::new("config.json");
    let dst = exe_dir.join("config.json");

    // formdrop falls back to built-in defaults, so a failed copy only warns.
    if let Err(e) = fs::copy(src, &dst) {
        println!("cargo:warning=formdrop: could not copy config.json to {}: {}", dst.display(), e);
    }
}
