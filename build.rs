use chrono::Utc;

fn main() {
    // Build time shown by `fsbridge --version` / 版本信息中的构建时间
    let build_time = Utc::now().format("%Y-%m-%d %H:%M UTC");
    println!("cargo:rustc-env=BUILD_TIME={}", build_time);
    println!("cargo:rerun-if-changed=build.rs");
}
