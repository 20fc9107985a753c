fn main() {
    // lapack backend on macOS is the Accelerate framework
    #[cfg(feature = "macos")]
    println!("cargo:rustc-link-lib=framework=Accelerate");
}
