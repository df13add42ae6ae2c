// Build script for platform link settings
//
// The iOS haptics player is linked into the host app as a static framework,
// so its `_playIOSAHAP` family resolves at final link time. Nothing needs to
// be generated here; we only make sure the Apple frameworks the player depends
// on are requested when building the staticlib for iOS.

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("ios") {
        println!("cargo:rustc-link-lib=framework=CoreHaptics");
        println!("cargo:rustc-link-lib=framework=UIKit");
    }
}
