fn main() {
    // Only the desktop shell needs the generated Tauri context
    #[cfg(feature = "app")]
    tauri_build::build();
}
