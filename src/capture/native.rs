//! OS camera enumeration using nokhwa

use nokhwa::utils::ApiBackend;

/// Human readable names of the cameras the OS reports, in index order
pub fn camera_names() -> Vec<String> {
    match nokhwa::query(ApiBackend::Auto) {
        Ok(cameras) => cameras
            .into_iter()
            .map(|info| info.human_name().to_string())
            .collect(),
        Err(e) => {
            tracing::warn!("Failed to enumerate cameras: {:?}", e);
            Vec::new()
        }
    }
}
