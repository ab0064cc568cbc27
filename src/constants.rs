// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Default makeup parameters applied on session creation and reset
pub mod defaults {
    /// Default lip color (crimson)
    pub const LIPS_COLOR: &str = "#DC143C";

    /// Default lip intensity
    pub const LIPS_INTENSITY: u8 = 65;

    /// Default cheek color (hot pink)
    pub const CHEEKS_COLOR: &str = "#FF69B4";

    /// Default cheek intensity
    pub const CHEEKS_INTENSITY: u8 = 35;
}

/// Intensity slider bounds
pub mod intensity {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 100;
}

/// Render service endpoint and request constants
pub mod render {
    use super::Duration;

    /// Base URL of the render service when none is configured
    pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8000/api";

    /// Path of the try-on endpoint, relative to the service base URL
    pub const TRY_MAKEUP_PATH: &str = "virtual-makeup/try-makeup";

    /// Upper bound on a single render request
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// File name of the multipart image part
    pub const IMAGE_PART_NAME: &str = "image.jpg";

    /// MIME type used for both the uploaded and the returned image
    pub const IMAGE_MIME: &str = "image/jpeg";
}

/// Cart collaborator constants
pub mod cart {
    /// Base URL of the storefront API when none is configured
    pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8000/api";

    /// Path of the add-to-cart endpoint, relative to the base URL
    pub const ADD_PATH: &str = "cart/items";

    /// Quantity forwarded by the try-on handoff
    pub const HANDOFF_QUANTITY: u32 = 1;

    /// Catalog ids are 24 hex digits
    pub const PRODUCT_ID_LEN: usize = 24;
}

/// Transient notification timing
pub mod notifications {
    use super::Duration;

    /// How long a cart notification stays visible
    pub const TTL: Duration = Duration::from_secs(3);
}

/// Camera request constraints
pub mod camera {
    /// Ideal capture width requested from the device
    pub const IDEAL_WIDTH: u32 = 1280;

    /// Ideal capture height requested from the device
    pub const IDEAL_HEIGHT: u32 = 720;
}

/// Supported file formats
pub mod file_formats {
    /// Image file extensions accepted for upload and file-backed cameras
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

    /// Check if a file extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}

/// Application information utilities
pub mod app_info {
    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }

    /// User agent sent to the render and cart services
    pub fn user_agent() -> String {
        format!("tryon/{}", version())
    }
}
