pub const DEFAULT_BASE_URL: &str = "https://prod-api.hingeaws.net";
pub const DEFAULT_MEDIA_URL: &str = "https://media.hingenexus.com";

pub(crate) const RECS_PATH: &str = "/rec/v2";
pub(crate) const PUBLIC_USERS_PATH: &str = "/user/v2/public";
pub(crate) const RATE_PATH: &str = "/rate/v2/initiate";
pub(crate) const MESSAGE_PATH: &str = "/message/send";
pub(crate) const INSTALL_PATH: &str = "/identity/install";
pub(crate) const SMS_SEND_PATH: &str = "/auth/sms/send";
pub(crate) const SMS_VERIFY_PATH: &str = "/auth/sms/verify";
pub(crate) const AUTH_REFRESH_PATH: &str = "/auth/refresh";

pub(crate) const MEDIA_UPLOAD_PREFIX: &str = "image/upload";
pub(crate) const DEFAULT_IMAGE_EXT: &str = ".jpg";

pub(crate) const DEFAULT_APP_VERSION: &str = "9.68.0";
pub(crate) const DEFAULT_OS_VERSION: &str = "14";
pub(crate) const DEFAULT_OS_VERSION_CODE: &str = "34";
pub(crate) const DEFAULT_DEVICE_MODEL: &str = "Pixel 6a";
pub(crate) const DEFAULT_DEVICE_MANUFACTURER: &str = "Google";
pub(crate) const DEFAULT_BUILD_NUMBER: &str = "168200482";
pub(crate) const DEFAULT_USER_AGENT: &str = "okhttp/4.12.0";
pub(crate) const DEFAULT_DEVICE_ID: &str = "b4b578b8250e8ca8";
pub(crate) const DEFAULT_INSTALL_ID: &str = "735de715-0876-45c5-be1e-aecdf8cb42d1";
