pub const APP_NAME: &str = "oc-forge";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-3-pro-image-preview";
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_IMAGE_MIME: &str = "image/png";
pub const OUTPUT_DIR_NAME: &str = "output";
pub const API_KEY_FILE: &str = "api_key";
pub const LOG_FILE_NAME: &str = "log.json";
pub const MAX_LOG_ENTRIES: usize = 50;

pub const ENV_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_API_KEY_FALLBACK: &str = "API_KEY";
pub const ENV_MODEL: &str = "OC_FORGE_MODEL";
pub const ENV_ENDPOINT: &str = "OC_FORGE_ENDPOINT";
pub const ENV_HOME: &str = "OC_FORGE_HOME";

pub const NO_IMAGE_MESSAGE: &str =
    "The model returned text but no image. Try adjusting your prompt.";
pub const KEY_EXPIRED_MESSAGE: &str =
    "API Key session expired or invalid. Please select a key again.";
pub const KEY_DIALOG_FAILED_MESSAGE: &str = "Failed to open key selection dialog.";
pub const GENERIC_GENERATION_FAILURE: &str = "An unexpected error occurred during generation.";
