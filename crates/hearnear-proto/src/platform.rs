use std::path::PathBuf;

/// Default TCP port for the capture intake socket (notifier -> daemon).
pub const CAPTURE_TCP_PORT: u16 = 9907;

/// Default TCP port for the local HTTP control API.
pub const CONTROL_HTTP_PORT: u16 = 9908;

const CAPTURE_TCP_HOST: &str = "127.0.0.1";

pub fn capture_address() -> String {
    format!("{}:{}", CAPTURE_TCP_HOST, CAPTURE_TCP_PORT)
}

pub fn data_dir() -> PathBuf {
    // Use ~/.local/share/hearnear/ (XDG standard) on unix for consistency
    // across macOS and Linux.
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".local")
            .join("share")
            .join("hearnear")
    }
    #[cfg(windows)]
    {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hearnear")
    }
}

pub fn config_dir() -> PathBuf {
    // Always ~/.config/hearnear/ on unix (avoid macOS Application Support
    // for consistency).
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("hearnear")
    }
    #[cfg(windows)]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hearnear")
    }
}
