use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static MACOS_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Mac OS X (\d+)[_.](\d+)").unwrap());

/// Best-effort classification of a User-Agent string.
///
/// Display-only metadata; malformed or spoofed user agents degrade to
/// `"Unknown"` values rather than failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    /// The browser family, e.g. "Chrome".
    pub browser: String,
    /// The operating system, e.g. "Windows 10/11".
    pub os: String,
    /// The device class: "Desktop", "Mobile" or "Tablet".
    pub device: String,
    /// A human-readable one-line summary.
    pub summary: String,
}

impl DeviceInfo {
    /// Parses an optional User-Agent header into a `DeviceInfo`.
    ///
    /// Pure function; ordered substring checks (Edge must win over Chrome,
    /// Chrome over Safari, Android over Linux).
    pub fn parse(user_agent: Option<&str>) -> Self {
        let ua = match user_agent {
            Some(ua) if !ua.trim().is_empty() => ua,
            _ => return Self::unknown(),
        };

        let browser = detect_browser(ua);
        let os = detect_os(ua);
        let device = detect_device(ua);

        let summary = match (browser.as_str(), os.as_str()) {
            ("Unknown", "Unknown") => "Unknown Device".to_string(),
            ("Unknown", os) => os.to_string(),
            (browser, "Unknown") => browser.to_string(),
            (browser, os) => format!("{} on {}", browser, os),
        };

        Self {
            browser,
            os,
            device,
            summary,
        }
    }

    fn unknown() -> Self {
        Self {
            browser: "Unknown".to_string(),
            os: "Unknown".to_string(),
            device: "Unknown".to_string(),
            summary: "Unknown Device".to_string(),
        }
    }
}

fn detect_browser(ua: &str) -> String {
    // Edge UAs also contain "Chrome"; Chrome UAs also contain "Safari".
    if ua.contains("Edg/") || ua.contains("Edge/") {
        "Edge".to_string()
    } else if ua.contains("Chrome/") || ua.contains("CriOS/") {
        "Chrome".to_string()
    } else if ua.contains("Firefox/") || ua.contains("FxiOS/") {
        "Firefox".to_string()
    } else if ua.contains("Safari/") {
        "Safari".to_string()
    } else {
        "Unknown".to_string()
    }
}

fn detect_os(ua: &str) -> String {
    if ua.contains("Windows NT 10.0") {
        "Windows 10/11".to_string()
    } else if ua.contains("Windows") {
        "Windows".to_string()
    } else if ua.contains("iPhone") || ua.contains("iPad") {
        "iOS".to_string()
    } else if let Some(caps) = MACOS_VERSION.captures(ua) {
        format!("macOS {}.{}", &caps[1], &caps[2])
    } else if ua.contains("Mac OS X") || ua.contains("Macintosh") {
        "macOS".to_string()
    } else if ua.contains("Android") {
        "Android".to_string()
    } else if ua.contains("Linux") {
        "Linux".to_string()
    } else {
        "Unknown".to_string()
    }
}

fn detect_device(ua: &str) -> String {
    if ua.contains("iPad") || ua.contains("Tablet") {
        "Tablet".to_string()
    } else if ua.contains("Mobile") || ua.contains("iPhone") || ua.contains("Android") {
        "Mobile".to_string()
    } else {
        "Desktop".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_WIN: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
        (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";
    const EDGE_WIN: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
        (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36 Edg/126.0.0.0";
    const SAFARI_MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
        AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15";
    const FIREFOX_LINUX: &str =
        "Mozilla/5.0 (X11; Linux x86_64; rv:127.0) Gecko/20100101 Firefox/127.0";
    const CHROME_ANDROID: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 \
        (KHTML, like Gecko) Chrome/126.0.0.0 Mobile Safari/537.36";
    const SAFARI_IPAD: &str = "Mozilla/5.0 (iPad; CPU OS 17_4 like Mac OS X) \
        AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1";

    #[test]
    fn chrome_on_windows_desktop() {
        let info = DeviceInfo::parse(Some(CHROME_WIN));
        assert_eq!(info.browser, "Chrome");
        assert_eq!(info.os, "Windows 10/11");
        assert_eq!(info.device, "Desktop");
        assert_eq!(info.summary, "Chrome on Windows 10/11");
    }

    #[test]
    fn edge_wins_over_chrome() {
        let info = DeviceInfo::parse(Some(EDGE_WIN));
        assert_eq!(info.browser, "Edge");
    }

    #[test]
    fn safari_with_macos_version() {
        let info = DeviceInfo::parse(Some(SAFARI_MAC));
        assert_eq!(info.browser, "Safari");
        assert_eq!(info.os, "macOS 10.15");
        assert_eq!(info.device, "Desktop");
    }

    #[test]
    fn firefox_on_linux() {
        let info = DeviceInfo::parse(Some(FIREFOX_LINUX));
        assert_eq!(info.browser, "Firefox");
        assert_eq!(info.os, "Linux");
    }

    #[test]
    fn android_wins_over_linux_and_is_mobile() {
        let info = DeviceInfo::parse(Some(CHROME_ANDROID));
        assert_eq!(info.os, "Android");
        assert_eq!(info.device, "Mobile");
    }

    #[test]
    fn ipad_is_ios_tablet() {
        let info = DeviceInfo::parse(Some(SAFARI_IPAD));
        assert_eq!(info.os, "iOS");
        assert_eq!(info.device, "Tablet");
    }

    #[test]
    fn missing_or_empty_input_degrades_to_unknown() {
        for ua in [None, Some(""), Some("   ")] {
            let info = DeviceInfo::parse(ua);
            assert_eq!(info.browser, "Unknown");
            assert_eq!(info.os, "Unknown");
            assert_eq!(info.device, "Unknown");
            assert_eq!(info.summary, "Unknown Device");
        }
    }

    #[test]
    fn garbage_input_does_not_panic() {
        let info = DeviceInfo::parse(Some("curl/8.5.0"));
        assert_eq!(info.browser, "Unknown");
        assert_eq!(info.device, "Desktop");
    }
}
