//! Platform detection used to pick a download strategy.
//!
//! Classification is a pure function of [`PlatformSignals`], so tests can
//! describe a device as a plain value instead of faking a browser.

use crate::constants;
use regex::Regex;
use std::sync::LazyLock;

static MOBILE_UA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Android|webOS|iPhone|iPad|iPod|BlackBerry|IEMobile|Opera Mini")
        .expect("valid mobile user-agent pattern")
});

static IOS_UA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"iPad|iPhone|iPod").expect("valid iOS user-agent pattern"));

/// Raw environment signals the classification is computed from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlatformSignals {
    /// `navigator.userAgent`, or empty if unavailable
    pub user_agent: String,
    /// Whether touch input is available
    pub has_touch: bool,
    /// Viewport width in CSS pixels, if known
    pub viewport_width: Option<f64>,
    /// Whether `window.MSStream` exists (old Windows Phone builds spoofed iOS)
    pub has_ms_stream: bool,
}

/// How the current device should be treated when saving files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlatformProfile {
    /// Phone or tablet-like device
    pub is_mobile: bool,
    /// Safari on iOS / iPadOS
    pub is_ios_safari: bool,
}

impl PlatformProfile {
    /// Plain desktop classification.
    pub const DESKTOP: PlatformProfile = PlatformProfile {
        is_mobile: false,
        is_ios_safari: false,
    };

    /// Classifies a device from its signals.
    pub fn classify(signals: &PlatformSignals) -> Self {
        let ua = signals.user_agent.as_str();

        let small_screen = signals
            .viewport_width
            .is_some_and(|w| w <= constants::MOBILE_BREAKPOINT_PX);
        let is_mobile = MOBILE_UA.is_match(ua) || (signals.has_touch && small_screen);

        let is_ios = IOS_UA.is_match(ua) && !signals.has_ms_stream;
        // iPadOS 13+ reports a desktop Safari UA; touch support gives it away
        let is_desktop_class_ipad =
            ua.contains("Macintosh") && is_plain_safari(ua) && signals.has_touch;

        Self {
            is_mobile,
            is_ios_safari: is_ios || is_desktop_class_ipad,
        }
    }

    /// Whether downloads should use the delayed mobile strategy.
    pub fn needs_mobile_download(&self) -> bool {
        self.is_mobile || self.is_ios_safari
    }
}

/// Safari UA that is not Chrome or an Android browser.
fn is_plain_safari(ua: &str) -> bool {
    let lower = ua.to_ascii_lowercase();
    lower.contains("safari") && !lower.contains("chrome") && !lower.contains("android")
}

/// Classifies the current runtime. Native builds are always desktop.
pub fn detect() -> PlatformProfile {
    let profile = PlatformProfile::classify(&current_signals());
    log::debug!("Detected platform: {profile:?}");
    profile
}

/// Captures signals from the browser environment.
#[cfg(target_arch = "wasm32")]
pub fn current_signals() -> PlatformSignals {
    let Some(window) = web_sys::window() else {
        return PlatformSignals::default();
    };
    let navigator = window.navigator();
    let user_agent = navigator.user_agent().unwrap_or_default();
    let has_touch = js_sys::Reflect::has(&window, &"ontouchstart".into()).unwrap_or(false)
        || navigator.max_touch_points() > 0;
    let viewport_width = window.inner_width().ok().and_then(|w| w.as_f64());
    let has_ms_stream = js_sys::Reflect::get(&window, &"MSStream".into())
        .map(|v| !v.is_undefined() && !v.is_null())
        .unwrap_or(false);

    PlatformSignals {
        user_agent,
        has_touch,
        viewport_width,
        has_ms_stream,
    }
}

/// Captures signals from the browser environment.
#[cfg(not(target_arch = "wasm32"))]
pub fn current_signals() -> PlatformSignals {
    PlatformSignals::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
    const ANDROID: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Mobile Safari/537.36";
    const DESKTOP_CHROME: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";
    const DESKTOP_SAFARI: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_0) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15";

    fn signals(ua: &str, touch: bool, width: f64) -> PlatformSignals {
        PlatformSignals {
            user_agent: ua.to_string(),
            has_touch: touch,
            viewport_width: Some(width),
            has_ms_stream: false,
        }
    }

    #[test]
    fn iphone_is_mobile_ios_safari() {
        let p = PlatformProfile::classify(&signals(IPHONE, true, 390.0));
        assert!(p.is_mobile);
        assert!(p.is_ios_safari);
        assert!(p.needs_mobile_download());
    }

    #[test]
    fn android_is_mobile_but_not_ios() {
        let p = PlatformProfile::classify(&signals(ANDROID, true, 412.0));
        assert!(p.is_mobile);
        assert!(!p.is_ios_safari);
    }

    #[test]
    fn desktop_browsers_are_desktop() {
        assert_eq!(
            PlatformProfile::classify(&signals(DESKTOP_CHROME, false, 1920.0)),
            PlatformProfile::DESKTOP
        );
        assert_eq!(
            PlatformProfile::classify(&signals(DESKTOP_SAFARI, false, 1440.0)),
            PlatformProfile::DESKTOP
        );
    }

    #[test]
    fn small_touch_screen_counts_as_mobile() {
        let p = PlatformProfile::classify(&signals(DESKTOP_CHROME, true, 768.0));
        assert!(p.is_mobile);
        let p = PlatformProfile::classify(&signals(DESKTOP_CHROME, true, 769.0));
        assert!(!p.is_mobile);
    }

    #[test]
    fn ms_stream_marker_excludes_spoofed_ios() {
        let mut s = signals(IPHONE, false, 1024.0);
        s.has_ms_stream = true;
        let p = PlatformProfile::classify(&s);
        assert!(!p.is_ios_safari);
        // Still mobile by user agent
        assert!(p.is_mobile);
    }

    #[test]
    fn desktop_class_ipad_is_ios_safari() {
        let p = PlatformProfile::classify(&signals(DESKTOP_SAFARI, true, 1024.0));
        assert!(p.is_ios_safari);
        assert!(!p.is_mobile);
    }

    #[test]
    fn missing_signals_default_to_desktop() {
        assert_eq!(
            PlatformProfile::classify(&PlatformSignals::default()),
            PlatformProfile::DESKTOP
        );
    }
}
