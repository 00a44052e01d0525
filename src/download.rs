//! File download dispatcher.
//!
//! Hands an [`ExportArtifact`] to the user's device. In the browser this goes
//! through a transient anchor pointing at an object URL, with timing tuned per
//! platform and a new-tab fallback page when the anchor path fails. Native builds
//! save through a file dialog instead.
//!
//! The browser flow is modelled as an explicit state machine:
//!
//! ```text
//! Idle -> Attempting -> Succeeded
//!                    -> FallbackAttempting -> FallbackSucceeded
//!                                          -> FallbackFailed
//! ```
//!
//! Every object URL created during a run is revoked exactly once before the run ends.

use crate::composer::escape_xml;
use crate::constants;
use crate::error::DownloadError;
use crate::platform::PlatformProfile;
use crate::types::ExportArtifact;
use base64::Engine;

/// States of a single download run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadState {
    /// Nothing attempted yet
    Idle,
    /// The anchor download is in progress
    Attempting,
    /// The anchor download was triggered
    Succeeded,
    /// The anchor path failed; opening the manual-save page
    FallbackAttempting,
    /// The manual-save page was opened
    FallbackSucceeded,
    /// No page could be opened; the user was told how to save manually
    FallbackFailed,
}

impl DownloadState {
    /// Whether the run has ended in this state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::FallbackSucceeded | Self::FallbackFailed)
    }

    fn can_advance_to(self, next: DownloadState) -> bool {
        use DownloadState::*;
        matches!(
            (self, next),
            (Idle, Attempting)
                | (Attempting, Succeeded)
                | (Attempting, FallbackAttempting)
                | (FallbackAttempting, FallbackSucceeded)
                | (FallbackAttempting, FallbackFailed)
        )
    }
}

/// Timing strategy for the anchor download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStrategy {
    /// Click, detach and revoke promptly
    Desktop,
    /// Keep the anchor mounted for a while and revoke late, for slower mobile event loops
    MobileDelayed,
}

impl DownloadStrategy {
    /// Picks the strategy for `profile`.
    pub fn for_profile(profile: PlatformProfile) -> Self {
        if profile.needs_mobile_download() {
            Self::MobileDelayed
        } else {
            Self::Desktop
        }
    }

    /// How long the anchor stays attached after the click.
    pub fn anchor_linger_ms(self) -> u32 {
        match self {
            Self::Desktop => 0,
            Self::MobileDelayed => constants::MOBILE_ANCHOR_LINGER_MS,
        }
    }

    /// Grace period between detaching the anchor and revoking the object URL.
    pub fn revoke_delay_ms(self) -> u32 {
        match self {
            Self::Desktop => constants::DESKTOP_REVOKE_DELAY_MS,
            Self::MobileDelayed => constants::MOBILE_REVOKE_DELAY_MS,
        }
    }
}

/// Record of one dispatcher run.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadReport {
    /// Strategy chosen for the platform
    pub strategy: DownloadStrategy,
    /// Every state visited, starting with `Idle`
    pub transitions: Vec<DownloadState>,
    /// Error from the primary path, if it failed
    pub primary_error: Option<DownloadError>,
}

impl DownloadReport {
    fn new(strategy: DownloadStrategy) -> Self {
        Self {
            strategy,
            transitions: vec![DownloadState::Idle],
            primary_error: None,
        }
    }

    /// The state the run ended in.
    pub fn final_state(&self) -> DownloadState {
        self.transitions.last().copied().unwrap_or(DownloadState::Idle)
    }

    fn advance(&mut self, next: DownloadState) {
        let current = self.final_state();
        debug_assert!(current.can_advance_to(next), "invalid transition {current:?} -> {next:?}");
        log::debug!("Download state {current:?} -> {next:?}");
        self.transitions.push(next);
    }

    /// `Ok` unless both the primary and the fallback path failed.
    pub fn into_result(self) -> Result<DownloadReport, DownloadError> {
        match self.final_state() {
            DownloadState::FallbackFailed => Err(DownloadError::PopupBlocked),
            _ => Ok(self),
        }
    }
}

/// Browser operations the dispatcher needs.
///
/// [`WebHost`] implements this against the DOM on wasm; tests use a recording double.
#[allow(async_fn_in_trait)]
pub trait BrowserHost {
    /// Handle to an anchor element mounted in the document.
    type Anchor;

    /// Wraps `payload` in a blob and returns an object URL for it.
    fn create_object_url(&self, payload: &[u8], mime: &str) -> Result<String, DownloadError>;
    /// Releases an object URL.
    fn revoke_object_url(&self, url: &str);
    /// Mounts a hidden same-tab anchor with a `download` attribute and clicks it.
    fn click_anchor(&self, url: &str, filename: &str) -> Result<Self::Anchor, DownloadError>;
    /// Detaches a previously mounted anchor.
    fn remove_anchor(&self, anchor: Self::Anchor);
    /// Waits for `ms` milliseconds without blocking the event loop.
    async fn sleep(&self, ms: u32);
    /// Opens a new tab showing `html`. Returns `false` when pop-ups are blocked.
    fn open_page(&self, title: &str, html: &str) -> bool;
    /// Shows a blocking message to the user.
    fn alert(&self, message: &str);
}

/// Runs the download state machine against a [`BrowserHost`].
#[derive(Debug)]
pub struct Dispatcher<H> {
    host: H,
}

impl<H: BrowserHost> Dispatcher<H> {
    /// Creates a dispatcher over `host`.
    pub fn new(host: H) -> Self {
        Self { host }
    }

    /// The underlying host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Downloads `artifact`, failing only when both the anchor path and the fallback page fail.
    pub async fn download(
        &self,
        artifact: &ExportArtifact,
        profile: PlatformProfile,
    ) -> Result<DownloadReport, DownloadError> {
        self.run(artifact, profile).await.into_result()
    }

    /// Runs the state machine to a terminal state and reports how it got there.
    pub async fn run(&self, artifact: &ExportArtifact, profile: PlatformProfile) -> DownloadReport {
        let strategy = DownloadStrategy::for_profile(profile);
        let mut report = DownloadReport::new(strategy);
        report.advance(DownloadState::Attempting);

        let object_url = self.host.create_object_url(&artifact.payload, &artifact.mime);
        let primary = match &object_url {
            Ok(url) => self.attempt(strategy, url, &artifact.filename).await,
            Err(e) => Err(e.clone()),
        };

        match primary {
            Ok(()) => report.advance(DownloadState::Succeeded),
            Err(e) => {
                log::error!("Download of {} failed, trying fallback: {e}", artifact.filename);
                report.primary_error = Some(e);
                report.advance(DownloadState::FallbackAttempting);

                let data_url = artifact
                    .fallback_data_url
                    .clone()
                    .unwrap_or_else(|| encode_data_url(&artifact.payload, &artifact.mime));
                let html = fallback_page_html(&data_url, &artifact.filename, artifact.is_image());
                if self.host.open_page(&artifact.filename, &html) {
                    report.advance(DownloadState::FallbackSucceeded);
                } else {
                    let instruction = DownloadError::PopupBlocked.to_string();
                    log::error!("Fallback page blocked: {instruction}");
                    self.host.alert(&instruction);
                    report.advance(DownloadState::FallbackFailed);
                }
            }
        }

        if let Ok(url) = object_url {
            self.host.sleep(strategy.revoke_delay_ms()).await;
            self.host.revoke_object_url(&url);
        }

        report
    }

    async fn attempt(&self, strategy: DownloadStrategy, url: &str, filename: &str) -> Result<(), DownloadError> {
        let anchor = self.host.click_anchor(url, filename)?;
        let linger = strategy.anchor_linger_ms();
        if linger > 0 {
            self.host.sleep(linger).await;
        }
        self.host.remove_anchor(anchor);
        Ok(())
    }
}

/// Encodes `payload` as a base64 data URL of type `mime`.
pub fn encode_data_url(payload: &[u8], mime: &str) -> String {
    let mime = mime.split(';').next().unwrap_or(mime);
    format!(
        "data:{mime};base64,{}",
        base64::engine::general_purpose::STANDARD.encode(payload)
    )
}

/// Builds the manual-save page shown when the anchor download fails.
pub fn fallback_page_html(data_url: &str, filename: &str, is_image: bool) -> String {
    let name = escape_xml(filename);
    let href = escape_xml(data_url);
    let preview = if is_image {
        format!("<p>Long-press the image below to save it to your device.</p>\n<img src=\"{href}\" alt=\"{name}\" />")
    } else {
        String::new()
    };
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <title>{name}</title>
    <style>
      body {{ margin: 0; padding: 20px; background: #f0f0f0; font-family: sans-serif; }}
      .container {{ max-width: 800px; margin: 0 auto; background: white; padding: 20px; border-radius: 8px; }}
      img {{ max-width: 100%; height: auto; display: block; margin: 20px 0; }}
      .download-btn {{ display: inline-block; padding: 12px 24px; background: #3b82f6; color: white; text-decoration: none; border-radius: 6px; }}
      .info {{ color: #666; font-size: 14px; margin-top: 20px; }}
    </style>
  </head>
  <body>
    <div class="container">
      <h2>Your Logo: {name}</h2>
      {preview}
      <a href="{href}" download="{name}" class="download-btn">Download {name}</a>
      <p class="info">If download doesn't work, long-press the image above and select "Save Image" or "Add to Photos".</p>
    </div>
  </body>
</html>"#
    )
}

/// [`BrowserHost`] backed by the real DOM.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default)]
pub struct WebHost;

#[cfg(target_arch = "wasm32")]
impl WebHost {
    fn document() -> Result<web_sys::Document, DownloadError> {
        web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| DownloadError::Primary("No document found".into()))
    }
}

#[cfg(target_arch = "wasm32")]
impl BrowserHost for WebHost {
    type Anchor = web_sys::HtmlAnchorElement;

    fn create_object_url(&self, payload: &[u8], mime: &str) -> Result<String, DownloadError> {
        let bytes = js_sys::Uint8Array::from(payload);
        let parts = js_sys::Array::of1(&bytes);
        let options = web_sys::BlobPropertyBag::new();
        options.set_type(mime);
        let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &options)
            .map_err(|_| DownloadError::Primary("Failed to create blob".into()))?;
        web_sys::Url::create_object_url_with_blob(&blob)
            .map_err(|_| DownloadError::Primary("Failed to create object URL".into()))
    }

    fn revoke_object_url(&self, url: &str) {
        if web_sys::Url::revoke_object_url(url).is_err() {
            log::warn!("Failed to revoke object URL {url}");
        }
    }

    fn click_anchor(&self, url: &str, filename: &str) -> Result<Self::Anchor, DownloadError> {
        use wasm_bindgen::JsCast;

        let document = Self::document()?;
        let anchor = document
            .create_element("a")
            .map_err(|_| DownloadError::Primary("Failed to create anchor element".into()))?
            .dyn_into::<web_sys::HtmlAnchorElement>()
            .map_err(|_| DownloadError::Primary("Failed to cast to anchor element".into()))?;

        anchor.set_href(url);
        anchor.set_download(filename);
        anchor.style().set_property("display", "none").ok();

        document
            .body()
            .ok_or_else(|| DownloadError::Primary("No body found".into()))?
            .append_child(&anchor)
            .map_err(|_| DownloadError::Primary("Failed to append anchor".into()))?;

        anchor.click();
        Ok(anchor)
    }

    fn remove_anchor(&self, anchor: Self::Anchor) {
        anchor.remove();
    }

    async fn sleep(&self, ms: u32) {
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            let scheduled = web_sys::window().is_some_and(|window| {
                let timeout = i32::try_from(ms).unwrap_or(i32::MAX);
                window
                    .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, timeout)
                    .is_ok()
            });
            // Without a timer there is nothing to wait for
            if !scheduled {
                let _ = resolve.call0(&wasm_bindgen::JsValue::NULL);
            }
        });
        let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
    }

    fn open_page(&self, title: &str, html: &str) -> bool {
        let Some(window) = web_sys::window() else {
            return false;
        };
        let Ok(Some(tab)) = window.open() else {
            return false;
        };
        let Some(document) = tab.document() else {
            return false;
        };
        document.set_title(title);
        match document.document_element() {
            Some(root) => {
                root.set_inner_html(html);
                true
            }
            None => false,
        }
    }

    fn alert(&self, message: &str) {
        if let Some(window) = web_sys::window() {
            let _ = window.alert_with_message(message);
        }
    }
}

/// Final destination of an exported artifact.
#[allow(async_fn_in_trait)]
pub trait ArtifactSink {
    /// Hands `artifact` to the user, reporting how the delivery went.
    async fn deliver(&self, artifact: &ExportArtifact) -> Result<DownloadReport, DownloadError>;
}

/// [`ArtifactSink`] that runs the [`Dispatcher`] state machine.
///
/// Without a fixed profile the platform is detected again for every delivery.
#[derive(Debug)]
pub struct BrowserSink<H> {
    dispatcher: Dispatcher<H>,
    profile: Option<PlatformProfile>,
}

impl<H: BrowserHost> BrowserSink<H> {
    /// Creates a sink that classifies the platform on each delivery.
    pub fn new(host: H) -> Self {
        Self {
            dispatcher: Dispatcher::new(host),
            profile: None,
        }
    }

    /// Creates a sink pinned to `profile`.
    pub fn with_profile(host: H, profile: PlatformProfile) -> Self {
        Self {
            dispatcher: Dispatcher::new(host),
            profile: Some(profile),
        }
    }

    /// The underlying dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher<H> {
        &self.dispatcher
    }
}

impl<H: BrowserHost> ArtifactSink for BrowserSink<H> {
    async fn deliver(&self, artifact: &ExportArtifact) -> Result<DownloadReport, DownloadError> {
        let profile = self.profile.unwrap_or_else(crate::platform::detect);
        self.dispatcher.download(artifact, profile).await
    }
}

/// [`ArtifactSink`] that saves through a native file dialog.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct FileDialogSink;

#[cfg(not(target_arch = "wasm32"))]
impl ArtifactSink for FileDialogSink {
    async fn deliver(&self, artifact: &ExportArtifact) -> Result<DownloadReport, DownloadError> {
        let extension = artifact
            .filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_string())
            .unwrap_or_default();

        let mut report = DownloadReport::new(DownloadStrategy::Desktop);
        report.advance(DownloadState::Attempting);

        let handle = rfd::AsyncFileDialog::new()
            .add_filter(extension.to_uppercase(), &[extension.as_str()])
            .set_file_name(artifact.filename.as_str())
            .save_file()
            .await
            .ok_or(DownloadError::Cancelled)?;

        let path = handle.path().to_path_buf();
        std::fs::write(&path, &artifact.payload).map_err(|e| DownloadError::Io(e.to_string()))?;
        log::info!("Saved {} ({} bytes)", path.display(), artifact.payload.len());

        report.advance(DownloadState::Succeeded);
        Ok(report)
    }
}

/// The sink exports are delivered to on this platform.
#[cfg(target_arch = "wasm32")]
pub fn platform_sink() -> BrowserSink<WebHost> {
    BrowserSink::new(WebHost)
}

/// The sink exports are delivered to on this platform.
#[cfg(not(target_arch = "wasm32"))]
pub fn platform_sink() -> FileDialogSink {
    FileDialogSink
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PlatformSignals;
    use futures::executor::block_on;
    use std::cell::RefCell;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Create,
        Click,
        Remove,
        Sleep(u32),
        Revoke(String),
        OpenPage(String),
        Alert(String),
    }

    #[derive(Default)]
    struct RecordingHost {
        calls: RefCell<Vec<Call>>,
        fail_create: bool,
        fail_click: bool,
        block_popups: bool,
    }

    impl RecordingHost {
        fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }

        fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
            self.calls.borrow().iter().filter(|c| pred(c)).count()
        }
    }

    impl BrowserHost for RecordingHost {
        type Anchor = ();

        fn create_object_url(&self, _payload: &[u8], _mime: &str) -> Result<String, DownloadError> {
            self.calls.borrow_mut().push(Call::Create);
            if self.fail_create {
                Err(DownloadError::Primary("blob refused".into()))
            } else {
                Ok("blob:test/1".into())
            }
        }

        fn revoke_object_url(&self, url: &str) {
            self.calls.borrow_mut().push(Call::Revoke(url.to_string()));
        }

        fn click_anchor(&self, _url: &str, _filename: &str) -> Result<(), DownloadError> {
            self.calls.borrow_mut().push(Call::Click);
            if self.fail_click {
                Err(DownloadError::Primary("security error".into()))
            } else {
                Ok(())
            }
        }

        fn remove_anchor(&self, _anchor: ()) {
            self.calls.borrow_mut().push(Call::Remove);
        }

        async fn sleep(&self, ms: u32) {
            self.calls.borrow_mut().push(Call::Sleep(ms));
        }

        fn open_page(&self, _title: &str, html: &str) -> bool {
            self.calls.borrow_mut().push(Call::OpenPage(html.to_string()));
            !self.block_popups
        }

        fn alert(&self, message: &str) {
            self.calls.borrow_mut().push(Call::Alert(message.to_string()));
        }
    }

    fn artifact() -> ExportArtifact {
        ExportArtifact {
            payload: b"<svg/>".to_vec(),
            mime: "image/svg+xml;charset=utf-8".into(),
            filename: "acme.svg".into(),
            fallback_data_url: None,
        }
    }

    const IPHONE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
    const ANDROID_UA: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Mobile Safari/537.36";

    const MOBILE: PlatformProfile = PlatformProfile {
        is_mobile: true,
        is_ios_safari: false,
    };

    fn assert_single_create_and_revoke(host: &RecordingHost) {
        assert_eq!(host.count(|c| *c == Call::Create), 1);
        assert_eq!(host.count(|c| matches!(c, Call::Revoke(_))), 1);
        assert_eq!(host.calls().last(), Some(&Call::Revoke("blob:test/1".into())));
    }

    #[test]
    fn desktop_revokes_promptly() {
        let dispatcher = Dispatcher::new(RecordingHost::default());
        let report = block_on(dispatcher.download(&artifact(), PlatformProfile::DESKTOP)).unwrap();

        assert_eq!(report.strategy, DownloadStrategy::Desktop);
        assert_eq!(
            report.transitions,
            vec![DownloadState::Idle, DownloadState::Attempting, DownloadState::Succeeded]
        );
        assert_eq!(
            dispatcher.host().calls(),
            vec![
                Call::Create,
                Call::Click,
                Call::Remove,
                Call::Sleep(100),
                Call::Revoke("blob:test/1".into())
            ]
        );
    }

    #[test]
    fn mobile_keeps_anchor_mounted_and_revokes_late() {
        let dispatcher = Dispatcher::new(RecordingHost::default());
        let report = block_on(dispatcher.download(&artifact(), MOBILE)).unwrap();

        assert_eq!(report.strategy, DownloadStrategy::MobileDelayed);
        assert_eq!(
            dispatcher.host().calls(),
            vec![
                Call::Create,
                Call::Click,
                Call::Sleep(500),
                Call::Remove,
                Call::Sleep(1000),
                Call::Revoke("blob:test/1".into())
            ]
        );
    }

    #[test]
    fn mobile_user_agents_download_through_the_delayed_anchor() {
        for ua in [IPHONE_UA, ANDROID_UA] {
            let profile = PlatformProfile::classify(&PlatformSignals {
                user_agent: ua.to_string(),
                has_touch: true,
                viewport_width: Some(390.0),
                has_ms_stream: false,
            });
            let dispatcher = Dispatcher::new(RecordingHost::default());
            let report = block_on(dispatcher.download(&artifact(), profile)).unwrap();

            assert_eq!(report.strategy, DownloadStrategy::MobileDelayed, "{ua}");
            assert_eq!(report.final_state(), DownloadState::Succeeded);
            let calls = dispatcher.host().calls();
            let click = calls.iter().position(|c| *c == Call::Click).unwrap();
            let linger = calls.iter().position(|c| *c == Call::Sleep(500)).unwrap();
            let remove = calls.iter().position(|c| *c == Call::Remove).unwrap();
            assert!(click < linger && linger < remove, "{calls:?}");
            assert_single_create_and_revoke(dispatcher.host());
        }
    }

    #[test]
    fn ios_safari_uses_mobile_strategy() {
        let profile = PlatformProfile {
            is_mobile: false,
            is_ios_safari: true,
        };
        assert_eq!(DownloadStrategy::for_profile(profile), DownloadStrategy::MobileDelayed);
    }

    #[test]
    fn failed_click_opens_fallback_page_and_still_revokes() {
        let host = RecordingHost {
            fail_click: true,
            ..RecordingHost::default()
        };
        let dispatcher = Dispatcher::new(host);
        let report = block_on(dispatcher.download(&artifact(), MOBILE)).unwrap();

        assert_eq!(report.final_state(), DownloadState::FallbackSucceeded);
        assert!(report.primary_error.is_some());
        let host = dispatcher.host();
        assert_single_create_and_revoke(host);
        let page = host
            .calls()
            .into_iter()
            .find_map(|c| match c {
                Call::OpenPage(html) => Some(html),
                _ => None,
            })
            .unwrap();
        assert!(page.contains("data:image/svg+xml;base64,"));
        assert!(page.contains("<img src="));
        assert!(page.contains("download=\"acme.svg\""));
    }

    #[test]
    fn blocked_popups_alert_and_fail() {
        let host = RecordingHost {
            fail_click: true,
            block_popups: true,
            ..RecordingHost::default()
        };
        let dispatcher = Dispatcher::new(host);
        let report = block_on(dispatcher.run(&artifact(), PlatformProfile::DESKTOP));
        assert_eq!(
            report.transitions,
            vec![
                DownloadState::Idle,
                DownloadState::Attempting,
                DownloadState::FallbackAttempting,
                DownloadState::FallbackFailed
            ]
        );
        assert_eq!(report.clone().into_result(), Err(DownloadError::PopupBlocked));

        let host = dispatcher.host();
        assert_single_create_and_revoke(host);
        assert_eq!(host.count(|c| matches!(c, Call::Alert(m) if m.contains("allow pop-ups"))), 1);
    }

    #[test]
    fn blob_failure_skips_revoke_and_uses_fallback() {
        let host = RecordingHost {
            fail_create: true,
            ..RecordingHost::default()
        };
        let dispatcher = Dispatcher::new(host);
        let report = block_on(dispatcher.download(&artifact(), PlatformProfile::DESKTOP)).unwrap();
        assert_eq!(report.final_state(), DownloadState::FallbackSucceeded);
        let host = dispatcher.host();
        assert_eq!(host.count(|c| matches!(c, Call::Revoke(_))), 0);
        assert_eq!(host.count(|c| *c == Call::Click), 0);
    }

    #[test]
    fn provided_fallback_data_url_is_preferred() {
        let host = RecordingHost {
            fail_click: true,
            ..RecordingHost::default()
        };
        let dispatcher = Dispatcher::new(host);
        let mut artifact = artifact();
        artifact.fallback_data_url = Some("data:image/png;base64,PRECOMPUTED".into());
        block_on(dispatcher.download(&artifact, PlatformProfile::DESKTOP)).unwrap();
        assert!(dispatcher
            .host()
            .calls()
            .iter()
            .any(|c| matches!(c, Call::OpenPage(html) if html.contains("PRECOMPUTED"))));
    }

    #[test]
    fn fallback_page_escapes_filename_and_omits_img_for_non_images() {
        let html = fallback_page_html("data:text/plain;base64,AA", "a\"<b>.txt", false);
        assert!(html.contains("a&quot;&lt;b&gt;.txt"));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn data_urls_drop_mime_parameters() {
        assert_eq!(encode_data_url(b"hi", "image/svg+xml;charset=utf-8"), "data:image/svg+xml;base64,aGk=");
    }

    #[test]
    fn browser_sink_uses_pinned_profile() {
        let sink = BrowserSink::with_profile(RecordingHost::default(), MOBILE);
        let report = block_on(sink.deliver(&artifact())).unwrap();
        assert_eq!(report.strategy, DownloadStrategy::MobileDelayed);
        assert!(sink.dispatcher().host().calls().contains(&Call::Sleep(500)));
    }
}
