use std::sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
};

use crate::{
    camera::{CameraSession, CameraState},
    client::DetectClient,
    error::DetectError,
    messages::DetectionResult,
    render::{DetectView, render},
    source::{self, Preview, to_data_url},
};

/// Everything the UI remembers between events.
pub struct UiSessionState {
    /// Bytes of the file currently chosen in the file picker.
    pub selected_file: Option<Vec<u8>>,
    /// What the preview region shows.
    pub preview: Preview,
    /// The single camera session of this UI.
    pub camera: CameraSession,
}

impl UiSessionState {
    /// Fresh state: no file, empty preview, idle camera.
    pub fn new(camera: CameraSession) -> Self {
        Self {
            selected_file: None,
            preview: Preview::Empty,
            camera,
        }
    }
}

/// Whether a detection request is currently pending.
#[derive(Clone, Debug, PartialEq)]
pub enum SubmitState {
    /// Ready to accept a new submission.
    Idle,
    /// A request has been sent and not yet answered.
    Submitting,
}

impl SubmitState {
    /// Returns the state as a string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmitState::Idle => "idle",
            SubmitState::Submitting => "submitting",
        }
    }
}

// Clears the in-flight flag when the submission ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Turns UI events into detection requests and view updates.
///
/// At most one submission is in flight; a second one fails with
/// [`DetectError::SubmitInProgress`] without touching the network.
pub struct DetectController<V: DetectView> {
    client: DetectClient,
    state: Mutex<UiSessionState>,
    view: Mutex<V>,
    in_flight: AtomicBool,
}

impl<V: DetectView> DetectController<V> {
    /// Creates a controller that owns `state` and renders into `view`.
    pub fn new(client: DetectClient, state: UiSessionState, view: V) -> Self {
        Self {
            client,
            state: Mutex::new(state),
            view: Mutex::new(view),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Returns whether a submission is currently in flight.
    pub fn submit_state(&self) -> SubmitState {
        if self.in_flight.load(Ordering::SeqCst) {
            SubmitState::Submitting
        } else {
            SubmitState::Idle
        }
    }

    /// Returns the state of the owned camera session.
    pub fn camera_state(&self) -> CameraState {
        self.state.lock().unwrap().camera.state()
    }

    /// Returns a copy of what the preview region holds.
    pub fn preview(&self) -> Preview {
        self.state.lock().unwrap().preview.clone()
    }

    /// Runs `f` against the view, e.g. to inspect what has been rendered.
    pub fn with_view<T>(&self, f: impl FnOnce(&mut V) -> T) -> T {
        f(&mut self.view.lock().unwrap())
    }

    /// Selects a file, previews it and submits it right away.
    pub async fn choose_file(&self, bytes: Vec<u8>) -> Result<DetectionResult, DetectError> {
        {
            let mut state = self.state.lock().unwrap();
            state.selected_file = Some(bytes.clone());
            state.preview = Preview::File;
            self.view.lock().unwrap().set_preview(&state.preview);
        }
        let result = self.submit_exclusive(bytes).await;
        self.report(result)
    }

    /// Clears the file picker selection.
    pub fn clear_file(&self) {
        self.state.lock().unwrap().selected_file = None;
    }

    /// Starts (or restarts) the camera and notifies the user if access fails.
    pub fn start_camera(&self) -> Result<(), DetectError> {
        let result = {
            let mut state = self.state.lock().unwrap();
            let mut view = self.view.lock().unwrap();
            state.camera.start(&mut *view)
        };
        self.report(result)
    }

    /// Stops the camera. Does nothing when it is already stopped.
    pub fn stop_camera(&self) {
        let mut state = self.state.lock().unwrap();
        let mut view = self.view.lock().unwrap();
        state.camera.stop(&mut *view);
    }

    /// Captures the current camera frame into the preview and submits it.
    ///
    /// The camera is stopped once the frame has been taken.
    pub async fn capture(&self) -> Result<DetectionResult, DetectError> {
        let result = match self.begin() {
            Ok(guard) => match self.capture_frame() {
                Ok(jpeg) => self.submit_guarded(&guard, jpeg).await,
                Err(err) => Err(err),
            },
            Err(err) => Err(err),
        };
        self.report(result)
    }

    /// Submits whichever source wins: file, captured preview, then live frame.
    pub async fn analyze(&self) -> Result<DetectionResult, DetectError> {
        let result = match self.begin() {
            Ok(guard) => match self.resolve_source() {
                Ok(bytes) => self.submit_guarded(&guard, bytes).await,
                Err(err) => Err(err),
            },
            Err(err) => Err(err),
        };
        self.report(result)
    }

    fn capture_frame(&self) -> Result<Vec<u8>, DetectError> {
        let mut state = self.state.lock().unwrap();
        let mut view = self.view.lock().unwrap();
        let jpeg = state.camera.capture(&mut *view)?;
        state.preview = Preview::DataUrl(to_data_url(&jpeg));
        view.set_preview(&state.preview);
        Ok(jpeg)
    }

    fn resolve_source(&self) -> Result<Vec<u8>, DetectError> {
        let mut state = self.state.lock().unwrap();
        let UiSessionState {
            selected_file,
            preview,
            camera,
        } = &mut *state;
        source::resolve(selected_file.as_deref(), preview, camera).map(|s| s.into_bytes())
    }

    fn begin(&self) -> Result<InFlight<'_>, DetectError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| InFlight(&self.in_flight))
            .map_err(|_| {
                log::debug!("Rejecting submission, another one is in flight");
                DetectError::SubmitInProgress
            })
    }

    async fn submit_exclusive(&self, bytes: Vec<u8>) -> Result<DetectionResult, DetectError> {
        let guard = self.begin()?;
        self.submit_guarded(&guard, bytes).await
    }

    async fn submit_guarded(
        &self,
        _guard: &InFlight<'_>,
        bytes: Vec<u8>,
    ) -> Result<DetectionResult, DetectError> {
        log::debug!("Submit state: {}", self.submit_state().as_str());
        let result = self.client.submit(bytes).await?;
        log::info!("Received {} detections", result.detections.len());
        render(&mut *self.view.lock().unwrap(), &result);
        Ok(result)
    }

    // Surfaces failures to the user; the views keep their previous contents.
    fn report<T>(&self, result: Result<T, DetectError>) -> Result<T, DetectError> {
        if let Err(err) = &result {
            log::warn!("Detection workflow failed: {err}");
            self.view.lock().unwrap().notify(&notification(err));
        }
        result
    }
}

/// User-facing text for an error.
pub fn notification(err: &DetectError) -> String {
    match err {
        DetectError::NoImageSource
        | DetectError::CameraNotReady
        | DetectError::SubmitInProgress => err.to_string(),
        DetectError::CameraAccessError(detail) => format!("Cannot access camera.\n{detail}"),
        other => format!("Failed to analyze image.\n{other}"),
    }
}
