//! Tracking facade and its actor.
//!
//! [`TrackingFacade`] is a cheap, cloneable handle. The state it controls
//! (provider handle, recorded locations, observer slot, session flags) is
//! owned by a single actor task that applies requests one at a time, in the
//! order they were queued. Provider callbacks go through the same queue.

use std::sync::{Arc, Weak};

use log::{debug, info, warn};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, watch};

use super::config::TrackingConfig;
use super::error::{ProviderError, TrackingError, TrackingResult};
use super::observer::{ObserverSlot, TrackingObserver};
use super::provider::{LocationProvider, ProviderEvent, ProviderEvents};
use super::types::{AuthorizationStatus, Location, TrackingState};

/// Message applied by the tracking actor.
pub(crate) enum Request {
    Control {
        control: Control,
        done: oneshot::Sender<()>,
    },
    /// Result of the availability check that `Control::Start` runs off the actor.
    ServicesChecked {
        session: u64,
        enabled: bool,
        done: oneshot::Sender<()>,
    },
    SetObserver(Weak<dyn TrackingObserver>),
    ClearObserver,
    Snapshot(oneshot::Sender<Vec<Location>>),
    Provider(ProviderEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Control {
    RequestPermission,
    Start,
    Pause,
    Resume,
    Stop,
    RequestLocation,
}

/// Facade over a platform location provider.
///
/// Construct it once at process start and hand clones to whoever needs to
/// control tracking. Control operations never fail from the caller's point
/// of view: problems are logged and denied access is reported through
/// [`TrackingObserver::on_authorization_changed`].
///
/// # Example
///
/// ```
/// use locus_core::location::testing::{sample_location, FakeProvider};
/// use locus_core::location::{TrackingConfig, TrackingFacade, TrackingState};
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let provider = FakeProvider::new();
/// let facade = TrackingFacade::new(provider.clone(), TrackingConfig::default()).unwrap();
///
/// facade.start_tracking().await;
/// assert_eq!(facade.state(), TrackingState::Tracking);
///
/// provider.emit_locations(vec![sample_location(1), sample_location(2)]);
/// assert_eq!(facade.recorded_locations().await.len(), 2);
///
/// facade.stop_tracking().await;
/// assert_eq!(facade.state(), TrackingState::Idle);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct TrackingFacade {
    requests: mpsc::UnboundedSender<Request>,
    status: watch::Receiver<AuthorizationStatus>,
    state: watch::Receiver<TrackingState>,
}

impl TrackingFacade {
    /// Creates the facade and spawns its actor on the current tokio runtime.
    ///
    /// The provider receives its delegate and the configuration before this
    /// returns. The facade keeps the provider until every handle is dropped;
    /// an active session is stopped at that point.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::Config`] if the configuration is invalid, or
    /// [`TrackingError::NoRuntime`] if called outside a tokio runtime.
    pub fn new<P: LocationProvider>(provider: P, config: TrackingConfig) -> TrackingResult<Self> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| TrackingError::NoRuntime)?;

        let (requests, inbox) = mpsc::unbounded_channel();
        provider.set_delegate(ProviderEvents::new(requests.downgrade()));
        provider.configure(&config);

        let (status_tx, status) = watch::channel(provider.authorization_status());
        let (state_tx, state) = watch::channel(TrackingState::Idle);

        let actor = TrackingActor {
            provider: Arc::new(provider),
            queue: requests.downgrade(),
            recorded: Vec::new(),
            observer: ObserverSlot::default(),
            one_shot_pending: false,
            session: 0,
            status: status_tx,
            state: state_tx,
        };
        runtime.spawn(actor.run(inbox));
        debug!("Tracking facade started with {config:?}");

        Ok(Self {
            requests,
            status,
            state,
        })
    }

    /// Asks the platform for the broadest location grant.
    ///
    /// The outcome arrives later through the authorization callback.
    pub async fn request_permission(&self) {
        self.control(Control::RequestPermission).await;
    }

    /// Starts a tracking session.
    ///
    /// Service availability is checked on a blocking worker. If services are
    /// disabled nothing else happens. Otherwise the recorded locations are
    /// cleared and continuous updates plus significant-change monitoring are
    /// started. Resolves once that decision has been applied.
    pub async fn start_tracking(&self) {
        self.control(Control::Start).await;
    }

    /// Stops continuous updates. Significant-change monitoring keeps running,
    /// so locations may still be delivered while paused.
    pub async fn pause_tracking(&self) {
        self.control(Control::Pause).await;
    }

    /// Restarts continuous updates without clearing recorded locations.
    pub async fn resume_tracking(&self) {
        self.control(Control::Resume).await;
    }

    /// Stops continuous updates and significant-change monitoring.
    pub async fn stop_tracking(&self) {
        self.control(Control::Stop).await;
    }

    /// Requests a single fix, delivered like any other update. Valid in any state.
    pub async fn request_location(&self) {
        self.control(Control::RequestLocation).await;
    }

    /// Returns true if the current authorization status allows location access.
    #[must_use]
    pub fn access_granted(&self) -> bool {
        self.authorization_status().is_granted()
    }

    /// Returns the most recent authorization status reported by the provider.
    #[must_use]
    pub fn authorization_status(&self) -> AuthorizationStatus {
        *self.status.borrow()
    }

    /// Returns the current session state.
    #[must_use]
    pub fn state(&self) -> TrackingState {
        *self.state.borrow()
    }

    /// Returns a copy of the locations recorded in the current session.
    pub async fn recorded_locations(&self) -> Vec<Location> {
        let (reply, snapshot) = oneshot::channel();
        if !self.send(Request::Snapshot(reply)) {
            return Vec::new();
        }
        snapshot.await.unwrap_or_default()
    }

    /// Registers the observer, replacing any previous one.
    ///
    /// Only a weak reference is kept.
    pub fn set_observer<O: TrackingObserver + 'static>(&self, observer: &Arc<O>) {
        let observer: Weak<dyn TrackingObserver> = Arc::<O>::downgrade(observer);
        self.send(Request::SetObserver(observer));
    }

    /// Removes the registered observer.
    pub fn clear_observer(&self) {
        self.send(Request::ClearObserver);
    }

    async fn control(&self, control: Control) {
        let (done, finished) = oneshot::channel();
        if !self.send(Request::Control { control, done }) {
            return;
        }
        if finished.await.is_err() {
            debug!("Tracking actor stopped before completing {control:?}");
        }
    }

    fn send(&self, request: Request) -> bool {
        let sent = self.requests.send(request).is_ok();
        if !sent {
            warn!("{}", TrackingError::Closed);
        }
        sent
    }
}

/// Sole owner of the provider handle and the session state.
struct TrackingActor<P> {
    provider: Arc<P>,
    queue: mpsc::WeakUnboundedSender<Request>,
    recorded: Vec<Location>,
    observer: ObserverSlot,
    one_shot_pending: bool,
    /// Bumped by every start and stop. A service check only begins a session
    /// if no other start or stop was applied while it ran.
    session: u64,
    status: watch::Sender<AuthorizationStatus>,
    state: watch::Sender<TrackingState>,
}

impl<P: LocationProvider> TrackingActor<P> {
    async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<Request>) {
        while let Some(request) = inbox.recv().await {
            self.handle(request);
        }

        if self.current_state() != TrackingState::Idle {
            debug!("All facade handles dropped, stopping active session");
            self.stop();
        }
    }

    fn handle(&mut self, request: Request) {
        match request {
            Request::Control { control, done } => self.control(control, done),
            Request::ServicesChecked {
                session,
                enabled,
                done,
            } => {
                if session == self.session {
                    self.begin_session(enabled);
                } else {
                    debug!("Discarding service check superseded by a later start or stop");
                }
                let _ = done.send(());
            }
            Request::SetObserver(observer) => self.observer.set(observer),
            Request::ClearObserver => self.observer.clear(),
            Request::Snapshot(reply) => {
                let _ = reply.send(self.recorded.clone());
            }
            Request::Provider(event) => self.provider_event(event),
        }
    }

    fn control(&mut self, control: Control, done: oneshot::Sender<()>) {
        match control {
            // Completes through ServicesChecked
            Control::Start => return self.check_services(done),
            Control::RequestPermission => self.provider.request_always_authorization(),
            Control::Pause => self.pause(),
            Control::Resume => self.resume(),
            Control::Stop => self.stop(),
            Control::RequestLocation => {
                self.one_shot_pending = true;
                self.provider.request_location();
            }
        }
        let _ = done.send(());
    }

    fn check_services(&mut self, done: oneshot::Sender<()>) {
        self.session = self.session.wrapping_add(1);
        let Some(queue) = self.queue.upgrade() else {
            return;
        };
        let session = self.session;
        let provider = Arc::clone(&self.provider);

        tokio::task::spawn_blocking(move || {
            let enabled = provider.location_services_enabled();
            if queue
                .send(Request::ServicesChecked {
                    session,
                    enabled,
                    done,
                })
                .is_err()
            {
                debug!("Tracking actor stopped during service availability check");
            }
        });
    }

    fn begin_session(&mut self, services_enabled: bool) {
        if !services_enabled {
            warn!("{}, not starting tracking", TrackingError::ServiceDisabled);
            return;
        }

        self.recorded.clear();
        self.set_state(TrackingState::Tracking);
        self.provider.start_updating_location();
        self.provider.start_monitoring_significant_location_changes();
    }

    fn pause(&mut self) {
        let state = self.current_state();
        if state != TrackingState::Tracking {
            warn!("Ignoring pause while {state:?}");
            return;
        }
        self.provider.stop_updating_location();
        self.set_state(TrackingState::Paused);
    }

    fn resume(&mut self) {
        let state = self.current_state();
        if state != TrackingState::Paused {
            warn!("Ignoring resume while {state:?}");
            return;
        }
        self.provider.start_updating_location();
        self.set_state(TrackingState::Tracking);
    }

    fn stop(&mut self) {
        self.session = self.session.wrapping_add(1);
        self.provider.stop_updating_location();
        self.provider.stop_monitoring_significant_location_changes();
        self.one_shot_pending = false;
        self.set_state(TrackingState::Idle);
    }

    fn provider_event(&mut self, event: ProviderEvent) {
        match event {
            ProviderEvent::AuthorizationChanged(status) => self.authorization_changed(status),
            ProviderEvent::LocationsUpdated(batch) => self.locations_updated(batch),
            ProviderEvent::Failed(failure) => self.failed(failure),
        }
    }

    fn authorization_changed(&mut self, status: AuthorizationStatus) {
        self.status.send_replace(status);

        if status.is_granted() {
            info!("Location access granted ({status:?})");
        } else if status.is_refused() {
            warn!("Location access refused ({status:?})");
        }

        if let Some(observer) = self.observer.current() {
            observer.on_authorization_changed(status);
        }
    }

    fn locations_updated(&mut self, batch: Vec<Location>) {
        if self.current_state() == TrackingState::Idle && !self.one_shot_pending {
            debug!("Dropping {} location(s) delivered while idle", batch.len());
            return;
        }

        self.one_shot_pending = false;
        self.recorded.extend_from_slice(&batch);

        if let Some(observer) = self.observer.current() {
            observer.on_locations_updated(&batch);
        }
    }

    fn failed(&mut self, failure: ProviderError) {
        self.one_shot_pending = false;

        let transient = failure.kind.is_transient();
        let failure = TrackingError::Provider(failure);
        if transient {
            warn!("{failure}");
        } else {
            log::error!("{failure}");
        }
    }

    fn current_state(&self) -> TrackingState {
        *self.state.borrow()
    }

    fn set_state(&self, state: TrackingState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!("Tracking state {previous:?} -> {state:?}");
        }
    }
}
