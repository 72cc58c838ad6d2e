//! Session host.
//!
//! Runs one [`Router`] to completion against one connection. Terminal input,
//! timer ticks and background results are merged into a single ordered
//! stream; each event is dispatched, its effects applied and the frame
//! rendered before the next event is considered.
//!
//! Background work requested through [`Effect::Fetch`] and
//! [`Effect::Schedule`] runs as tasks owned by the session. When the session
//! ends, outstanding tasks are aborted so their results are never delivered.

use std::{future, time::Duration};

use lair_app::{Effect, Event, Request, Router, Timer};
use tokio::{
    sync::{mpsc, watch},
    task::JoinSet,
};
use tracing::{Instrument, debug, debug_span, info, trace, warn};

use crate::{Driver, Services};

/// Identifier of one session, unique within a server process.
pub type SessionId = u64;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// A page requested termination.
    Quit,
    /// The connection closed.
    Disconnected,
    /// The server is shutting down.
    Shutdown,
}

/// Next step of the event loop.
enum Step {
    Event(Event),
    Closed,
    Shutdown,
    Reaped,
}

/// Runs one session.
pub struct SessionHost<D: Driver> {
    id: SessionId,
    driver: D,
    router: Router,
    services: Services,
    /// Outstanding fetches and timers.
    tasks: JoinSet<()>,
    /// Background results, posted by `tasks`.
    results_tx: mpsc::UnboundedSender<Event>,
    results_rx: mpsc::UnboundedReceiver<Event>,
    /// Server-wide shutdown flag. `None` for single-session runs.
    shutdown: Option<watch::Receiver<bool>>,
}

impl<D: Driver> SessionHost<D> {
    /// Create a host for `router` on `driver`.
    pub fn new(id: SessionId, driver: D, router: Router, services: Services) -> Self {
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        Self {
            id,
            driver,
            router,
            services,
            tasks: JoinSet::new(),
            results_tx,
            results_rx,
            shutdown: None,
        }
    }

    /// End the session when `shutdown` turns true.
    #[must_use]
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// The session's router.
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// The session's driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Consume the host, returning its driver.
    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Run until a page quits, the connection closes or the server shuts
    /// down.
    ///
    /// Always aborts outstanding background tasks and stops the driver
    /// before returning.
    ///
    /// # Errors
    ///
    /// Returns the driver's error if rendering or reading input fails.
    pub async fn run(&mut self) -> Result<SessionEnd, D::Error> {
        info!(session = self.id, terminal = %self.router.terminal(), "session started");

        let result = self.event_loop().await;

        self.tasks.abort_all();
        self.driver.stop();

        match &result {
            Ok(end) => info!(session = self.id, ?end, "session ended"),
            Err(e) => warn!(session = self.id, error = %e, "session failed"),
        }
        result
    }

    async fn event_loop(&mut self) -> Result<SessionEnd, D::Error> {
        let effects = self.router.start();
        if self.apply(effects)? {
            return Ok(SessionEnd::Quit);
        }
        if let Some((width, height)) = self.driver.initial_size() {
            let effects = self.router.dispatch(Event::Resize { width, height });
            if self.apply(effects)? {
                return Ok(SessionEnd::Quit);
            }
        }
        self.driver.render(&self.router)?;

        loop {
            let step = tokio::select! {
                biased;

                () = wait_for_shutdown(self.shutdown.as_mut()) => Step::Shutdown,

                // Results first so continuous input cannot starve them
                Some(event) = self.results_rx.recv() => Step::Event(event),

                polled = self.driver.poll_event() => match polled? {
                    Some(event) => Step::Event(event),
                    None => Step::Closed,
                },

                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    if let Err(e) = joined
                        && e.is_panic()
                    {
                        warn!(session = self.id, error = %e, "background task panicked");
                    }
                    Step::Reaped
                },
            };

            match step {
                Step::Event(event) => {
                    trace!(session = self.id, ?event, "dispatch");
                    let effects = self.router.dispatch(event);
                    if self.apply(effects)? {
                        return Ok(SessionEnd::Quit);
                    }
                    self.driver.render(&self.router)?;
                },
                Step::Reaped => {},
                Step::Closed => return Ok(SessionEnd::Disconnected),
                Step::Shutdown => return Ok(SessionEnd::Shutdown),
            }
        }
    }

    /// Execute effects. Returns `true` if the session must terminate.
    fn apply(&mut self, effects: Vec<Effect>) -> Result<bool, D::Error> {
        let mut quit = false;
        for effect in effects {
            match effect {
                Effect::SetTitle(title) => self.driver.set_title(&title)?,
                Effect::Fetch(request) => self.spawn_fetch(request),
                Effect::Schedule { timer, after } => self.spawn_timer(timer, after),
                Effect::Suspend => {
                    debug!(session = self.id, "suspending");
                    self.driver.suspend()?;
                },
                Effect::Quit => quit = true,
            }
        }
        Ok(quit)
    }

    fn spawn_fetch(&mut self, request: Request) {
        let services = self.services.clone();
        let results = self.results_tx.clone();
        let span = debug_span!("fetch", session = self.id, request = request_name(&request));

        self.tasks.spawn(
            async move {
                let response = services.fulfil(request).await;
                debug!("fetch complete");
                // Receiver is gone once the session ends
                let _ = results.send(Event::Fetched(response));
            }
            .instrument(span),
        );
    }

    fn spawn_timer(&mut self, timer: Timer, after: Duration) {
        let results = self.results_tx.clone();
        let span = debug_span!("timer", session = self.id, ?timer);

        self.tasks.spawn(
            async move {
                tokio::time::sleep(after).await;
                let _ = results.send(Event::Tick(timer));
            }
            .instrument(span),
        );
    }
}

fn request_name(request: &Request) -> &'static str {
    match request {
        Request::Weather => "weather",
        Request::Document { .. } => "document",
        Request::SendMessage(_) => "send_message",
    }
}

/// Resolves once `shutdown` turns true. Never resolves without a receiver
/// or after the sender is dropped.
async fn wait_for_shutdown(shutdown: Option<&mut watch::Receiver<bool>>) {
    match shutdown {
        Some(rx) => {
            if rx.wait_for(|stop| *stop).await.is_err() {
                future::pending::<()>().await;
            }
        },
        None => future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use std::{io, sync::Arc};

    use async_trait::async_trait;
    use lair_app::{
        ContactMessage, PageKind, Screen,
        pages::{MenuPage, menu::WeatherState},
    };

    use super::*;
    use crate::{DocumentSource, Mailer, ServiceError, WeatherClient};

    struct Fixed;

    #[async_trait]
    impl WeatherClient for Fixed {
        async fn current(&self) -> Result<String, ServiceError> {
            Ok("Pretoria: +21C".into())
        }
    }

    #[async_trait]
    impl Mailer for Fixed {
        async fn send(&self, _message: &ContactMessage) -> Result<(), ServiceError> {
            Ok(())
        }
    }

    #[async_trait]
    impl DocumentSource for Fixed {
        async fn load(&self, _name: &str) -> Result<String, ServiceError> {
            Ok(String::new())
        }
    }

    /// Sized terminal that never produces input.
    struct Silent;

    impl Driver for Silent {
        type Error = io::Error;

        fn initial_size(&self) -> Option<(u16, u16)> {
            Some((100, 40))
        }

        async fn poll_event(&mut self) -> Result<Option<Event>, Self::Error> {
            future::pending().await
        }

        fn render(&mut self, _router: &Router) -> Result<(), Self::Error> {
            Ok(())
        }

        fn set_title(&mut self, _title: &str) -> Result<(), Self::Error> {
            Ok(())
        }

        fn stop(&mut self) {}
    }

    #[tokio::test]
    async fn finished_tasks_are_reaped_while_running() {
        let fixed = Arc::new(Fixed);
        let services = Services::new(fixed.clone(), fixed.clone(), fixed);
        let mut host = SessionHost::new(7, Silent, Router::new("xterm"), services);

        // Weather lookup and one spinner tick, both done well within the window
        let run = tokio::time::timeout(Duration::from_millis(500), host.run()).await;
        assert!(run.is_err());

        assert!(host.tasks.is_empty());
        let menu = host.router().page(PageKind::Menu).and_then(Screen::as_menu);
        assert_eq!(menu.map(MenuPage::weather), Some(&WeatherState::Ready("Pretoria: +21C".into())));
    }
}
