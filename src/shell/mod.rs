//! Root window shell.
//!
//! Mounting the shell runs a fixed sequence of side-effecting setup
//! steps: host window initialization and instrumentation (fire-once),
//! then the reversible registrations that make the window reachable from
//! the outside (navigation hook, cross-window listeners, clipboard
//! intercept, devtools poll). Every reversible step hands its disposer to
//! the mount's [`OwningScope`], so unmounting (or dropping the
//! [`MountedShell`]) reverses each started step exactly once, including
//! registrations that are still in flight at that moment.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tokio::sync::watch;

use crate::bridge::{EventBridge, SubscriptionWatch, topics};
use crate::config::ShellConfig;
use crate::nav::{NavigationRegistry, NavigationTarget};
use crate::scope::{Disposer, OwningScope};

pub mod clipboard;
pub mod debug_console;
pub mod devtools;

pub use clipboard::{ClipboardService, LogClipboard};
pub use debug_console::{DebugConsole, DebugRecord};

/// The in-app router, as seen from the shell.
pub trait Router: Send + Sync {
    fn navigate(&self, target: NavigationTarget);
}

/// Host window setup run once per mount (decorations, sizing, badges).
pub trait WindowSystem: Send + Sync {
    fn init(&self) -> anyhow::Result<()>;
}

/// Usage instrumentation, switched on once per mount.
pub trait Instrumentation: Send + Sync {
    fn enable(&self);
}

/// Wire shape of the [`topics::NAVIGATE`] payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigatePayload {
    pub path: String,
}

/// Everything the root shell needs to mount. Collaborators are trait
/// objects so hosts and tests can substitute their own.
pub struct RootShell {
    pub bridge: Arc<EventBridge>,
    pub navigation: Arc<NavigationRegistry>,
    pub router: Arc<dyn Router>,
    pub clipboard: Arc<dyn ClipboardService>,
    pub windows: Arc<dyn WindowSystem>,
    pub instrumentation: Arc<dyn Instrumentation>,
    pub devtools_flag: Arc<AtomicBool>,
    pub config: ShellConfig,
}

impl RootShell {
    /// Run the mount sequence. Setup failures are logged and skipped,
    /// never propagated; a window with a broken collaborator still comes
    /// up with the rest of its wiring. Must be called from within a
    /// Tokio runtime, as the listener registrations and the devtools
    /// poll run on background tasks.
    pub fn mount(self) -> MountedShell {
        let RootShell {
            bridge,
            navigation,
            router,
            clipboard,
            windows,
            instrumentation,
            devtools_flag,
            config,
        } = self;

        log::info!("mounting root shell");
        let scope = OwningScope::new("root-shell");

        // Fire-once host setup, no reversal.
        if let Err(error) = windows.init() {
            log::error!("window system init failed: {:#}", error);
        }
        instrumentation.enable();

        // Navigation hook for imperative callers. Installing overwrites
        // whatever was there; teardown clears unconditionally.
        {
            let router = Arc::clone(&router);
            navigation.install(move |target| router.navigate(target));
            let navigation = Arc::clone(&navigation);
            scope.adopt(Disposer::new("navigation-hook", move || {
                navigation.uninstall();
            }));
        }

        // Navigation requests from other windows go straight to the
        // router this shell was mounted with.
        let navigate_token = {
            let router = Arc::clone(&router);
            bridge.subscribe_json(topics::NAVIGATE, move |payload: NavigatePayload| {
                let router = Arc::clone(&router);
                async move {
                    match NavigationTarget::new(payload.path) {
                        Some(target) => router.navigate(target),
                        None => log::warn!("navigate event with an empty path dropped"),
                    }
                }
            })
        };

        // Debug messages from the control window.
        let console = Arc::new(DebugConsole::new(config.debug_console_capacity));
        let debug_token = {
            let console = Arc::clone(&console);
            bridge.subscribe_json(topics::DEBUG, move |message: String| {
                let console = Arc::clone(&console);
                async move {
                    console.push(message);
                }
            })
        };

        // Copy intercept: forward copied text to the system clipboard.
        let copy_token = {
            let clipboard = Arc::clone(&clipboard);
            bridge.subscribe_json(topics::CLIPBOARD_COPY, move |text: String| {
                let clipboard = Arc::clone(&clipboard);
                async move {
                    if let Err(error) = clipboard.write_text(text).await {
                        log::warn!("clipboard write failed: {:#}", error);
                    }
                }
            })
        };

        let subscriptions = vec![
            navigate_token.watch(),
            debug_token.watch(),
            copy_token.watch(),
        ];
        scope.adopt(Disposer::new("navigate-listener", move || {
            navigate_token.unsubscribe();
        }));
        scope.adopt(Disposer::new("debug-listener", move || {
            debug_token.unsubscribe();
        }));
        scope.adopt(Disposer::new("clipboard-intercept", move || {
            copy_token.unsubscribe();
        }));

        let (devtools_visible, poll_disposer) =
            devtools::spawn_poll(devtools_flag, config.devtools_poll_interval());
        scope.adopt(poll_disposer);

        MountedShell {
            scope,
            console,
            devtools_visible,
            subscriptions,
        }
    }
}

/// A mounted root shell. Unmounting, or simply dropping it, tears every
/// started setup step back down.
pub struct MountedShell {
    scope: OwningScope,
    console: Arc<DebugConsole>,
    devtools_visible: watch::Receiver<bool>,
    subscriptions: Vec<SubscriptionWatch>,
}

impl MountedShell {
    /// Resolves once every cross-window registration of this mount has
    /// settled. Events published before that may not be seen.
    pub async fn settled(&self) {
        for subscription in &self.subscriptions {
            subscription.settled().await;
        }
    }

    /// Lifecycle views of this mount's registrations.
    pub fn subscriptions(&self) -> Vec<SubscriptionWatch> {
        self.subscriptions.clone()
    }

    /// The retained control-window debug messages.
    pub fn debug_console(&self) -> Arc<DebugConsole> {
        Arc::clone(&self.console)
    }

    /// Devtools visibility as last observed by the poll.
    pub fn devtools_visible(&self) -> watch::Receiver<bool> {
        self.devtools_visible.clone()
    }

    pub fn is_mounted(&self) -> bool {
        !self.scope.is_torn_down()
    }

    /// Reverse the mount. Dropping the shell does the same; unmounting
    /// twice is impossible and teardown runs once either way.
    pub fn unmount(self) {
        log::info!("unmounting root shell");
        self.scope.teardown();
    }
}
