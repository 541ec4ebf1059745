//! End-to-end demo: a main-window shell and a control-window publisher
//! talking over one in-process transport.

use anyhow::Result;
use clap::Args;
use colored::*;
use serde_json::json;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::timeout;

use crate::bridge::{EventBridge, EventTransport, LocalTransport, topics};
use crate::config::ShellConfig;
use crate::nav::{NavigationTarget, global_navigation};
use crate::shell::{
    ClipboardService, Instrumentation, MountedShell, Router, RootShell, WindowSystem,
};

#[derive(Args)]
pub struct DemoCommands {
    /// Override the devtools poll interval for the demo, in ms
    #[arg(long)]
    pub poll_ms: Option<u64>,
}

struct DemoRouter {
    navigations: Mutex<Vec<String>>,
}

impl Router for DemoRouter {
    fn navigate(&self, target: NavigationTarget) {
        println!("    {} {}", "router navigate:".cyan(), target.path().bright_white());
        self.navigations.lock().unwrap().push(target.path().to_string());
    }
}

struct DemoClipboard {
    writes: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl ClipboardService for DemoClipboard {
    async fn write_text(&self, text: String) -> Result<()> {
        println!("    {} {:?}", "clipboard write:".cyan(), text);
        self.writes.lock().unwrap().push(text);
        Ok(())
    }
}

struct DemoWindows {
    inits: AtomicUsize,
}

impl WindowSystem for DemoWindows {
    fn init(&self) -> Result<()> {
        self.inits.fetch_add(1, Ordering::SeqCst);
        println!("    {}", "window system initialized".dimmed());
        Ok(())
    }
}

struct DemoInstrumentation {
    enables: AtomicUsize,
}

impl Instrumentation for DemoInstrumentation {
    fn enable(&self) {
        self.enables.fetch_add(1, Ordering::SeqCst);
        println!("    {}", "instrumentation enabled".dimmed());
    }
}

pub async fn demo_command(args: DemoCommands, mut config: ShellConfig) -> Result<()> {
    if let Some(poll_ms) = args.poll_ms {
        config.devtools_poll_interval_ms = poll_ms;
    }

    println!();
    println!("  {}", "🔗 shellbridge demo: two windows, one process".bright_blue().bold());
    println!("  {}", "═════════════════════════════════════════════".bright_blue());

    // Both "windows" share one in-process transport.
    let transport = Arc::new(LocalTransport::new());
    let bridge = Arc::new(EventBridge::new(
        Arc::clone(&transport) as Arc<dyn EventTransport>
    ));

    let router = Arc::new(DemoRouter {
        navigations: Mutex::new(Vec::new()),
    });
    let clipboard = Arc::new(DemoClipboard {
        writes: Mutex::new(Vec::new()),
    });
    let windows = Arc::new(DemoWindows {
        inits: AtomicUsize::new(0),
    });
    let instrumentation = Arc::new(DemoInstrumentation {
        enables: AtomicUsize::new(0),
    });
    let devtools_flag = Arc::new(AtomicBool::new(false));

    println!();
    println!("  {}", "Mounting the main window shell...".bright_white().bold());
    let shell = RootShell {
        bridge: Arc::clone(&bridge),
        navigation: global_navigation(),
        router: Arc::clone(&router) as Arc<dyn Router>,
        clipboard: Arc::clone(&clipboard) as Arc<dyn ClipboardService>,
        windows: Arc::clone(&windows) as Arc<dyn WindowSystem>,
        instrumentation: Arc::clone(&instrumentation) as Arc<dyn Instrumentation>,
        devtools_flag: Arc::clone(&devtools_flag),
        config: config.clone(),
    };
    let mounted = shell.mount();
    mounted.settled().await;
    println!("  {} {}", "✓".green(), "shell mounted, listeners registered".green());

    println!();
    println!("  {}", "Control window publishes:".bright_white().bold());
    publish_round(&bridge, &transport).await;

    let console = mounted.debug_console();
    println!();
    println!("  {}", "Main window observed:".bright_white().bold());
    println!(
        "  {} {} navigation(s), {} clipboard write(s)",
        "✓".green(),
        router.navigations.lock().unwrap().len(),
        clipboard.writes.lock().unwrap().len()
    );
    for record in console.records() {
        println!(
            "  {} debug console [{}] {}",
            "✓".green(),
            record.received_at.format("%H:%M:%S").to_string().dimmed(),
            record.message
        );
    }

    // Imperative callers go through the process-wide hook instead of the
    // bridge; the mounted shell is what installed it.
    println!();
    println!("  {}", "Imperative navigation through the global hook:".bright_white().bold());
    if let Some(target) = NavigationTarget::new("/inbox") {
        let dispatched = global_navigation().invoke(target);
        println!("  {} hook dispatched: {}", "✓".green(), dispatched);
    }

    demo_devtools(&mounted, &devtools_flag, &config).await;

    println!();
    println!("  {}", "Unmounting and republishing the same events...".bright_white().bold());
    mounted.unmount();
    publish_round(&bridge, &transport).await;

    if let Some(target) = NavigationTarget::new("/inbox") {
        let dispatched = global_navigation().invoke(target);
        println!("  {} hook after unmount dispatched: {}", "✓".green(), dispatched);
    }

    println!(
        "  {} still {} navigation(s), {} debug record(s), {} clipboard write(s)",
        "✓".green(),
        router.navigations.lock().unwrap().len(),
        console.len(),
        clipboard.writes.lock().unwrap().len()
    );
    println!(
        "  {} window init ran {}x, instrumentation enabled {}x",
        "✓".green(),
        windows.inits.load(Ordering::SeqCst),
        instrumentation.enables.load(Ordering::SeqCst)
    );

    println!();
    println!("  {}", "Done.".bright_green().bold());
    Ok(())
}

async fn publish_round(bridge: &EventBridge, transport: &LocalTransport) {
    println!("    {} navigate {}", "→".yellow(), "{\"path\": \"/settings\"}".dimmed());
    bridge.publish(topics::NAVIGATE, json!({"path": "/settings"}));

    println!("    {} debug {}", "→".yellow(), "\"ping\"".dimmed());
    bridge.publish(topics::DEBUG, json!("ping"));

    println!("    {} clipboard:copy {}", "→".yellow(), "\"hello\"".dimmed());
    bridge.publish(topics::CLIPBOARD_COPY, json!("hello"));

    // Wait until every handler above has run.
    transport.flush().await;
}

async fn demo_devtools(mounted: &MountedShell, flag: &Arc<AtomicBool>, config: &ShellConfig) {
    println!();
    if !cfg!(debug_assertions) {
        println!("  {}", "devtools poll is disabled in release builds".dimmed());
        return;
    }

    println!("  {}", "Opening the devtools window (flag flip)...".bright_white().bold());
    flag.store(true, Ordering::Relaxed);

    let mut visible = mounted.devtools_visible();
    let wait = config.devtools_poll_interval() * 10 + Duration::from_millis(100);
    match timeout(wait, visible.wait_for(|open| *open)).await {
        Ok(Ok(_)) => println!("  {} devtools visibility observed: true", "✓".green()),
        _ => println!("  {} devtools visibility not observed in time", "⚠".yellow()),
    }
}
