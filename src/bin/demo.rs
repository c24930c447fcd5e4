use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use metapatterns::logging;
use metapatterns::{listenable, Config, Iteration, Listener, Listeners, Subject, Subscriptions};

#[derive(Parser)]
#[command(version, about = "Attach a listener to a subject and watch the notifications", long_about = None)]
pub struct Cli {
    /// Config file to load instead of the one in the platform config directory
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Notify a snapshot of the listeners instead of the live collection
    #[arg(long)]
    snapshot: bool,

    /// Enables debug mode
    #[arg(short, long, action = clap::ArgAction::Count)]
    debug: u8,
}

listenable! {
    /// Listener for [`Greeter`]
    trait GreeterListener: Listener {
        fn greet(name: str) -> String => on_greet, on_greet_finished;
    }
}

struct Greeter {
    listeners: Listeners<dyn GreeterListener>,
}

impl Greeter {
    /// Observable: listeners can hook into it
    fn greet(&self, name: &str) -> String {
        self.listeners.call(
            |l| l.on_greet(name),
            || {
                info!(target: "demo", "greet called with {}", name);
                "Hoozah".to_string()
            },
            |l, result| l.on_greet_finished(result, name),
        )
    }

    /// Not observable, no hook exists for it
    fn wave(&self, name: &str) {
        info!(target: "demo", "wave called with {}", name);
    }
}

impl Subject for Greeter {
    type Observer = dyn GreeterListener;

    fn listeners(&self) -> &Listeners<dyn GreeterListener> {
        &self.listeners
    }
}

/// Only overrides what it cares about, the other hooks stay no-ops
#[derive(Default)]
struct Eavesdropper {
    subscriptions: Subscriptions,
}

impl Listener for Eavesdropper {
    fn subscriptions(&self) -> &Subscriptions {
        &self.subscriptions
    }
}

impl GreeterListener for Eavesdropper {
    fn on_greet(&self, name: &str) {
        info!(target: "demo", "listened in on call to greet with {}", name);
    }

    fn on_greet_finished(&self, result: &String, name: &str) {
        info!(target: "demo", "listened in on result of greet with {} and result {}", name, result);
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load().context("Failed to load config")?,
    };
    if cli.snapshot {
        config.dispatch.iteration = Iteration::Snapshot;
    }

    logging::init(&logging::filter_for_verbosity(&config.logging.filter, cli.debug))?;

    let greeter = Greeter {
        listeners: Listeners::with_config(&config.dispatch),
    };

    info!(target: "demo", "Calling greet without a listener");
    greeter.greet("world");

    let listener = Rc::new(Eavesdropper::default());
    greeter.attach(listener.clone());

    info!(target: "demo", "Calling greet with a listener");
    greeter.greet("moon");

    info!(target: "demo", "Calling wave with a listener");
    greeter.wave("moon");

    greeter.detach(&listener)?;

    info!(target: "demo", "Calling greet again with the listener detached");
    greeter.greet("moon");

    Ok(())
}
