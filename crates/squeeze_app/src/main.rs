use std::env;
use std::time::Duration;

use anyhow::Context;
use squeeze_app::platform::logging::{self, LogDestination};
use squeeze_app::{ConfigStore, RedirectDecision, Session};
use squeeze_core::{RedirectCapability, ResourceType};

/// Command-line harness around the session: prints where an image request
/// would be rerouted under the configuration persisted in the working
/// directory. `--probe` runs the deferred path with the HEAD verification.
fn main() -> anyhow::Result<()> {
    logging::initialize(LogDestination::Terminal);

    let mut args: Vec<String> = env::args().skip(1).collect();
    let capability = if args.first().map(String::as_str) == Some("--probe") {
        args.remove(0);
        RedirectCapability::Deferred
    } else {
        RedirectCapability::Immediate
    };

    let Some(image_url) = args.first().cloned() else {
        eprintln!("Usage: squeeze [--probe] <image-url> [page-url]");
        return Ok(());
    };
    let document_url = args.get(1).cloned().unwrap_or_else(|| image_url.clone());

    let state_dir = env::current_dir().context("resolve working directory")?;
    let session = Session::new(ConfigStore::open(state_dir), capability);
    session.on_install_startup();
    if session.setup_requested() {
        eprintln!("No proxy endpoint configured; edit squeeze_state.ron and rerun.");
        return Ok(());
    }

    match session.on_before_request(&image_url, &document_url, ResourceType::Image) {
        RedirectDecision::Redirect(target) => println!("{target}"),
        RedirectDecision::Deferred(deferred) => match deferred.wait(Duration::from_secs(15)) {
            Some(target) => println!("{target}"),
            None => println!("{image_url}"),
        },
        RedirectDecision::None => println!("{image_url}"),
    }

    session.flush();
    Ok(())
}
