//! Example: record a few synthetic clicks against a collector
//!
//! ```text
//! RUST_LOG=evtrack=debug cargo run -p evtrack --example basic -- http://localhost/save
//! ```

use std::time::Duration;

use evtrack::events::PointerInput;
use evtrack::{Config, Controller, Host, HostEvent, HostMetrics, ListenerHost, Scope};
use smol::stream::StreamExt;
use tracing_subscriber::EnvFilter;

struct DemoPage;

impl ListenerHost for DemoPage {
    fn add_listener(&mut self, scope: Scope, event: &str) {
        tracing::trace!("listen {:?} {}", scope, event);
    }
    
    fn remove_listener(&mut self, scope: Scope, event: &str) {
        tracing::trace!("unlisten {:?} {}", scope, event);
    }
}

impl Host for DemoPage {
    fn page_url(&self) -> String {
        "http://localhost/demo.html".into()
    }
    
    fn metrics(&self) -> HostMetrics {
        HostMetrics {
            screen_width: Some(1920),
            screen_height: Some(1080),
            inner_width: Some(1280),
            inner_height: Some(800),
            ..Default::default()
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    
    let endpoint = std::env::args().nth(1).unwrap_or_else(|| "http://localhost/save".into());
    let config = Config::from_json(&serde_json::json!({
        "endpoint": endpoint,
        "flushIntervalSeconds": 1,
        "regularEvents": "click",
        "debug": true,
    }).to_string())?;
    
    let document = evtrack_html::parse(
        r#"<html><body><ul><li>One</li><li><button id="go">Go</button></li></ul></body></html>"#,
    )?;
    let button = document.get_element_by_id("go").ok_or_else(|| anyhow::anyhow!("no #go"))?;
    
    let mut page = DemoPage;
    let mut controller = Controller::new();
    controller.record(config, &mut page)?;
    
    smol::block_on(async {
        let mut timer = smol::Timer::interval(Duration::from_millis(250));
        for i in 0..12u32 {
            timer.next().await;
            let at = PointerInput::at_page(f64::from(i * 10), 40.0);
            controller.handle_event(&document, &HostEvent::pointer("click", button, at));
            if let Some(flush) = controller.poll(&page) {
                tracing::info!("Sent {} batch with {} records", flush.action().as_str(), flush.records());
            }
        }
    });
    
    controller.unload(&mut page);
    println!("Session id: {:?}", controller.session_id());
    Ok(())
}
