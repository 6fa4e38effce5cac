use chrono::Local;
use std::io::Write;
use tracing::Subscriber;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// Routes events emitted under the `discv5` target to their own rolling log
/// file, separate from the process' main log stream.
///
/// Discovery chatter (PING/PONG, FINDNODE/NODES) is high-volume and rarely
/// useful alongside the proposal pipeline's own logs; splitting it out keeps
/// the main log readable without silencing discovery entirely.
pub struct Discv5TracingLayer {
    pub non_blocking_writer: NonBlocking,
    pub _guard: WorkerGuard,
}

impl<S> Layer<S> for Discv5TracingLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<S>) {
        let meta = event.metadata();
        if meta.target().split_once("::").map(|(crate_name, _)| crate_name) != Some("discv5") {
            return;
        }

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let mut visitor = MessageExtractor::default();
        event.record(&mut visitor);

        let line = format!("{} {} {}\n", timestamp, meta.level(), visitor.message);
        if let Err(e) = self.non_blocking_writer.clone().write_all(line.as_bytes()) {
            eprintln!("failed to write discv5 log: {e}");
        }
    }
}

#[derive(Default)]
struct MessageExtractor {
    message: String,
}

impl tracing::field::Visit for MessageExtractor {
    fn record_debug(&mut self, _field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.message = format!("{} {:?}", self.message, value);
    }
}

pub fn create_discv5_tracing_layer(log_dir: Option<std::path::PathBuf>) -> Discv5TracingLayer {
    let (non_blocking_writer, _guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "discv5.log");
            NonBlocking::new(appender)
        }
        None => NonBlocking::new(std::io::sink()),
    };
    Discv5TracingLayer {
        non_blocking_writer,
        _guard,
    }
}
