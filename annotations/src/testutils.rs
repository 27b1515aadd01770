use crate::builders::BackendData;
use crate::cache::Labels;
use crate::config::AnnotationConfig;
use crate::mapper::MapBuilder;
use crate::source::Source;
use crate::types::Backend;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// Records every event as "LEVEL message".
struct CaptureLayer {
    lines: Arc<Mutex<Vec<String>>>,
}

struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.0 = value.to_string();
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        let line = format!("{} {}", event.metadata().level(), visitor.0);
        self.lines.lock().unwrap().push(line);
    }
}

/// Runs `f` and returns its result along with the log lines it emitted.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, Vec<String>) {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry().with(CaptureLayer {
        lines: lines.clone(),
    });
    let result = tracing::subscriber::with_default(subscriber, f);
    let lines = lines.lock().unwrap().clone();
    (result, lines)
}

pub fn ingress(name: &str) -> Source {
    Source::new("ingress", "default", name)
}

/// Builds labels from "k1=v1,k2=v2".
pub fn labels(pairs: &str) -> Labels {
    pairs.split(',')
        .filter_map(|label| label.split_once('='))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// Host every test backend path is declared on.
pub const TEST_HOST: &str = "d1.local";

/// Backend `default/app` with one path per entry of `paths`, each path
/// declaring its annotations from `source` at its own scope.
pub fn backend_data(
    source: &Source,
    defaults: &[(&str, &str)],
    paths: &[(&str, &[(&str, &str)])],
) -> BackendData {
    let defaults = defaults
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    let mut mapper = MapBuilder::new(AnnotationConfig::new("", defaults)).new_mapper();
    let mut backend = Backend::new("default", "app", "8080");
    for (path, annotations) in paths {
        backend.add_host_path(TEST_HOST, path);
        let scope = format!("{TEST_HOST}{path}");
        for (key, value) in annotations.iter() {
            mapper.add_annotation(source, &scope, key, value);
        }
    }
    BackendData { backend, mapper }
}

/// Same as `backend_data` with a single "/" path.
pub fn single_path_data(
    source: &Source,
    defaults: &[(&str, &str)],
    annotations: &[(&str, &str)],
) -> BackendData {
    backend_data(source, defaults, &[("/", annotations)])
}
