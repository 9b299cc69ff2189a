use super::{Log, LogLevel};

// Layer maps tracing spans and events into canonical JSON Logs and hands
// them to a caller-provided handler.
//
// Example usage:
//
//   use tracing_subscriber::prelude::*;
//   let env_filter = tracing_subscriber::EnvFilter::from_default_env();
//   tracing_subscriber::registry()
//     .with(ops::logging::Layer::new(ops::stderr_log_handler, std::time::SystemTime::now).with_filter(env_filter))
//     .init();

pub struct Layer<H, T>(H, T)
where
    H: Fn(Log),
    T: Fn() -> std::time::SystemTime;

impl<H, T> Layer<H, T>
where
    H: Fn(Log),
    T: Fn() -> std::time::SystemTime,
{
    pub fn new(handler: H, timesource: T) -> Self {
        Self(handler, timesource)
    }

    fn log_from_metadata(&self, metadata: &tracing::Metadata) -> Log {
        let mut log = Log {
            ts: self.1().into(),
            level: level_from_tracing(metadata.level()),
            message: String::new(),
            fields: Default::default(),
            spans: Default::default(),
        };

        log.fields
            .insert("module".to_string(), metadata.target().into());

        log
    }
}

impl<S, H, T> tracing_subscriber::Layer<S> for Layer<H, T>
where
    S: tracing::Subscriber,
    S: for<'lookup> tracing_subscriber::registry::LookupSpan<'lookup>,
    H: Fn(Log) + 'static,
    T: Fn() -> std::time::SystemTime + 'static,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut log = self.log_from_metadata(attrs.metadata());
        log.message = attrs.metadata().name().to_string();
        attrs.record(&mut FieldVisitor(&mut log));

        // Get an internal span reference and store `log` as an extension.
        let span = ctx.span(id).unwrap();
        let mut extensions = span.extensions_mut();
        extensions.insert(log);
    }

    fn on_record(
        &self,
        id: &tracing::span::Id,
        values: &tracing::span::Record<'_>,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        // Get the span whose data is being recorded.
        let span = ctx.span(id).unwrap();
        let mut extensions = span.extensions_mut();
        let log: &mut Log = extensions.get_mut::<Log>().unwrap();
        values.record(&mut FieldVisitor(log));
    }

    fn on_event(&self, event: &tracing::Event<'_>, ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut log = self.log_from_metadata(event.metadata());
        event.record(&mut FieldVisitor(&mut log));

        // Attach context from parent spans, if any.
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                let extensions = span.extensions();
                let span = extensions.get::<Log>().unwrap();
                log.spans.push(span.clone());
            }
        }

        self.0(log)
    }
}

struct FieldVisitor<'a>(&'a mut Log);

impl<'a> FieldVisitor<'a> {
    fn record_value(&mut self, field: &tracing::field::Field, value: serde_json::Value) {
        if field.name() == "message" && self.0.message.is_empty() {
            match value {
                serde_json::Value::String(message) => self.0.message = message,
                value => self.0.message = value.to_string(),
            }
        } else {
            self.0.fields.insert(field.name().to_string(), value);
        }
    }
}

impl<'a> tracing::field::Visit for FieldVisitor<'a> {
    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.record_value(field, value.into())
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.record_value(field, value.into())
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.record_value(field, value.into())
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.record_value(field, value.into())
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.record_value(field, value.into())
    }

    fn record_error(
        &mut self,
        field: &tracing::field::Field,
        value: &(dyn std::error::Error + 'static),
    ) {
        // Flatten the error's chain of causes into an array of messages,
        // keeping a lone cause as a bare string.
        if value.source().is_none() {
            self.record_value(field, value.to_string().into());
            return;
        }

        let mut chain = Vec::new();
        let mut next = Some(value);
        while let Some(cur) = next {
            chain.push(serde_json::Value::String(cur.to_string()));
            next = cur.source();
        }

        self.record_value(field, serde_json::Value::Array(chain));
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.record_value(field, format!("{value:?}").into())
    }
}

fn level_from_tracing(lvl: &tracing::Level) -> LogLevel {
    match *lvl {
        tracing::Level::TRACE => LogLevel::Trace,
        tracing::Level::DEBUG => LogLevel::Debug,
        tracing::Level::INFO => LogLevel::Info,
        tracing::Level::WARN => LogLevel::Warn,
        tracing::Level::ERROR => LogLevel::Error,
    }
}
