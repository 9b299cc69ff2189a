use super::{Error, InputFile, Recognize, Recognized, Result};
use std::sync::atomic::{AtomicUsize, Ordering};

enum Script {
    /// Reply with the input bytes, interpreted as UTF-8 text.
    Echo,
    /// Reply with a fixed text.
    Text(String),
    /// Fail as if the service were unreachable.
    Unavailable,
    /// Reply with empty text, which recognition treats as failure.
    Empty,
}

/// ScriptedRecognizer is the in-process stand-in used by tests: it replies
/// according to a fixed script and tracks how many calls run concurrently.
pub struct ScriptedRecognizer {
    script: Script,
    delay: Option<std::time::Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedRecognizer {
    pub fn echoing() -> Self {
        Self::new(Script::Echo)
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self::new(Script::Text(text.into()))
    }

    pub fn unavailable() -> Self {
        Self::new(Script::Unavailable)
    }

    pub fn empty() -> Self {
        Self::new(Script::Empty)
    }

    fn new(script: Script) -> Self {
        Self {
            script,
            delay: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Hold each call open for `delay` before replying.
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Highest number of calls observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Recognize for ScriptedRecognizer {
    async fn recognize(&self, input: InputFile) -> Result<Recognized> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let result = match &self.script {
            Script::Echo => match String::from_utf8(input.data.to_vec()) {
                Ok(text) if text.is_empty() => Err(Error::Empty),
                Ok(text) => Ok(Recognized { text }),
                Err(err) => Err(Error::Unavailable(Box::new(err))),
            },
            Script::Text(text) => Ok(Recognized { text: text.clone() }),
            Script::Unavailable => Err(Error::Unavailable(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "service unavailable",
            )))),
            Script::Empty => Err(Error::Empty),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[cfg(test)]
mod test {
    use super::{InputFile, Recognize, ScriptedRecognizer};
    use crate::Error;

    fn input(data: &str) -> InputFile {
        InputFile {
            name: "file.txt".to_string(),
            data: bytes::Bytes::copy_from_slice(data.as_bytes()),
        }
    }

    #[tokio::test]
    async fn test_echo_and_empty() {
        let recognizer = ScriptedRecognizer::echoing();
        let recognized = recognizer.recognize(input("hello world")).await.unwrap();
        assert_eq!(recognized.text, "hello world");

        // Zero bytes of input extract zero text, which is an error.
        let err = recognizer.recognize(input("")).await.unwrap_err();
        assert!(matches!(err, Error::Empty));
    }

    #[tokio::test]
    async fn test_unavailable() {
        let recognizer = ScriptedRecognizer::unavailable();
        let err = recognizer.recognize(input("data")).await.unwrap_err();
        assert!(matches!(err, Error::Unavailable(_)));
    }
}
