use super::{Error, InputFile, Recognize, Recognized, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    pub address: String,
    /// Extraction can run OCR over large scans; budget accordingly.
    #[serde(with = "humantime_serde")]
    pub timeout: std::time::Duration,
    pub extract_path: String,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            address: "http://localhost:8004".to_string(),
            timeout: std::time::Duration::from_secs(120),
            extract_path: "/ocr_extract_text".to_string(),
        }
    }
}

/// HttpRecognizer submits files as multipart uploads to an OCR service.
pub struct HttpRecognizer {
    endpoint: url::Url,
    client: reqwest::Client,
}

impl HttpRecognizer {
    pub fn new(config: &RecognizerConfig) -> Result<Self> {
        let endpoint = url::Url::parse(&config.address)
            .and_then(|base| base.join(config.extract_path.trim_start_matches('/')))
            .map_err(|_| Error::Address(config.address.clone()))?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| Error::Unavailable(Box::new(err)))?;

        Ok(Self { endpoint, client })
    }
}

#[async_trait::async_trait]
impl Recognize for HttpRecognizer {
    async fn recognize(&self, input: InputFile) -> Result<Recognized> {
        let part = reqwest::multipart::Part::bytes(input.data.to_vec()).file_name(input.name);
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| Error::Unavailable(Box::new(err)))?;

        let recognized: Recognized = response
            .json()
            .await
            .map_err(|err| Error::Unavailable(Box::new(err)))?;

        if recognized.text.is_empty() {
            return Err(Error::Empty);
        }
        Ok(recognized)
    }
}
