//! Pool configuration
//!
//! Options are plain JSON:
//!
//! ```json
//! { "maxVoices": 5, "filter": { "f": [31, 44, 62], "Q": 2.871 } }
//! ```
//!
//! Missing keys fall back to the defaults below.

use crate::engine::{VOICE_MODULE_PATH, VOICE_PROCESSOR_NAME};
use crate::error::{Result, VoicePoolError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default number of voices
pub const DEFAULT_MAX_VOICES: usize = 5;

/// Default equalizer center frequencies (Hz), half-octave spacing
pub const DEFAULT_FILTER_FREQUENCIES: [f32; 19] = [
    31.0, 44.0, 62.0, 88.0, 125.0, 176.0, 250.0, 353.0, 500.0, 707.0, 1000.0, 1414.0, 2000.0,
    2828.0, 4000.0, 5656.0, 8000.0, 11313.0, 16000.0,
];

/// Default resonance of every equalizer stage
pub const DEFAULT_FILTER_Q: f32 = 2.871;

/// Equalizer frequency table plus shared Q
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFilterBank")]
pub struct FilterBankConfig {
    f: Vec<f32>,
    #[serde(rename = "Q")]
    q: f32,
}

#[derive(Deserialize)]
struct RawFilterBank {
    f: Vec<f32>,
    #[serde(rename = "Q")]
    q: f32,
}

impl TryFrom<RawFilterBank> for FilterBankConfig {
    type Error = VoicePoolError;

    fn try_from(raw: RawFilterBank) -> Result<Self> {
        Self::new(raw.f, raw.q)
    }
}

impl Default for FilterBankConfig {
    fn default() -> Self {
        Self {
            f: DEFAULT_FILTER_FREQUENCIES.to_vec(),
            q: DEFAULT_FILTER_Q,
        }
    }
}

impl FilterBankConfig {
    /// Validate and freeze a filter bank
    pub fn new(frequencies: Vec<f32>, q: f32) -> Result<Self> {
        if frequencies.is_empty() {
            return Err(VoicePoolError::EmptyFilterBank);
        }

        if !(q.is_finite() && q > 0.0) {
            return Err(VoicePoolError::InvalidOption {
                option: "filter.Q".to_string(),
                value: q.to_string(),
                expected: "a finite value greater than 0".to_string(),
            });
        }

        if let Some(bad) = frequencies.iter().find(|f| !(f.is_finite() && **f > 0.0)) {
            return Err(VoicePoolError::InvalidOption {
                option: "filter.f".to_string(),
                value: bad.to_string(),
                expected: "positive frequencies in Hz".to_string(),
            });
        }

        if let Some(pair) = frequencies.windows(2).find(|w| w[0] >= w[1]) {
            return Err(VoicePoolError::InvalidOption {
                option: "filter.f".to_string(),
                value: format!("{} before {}", pair[0], pair[1]),
                expected: "strictly ascending frequencies".to_string(),
            });
        }

        Ok(Self { f: frequencies, q })
    }

    pub fn frequencies(&self) -> &[f32] {
        &self.f
    }

    pub fn q(&self) -> f32 {
        self.q
    }
}

/// Everything a pool build needs besides the context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PoolOptions {
    /// Number of voice chains
    pub max_voices: usize,
    pub filter: FilterBankConfig,
    /// Module declaring the voice processor
    pub module: String,
    /// Processor instantiated for each voice unit
    pub processor: String,
    /// Seed for the noise tables; random when absent
    pub seed: Option<u64>,
    /// Abort registration after this many milliseconds
    pub registration_timeout_ms: Option<u64>,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_voices: DEFAULT_MAX_VOICES,
            filter: FilterBankConfig::default(),
            module: VOICE_MODULE_PATH.to_string(),
            processor: VOICE_PROCESSOR_NAME.to_string(),
            seed: None,
            registration_timeout_ms: None,
        }
    }
}

impl PoolOptions {
    /// Parse options from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        Ok(options)
    }

    /// Read options from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Serialize options to pretty JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_max_voices(mut self, max_voices: usize) -> Self {
        self.max_voices = max_voices;
        self
    }

    pub fn with_filter(mut self, filter: FilterBankConfig) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check the options that cannot be enforced by construction
    pub fn validate(&self) -> Result<()> {
        if self.module.trim().is_empty() {
            return Err(VoicePoolError::InvalidOption {
                option: "module".to_string(),
                value: format!("{:?}", self.module),
                expected: "a module path".to_string(),
            });
        }
        if self.processor.trim().is_empty() {
            return Err(VoicePoolError::InvalidOption {
                option: "processor".to_string(),
                value: format!("{:?}", self.processor),
                expected: "a processor name".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let options = PoolOptions::default();
        assert_eq!(options.max_voices, 5);
        assert_eq!(options.filter.frequencies().len(), 19);
        assert_eq!(options.filter.frequencies()[0], 31.0);
        assert_eq!(options.filter.frequencies()[18], 16000.0);
        assert_eq!(options.filter.q(), 2.871);
        assert_eq!(options.module, VOICE_MODULE_PATH);
    }

    #[test]
    fn test_parse_partial_json() {
        let options =
            PoolOptions::from_json_str(r#"{"maxVoices": 2, "filter": {"f": [100, 200], "Q": 1.5}}"#)
                .unwrap();
        assert_eq!(options.max_voices, 2);
        assert_eq!(options.filter.frequencies(), &[100.0, 200.0]);
        assert_eq!(options.filter.q(), 1.5);
        assert_eq!(options.processor, VOICE_PROCESSOR_NAME);
    }

    #[test]
    fn test_json_rejects_invalid_filter_bank() {
        let result = PoolOptions::from_json_str(r#"{"filter": {"f": [200, 100], "Q": 1.0}}"#);
        assert!(result.is_err());

        let result = PoolOptions::from_json_str(r#"{"filter": {"f": [100, 200], "Q": 0}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_filter_bank_validation() {
        assert!(matches!(
            FilterBankConfig::new(vec![], 1.0),
            Err(VoicePoolError::EmptyFilterBank)
        ));
        assert!(FilterBankConfig::new(vec![100.0, 100.0], 1.0).is_err());
        assert!(FilterBankConfig::new(vec![-5.0, 100.0], 1.0).is_err());
        assert!(FilterBankConfig::new(vec![100.0], f32::NAN).is_err());
        assert!(FilterBankConfig::new(vec![100.0], 1.0).is_ok());
    }

    #[test]
    fn test_roundtrip_through_file() {
        let options = PoolOptions::default().with_max_voices(3).with_seed(42);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", options.to_json_pretty().unwrap()).unwrap();

        let loaded = PoolOptions::from_file(file.path()).unwrap();
        assert_eq!(loaded, options);
    }

    #[test]
    fn test_missing_file() {
        let err = PoolOptions::from_file("/definitely/not/here.json").unwrap_err();
        assert_eq!(err.error_code(), "IO_ERROR");
    }

    #[test]
    fn test_validate_empty_module() {
        let options = PoolOptions {
            module: " ".to_string(),
            ..Default::default()
        };
        assert!(options.validate().is_err());
    }
}
