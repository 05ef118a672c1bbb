use crate::{MinifyError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable consulted when no verifier artifact is configured.
pub const VERIFIER_JAR_ENV: &str = "GOBRA";

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinifyConfig {
    /// How the verifier is launched
    pub verifier: VerifierConfig,

    /// Files are offered to the verifier only if they contain this text
    pub header_marker: String,

    /// File that marks the project root (passed as the include path)
    pub module_marker: String,

    /// Regex replacing the default assert-annotation rule
    pub pattern: Option<String>,

    /// Per-attempt deadline such as `90s`; absent means calibrate from a baseline run
    pub deadline: Option<String>,
}

impl Default for MinifyConfig {
    fn default() -> Self {
        Self {
            verifier: VerifierConfig::default(),
            header_marker: "+gobra".to_string(),
            module_marker: "go.mod".to_string(),
            pattern: None,
            deadline: None,
        }
    }
}

/// Verifier launch settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Interpreter used to run the verifier artifact
    pub java: String,

    /// Verifier artifact (`-jar`)
    pub jar: Option<PathBuf>,

    /// Arguments passed to the interpreter before `-jar`
    pub jvm_args: Vec<String>,

    pub backend: String,

    pub cache_file: PathBuf,

    /// Verifier's own scratch output directory
    pub scratch_dir: PathBuf,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            java: "java".to_string(),
            jar: None,
            jvm_args: vec!["-Xss1g".to_string(), "-Xmx4g".to_string()],
            backend: "SILICON".to_string(),
            cache_file: PathBuf::from(".gobra/cache.json"),
            scratch_dir: PathBuf::from("/tmp/"),
        }
    }
}

impl MinifyConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Fill the verifier artifact from `$GOBRA` when it is not set.
    pub fn with_env_fallback(mut self) -> Self {
        if self.verifier.jar.is_none() {
            self.verifier.jar = std::env::var_os(VERIFIER_JAR_ENV)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from);
        }
        self
    }

    /// Parsed per-attempt deadline, if one is configured.
    pub fn deadline(&self) -> Result<Option<Duration>> {
        self.deadline.as_deref().map(parse_duration).transpose()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        match &self.verifier.jar {
            None => {
                return Err(MinifyError::invalid_config(format!(
                    "verifier jar is not set (use --gobra or ${VERIFIER_JAR_ENV})"
                )))
            }
            Some(jar) if !jar.is_file() => {
                return Err(MinifyError::invalid_config(format!(
                    "verifier jar {} does not exist",
                    jar.display()
                )))
            }
            Some(_) => {}
        }

        if self.verifier.java.trim().is_empty() {
            return Err(MinifyError::invalid_config("java must not be empty"));
        }
        if self.header_marker.is_empty() {
            return Err(MinifyError::invalid_config("header_marker must not be empty"));
        }
        if self.module_marker.is_empty() {
            return Err(MinifyError::invalid_config("module_marker must not be empty"));
        }
        if let Some(pattern) = &self.pattern {
            regex::Regex::new(pattern)?;
        }
        self.deadline()?;

        Ok(())
    }
}

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Parse a Go-style duration (`1500ms`, `1m30s`, `1.5s`, `2h`) or bare whole
/// seconds. Zero is rejected.
pub fn parse_duration(raw: &str) -> Result<Duration> {
    let invalid = || MinifyError::invalid_config(format!("invalid duration: {raw:?}"));

    let lowered = raw.trim().to_ascii_lowercase();
    if lowered.is_empty() {
        return Err(invalid());
    }
    let nanos = match lowered.parse::<u64>() {
        Ok(secs) => secs.checked_mul(NANOS_PER_SEC).ok_or_else(invalid)?,
        Err(_) => compound_nanos(&lowered).ok_or_else(invalid)?,
    };
    if nanos == 0 {
        return Err(invalid());
    }
    Ok(Duration::from_nanos(nanos))
}

/// Sum of `<number><unit>` terms; `None` on any malformed term or overflow.
fn compound_nanos(mut rest: &str) -> Option<u64> {
    let is_number = |c: char| c.is_ascii_digit() || c == '.';
    let mut total: u64 = 0;
    while !rest.is_empty() {
        let number_len = rest.find(|c: char| !is_number(c))?;
        let (number, tail) = rest.split_at(number_len);
        let unit_len = tail.find(is_number).unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);

        total = total.checked_add(term_nanos(number, unit_nanos(unit)?)?)?;
        rest = tail;
    }
    Some(total)
}

fn unit_nanos(unit: &str) -> Option<u64> {
    Some(match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => NANOS_PER_SEC,
        "m" => 60 * NANOS_PER_SEC,
        "h" => 3_600 * NANOS_PER_SEC,
        _ => return None,
    })
}

fn term_nanos(number: &str, unit: u64) -> Option<u64> {
    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }

    let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut nanos = whole.checked_mul(unit)?;
    if !fraction.is_empty() {
        // digits past the 18th are below nanosecond resolution for every unit
        let digits = &fraction[..fraction.len().min(18)];
        let value: u128 = digits.parse().ok()?;
        let scale = 10u128.pow(digits.len() as u32);
        let part = u64::try_from(value * u128::from(unit) / scale).ok()?;
        nanos = nanos.checked_add(part)?;
    }
    Some(nanos)
}
