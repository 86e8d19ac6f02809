//! Wheel compatibility tags (PEP 425, 427).
//!
//! A wheel's filename and its WHEEL record carry a three-part tag naming
//! the interpreter, ABI, and platform its native code was built for. All
//! ambient interpreter/platform facts are captured once into an
//! [`InterpreterEnv`], so tag derivation itself is a pure function and
//! tests can inject a fixed environment instead of probing a live one.

use std::fmt;
use std::process::Command;

use thiserror::Error;

/// Errors raised while probing the interpreter or deriving a tag.
///
/// Every variant is fatal for the build: there is no fallback tag.
#[derive(Error, Debug)]
pub enum TagError {
    /// The probe interpreter could not be spawned.
    #[error("failed to invoke interpreter probe: {0}")]
    Probe(#[from] std::io::Error),

    /// The probe interpreter ran but exited unsuccessfully.
    #[error("interpreter probe exited with failure: {0}")]
    ProbeFailed(String),

    /// The probe output was missing a field or held an unusable value.
    #[error("interpreter probe returned malformed output: {0}")]
    Malformed(String),

    /// The reported ABI identifier does not belong to a supported interpreter.
    #[error("unsupported ABI identifier '{0}': expected a cpython SOABI")]
    UnsupportedAbi(String),
}

/// Implementation prefix shared by the interpreter and ABI tags.
const IMPL_PREFIX: &str = "cp";

/// Required leading component of the SOABI identifier.
const SOABI_IMPL: &str = "cpython";

/// One-shot script handed to the probe interpreter. Prints exactly one
/// field per line, in [`InterpreterEnv`] declaration order.
const PROBE_SCRIPT: &str = "\
import platform, sys, sysconfig
print(sysconfig.get_config_var('py_version_nodot'))
print(sysconfig.get_config_var('SOABI'))
print(sys.platform)
print(platform.mac_ver()[0])
print(platform.machine())
print(sysconfig.get_platform())
";

/// Snapshot of the interpreter and platform facts a tag is derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterEnv {
    /// Interpreter version with separators stripped (`py_version_nodot`), e.g. `39`.
    pub version_nodot: String,
    /// Platform-reported ABI identifier (`SOABI`), e.g. `cpython-39-x86_64-linux-gnu`.
    pub soabi: String,
    /// OS family identifier (`sys.platform`), e.g. `linux` or `darwin`.
    pub os: String,
    /// macOS release version (`platform.mac_ver()`); empty on other systems.
    pub os_release: String,
    /// Machine architecture (`platform.machine()`), e.g. `x86_64` or `arm64`.
    pub machine: String,
    /// Generic platform identifier (`sysconfig.get_platform()`), e.g. `linux-x86_64`.
    pub platform: String,
}

impl InterpreterEnv {
    /// Probe a live interpreter for the facts needed to derive a tag.
    ///
    /// Runs `<python> -c <script>` and parses one field per output line.
    ///
    /// # Errors
    ///
    /// Returns an error if the interpreter cannot be spawned, exits with a
    /// non-zero status, or reports a missing or unusable field.
    pub fn probe(python: &str) -> Result<Self, TagError> {
        let output = Command::new(python).arg("-c").arg(PROBE_SCRIPT).output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TagError::ProbeFailed(stderr.trim().to_string()));
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|_| TagError::Malformed("probe output is not UTF-8".to_string()))?;

        Self::parse(&stdout)
    }

    /// Parse probe output, one field per line.
    ///
    /// `os_release` may legitimately be empty off macOS; every other field
    /// must be present and must not be the interpreter's `None` literal.
    fn parse(stdout: &str) -> Result<Self, TagError> {
        let mut lines = stdout.lines();
        let mut field = |name: &str| {
            lines
                .next()
                .map(|line| line.trim().to_string())
                .ok_or_else(|| TagError::Malformed(format!("missing field '{name}'")))
        };

        let version_nodot = field("py_version_nodot")?;
        let soabi = field("SOABI")?;
        let os = field("sys.platform")?;
        let os_release = field("mac_ver")?;
        let machine = field("machine")?;
        let platform = field("get_platform")?;

        for (name, value) in [
            ("py_version_nodot", &version_nodot),
            ("SOABI", &soabi),
            ("sys.platform", &os),
            ("machine", &machine),
            ("get_platform", &platform),
        ] {
            if value.is_empty() || value == "None" {
                return Err(TagError::Malformed(format!("field '{name}' is unavailable")));
            }
        }

        Ok(Self {
            version_nodot,
            soabi,
            os,
            os_release,
            machine,
            platform,
        })
    }
}

/// A resolved `<interpreter>-<abi>-<platform>` wheel compatibility tag.
///
/// Resolved fresh for every build; never cached across invocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatTag {
    interpreter: String,
    abi: String,
    platform: String,
}

impl CompatTag {
    /// Derive the tag for the given environment.
    ///
    /// # Errors
    ///
    /// Returns [`TagError::UnsupportedAbi`] if the SOABI identifier does
    /// not name a cpython build, or [`TagError::Malformed`] if the macOS
    /// release version lacks major and minor components.
    pub fn resolve(env: &InterpreterEnv) -> Result<Self, TagError> {
        Ok(Self {
            interpreter: interpreter_tag(env),
            abi: abi_tag(env)?,
            platform: plat_tag(env)?,
        })
    }

    /// Interpreter component, e.g. `cp39`.
    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }

    /// ABI component, e.g. `cp39`.
    pub fn abi(&self) -> &str {
        &self.abi
    }

    /// Platform component, e.g. `linux_x86_64`.
    pub fn platform(&self) -> &str {
        &self.platform
    }
}

impl fmt::Display for CompatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.interpreter, self.abi, self.platform)
    }
}

/// `cp` + the interpreter version with separators stripped, e.g. `cp39`.
fn interpreter_tag(env: &InterpreterEnv) -> String {
    format!("{IMPL_PREFIX}{}", env.version_nodot)
}

/// `cp` + the ABI version component (second `-`-delimited field) of SOABI.
fn abi_tag(env: &InterpreterEnv) -> Result<String, TagError> {
    if !env.soabi.starts_with(SOABI_IMPL) {
        return Err(TagError::UnsupportedAbi(env.soabi.clone()));
    }

    let abi_version = env
        .soabi
        .split('-')
        .nth(1)
        .ok_or_else(|| TagError::UnsupportedAbi(env.soabi.clone()))?;

    Ok(format!("{IMPL_PREFIX}{abi_version}"))
}

/// Platform component of the tag.
///
/// The generic platform identifier is known to be inaccurate on macOS, so
/// the tag is rebuilt there from the OS release and machine architecture.
/// Everywhere else the generic identifier is used with `-` and `.`
/// normalised to `_`.
fn plat_tag(env: &InterpreterEnv) -> Result<String, TagError> {
    if env.os == "darwin" {
        let mut parts = env.os_release.split('.');
        let (Some(major), Some(minor)) = (parts.next(), parts.next()) else {
            return Err(TagError::Malformed(format!(
                "macOS release '{}' lacks major.minor components",
                env.os_release
            )));
        };
        if major.is_empty() || minor.is_empty() {
            return Err(TagError::Malformed(format!(
                "macOS release '{}' lacks major.minor components",
                env.os_release
            )));
        }
        return Ok(format!("macosx_{major}_{minor}_{}", env.machine));
    }

    Ok(env.platform.replace(['-', '.'], "_"))
}
