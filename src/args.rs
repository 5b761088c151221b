//! Boot Argument Capture
//!
//! Holds the argument vector exactly as the entry point received it and
//! derives the override/non-option views the runtime layers over its
//! settings. The original vector is never mutated, filtered, or reordered.

/// The argument vector handed to the bootstrap routine, verbatim.
///
/// Arguments of the form `--key=value` are property overrides: the key is the
/// text between `--` and the first `=`, the value everything after it (an `=`
/// inside the value is kept as-is, and a bare `--flag` is an override with an
/// empty value). Anything not starting with `--` is a non-option argument.
/// Both views are derived once at capture time; `raw()` always returns the
/// untouched input.
#[derive(Debug, Clone)]
pub struct BootArgs {
    raw: Vec<String>,
    overrides: Vec<(String, String)>,
    non_options: Vec<String>,
}

impl BootArgs {
    /// Capture an argument vector without modifying it.
    pub fn capture(raw: Vec<String>) -> Self {
        let mut overrides = Vec::new();
        let mut non_options = Vec::new();

        for arg in &raw {
            match arg.strip_prefix("--") {
                Some(option) => {
                    let (key, value) = option.split_once('=').unwrap_or((option, ""));
                    overrides.push((key.to_string(), value.to_string()));
                }
                None => non_options.push(arg.clone()),
            }
        }

        Self {
            raw,
            overrides,
            non_options,
        }
    }

    /// The input vector, unmodified.
    pub fn raw(&self) -> &[String] {
        &self.raw
    }

    /// All `--key=value` overrides in the order they appeared.
    pub fn overrides(&self) -> &[(String, String)] {
        &self.overrides
    }

    /// Arguments that are not `--` options, in the order they appeared.
    pub fn non_options(&self) -> &[String] {
        &self.non_options
    }

    /// The value of the last occurrence of `key`, if any.
    ///
    /// Later arguments win, matching the precedence of the settings layers.
    pub fn override_of(&self, key: &str) -> Option<&str> {
        self.overrides
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}
