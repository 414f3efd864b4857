use lazy_static::lazy_static;
use regex::{Captures, Regex};

// Interpolation follows the POSIX shell parameter expansion rules:
// https://pubs.opengroup.org/onlinepubs/000095399/basedefs/xbd_chap08.html

lazy_static! {
  pub static ref ENVIRONMENT_VARIABLE_INTERPOLATION_REGEX: Regex = Regex::new(
    r"(?x)
        \$\$|
        \$([[:word:].]+)|
        \$\{([[:word:].]+)(?:(:?-|:?\?)([^}]*))?\}",
  )
  .expect("environment variable interpolation regex is valid");
}

pub type Warnings = Vec<String>;
pub type Errors = Vec<String>;

/// Where interpolated values come from. Implemented for any `Fn(&str) -> Option<String>`,
/// so both `std::env::var` wrappers and in-memory maps (in tests) can be used.
pub trait EnvVarsSource {
  fn get_var(&self, key: &str) -> Option<String>;
}

impl<F> EnvVarsSource for F
where
  F: Fn(&str) -> Option<String>,
{
  fn get_var(&self, key: &str) -> Option<String> {
    self(key)
  }
}

/// Replaces `$VAR`, `${VAR}`, `${VAR:-default}`, `${VAR-default}`, `${VAR:?error}` and
/// `${VAR?error}` occurrences. `$$` escapes a literal `$`.
pub fn interpolate(input: &str, env: impl EnvVarsSource) -> Result<(String, Warnings), Errors> {
  let mut errors = Vec::new();
  let mut warnings = Vec::new();

  let interpolated = ENVIRONMENT_VARIABLE_INTERPOLATION_REGEX
    .replace_all(input, |caps: &Captures| {
      let flags = caps.get(3).map(|m| m.as_str()).unwrap_or_default();
      let def_or_err = caps
        .get(4)
        .map(|m| m.as_str())
        .unwrap_or_default()
        .to_string();

      let name = match caps.get(1).or_else(|| caps.get(2)) {
        Some(m) => m.as_str(),
        None => return "$".to_string(),
      };

      let value = env.get_var(name);

      match flags {
        ":-" => match value {
          Some(v) if !v.is_empty() => v,
          _ => def_or_err,
        },
        "-" => value.unwrap_or(def_or_err),
        ":?" => match value {
          Some(v) if !v.is_empty() => v,
          _ => {
            errors.push(format!(
              "non-empty env var required in config. name = {:?}, error = {:?}",
              name, def_or_err
            ));
            String::new()
          }
        },
        "?" => value.unwrap_or_else(|| {
          errors.push(format!(
            "missing env var required in config. name = {:?}, error = {:?}",
            name, def_or_err
          ));
          String::new()
        }),
        _ => value.unwrap_or_else(|| {
          warnings.push(format!("unknown env var in config. name = {:?}", name));
          String::new()
        }),
      }
    })
    .into_owned();

  if errors.is_empty() {
    Ok((interpolated, warnings))
  } else {
    Err(errors)
  }
}
