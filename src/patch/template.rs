// src/patch/template.rs

use std::sync::OnceLock;

use regex::Regex;

use crate::errors::{ClusterlabError, Result};

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{(\d+)\}").expect("placeholder regex is valid"))
}

/// Substitute `{0}`, `{1}`, ... with the corresponding entry of `values`.
///
/// Only `{<digits>}` is a placeholder. Everything else, including other
/// braces, is copied through unchanged. A placeholder without a matching
/// value is an error.
pub fn render(template: &str, values: &[String]) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for caps in placeholder().captures_iter(template) {
        let (Some(whole), Some(digits)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let value = digits
            .as_str()
            .parse::<usize>()
            .ok()
            .and_then(|idx| values.get(idx))
            .ok_or_else(|| {
                ClusterlabError::ConfigError(format!(
                    "patch template placeholder {} has no value ({} given)",
                    whole.as_str(),
                    values.len()
                ))
            })?;

        out.push_str(&template[last..whole.start()]);
        out.push_str(value);
        last = whole.end();
    }

    out.push_str(&template[last..]);
    Ok(out)
}
