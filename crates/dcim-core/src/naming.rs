//! Template name resolution
//!
//! A template name may carry the `{module}` placeholder, replaced by the
//! position of the module bay a module is installed in, and bracketed range
//! patterns that stand for several names:
//!
//! - `Gi0/[1-4]` expands to `Gi0/1` .. `Gi0/4`
//! - `PSU[A-B]` expands to `PSUA`, `PSUB`
//! - `eth[0,2,4]` expands to `eth0`, `eth2`, `eth4`
//! - `[1-2]/[1-2]` expands to `1/1`, `1/2`, `2/1`, `2/2`
//!
//! Brackets without a `,` or `-` inside are kept as literal text.

use crate::error::DcimError;
use dcim_models::MODULE_TOKEN;

/// Replace every `{module}` with the module bay position
pub fn resolve_module_token(value: &str, position: Option<&str>) -> String {
    match position {
        Some(position) => value.replace(MODULE_TOKEN, position),
        None => value.to_string(),
    }
}

/// Expand every range pattern in `name`, left to right
pub fn expand_pattern(name: &str) -> Result<Vec<String>, DcimError> {
    let Some(open) = name.find('[') else {
        return Ok(vec![name.to_string()]);
    };
    let close = name[open..]
        .find(']')
        .map(|offset| open + offset)
        .ok_or_else(|| DcimError::InvalidTemplate(format!("Unclosed range pattern in {:?}", name)))?;

    let prefix = &name[..open];
    let body = &name[open + 1..close];
    let suffixes = expand_pattern(&name[close + 1..])?;

    let values = if body.contains(',') || body.contains('-') {
        parse_range(body).map_err(|reason| {
            DcimError::InvalidTemplate(format!("Invalid range pattern [{}] in {:?}: {}", body, name, reason))
        })?
    } else {
        vec![format!("[{}]", body)]
    };

    let mut names = Vec::with_capacity(values.len() * suffixes.len());
    for value in &values {
        for suffix in &suffixes {
            names.push(format!("{}{}{}", prefix, value, suffix));
        }
    }
    Ok(names)
}

fn parse_range(body: &str) -> Result<Vec<String>, String> {
    let mut values = Vec::new();
    for item in body.split(',') {
        let item = item.trim();
        if item.is_empty() {
            return Err("empty element".to_string());
        }
        match item.split_once('-') {
            Some((begin, end)) => values.extend(expand_span(begin.trim(), end.trim())?),
            None => values.push(item.to_string()),
        }
    }
    Ok(values)
}

fn expand_span(begin: &str, end: &str) -> Result<Vec<String>, String> {
    if let (Ok(first), Ok(last)) = (begin.parse::<u32>(), end.parse::<u32>()) {
        if first > last {
            return Err(format!("{} is greater than {}", begin, end));
        }
        // Zero-padded bounds keep their width: [01-10]
        let width = if begin.len() > 1 && begin.starts_with('0') { begin.len() } else { 0 };
        return Ok((first..=last).map(|n| format!("{:0width$}", n, width = width)).collect());
    }

    let mut begin_chars = begin.chars();
    let mut end_chars = end.chars();
    match (begin_chars.next(), begin_chars.next(), end_chars.next(), end_chars.next()) {
        (Some(first), None, Some(last), None)
            if first.is_ascii_alphabetic()
                && last.is_ascii_alphabetic()
                && first.is_ascii_uppercase() == last.is_ascii_uppercase() =>
        {
            if first > last {
                return Err(format!("{} is after {}", first, last));
            }
            Ok((first..=last).map(String::from).collect())
        }
        _ => Err(format!("{}-{} is not a numeric or single-letter range", begin, end)),
    }
}
