use anyhow::{Context, Result};
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

/// Values separated by newlines, commas or whitespace. Blank lines and `#` comments are ignored.
fn parse_tokens<T>(text: &str, what: &str) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: Display,
{
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let body = line.split('#').next().unwrap_or("");
        for token in body
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            let value = token.parse::<T>().map_err(|e| {
                anyhow::anyhow!("line {}: '{}' is not {}: {}", idx + 1, token, what, e)
            })?;
            out.push(value);
        }
    }
    if out.is_empty() {
        anyhow::bail!("no {} values found", what);
    }
    Ok(out)
}

/// Parses a single-channel sample series.
pub fn parse_f64_series(text: &str) -> Result<Vec<f64>> {
    let values: Vec<f64> = parse_tokens(text, "a number")?;
    if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
        anyhow::bail!("sample {} is not finite", pos + 1);
    }
    Ok(values)
}

pub fn read_f64_series(path: &Path) -> Result<Vec<f64>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_f64_series(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Parses beat sample indices.
pub fn parse_event_indices(text: &str) -> Result<Vec<usize>> {
    parse_tokens(text, "a sample index")
}

pub fn read_event_indices(path: &Path) -> Result<Vec<usize>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_event_indices(&text).with_context(|| format!("parsing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn mixed_separators_and_comments() {
        let values = parse_f64_series("# ecg\n0.5, 1.5\n\n-2e-1 3 # trailing\n").unwrap();
        assert_eq!(values, vec![0.5, 1.5, -0.2, 3.0]);
    }

    #[test]
    fn reports_the_offending_line() {
        let err = parse_f64_series("1.0\n2.0\nabc\n").unwrap_err();
        assert!(err.to_string().contains("line 3"), "{err}");
        assert!(parse_f64_series("# nothing\n").is_err());
        assert!(parse_f64_series("1.0 NaN").is_err());
    }

    #[test]
    fn event_indices() {
        assert_eq!(parse_event_indices("0\n125\n250").unwrap(), vec![0, 125, 250]);
        assert!(parse_event_indices("1.5").is_err());
        assert!(parse_event_indices("-3").is_err());
    }

    #[test]
    fn reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "10\n20\n30").unwrap();
        assert_eq!(read_event_indices(file.path()).unwrap(), vec![10, 20, 30]);
        assert_eq!(read_f64_series(file.path()).unwrap(), vec![10.0, 20.0, 30.0]);
        assert!(read_f64_series(Path::new("/nonexistent/samples.txt")).is_err());
    }
}
