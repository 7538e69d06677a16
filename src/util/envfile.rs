use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Parse `KEY=value` lines. Blank lines and `#` comments are skipped;
/// surrounding quotes are stripped from values.
pub fn parse_env_str(content: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for (idx, line) in content.lines().enumerate() {
        let s = line.trim();
        if s.is_empty() || s.starts_with('#') {
            continue;
        }
        let Some((key, raw)) = s.split_once('=') else {
            // logger is not initialized yet when .env is read
            eprintln!("Warning: ignoring .env line {} without '=': {}", idx + 1, line);
            continue;
        };
        let raw = raw.trim();
        let val = if raw.len() >= 2
            && ((raw.starts_with('"') && raw.ends_with('"'))
                || (raw.starts_with('\'') && raw.ends_with('\'')))
        {
            &raw[1..raw.len() - 1]
        } else {
            raw
        };
        map.insert(key.trim().to_string(), val.to_string());
    }
    map
}

/// Parse an env file without touching the process environment. A missing
/// file yields an empty map.
pub fn parse_env_file(path: &str) -> Result<HashMap<String, String>> {
    let p = Path::new(path);
    if !p.exists() {
        return Ok(HashMap::new());
    }
    let content = fs::read_to_string(p).with_context(|| format!("reading {path}"))?;
    Ok(parse_env_str(&content))
}

/// Load `.env` from the working directory. Existing variables win.
pub fn load_dotenv_if_present() -> Result<usize> {
    let map = parse_env_file(".env")?;
    let mut applied = 0;
    for (k, v) in map {
        if std::env::var_os(&k).is_none() {
            // SAFETY: called from main before any other thread is spawned.
            unsafe {
                std::env::set_var(&k, &v);
            }
            applied += 1;
        }
    }
    Ok(applied)
}

pub fn write_env_template(path: &str) -> Result<()> {
    let mut f = fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let template = r#"# rating_matcher environment configuration template
# Copy this file to .env; system environment variables take precedence.

# Reference export with candidate_id
#RATING_MATCHER_REFERENCE=reference.csv
# Enriched worksheet output path
#RATING_MATCHER_OUT=matched.csv
# csv | xlsx | both
#RATING_MATCHER_FORMAT=csv
# Resolve rows on the rayon thread pool
#RATING_MATCHER_PARALLEL=false
# Use tracing-subscriber instead of env_logger
#RATING_MATCHER_TRACING=0
#RUST_LOG=info
"#;
    f.write_all(template.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comments_quotes_and_bad_lines() {
        let map = parse_env_str(
            "# comment\n\nRATING_MATCHER_OUT=\"out dir/x.csv\"\nRATING_MATCHER_FORMAT='xlsx'\nnot a pair\nRUST_LOG = debug\n",
        );
        assert_eq!(map.len(), 3);
        assert_eq!(map["RATING_MATCHER_OUT"], "out dir/x.csv");
        assert_eq!(map["RATING_MATCHER_FORMAT"], "xlsx");
        assert_eq!(map["RUST_LOG"], "debug");
    }

    #[test]
    fn template_round_trips_through_parser() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env.template");
        let path = path.to_str().unwrap();
        write_env_template(path).unwrap();
        // every setting in the template is commented out
        assert!(parse_env_file(path).unwrap().is_empty());
        assert!(parse_env_file(&format!("{path}.missing")).unwrap().is_empty());
    }
}
