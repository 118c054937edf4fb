//! Command-line option parsing.

use std::path::Path;

use anyhow::{bail, Context, Result};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Options {
    pub selection: Option<String>,
    pub directory: Option<String>,
    pub offline: bool,
    pub search: Option<String>,
    pub channel: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub locale: Option<String>,
    pub positional: Vec<String>,
}

impl Options {
    pub fn parse(args: &[String]) -> Result<Self> {
        let mut opts = Options::default();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            let slot = match arg.as_str() {
                "--offline" => {
                    opts.offline = true;
                    continue;
                }
                "--selection" => &mut opts.selection,
                "--directory" => &mut opts.directory,
                "--search" => &mut opts.search,
                "--channel" => &mut opts.channel,
                "--title" => &mut opts.title,
                "--body" => &mut opts.body,
                "--locale" => &mut opts.locale,
                flag if flag.starts_with("--") => bail!("Unknown option: {}", flag),
                _ => {
                    opts.positional.push(arg.clone());
                    continue;
                }
            };
            let value = iter
                .next()
                .with_context(|| format!("Option {} needs a value", arg))?;
            *slot = Some(value.clone());
        }
        Ok(opts)
    }
}

/// Inline value, or the contents of a file when written as `@path`.
pub fn read_value(raw: &str) -> Result<String> {
    match raw.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(Path::new(path))
            .with_context(|| format!("Failed to read {}", path)),
        None => Ok(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_options() {
        let opts = Options::parse(&args(&[
            "--selection",
            r#"{"type":"roles","roles":["coach"]}"#,
            "--offline",
            "--search",
            "sam",
        ]))
        .unwrap();
        assert_eq!(opts.selection.as_deref(), Some(r#"{"type":"roles","roles":["coach"]}"#));
        assert!(opts.offline);
        assert_eq!(opts.search.as_deref(), Some("sam"));
        assert!(opts.positional.is_empty());
    }

    #[test]
    fn test_positional_arguments() {
        let opts = Options::parse(&args(&["parents", "--locale", "ar"])).unwrap();
        assert_eq!(opts.positional, vec!["parents".to_string()]);
        assert_eq!(opts.locale.as_deref(), Some("ar"));
    }

    #[test]
    fn test_missing_value_and_unknown_flag() {
        assert!(Options::parse(&args(&["--title"])).is_err());
        assert!(Options::parse(&args(&["--verbose"])).is_err());
    }

    #[test]
    fn test_read_value_inline_and_file() {
        assert_eq!(read_value("all").unwrap(), "all");

        let path = std::env::temp_dir().join(format!("academy-cli-{}.json", std::process::id()));
        std::fs::write(&path, r#""coaches""#).unwrap();
        let raw = format!("@{}", path.display());
        assert_eq!(read_value(&raw).unwrap(), r#""coaches""#);
        let _ = std::fs::remove_file(&path);

        assert!(read_value("@/nonexistent/academy.json").is_err());
    }
}
