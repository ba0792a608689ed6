//! `polyloft run`: execute a source file

use anyhow::Context;
use polyloft_engine::{EvalOptions, Runtime};
use std::path::Path;

pub fn execute(path: &str, options: EvalOptions) -> anyhow::Result<()> {
    if !Path::new(path).exists() {
        anyhow::bail!("File not found: {}", path);
    }
    tracing::debug!(path, "running file");
    let runtime = Runtime::new(options);
    runtime
        .eval_file(path)
        .with_context(|| format!("error running {}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_is_reported() {
        let err = execute("/definitely/not/here.pf", EvalOptions::default()).unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }

    #[test]
    fn test_runs_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "let x = 40 + 2").unwrap();
        let path = file.path().to_string_lossy().to_string();
        assert!(execute(&path, EvalOptions::default()).is_ok());
    }

    #[test]
    fn test_uncaught_error_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "throw \"boom\"").unwrap();
        let path = file.path().to_string_lossy().to_string();
        let err = execute(&path, EvalOptions::default()).unwrap_err();
        assert!(format!("{:#}", err).contains("Uncaught exception: boom"));
    }
}
