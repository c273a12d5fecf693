//! `iterate schemes` command implementation

use crate::error::Result;
use iterate_engine::Registry;
use std::io::{self, Write};

/// Print the registered source schemes, one per line
pub fn run() -> Result<()> {
    let mut out = io::stdout().lock();
    write_schemes(&Registry::with_defaults(), &mut out)?;
    out.flush()?;
    Ok(())
}

/// Write every scheme in `registry`, one per line
pub fn write_schemes(registry: &Registry, out: &mut impl Write) -> io::Result<()> {
    for scheme in registry.schemes() {
        writeln!(out, "{}", scheme)?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_write_schemes_one_per_line() {
        let registry = Registry::with_defaults();
        let mut buf = Vec::new();
        write_schemes(&registry, &mut buf).unwrap();

        let out = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), registry.schemes().len());
        assert!(lines.contains(&"repo://"));
        assert!(lines.contains(&"null://"));
    }
}
