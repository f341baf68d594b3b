use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use crate::cli::Cli;

/// Path-completion capability injected into the CLI shell. The core never
/// touches this; it exists so prompting stays testable and free of any
/// process-wide input-editing state.
pub trait PathCompleter {
    /// Candidate paths matching a typed prefix. Directories end in '/'.
    fn complete(&self, prefix: &str) -> Vec<String>;
}

/// Filesystem-backed completer: lists the prefix's directory and keeps the
/// entries whose names start with the prefix's final component.
pub struct FsCompleter;

impl PathCompleter for FsCompleter {
    fn complete(&self, prefix: &str) -> Vec<String> {
        let expanded = expand_tilde(prefix);
        let (dir, base) = split_prefix(&expanded);

        let Ok(entries) = std::fs::read_dir(&dir) else {
            return Vec::new();
        };

        let mut matches: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                if !name.starts_with(&base) {
                    return None;
                }
                let mut candidate = dir.join(&name).to_string_lossy().into_owned();
                if entry.path().is_dir() {
                    candidate.push('/');
                }
                Some(candidate)
            })
            .collect();
        matches.sort();
        matches
    }
}

fn split_prefix(prefix: &str) -> (PathBuf, String) {
    if prefix.ends_with('/') {
        return (PathBuf::from(prefix), String::new());
    }
    let path = Path::new(prefix);
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let base = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    (dir, base)
}

pub fn expand_tilde(input: &str) -> String {
    if let Some(rest) = input.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest).to_string_lossy().into_owned();
        }
    }
    input.to_string()
}

pub fn prompt_line(label: &str) -> io::Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Prompt until an existing file path is entered, showing completer
/// suggestions for near misses. A unique suggestion that names a file is
/// accepted directly.
pub fn prompt_existing_path(label: &str, completer: &dyn PathCompleter) -> io::Result<PathBuf> {
    loop {
        let entry = prompt_line(label)?;
        if entry.is_empty() {
            continue;
        }
        let path = PathBuf::from(expand_tilde(&entry));
        if path.exists() {
            return Ok(path);
        }

        let matches = completer.complete(&entry);
        match matches.as_slice() {
            [] => println!("No such file: {}", entry),
            [only] if Path::new(&expand_tilde(only)).is_file() => {
                println!("Using {}", only);
                return Ok(PathBuf::from(expand_tilde(only)));
            }
            _ => {
                println!("Did you mean one of:");
                for m in matches.iter().take(10) {
                    println!("  {}", m);
                }
            }
        }
    }
}

/// Prompt for every required value the command line left out.
pub fn fill_missing(cli: &mut Cli, completer: &dyn PathCompleter) -> io::Result<()> {
    if cli.audio_path.is_none() {
        cli.audio_path = Some(prompt_existing_path(
            "Enter the path to the audio file: ",
            completer,
        )?);
    }
    if cli.image_path.is_none() {
        cli.image_path = Some(prompt_existing_path(
            "Enter the path to the background image: ",
            completer,
        )?);
    }
    if cli.heading_text.is_none() {
        loop {
            let text = prompt_line("Enter the text to display as heading: ")?;
            if !text.is_empty() {
                cli.heading_text = Some(text);
                break;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_dir(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("halovid-test-completer-{}", label));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join("albums")).unwrap();
        std::fs::write(dir.join("alpha.mp3"), b"x").unwrap();
        std::fs::write(dir.join("alphabet.mp3"), b"x").unwrap();
        std::fs::write(dir.join("beta.wav"), b"x").unwrap();
        dir
    }

    #[test]
    fn completes_by_name_prefix() {
        let dir = fixture_dir("prefix");
        let prefix = dir.join("alp").to_string_lossy().into_owned();
        let matches = FsCompleter.complete(&prefix);
        assert_eq!(matches.len(), 2);
        assert!(matches.iter().all(|m| m.contains("alpha")));
    }

    #[test]
    fn directories_are_marked_with_a_slash() {
        let dir = fixture_dir("dirs");
        let prefix = dir.join("alb").to_string_lossy().into_owned();
        let matches = FsCompleter.complete(&prefix);
        assert_eq!(matches.len(), 1);
        assert!(matches[0].ends_with("albums/"));
    }

    #[test]
    fn trailing_slash_lists_the_whole_directory() {
        let dir = fixture_dir("listing");
        let mut prefix = dir.to_string_lossy().into_owned();
        prefix.push('/');
        let matches = FsCompleter.complete(&prefix);
        assert_eq!(matches.len(), 4);
    }

    #[test]
    fn unreadable_directory_completes_to_nothing() {
        let matches = FsCompleter.complete("/nonexistent-dir/xyz");
        assert!(matches.is_empty());
    }

    #[test]
    fn expand_tilde_passes_plain_paths_through() {
        assert_eq!(expand_tilde("/tmp/a.mp3"), "/tmp/a.mp3");
        assert_eq!(expand_tilde("relative/a.mp3"), "relative/a.mp3");
    }
}
