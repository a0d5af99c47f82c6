use std::io::{self, BufRead, Write};
use std::process::{Command, Stdio};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

/// Everything the shell does to the user's screen goes through here, so
/// business logic can run against a scripted terminal in tests.
pub trait Terminal: Send + Sync {
    fn clear(&self);

    fn say(&self, line: &str);

    /// One line of input with the trailing newline removed; `None` on EOF.
    fn read_line(&self, prompt: &str) -> Option<String>;

    fn open_url(&self, url: &str) -> Result<()>;

    /// Short pause after a transient message.
    fn linger(&self) {}

    /// Spinner shown while waiting on the AI; dropped to stop it.
    fn busy(&self, _message: &str) -> Option<ProgressBar> {
        None
    }

    fn ask(&self, prompt: &str) -> String {
        self.read_line(prompt).map(|s| s.trim().to_string()).unwrap_or_default()
    }

    fn confirm(&self, prompt: &str) -> bool {
        let ans = self.ask(&format!("{prompt} (y/n): ")).to_lowercase();
        ans == "y" || ans == "yes"
    }

    fn pause(&self) {
        let _ = self.read_line("\nPress Enter to continue...");
    }
}

/// The real terminal: stdout, stdin, and the platform URL opener.
pub struct StdTerminal;

impl Terminal for StdTerminal {
    fn clear(&self) {
        print!("\x1B[2J\x1B[H");
        let _ = io::stdout().flush();
    }

    fn say(&self, line: &str) {
        println!("{line}");
    }

    fn read_line(&self, prompt: &str) -> Option<String> {
        print!("{}", prompt.bold());
        let _ = io::stdout().flush();
        let mut s = String::new();
        match io::stdin().lock().read_line(&mut s) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(s.trim_end_matches(['\r', '\n']).to_string()),
        }
    }

    fn open_url(&self, url: &str) -> Result<()> {
        let opener = ["termux-open-url", "xdg-open", "open"]
            .into_iter()
            .find_map(|name| which::which(name).ok())
            .ok_or_else(|| anyhow!("no URL opener found (termux-open-url, xdg-open, open)"))?;
        tracing::debug!(opener = %opener.display(), %url, "opening url");
        Command::new(&opener)
            .arg(url)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to spawn {}", opener.display()))?;
        Ok(())
    }

    fn linger(&self) {
        std::thread::sleep(Duration::from_millis(1500));
    }

    fn busy(&self, message: &str) -> Option<ProgressBar> {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    }
}

pub fn heading(term: &dyn Terminal, title: &str) {
    term.say(&format!("=== {} ===", title).bold().to_string());
}

pub fn success(term: &dyn Terminal, msg: &str) {
    term.say(&format!("\n✅ {}", msg).green().to_string());
}

pub fn warn(term: &dyn Terminal, msg: &str) {
    term.say(&format!("\n⚠️ {}", msg).yellow().to_string());
}

pub fn fail(term: &dyn Terminal, msg: &str) {
    term.say(&format!("\n❌ {}", msg).red().to_string());
}

/// Numbered pick from `items` (1-based); `None` for 0, junk or out of range.
pub fn choose<'a>(term: &dyn Terminal, prompt: &str, items: &'a [String]) -> Option<&'a String> {
    for (i, item) in items.iter().enumerate() {
        term.say(&format!("{}) {}", i + 1, item));
    }
    term.say("0) Cancel");
    let choice = term.ask(prompt);
    let idx: usize = choice.parse().ok()?;
    idx.checked_sub(1).and_then(|i| items.get(i))
}
