use std::io::IsTerminal;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Stderr progress for a pipeline run.
///
/// Pretty mode drives a single spinner whose message tracks the current
/// phase; plain mode prints one line per phase. Auto picks pretty only on a
/// terminal.
pub struct RunUi {
    spinner: Option<ProgressBar>,
    started: Instant,
}

impl RunUi {
    pub fn new(mode: &str) -> Self {
        let pretty = match mode {
            "pretty" => true,
            "plain" => false,
            _ => std::io::stderr().is_terminal(),
        };

        let spinner = pretty.then(|| {
            let spinner = ProgressBar::new_spinner();
            spinner.set_draw_target(ProgressDrawTarget::stderr());
            spinner.enable_steady_tick(Duration::from_millis(120));
            let style = ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            spinner.set_style(style);
            spinner
        });

        Self {
            spinner,
            started: Instant::now(),
        }
    }

    pub fn phase(&self, message: &str) {
        match &self.spinner {
            Some(spinner) => spinner.set_message(message.to_string()),
            None => eprintln!("==> {}", message),
        }
    }

    pub fn finish(&self, summary: &str) {
        let elapsed = self.started.elapsed();
        let line = format!("✔ {} ({:.2}s)", summary, elapsed.as_secs_f64());
        match &self.spinner {
            Some(spinner) => spinner.finish_with_message(line),
            None => eprintln!("{}", line),
        }
    }
}
