use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

pub struct Spinner<F>(F);
impl<F: FnOnce() -> T + Send, T: Send> Spinner<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[derive(Debug, Clone)]
pub struct Dialog<'a, Type> {
    pub message: &'a str,
    pub help_message: Option<&'a str>,
    pub typed: Type,
}

impl<F: FnOnce() -> T + Send, T: Send> Dialog<'_, Spinner<F>> {
    /// Run the spinner's function on a separate thread,
    /// showing a spinner if it did not finish within `start_spinning_after`.
    ///
    /// The function runs inside the current tokio runtime context,
    /// so it may block on futures with [tokio::runtime::Handle::block_on].
    pub fn spin_with_delay(self, start_spinning_after: Duration) -> T {
        let handle = tokio::runtime::Handle::current();
        std::thread::scope(|s| {
            let task = s.spawn(move || {
                let _guard = handle.enter();
                (self.typed.0)()
            });
            let mut dialog: Option<ProgressBar> = None;
            let started = Instant::now();
            loop {
                if task.is_finished() {
                    break;
                }

                if started.elapsed() < start_spinning_after {
                    std::thread::sleep(Duration::from_millis(50));
                    continue;
                }

                let spinner = ProgressBar::new_spinner();
                if let Ok(style) = ProgressStyle::with_template("{spinner} {wide_msg} {prefix:>}") {
                    spinner.set_style(style);
                }
                spinner.set_message(self.message.to_string());
                if let Some(help_message) = self.help_message {
                    spinner.set_prefix(help_message.to_string())
                }
                spinner.enable_steady_tick(Duration::from_millis(100));
                dialog = Some(spinner);

                break;
            }

            let res = match task.join() {
                Ok(res) => res,
                Err(panic) => std::panic::resume_unwind(panic),
            };

            if let Some(dialog) = dialog {
                dialog.finish_and_clear();
            }

            res
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn spinner_returns_the_result() {
        let result = Dialog {
            message: "Counting...",
            help_message: None,
            typed: Spinner::new(|| {
                tokio::runtime::Handle::current().block_on(async { 1 + 1 })
            }),
        }
        .spin_with_delay(Duration::from_secs(1));
        assert_eq!(result, 2);
    }
}
