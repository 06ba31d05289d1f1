//! Collapse bursts of input into a single value.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{Instant, sleep_until};
use tracing::trace;

/// A value released by a [Debouncer], tagged with its release number.
///
/// Generations start at 1 and strictly increase,
/// so a consumer can tell whether a result belongs to the latest release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Debounced<T> {
    pub generation: u64,
    pub value: T,
}

/// Releases the latest received value once no new value
/// arrived for a full quiet window.
///
/// Pending state lives in the debouncer rather than in the future
/// returned by [Debouncer::next], so dropping that future
/// (e.g. as a losing `select!` branch) never loses input.
#[derive(Debug)]
pub struct Debouncer<T> {
    input: UnboundedReceiver<T>,
    window: Duration,
    pending: Option<(T, Instant)>,
    generation: u64,
    closed: bool,
}

impl<T> Debouncer<T> {
    pub fn new(input: UnboundedReceiver<T>, window: Duration) -> Self {
        Self {
            input,
            window,
            pending: None,
            generation: 0,
            closed: false,
        }
    }

    /// Wait for the next value to settle.
    ///
    /// Returns `None` once the input is closed and every pending value was released.
    /// A value still pending when the input closes is released after its quiet window.
    pub async fn next(&mut self) -> Option<Debounced<T>> {
        loop {
            let Some((_, deadline)) = &self.pending else {
                if self.closed {
                    return None;
                }
                match self.input.recv().await {
                    Some(value) => self.hold(value),
                    None => self.closed = true,
                }
                continue;
            };
            let deadline = *deadline;

            if self.closed {
                sleep_until(deadline).await;
                return self.release();
            }

            tokio::select! {
                received = self.input.recv() => match received {
                    Some(value) => self.hold(value),
                    None => self.closed = true,
                },
                _ = sleep_until(deadline) => return self.release(),
            }
        }
    }

    fn hold(&mut self, value: T) {
        if self.pending.is_some() {
            trace!("superseding pending value");
        }
        self.pending = Some((value, Instant::now() + self.window));
    }

    fn release(&mut self) -> Option<Debounced<T>> {
        let (value, _) = self.pending.take()?;
        self.generation += 1;
        trace!(generation = self.generation, "releasing debounced value");
        Some(Debounced {
            generation: self.generation,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc;
    use tokio::time::sleep;

    use super::*;

    const WINDOW: Duration = Duration::from_millis(300);

    #[tokio::test(start_paused = true)]
    async fn burst_releases_only_last_value() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut debouncer = Debouncer::new(rx, WINDOW);

        let typing = tokio::spawn(async move {
            for query in ["c", "ch", "cha", "char"] {
                tx.send(query.to_string()).unwrap();
                sleep(Duration::from_millis(100)).await;
            }
            // keep the input open past the quiet window
            sleep(Duration::from_secs(1)).await;
        });

        let started = Instant::now();
        let released = debouncer.next().await.unwrap();
        assert_eq!(released, Debounced {
            generation: 1,
            value: "char".to_string(),
        });
        // last keystroke at 300ms, released one window later
        assert_eq!(started.elapsed(), Duration::from_millis(600));

        typing.await.unwrap();
        assert_eq!(debouncer.next().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn separate_bursts_get_increasing_generations() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut debouncer = Debouncer::new(rx, WINDOW);

        tx.send("pika").unwrap();
        assert_eq!(debouncer.next().await.unwrap().generation, 1);

        tx.send("bulb").unwrap();
        tx.send("bulba").unwrap();
        let second = debouncer.next().await.unwrap();
        assert_eq!(second.generation, 2);
        assert_eq!(second.value, "bulba");
    }

    #[tokio::test(start_paused = true)]
    async fn pending_value_survives_dropped_next() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut debouncer = Debouncer::new(rx, WINDOW);
        tx.send("eevee").unwrap();

        // give up before the window elapses
        let timed_out = tokio::time::timeout(Duration::from_millis(100), debouncer.next()).await;
        assert!(timed_out.is_err());

        drop(tx);
        let released = debouncer.next().await.unwrap();
        assert_eq!(released.value, "eevee");
        assert_eq!(debouncer.next().await, None);
    }
}
