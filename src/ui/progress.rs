use indicatif::ProgressBar;
use std::time::Duration;

/// Spinner for slow one-off steps such as loading the embedding model.
/// Hidden when stdout is not a terminal or quiet output is requested.
pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        let pb = if console::Term::stdout().is_term() && !crate::output::is_quiet() {
            let pb = ProgressBar::new_spinner();
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        } else {
            ProgressBar::hidden()
        };
        pb.set_message(message.to_string());
        Self { pb }
    }

    pub fn finish_with_message(&self, msg: &str) {
        self.pb.finish_with_message(msg.to_string());
    }

    pub fn finish_and_clear(&self) {
        self.pb.finish_and_clear();
    }
}
