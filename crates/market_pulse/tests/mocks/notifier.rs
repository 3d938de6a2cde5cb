use std::sync::{Arc, Mutex};

use market_pulse::slack::{Destination, Notifier};

#[derive(Clone, Default)]
pub struct MockNotifier {
    pub messages: Arc<Mutex<Vec<(Destination, String)>>>,
}

impl Notifier for MockNotifier {
    async fn deliver(&self, destination: &Destination, text: &str) {
        self.messages
            .lock()
            .unwrap()
            .push((destination.clone(), text.to_string()));
    }
}
